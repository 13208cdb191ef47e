//! Static per-dish knowledge used for marketing captions.

use crate::error::Result;
use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

const EMBEDDED_FOOD_INFO: &str = include_str!("../data/food_info.json");
const CAPTION_TEMPLATES: usize = 3;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct FoodInfo {
    #[schemars(description = "Vietnamese name shown to customers")]
    pub display_name: String,
    pub core_ingredients: Vec<String>,
    #[serde(default)]
    pub secondary_ingredients: Vec<String>,
    #[serde(default)]
    pub accompaniments: Vec<String>,
    pub taste: Vec<String>,
    pub texture: Vec<String>,
    #[schemars(description = "Short phrases describing the dish's culinary identity")]
    pub style: Vec<String>,
}

/// Read-only dish table keyed by classifier label (e.g. `Banh-Mi`).
#[derive(Debug, Clone)]
pub struct FoodKnowledgeBase {
    foods: BTreeMap<String, FoodInfo>,
    aliases: HashMap<String, String>,
}

impl FoodKnowledgeBase {
    pub fn load_embedded() -> Result<Self> {
        Self::from_json(EMBEDDED_FOOD_INFO)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let foods: BTreeMap<String, FoodInfo> = serde_json::from_str(json)?;

        let mut aliases = HashMap::new();
        for (label, info) in &foods {
            aliases.insert(normalize_label(&info.display_name), label.clone());
        }
        // exact labels win over display-name aliases
        for label in foods.keys() {
            aliases.insert(normalize_label(label), label.clone());
        }

        debug!("Loaded {} dishes into the food knowledge base", foods.len());
        Ok(Self { foods, aliases })
    }

    pub fn len(&self) -> usize {
        self.foods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.foods.is_empty()
    }

    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.foods.keys().map(String::as_str)
    }

    /// Canonical label for a user-supplied label or display name.
    pub fn resolve(&self, label: &str) -> Option<&str> {
        self.aliases
            .get(&normalize_label(label))
            .map(String::as_str)
    }

    pub fn lookup(&self, label: &str) -> Option<&FoodInfo> {
        self.resolve(label).and_then(|key| self.foods.get(key))
    }

    /// Builds a Vietnamese marketing caption from one of several templates.
    pub fn caption<R: Rng + ?Sized>(&self, label: &str, rng: &mut R) -> Option<String> {
        let info = self.lookup(label)?;

        let name = &info.display_name;
        let style = pick(&info.style, rng);
        let taste = pick(&info.taste, rng);
        let texture = pick(&info.texture, rng);
        let core = info.core_ingredients.join(", ");
        let serve_with = if info.accompaniments.is_empty() {
            String::new()
        } else {
            format!(" Ăn kèm {} là chuẩn vị.", info.accompaniments.join(", "))
        };

        let caption = match rng.gen_range(0..CAPTION_TEMPLATES) {
            0 => format!(
                "{name}: {style}. Từ {core}, món ăn mang hương vị {taste} cùng cảm giác {texture}.{serve_with}"
            ),
            1 => format!(
                "Bạn đã thử {name} chưa? Đây là {style}, nổi bật với {taste} và {texture}.{serve_with} Ghé quán thưởng thức ngay hôm nay!"
            ),
            _ => format!(
                "Hương vị {taste}, {texture}: đó chính là {name}, {style}. Được làm từ {core}.{serve_with}"
            ),
        };

        Some(caption)
    }
}

fn pick<'a, R: Rng + ?Sized>(items: &'a [String], rng: &mut R) -> &'a str {
    items.choose(rng).map(String::as_str).unwrap_or_default()
}

/// Lowercases and joins words with `-`, so `banh mi`, `BANH_MI` and `Banh-Mi` agree.
pub fn normalize_label(label: &str) -> String {
    label
        .trim()
        .to_lowercase()
        .split(|c: char| c.is_whitespace() || c == '_' || c == '-')
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn foods() -> FoodKnowledgeBase {
        FoodKnowledgeBase::load_embedded().unwrap()
    }

    #[test]
    fn test_embedded_table_loads() {
        let kb = foods();
        assert_eq!(kb.len(), 17);
        assert!(kb.labels().any(|l| l == "Tra-Sua"));
        assert_eq!(kb.lookup("Com").unwrap().display_name, "Cơm Tấm");
    }

    #[test]
    fn test_lookup_normalizes_labels() {
        let kb = foods();
        for label in ["Banh-Mi", "banh-mi", " BANH_MI ", "banh mi", "Bánh Mì", "bánh  mì"] {
            assert_eq!(kb.resolve(label), Some("Banh-Mi"), "label {label:?}");
        }
        assert_eq!(kb.resolve("pho"), Some("Pho"));
        assert_eq!(kb.resolve("Phở"), Some("Pho"));
        assert!(kb.lookup("bun-cha").is_none());
        assert!(kb.lookup("").is_none());
    }

    #[test]
    fn test_caption_mentions_dish() {
        let kb = foods();
        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let caption = kb.caption("Pho", &mut rng).unwrap();
            assert!(caption.contains("Phở"));
        }
    }

    #[test]
    fn test_caption_is_reproducible_with_seeded_rng() {
        let kb = foods();
        let a = kb.caption("Sushi", &mut StdRng::seed_from_u64(7));
        let b = kb.caption("Sushi", &mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
    }

    #[test]
    fn test_caption_handles_sparse_records() {
        let kb = foods();
        let caption = kb.caption("lau", &mut StdRng::seed_from_u64(1)).unwrap();
        assert!(caption.contains("Lẩu"));
        assert!(kb.caption("unknown", &mut StdRng::seed_from_u64(1)).is_none());
    }

    #[test]
    fn test_missing_optional_lists_default() {
        let kb = FoodKnowledgeBase::from_json(
            r#"{"Test": {"displayName": "Món Thử", "coreIngredients": ["gạo"], "taste": ["ngọt"], "texture": ["mềm"], "style": ["món mới"]}}"#,
        )
        .unwrap();
        let info = kb.lookup("test").unwrap();
        assert!(info.accompaniments.is_empty());
        let caption = kb.caption("Test", &mut StdRng::seed_from_u64(3)).unwrap();
        assert!(!caption.contains("Ăn kèm"));
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(FoodKnowledgeBase::from_json("not json").is_err());
    }
}
