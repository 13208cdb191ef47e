use crate::decomposition::Decomposition;
use crate::schema::ScenarioParams;
use crate::utils::{format_percent, format_thousands};
use log::debug;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulatedForecast {
    pub predicted_revenue: f64,
    pub predicted_profit: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ScenarioResult {
    pub forecast: Option<SimulatedForecast>,
    pub insights: Vec<String>,
}

/// Multipliers derived from percentage changes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScenarioFactors {
    pub trend: f64,
    pub seasonal: f64,
    pub cost: f64,
}

impl From<&ScenarioParams> for ScenarioFactors {
    fn from(params: &ScenarioParams) -> Self {
        Self {
            trend: 1.0 + params.trend_change / 100.0,
            seasonal: 1.0 + params.seasonal_change / 100.0,
            cost: 1.0 + params.cost_change / 100.0,
        }
    }
}

pub struct ScenarioSimulator {
    currency: String,
}

impl ScenarioSimulator {
    pub fn new(currency: impl Into<String>) -> Self {
        Self {
            currency: currency.into(),
        }
    }

    /// Replays `scenario` through the decomposition components.
    ///
    /// Without a scenario nothing is produced. Without usable components a single
    /// explanatory sentence is returned and the forecast stays empty.
    pub fn simulate(
        &self,
        scenario: Option<&ScenarioParams>,
        components: Option<&Decomposition>,
        last_cost: f64,
    ) -> ScenarioResult {
        let Some(params) = scenario else {
            return ScenarioResult::default();
        };

        let components = match components {
            Some(d) if !d.is_empty() && d.trend.len() == d.seasonal.len() => d,
            _ => {
                debug!("Scenario requested but no decomposition components are available");
                return ScenarioResult {
                    forecast: None,
                    insights: vec![
                        "Không thể mô phỏng kịch bản vì chưa có dữ liệu phân rã xu hướng và mùa vụ hợp lệ."
                            .to_string(),
                    ],
                };
            }
        };

        let factors = ScenarioFactors::from(params);
        let simulated = simulate_series(&components.trend, &components.seasonal, factors);

        let next_revenue = simulated.last().copied().unwrap_or(0.0);
        let next_cost = last_cost * factors.cost;
        let next_profit = next_revenue - next_cost;

        let mut insights = Vec::new();
        if params.trend_change != 0.0 {
            insights.push(format!(
                "Giả định xu hướng doanh thu {} {}%.",
                change_verb(params.trend_change),
                format_percent(params.trend_change)
            ));
        }
        if params.seasonal_change != 0.0 {
            insights.push(format!(
                "Giả định biên độ mùa vụ {} {}%.",
                change_verb(params.seasonal_change),
                format_percent(params.seasonal_change)
            ));
        }
        if params.cost_change != 0.0 {
            insights.push(format!(
                "Giả định chi phí {} {}%.",
                change_verb(params.cost_change),
                format_percent(params.cost_change)
            ));
        }
        insights.push(format!(
            "Theo kịch bản này, doanh thu kỳ tới ước đạt {} {} và lợi nhuận ước đạt {} {}.",
            format_thousands(next_revenue),
            self.currency,
            format_thousands(next_profit),
            self.currency
        ));

        ScenarioResult {
            forecast: Some(SimulatedForecast {
                predicted_revenue: next_revenue,
                predicted_profit: next_profit,
            }),
            insights,
        }
    }
}

/// `trend[i] * trend_factor + seasonal[i] * seasonal_factor` for every index.
pub fn simulate_series(trend: &[f64], seasonal: &[f64], factors: ScenarioFactors) -> Vec<f64> {
    trend
        .iter()
        .zip(seasonal)
        .map(|(t, s)| t * factors.trend + s * factors.seasonal)
        .collect()
}

fn change_verb(change: f64) -> &'static str {
    if change > 0.0 {
        "tăng"
    } else {
        "giảm"
    }
}
