use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// One observed period of shop activity as sent by the statistics service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnalysisItem {
    #[schemars(
        description = "Period label: 'YYYY-MM-DD', 'YYYY-MM', 'YYYY-Www', 'HH:00' or a full RFC 3339 timestamp."
    )]
    pub period: String,

    #[schemars(description = "Total revenue booked in the period.")]
    pub revenue: f64,

    #[schemars(description = "Total cost of goods booked in the period.")]
    pub cost: f64,

    #[serde(default)]
    pub profit: f64,

    #[serde(default)]
    #[schemars(description = "Profit margin in percent.")]
    pub margin: f64,

    #[serde(default)]
    #[schemars(description = "Revenue growth against the previous period in percent.")]
    pub growth: f64,
}

/// Percentage perturbations replayed by the scenario simulator.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct ScenarioParams {
    #[serde(default)]
    #[schemars(description = "Relative change applied to the trend component, in percent.")]
    pub trend_change: f64,

    #[serde(default)]
    #[schemars(description = "Relative change applied to the seasonal component, in percent.")]
    pub seasonal_change: f64,

    #[serde(default)]
    #[schemars(description = "Relative change applied to the last observed cost, in percent.")]
    pub cost_change: f64,
}

/// Reporting window the caller aggregated its data over.
///
/// Unknown strings are kept as `Other` so they fall back to the default cycle
/// instead of rejecting the request.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PeriodType {
    #[default]
    Hour,
    Day,
    Week,
    Month,
    Year,
    Other(String),
}

impl From<String> for PeriodType {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "hour" => Self::Hour,
            "day" => Self::Day,
            "week" => Self::Week,
            "month" => Self::Month,
            "year" => Self::Year,
            _ => Self::Other(value),
        }
    }
}

impl From<PeriodType> for String {
    fn from(value: PeriodType) -> Self {
        value.as_str().to_string()
    }
}

impl PeriodType {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Hour => "hour",
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Year => "year",
            Self::Other(s) => s,
        }
    }
}

/// Bucket size used inside a month-long reporting window.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum GroupBy {
    #[default]
    Day,
    Week,
    Month,
    Other(String),
}

impl From<String> for GroupBy {
    fn from(value: String) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "day" => Self::Day,
            "week" => Self::Week,
            "month" => Self::Month,
            _ => Self::Other(value),
        }
    }
}

impl From<GroupBy> for String {
    fn from(value: GroupBy) -> Self {
        value.as_str().to_string()
    }
}

impl GroupBy {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
            Self::Other(s) => s,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRequest {
    #[schemars(description = "Observed periods, in any order.")]
    pub data: Vec<AnalysisItem>,

    #[serde(default)]
    #[schemars(description = "Optional what-if scenario to replay through the decomposition.")]
    pub scenario: Option<ScenarioParams>,

    #[serde(default)]
    #[schemars(
        with = "Option<String>",
        description = "Bucket size inside a month window: 'day', 'week' or 'month'."
    )]
    pub group_by: Option<GroupBy>,

    /// Body-level reporting window; the `period_type` query parameter wins when both are set.
    #[serde(default, rename = "period_type")]
    #[schemars(with = "Option<String>")]
    pub period_type: Option<PeriodType>,
}

impl AnalysisRequest {
    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(AnalysisRequest)
    }

    pub fn schema_as_json() -> Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_generation() {
        let schema_json = AnalysisRequest::schema_as_json().unwrap();
        assert!(schema_json.contains("data"));
        assert!(schema_json.contains("scenario"));
        assert!(schema_json.contains("groupBy"));
    }

    #[test]
    fn test_request_deserialization_defaults() {
        let json = r#"{
            "data": [{"period": "2024-03-01", "revenue": 1200.0, "cost": 700.0}],
            "scenario": {"trendChange": 10}
        }"#;

        let request: AnalysisRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.data.len(), 1);
        assert_eq!(request.data[0].profit, 0.0);
        let scenario = request.scenario.unwrap();
        assert_eq!(scenario.trend_change, 10.0);
        assert_eq!(scenario.seasonal_change, 0.0);
        assert_eq!(scenario.cost_change, 0.0);
        assert!(request.group_by.is_none());
        assert!(request.period_type.is_none());
    }

    #[test]
    fn test_unknown_granularity_is_kept() {
        let json = r#"{"data": [], "groupBy": "quarter", "period_type": "Month"}"#;
        let request: AnalysisRequest = serde_json::from_str(json).unwrap();
        assert_eq!(request.group_by, Some(GroupBy::Other("quarter".to_string())));
        assert_eq!(request.period_type, Some(PeriodType::Month));
    }

    #[test]
    fn test_missing_required_field_is_rejected() {
        let json = r#"{"data": [{"period": "2024-03-01", "revenue": 1.0}]}"#;
        assert!(serde_json::from_str::<AnalysisRequest>(json).is_err());
    }
}
