//! # Revenue Insights
//!
//! Turns a shop's irregular revenue/cost history into a decomposition, a
//! one-period-ahead forecast, Vietnamese-language commentary and an optional
//! what-if scenario.
//!
//! ## Pipeline
//!
//! 1. **Normalize**: parse period labels, sort, average duplicate timestamps.
//! 2. **Boost density**: resample sparse tables onto a uniform grid.
//! 3. **Infer the seasonal period** from the requested granularity and sampling gap.
//! 4. **Decompose** revenue into trend, seasonal and residual components, with a
//!    rolling-mean fallback when the classical method is not applicable.
//! 5. **Forecast** with additive Holt-Winters smoothing.
//! 6. **Generate insights** and **simulate the scenario** if one was supplied.
//! 7. **Sanitize**: replace non-finite values and round every float.
//!
//! Numerical problems never surface as errors; they are reported inside the
//! response (`note`/`error` fields) instead.
//!
//! ## Example
//!
//! ```rust,ignore
//! use revenue_insights::*;
//!
//! let request: AnalysisRequest = serde_json::from_str(r#"{
//!     "data": [
//!         {"period": "08:00", "revenue": 100, "cost": 40},
//!         {"period": "09:00", "revenue": 110, "cost": 40},
//!         {"period": "10:00", "revenue": 120, "cost": 40}
//!     ],
//!     "scenario": {"trendChange": 10}
//! }"#)?;
//!
//! let response = analyze(&request, Some(PeriodType::Hour));
//! println!("{}", serde_json::to_string_pretty(&response)?);
//! ```

pub mod config;
pub mod decomposition;
pub mod densifier;
pub mod error;
pub mod food;
pub mod forecast;
pub mod ingestion;
pub mod insights;
pub mod sanitize;
pub mod scenario;
pub mod schema;
pub mod seasonality;
pub mod utils;

#[cfg(feature = "server")]
pub mod server;

pub use config::AnalysisConfig;
pub use decomposition::{Decomposer, Decomposition, DecompositionOutcome};
pub use densifier::DensityBooster;
pub use error::{AnalysisError, Result};
pub use food::{FoodInfo, FoodKnowledgeBase};
pub use forecast::{Forecast, ForecastOutcome, Forecaster, HoltWinters};
pub use ingestion::{RevenueTable, TimeSeriesNormalizer};
pub use insights::InsightGenerator;
pub use sanitize::{sanitize, Sanitize};
pub use scenario::{ScenarioSimulator, SimulatedForecast};
pub use schema::*;
pub use seasonality::{Granularity, PeriodInferencer};

use log::{debug, info};
use serde::Serialize;

/// Body of a successful `/analyze` call.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResponse {
    pub decomposition: DecompositionOutcome,
    pub forecast: ForecastOutcome,
    pub insight_messages: Vec<String>,
    pub simulated_forecast: Option<SimulatedForecast>,
    pub scenario_insights: Vec<String>,
}

impl Sanitize for AnalysisResponse {
    fn clean_invalid_values(&mut self) {
        self.decomposition.clean_invalid_values();
        self.forecast.clean_invalid_values();
        self.simulated_forecast.clean_invalid_values();
    }

    fn round_floats(&mut self, decimals: u32) {
        self.decomposition.round_floats(decimals);
        self.forecast.round_floats(decimals);
        self.simulated_forecast.round_floats(decimals);
    }
}

#[derive(Debug, Clone, Default)]
pub struct RevenueAnalyzer {
    config: AnalysisConfig,
}

impl RevenueAnalyzer {
    pub fn new(config: AnalysisConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Runs the full pipeline. `period_type` (from the query string) takes
    /// precedence over the body's `period_type`.
    pub fn analyze(
        &self,
        request: &AnalysisRequest,
        period_type: Option<PeriodType>,
    ) -> AnalysisResponse {
        let cfg = &self.config;
        let period_type = period_type
            .or_else(|| request.period_type.clone())
            .unwrap_or_default();
        let group_by = request.group_by.clone().unwrap_or_default();

        info!(
            "Analyzing {} rows (period_type={}, groupBy={}, scenario={})",
            request.data.len(),
            period_type.as_str(),
            group_by.as_str(),
            request.scenario.is_some()
        );

        let table = TimeSeriesNormalizer::normalize(&request.data);
        let boosted = DensityBooster::new(
            cfg.density_target,
            cfg.resample_intervals_hours.clone(),
            cfg.max_resampled_points,
        )
        .boost(&table);

        let granularity = Granularity::resolve(&period_type, &group_by);
        let period = PeriodInferencer::infer(&boosted, granularity);

        let decomposition =
            Decomposer::new(cfg.decomposition_min_points).decompose(&boosted.revenue, period);
        let forecast = Forecaster::forecast(&boosted, period);

        let insight_messages = InsightGenerator::new(
            cfg.trend_emphasis_threshold,
            cfg.seasonal_strength_ratio,
            cfg.currency_suffix.as_str(),
        )
        .generate(&boosted.revenue, forecast.ready());

        let scenario = ScenarioSimulator::new(cfg.currency_suffix.as_str()).simulate(
            request.scenario.as_ref(),
            decomposition.components(),
            boosted.last_cost().unwrap_or(0.0),
        );

        debug!(
            "Pipeline finished: {} points, period {}, fallback={}, forecast={}",
            boosted.len(),
            decomposition.period_used(),
            decomposition.is_fallback(),
            forecast.ready().is_some()
        );

        sanitize(
            AnalysisResponse {
                decomposition,
                forecast,
                insight_messages,
                simulated_forecast: scenario.forecast,
                scenario_insights: scenario.insights,
            },
            cfg.round_decimals,
        )
    }
}

/// Analyzes `request` with the default configuration.
pub fn analyze(request: &AnalysisRequest, period_type: Option<PeriodType>) -> AnalysisResponse {
    RevenueAnalyzer::default().analyze(request, period_type)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(period: &str, revenue: f64, cost: f64) -> AnalysisItem {
        AnalysisItem {
            period: period.to_string(),
            revenue,
            cost,
            profit: revenue - cost,
            margin: 0.0,
            growth: 0.0,
        }
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = AnalysisConfig {
            resample_intervals_hours: vec![],
            ..AnalysisConfig::default()
        };
        assert!(matches!(
            RevenueAnalyzer::new(config),
            Err(AnalysisError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_query_period_type_overrides_body() {
        let start = chrono::NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        let data: Vec<AnalysisItem> = (0..60)
            .map(|h| {
                let ts = start + chrono::Duration::hours(h);
                item(&ts.format("%Y-%m-%d %H:%M:%S").to_string(), 100.0 + (h % 7) as f64 * 10.0, 50.0)
            })
            .collect();
        let request = AnalysisRequest {
            data,
            period_type: Some(PeriodType::Hour),
            ..AnalysisRequest::default()
        };

        // hourly window with an hourly gap keeps the default 12-point cycle
        let from_body = analyze(&request, None);
        assert_eq!(from_body.decomposition.period_used(), 12);

        // weekly window with an hourly gap gives a 7-point cycle
        let from_query = analyze(&request, Some(PeriodType::Week));
        assert_eq!(from_query.decomposition.period_used(), 7);
    }

    #[test]
    fn test_custom_currency_flows_into_insights() {
        let analyzer = RevenueAnalyzer::new(AnalysisConfig {
            currency_suffix: "USD".to_string(),
            ..AnalysisConfig::default()
        })
        .unwrap();
        let request = AnalysisRequest {
            data: vec![item("2024-01-01", 100.0, 10.0), item("2024-01-02", 120.0, 10.0)],
            scenario: Some(ScenarioParams::default()),
            ..AnalysisRequest::default()
        };

        let response = analyzer.analyze(&request, Some(PeriodType::Day));
        assert!(response
            .scenario_insights
            .last()
            .unwrap()
            .contains("USD"));
    }
}
