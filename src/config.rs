use crate::error::{AnalysisError, Result};
use serde::{Deserialize, Serialize};

/// Tunable thresholds of the analysis pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Row count the density booster tries to reach before decomposition.
    pub density_target: usize,
    /// Below this many points the classical decomposition is not attempted.
    pub decomposition_min_points: usize,
    /// Resampling intervals in hours, tried from first to last.
    pub resample_intervals_hours: Vec<u32>,
    /// Upper bound on the size of a resampled grid.
    pub max_resampled_points: usize,
    /// Mean per-period revenue change above which the trend insight is emphasised.
    pub trend_emphasis_threshold: f64,
    /// Std / range ratio above which seasonality counts as strong.
    pub seasonal_strength_ratio: f64,
    pub currency_suffix: String,
    pub round_decimals: u32,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            density_target: 40,
            decomposition_min_points: 10,
            resample_intervals_hours: vec![6, 3, 1],
            max_resampled_points: 100_000,
            trend_emphasis_threshold: 500.0,
            seasonal_strength_ratio: 0.1,
            currency_suffix: "VNĐ".to_string(),
            round_decimals: 2,
        }
    }
}

impl AnalysisConfig {
    pub fn validate(&self) -> Result<()> {
        if self.density_target == 0 {
            return Err(invalid("density_target", "must be at least 1"));
        }

        if self.decomposition_min_points < 2 {
            return Err(invalid("decomposition_min_points", "must be at least 2"));
        }

        if self.resample_intervals_hours.is_empty() {
            return Err(invalid(
                "resample_intervals_hours",
                "at least one interval is required",
            ));
        }

        if self.resample_intervals_hours.contains(&0) {
            return Err(invalid("resample_intervals_hours", "intervals must be positive"));
        }

        if self.max_resampled_points < self.density_target {
            return Err(invalid(
                "max_resampled_points",
                "must not be smaller than density_target",
            ));
        }

        if !self.trend_emphasis_threshold.is_finite() || self.trend_emphasis_threshold < 0.0 {
            return Err(invalid(
                "trend_emphasis_threshold",
                "must be a non-negative number",
            ));
        }

        if !(0.0..=1.0).contains(&self.seasonal_strength_ratio) {
            return Err(invalid(
                "seasonal_strength_ratio",
                "must be between 0.0 and 1.0",
            ));
        }

        if self.round_decimals > 10 {
            return Err(invalid("round_decimals", "must be at most 10"));
        }

        Ok(())
    }
}

fn invalid(field: &str, details: &str) -> AnalysisError {
    AnalysisError::InvalidConfig {
        field: field.to_string(),
        details: details.to_string(),
    }
}

#[cfg(feature = "server")]
pub use service::{load_service_config, ServiceConfig};

#[cfg(feature = "server")]
mod service {
    use super::AnalysisConfig;
    use config::{Config, ConfigError, Environment, File};
    use serde::Deserialize;

    const CONFIG_FILE: &str = "config/default";
    const DEFAULT_HOST: &str = "0.0.0.0";
    const DEFAULT_PORT: i64 = 8000;
    const DEFAULT_LOG_LEVEL: &str = "info";

    /// HTTP service settings, read from `config/default.*` and `APP__*` variables.
    #[derive(Debug, Clone, Deserialize)]
    pub struct ServiceConfig {
        pub host: String,
        pub port: u16,
        pub log_level: String,
        #[serde(default)]
        pub analysis: AnalysisConfig,
    }

    impl ServiceConfig {
        pub fn bind_address(&self) -> String {
            format!("{}:{}", self.host, self.port)
        }
    }

    pub fn load_service_config() -> Result<ServiceConfig, ConfigError> {
        Config::builder()
            .set_default("host", DEFAULT_HOST)?
            .set_default("port", DEFAULT_PORT)?
            .set_default("log_level", DEFAULT_LOG_LEVEL)?
            .add_source(File::with_name(CONFIG_FILE).required(false))
            .add_source(Environment::with_prefix("APP").separator("__"))
            .build()?
            .try_deserialize()
    }
}
