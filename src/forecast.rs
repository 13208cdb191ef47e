//! Additive Holt-Winters forecasting of the next period's revenue.

use crate::error::{AnalysisError, Result};
use crate::ingestion::RevenueTable;
use crate::utils::{mean, percent_changes};
use log::{debug, warn};
use serde::Serialize;

/// Candidate values for each smoothing parameter.
const PARAMETER_GRID: [f64; 9] = [0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9];

/// Triple exponential smoothing with additive trend and additive seasonality.
///
/// - Level: `l_t = α(y_t - s_{t-m}) + (1-α)(l_{t-1} + b_{t-1})`
/// - Trend: `b_t = β(l_t - l_{t-1}) + (1-β)b_{t-1}`
/// - Seasonal: `s_t = γ(y_t - l_t) + (1-γ)s_{t-m}`
/// - Forecast: `ŷ_{t+h} = l_t + h*b_t + s_{t+h-m}`
#[derive(Debug, Clone)]
pub struct HoltWinters {
    seasonal_period: usize,
    params: Option<(f64, f64, f64)>,
    state: Option<SmoothingPass>,
}

#[derive(Debug, Clone)]
struct SmoothingPass {
    level: f64,
    trend: f64,
    seasonals: Vec<f64>,
    fitted: Vec<f64>,
    sse: f64,
}

impl HoltWinters {
    /// Smoothing parameters are chosen by minimising the in-sample SSE.
    pub fn auto(seasonal_period: usize) -> Self {
        Self {
            seasonal_period,
            params: None,
            state: None,
        }
    }

    /// `(alpha, beta, gamma)` selected by the last successful fit.
    pub fn params(&self) -> Option<(f64, f64, f64)> {
        self.params
    }

    pub fn fit(&mut self, values: &[f64]) -> Result<()> {
        let period = self.seasonal_period;
        if period < 2 {
            return Err(AnalysisError::InvalidPeriod(period));
        }

        if values.len() < 2 * period {
            return Err(AnalysisError::InsufficientData {
                needed: 2 * period,
                got: values.len(),
            });
        }

        let non_finite = values.iter().filter(|v| !v.is_finite()).count();
        if non_finite > 0 {
            return Err(AnalysisError::NonFiniteValues(non_finite));
        }

        let (alpha, beta, gamma) = Self::optimize_params(values, period);
        self.params = Some((alpha, beta, gamma));
        self.state = Some(Self::smooth(values, period, alpha, beta, gamma));
        Ok(())
    }

    /// In-sample one-step-ahead predictions, one per observation.
    pub fn fitted(&self) -> Option<&[f64]> {
        self.state.as_ref().map(|s| s.fitted.as_slice())
    }

    pub fn sse(&self) -> Option<f64> {
        self.state.as_ref().map(|s| s.sse)
    }

    pub fn forecast(&self, horizon: usize) -> Option<Vec<f64>> {
        let state = self.state.as_ref()?;
        let n = state.fitted.len();
        let period = self.seasonal_period;

        Some(
            (1..=horizon)
                .map(|h| {
                    let season = state.seasonals[(n + h - 1) % period];
                    state.level + h as f64 * state.trend + season
                })
                .collect(),
        )
    }

    /// Level and trend as of just before the first observation, with seasonal
    /// indices averaged over the first two detrended cycles.
    fn initialize(values: &[f64], period: usize) -> (f64, f64, Vec<f64>) {
        let m = period as f64;
        let first_mean = values[..period].iter().sum::<f64>() / m;
        let second_mean = values[period..2 * period].iter().sum::<f64>() / m;

        let trend = (second_mean - first_mean) / m;
        let line = |t: usize| first_mean + (t as f64 - (m - 1.0) / 2.0) * trend;

        let mut seasonals: Vec<f64> = (0..period)
            .map(|i| ((values[i] - line(i)) + (values[period + i] - line(period + i))) / 2.0)
            .collect();
        let adjustment = seasonals.iter().sum::<f64>() / m;
        for s in seasonals.iter_mut() {
            *s -= adjustment;
        }

        let level = first_mean - (m + 1.0) / 2.0 * trend;
        (level, trend, seasonals)
    }

    fn smooth(values: &[f64], period: usize, alpha: f64, beta: f64, gamma: f64) -> SmoothingPass {
        let (mut level, mut trend, mut seasonals) = Self::initialize(values, period);
        let mut fitted = Vec::with_capacity(values.len());
        let mut sse = 0.0;

        for (t, &y) in values.iter().enumerate() {
            let idx = t % period;
            let s = seasonals[idx];
            let prediction = level + trend + s;
            fitted.push(prediction);
            sse += (y - prediction).powi(2);

            let level_prev = level;
            level = alpha * (y - s) + (1.0 - alpha) * (level_prev + trend);
            trend = beta * (level - level_prev) + (1.0 - beta) * trend;
            seasonals[idx] = gamma * (y - level) + (1.0 - gamma) * s;
        }

        SmoothingPass {
            level,
            trend,
            seasonals,
            fitted,
            sse,
        }
    }

    fn optimize_params(values: &[f64], period: usize) -> (f64, f64, f64) {
        let mut best = (PARAMETER_GRID[0], PARAMETER_GRID[0], PARAMETER_GRID[0]);
        let mut best_sse = f64::INFINITY;

        for &alpha in &PARAMETER_GRID {
            for &beta in &PARAMETER_GRID {
                for &gamma in &PARAMETER_GRID {
                    let sse = Self::smooth(values, period, alpha, beta, gamma).sse;
                    if sse < best_sse {
                        best_sse = sse;
                        best = (alpha, beta, gamma);
                    }
                }
            }
        }

        debug!(
            "Holt-Winters grid search: alpha={}, beta={}, gamma={}, sse={:.4}",
            best.0, best.1, best.2, best_sse
        );
        best
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Forecast {
    pub predicted_revenue: f64,
    pub predicted_profit: f64,
    pub avg_growth: f64,
    pub predicted_revenue_series: Vec<f64>,
    pub predicted_profit_series: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ForecastOutcome {
    Ready(Forecast),
    Failed { error: String },
}

impl ForecastOutcome {
    pub fn ready(&self) -> Option<&Forecast> {
        match self {
            Self::Ready(f) => Some(f),
            Self::Failed { .. } => None,
        }
    }
}

pub struct Forecaster;

impl Forecaster {
    /// Fits Holt-Winters on the table's revenue and projects one period ahead.
    pub fn forecast(table: &RevenueTable, period: usize) -> ForecastOutcome {
        match Self::try_forecast(table, period) {
            Ok(forecast) => ForecastOutcome::Ready(forecast),
            Err(e) => {
                warn!("Forecast unavailable: {}", e);
                ForecastOutcome::Failed {
                    error: format!("Forecast unavailable: {}", e),
                }
            }
        }
    }

    fn try_forecast(table: &RevenueTable, period: usize) -> Result<Forecast> {
        let mut model = HoltWinters::auto(period);
        model.fit(&table.revenue)?;

        let predicted_revenue = model
            .forecast(1)
            .and_then(|f| f.first().copied())
            .ok_or(AnalysisError::InsufficientData {
                needed: 2 * period,
                got: table.len(),
            })?;
        let fitted = model.fitted().unwrap_or_default().to_vec();
        if let (Some((alpha, beta, gamma)), Some(sse)) = (model.params(), model.sse()) {
            debug!(
                "Holt-Winters fit over {} points, period {}: alpha={}, beta={}, gamma={}, sse={:.4}",
                fitted.len(),
                period,
                alpha,
                beta,
                gamma,
                sse
            );
        }

        let last_cost = table.last_cost().unwrap_or(0.0);
        let predicted_profit_series = fitted
            .iter()
            .zip(&table.cost)
            .map(|(f, c)| f - c)
            .collect();
        let avg_growth = mean(&percent_changes(&table.revenue)).unwrap_or(0.0) * 100.0;

        Ok(Forecast {
            predicted_revenue,
            predicted_profit: predicted_revenue - last_cost,
            avg_growth,
            predicted_revenue_series: fitted,
            predicted_profit_series,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, NaiveDate};

    fn table(revenue: &[f64], cost: &[f64]) -> RevenueTable {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap();
        RevenueTable {
            timestamps: (0..revenue.len() as i64)
                .map(|i| start + Duration::hours(i))
                .collect(),
            revenue: revenue.to_vec(),
            cost: cost.to_vec(),
        }
    }

    #[test]
    fn test_pure_seasonal_series_is_exact() {
        let pattern = [60.0, 45.0, 50.0, 45.0];
        let values: Vec<f64> = (0..16).map(|i| pattern[i % 4]).collect();

        let mut model = HoltWinters::auto(4);
        model.fit(&values).unwrap();

        assert!(model.sse().unwrap() < 1e-9);
        let fitted = model.fitted().unwrap();
        for (f, v) in fitted.iter().zip(&values) {
            assert!((f - v).abs() < 1e-9);
        }

        let next = model.forecast(2).unwrap();
        assert!((next[0] - 60.0).abs() < 1e-9);
        assert!((next[1] - 45.0).abs() < 1e-9);
    }

    #[test]
    fn test_trending_series_projects_upward() {
        let values: Vec<f64> = (0..20).map(|i| 10.0 + 5.0 * i as f64).collect();
        let mut model = HoltWinters::auto(2);
        model.fit(&values).unwrap();

        let next = model.forecast(1).unwrap()[0];
        assert!(next > 100.0 && next < 120.0, "forecast {}", next);
        assert!(model.params().is_some());
    }

    #[test]
    fn test_fitted_values_are_predictions_not_observations() {
        let pattern = [
            0.0, 5.0, 12.0, 20.0, 25.0, 22.0, 15.0, 8.0, 2.0, -4.0, -8.0, -3.0,
        ];
        let values: Vec<f64> = (0..48)
            .map(|t| 200.0 + 3.0 * t as f64 + pattern[t % 12] + ((t * 7) % 5) as f64 - 2.0)
            .collect();

        let mut model = HoltWinters::auto(12);
        model.fit(&values).unwrap();
        let fitted = model.fitted().unwrap();

        assert_eq!(fitted.len(), values.len());
        let echoed = fitted[..12]
            .iter()
            .zip(&values[..12])
            .filter(|(f, v)| (*f - *v).abs() < 1e-9)
            .count();
        assert_eq!(echoed, 0);

        let sse: f64 = fitted
            .iter()
            .zip(&values)
            .map(|(f, v)| (v - f).powi(2))
            .sum();
        assert!((sse - model.sse().unwrap()).abs() < 1e-6);
    }

    #[test]
    fn test_linear_series_is_fitted_exactly() {
        let values: Vec<f64> = (0..12).map(|i| 10.0 + 5.0 * i as f64).collect();
        let mut model = HoltWinters::auto(3);
        model.fit(&values).unwrap();

        for (f, v) in model.fitted().unwrap().iter().zip(&values) {
            assert!((f - v).abs() < 1e-9);
        }
        assert!((model.forecast(1).unwrap()[0] - 70.0).abs() < 1e-9);
    }

    #[test]
    fn test_fit_requires_two_cycles() {
        let mut model = HoltWinters::auto(4);
        let err = model.fit(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap_err();
        assert!(matches!(
            err,
            AnalysisError::InsufficientData { needed: 8, got: 5 }
        ));
    }

    #[test]
    fn test_forecaster_outputs() {
        let pattern = [60.0, 45.0, 50.0, 45.0];
        let revenue: Vec<f64> = (0..12).map(|i| pattern[i % 4]).collect();
        let cost = vec![20.0; 12];

        let outcome = Forecaster::forecast(&table(&revenue, &cost), 4);
        let forecast = outcome.ready().expect("forecast should be ready");

        assert!((forecast.predicted_revenue - 60.0).abs() < 1e-9);
        assert!((forecast.predicted_profit - 40.0).abs() < 1e-9);
        assert_eq!(forecast.predicted_revenue_series.len(), 12);
        assert_eq!(forecast.predicted_profit_series.len(), 12);
        assert!((forecast.predicted_profit_series[1] - 25.0).abs() < 1e-9);

        let json = serde_json::to_value(&outcome).unwrap();
        assert!(json["predictedRevenue"].is_number());
        assert!(json["predictedRevenueSeries"].is_array());
        assert!(json.get("error").is_none());
    }

    #[test]
    fn test_avg_growth_is_mean_percent_change() {
        let revenue = [100.0, 110.0, 121.0, 133.1];
        let outcome = Forecaster::forecast(&table(&revenue, &[0.0; 4]), 2);
        let forecast = outcome.ready().unwrap();
        assert!((forecast.avg_growth - 10.0).abs() < 1e-9);
    }

    #[test]
    fn test_forecaster_failure_is_reported() {
        let outcome = Forecaster::forecast(&table(&[100.0], &[10.0]), 2);
        assert!(outcome.ready().is_none());

        let json = serde_json::to_value(&outcome).unwrap();
        let error = json["error"].as_str().unwrap();
        assert!(error.contains("need at least 4"));
        assert!(json.get("predictedRevenue").is_none());
    }
}
