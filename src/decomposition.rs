//! Additive trend/seasonal/residual decomposition of the revenue series.
//!
//! The classical centered-moving-average decomposition is attempted first.
//! When the series is too short or otherwise unusable a rolling-mean
//! approximation is returned instead, so callers always get components of the
//! same length as the input unless the input is empty.

use crate::error::{AnalysisError, Result};
use log::{debug, warn};
use serde::{Serialize, Serializer};

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Decomposition {
    pub trend: Vec<f64>,
    pub seasonal: Vec<f64>,
    pub resid: Vec<f64>,
    pub period_used: usize,
}

impl Decomposition {
    pub fn len(&self) -> usize {
        self.trend.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trend.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DecompositionOutcome {
    /// Classical decomposition succeeded.
    Full(Decomposition),
    /// Classical decomposition was not possible; components come from the
    /// rolling-mean approximation.
    Fallback {
        decomposition: Decomposition,
        reason: String,
    },
    /// Nothing to decompose.
    Failed { period_used: usize, reason: String },
}

impl DecompositionOutcome {
    /// Components usable for scenario replay, if any.
    pub fn components(&self) -> Option<&Decomposition> {
        match self {
            Self::Full(d) => Some(d),
            Self::Fallback { decomposition, .. } => Some(decomposition),
            Self::Failed { .. } => None,
        }
    }

    pub fn period_used(&self) -> usize {
        match self {
            Self::Full(d) => d.period_used,
            Self::Fallback { decomposition, .. } => decomposition.period_used,
            Self::Failed { period_used, .. } => *period_used,
        }
    }

    pub fn note(&self) -> Option<String> {
        match self {
            Self::Fallback {
                decomposition,
                reason,
            } => Some(format!(
                "Seasonal decomposition with period {} was not possible ({}); \
                 components were approximated with rolling means",
                decomposition.period_used, reason
            )),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed { reason, .. } => Some(reason),
            _ => None,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback { .. })
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct DecompositionView<'a> {
    trend: &'a [f64],
    seasonal: &'a [f64],
    resid: &'a [f64],
    period_used: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    note: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<&'a str>,
}

impl Serialize for DecompositionOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let empty: &[f64] = &[];
        let (trend, seasonal, resid) = match self.components() {
            Some(d) => (&d.trend[..], &d.seasonal[..], &d.resid[..]),
            None => (empty, empty, empty),
        };

        DecompositionView {
            trend,
            seasonal,
            resid,
            period_used: self.period_used(),
            note: self.note(),
            error: self.error(),
        }
        .serialize(serializer)
    }
}

pub struct Decomposer {
    min_points: usize,
}

impl Decomposer {
    pub fn new(min_points: usize) -> Self {
        Self { min_points }
    }

    pub fn decompose(&self, series: &[f64], period: usize) -> DecompositionOutcome {
        if series.is_empty() {
            warn!("No revenue data to decompose");
            return DecompositionOutcome::Failed {
                period_used: period,
                reason: "no revenue data available for decomposition".to_string(),
            };
        }

        match self.classical(series, period) {
            Ok(decomposition) => {
                debug!(
                    "Classical decomposition of {} points with period {}",
                    series.len(),
                    period
                );
                DecompositionOutcome::Full(decomposition)
            }
            Err(e) => {
                warn!("Falling back to rolling-mean decomposition: {}", e);
                DecompositionOutcome::Fallback {
                    decomposition: rolling_fallback(series, period),
                    reason: e.to_string(),
                }
            }
        }
    }

    fn classical(&self, series: &[f64], period: usize) -> Result<Decomposition> {
        let n = series.len();
        if n < self.min_points {
            return Err(AnalysisError::InsufficientData {
                needed: self.min_points,
                got: n,
            });
        }

        if period < 2 {
            return Err(AnalysisError::InvalidPeriod(period));
        }

        let non_finite = series.iter().filter(|v| !v.is_finite()).count();
        if non_finite > 0 {
            return Err(AnalysisError::NonFiniteValues(non_finite));
        }

        if n < 2 * period {
            return Err(AnalysisError::InsufficientData {
                needed: 2 * period,
                got: n,
            });
        }

        let trend = centered_moving_average(series, period);
        let detrended: Vec<f64> = series.iter().zip(&trend).map(|(x, t)| x - t).collect();

        let mut averages: Vec<f64> = (0..period)
            .map(|pos| {
                let values: Vec<f64> = detrended
                    .iter()
                    .skip(pos)
                    .step_by(period)
                    .copied()
                    .filter(|v| v.is_finite())
                    .collect();
                if values.is_empty() {
                    0.0
                } else {
                    values.iter().sum::<f64>() / values.len() as f64
                }
            })
            .collect();

        let offset = averages.iter().sum::<f64>() / period as f64;
        for avg in averages.iter_mut() {
            *avg -= offset;
        }

        let seasonal: Vec<f64> = (0..n).map(|i| averages[i % period]).collect();
        let resid: Vec<f64> = detrended
            .iter()
            .zip(&seasonal)
            .map(|(d, s)| zero_if_nan(d - s))
            .collect();

        Ok(Decomposition {
            trend: trend.into_iter().map(zero_if_nan).collect(),
            seasonal,
            resid,
            period_used: period,
        })
    }
}

/// Centered moving average; a `2 x period` filter for even periods. The first and
/// last `period / 2` positions are NaN.
fn centered_moving_average(series: &[f64], period: usize) -> Vec<f64> {
    let weights: Vec<f64> = if period % 2 == 0 {
        let mut w = vec![1.0 / period as f64; period + 1];
        w[0] *= 0.5;
        w[period] *= 0.5;
        w
    } else {
        vec![1.0 / period as f64; period]
    };

    let half = weights.len() / 2;
    let n = series.len();
    let mut trend = vec![f64::NAN; n];
    if n < weights.len() {
        return trend;
    }

    for (i, slot) in trend.iter_mut().enumerate().take(n - half).skip(half) {
        *slot = weights
            .iter()
            .zip(&series[i - half..=i + half])
            .map(|(w, x)| w * x)
            .sum();
    }

    trend
}

/// Rolling-mean approximation used when classical decomposition is impossible.
pub fn rolling_fallback(series: &[f64], period: usize) -> Decomposition {
    let n = series.len();
    let window = (n / 2).max(2);

    let trend: Vec<f64> = (0..n)
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            let finite: Vec<f64> = series[start..=i]
                .iter()
                .copied()
                .filter(|v| v.is_finite())
                .collect();
            if finite.is_empty() {
                f64::NAN
            } else {
                finite.iter().sum::<f64>() / finite.len() as f64
            }
        })
        .collect();

    let seasonal_raw: Vec<f64> = (0..n)
        .map(|i| {
            if i == 0 {
                f64::NAN
            } else {
                series[i] - (trend[i - 1] + trend[i]) / 2.0
            }
        })
        .collect();

    let resid: Vec<f64> = (0..n)
        .map(|i| zero_if_nan(series[i] - trend[i] - seasonal_raw[i]))
        .collect();

    Decomposition {
        trend: trend.into_iter().map(zero_if_nan).collect(),
        seasonal: seasonal_raw.into_iter().map(zero_if_nan).collect(),
        resid,
        period_used: period,
    }
}

fn zero_if_nan(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value
    }
}
