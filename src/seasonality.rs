use crate::ingestion::RevenueTable;
use crate::schema::{GroupBy, PeriodType};
use log::debug;

const SECONDS_PER_HOUR: f64 = 3600.0;
const DEFAULT_GAP_HOURS: f64 = 1.0;

/// Granularity the seasonal cycle is derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Day,
    Week,
    Month,
    Other,
}

impl Granularity {
    /// Every window but `month` speaks for itself. A month window holds daily
    /// buckets by default, which is the 30-point cycle; only weekly buckets
    /// (`groupBy=week`) switch it to the 7-point cycle.
    pub fn resolve(period_type: &PeriodType, group_by: &GroupBy) -> Self {
        match period_type {
            PeriodType::Day => Self::Day,
            PeriodType::Week => Self::Week,
            PeriodType::Month => match group_by {
                GroupBy::Week => Self::Week,
                GroupBy::Day | GroupBy::Month | GroupBy::Other(_) => Self::Month,
            },
            PeriodType::Hour | PeriodType::Year | PeriodType::Other(_) => Self::Other,
        }
    }

    /// Points per cycle at the granularity's native sampling rate.
    pub fn base_period(self) -> usize {
        match self {
            Self::Day => 24,
            Self::Week => 7,
            Self::Month => 30,
            Self::Other => 12,
        }
    }
}

pub struct PeriodInferencer;

impl PeriodInferencer {
    /// Seasonal cycle length for `table`, always at least 2.
    pub fn infer(table: &RevenueTable, granularity: Granularity) -> usize {
        let base = granularity.base_period();
        let gap_hours = table
            .first_gap_seconds()
            .filter(|&s| s > 0)
            .map(|s| s as f64 / SECONDS_PER_HOUR)
            .unwrap_or(DEFAULT_GAP_HOURS);

        let scaled = rescale_period(base, gap_hours);
        let period = shrink_to_length(scaled, table.len());

        debug!(
            "Seasonal period: base {} ({:?}), gap {:.2}h, scaled {}, used {}",
            base,
            granularity,
            gap_hours,
            scaled,
            period
        );

        period
    }
}

/// `max(2, floor(base * points_per_day / 24))` with `points_per_day = 24 / gap_hours`.
pub fn rescale_period(base: usize, gap_hours: f64) -> usize {
    let points_per_day = 24.0 / gap_hours;
    let scaled = (base as f64 * points_per_day / 24.0).floor();
    if scaled.is_finite() && scaled >= 2.0 {
        scaled as usize
    } else {
        2
    }
}

/// Series shorter than two cycles fall back to a third of their length.
pub fn shrink_to_length(period: usize, len: usize) -> usize {
    if len < period * 2 {
        (len / 3).max(2)
    } else {
        period
    }
}
