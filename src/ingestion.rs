use crate::schema::AnalysisItem;
use crate::utils::parse_period_timestamp;
use chrono::NaiveDateTime;
use log::{debug, warn};
use std::collections::BTreeMap;

/// Revenue and cost columns indexed by timestamp, sorted ascending.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RevenueTable {
    pub timestamps: Vec<NaiveDateTime>,
    pub revenue: Vec<f64>,
    pub cost: Vec<f64>,
}

impl RevenueTable {
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn last_cost(&self) -> Option<f64> {
        self.cost.last().copied()
    }

    /// Seconds between the first two rows, if there are two.
    pub fn first_gap_seconds(&self) -> Option<i64> {
        match self.timestamps.as_slice() {
            [first, second, ..] => Some((*second - *first).num_seconds()),
            _ => None,
        }
    }
}

#[derive(Default)]
struct Bucket {
    revenue_sum: f64,
    cost_sum: f64,
    count: usize,
}

pub struct TimeSeriesNormalizer;

impl TimeSeriesNormalizer {
    /// Builds a sorted table from raw items.
    ///
    /// Rows whose period cannot be parsed are dropped; rows sharing a timestamp
    /// are averaged into one.
    pub fn normalize(items: &[AnalysisItem]) -> RevenueTable {
        let mut buckets: BTreeMap<NaiveDateTime, Bucket> = BTreeMap::new();
        let mut dropped = 0usize;

        for item in items {
            let ts = match parse_period_timestamp(&item.period) {
                Ok(ts) => ts,
                Err(e) => {
                    warn!("Dropping row with unparseable period: {}", e);
                    dropped += 1;
                    continue;
                }
            };

            let bucket = buckets.entry(ts).or_default();
            bucket.revenue_sum += item.revenue;
            bucket.cost_sum += item.cost;
            bucket.count += 1;
        }

        let mut table = RevenueTable::default();
        for (ts, bucket) in buckets {
            let n = bucket.count as f64;
            table.timestamps.push(ts);
            table.revenue.push(bucket.revenue_sum / n);
            table.cost.push(bucket.cost_sum / n);
        }

        debug!(
            "Normalized {} items into {} rows ({} dropped)",
            items.len(),
            table.len(),
            dropped
        );

        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

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
    fn test_sorts_by_timestamp() {
        let items = vec![
            item("2024-01-03", 300.0, 30.0),
            item("2024-01-01", 100.0, 10.0),
            item("2024-01-02", 200.0, 20.0),
        ];

        let table = TimeSeriesNormalizer::normalize(&items);
        assert_eq!(table.revenue, vec![100.0, 200.0, 300.0]);
        assert_eq!(table.cost, vec![10.0, 20.0, 30.0]);
        assert_eq!(
            table.timestamps[0].date(),
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
        );
        assert_eq!(table.first_gap_seconds(), Some(86_400));
        assert_eq!(table.last_cost(), Some(30.0));
    }

    #[test]
    fn test_drops_unparseable_periods() {
        let items = vec![
            item("2024-01-01", 100.0, 10.0),
            item("yesterday", 999.0, 99.0),
            item("2024-01-02", 200.0, 20.0),
        ];

        let table = TimeSeriesNormalizer::normalize(&items);
        assert_eq!(table.len(), 2);
        assert!(!table.revenue.contains(&999.0));
    }

    #[test]
    fn test_merges_duplicate_timestamps() {
        let items = vec![
            item("2024-01-01", 100.0, 10.0),
            item("2024-01-01", 300.0, 30.0),
        ];

        let table = TimeSeriesNormalizer::normalize(&items);
        assert_eq!(table.len(), 1);
        assert_eq!(table.revenue[0], 200.0);
        assert_eq!(table.cost[0], 20.0);
        assert_eq!(table.first_gap_seconds(), None);
    }

    #[test]
    fn test_empty_input() {
        let table = TimeSeriesNormalizer::normalize(&[]);
        assert!(table.is_empty());
        assert_eq!(table.last_cost(), None);
    }
}
