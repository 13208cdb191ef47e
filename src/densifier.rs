use crate::ingestion::RevenueTable;
use chrono::Duration;
use log::{debug, info, warn};
use splines::{Interpolation, Key, Spline};

/// Resamples sparse tables onto a uniform grid so decomposition has enough points.
pub struct DensityBooster {
    target: usize,
    intervals_hours: Vec<u32>,
    max_points: usize,
}

impl DensityBooster {
    pub fn new(target: usize, intervals_hours: Vec<u32>, max_points: usize) -> Self {
        Self {
            target,
            intervals_hours,
            max_points,
        }
    }

    /// Returns the table unchanged when it already has `target` rows, otherwise the
    /// first candidate interval reaching `target`, otherwise the last (finest)
    /// candidate whatever its size. The input comes back unchanged only when every
    /// grid exceeds `max_points`.
    pub fn boost(&self, table: &RevenueTable) -> RevenueTable {
        if table.len() >= self.target {
            debug!(
                "Table has {} rows (target {}), no resampling needed",
                table.len(),
                self.target
            );
            return table.clone();
        }

        if table.len() < 2 {
            debug!("Table has {} rows, nothing to interpolate", table.len());
            return table.clone();
        }

        let mut best: Option<(u32, RevenueTable)> = None;

        for &hours in &self.intervals_hours {
            let Some(candidate) = self.resample(table, hours) else {
                continue;
            };

            if candidate.len() >= self.target {
                info!(
                    "Resampled {} rows to {} rows at {}h interval",
                    table.len(),
                    candidate.len(),
                    hours
                );
                return candidate;
            }

            debug!(
                "{}h interval yields {} rows, below target {}",
                hours,
                candidate.len(),
                self.target
            );
            best = Some((hours, candidate));
        }

        match best {
            Some((hours, candidate)) => {
                info!(
                    "No interval reached {} rows, using {}h interval with {} rows (input had {})",
                    self.target,
                    hours,
                    candidate.len(),
                    table.len()
                );
                candidate
            }
            None => {
                warn!(
                    "Every resampling interval exceeds {} points, keeping original table",
                    self.max_points
                );
                table.clone()
            }
        }
    }

    /// Builds a uniform grid from the first to the last timestamp and fills it by
    /// linear interpolation in time. `None` when the grid would be too large.
    fn resample(&self, table: &RevenueTable, hours: u32) -> Option<RevenueTable> {
        let first = *table.timestamps.first()?;
        let last = *table.timestamps.last()?;
        let step = i64::from(hours) * 3600;
        let span = (last - first).num_seconds();

        let count = usize::try_from(span / step).ok()? + 1;
        if count > self.max_points {
            debug!(
                "{}h interval would create {} points (max {})",
                hours, count, self.max_points
            );
            return None;
        }

        let offsets: Vec<f64> = table
            .timestamps
            .iter()
            .map(|ts| (*ts - first).num_seconds() as f64)
            .collect();
        let revenue = linear_spline(&offsets, &table.revenue);
        let cost = linear_spline(&offsets, &table.cost);

        let mut resampled = RevenueTable::default();
        for i in 0..count {
            let offset = i as i64 * step;
            let t = offset as f64;
            resampled.timestamps.push(first + Duration::seconds(offset));
            resampled
                .revenue
                .push(revenue.clamped_sample(t).unwrap_or(f64::NAN));
            resampled.cost.push(cost.clamped_sample(t).unwrap_or(f64::NAN));
        }

        Some(resampled)
    }
}

fn linear_spline(offsets: &[f64], values: &[f64]) -> Spline<f64, f64> {
    let keys: Vec<Key<f64, f64>> = offsets
        .iter()
        .zip(values)
        .map(|(&t, &v)| Key::new(t, v, Interpolation::Linear))
        .collect();
    Spline::from_vec(keys)
}
