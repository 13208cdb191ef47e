use crate::error::{AnalysisError, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Weekday};

/// Reference day for hour-only labels such as `"08:00"`.
pub fn hour_anchor_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(1970, 1, 1).unwrap_or_default()
}

const DATETIME_FORMATS: [&str; 6] = [
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
];

/// Parses a period label into a timestamp.
///
/// Accepts RFC 3339, `YYYY-MM-DD[ HH:MM[:SS]]`, `YYYY-MM`, ISO weeks (`YYYY-Www`,
/// resolved to the Monday) and hour-of-day labels (`HH:MM`, `HH`, `Hh`) which are
/// placed on [`hour_anchor_date`].
pub fn parse_period_timestamp(period: &str) -> Result<NaiveDateTime> {
    let period = period.trim();
    if period.is_empty() {
        return Err(AnalysisError::InvalidPeriodString(
            "empty period label".to_string(),
        ));
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(period) {
        return Ok(dt.naive_utc());
    }

    for format in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(period, format) {
            return Ok(dt);
        }
    }

    if let Ok(date) = NaiveDate::parse_from_str(period, "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN));
    }

    if let Some(dt) = parse_iso_week(period) {
        return Ok(dt);
    }

    // "2023-01" style month labels
    if let Ok(date) = NaiveDate::parse_from_str(&format!("{}-01", period), "%Y-%m-%d") {
        return Ok(date.and_time(NaiveTime::MIN));
    }

    if let Some(time) = parse_hour_label(period) {
        return Ok(hour_anchor_date().and_time(time));
    }

    Err(AnalysisError::InvalidPeriodString(format!(
        "'{}' is not a recognised date, week, month or hour label",
        period
    )))
}

fn parse_iso_week(period: &str) -> Option<NaiveDateTime> {
    let (year, week) = period
        .split_once("-W")
        .or_else(|| period.split_once("-w"))?;
    let year: i32 = year.parse().ok()?;
    let week: u32 = week.parse().ok()?;
    NaiveDate::from_isoywd_opt(year, week, Weekday::Mon).map(|d| d.and_time(NaiveTime::MIN))
}

fn parse_hour_label(period: &str) -> Option<NaiveTime> {
    if let Ok(time) = NaiveTime::parse_from_str(period, "%H:%M") {
        return Some(time);
    }

    let digits = period
        .strip_suffix('h')
        .or_else(|| period.strip_suffix('H'))
        .unwrap_or(period);
    if digits.is_empty() || digits.len() > 2 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let hour: u32 = digits.parse().ok()?;
    NaiveTime::from_hms_opt(hour, 0, 0)
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator).
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let avg = mean(values)?;
    let var = values.iter().map(|v| (v - avg).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(var.sqrt())
}

pub fn first_differences(values: &[f64]) -> Vec<f64> {
    values.windows(2).map(|w| w[1] - w[0]).collect()
}

/// Period-over-period percentage changes.
///
/// Changes with an undefined ratio (0 / 0) are skipped; a change away from zero
/// yields an infinity, which callers are expected to sanitize.
pub fn percent_changes(values: &[f64]) -> Vec<f64> {
    values
        .windows(2)
        .map(|w| (w[1] - w[0]) / w[0])
        .filter(|c| !c.is_nan())
        .collect()
}

/// Formats a value with comma thousands separators and no decimals.
pub fn format_thousands(value: f64) -> String {
    if !value.is_finite() {
        return "0".to_string();
    }
    let rounded = value.round();
    let digits = format!("{:.0}", rounded.abs());

    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    if rounded < 0.0 {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// Formats the magnitude of a percentage without trailing zeros ("10", "7.5").
pub fn format_percent(value: f64) -> String {
    let text = format!("{:.2}", value.abs());
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_parse_day_and_month_labels() {
        let day = parse_period_timestamp("2024-03-15").unwrap();
        assert_eq!(day.date(), NaiveDate::from_ymd_opt(2024, 3, 15).unwrap());

        let month = parse_period_timestamp("2024-03").unwrap();
        assert_eq!(month.date(), NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    }

    #[test]
    fn test_parse_datetime_labels() {
        let dt = parse_period_timestamp("2024-03-15 13:30:00").unwrap();
        assert_eq!(dt.hour(), 13);
        assert_eq!(dt.minute(), 30);

        let rfc = parse_period_timestamp("2024-03-15T06:00:00+07:00").unwrap();
        assert_eq!(rfc.hour(), 23);
        assert_eq!(rfc.day(), 14);
    }

    #[test]
    fn test_parse_iso_week() {
        let week = parse_period_timestamp("2024-W02").unwrap();
        assert_eq!(week.date(), NaiveDate::from_ymd_opt(2024, 1, 8).unwrap());
    }

    #[test]
    fn test_parse_hour_labels() {
        for label in ["08:00", "8", "08", "8h"] {
            let dt = parse_period_timestamp(label).unwrap();
            assert_eq!(dt.date(), hour_anchor_date(), "label {}", label);
            assert_eq!(dt.hour(), 8, "label {}", label);
        }
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_period_timestamp("").is_err());
        assert!(parse_period_timestamp("not a date").is_err());
        assert!(parse_period_timestamp("25h").is_err());
    }

    #[test]
    fn test_statistics_helpers() {
        assert_eq!(mean(&[]), None);
        assert_eq!(mean(&[1.0, 2.0, 3.0]), Some(2.0));
        assert_eq!(first_differences(&[1.0, 4.0, 2.0]), vec![3.0, -2.0]);

        let std = sample_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert!((std - 2.138089935).abs() < 1e-6);
        assert_eq!(sample_std(&[1.0]), None);
    }

    #[test]
    fn test_percent_changes() {
        let changes = percent_changes(&[100.0, 110.0, 0.0, 0.0, 5.0]);
        assert_eq!(changes.len(), 3);
        assert!((changes[0] - 0.1).abs() < 1e-12);
        assert_eq!(changes[1], -1.0);
        assert!(changes[2].is_infinite());
    }

    #[test]
    fn test_format_thousands() {
        assert_eq!(format_thousands(0.0), "0");
        assert_eq!(format_thousands(999.4), "999");
        assert_eq!(format_thousands(1234567.8), "1,234,568");
        assert_eq!(format_thousands(-45000.0), "-45,000");
        assert_eq!(format_thousands(f64::NAN), "0");
    }

    #[test]
    fn test_format_percent() {
        assert_eq!(format_percent(10.0), "10");
        assert_eq!(format_percent(-7.5), "7.5");
        assert_eq!(format_percent(0.126), "0.13");
    }
}
