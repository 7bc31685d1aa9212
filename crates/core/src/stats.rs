//! Pure numeric kernels used by the execution engine.
//!
//! Every function here is deterministic over its inputs; the engine feeds
//! them pre-filtered, time-ordered readings.

use chrono::{DateTime, Datelike, Duration, Timelike, Utc};

use crate::domain::{Cadence, Statistic};

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

pub fn min(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::min)
}

pub fn max(values: &[f64]) -> Option<f64> {
    values.iter().copied().reduce(f64::max)
}

pub fn sum(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum())
}

/// Sample standard deviation (n - 1 denominator). Needs at least two points.
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let mean = mean(values)?;
    let variance =
        values.iter().map(|value| (value - mean).powi(2)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

pub fn count_above(values: &[f64], threshold: f64) -> usize {
    values.iter().filter(|value| **value > threshold).count()
}

/// Linearly interpolated quantile over a pre-sorted slice, `q` in `[0, 1]`.
pub fn quantile(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    if sorted.len() == 1 {
        return Some(sorted[0]);
    }
    let position = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    if lower == upper {
        return Some(sorted[lower]);
    }
    let weight = position - lower as f64;
    Some(sorted[lower] * (1.0 - weight) + sorted[upper] * weight)
}

pub fn apply_statistic(statistic: Statistic, values: &[f64]) -> Option<f64> {
    match statistic {
        Statistic::Mean => mean(values),
        Statistic::Min => min(values),
        Statistic::Max => max(values),
        Statistic::Sum => sum(values),
    }
}

/// Start of the bucket an instant falls into: top of the hour, midnight, or
/// Monday midnight of the ISO week.
pub fn bucket_start(instant: DateTime<Utc>, cadence: Cadence) -> DateTime<Utc> {
    let midnight = instant
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .map(|naive| naive.and_utc())
        .unwrap_or(instant);
    match cadence {
        Cadence::Hourly => midnight + Duration::hours(i64::from(instant.hour())),
        Cadence::Daily => midnight,
        Cadence::Weekly => {
            midnight - Duration::days(i64::from(instant.weekday().num_days_from_monday()))
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    #[test]
    fn mean_and_sum_over_known_values() {
        let values = [70.0, 71.0, 73.0];
        assert!((mean(&values).unwrap() - 214.0 / 3.0).abs() < 1e-12);
        assert_eq!(sum(&values), Some(214.0));
        assert_eq!(min(&values), Some(70.0));
        assert_eq!(max(&values), Some(73.0));
    }

    #[test]
    fn empty_input_yields_none() {
        assert_eq!(mean(&[]), None);
        assert_eq!(sum(&[]), None);
        assert_eq!(min(&[]), None);
        assert_eq!(sample_std_dev(&[]), None);
        assert_eq!(quantile(&[], 0.5), None);
    }

    #[test]
    fn std_dev_requires_two_points() {
        assert_eq!(sample_std_dev(&[42.0]), None);
        let spread = sample_std_dev(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert!((spread.unwrap() - 2.138089935299395).abs() < 1e-12);
    }

    #[test]
    fn quantiles_interpolate_linearly() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(quantile(&sorted, 0.0), Some(1.0));
        assert_eq!(quantile(&sorted, 0.5), Some(2.5));
        assert_eq!(quantile(&sorted, 1.0), Some(4.0));
    }

    #[test]
    fn count_above_is_strict() {
        assert_eq!(count_above(&[1.0, 2.0, 3.0], 2.0), 1);
    }

    #[test]
    fn bucket_start_truncates_per_cadence() {
        // 2026-08-19 is a Wednesday.
        let instant = Utc.with_ymd_and_hms(2026, 8, 19, 14, 35, 12).unwrap();
        assert_eq!(
            bucket_start(instant, Cadence::Hourly),
            Utc.with_ymd_and_hms(2026, 8, 19, 14, 0, 0).unwrap()
        );
        assert_eq!(
            bucket_start(instant, Cadence::Daily),
            Utc.with_ymd_and_hms(2026, 8, 19, 0, 0, 0).unwrap()
        );
        assert_eq!(
            bucket_start(instant, Cadence::Weekly),
            Utc.with_ymd_and_hms(2026, 8, 17, 0, 0, 0).unwrap()
        );
    }
}
