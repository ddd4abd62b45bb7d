//! Small numeric helpers shared by the analysis and portfolio code

/// Round to two decimal places (the storage precision for percentages)
pub fn round2(value: f64) -> f64 {
    if !value.is_finite() {
        return 0.0;
    }
    (value * 100.0).round() / 100.0
}

/// Percentage change from `old` to `new`.
///
/// Returns 0 when either price is missing, non-finite or non-positive.
pub fn pct_change(old: Option<f64>, new: Option<f64>) -> f64 {
    match (old, new) {
        (Some(old), Some(new)) if old > 0.0 && new > 0.0 && old.is_finite() && new.is_finite() => {
            (new - old) / old * 100.0
        }
        _ => 0.0,
    }
}

/// Mean of the trailing `period` values (fewer if the slice is shorter)
pub fn trailing_mean(values: &[f64], period: usize) -> Option<f64> {
    if values.is_empty() || period == 0 {
        return None;
    }
    let start = values.len().saturating_sub(period);
    let window = &values[start..];
    Some(window.iter().sum::<f64>() / window.len() as f64)
}

/// Value at the given quantile of an ascending sort, indexed as `floor(len * q)`
pub fn percentile(values: &[f64], quantile: f64) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(|a, b| a.total_cmp(b));
    let idx = ((sorted.len() as f64) * quantile).floor() as usize;
    Some(sorted[idx.min(sorted.len() - 1)])
}

/// Weighted momentum blend of 3M/6M/1Y performance
pub fn momentum_score(perf_3m: f64, perf_6m: f64, perf_1y: f64) -> f64 {
    perf_3m * 0.4 + perf_6m * 0.4 + perf_1y * 0.2
}
