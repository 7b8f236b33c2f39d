use std::time::Duration;

pub fn mean(data: &[f64]) -> Option<f64> {
    let sum = data.iter().sum::<f64>();
    let count = data.len();

    match count {
        positive if positive > 0 => Some(sum / count as f64),
        _ => None,
    }
}

/// Mean after dropping one lowest and one highest value.
///
/// Needs at least three values, otherwise nothing would be left to average.
pub fn trimmed_mean(data: &[f64]) -> Option<f64> {
    if data.len() < 3 {
        return None;
    }

    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    mean(&sorted[1..sorted.len() - 1])
}

pub fn as_millis_f64(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}

/// Seconds with two decimals, the way every readout in the app is shown.
///
/// NaN and infinities are printed as-is (`NaN`, `inf`).
pub fn format_secs(secs: f64) -> String {
    format!("{secs:.2}")
}

pub fn format_duration(duration: Duration) -> String {
    format_secs(duration.as_secs_f64())
}
