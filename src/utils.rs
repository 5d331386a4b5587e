use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

/// Lossy conversion of a balance to f64 for statistics.
pub fn to_f64(value: &Decimal) -> f64 {
    value.to_f64().unwrap_or(0.0)
}

/// Arithmetic mean, None for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator).
///
/// Undefined for less than 2 values.
pub fn sample_std_dev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let ss: f64 = values.iter().map(|v| (v - m).powi(2)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

/// Pearson correlation coefficient of two equally long series.
///
/// Returns None if lengths differ, for less than 2 points, or when
/// either series has zero variance.
pub fn pearson(xs: &[f64], ys: &[f64]) -> Option<f64> {
    if xs.len() != ys.len() || xs.len() < 2 {
        return None;
    }
    let mx = mean(xs)?;
    let my = mean(ys)?;
    let mut sxy = 0.0;
    let mut sxx = 0.0;
    let mut syy = 0.0;
    for (x, y) in xs.iter().zip(ys) {
        let dx = x - mx;
        let dy = y - my;
        sxy += dx * dy;
        sxx += dx * dx;
        syy += dy * dy;
    }
    if sxx == 0.0 || syy == 0.0 {
        return None;
    }
    Some((sxy / (sxx.sqrt() * syy.sqrt())).clamp(-1.0, 1.0))
}

/// Round date to monday of same week.
pub fn week_start(date: &time::Date) -> time::Date {
    match date.weekday() {
        time::Weekday::Monday => *date,
        _ => date.prev_occurrence(time::Weekday::Monday),
    }
}

/// Sunday of the week starting at `monday`.
pub fn week_end(monday: &time::Date) -> time::Date {
    *monday + time::Duration::days(6)
}
