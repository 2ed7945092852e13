// Parsing, statistics, and number-formatting helpers.
//
// This module centralizes the numeric conventions of the pipeline: any ratio
// with a zero denominator yields NaN, and every aggregate statistic skips NaN
// values instead of poisoning the result, so partial aggregates stay
// reportable.
use num_format::{Locale, ToFormattedString};
use serde::Serialize;

/// Parse a string-like value into `f64` while being forgiving about
/// formatting issues that are common in CSV exports (commas, spaces).
///
/// - Accepts `Option<&str>` so callers can pass through optional fields.
/// - Trims whitespace and strips thousands separators before parsing.
/// - Rejects values that contain alphabetic characters.
/// - Returns `None` for anything that cannot be safely parsed.
pub fn parse_f64_safe(s: Option<&str>) -> Option<f64> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    if s.chars().any(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    let s = s.replace(',', "");
    s.parse::<f64>().ok()
}

pub fn parse_u32_safe(s: Option<&str>) -> Option<u32> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    s.parse::<u32>().ok()
}

/// Parse a boolean-like CSV field. Accepts `true`/`false` in any case plus
/// `1`/`0`.
pub fn parse_bool_safe(s: Option<&str>) -> Option<bool> {
    let s = s?.trim();
    match s.to_ascii_lowercase().as_str() {
        "true" | "1" => Some(true),
        "false" | "0" => Some(false),
        _ => None,
    }
}

/// `numerator / denominator`, except a zero denominator yields NaN instead
/// of an infinity. Used for every margin and per-product ratio.
pub fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        f64::NAN
    } else {
        numerator / denominator
    }
}

fn non_nan(v: &[f64]) -> Vec<f64> {
    v.iter().copied().filter(|x| !x.is_nan()).collect()
}

/// Sum skipping NaN values. An all-NaN (or empty) slice sums to 0.
pub fn nan_sum(v: &[f64]) -> f64 {
    v.iter().copied().filter(|x| !x.is_nan()).sum()
}

/// Arithmetic mean skipping NaN values; NaN when no valid values remain.
pub fn nan_mean(v: &[f64]) -> f64 {
    let vals = non_nan(v);
    if vals.is_empty() {
        return f64::NAN;
    }
    vals.iter().sum::<f64>() / vals.len() as f64
}

/// Median skipping NaN values; NaN when no valid values remain.
pub fn nan_median(v: &[f64]) -> f64 {
    let mut vals = non_nan(v);
    if vals.is_empty() {
        return f64::NAN;
    }
    vals.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = vals.len() / 2;
    if vals.len() % 2 == 1 {
        vals[mid]
    } else {
        (vals[mid - 1] + vals[mid]) / 2.0
    }
}

/// Sample standard deviation (n-1 denominator) skipping NaN values; NaN when
/// fewer than two valid values remain.
pub fn nan_std(v: &[f64]) -> f64 {
    let vals = non_nan(v);
    if vals.len() < 2 {
        return f64::NAN;
    }
    let mean = vals.iter().sum::<f64>() / vals.len() as f64;
    let ss: f64 = vals.iter().map(|x| (x - mean) * (x - mean)).sum();
    (ss / (vals.len() - 1) as f64).sqrt()
}

/// Percentile with linear interpolation between ranks, skipping NaN values.
/// `p` is in 0..=100. NaN for an empty input.
pub fn percentile(v: &[f64], p: f64) -> f64 {
    let mut vals = non_nan(v);
    if vals.is_empty() {
        return f64::NAN;
    }
    vals.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    if vals.len() == 1 {
        return vals[0];
    }
    let rank = (p / 100.0) * (vals.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    if lo == hi {
        return vals[lo];
    }
    let frac = rank - lo as f64;
    vals[lo] + frac * (vals[hi] - vals[lo])
}

/// Pearson correlation coefficient over the pairwise-finite entries of two
/// equally long series. NaN when fewer than two pairs remain or when either
/// series is constant over those pairs (zero variance).
pub fn pearson(x: &[f64], y: &[f64]) -> f64 {
    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y.iter())
        .filter(|(a, b)| !a.is_nan() && !b.is_nan())
        .map(|(a, b)| (*a, *b))
        .collect();
    if pairs.len() < 2 {
        return f64::NAN;
    }
    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|(a, _)| a).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|(_, b)| b).sum::<f64>() / n;
    let mut cov = 0.0;
    let mut var_x = 0.0;
    let mut var_y = 0.0;
    for (a, b) in &pairs {
        cov += (a - mean_x) * (b - mean_y);
        var_x += (a - mean_x) * (a - mean_x);
        var_y += (b - mean_y) * (b - mean_y);
    }
    let denom = (var_x * var_y).sqrt();
    if denom == 0.0 {
        f64::NAN
    } else {
        cov / denom
    }
}

/// A named, symmetric Pearson correlation matrix.
#[derive(Debug, Clone, Serialize)]
pub struct CorrelationMatrix {
    pub columns: Vec<String>,
    pub values: Vec<Vec<f64>>,
}

impl CorrelationMatrix {
    /// Correlate every pair of named columns. Constant or empty columns
    /// produce NaN entries (including their diagonal).
    pub fn compute(series: &[(&str, Vec<f64>)]) -> Self {
        let columns: Vec<String> = series.iter().map(|(name, _)| name.to_string()).collect();
        let values = series
            .iter()
            .map(|(_, x)| series.iter().map(|(_, y)| pearson(x, y)).collect())
            .collect();
        CorrelationMatrix { columns, values }
    }

    /// Extract one column of the matrix as `(metric, r)` pairs, the "driver
    /// signal" for that column. Empty if the column is unknown.
    pub fn signal(&self, column: &str) -> Vec<(String, f64)> {
        match self.columns.iter().position(|c| c == column) {
            Some(idx) => self
                .columns
                .iter()
                .cloned()
                .zip(self.values[idx].iter().copied())
                .collect(),
            None => Vec::new(),
        }
    }
}

/// Format a floating-point value with a fixed number of decimal places and
/// locale-aware thousands separators (e.g. `1,234,567.89`). Non-finite
/// values render as `n/a`.
pub fn format_number(n: f64, decimals: usize) -> String {
    if !n.is_finite() {
        return "n/a".to_string();
    }
    let neg = n.is_sign_negative();
    let abs_n = n.abs();
    let s = format!("{:.*}", decimals, abs_n);
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        if decimals > 0 {
            res.push('.');
            res.push_str(frac);
        }
    } else if decimals > 0 {
        res.push('.');
        res.push_str(&"0".repeat(decimals));
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    // Thin wrapper around `num-format` for counts in console messages.
    n.to_formatted_string(&Locale::en)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ratio_zero_denominator_is_nan() {
        assert!(ratio(5.0, 0.0).is_nan());
        assert_eq!(ratio(6.0, 2.0), 3.0);
    }

    #[test]
    fn nan_statistics_skip_sentinels() {
        let v = [1.0, f64::NAN, 3.0, f64::NAN, 5.0];
        assert_eq!(nan_sum(&v), 9.0);
        assert_eq!(nan_mean(&v), 3.0);
        assert_eq!(nan_median(&v), 3.0);
        assert!((nan_std(&v) - 2.0).abs() < 1e-12);
    }

    #[test]
    fn nan_statistics_on_empty_input() {
        assert_eq!(nan_sum(&[]), 0.0);
        assert!(nan_mean(&[]).is_nan());
        assert!(nan_median(&[]).is_nan());
        assert!(nan_std(&[1.0]).is_nan());
    }

    #[test]
    fn percentile_interpolates_linearly() {
        let v = [1.0, 2.0, 3.0, 4.0];
        assert_eq!(percentile(&v, 0.0), 1.0);
        assert_eq!(percentile(&v, 100.0), 4.0);
        assert!((percentile(&v, 25.0) - 1.75).abs() < 1e-12);
        assert!((percentile(&v, 75.0) - 3.25).abs() < 1e-12);
        assert_eq!(percentile(&v, 50.0), 2.5);
    }

    #[test]
    fn percentile_single_value() {
        assert_eq!(percentile(&[7.0], 25.0), 7.0);
        assert_eq!(percentile(&[7.0], 75.0), 7.0);
    }

    #[test]
    fn pearson_perfect_and_inverse() {
        let x = [1.0, 2.0, 3.0, 4.0];
        let y = [2.0, 4.0, 6.0, 8.0];
        assert!((pearson(&x, &y) - 1.0).abs() < 1e-12);
        let z = [8.0, 6.0, 4.0, 2.0];
        assert!((pearson(&x, &z) + 1.0).abs() < 1e-12);
    }

    #[test]
    fn pearson_degenerate_inputs_are_nan() {
        assert!(pearson(&[1.0], &[2.0]).is_nan());
        assert!(pearson(&[3.0, 3.0, 3.0], &[1.0, 2.0, 3.0]).is_nan());
        assert!(pearson(&[f64::NAN, 1.0], &[2.0, 3.0]).is_nan());
    }

    #[test]
    fn correlation_matrix_symmetric_with_unit_diagonal() {
        let m = CorrelationMatrix::compute(&[
            ("a", vec![1.0, 2.0, 3.0, 5.0]),
            ("b", vec![2.0, 1.0, 4.0, 3.0]),
            ("c", vec![9.0, 7.0, 5.0, 1.0]),
        ]);
        for i in 0..3 {
            assert!((m.values[i][i] - 1.0).abs() < 1e-12);
            for j in 0..3 {
                assert!((m.values[i][j] - m.values[j][i]).abs() < 1e-12);
            }
        }
        let signal = m.signal("a");
        assert_eq!(signal.len(), 3);
        assert_eq!(signal[0].0, "a");
        assert!(m.signal("missing").is_empty());
    }

    #[test]
    fn format_number_handles_nan() {
        assert_eq!(format_number(f64::NAN, 2), "n/a");
        assert_eq!(format_number(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_number(-42.5, 1), "-42.5");
    }
}
