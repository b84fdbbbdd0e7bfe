//! Causal price indicators
//!
//! Every function is aligned to its input series and returns `None` until
//! enough lookback exists — a short history yields an absent value, never
//! a partially-computed one. Nothing here reads past the current index.

/// Simple return over `period` bars: `close[i] / close[i - period] - 1`.
pub fn simple_return(closes: &[f64], period: usize) -> Vec<Option<f64>> {
    let mut result = vec![None; closes.len()];
    if period == 0 {
        return result;
    }
    for i in period..closes.len() {
        let base = closes[i - period];
        if base > 0.0 {
            result[i] = Some(closes[i] / base - 1.0);
        }
    }
    result
}

/// Rolling sample standard deviation over a full window of observations.
/// A window containing any missing value yields `None`.
pub fn rolling_std(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    let mut result = vec![None; values.len()];
    if window < 2 {
        return result;
    }

    for i in (window - 1)..values.len() {
        let slice = &values[i + 1 - window..=i];
        if slice.iter().any(|v| v.is_none()) {
            continue;
        }
        let window_values: Vec<f64> = slice.iter().map(|v| v.unwrap_or(0.0)).collect();
        let n = window_values.len() as f64;
        let mean = window_values.iter().sum::<f64>() / n;
        let variance = window_values
            .iter()
            .map(|v| (v - mean).powi(2))
            .sum::<f64>()
            / (n - 1.0);
        result[i] = Some(variance.sqrt());
    }
    result
}

/// Wilder's RSI: exponentially-weighted average gain/loss with
/// `alpha = 1/window`, valid once `window` price changes exist. An
/// all-gain window has no average loss and yields `None`.
pub fn wilder_rsi(closes: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut result = vec![None; closes.len()];
    if window == 0 || closes.len() < 2 {
        return result;
    }

    let alpha = 1.0 / window as f64;
    let mut avg_gain = 0.0;
    let mut avg_loss = 0.0;

    for i in 1..closes.len() {
        let delta = closes[i] - closes[i - 1];
        let gain = delta.max(0.0);
        let loss = (-delta).max(0.0);

        if i == 1 {
            avg_gain = gain;
            avg_loss = loss;
        } else {
            avg_gain = alpha * gain + (1.0 - alpha) * avg_gain;
            avg_loss = alpha * loss + (1.0 - alpha) * avg_loss;
        }

        // min_periods: the first `window` changes must have been seen
        if i >= window && avg_loss != 0.0 {
            let rs = avg_gain / avg_loss;
            result[i] = Some(100.0 - 100.0 / (1.0 + rs));
        }
    }
    result
}

/// Rolling maximum over a trailing `window`, valid once `min_periods`
/// observations exist.
pub fn rolling_max(closes: &[f64], window: usize, min_periods: usize) -> Vec<Option<f64>> {
    rolling_extreme(closes, window, min_periods, f64::max)
}

/// Rolling minimum over a trailing `window`, valid once `min_periods`
/// observations exist.
pub fn rolling_min(closes: &[f64], window: usize, min_periods: usize) -> Vec<Option<f64>> {
    rolling_extreme(closes, window, min_periods, f64::min)
}

fn rolling_extreme(
    closes: &[f64],
    window: usize,
    min_periods: usize,
    pick: fn(f64, f64) -> f64,
) -> Vec<Option<f64>> {
    let mut result = vec![None; closes.len()];
    let min_periods = min_periods.max(1);

    for i in 0..closes.len() {
        let start = (i + 1).saturating_sub(window);
        let slice = &closes[start..=i];
        if slice.len() < min_periods {
            continue;
        }
        result[i] = slice.iter().copied().reduce(pick);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_return_lookback() {
        let closes = vec![100.0, 110.0, 121.0];
        let r1 = simple_return(&closes, 1);

        assert_eq!(r1[0], None);
        assert!((r1[1].unwrap() - 0.10).abs() < 1e-12);
        assert!((r1[2].unwrap() - 0.10).abs() < 1e-12);

        let r2 = simple_return(&closes, 2);
        assert_eq!(r2[0], None);
        assert_eq!(r2[1], None);
        assert!((r2[2].unwrap() - 0.21).abs() < 1e-12);
    }

    #[test]
    fn test_rolling_std_requires_full_window() {
        let values = vec![None, Some(0.01), Some(0.02), Some(0.03)];
        let std = rolling_std(&values, 3);

        // Window [None, 0.01, 0.02] contains a gap
        assert_eq!(std[2], None);
        // Window [0.01, 0.02, 0.03]: sample std of an arithmetic sequence
        assert!((std[3].unwrap() - 0.01).abs() < 1e-12);
    }

    #[test]
    fn test_rsi_bounds_and_warmup() {
        // Alternating up/down closes
        let closes: Vec<f64> = (0..40)
            .map(|i| 100.0 + if i % 2 == 0 { 0.0 } else { 1.0 })
            .collect();
        let rsi = wilder_rsi(&closes, 14);

        for v in &rsi[..14] {
            assert_eq!(*v, None);
        }
        for v in rsi[14..].iter().flatten() {
            assert!(*v > 0.0 && *v < 100.0);
        }
    }

    #[test]
    fn test_rsi_all_gains_is_absent() {
        let closes: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        let rsi = wilder_rsi(&closes, 14);
        assert!(rsi.iter().all(|v| v.is_none()));
    }

    #[test]
    fn test_rolling_max_min_periods() {
        let closes: Vec<f64> = (1..=10).map(|i| i as f64).collect();
        let highs = rolling_max(&closes, 5, 3);

        assert_eq!(highs[1], None);
        assert_eq!(highs[2], Some(3.0));
        // Trailing 5-bar window at the end
        assert_eq!(highs[9], Some(10.0));

        let lows = rolling_min(&closes, 5, 3);
        assert_eq!(lows[9], Some(6.0));
    }
}
