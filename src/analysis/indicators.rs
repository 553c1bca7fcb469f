//! Stateless indicator math over a candle window. All functions are pure
//! and deterministic; degenerate inputs fall back rather than error.

use itertools::{Itertools, izip};

use crate::domain::CandleSeries;

/// Guards the RS division when a window has no losses.
const RSI_EPS: f64 = 1e-9;

/// Exponential moving average, smoothing 2/(period+1), seeded by the first
/// value. Returns one output per input.
pub fn ema(values: &[f64], period: usize) -> Vec<f64> {
    let mut out = Vec::with_capacity(values.len());
    let Some(&first) = values.first() else {
        return out;
    };
    let k = 2.0 / (period as f64 + 1.0);
    let mut prev = first;
    out.push(prev);
    for &value in &values[1..] {
        prev = value * k + prev * (1.0 - k);
        out.push(prev);
    }
    out
}

/// RSI from the rolling mean of gains/losses over the last `period` deltas.
/// None until `period + 1` closes exist.
pub fn rsi(closes: &[f64], period: usize) -> Option<f64> {
    if period == 0 || closes.len() < period + 1 {
        return None;
    }

    let start = closes.len() - period - 1;
    let (mut gain, mut loss) = (0.0_f64, 0.0_f64);
    for window in closes[start..].windows(2) {
        let delta = window[1] - window[0];
        if delta > 0.0 {
            gain += delta;
        } else {
            loss -= delta;
        }
    }

    let avg_gain = gain / period as f64;
    let avg_loss = loss / period as f64;
    let rs = avg_gain / (avg_loss + RSI_EPS);
    Some(100.0 - 100.0 / (1.0 + rs))
}

/// Average true range over the last `period` bars, partial windows allowed
/// at the start. 0.0 for an empty series.
pub fn atr(series: &CandleSeries, period: usize) -> f64 {
    let n = series.len();
    if n == 0 || period == 0 {
        return 0.0;
    }

    // The first bar has no previous close; its TR is just high - low.
    let mut trs = Vec::with_capacity(n);
    trs.push(series.highs[0] - series.lows[0]);
    for ((_, _, prev_close), (high, low, _)) in
        izip!(&series.highs, &series.lows, &series.closes).tuple_windows()
    {
        let tr = (high - low)
            .max((high - prev_close).abs())
            .max((low - prev_close).abs());
        trs.push(tr);
    }

    let window = period.min(trs.len());
    let sum: f64 = trs[trs.len() - window..].iter().sum();
    sum / window as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Candle, Timeframe};

    fn series_from_bars(bars: &[(f64, f64, f64, f64)]) -> CandleSeries {
        let candles = bars
            .iter()
            .enumerate()
            .map(|(i, &(open, high, low, close))| {
                Candle::new(i as i64, i as i64 + 1, open, high, low, close, 1.0)
            })
            .collect();
        CandleSeries::from_candles("testusdt", Timeframe::M5, candles)
    }

    #[test]
    fn ema_is_seeded_by_first_value() {
        // k = 2/(3+1) = 0.5
        let out = ema(&[2.0, 4.0, 8.0], 3);
        assert_eq!(out, vec![2.0, 3.0, 5.5]);
    }

    #[test]
    fn ema_of_empty_input_is_empty() {
        assert!(ema(&[], 20).is_empty());
    }

    #[test]
    fn rsi_saturates_on_a_pure_uptrend() {
        let closes: Vec<f64> = (0..40).map(|i| 100.0 + i as f64).collect();
        let value = rsi(&closes, 14).unwrap();
        assert!(value > 99.9, "got {value}");
    }

    #[test]
    fn rsi_of_balanced_zigzag_hits_the_expected_band() {
        // Deltas alternate +0.6 / -0.4: avg gain 0.3, avg loss 0.2, RS 1.5 -> RSI 60.
        let mut closes = vec![100.0];
        for i in 0..40 {
            let prev = *closes.last().unwrap();
            closes.push(if i % 2 == 0 { prev + 0.6 } else { prev - 0.4 });
        }
        let value = rsi(&closes, 14).unwrap();
        assert!((value - 60.0).abs() < 1e-4, "got {value}");
    }

    #[test]
    fn rsi_needs_a_full_window() {
        let closes = vec![1.0; 14];
        assert!(rsi(&closes, 14).is_none());
    }

    #[test]
    fn atr_uses_prev_close_gaps_and_partial_windows() {
        // Bar 0: TR = 1.0. Bar 1 gaps up: TR = max(0.5, |11.0-9.5|, |10.5-9.5|) = 1.5.
        let series = series_from_bars(&[(9.2, 10.0, 9.0, 9.5), (10.6, 11.0, 10.5, 10.8)]);
        let value = atr(&series, 14);
        assert!((value - 1.25).abs() < 1e-12, "got {value}");
    }

    #[test]
    fn atr_of_empty_series_is_zero() {
        let series = CandleSeries::with_capacity("testusdt", Timeframe::M5, 8);
        assert_eq!(atr(&series, 14), 0.0);
    }
}
