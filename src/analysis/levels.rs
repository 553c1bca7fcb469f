//! Entry / stop / target construction for an admitted long setup.
//! Deterministic over one series snapshot; every degenerate case falls
//! back to a positive minimum risk.

use serde::{Deserialize, Serialize};

use crate::analysis::indicators::atr;
use crate::analysis::structure::ImbalanceZone;
use crate::domain::CandleSeries;

const ATR_PERIOD: usize = 14;
const STOP_LOOKBACK: usize = 5;
const ATR_BUFFER_FACTOR: f64 = 0.3;
const FALLBACK_BUFFER_PCT: f64 = 0.002;
const MIN_RISK_PCT: f64 = 0.003;
const MIN_RISK_ABS: f64 = 1e-8;

/// How far below the trigger high the entry must sit, as a fraction of the
/// trigger bar's range.
const MIN_TOP_CLEARANCE: f64 = 0.3;

const TP1_R: f64 = 1.2;
const TP2_R: f64 = 2.0;
const TP3_R: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Levels {
    pub entry: f64,
    pub stop: f64,
    pub tp1: f64,
    pub tp2: f64,
    pub tp3: f64,
    pub risk_per_unit: f64,
}

/// Build the level set: entry at the imbalance midpoint (never chasing
/// above the last close), stop under the recent swing low with an ATR
/// buffer, targets at fixed R multiples.
pub fn build_levels(series: &CandleSeries, zone: Option<ImbalanceZone>) -> Option<Levels> {
    let n = series.len();
    if n == 0 {
        return None;
    }
    let last_close = series.closes[n - 1];

    let raw_entry = match zone {
        Some(zone) if zone.is_valid() => zone.midpoint(),
        _ => last_close,
    };
    // Buy the dip, never chase above the current price.
    let entry = raw_entry.min(last_close);

    let lookback = n.min(STOP_LOOKBACK);
    let recent_low = series.lows[n - lookback..]
        .iter()
        .cloned()
        .fold(f64::MAX, f64::min);

    let atr_value = atr(series, ATR_PERIOD);
    let buffer = if atr_value > 0.0 {
        atr_value * ATR_BUFFER_FACTOR
    } else {
        last_close.abs() * FALLBACK_BUFFER_PCT
    };
    let stop = recent_low - buffer;

    let mut risk = (entry - stop).abs();
    if risk <= 0.0 {
        risk = (entry.abs() * MIN_RISK_PCT).max(MIN_RISK_ABS);
    }

    Some(Levels {
        entry,
        stop,
        tp1: entry + risk * TP1_R,
        tp2: entry + risk * TP2_R,
        tp3: entry + risk * TP3_R,
        risk_per_unit: risk,
    })
}

/// True when the entry sits too close to the trigger bar's high — a "top
/// of the candle" fill with no pullback room.
pub fn entry_too_close_to_top(series: &CandleSeries, levels: &Levels) -> bool {
    let n = series.len();
    if n == 0 {
        return false;
    }
    let last_high = series.highs[n - 1];
    let last_range = last_high - series.lows[n - 1];
    last_range > 0.0 && (last_high - levels.entry) < MIN_TOP_CLEARANCE * last_range
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{Candle, Timeframe};

    fn series_of(bars: &[(f64, f64, f64, f64)]) -> CandleSeries {
        let candles = bars
            .iter()
            .enumerate()
            .map(|(i, &(open, high, low, close))| {
                Candle::new(i as i64, i as i64 + 1, open, high, low, close, 1.0)
            })
            .collect();
        CandleSeries::from_candles("x", Timeframe::M5, candles)
    }

    #[test]
    fn entry_is_clamped_to_the_last_close() {
        let series = series_of(&[
            (100.0, 101.0, 99.0, 100.5),
            (100.5, 101.5, 100.0, 101.0),
            (101.0, 102.0, 100.5, 101.5),
        ]);
        // Zone midpoint above the close must not pull the entry up.
        let zone = ImbalanceZone {
            low: 102.0,
            high: 104.0,
        };
        let levels = build_levels(&series, Some(zone)).unwrap();
        assert!((levels.entry - 101.5).abs() < 1e-12);
    }

    #[test]
    fn zone_midpoint_below_close_becomes_the_entry() {
        let series = series_of(&[
            (100.0, 101.0, 99.0, 100.5),
            (100.5, 101.5, 100.0, 101.0),
            (101.0, 102.0, 100.5, 101.5),
        ]);
        let zone = ImbalanceZone {
            low: 100.0,
            high: 100.4,
        };
        let levels = build_levels(&series, Some(zone)).unwrap();
        assert!((levels.entry - 100.2).abs() < 1e-12);
    }

    #[test]
    fn targets_are_strictly_ordered_and_risk_positive() {
        let series = series_of(&[
            (100.0, 101.0, 99.0, 100.5),
            (100.5, 101.5, 100.0, 101.0),
            (101.0, 102.0, 100.5, 101.5),
            (101.5, 102.5, 101.0, 102.0),
            (102.0, 103.0, 101.5, 102.5),
            (102.5, 103.5, 102.0, 103.0),
        ]);
        let levels = build_levels(&series, None).unwrap();
        assert!(levels.risk_per_unit > 0.0);
        assert!(levels.stop < levels.entry);
        assert!(levels.tp1 < levels.tp2 && levels.tp2 < levels.tp3);
        assert!(levels.tp1 > levels.entry);
    }

    #[test]
    fn degenerate_flat_series_still_yields_positive_risk() {
        // Perfectly flat bars: ATR = 0, so the stop falls back to the
        // percentage buffer and risk stays positive.
        let series = series_of(&[(100.0, 100.0, 100.0, 100.0); 6]);
        let levels = build_levels(&series, None).unwrap();
        assert!(levels.risk_per_unit > 0.0);
        assert!(levels.stop < levels.entry);
    }

    #[test]
    fn zero_distance_entry_to_stop_uses_the_risk_floor() {
        // Zone midpoint engineered onto the stop price: entry == stop,
        // forcing the minimum-risk substitution.
        let series = series_of(&[(100.0, 100.0, 100.0, 100.0); 6]);
        let stop = 100.0 - 100.0 * FALLBACK_BUFFER_PCT;
        let zone = ImbalanceZone {
            low: stop - 0.05,
            high: stop + 0.05,
        };
        let levels = build_levels(&series, Some(zone)).unwrap();
        assert!((levels.entry - stop).abs() < 1e-12);
        assert!((levels.risk_per_unit - levels.entry * MIN_RISK_PCT).abs() < 1e-9);
    }

    #[test]
    fn entries_near_the_trigger_high_are_flagged() {
        let series = series_of(&[
            (100.0, 101.0, 99.0, 100.5),
            (100.5, 102.0, 100.4, 101.9),
        ]);
        let levels = build_levels(&series, None).unwrap();
        // Entry = close 101.9; high 102.0; range 1.6; clearance 0.1 < 0.48.
        assert!(entry_too_close_to_top(&series, &levels));

        let zone = ImbalanceZone {
            low: 100.6,
            high: 100.8,
        };
        let deep_levels = build_levels(&series, Some(zone)).unwrap();
        assert!(!entry_too_close_to_top(&series, &deep_levels));
    }
}
