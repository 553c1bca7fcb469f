//! Market-structure predicates for the long-side scalping setup: trend
//! bias, micro structure shift, imbalance, momentum, choppiness and
//! over-extension. All predicates are pure; the stream engine composes
//! them once per closed 5m candle.

use serde::{Deserialize, Serialize};

use crate::analysis::indicators::{atr, ema, rsi};
use crate::config::ScannerConfig;
use crate::domain::{CandleSeries, CandleType};

const EMA_FAST: usize = 20;
const EMA_SLOW: usize = 50;
/// Slope is measured across this many bars (current vs. that far back).
const SLOPE_LOOKBACK: usize = 5;
const SLOPE_MIN_FAST: f64 = 0.001;
const SLOPE_MIN_SLOW: f64 = 0.0005;
const SLOPE_BASE_EPS: f64 = 1e-9;

const SHIFT_MIN_BARS: usize = 10;
const SHIFT_BODY_FACTOR: f64 = 1.3;
const SHIFT_MAX_WICK_RATIO: f64 = 0.25;

const IMBALANCE_SCAN_BARS: usize = 12;

const MOMENTUM_MIN_BARS: usize = 30;
const MOMENTUM_PREMIUM_MIN: f64 = 52.0;
const MOMENTUM_PREMIUM_MAX: f64 = 65.0;
const RSI_PERIOD: usize = 14;

const CHOP_WINDOW: usize = 20;
const CHOP_RANGE_FACTOR: f64 = 1.8;
const CHOP_MIN_ATR_PCT: f64 = 0.004;
const ATR_PERIOD: usize = 14;

const MAX_EMA_DISTANCE_PCT: f64 = 0.012;

/// Everything one evaluation learned about a symbol. Fixed fields so a
/// renamed condition is a compile error, not a silent default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conditions {
    pub bias_ok: bool,
    pub htf_15m_trend_ok: bool,
    pub htf_1h_trend_ok: bool,
    pub micro_choch: bool,
    pub micro_choch_premium: bool,
    pub micro_fvg: bool,
    pub momentum_ok: bool,
    pub momentum_premium: bool,
    pub not_choppy: bool,
    pub not_overextended: bool,
    /// How many premium sub-conditions held (shift premium, imbalance,
    /// momentum premium). 0-3.
    pub setup_score: u8,
}

impl Conditions {
    /// The aggressive core set: every mandatory condition for a candidate
    /// signal. Imbalance and the premium momentum band stay optional
    /// confluence.
    pub fn core_confluence_ok(&self) -> bool {
        self.bias_ok
            && self.htf_15m_trend_ok
            && self.htf_1h_trend_ok
            && self.momentum_ok
            && self.micro_choch
            && self.micro_choch_premium
            && self.not_choppy
            && self.not_overextended
    }
}

/// A bullish price gap: the zone between one bar's high and the
/// next-but-one low that price never traded through.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ImbalanceZone {
    pub low: f64,
    pub high: f64,
}

impl ImbalanceZone {
    pub fn midpoint(&self) -> f64 {
        (self.low + self.high) / 2.0
    }

    pub fn is_valid(&self) -> bool {
        self.high > self.low
    }
}

/// Trend bias: last close above EMA20 above EMA50, with both EMAs actually
/// rising over the slope lookback. Applied per timeframe.
pub fn bias_ok(series: &CandleSeries) -> bool {
    let closes = &series.closes;
    let fast = ema(closes, EMA_FAST);
    let slow = ema(closes, EMA_SLOW);
    let (Some(&last), Some(&fast_last), Some(&slow_last)) =
        (closes.last(), fast.last(), slow.last())
    else {
        return false;
    };

    let stacked = last > fast_last && fast_last > slow_last;

    // Not enough history to measure a slope: accept the stack alone.
    let slope_ok = if fast.len() > SLOPE_LOOKBACK {
        let fast_past = fast[fast.len() - SLOPE_LOOKBACK];
        let slow_past = slow[slow.len() - SLOPE_LOOKBACK];
        let slope_fast = (fast_last - fast_past) / fast_past.abs().max(SLOPE_BASE_EPS);
        let slope_slow = (slow_last - slow_past) / slow_past.abs().max(SLOPE_BASE_EPS);
        slope_fast > SLOPE_MIN_FAST && slope_slow > SLOPE_MIN_SLOW
    } else {
        true
    };

    stacked && slope_ok
}

/// Micro structure shift: last bar breaks the high AND the low from two
/// bars back. The premium variant additionally wants a strong bullish
/// impulse candle: body at least 1.3x the mean of the preceding eight,
/// upper wick no more than a quarter of the bar.
pub fn structure_shift(series: &CandleSeries) -> (bool, bool) {
    let n = series.len();
    if n < SHIFT_MIN_BARS {
        return (false, false);
    }

    let shifted = series.highs[n - 1] > series.highs[n - 3] && series.lows[n - 1] > series.lows[n - 3];

    let last = series.candle(n - 1);
    if last.kind() == CandleType::Bearish || last.close == last.open {
        return (shifted, false);
    }

    let mean_body: f64 = (n - 9..n - 1)
        .map(|i| (series.closes[i] - series.opens[i]).abs())
        .sum::<f64>()
        / 8.0;
    let range = last.range();
    if range <= 0.0 || mean_body <= 0.0 {
        return (shifted, false);
    }

    let body_big_enough = last.body() >= mean_body * SHIFT_BODY_FACTOR;
    let wick_small_enough = last.upper_wick() / range <= SHIFT_MAX_WICK_RATIO;

    (shifted, shifted && body_big_enough && wick_small_enough)
}

/// Scan the recent window for bullish gaps (low[i+1] > high[i]) and return
/// the one whose midpoint sits closest to the last close. Ties keep the
/// earliest match.
pub fn imbalance(series: &CandleSeries) -> Option<ImbalanceZone> {
    let n = series.len();
    if n < 4 {
        return None;
    }

    let last_close = series.closes[n - 1];
    let start = n.saturating_sub(IMBALANCE_SCAN_BARS);

    let mut best: Option<(f64, ImbalanceZone)> = None;
    for i in start..n - 1 {
        if series.lows[i + 1] > series.highs[i] {
            let zone = ImbalanceZone {
                low: series.highs[i],
                high: series.lows[i + 1],
            };
            let diff = (last_close - zone.midpoint()).abs();
            if best.is_none_or(|(best_diff, _)| diff < best_diff) {
                best = Some((diff, zone));
            }
        }
    }

    best.map(|(_, zone)| zone)
}

/// Long-side momentum from RSI(14). Thin history defaults to ok without
/// the premium flag.
pub fn momentum(series: &CandleSeries, ok_min: f64, ok_max: f64) -> (bool, bool) {
    if series.len() < MOMENTUM_MIN_BARS {
        return (true, false);
    }
    let Some(value) = rsi(&series.closes, RSI_PERIOD) else {
        return (true, false);
    };

    let ok = value >= ok_min && value < ok_max;
    let premium = (MOMENTUM_PREMIUM_MIN..=MOMENTUM_PREMIUM_MAX).contains(&value);
    (ok, premium)
}

/// Chop filter: the 20-bar window must travel further than 1.8x its mean
/// bar range, and ATR relative to price must clear a floor (a sleeping
/// market counts as choppy).
pub fn not_choppy(series: &CandleSeries) -> bool {
    let n = series.len();
    if n < CHOP_WINDOW + 2 {
        return true;
    }

    let highs = &series.highs[n - CHOP_WINDOW..];
    let lows = &series.lows[n - CHOP_WINDOW..];

    let max_high = highs.iter().cloned().fold(f64::MIN, f64::max);
    let min_low = lows.iter().cloned().fold(f64::MAX, f64::min);
    let full_range = max_high - min_low;

    let mean_range: f64 = highs
        .iter()
        .zip(lows)
        .map(|(high, low)| high - low)
        .sum::<f64>()
        / CHOP_WINDOW as f64;
    if mean_range <= 0.0 {
        return false;
    }

    let last_close = series.closes[n - 1];
    let atr_pct = if last_close > 0.0 {
        atr(series, ATR_PERIOD) / last_close
    } else {
        0.0
    };
    if atr_pct < CHOP_MIN_ATR_PCT {
        return false;
    }

    full_range > mean_range * CHOP_RANGE_FACTOR
}

/// True when price has not run too far above EMA20. Only extension above
/// the EMA is penalized for a long bias.
pub fn not_overextended(series: &CandleSeries) -> bool {
    let fast = ema(&series.closes, EMA_FAST);
    let (Some(&last), Some(&ema_last)) = (series.closes.last(), fast.last()) else {
        return true;
    };
    if ema_last <= 0.0 {
        return true;
    }
    (last - ema_last) / ema_last <= MAX_EMA_DISTANCE_PCT
}

/// Run every predicate across the three timeframes and fold the result
/// into one Conditions record plus the selected imbalance zone.
pub fn evaluate(
    m5: &CandleSeries,
    m15: &CandleSeries,
    h1: &CandleSeries,
    config: &ScannerConfig,
) -> (Conditions, Option<ImbalanceZone>) {
    let bias_5m = bias_ok(m5);
    let bias_15m = bias_ok(m15);
    let bias_1h = bias_ok(h1);

    let (micro_choch, micro_choch_premium) = structure_shift(m5);
    let zone = imbalance(m5);
    let (momentum_ok, momentum_premium) =
        momentum(m5, config.momentum_ok_min, config.momentum_ok_max);
    let quiet_ok = not_choppy(m5);
    let extension_ok = not_overextended(m5);

    let setup_score = [micro_choch_premium, zone.is_some(), momentum_premium]
        .iter()
        .filter(|held| **held)
        .count() as u8;

    let conditions = Conditions {
        bias_ok: bias_5m,
        htf_15m_trend_ok: bias_15m,
        htf_1h_trend_ok: bias_1h,
        micro_choch,
        micro_choch_premium,
        micro_fvg: zone.is_some(),
        momentum_ok,
        momentum_premium,
        not_choppy: quiet_ok,
        not_overextended: extension_ok,
        setup_score,
    };

    (conditions, zone)
}
