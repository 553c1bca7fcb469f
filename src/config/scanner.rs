//! Runtime scanner policy: universe filters, gating defaults, and the
//! scoring tables.

use serde::{Deserialize, Serialize};

use crate::domain::Tier;

/// Point value of each condition plus the synergy bonus parameters.
///
/// These are data, not constants: the weight table has been retuned more
/// than once and operators are expected to adjust it without touching the
/// scoring code.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub bias: u32,
    pub htf_15m: u32,
    pub htf_1h: u32,
    pub structure_shift: u32,
    pub structure_shift_premium: u32,
    pub imbalance: u32,
    pub momentum: u32,
    pub momentum_premium: u32,
    pub not_choppy: u32,
    pub not_overextended: u32,
    /// Awarded only when bias + both HTF confirmations + shift + momentum hold.
    pub synergy_base: u32,
    pub synergy_per_setup_point: u32,
    pub max_score: u32,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            bias: 15,
            htf_15m: 10,
            htf_1h: 10,
            structure_shift: 25,
            structure_shift_premium: 10,
            imbalance: 15,
            momentum: 15,
            momentum_premium: 10,
            not_choppy: 10,
            not_overextended: 10,
            synergy_base: 4,
            synergy_per_setup_point: 2,
            max_score: 125,
        }
    }
}

/// Score cut points for each tier. Must be monotonic: a_plus >= a >= b.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierCuts {
    pub a_plus: u32,
    pub a: u32,
    pub b: u32,
}

impl Default for TierCuts {
    fn default() -> Self {
        Self {
            a_plus: 110,
            a: 90,
            b: 70,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Minimum 24h quote volume (USDT) for a pair to enter the universe.
    pub min_volume_usdt: f64,
    /// Universe size cap after the volume sort. 0 = unlimited.
    pub max_pairs: usize,
    /// Lowest tier the gate will admit.
    pub min_tier: Tier,
    /// Per-symbol quiet period between admitted signals.
    pub cooldown_secs: u64,
    /// How often the symbol universe is rediscovered.
    pub pair_refresh_hours: u64,
    /// Bars fetched per (symbol, timeframe) for every evaluation.
    pub history_bars: usize,
    /// RSI band treated as "momentum ok" (half-open: min inclusive, max exclusive).
    pub momentum_ok_min: f64,
    pub momentum_ok_max: f64,
    pub weights: ScoreWeights,
    pub cuts: TierCuts,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            min_volume_usdt: 1_000_000.0,
            max_pairs: 1000,
            min_tier: Tier::A,
            cooldown_secs: 1800,
            pair_refresh_hours: 24,
            history_bars: 220,
            momentum_ok_min: 50.0,
            momentum_ok_max: 72.0,
            weights: ScoreWeights::default(),
            cuts: TierCuts::default(),
        }
    }
}
