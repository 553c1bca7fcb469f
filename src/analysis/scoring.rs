//! Converts a Conditions record into a numeric score and a tier. The
//! weight table and the tier cut points are configuration (see
//! `config::scanner`), not constants.

use crate::analysis::structure::Conditions;
use crate::config::{ScoreWeights, TierCuts};
use crate::domain::Tier;

/// Weighted sum over the conditions plus the synergy bonus, capped at the
/// configured maximum.
pub fn score_conditions(c: &Conditions, weights: &ScoreWeights) -> u32 {
    let mut score = 0;

    if c.bias_ok {
        score += weights.bias;
    }
    if c.htf_15m_trend_ok {
        score += weights.htf_15m;
    }
    if c.htf_1h_trend_ok {
        score += weights.htf_1h;
    }
    if c.micro_choch {
        score += weights.structure_shift;
    }
    if c.micro_choch_premium {
        score += weights.structure_shift_premium;
    }
    if c.micro_fvg {
        score += weights.imbalance;
    }
    if c.momentum_ok {
        score += weights.momentum;
    }
    if c.momentum_premium {
        score += weights.momentum_premium;
    }
    if c.not_choppy {
        score += weights.not_choppy;
    }
    if c.not_overextended {
        score += weights.not_overextended;
    }

    // Synergy: the minimal confluence subset, scaled by the setup score.
    if c.bias_ok && c.htf_15m_trend_ok && c.htf_1h_trend_ok && c.micro_choch && c.momentum_ok {
        let setup = u32::from(c.setup_score.min(3));
        score += weights.synergy_base + weights.synergy_per_setup_point * setup;
    }

    score.min(weights.max_score)
}

/// Map a score onto a tier through the three monotonic cut points.
pub fn tier_from_score(score: u32, cuts: &TierCuts) -> Tier {
    if score >= cuts.a_plus {
        Tier::APlus
    } else if score >= cuts.a {
        Tier::A
    } else if score >= cuts.b {
        Tier::B
    } else {
        Tier::None
    }
}

/// Admission on the NONE < B < A < A+ total order.
pub fn should_send_tier(tier: Tier, min_tier: Tier) -> bool {
    tier >= min_tier
}
