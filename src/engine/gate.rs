//! Per-symbol admission control: scanning flag, minimum tier, cooldown.
//! One side effect only — the cooldown stamp on an admitted signal.

use crate::analysis::scoring;
use crate::domain::Tier;
use crate::engine::state::{ControlHandle, RuntimeState};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Admitted,
    ScanningOff,
    BelowMinTier { min_tier: Tier },
    OnCooldown { remaining_secs: u64 },
}

pub struct SignalGate {
    state: ControlHandle,
}

impl SignalGate {
    pub fn new(state: ControlHandle) -> Self {
        Self { state }
    }

    /// Cheap pre-check so a cooling symbol skips the expensive evaluation.
    /// No side effects.
    pub fn cooldown_ok(&self, symbol: &str, now_ms: i64) -> bool {
        cooldown_remaining(&self.state.lock(), symbol, now_ms).is_none()
    }

    /// Full admission check. Stamps the cooldown only when admitted.
    pub fn admit(&self, symbol: &str, tier: Tier, now_ms: i64) -> GateDecision {
        let mut state = self.state.lock();
        if !state.scanning {
            return GateDecision::ScanningOff;
        }
        if !scoring::should_send_tier(tier, state.min_tier) {
            return GateDecision::BelowMinTier {
                min_tier: state.min_tier,
            };
        }
        if let Some(remaining_secs) = cooldown_remaining(&state, symbol, now_ms) {
            return GateDecision::OnCooldown { remaining_secs };
        }
        state.last_signal_time.insert(symbol.to_string(), now_ms);
        GateDecision::Admitted
    }
}

/// Some(seconds left) while the symbol is still cooling, None once clear.
/// Strict comparator: elapsed == cooldown is already clear.
fn cooldown_remaining(state: &RuntimeState, symbol: &str, now_ms: i64) -> Option<u64> {
    if state.cooldown_secs == 0 {
        return None;
    }
    let last = *state.last_signal_time.get(symbol)?;
    let cooldown_ms = state.cooldown_secs as i64 * 1000;
    let elapsed = now_ms - last;
    if elapsed < cooldown_ms {
        Some(((cooldown_ms - elapsed) / 1000).max(0) as u64)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScannerConfig;

    fn gate_with_cooldown(secs: u64) -> SignalGate {
        let config = ScannerConfig {
            cooldown_secs: secs,
            min_tier: Tier::A,
            ..ScannerConfig::default()
        };
        SignalGate::new(ControlHandle::new(&config, true))
    }

    #[test]
    fn cooldown_boundary_is_exact() {
        let gate = gate_with_cooldown(300);
        let t0 = 1_000_000;
        assert_eq!(gate.admit("btcusdt", Tier::A, t0), GateDecision::Admitted);

        // One second before the boundary: rejected.
        let decision = gate.admit("btcusdt", Tier::A, t0 + 299_000);
        assert!(matches!(decision, GateDecision::OnCooldown { remaining_secs: 1 }));

        // Exactly at the boundary: admitted.
        assert_eq!(
            gate.admit("btcusdt", Tier::A, t0 + 300_000),
            GateDecision::Admitted
        );
    }

    #[test]
    fn cooldowns_are_per_symbol() {
        let gate = gate_with_cooldown(300);
        assert_eq!(gate.admit("btcusdt", Tier::A, 0), GateDecision::Admitted);
        assert_eq!(gate.admit("ethusdt", Tier::A, 1), GateDecision::Admitted);
    }

    #[test]
    fn scanning_off_rejects_before_anything_else() {
        let gate = gate_with_cooldown(0);
        let control = &gate.state;
        control.set_scanning(false);
        assert_eq!(
            gate.admit("btcusdt", Tier::APlus, 0),
            GateDecision::ScanningOff
        );
        // No stamp was written.
        assert!(control.lock().last_signal_time.is_empty());
    }

    #[test]
    fn sub_minimum_tiers_do_not_stamp_the_cooldown() {
        let gate = gate_with_cooldown(300);
        assert!(matches!(
            gate.admit("btcusdt", Tier::B, 0),
            GateDecision::BelowMinTier { min_tier: Tier::A }
        ));
        assert_eq!(gate.admit("btcusdt", Tier::A, 1), GateDecision::Admitted);
    }

    #[test]
    fn zero_cooldown_always_clears() {
        let gate = gate_with_cooldown(0);
        assert_eq!(gate.admit("btcusdt", Tier::A, 0), GateDecision::Admitted);
        assert_eq!(gate.admit("btcusdt", Tier::A, 0), GateDecision::Admitted);
    }
}
