//! Shared runtime state. Every field touched by both the stream loop and
//! the control surface lives behind one mutex; the control surface writes
//! are fire-and-forget flag sets consumed by the loop at its next safe
//! point.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use crate::config::ScannerConfig;
use crate::domain::Tier;

#[derive(Debug)]
pub struct RuntimeState {
    pub scanning: bool,
    pub running: bool,
    pub min_tier: Tier,
    pub cooldown_secs: u64,
    /// Per-symbol last admitted signal, epoch ms. Entries are only evicted
    /// by an explicit reset.
    pub last_signal_time: HashMap<String, i64>,
    pub force_pairs_refresh: bool,
    pub request_soft_restart: bool,
}

/// Cloneable handle over the shared state. The stream engine holds one
/// clone; an external command surface holds another.
#[derive(Clone)]
pub struct ControlHandle {
    inner: Arc<Mutex<RuntimeState>>,
}

impl ControlHandle {
    pub fn new(config: &ScannerConfig, scanning: bool) -> Self {
        Self {
            inner: Arc::new(Mutex::new(RuntimeState {
                scanning,
                running: true,
                min_tier: config.min_tier,
                cooldown_secs: config.cooldown_secs,
                last_signal_time: HashMap::new(),
                force_pairs_refresh: false,
                request_soft_restart: false,
            })),
        }
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, RuntimeState> {
        self.inner.lock().unwrap()
    }

    pub fn is_scanning(&self) -> bool {
        self.lock().scanning
    }

    pub fn set_scanning(&self, on: bool) {
        self.lock().scanning = on;
    }

    pub fn min_tier(&self) -> Tier {
        self.lock().min_tier
    }

    pub fn set_min_tier(&self, tier: Tier) {
        self.lock().min_tier = tier;
    }

    pub fn cooldown_secs(&self) -> u64 {
        self.lock().cooldown_secs
    }

    pub fn set_cooldown_secs(&self, secs: u64) {
        self.lock().cooldown_secs = secs;
    }

    pub fn is_running(&self) -> bool {
        self.lock().running
    }

    /// Hard stop. The loop exits at its next suspension point; no further
    /// reconnects happen.
    pub fn stop(&self) {
        self.lock().running = false;
    }

    /// Ask for a universe rediscovery before the next connection.
    pub fn force_pairs_refresh(&self) {
        self.lock().force_pairs_refresh = true;
    }

    /// Soft restart: drop the socket at the next safe point, rediscover the
    /// universe and start clean — cooldowns included.
    pub fn request_soft_restart(&self) {
        let mut state = self.lock();
        state.request_soft_restart = true;
        state.force_pairs_refresh = true;
        state.last_signal_time.clear();
    }

    pub fn reset_cooldowns(&self) {
        self.lock().last_signal_time.clear();
    }

    pub(crate) fn take_soft_restart(&self) -> bool {
        std::mem::take(&mut self.lock().request_soft_restart)
    }

    pub(crate) fn take_pairs_refresh(&self) -> bool {
        std::mem::take(&mut self.lock().force_pairs_refresh)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn soft_restart_arms_refresh_and_clears_cooldowns() {
        let control = ControlHandle::new(&ScannerConfig::default(), true);
        control.lock().last_signal_time.insert("btcusdt".into(), 1);

        control.request_soft_restart();
        assert!(control.take_soft_restart());
        assert!(!control.take_soft_restart(), "flag must be consumed");
        assert!(control.take_pairs_refresh());
        assert!(control.lock().last_signal_time.is_empty());
    }

    #[test]
    fn control_writes_are_visible_through_clones() {
        let control = ControlHandle::new(&ScannerConfig::default(), false);
        let surface = control.clone();
        surface.set_scanning(true);
        surface.set_min_tier(Tier::B);
        surface.set_cooldown_secs(60);
        assert!(control.is_scanning());
        assert_eq!(control.min_tier(), Tier::B);
        assert_eq!(control.cooldown_secs(), 60);
        surface.stop();
        assert!(!control.is_running());
    }
}
