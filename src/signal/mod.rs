//! The finished product of the pipeline: an immutable Signal record and
//! the sink seam it is handed to. Delivery semantics (fan-out, quotas)
//! belong to the sink implementation, not the core.

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

use crate::analysis::{Conditions, Levels};
use crate::domain::Tier;
use crate::utils::time_utils::epoch_ms_to_utc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signal {
    pub symbol: String,
    pub timestamp_ms: i64,
    pub conditions: Conditions,
    pub levels: Levels,
    pub score: u32,
    pub tier: Tier,
}

/// Receives accepted signals. Implementations own delivery semantics.
#[async_trait]
pub trait SignalSink: Send + Sync {
    async fn deliver(&self, signal: &Signal) -> Result<()>;
}

/// Default sink: renders a compact one-line summary to the log.
pub struct LogSink;

#[async_trait]
impl SignalSink for LogSink {
    async fn deliver(&self, signal: &Signal) -> Result<()> {
        let levels = &signal.levels;
        log::info!(
            "🎯 {} [{}] score {} tier {} | entry {:.6} stop {:.6} tp {:.6}/{:.6}/{:.6} | shift={} premium={} fvg={} setup={}",
            signal.symbol,
            epoch_ms_to_utc(signal.timestamp_ms),
            signal.score,
            signal.tier,
            levels.entry,
            levels.stop,
            levels.tp1,
            levels.tp2,
            levels.tp3,
            signal.conditions.micro_choch,
            signal.conditions.micro_choch_premium,
            signal.conditions.micro_fvg,
            signal.conditions.setup_score,
        );
        Ok(())
    }
}

/// Forwards signals into an unbounded channel. Used for embedding the
/// engine and for tests.
pub struct ChannelSink {
    tx: UnboundedSender<Signal>,
}

impl ChannelSink {
    pub fn new() -> (Self, UnboundedReceiver<Signal>) {
        let (tx, rx) = unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl SignalSink for ChannelSink {
    async fn deliver(&self, signal: &Signal) -> Result<()> {
        // A dropped receiver just means nobody is listening any more.
        let _ = self.tx.send(signal.clone());
        Ok(())
    }
}
