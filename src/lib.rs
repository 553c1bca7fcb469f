// Core modules
pub mod analysis;
pub mod config;
pub mod data;
pub mod domain;
pub mod engine;
pub mod signal;
pub mod utils;

// Re-export the types an embedder needs
pub use analysis::{Conditions, ImbalanceZone, Levels};
pub use config::{ScannerConfig, ScoreWeights, TierCuts};
pub use data::{MarketDataProvider, SymbolUniverseProvider};
pub use domain::{Candle, CandleSeries, Tier, Timeframe};
pub use engine::{ControlHandle, KlineStream, StreamEngine, StreamTransport};
pub use signal::{ChannelSink, LogSink, Signal, SignalSink};

// CLI argument parsing
use std::str::FromStr;

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Lowest tier worth emitting: NONE, B, A or A+
    #[arg(long, default_value = "A")]
    pub min_tier: String,

    /// Per-symbol cooldown between signals, seconds
    #[arg(long, default_value_t = 1800)]
    pub cooldown_secs: u64,

    /// Universe size cap after the volume sort (0 = unlimited)
    #[arg(long, default_value_t = 1000)]
    pub max_pairs: usize,

    /// Minimum 24h quote volume in USDT for a pair to be scanned
    #[arg(long, default_value_t = 1_000_000.0)]
    pub min_volume_usdt: f64,

    /// Hours between symbol-universe refreshes
    #[arg(long, default_value_t = 24)]
    pub pair_refresh_hours: u64,

    /// Start in standby: stream candles but do not scan until enabled
    #[arg(long, default_value_t = false)]
    pub standby: bool,
}

impl Cli {
    pub fn to_scanner_config(&self) -> ScannerConfig {
        let mut config = ScannerConfig {
            min_volume_usdt: self.min_volume_usdt,
            max_pairs: self.max_pairs,
            cooldown_secs: self.cooldown_secs,
            pair_refresh_hours: self.pair_refresh_hours,
            ..ScannerConfig::default()
        };
        match Tier::from_str(&self.min_tier) {
            Ok(tier) => config.min_tier = tier,
            Err(_) => log::warn!(
                "Unrecognised tier '{}'; keeping {}.",
                self.min_tier,
                config.min_tier
            ),
        }
        config
    }
}
