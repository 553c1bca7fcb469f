//! The top-level driver. Owns the symbol universe and walks the
//! connection state machine:
//!
//! DISCOVERING_PAIRS -> CONNECTING -> STREAMING
//!       ^                                |-- transport error/close -> RECONNECT_WAIT -> CONNECTING
//!       |-- soft restart / refresh interval elapsed
//!
//! STOPPED is reached only when the running flag clears; every other
//! failure is recoverable.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;

use crate::analysis::{levels, scoring, structure};
use crate::config::{BINANCE, ScannerConfig};
use crate::data::{MarketDataProvider, SymbolUniverseProvider};
use crate::domain::Timeframe;
use crate::engine::gate::{GateDecision, SignalGate};
use crate::engine::state::ControlHandle;
use crate::engine::transport::{KlineStream, StreamTransport, parse_kline_frame};
use crate::signal::{Signal, SignalSink};
use crate::utils::TimeUtils;
use crate::utils::time_utils::format_duration;

/// Why a streaming session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum StreamExit {
    /// Transport closed or errored; reconnect with the same universe.
    Reconnect,
    /// Soft restart or elapsed refresh interval; rediscover first.
    Refresh,
    /// Running flag cleared.
    Stopped,
}

pub struct StreamEngine {
    config: ScannerConfig,
    state: ControlHandle,
    gate: SignalGate,
    universe: Arc<dyn SymbolUniverseProvider>,
    market_data: Arc<dyn MarketDataProvider>,
    transport: Arc<dyn StreamTransport>,
    sink: Arc<dyn SignalSink>,

    symbols: Vec<String>,
    last_pairs_refresh_ms: i64,
}

impl StreamEngine {
    pub fn new(
        config: ScannerConfig,
        state: ControlHandle,
        universe: Arc<dyn SymbolUniverseProvider>,
        market_data: Arc<dyn MarketDataProvider>,
        transport: Arc<dyn StreamTransport>,
        sink: Arc<dyn SignalSink>,
    ) -> Self {
        let gate = SignalGate::new(state.clone());
        Self {
            config,
            state,
            gate,
            universe,
            market_data,
            transport,
            sink,
            symbols: Vec::new(),
            last_pairs_refresh_ms: 0,
        }
    }

    /// Drive the state machine until the running flag is cleared.
    pub async fn run(&mut self) {
        log::info!("Stream engine starting.");
        while self.state.is_running() {
            if self.needs_refresh() {
                self.refresh_universe().await;
            }
            if self.symbols.is_empty() {
                log::warn!(
                    "No tradable symbols yet; retrying discovery in {}s.",
                    BINANCE.ws.reconnect_delay_sec
                );
                self.reconnect_wait().await;
                continue;
            }

            match self.transport.connect(&self.symbols).await {
                Ok(mut stream) => {
                    log::info!("Stream connected ({} symbols).", self.symbols.len());
                    if self.state.is_scanning() {
                        log::info!("Scanning is active.");
                    } else {
                        log::info!("Standby: streaming but not scanning until enabled.");
                    }
                    match self.stream_session(stream.as_mut()).await {
                        StreamExit::Stopped => break,
                        StreamExit::Refresh => continue,
                        StreamExit::Reconnect => self.reconnect_wait().await,
                    }
                }
                Err(e) => {
                    log::error!(
                        "Stream connect failed: {:#}. Retrying in {}s.",
                        e,
                        BINANCE.ws.reconnect_delay_sec
                    );
                    self.reconnect_wait().await;
                }
            }
        }
        log::info!("Stream engine stopped.");
    }

    fn refresh_interval_ms(&self) -> i64 {
        self.config.pair_refresh_hours as i64 * TimeUtils::MS_IN_H
    }

    fn needs_refresh(&self) -> bool {
        let forced = self.state.take_pairs_refresh();
        if forced || self.symbols.is_empty() {
            return true;
        }
        TimeUtils::now_timestamp_ms() - self.last_pairs_refresh_ms > self.refresh_interval_ms()
    }

    /// DISCOVERING_PAIRS. A failed refresh keeps the previous universe and
    /// re-arms the timer so the engine can keep streaming the stale list.
    async fn refresh_universe(&mut self) {
        if self.last_pairs_refresh_ms == 0 {
            log::info!("Discovering the symbol universe...");
        } else {
            let age_ms = TimeUtils::now_timestamp_ms() - self.last_pairs_refresh_ms;
            log::info!(
                "Refreshing the symbol universe (previous list {} old)...",
                format_duration(age_ms)
            );
        }
        match self
            .universe
            .discover(self.config.min_volume_usdt, self.config.max_pairs)
            .await
        {
            Ok(symbols) => {
                log::info!("Scanning {} pairs.", symbols.len());
                self.symbols = symbols;
                self.last_pairs_refresh_ms = TimeUtils::now_timestamp_ms();
            }
            Err(e) if self.symbols.is_empty() => {
                log::error!("Universe discovery failed with no previous list: {:#}", e);
            }
            Err(e) => {
                log::error!(
                    "Universe discovery failed; keeping the previous {} pairs: {:#}",
                    self.symbols.len(),
                    e
                );
                self.last_pairs_refresh_ms = TimeUtils::now_timestamp_ms();
            }
        }
    }

    /// RECONNECT_WAIT: the fixed backoff before the next CONNECTING.
    async fn reconnect_wait(&self) {
        tokio::time::sleep(Duration::from_secs(BINANCE.ws.reconnect_delay_sec)).await;
    }

    /// STREAMING: pump frames until an exit condition.
    async fn stream_session(&mut self, stream: &mut dyn KlineStream) -> StreamExit {
        loop {
            if !self.state.is_running() {
                return StreamExit::Stopped;
            }
            if self.state.take_soft_restart() {
                log::info!("Soft restart requested; dropping the connection.");
                return StreamExit::Refresh;
            }
            if TimeUtils::now_timestamp_ms() - self.last_pairs_refresh_ms
                > self.refresh_interval_ms()
            {
                log::info!("Pair refresh interval elapsed; reconnecting with a fresh universe.");
                return StreamExit::Refresh;
            }

            match stream.next_frame().await {
                Some(Ok(frame)) => self.handle_frame(&frame).await,
                Some(Err(e)) => {
                    log::error!("Stream transport error: {:#}", e);
                    return StreamExit::Reconnect;
                }
                None => {
                    log::warn!("Stream closed by peer.");
                    return StreamExit::Reconnect;
                }
            }
        }
    }

    async fn handle_frame(&self, frame: &str) {
        // Malformed payloads are dropped without comment.
        let Some(kline) = parse_kline_frame(frame) else {
            return;
        };
        if !kline.is_closed {
            return;
        }
        if !self.state.is_scanning() {
            return;
        }

        let now_ms = TimeUtils::now_timestamp_ms();
        if !self.gate.cooldown_ok(&kline.symbol, now_ms) {
            log::debug!("[{}] still cooling down; skipping.", kline.symbol);
            return;
        }

        log::debug!("[{}] 5m close; evaluating.", kline.symbol);
        if let Err(e) = self.evaluate_symbol(&kline.symbol, now_ms).await {
            // Per-symbol failures never take the engine down.
            log::error!("[{}] evaluation failed: {:#}", kline.symbol, e);
        }
    }

    /// The full pipeline for one closed 5m candle: fetch the three
    /// timeframe windows, run the detectors, score, gate, build levels,
    /// hand off to the sink.
    async fn evaluate_symbol(&self, symbol: &str, now_ms: i64) -> Result<()> {
        let bars = self.config.history_bars;
        let m5 = self
            .market_data
            .fetch_series(symbol, Timeframe::M5, bars)
            .await?;
        let m15 = self
            .market_data
            .fetch_series(symbol, Timeframe::M15, bars)
            .await?;
        let h1 = self
            .market_data
            .fetch_series(symbol, Timeframe::H1, bars)
            .await?;

        let (conditions, zone) = structure::evaluate(&m5, &m15, &h1, &self.config);
        if !conditions.core_confluence_ok() {
            log::debug!("[{}] core confluence not met.", symbol);
            return Ok(());
        }

        let Some(levels) = levels::build_levels(&m5, zone) else {
            return Ok(());
        };
        if levels::entry_too_close_to_top(&m5, &levels) {
            log::debug!("[{}] entry too close to the trigger high; skipping.", symbol);
            return Ok(());
        }

        let score = scoring::score_conditions(&conditions, &self.config.weights);
        let tier = scoring::tier_from_score(score, &self.config.cuts);

        match self.gate.admit(symbol, tier, now_ms) {
            GateDecision::Admitted => {
                log::info!("[{}] signal admitted: score {}, tier {}.", symbol, score, tier);
                let signal = Signal {
                    symbol: symbol.to_string(),
                    timestamp_ms: now_ms,
                    conditions,
                    levels,
                    score,
                    tier,
                };
                if let Err(e) = self.sink.deliver(&signal).await {
                    log::error!("[{}] signal delivery failed: {:#}", symbol, e);
                }
            }
            GateDecision::BelowMinTier { min_tier } => {
                log::debug!("[{}] tier {} below minimum {}; skipping.", symbol, tier, min_tier);
            }
            GateDecision::OnCooldown { remaining_secs } => {
                log::debug!("[{}] cooldown active ({}s left).", symbol, remaining_secs);
            }
            GateDecision::ScanningOff => {}
        }
        Ok(())
    }
}
