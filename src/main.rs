use std::panic;
use std::sync::Arc;

use clap::Parser;

use smc_scout::config::BINANCE;
use smc_scout::data::{BinanceKlines, BinanceUniverse, WeightLimiter};
use smc_scout::engine::WsTransport;
use smc_scout::{Cli, ControlHandle, LogSink, StreamEngine};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let (global_level, my_code_level) = if cfg!(debug_assertions) {
        (log::LevelFilter::Warn, log::LevelFilter::Debug)
    } else {
        (log::LevelFilter::Warn, log::LevelFilter::Info)
    };

    let mut builder = env_logger::Builder::new();
    builder
        .filter(None, global_level)
        .filter(Some("smc_scout"), my_code_level)
        .init();

    panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::force_capture();
        log::error!("CRITICAL PANIC:\n{}\nStack Trace:\n{}", info, backtrace);
    }));

    let args = Cli::parse();
    let config = args.to_scanner_config();
    log::info!(
        "smc-scout starting: min tier {}, cooldown {}s, refresh every {}h.",
        config.min_tier,
        config.cooldown_secs,
        config.pair_refresh_hours
    );

    let control = ControlHandle::new(&config, !args.standby);

    // Ctrl-C clears the running flag; the loop exits at its next
    // suspension point.
    {
        let control = control.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                log::warn!("Ctrl-C received; stopping.");
                control.stop();
            }
        });
    }

    let limiter = WeightLimiter::new(BINANCE.limits.weight_limit_minute);
    let market_data = Arc::new(BinanceKlines::new(limiter)?);
    let universe = Arc::new(BinanceUniverse::new()?);

    let mut engine = StreamEngine::new(
        config,
        control,
        universe,
        market_data,
        Arc::new(WsTransport),
        Arc::new(LogSink),
    );
    engine.run().await;

    Ok(())
}
