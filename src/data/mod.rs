pub mod klines;
pub mod pairs;
pub mod rate_limiter;

pub use klines::{BinanceKlines, MarketDataProvider};
pub use pairs::{BinanceUniverse, SymbolUniverseProvider};
pub use rate_limiter::WeightLimiter;
