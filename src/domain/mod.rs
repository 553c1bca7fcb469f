mod candle;
mod series;
mod tier;
mod timeframe;

pub use candle::{Candle, CandleType};
pub use series::CandleSeries;
pub use tier::Tier;
pub use timeframe::Timeframe;
