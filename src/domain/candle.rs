use serde::{Deserialize, Serialize};

// Define the CandleType enum
#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum CandleType {
    Bullish,
    Bearish,
}

/// One closed OHLCV bar. Immutable once received.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    pub open_time: i64,
    pub close_time: i64,

    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,

    pub volume: f64,
}

impl Candle {
    pub fn new(
        open_time: i64,
        close_time: i64,
        open: f64,
        high: f64,
        low: f64,
        close: f64,
        volume: f64,
    ) -> Self {
        Candle {
            open_time,
            close_time,
            open,
            high,
            low,
            close,
            volume,
        }
    }

    pub fn kind(&self) -> CandleType {
        if self.close >= self.open {
            CandleType::Bullish
        } else {
            CandleType::Bearish
        }
    }

    /// Absolute body size.
    pub fn body(&self) -> f64 {
        (self.close - self.open).abs()
    }

    /// Full high-to-low extent.
    pub fn range(&self) -> f64 {
        self.high - self.low
    }

    /// Distance from the body top to the high.
    pub fn upper_wick(&self) -> f64 {
        self.high - self.close.max(self.open)
    }
}
