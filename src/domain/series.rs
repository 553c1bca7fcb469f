use serde::{Deserialize, Serialize};

use crate::domain::{Candle, Timeframe};

/// Rolling window of OHLCV bars for one (symbol, timeframe).
///
/// Stored as parallel vectors so the indicator layer can slice straight
/// into prices without per-bar allocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandleSeries {
    pub symbol: String,
    pub timeframe: Timeframe,
    capacity: usize,

    pub open_times: Vec<i64>,
    pub opens: Vec<f64>,
    pub highs: Vec<f64>,
    pub lows: Vec<f64>,
    pub closes: Vec<f64>,
    pub volumes: Vec<f64>,
}

impl CandleSeries {
    /// Minimum history the detector wants before an evaluation is meaningful.
    pub const MIN_HISTORY: usize = 220;

    pub fn with_capacity(symbol: impl Into<String>, timeframe: Timeframe, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            symbol: symbol.into(),
            timeframe,
            capacity,
            open_times: Vec::with_capacity(capacity),
            opens: Vec::with_capacity(capacity),
            highs: Vec::with_capacity(capacity),
            lows: Vec::with_capacity(capacity),
            closes: Vec::with_capacity(capacity),
            volumes: Vec::with_capacity(capacity),
        }
    }

    pub fn from_candles(
        symbol: impl Into<String>,
        timeframe: Timeframe,
        candles: Vec<Candle>,
    ) -> Self {
        let capacity = candles.len().max(Self::MIN_HISTORY);
        let mut series = Self::with_capacity(symbol, timeframe, capacity);
        for candle in candles {
            series.push(candle);
        }
        series
    }

    /// Append a bar, or replace the final bar when the open time matches
    /// (a re-delivered update of the same interval). The window is trimmed
    /// from the front once it exceeds capacity.
    pub fn push(&mut self, candle: Candle) {
        let is_update = self.open_times.last() == Some(&candle.open_time);
        if is_update {
            let last = self.len() - 1;
            self.highs[last] = candle.high;
            self.lows[last] = candle.low;
            self.closes[last] = candle.close;
            self.volumes[last] = candle.volume;
            return;
        }

        self.open_times.push(candle.open_time);
        self.opens.push(candle.open);
        self.highs.push(candle.high);
        self.lows.push(candle.low);
        self.closes.push(candle.close);
        self.volumes.push(candle.volume);

        if self.len() > self.capacity {
            self.open_times.remove(0);
            self.opens.remove(0);
            self.highs.remove(0);
            self.lows.remove(0);
            self.closes.remove(0);
            self.volumes.remove(0);
        }
    }

    pub fn len(&self) -> usize {
        self.open_times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.open_times.is_empty()
    }

    pub fn candle(&self, idx: usize) -> Candle {
        Candle::new(
            self.open_times[idx],
            self.open_times[idx] + self.timeframe.interval_ms() - 1,
            self.opens[idx],
            self.highs[idx],
            self.lows[idx],
            self.closes[idx],
            self.volumes[idx],
        )
    }

    pub fn last_close(&self) -> Option<f64> {
        self.closes.last().copied()
    }

    pub fn last_high(&self) -> Option<f64> {
        self.highs.last().copied()
    }

    pub fn last_low(&self) -> Option<f64> {
        self.lows.last().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bar(open_time: i64, close: f64) -> Candle {
        Candle::new(open_time, open_time + 299_999, close, close, close, close, 1.0)
    }

    #[test]
    fn window_trims_from_the_front() {
        let mut series = CandleSeries::with_capacity("btcusdt", Timeframe::M5, 3);
        for i in 0..5 {
            series.push(bar(i, i as f64));
        }
        assert_eq!(series.len(), 3);
        assert_eq!(series.open_times, vec![2, 3, 4]);
        assert_eq!(series.last_close(), Some(4.0));
    }

    #[test]
    fn same_open_time_replaces_last_bar() {
        let mut series = CandleSeries::with_capacity("btcusdt", Timeframe::M5, 10);
        series.push(bar(0, 1.0));
        series.push(bar(300_000, 2.0));
        series.push(bar(300_000, 2.5));
        assert_eq!(series.len(), 2);
        assert_eq!(series.last_close(), Some(2.5));
    }
}
