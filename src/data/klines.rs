//! Kline history over the exchange REST API. Each evaluation fetches a
//! fresh fixed-size window per (symbol, timeframe); a single batch call
//! covers it, so there is no pagination here.

use std::error::Error;
use std::fmt;

use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use binance_sdk::{
    config::ConfigurationRestApi,
    spot::{
        SpotRestApi,
        rest_api::{KlinesIntervalEnum, KlinesItemInner, KlinesParams, RestApi},
    },
};

use crate::config::{BINANCE, BinanceApiConfig};
use crate::data::rate_limiter::WeightLimiter;
use crate::domain::{Candle, CandleSeries, Timeframe};

/// Abstract interface for fetching candle history.
#[async_trait]
pub trait MarketDataProvider: Send + Sync {
    /// Fetch the most recent `bars` candles for a symbol/timeframe.
    async fn fetch_series(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        bars: usize,
    ) -> Result<CandleSeries>;
}

#[derive(Debug)]
pub enum KlineDecodeError {
    InvalidLength,
    InvalidType(String),
}

impl fmt::Display for KlineDecodeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            KlineDecodeError::InvalidLength => write!(f, "kline row too short"),
            KlineDecodeError::InvalidType(field) => write!(f, "invalid type for {}", field),
        }
    }
}

impl Error for KlineDecodeError {}

fn interval_for(timeframe: Timeframe) -> KlinesIntervalEnum {
    match timeframe {
        Timeframe::M5 => KlinesIntervalEnum::Interval5m,
        Timeframe::M15 => KlinesIntervalEnum::Interval15m,
        Timeframe::H1 => KlinesIntervalEnum::Interval1h,
    }
}

fn item_to_f64(item: Option<KlinesItemInner>) -> Option<f64> {
    item.and_then(|inner| {
        if let KlinesItemInner::String(s) = inner {
            s.parse::<f64>().ok()
        } else {
            None
        }
    })
}

fn item_to_i64(item: Option<KlinesItemInner>) -> Option<i64> {
    item.and_then(|inner| {
        if let KlinesItemInner::Integer(t) = inner {
            Some(t)
        } else {
            None
        }
    })
}

fn decode_row(row: Vec<KlinesItemInner>) -> Result<Candle, KlineDecodeError> {
    if row.len() < 7 {
        return Err(KlineDecodeError::InvalidLength);
    }
    let mut items = row.into_iter();

    let open_time = item_to_i64(items.next())
        .ok_or_else(|| KlineDecodeError::InvalidType("open_time".to_string()))?;
    let open =
        item_to_f64(items.next()).ok_or_else(|| KlineDecodeError::InvalidType("open".to_string()))?;
    let high =
        item_to_f64(items.next()).ok_or_else(|| KlineDecodeError::InvalidType("high".to_string()))?;
    let low =
        item_to_f64(items.next()).ok_or_else(|| KlineDecodeError::InvalidType("low".to_string()))?;
    let close = item_to_f64(items.next())
        .ok_or_else(|| KlineDecodeError::InvalidType("close".to_string()))?;
    let volume = item_to_f64(items.next())
        .ok_or_else(|| KlineDecodeError::InvalidType("volume".to_string()))?;
    let close_time = item_to_i64(items.next())
        .ok_or_else(|| KlineDecodeError::InvalidType("close_time".to_string()))?;

    Ok(Candle::new(
        open_time, close_time, open, high, low, close, volume,
    ))
}

/// Live Binance implementation.
pub struct BinanceKlines {
    client: RestApi,
    limiter: WeightLimiter,
}

impl BinanceKlines {
    pub fn new(limiter: WeightLimiter) -> Result<Self> {
        let config = BinanceApiConfig::default();
        let rest_conf = ConfigurationRestApi::builder()
            .timeout(config.timeout_ms)
            .retries(config.retries)
            .backoff(config.backoff_ms)
            .build()?;
        Ok(Self {
            client: SpotRestApi::production(rest_conf),
            limiter,
        })
    }
}

#[async_trait]
impl MarketDataProvider for BinanceKlines {
    async fn fetch_series(
        &self,
        symbol: &str,
        timeframe: Timeframe,
        bars: usize,
    ) -> Result<CandleSeries> {
        self.limiter.acquire(BINANCE.limits.kline_call_weight).await;

        let limit = (bars as i32).min(BINANCE.limits.klines_limit);
        let params = KlinesParams::builder(symbol.to_uppercase(), interval_for(timeframe))
            .limit(limit)
            .build()?;

        let response = self
            .client
            .klines(params)
            .await
            .with_context(|| format!("klines request failed for {} {}", symbol, timeframe))?;
        let rows: Vec<Vec<KlinesItemInner>> = response.data().await?;

        let mut candles = Vec::with_capacity(rows.len());
        for row in rows {
            let candle = decode_row(row).map_err(|e| {
                anyhow::Error::new(e).context(format!("bad kline row for {} {}", symbol, timeframe))
            })?;
            candles.push(candle);
        }
        if candles.is_empty() {
            bail!("empty kline history for {} {}", symbol, timeframe);
        }

        Ok(CandleSeries::from_candles(
            symbol.to_lowercase(),
            timeframe,
            candles,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(open_time: i64) -> Vec<KlinesItemInner> {
        vec![
            KlinesItemInner::Integer(open_time),
            KlinesItemInner::String("100.1".to_string()),
            KlinesItemInner::String("101.0".to_string()),
            KlinesItemInner::String("99.5".to_string()),
            KlinesItemInner::String("100.7".to_string()),
            KlinesItemInner::String("1234.5".to_string()),
            KlinesItemInner::Integer(open_time + 299_999),
        ]
    }

    #[test]
    fn rows_decode_into_candles() {
        let candle = decode_row(row(1_700_000_000_000)).unwrap();
        assert_eq!(candle.open_time, 1_700_000_000_000);
        assert_eq!(candle.close_time, 1_700_000_299_999);
        assert!((candle.open - 100.1).abs() < 1e-12);
        assert!((candle.volume - 1234.5).abs() < 1e-12);
    }

    #[test]
    fn short_rows_are_rejected() {
        let mut short = row(0);
        short.truncate(4);
        assert!(matches!(
            decode_row(short),
            Err(KlineDecodeError::InvalidLength)
        ));
    }

    #[test]
    fn type_confusion_is_rejected() {
        let mut bad = row(0);
        bad[1] = KlinesItemInner::Integer(42);
        assert!(matches!(
            decode_row(bad),
            Err(KlineDecodeError::InvalidType(field)) if field == "open"
        ));
    }
}
