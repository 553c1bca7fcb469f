//! Symbol universe discovery: every TRADING pair quoted in USDT whose 24h
//! quote volume clears the floor, sorted by volume, truncated to the
//! configured size. One bounded-timeout REST round trip per refresh.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;

use crate::config::BINANCE;

#[async_trait]
pub trait SymbolUniverseProvider: Send + Sync {
    /// Ordered (volume-descending) list of lowercase symbol identifiers.
    async fn discover(&self, min_volume_usdt: f64, max_pairs: usize) -> Result<Vec<String>>;
}

#[derive(Debug, Deserialize)]
struct ExchangeInfo {
    symbols: Vec<SymbolInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SymbolInfo {
    symbol: String,
    status: String,
    quote_asset: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Ticker24h {
    symbol: String,
    #[serde(default)]
    quote_volume: String,
}

fn select_universe(
    tradeable: &HashSet<String>,
    tickers: Vec<Ticker24h>,
    min_volume_usdt: f64,
    max_pairs: usize,
) -> Vec<String> {
    let mut by_volume: Vec<(String, f64)> = tickers
        .into_iter()
        .filter(|ticker| tradeable.contains(&ticker.symbol))
        .filter_map(|ticker| {
            let volume = ticker.quote_volume.parse::<f64>().unwrap_or(0.0);
            (volume >= min_volume_usdt).then_some((ticker.symbol, volume))
        })
        .collect();

    by_volume.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));

    let mut symbols: Vec<String> = by_volume
        .into_iter()
        .map(|(symbol, _)| symbol.to_lowercase())
        .collect();
    if max_pairs > 0 {
        symbols.truncate(max_pairs);
    }
    symbols
}

pub struct BinanceUniverse {
    http: reqwest::Client,
}

impl BinanceUniverse {
    pub fn new() -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(BINANCE.rest.timeout_sec))
            .build()?;
        Ok(Self { http })
    }
}

#[async_trait]
impl SymbolUniverseProvider for BinanceUniverse {
    async fn discover(&self, min_volume_usdt: f64, max_pairs: usize) -> Result<Vec<String>> {
        let info: ExchangeInfo = self
            .http
            .get(format!("{}/api/v3/exchangeInfo", BINANCE.rest.base_url))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let tradeable: HashSet<String> = info
            .symbols
            .into_iter()
            .filter(|s| s.status == "TRADING" && s.quote_asset == "USDT")
            .map(|s| s.symbol)
            .collect();

        let tickers: Vec<Ticker24h> = self
            .http
            .get(format!("{}/api/v3/ticker/24hr", BINANCE.rest.base_url))
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let symbols = select_universe(&tradeable, tickers, min_volume_usdt, max_pairs);
        log::info!(
            "Volume filter >= {:.0} USDT -> {} pairs.",
            min_volume_usdt,
            symbols.len()
        );
        Ok(symbols)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ticker(symbol: &str, quote_volume: &str) -> Ticker24h {
        Ticker24h {
            symbol: symbol.to_string(),
            quote_volume: quote_volume.to_string(),
        }
    }

    fn tradeable(symbols: &[&str]) -> HashSet<String> {
        symbols.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn sorts_descending_and_lowercases() {
        let set = tradeable(&["BTCUSDT", "ETHUSDT", "DOGEUSDT"]);
        let tickers = vec![
            ticker("ETHUSDT", "5000000"),
            ticker("BTCUSDT", "9000000"),
            ticker("DOGEUSDT", "2000000"),
        ];
        let out = select_universe(&set, tickers, 1_000_000.0, 0);
        assert_eq!(out, vec!["btcusdt", "ethusdt", "dogeusdt"]);
    }

    #[test]
    fn filters_volume_floor_and_unknown_symbols() {
        let set = tradeable(&["BTCUSDT", "ETHUSDT"]);
        let tickers = vec![
            ticker("BTCUSDT", "9000000"),
            ticker("ETHUSDT", "500"),       // below the floor
            ticker("XRPBTC", "99999999"),   // not in the tradeable set
            ticker("SHIBUSDT", "99999999"), // delisted: absent from exchange info
        ];
        let out = select_universe(&set, tickers, 1_000_000.0, 0);
        assert_eq!(out, vec!["btcusdt"]);
    }

    #[test]
    fn truncates_to_max_pairs() {
        let set = tradeable(&["AUSDT", "BUSDT", "CUSDT"]);
        let tickers = vec![
            ticker("AUSDT", "3000000"),
            ticker("BUSDT", "2000000"),
            ticker("CUSDT", "4000000"),
        ];
        let out = select_universe(&set, tickers, 1_000_000.0, 2);
        assert_eq!(out, vec!["cusdt", "ausdt"]);
    }

    #[test]
    fn unparseable_volume_counts_as_zero() {
        let set = tradeable(&["BTCUSDT"]);
        let tickers = vec![ticker("BTCUSDT", "not-a-number")];
        assert!(select_universe(&set, tickers, 1.0, 0).is_empty());
    }
}
