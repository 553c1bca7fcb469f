//! The candle-feed seam. The engine only sees `StreamTransport` /
//! `KlineStream`, so reconnect behavior is testable with a scripted fake;
//! the production implementation wraps a tokio-tungstenite combined
//! stream.

use anyhow::Result;
use async_trait::async_trait;
use futures::StreamExt;
use futures::stream::SplitStream;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

use crate::config::BINANCE;
use crate::domain::Timeframe;

/// One kline update lifted out of a combined-stream frame.
#[derive(Debug, Clone, PartialEq)]
pub struct LiveKline {
    pub symbol: String,
    pub open_time: i64,
    pub close_time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
    pub is_closed: bool,
}

#[async_trait]
pub trait KlineStream: Send {
    /// Next raw text frame. None means the peer closed the stream.
    async fn next_frame(&mut self) -> Option<Result<String>>;
}

#[async_trait]
pub trait StreamTransport: Send + Sync {
    async fn connect(&self, symbols: &[String]) -> Result<Box<dyn KlineStream>>;
}

pub fn build_combined_stream_url(symbols: &[String]) -> String {
    let streams: Vec<String> = symbols
        .iter()
        .map(|symbol| {
            format!(
                "{}@kline_{}",
                symbol.to_lowercase(),
                Timeframe::M5.suffix()
            )
        })
        .collect();
    format!("{}{}", BINANCE.ws.combined_base_url, streams.join("/"))
}

/// Extract the kline payload from a combined-stream frame. Anything
/// malformed or non-kline comes back as None and is dropped silently.
pub fn parse_kline_frame(text: &str) -> Option<LiveKline> {
    let v: serde_json::Value = serde_json::from_str(text).ok()?;
    let data = &v["data"];
    if data["e"].as_str() != Some("kline") {
        return None;
    }
    let k = &data["k"];
    if k.is_null() {
        return None;
    }

    let symbol = data["s"].as_str().unwrap_or("").to_string();
    if symbol.is_empty() {
        return None;
    }

    Some(LiveKline {
        symbol,
        open_time: k["t"].as_i64().unwrap_or(0),
        close_time: k["T"].as_i64().unwrap_or(0),
        open: k["o"].as_str().unwrap_or("0").parse().unwrap_or(0.0),
        high: k["h"].as_str().unwrap_or("0").parse().unwrap_or(0.0),
        low: k["l"].as_str().unwrap_or("0").parse().unwrap_or(0.0),
        close: k["c"].as_str().unwrap_or("0").parse().unwrap_or(0.0),
        volume: k["v"].as_str().unwrap_or("0").parse().unwrap_or(0.0),
        is_closed: k["x"].as_bool().unwrap_or(false),
    })
}

/// Production transport: one multiplexed socket carrying every symbol's
/// 5m kline stream.
pub struct WsTransport;

#[async_trait]
impl StreamTransport for WsTransport {
    async fn connect(&self, symbols: &[String]) -> Result<Box<dyn KlineStream>> {
        let url = build_combined_stream_url(symbols);
        let (ws_stream, _) = connect_async(url.as_str()).await?;
        let (_write, read) = ws_stream.split();
        Ok(Box::new(WsKlineStream { read }))
    }
}

struct WsKlineStream {
    read: SplitStream<WebSocketStream<MaybeTlsStream<TcpStream>>>,
}

#[async_trait]
impl KlineStream for WsKlineStream {
    async fn next_frame(&mut self) -> Option<Result<String>> {
        while let Some(msg) = self.read.next().await {
            match msg {
                Ok(Message::Text(text)) => return Some(Ok(text.to_string())),
                Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {}
                Ok(Message::Close(_)) => return None,
                Err(e) => return Some(Err(e.into())),
                _ => {}
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn closed_kline_frame(symbol: &str, close: f64, is_closed: bool) -> String {
        format!(
            r#"{{"stream":"{sym_lower}@kline_5m","data":{{"e":"kline","E":1700000000123,"s":"{sym}","k":{{"t":1700000000000,"T":1700000299999,"s":"{sym}","i":"5m","o":"100.10","c":"{close}","h":"101.00","l":"99.90","v":"1234.5","x":{is_closed}}}}}}}"#,
            sym_lower = symbol.to_lowercase(),
            sym = symbol,
            close = close,
            is_closed = is_closed,
        )
    }

    #[test]
    fn url_multiplexes_lowercased_symbols() {
        let url = build_combined_stream_url(&["BTCUSDT".into(), "ethusdt".into()]);
        assert_eq!(
            url,
            "wss://stream.binance.com:9443/stream?streams=btcusdt@kline_5m/ethusdt@kline_5m"
        );
    }

    #[test]
    fn closed_kline_is_parsed() {
        let frame = closed_kline_frame("BTCUSDT", 100.5, true);
        let kline = parse_kline_frame(&frame).unwrap();
        assert_eq!(kline.symbol, "BTCUSDT");
        assert!(kline.is_closed);
        assert!((kline.close - 100.5).abs() < 1e-12);
        assert!((kline.open - 100.1).abs() < 1e-12);
        assert_eq!(kline.open_time, 1_700_000_000_000);
        assert_eq!(kline.close_time, 1_700_000_299_999);
    }

    #[test]
    fn open_kline_keeps_its_flag() {
        let frame = closed_kline_frame("BTCUSDT", 100.5, false);
        assert!(!parse_kline_frame(&frame).unwrap().is_closed);
    }

    #[test]
    fn malformed_frames_are_dropped() {
        assert!(parse_kline_frame("not json at all").is_none());
        assert!(parse_kline_frame("{}").is_none());
        assert!(parse_kline_frame(r#"{"data":{"e":"24hrTicker","s":"BTCUSDT"}}"#).is_none());
        assert!(parse_kline_frame(r#"{"data":{"e":"kline","s":"BTCUSDT"}}"#).is_none());
        assert!(parse_kline_frame(r#"{"data":{"e":"kline","k":{"t":1}}}"#).is_none());
    }
}
