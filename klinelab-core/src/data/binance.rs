//! Binance spot kline provider.
//!
//! Uses the public `GET /api/v3/klines` endpoint, which needs no API key.
//! Responses are capped at 1000 klines, so a range is fetched page by page.
//! Rate limits (429/418) and server errors are retried with exponential
//! backoff.

use super::provider::{DataError, KlineProvider};
use crate::domain::Bar;
use chrono::{DateTime, NaiveDateTime};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

pub const DEFAULT_BASE_URL: &str = "https://api.binance.com";

/// Maximum klines per request accepted by the endpoint.
const PAGE_LIMIT: usize = 1000;

pub struct BinanceProvider {
    client: reqwest::blocking::Client,
    base_url: String,
    max_retries: u32,
    base_delay: Duration,
}

impl BinanceProvider {
    pub fn new() -> Result<Self, DataError> {
        Self::with_base_url(DEFAULT_BASE_URL)
    }

    pub fn with_base_url(base_url: &str) -> Result<Self, DataError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                DataError::NetworkUnreachable(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        })
    }

    fn klines_url(&self, symbol: &str, interval: &str, start_ms: i64, end_ms: i64) -> String {
        format!(
            "{}/api/v3/klines?symbol={symbol}&interval={interval}\
             &startTime={start_ms}&endTime={end_ms}&limit={PAGE_LIMIT}",
            self.base_url
        )
    }

    /// Execute a single page request with retry logic.
    fn fetch_page(&self, symbol: &str, url: &str) -> Result<Vec<Bar>, DataError> {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            if attempt > 0 {
                let delay = self.base_delay * 2u32.pow(attempt - 1);
                std::thread::sleep(delay);
            }

            match self.client.get(url).send() {
                Ok(resp) => {
                    let status = resp.status();

                    if status == reqwest::StatusCode::TOO_MANY_REQUESTS
                        || status.as_u16() == 418
                    {
                        let retry_after = resp
                            .headers()
                            .get("retry-after")
                            .and_then(|v| v.to_str().ok())
                            .and_then(|v| v.parse::<u64>().ok())
                            .unwrap_or(60);
                        warn!(symbol, retry_after, "rate limited by Binance");
                        last_error = Some(DataError::RateLimited {
                            retry_after_secs: retry_after,
                        });
                        continue;
                    }

                    if status == reqwest::StatusCode::BAD_REQUEST {
                        let body = resp.text().unwrap_or_default();
                        if body.contains("Invalid symbol") {
                            return Err(DataError::SymbolNotFound {
                                symbol: symbol.to_string(),
                            });
                        }
                        return Err(DataError::Other(format!("HTTP 400 for {symbol}: {body}")));
                    }

                    if status.is_server_error() {
                        last_error = Some(DataError::Other(format!("HTTP {status} for {symbol}")));
                        continue;
                    }

                    if !status.is_success() {
                        return Err(DataError::Other(format!("HTTP {status} for {symbol}")));
                    }

                    let payload: Value = resp.json().map_err(|e| {
                        DataError::ResponseFormatChanged(format!(
                            "failed to parse response for {symbol}: {e}"
                        ))
                    })?;
                    return parse_klines(&payload);
                }
                Err(e) => {
                    if e.is_connect() || e.is_timeout() {
                        last_error = Some(DataError::NetworkUnreachable(e.to_string()));
                        continue;
                    }
                    return Err(DataError::NetworkUnreachable(e.to_string()));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| DataError::Other("max retries exceeded".into())))
    }
}

impl KlineProvider for BinanceProvider {
    fn name(&self) -> &str {
        "binance"
    }

    fn fetch(
        &self,
        symbol: &str,
        interval: &str,
        start: NaiveDateTime,
        end: NaiveDateTime,
    ) -> Result<Vec<Bar>, DataError> {
        let end_ms = end.and_utc().timestamp_millis() - 1;
        let mut cursor = start.and_utc().timestamp_millis();
        let mut bars = Vec::new();

        while cursor <= end_ms {
            let url = self.klines_url(symbol, interval, cursor, end_ms);
            let page = self.fetch_page(symbol, &url)?;
            debug!(symbol, cursor, rows = page.len(), "fetched kline page");

            let Some(last) = page.last() else {
                break;
            };
            let next = last.timestamp.and_utc().timestamp_millis() + 1;
            let full_page = page.len() == PAGE_LIMIT;
            bars.extend(page);
            if !full_page || next <= cursor {
                break;
            }
            cursor = next;
        }

        Ok(bars)
    }
}

/// Parse a `/api/v3/klines` payload.
///
/// Each kline is an array `[open_time_ms, "open", "high", "low", "close",
/// "volume", close_time_ms, ...]`; prices arrive as decimal strings.
pub fn parse_klines(payload: &Value) -> Result<Vec<Bar>, DataError> {
    let rows = payload
        .as_array()
        .ok_or_else(|| DataError::ResponseFormatChanged("klines payload is not an array".into()))?;

    rows.iter()
        .enumerate()
        .map(|(i, row)| {
            let fields = row.as_array().filter(|f| f.len() >= 6).ok_or_else(|| {
                DataError::ResponseFormatChanged(format!("kline {i} is not a 6+ element array"))
            })?;

            let open_ms = fields[0].as_i64().ok_or_else(|| {
                DataError::ResponseFormatChanged(format!("kline {i} has no open time"))
            })?;
            let timestamp = DateTime::from_timestamp_millis(open_ms)
                .map(|dt| dt.naive_utc())
                .ok_or(DataError::TimestampOutOfRange(open_ms))?;

            Ok(Bar {
                timestamp,
                open: decimal_field(&fields[1], i, "open")?,
                high: decimal_field(&fields[2], i, "high")?,
                low: decimal_field(&fields[3], i, "low")?,
                close: decimal_field(&fields[4], i, "close")?,
                volume: decimal_field(&fields[5], i, "volume")?,
            })
        })
        .collect()
}

fn decimal_field(value: &Value, row: usize, name: &str) -> Result<f64, DataError> {
    let parsed = match value {
        Value::String(s) => s.parse::<f64>().ok(),
        Value::Number(n) => n.as_f64(),
        _ => None,
    };
    parsed.ok_or_else(|| DataError::ResponseFormatChanged(format!("kline {row} has bad {name}")))
}
