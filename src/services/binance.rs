//! Binance USDⓈ-M futures REST client
//!
//! Every outbound call goes through the shared [`RateLimiter`] and a
//! bounded retry loop. HTTP 429 honors the server's `Retry-After`
//! header; other transient failures back off exponentially with
//! jitter. After the retry budget is spent the error is returned and
//! the caller skips the symbol for this cycle.

use reqwest::{Client, StatusCode, header::RETRY_AFTER};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::services::rate_limiter::RateLimiter;

const DEFAULT_BASE_URL: &str = "https://fapi.binance.com";
const EXCHANGE_INFO_ENDPOINT: &str = "/fapi/v1/exchangeInfo";
const OPEN_INTEREST_ENDPOINT: &str = "/fapi/v1/openInterest";
const TICKER_PRICE_ENDPOINT: &str = "/fapi/v1/ticker/price";
const TICKER_24HR_ENDPOINT: &str = "/fapi/v1/ticker/24hr";

/// Request timeout for every call
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Retry budget per logical fetch
const MAX_RETRIES: u32 = 3;

/// Wait applied on 429 when the server sends no Retry-After header
const DEFAULT_RETRY_AFTER_SECS: u64 = 5;

/// Error types for exchange fetches
#[derive(Debug)]
pub enum FetchError {
    /// Network-level failure (connect, timeout, body read)
    Transport(String),
    /// Non-success, non-429 HTTP status
    Status(u16),
    /// Payload did not decode into the expected shape
    Parse(String),
    /// Retry budget exhausted without a usable response
    RetriesExhausted { attempts: u32 },
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Transport(msg) => write!(f, "Transport error: {}", msg),
            FetchError::Status(code) => write!(f, "HTTP error: status {}", code),
            FetchError::Parse(msg) => write!(f, "Parse error: {}", msg),
            FetchError::RetriesExhausted { attempts } => {
                write!(f, "Retries exhausted after {} attempts", attempts)
            }
        }
    }
}

impl std::error::Error for FetchError {}

#[derive(Debug, Deserialize)]
struct ExchangeInfo {
    symbols: Vec<SymbolInfo>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SymbolInfo {
    symbol: String,
    contract_type: String,
    status: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct OpenInterestResponse {
    open_interest: String,
}

#[derive(Debug, Deserialize)]
struct TickerPriceResponse {
    price: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Ticker24hrEntry {
    symbol: String,
    last_price: String,
}

/// Binance futures REST client behind the shared rate-limiter gate.
#[derive(Clone)]
pub struct BinanceFuturesService {
    client: Client,
    base_url: String,
    limiter: Arc<RateLimiter>,
}

impl BinanceFuturesService {
    pub fn new(limiter: Arc<RateLimiter>) -> Self {
        Self::with_base_url(limiter, DEFAULT_BASE_URL.to_string())
    }

    /// Base-URL override for tests against a local stub.
    pub fn with_base_url(limiter: Arc<RateLimiter>, base_url: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(HTTP_TIMEOUT)
                .build()
                .expect("reqwest client with static config"),
            base_url,
            limiter,
        }
    }

    /// All perpetual symbols currently trading.
    pub async fn perpetual_symbols(&self) -> Result<Vec<String>, FetchError> {
        let info: ExchangeInfo = self.get_json(EXCHANGE_INFO_ENDPOINT, &[]).await?;

        let symbols: Vec<String> = info
            .symbols
            .into_iter()
            .filter(|s| s.contract_type == "PERPETUAL" && s.status == "TRADING")
            .map(|s| s.symbol)
            .collect();

        debug!(count = symbols.len(), "fetched perpetual symbol universe");
        Ok(symbols)
    }

    /// Current open interest for one symbol.
    pub async fn open_interest(&self, symbol: &str) -> Result<f64, FetchError> {
        let response: OpenInterestResponse = self
            .get_json(OPEN_INTEREST_ENDPOINT, &[("symbol", symbol)])
            .await?;

        response
            .open_interest
            .parse::<f64>()
            .map_err(|e| FetchError::Parse(format!("openInterest for {}: {}", symbol, e)))
    }

    /// Current price for one symbol.
    pub async fn ticker_price(&self, symbol: &str) -> Result<f64, FetchError> {
        let response: TickerPriceResponse = self
            .get_json(TICKER_PRICE_ENDPOINT, &[("symbol", symbol)])
            .await?;

        response
            .price
            .parse::<f64>()
            .map_err(|e| FetchError::Parse(format!("price for {}: {}", symbol, e)))
    }

    /// Bulk last prices for every symbol; entries that fail to parse
    /// are dropped so one bad ticker cannot sink the whole batch.
    pub async fn all_prices(&self) -> Result<HashMap<String, f64>, FetchError> {
        let entries: Vec<Ticker24hrEntry> = self.get_json(TICKER_24HR_ENDPOINT, &[]).await?;

        let prices: HashMap<String, f64> = entries
            .into_iter()
            .filter_map(|entry| {
                entry
                    .last_price
                    .parse::<f64>()
                    .ok()
                    .map(|price| (entry.symbol, price))
            })
            .collect();

        debug!(count = prices.len(), "fetched bulk ticker prices");
        Ok(prices)
    }

    /// Rate-limited GET with bounded retry.
    ///
    /// 429 responses take the wait-and-retry branch (no exponential
    /// backoff); other failures back off `2^attempt + jitter` seconds.
    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        params: &[(&str, &str)],
    ) -> Result<T, FetchError> {
        self.limiter.acquire().await;

        let url = format!("{}{}", self.base_url, endpoint);

        for attempt in 0..MAX_RETRIES {
            let started = Instant::now();
            let result = self.client.get(&url).query(params).send().await;

            match result {
                Ok(response) => {
                    let status = response.status();

                    if status == StatusCode::TOO_MANY_REQUESTS {
                        let retry_after = response
                            .headers()
                            .get(RETRY_AFTER)
                            .and_then(|v| v.to_str().ok())
                            .and_then(|v| v.parse::<u64>().ok())
                            .unwrap_or(DEFAULT_RETRY_AFTER_SECS);
                        warn!(
                            endpoint,
                            retry_after_secs = retry_after,
                            attempt = attempt + 1,
                            max_retries = MAX_RETRIES,
                            "rate limit signaled by server, waiting"
                        );
                        tokio::time::sleep(Duration::from_secs(retry_after)).await;
                        continue;
                    }

                    if status.is_success() {
                        debug!(
                            endpoint,
                            status = status.as_u16(),
                            latency_ms = started.elapsed().as_millis() as u64,
                            "request ok"
                        );
                        return response
                            .json::<T>()
                            .await
                            .map_err(|e| FetchError::Parse(e.to_string()));
                    }

                    if attempt + 1 == MAX_RETRIES {
                        return Err(FetchError::Status(status.as_u16()));
                    }
                }
                Err(e) => {
                    if attempt + 1 == MAX_RETRIES {
                        return Err(FetchError::Transport(e.to_string()));
                    }
                }
            }

            let backoff_secs = 2f64.powi(attempt as i32) + rand::random::<f64>() * 0.5;
            warn!(
                endpoint,
                attempt = attempt + 1,
                max_retries = MAX_RETRIES,
                wait_secs = backoff_secs,
                "request failed, backing off"
            );
            tokio::time::sleep(Duration::from_secs_f64(backoff_secs)).await;
        }

        Err(FetchError::RetriesExhausted {
            attempts: MAX_RETRIES,
        })
    }
}
