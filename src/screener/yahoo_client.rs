use super::config;
use super::feed::MarketDataFeed;
use super::models::{ChainRow, OptionType};
use crate::utility::timing::timed_async_if_slow;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate};
use rand::{seq::SliceRandom, thread_rng};
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tokio_retry::strategy::ExponentialBackoff;
use tokio_retry::Retry;

/// How long a base (no expiration) snapshot is reused for spot and expirations
const SNAPSHOT_TTL: Duration = Duration::from_secs(60);

// -----------------------------------------------
// WIRE MODELS
// -----------------------------------------------

#[derive(Debug, Clone, Deserialize)]
struct OptionsEnvelope {
    #[serde(rename = "optionChain")]
    option_chain: OptionsChainBody,
}

#[derive(Debug, Clone, Deserialize)]
struct OptionsChainBody {
    #[serde(default)]
    result: Vec<OptionsResult>,
}

#[derive(Debug, Clone, Deserialize)]
struct OptionsResult {
    #[serde(rename = "expirationDates", default)]
    expiration_dates: Vec<i64>,

    quote: Option<Quote>,

    #[serde(default)]
    options: Vec<OptionsBlock>,
}

#[derive(Debug, Clone, Deserialize)]
struct Quote {
    #[serde(rename = "regularMarketPrice")]
    regular_market_price: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
struct OptionsBlock {
    #[serde(default)]
    calls: Vec<ContractQuote>,

    #[serde(default)]
    puts: Vec<ContractQuote>,
}

#[derive(Debug, Clone, Deserialize)]
struct ContractQuote {
    strike: Option<f64>,
    bid: Option<f64>,
    ask: Option<f64>,
    expiration: Option<i64>,
    delta: Option<f64>,
}

fn date_from_unix(ts: i64) -> Option<NaiveDate> {
    DateTime::from_timestamp(ts, 0).map(|dt| dt.date_naive())
}

fn unix_from_date(date: NaiveDate) -> i64 {
    date.and_hms_opt(0, 0, 0)
        .map(|dt| dt.and_utc().timestamp())
        .unwrap_or_default()
}

fn to_chain_rows(quotes: Vec<ContractQuote>, fallback_expiration: NaiveDate) -> Vec<ChainRow> {
    quotes
        .into_iter()
        .map(|q| ChainRow {
            strike: q.strike,
            bid: q.bid,
            ask: q.ask,
            expiration: q.expiration.and_then(date_from_unix).unwrap_or(fallback_expiration),
            quoted_delta: q.delta,
        })
        .collect()
}

// -----------------------------------------------
// CLIENT WRAPPER WITH SESSION CRUMB AND SNAPSHOT CACHE
// -----------------------------------------------
pub struct YahooFeed {
    client: Client,
    symbol: String,
    crumb: RwLock<Option<String>>,
    snapshot: RwLock<Option<(OptionsResult, Instant)>>,
}

impl YahooFeed {
    pub fn new(symbol: impl Into<String>) -> Result<Self> {
        Ok(Self {
            client: build_client()?,
            symbol: symbol.into(),
            crumb: RwLock::new(None),
            snapshot: RwLock::new(None),
        })
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Obtain session cookies and the crumb token (only once per client)
    async fn crumb(&self) -> Result<String> {
        if let Some(crumb) = self.crumb.read().await.as_ref() {
            return Ok(crumb.clone());
        }

        let mut slot = self.crumb.write().await;
        if let Some(crumb) = slot.as_ref() {
            return Ok(crumb.clone());
        }

        // Sets the consent cookie; the status code itself is irrelevant
        let _ = self.client
            .get(config::YAHOO_WARMUP_URL)
            .send()
            .await
            .context("Failed to warm up market data session")?;

        let crumb = self.client
            .get(config::YAHOO_CRUMB_URL)
            .send()
            .await
            .context("Failed to request crumb")?
            .error_for_status()
            .context("Crumb request rejected")?
            .text()
            .await
            .context("Failed to read crumb")?;

        let crumb = crumb.trim().to_string();
        if crumb.is_empty() || crumb.starts_with('<') || crumb.starts_with('{') {
            anyhow::bail!("Unexpected crumb response");
        }

        tracing::debug!(symbol = %self.symbol, "market data session warmed up");
        *slot = Some(crumb.clone());
        Ok(crumb)
    }

    async fn invalidate_crumb(&self) {
        *self.crumb.write().await = None;
    }

    /// Generic retry fetch
    async fn fetch_options(&self, expiration: Option<NaiveDate>) -> Result<OptionsResult> {
        let backoff = ExponentialBackoff::from_millis(config::RETRY_BASE_DELAY_MS)
            .factor(config::RETRY_FACTOR)
            .max_delay(Duration::from_secs(config::RETRY_MAX_DELAY_SECS))
            .take(config::RETRY_MAX_ATTEMPTS);

        let label = match expiration {
            Some(d) => format!("options {} {}", self.symbol, d),
            None => format!("options {}", self.symbol),
        };

        let this = self;
        let text = timed_async_if_slow(label, config::SLOW_FEED_CALL_MS, || {
            Retry::spawn(backoff, move || async move {
                let crumb = this.crumb().await?;
                let url = config::yahoo_options_url(&this.symbol, &crumb, expiration.map(unix_from_date));

                let res = this.client
                    .get(&url)
                    .send()
                    .await
                    .context("Request send failed")?;

                let status = res.status();

                if status.is_success() {
                    let text = res.text().await.context("Failed to read body")?;
                    if !text.trim_start().starts_with('{') {
                        let preview: String = text.chars().take(200).collect();
                        anyhow::bail!("Non-JSON response: {}", preview);
                    }
                    Ok::<String, anyhow::Error>(text)
                } else if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
                    this.invalidate_crumb().await;
                    tracing::warn!(%status, symbol = %this.symbol, "crumb rejected, refreshing session");
                    anyhow::bail!("Unauthorized: {}", status)
                } else if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
                    tracing::warn!(%status, symbol = %this.symbol, "retryable market data error");
                    anyhow::bail!("Retryable error: {}", status)
                } else {
                    let body = res.text().await.unwrap_or_default();
                    let preview: String = body.chars().take(200).collect();
                    anyhow::bail!("Client error {}: {}", status, preview)
                }
            })
        })
        .await?;

        let envelope: OptionsEnvelope = serde_json::from_str(&text)
            .context("Failed to parse option chain")?;

        envelope
            .option_chain
            .result
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("Empty option chain result for {}", self.symbol))
    }

    /// Base snapshot (expirations + quote), cached for a short time
    async fn base_snapshot(&self) -> Result<OptionsResult> {
        {
            let cache = self.snapshot.read().await;
            if let Some((result, fetched_at)) = cache.as_ref() {
                if fetched_at.elapsed() < SNAPSHOT_TTL {
                    return Ok(result.clone());
                }
            }
        }

        let result = self.fetch_options(None).await?;
        *self.snapshot.write().await = Some((result.clone(), Instant::now()));
        Ok(result)
    }
}

#[async_trait]
impl MarketDataFeed for YahooFeed {
    async fn list_expirations(&self) -> Result<Vec<NaiveDate>> {
        let snapshot = self.base_snapshot().await?;
        let mut dates: Vec<NaiveDate> = snapshot
            .expiration_dates
            .iter()
            .filter_map(|ts| date_from_unix(*ts))
            .collect();
        dates.sort();
        dates.dedup();
        Ok(dates)
    }

    async fn get_chain(&self, expiration: NaiveDate, option_type: OptionType) -> Result<Vec<ChainRow>> {
        let result = self.fetch_options(Some(expiration)).await?;
        let Some(block) = result.options.into_iter().next() else {
            return Ok(Vec::new());
        };

        let quotes = match option_type {
            OptionType::Call => block.calls,
            OptionType::Put => block.puts,
        };

        Ok(to_chain_rows(quotes, expiration))
    }

    async fn get_spot_price(&self) -> Result<f64> {
        let snapshot = self.base_snapshot().await?;
        snapshot
            .quote
            .and_then(|q| q.regular_market_price)
            .ok_or_else(|| anyhow!("No spot price quoted for {}", self.symbol))
    }
}

// -----------------------------------------------
// HTTP CLIENT BUILDER
// -----------------------------------------------
fn build_client() -> Result<Client> {
    let mut headers = header::HeaderMap::new();

    let lang = config::ACCEPT_LANGUAGES
        .choose(&mut thread_rng())
        .copied()
        .unwrap_or("en-US,en;q=0.9");
    headers.insert(header::ACCEPT_LANGUAGE, header::HeaderValue::from_str(lang)?);
    headers.insert(header::ACCEPT, header::HeaderValue::from_static("*/*"));

    Client::builder()
        .default_headers(headers)
        .cookie_store(true)
        .user_agent(config::USER_AGENT)
        .timeout(config::HTTP_TIMEOUT)
        .build()
        .context("Failed to build HTTP client")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "optionChain": {
            "result": [{
                "underlyingSymbol": "IBIT",
                "expirationDates": [1773964800, 1773360000],
                "quote": { "regularMarketPrice": 50.0 },
                "options": [{
                    "expirationDate": 1773360000,
                    "calls": [
                        { "strike": 52.0, "bid": 0.55, "ask": 0.65, "expiration": 1773360000 },
                        { "strike": 54.0, "ask": 0.40 }
                    ],
                    "puts": []
                }]
            }],
            "error": null
        }
    }"#;

    #[test]
    fn test_parse_options_payload() {
        let envelope: OptionsEnvelope = serde_json::from_str(SAMPLE).unwrap();
        let result = envelope.option_chain.result.into_iter().next().unwrap();

        assert_eq!(result.expiration_dates.len(), 2);
        assert_eq!(result.quote.and_then(|q| q.regular_market_price), Some(50.0));

        let block = result.options.into_iter().next().unwrap();
        let fallback = NaiveDate::from_ymd_opt(2026, 3, 20).unwrap();
        let rows = to_chain_rows(block.calls, fallback);

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].expiration, NaiveDate::from_ymd_opt(2026, 3, 13).unwrap());
        assert_eq!(rows[1].bid, None);
        assert_eq!(rows[1].expiration, fallback);
    }

    #[test]
    fn test_date_unix_roundtrip_at_midnight() {
        let d = NaiveDate::from_ymd_opt(2026, 3, 13).unwrap();
        assert_eq!(unix_from_date(d), 1773360000);
        assert_eq!(date_from_unix(1773360000), Some(d));
    }
}
