use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::config::{FETCH_BACKOFF_MS, FETCH_TIMEOUT_SECS, YAHOO_COOKIE_URL};
use crate::error::Result;
use crate::types::{Fundamentals, PricePoint, PriceSeries};

/// quoteSummary modules needed to fill `Fundamentals`.
const SUMMARY_MODULES: &str = "price,summaryDetail,defaultKeyStatistics,financialData,assetProfile";

/// Per-symbol fetch failure. Never fatal to a scan.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP status {0}")]
    Status(u16),

    #[error("unexpected response: {0}")]
    Malformed(String),

    #[error("no data returned")]
    Empty,

    #[error("authentication failed: {0}")]
    Auth(String),
}

impl ProviderError {
    /// Worth another attempt after a short wait.
    pub fn is_transient(&self) -> bool {
        match self {
            ProviderError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            ProviderError::Status(code) => *code == 429 || *code >= 500,
            _ => false,
        }
    }
}

/// Source of price history and company metrics for the scanner.
/// Implementations may use `async fn`; the returned futures must be `Send`.
pub trait MarketDataProvider: Send + Sync {
    /// Daily closes, oldest first, covering `range` (e.g. "1y").
    fn fetch_price_history(
        &self,
        symbol: &str,
        range: &str,
    ) -> impl Future<Output = std::result::Result<PriceSeries, ProviderError>> + Send;

    /// Snapshot of company metrics. Missing fields are None, not an error.
    fn fetch_fundamentals(
        &self,
        symbol: &str,
    ) -> impl Future<Output = std::result::Result<Fundamentals, ProviderError>> + Send;
}

/// Wait before retry number `attempt` (0-based). None when the error is not
/// transient or the backoff table is exhausted.
fn retry_delay(err: &ProviderError, attempt: usize) -> Option<Duration> {
    if !err.is_transient() {
        return None;
    }
    FETCH_BACKOFF_MS.get(attempt).map(|ms| Duration::from_millis(*ms))
}

/// Run `op` until it succeeds, fails permanently, or retries run out.
async fn with_retries<T, F, Fut>(label: &str, mut op: F) -> std::result::Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = std::result::Result<T, ProviderError>>,
{
    let mut attempt = 0usize;
    loop {
        match op().await {
            Ok(v) => return Ok(v),
            Err(e) => match retry_delay(&e, attempt) {
                Some(delay) => {
                    attempt += 1;
                    warn!("{label} failed ({e}), retrying in {}ms", delay.as_millis());
                    tokio::time::sleep(delay).await;
                }
                None => return Err(e),
            },
        }
    }
}

/// quoteSummary rejects a stale crumb with 401 or 403.
fn is_crumb_rejected(err: &ProviderError) -> bool {
    matches!(err, ProviderError::Status(401 | 403))
}

// ---------------------------------------------------------------------------
// Yahoo Finance
// ---------------------------------------------------------------------------

pub struct YahooProvider {
    client: reqwest::Client,
    base_url: String,
    /// quoteSummary needs a crumb tied to the session cookie. Fetched lazily, reused.
    crumb: Mutex<Option<String>>,
}

impl YahooProvider {
    pub fn new(base_url: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(FETCH_TIMEOUT_SECS))
            .cookie_store(true)
            .user_agent("Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko)")
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            crumb: Mutex::new(None),
        })
    }

    async fn crumb(&self) -> std::result::Result<String, ProviderError> {
        let mut cached = self.crumb.lock().await;
        if let Some(crumb) = cached.as_ref() {
            return Ok(crumb.clone());
        }

        // Only the Set-Cookie header matters here; the page itself is usually a 404.
        if let Err(e) = self.client.get(YAHOO_COOKIE_URL).send().await {
            debug!("cookie bootstrap request failed: {e}");
        }

        let url = format!("{}/v1/test/getcrumb", self.base_url);
        let resp = self.client.get(&url).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ProviderError::Auth(format!("getcrumb returned {status}")));
        }
        let body = resp.text().await?;
        let crumb = body.trim();
        if crumb.is_empty() || crumb.len() > 64 || crumb.contains('<') {
            return Err(ProviderError::Auth("getcrumb returned an invalid crumb".to_string()));
        }

        *cached = Some(crumb.to_string());
        Ok(crumb.to_string())
    }

    async fn invalidate_crumb(&self) {
        *self.crumb.lock().await = None;
    }

    /// GET a JSON document, retrying transient failures with `FETCH_BACKOFF_MS`.
    async fn get_json(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> std::result::Result<serde_json::Value, ProviderError> {
        with_retries(&format!("GET {url}"), move || self.get_json_once(url, query)).await
    }

    async fn get_json_once(
        &self,
        url: &str,
        query: &[(&str, &str)],
    ) -> std::result::Result<serde_json::Value, ProviderError> {
        let resp = self.client.get(url).query(query).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(ProviderError::Status(status.as_u16()));
        }
        Ok(resp.json().await?)
    }

    async fn quote_summary(&self, symbol: &str) -> std::result::Result<serde_json::Value, ProviderError> {
        let url = format!("{}/v10/finance/quoteSummary/{}", self.base_url, symbol);
        let crumb = self.crumb().await?;
        self.get_json(&url, &[("modules", SUMMARY_MODULES), ("crumb", &crumb)]).await
    }
}

impl MarketDataProvider for YahooProvider {
    async fn fetch_price_history(
        &self,
        symbol: &str,
        range: &str,
    ) -> std::result::Result<PriceSeries, ProviderError> {
        let url = format!("{}/v8/finance/chart/{}", self.base_url, symbol);
        let resp = self.get_json(&url, &[("range", range), ("interval", "1d")]).await?;
        parse_chart(symbol, &resp)
    }

    async fn fetch_fundamentals(&self, symbol: &str) -> std::result::Result<Fundamentals, ProviderError> {
        let resp = match self.quote_summary(symbol).await {
            Err(e) if is_crumb_rejected(&e) => {
                debug!(symbol, "crumb rejected ({e}), refreshing session");
                self.invalidate_crumb().await;
                self.quote_summary(symbol).await?
            }
            other => other?,
        };
        parse_quote_summary(&resp)
    }
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

/// Parse a `/v8/finance/chart` response into closes. Days with a null close are skipped.
pub fn parse_chart(symbol: &str, v: &serde_json::Value) -> std::result::Result<PriceSeries, ProviderError> {
    let chart = v
        .get("chart")
        .ok_or_else(|| ProviderError::Malformed("missing `chart`".to_string()))?;

    if let Some(err) = chart.get("error").filter(|e| !e.is_null()) {
        let msg = err
            .get("description")
            .and_then(|d| d.as_str())
            .unwrap_or("chart error");
        return Err(ProviderError::Malformed(msg.to_string()));
    }

    let Some(result) = chart
        .get("result")
        .and_then(|r| r.as_array())
        .and_then(|a| a.first())
    else {
        return Err(ProviderError::Empty);
    };

    let timestamps: Vec<i64> = result
        .get("timestamp")
        .and_then(|t| t.as_array())
        .map(|a| a.iter().filter_map(|x| x.as_i64()).collect())
        .unwrap_or_default();

    let closes = result
        .get("indicators")
        .and_then(|i| i.get("quote"))
        .and_then(|q| q.as_array())
        .and_then(|a| a.first())
        .and_then(|q| q.get("close"))
        .and_then(|c| c.as_array())
        .ok_or_else(|| ProviderError::Malformed("missing close prices".to_string()))?;

    if timestamps.len() != closes.len() {
        return Err(ProviderError::Malformed(format!(
            "{} timestamps vs {} closes",
            timestamps.len(),
            closes.len()
        )));
    }

    let points: Vec<PricePoint> = timestamps
        .iter()
        .zip(closes)
        .filter_map(|(&date, close)| {
            close
                .as_f64()
                .filter(|c| c.is_finite())
                .map(|close| PricePoint { date, close })
        })
        .collect();

    if points.is_empty() {
        return Err(ProviderError::Empty);
    }

    Ok(PriceSeries { symbol: symbol.to_string(), points })
}

/// Parse a `/v10/finance/quoteSummary` response. Absent fields stay None.
pub fn parse_quote_summary(v: &serde_json::Value) -> std::result::Result<Fundamentals, ProviderError> {
    let summary = v
        .get("quoteSummary")
        .ok_or_else(|| ProviderError::Malformed("missing `quoteSummary`".to_string()))?;

    if let Some(err) = summary.get("error").filter(|e| !e.is_null()) {
        let msg = err
            .get("description")
            .and_then(|d| d.as_str())
            .unwrap_or("quoteSummary error");
        return Err(ProviderError::Malformed(msg.to_string()));
    }

    let Some(r) = summary
        .get("result")
        .and_then(|r| r.as_array())
        .and_then(|a| a.first())
    else {
        return Err(ProviderError::Empty);
    };

    let text = |module: &str, field: &str| {
        r.get(module)
            .and_then(|m| m.get(field))
            .and_then(|s| s.as_str())
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
    };

    Ok(Fundamentals {
        trailing_pe: raw_f64(r, "summaryDetail", "trailingPE"),
        price_to_book: raw_f64(r, "defaultKeyStatistics", "priceToBook"),
        return_on_equity: raw_f64(r, "financialData", "returnOnEquity"),
        revenue_growth: raw_f64(r, "financialData", "revenueGrowth"),
        debt_to_equity: raw_f64(r, "financialData", "debtToEquity"),
        sector: text("assetProfile", "sector"),
        short_name: text("price", "shortName"),
        market_cap: raw_f64(r, "price", "marketCap").or_else(|| raw_f64(r, "summaryDetail", "marketCap")),
        free_cashflow: raw_f64(r, "financialData", "freeCashflow"),
    })
}

/// Yahoo wraps numbers as `{"raw": 1.23, "fmt": "1.23"}`; an empty object means unavailable.
fn raw_f64(result: &serde_json::Value, module: &str, field: &str) -> Option<f64> {
    let value = result.get(module)?.get(field)?;
    value
        .get("raw")
        .and_then(|x| x.as_f64())
        .or_else(|| value.as_f64())
        .filter(|x| x.is_finite())
}
