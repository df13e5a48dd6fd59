use std::time::Duration;

// -----------------------------------------------
// MARKET DATA ENDPOINTS
// -----------------------------------------------
pub const YAHOO_WARMUP_URL: &str = "https://fc.yahoo.com";
pub const YAHOO_CRUMB_URL: &str = "https://query2.finance.yahoo.com/v1/test/getcrumb";
pub const YAHOO_OPTIONS_BASE_URL: &str = "https://query2.finance.yahoo.com/v7/finance/options";

pub fn yahoo_options_url(symbol: &str, crumb: &str, expiration_ts: Option<i64>) -> String {
    let mut url = format!(
        "{}/{}?crumb={}",
        YAHOO_OPTIONS_BASE_URL,
        urlencoding::encode(symbol),
        urlencoding::encode(crumb)
    );

    if let Some(ts) = expiration_ts {
        url.push_str(&format!("&date={}", ts));
    }

    url
}

// -----------------------------------------------
// UNDERLYING
// -----------------------------------------------
pub const DEFAULT_SYMBOL: &str = "IBIT";

// -----------------------------------------------
// HTTP CLIENT CONFIG
// -----------------------------------------------
pub const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
                               AppleWebKit/537.36 (KHTML, like Gecko) \
                               Chrome/131.0.0.0 Safari/537.36";

pub const ACCEPT_LANGUAGES: &[&str] = &[
    "en-US,en;q=0.9",
    "en-GB,en;q=0.8",
    "es-ES,es;q=0.9,en;q=0.8",
];

pub const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

// -----------------------------------------------
// RETRY CONFIG
// -----------------------------------------------
pub const RETRY_BASE_DELAY_MS: u64 = 100;
pub const RETRY_FACTOR: u64 = 2;
pub const RETRY_MAX_DELAY_SECS: u64 = 3;
pub const RETRY_MAX_ATTEMPTS: usize = 3;

// -----------------------------------------------
// SCREENING DEFAULTS
// -----------------------------------------------

/// Assumed annualized volatility for the delta estimate when the feed has none.
pub const DEFAULT_VOLATILITY: f64 = 0.5;
pub const DEFAULT_RISK_FREE_RATE: f64 = 0.03;

/// Rows shown when nothing lands inside the premium band.
pub const DEFAULT_FALLBACK_COUNT: usize = 3;

/// Half-width of the premium match band, as a fraction of the target.
pub const DEFAULT_PREMIUM_BAND: f64 = 0.10;

/// Upper bound for one whole screening pass (all feed calls included).
pub const DEFAULT_FEED_TIMEOUT_SECS: u64 = 25;

pub const CONTRACT_MULTIPLIER: f64 = 100.0;
pub const DAYS_PER_YEAR: f64 = 365.0;

/// Feed calls slower than this are logged at warn level.
pub const SLOW_FEED_CALL_MS: u128 = 1500;

// -----------------------------------------------
// RUNTIME CONFIGURATION
// -----------------------------------------------

/// Underlying symbol screened by the bot
pub fn get_symbol() -> String {
    std::env::var("SCOUT_SYMBOL").unwrap_or_else(|_| DEFAULT_SYMBOL.to_string())
}

pub fn get_volatility() -> f64 {
    env_f64("SCOUT_VOLATILITY")
        .filter(|v| *v > 0.0)
        .unwrap_or(DEFAULT_VOLATILITY)
}

pub fn get_risk_free_rate() -> f64 {
    env_f64("SCOUT_RISK_FREE_RATE").unwrap_or(DEFAULT_RISK_FREE_RATE)
}

pub fn get_fallback_count() -> usize {
    if let Ok(val) = std::env::var("SCOUT_FALLBACK_COUNT") {
        if let Ok(num) = val.parse::<usize>() {
            return num.clamp(1, 10);
        }
    }

    DEFAULT_FALLBACK_COUNT
}

pub fn get_feed_timeout() -> Duration {
    let secs = std::env::var("SCOUT_FEED_TIMEOUT_SECS")
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(DEFAULT_FEED_TIMEOUT_SECS);

    Duration::from_secs(secs)
}

fn env_f64(key: &str) -> Option<f64> {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// Tunable screening parameters
#[derive(Debug, Clone, PartialEq)]
pub struct ScreenerSettings {
    pub volatility: f64,
    pub risk_free_rate: f64,
    pub fallback_count: usize,
    pub premium_band: f64,
    pub feed_timeout: Duration,
}

impl Default for ScreenerSettings {
    fn default() -> Self {
        Self {
            volatility: DEFAULT_VOLATILITY,
            risk_free_rate: DEFAULT_RISK_FREE_RATE,
            fallback_count: DEFAULT_FALLBACK_COUNT,
            premium_band: DEFAULT_PREMIUM_BAND,
            feed_timeout: Duration::from_secs(DEFAULT_FEED_TIMEOUT_SECS),
        }
    }
}

impl ScreenerSettings {
    /// Defaults overridden by `SCOUT_*` environment variables
    pub fn from_env() -> Self {
        Self {
            volatility: get_volatility(),
            risk_free_rate: get_risk_free_rate(),
            fallback_count: get_fallback_count(),
            premium_band: DEFAULT_PREMIUM_BAND,
            feed_timeout: get_feed_timeout(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_options_url_encodes_crumb() {
        let url = yahoo_options_url("IBIT", "a/b", Some(1_700_000_000));
        assert_eq!(
            url,
            "https://query2.finance.yahoo.com/v7/finance/options/IBIT?crumb=a%2Fb&date=1700000000"
        );

        let url = yahoo_options_url("IBIT", "x", None);
        assert!(!url.contains("date="));
    }

    #[test]
    fn test_default_settings() {
        let settings = ScreenerSettings::default();
        assert_eq!(settings.fallback_count, 3);
        assert_eq!(settings.volatility, 0.5);
        assert_eq!(settings.risk_free_rate, 0.03);
    }
}
