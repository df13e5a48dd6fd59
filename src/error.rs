use chrono::NaiveDate;
use thiserror::Error;

/// Ways a screening pass can end without candidates
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ScreenError {
    #[error("no expirations on or before {cutoff}")]
    NoExpirationsInRange { cutoff: NaiveDate },

    #[error("no contracts left after filtering the {expiration} chain")]
    NoCandidatesFound { expiration: NaiveDate },

    #[error("market data unavailable: {0}")]
    FeedUnavailable(String),
}

impl From<anyhow::Error> for ScreenError {
    fn from(err: anyhow::Error) -> Self {
        ScreenError::FeedUnavailable(format!("{:#}", err))
    }
}

impl From<reqwest::Error> for ScreenError {
    fn from(err: reqwest::Error) -> Self {
        ScreenError::FeedUnavailable(err.to_string())
    }
}

/// User input that does not match what the current question accepts
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationRejection {
    #[error("expected 'call' or 'put'")]
    OptionType,

    #[error("expected 'buy' or 'sell'")]
    Side,

    #[error("expected 'yes' or 'no'")]
    OtmOnly,

    #[error("expected a positive number")]
    Premium,

    #[error("expected one of the listed horizons")]
    Horizon,

    #[error("expected a whole number of contracts")]
    Contracts,

    #[error("expected a number between 1 and {max}")]
    Selection { max: usize },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_anyhow_maps_to_feed_unavailable() {
        let err: ScreenError = anyhow::anyhow!("timed out").context("fetching chain").into();
        match err {
            ScreenError::FeedUnavailable(msg) => {
                assert!(msg.contains("fetching chain"));
                assert!(msg.contains("timed out"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }
}
