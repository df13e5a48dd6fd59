use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum OptionType {
    Call,
    Put,
}

impl OptionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            OptionType::Call => "CALL",
            OptionType::Put => "PUT",
        }
    }
}

impl fmt::Display for OptionType {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Buy,
    Sell,
}

impl Side {
    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Buy => "BUY",
            Side::Sell => "SELL",
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maximum time-to-expiration bucket chosen by the user
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Horizon {
    OneWeek,
    TwoWeeks,
    OneMonth,
    TwoMonths,
}

impl Horizon {
    pub fn days(&self) -> i64 {
        match self {
            Horizon::OneWeek => 7,
            Horizon::TwoWeeks => 14,
            Horizon::OneMonth => 30,
            Horizon::TwoMonths => 60,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Horizon::OneWeek => "1 week",
            Horizon::TwoWeeks => "2 weeks",
            Horizon::OneMonth => "1 month",
            Horizon::TwoMonths => "2 months",
        }
    }
}

impl fmt::Display for Horizon {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A fully specified screening query.
///
/// Only `CriteriaBuilder::build` hands these out, so every field is present.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryCriteria {
    pub option_type: OptionType,
    pub side: Side,
    pub otm_only: bool,
    pub target_premium: f64,
    pub horizon: Horizon,
    pub contracts: u32,
}

/// One strike of one side of the chain, as delivered by the feed
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChainRow {
    pub strike: Option<f64>,
    pub bid: Option<f64>,
    pub ask: Option<f64>,
    pub expiration: NaiveDate,
    pub quoted_delta: Option<f64>,
}

impl ChainRow {
    pub fn new(strike: f64, bid: f64, ask: f64, expiration: NaiveDate) -> Self {
        Self {
            strike: Some(strike),
            bid: Some(bid),
            ask: Some(ask),
            expiration,
            quoted_delta: None,
        }
    }

    pub fn with_delta(mut self, delta: f64) -> Self {
        self.quoted_delta = Some(delta);
        self
    }
}

/// Candidate contract produced by the screener
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScreenedContract {
    pub strike: f64,
    pub premium: f64,
    pub expiration: NaiveDate,
    pub total_cost: f64,
    pub roi_estimate: f64,
    pub delta: Option<f64>,
}

/// Ranked candidates plus the market context they were computed against
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScreenReport {
    pub expiration: NaiveDate,
    pub spot: f64,
    pub contracts: Vec<ScreenedContract>,
    pub used_fallback: bool,
}
