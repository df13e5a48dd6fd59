use super::config;
use crate::error::ValidationRejection;
use crate::screener::models::{Horizon, OptionType, Side};
use serde::{Deserialize, Serialize};

/// Position of a session in the intake flow
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConversationState {
    Init,
    AwaitType,
    AwaitSide,
    AwaitOtm,
    AwaitPremium,
    AwaitHorizon,
    AwaitContracts,
    AwaitSelection,
    Done,
}

/// Trim and lowercase; nothing else is applied before validation
pub fn normalize(input: &str) -> String {
    input.trim().to_lowercase()
}

pub fn is_restart(normalized: &str) -> bool {
    config::RESTART_TOKENS.contains(&normalized)
}

pub fn parse_option_type(input: &str) -> Result<OptionType, ValidationRejection> {
    if config::CALL_WORDS.contains(&input) {
        Ok(OptionType::Call)
    } else if config::PUT_WORDS.contains(&input) {
        Ok(OptionType::Put)
    } else {
        Err(ValidationRejection::OptionType)
    }
}

pub fn parse_side(input: &str) -> Result<Side, ValidationRejection> {
    if config::BUY_WORDS.contains(&input) {
        Ok(Side::Buy)
    } else if config::SELL_WORDS.contains(&input) {
        Ok(Side::Sell)
    } else {
        Err(ValidationRejection::Side)
    }
}

pub fn parse_otm(input: &str) -> Result<bool, ValidationRejection> {
    if config::YES_WORDS.contains(&input) {
        Ok(true)
    } else if config::NO_WORDS.contains(&input) {
        Ok(false)
    } else {
        Err(ValidationRejection::OtmOnly)
    }
}

/// Positive decimal; accepts `,` as the decimal separator and a leading currency symbol
pub fn parse_premium(input: &str) -> Result<f64, ValidationRejection> {
    let stripped = input
        .trim_start_matches(config::CURRENCY_SYMBOLS)
        .trim()
        .replace(',', ".");

    match stripped.parse::<f64>() {
        Ok(value) if value.is_finite() && value > 0.0 => Ok(value),
        _ => Err(ValidationRejection::Premium),
    }
}

pub fn parse_horizon(input: &str) -> Result<Horizon, ValidationRejection> {
    let table = [
        (config::ONE_WEEK_WORDS, Horizon::OneWeek),
        (config::TWO_WEEKS_WORDS, Horizon::TwoWeeks),
        (config::ONE_MONTH_WORDS, Horizon::OneMonth),
        (config::TWO_MONTHS_WORDS, Horizon::TwoMonths),
    ];

    table
        .iter()
        .find(|(words, _)| words.contains(&input))
        .map(|(_, horizon)| *horizon)
        .ok_or(ValidationRejection::Horizon)
}

/// Whole, positive number of contracts
pub fn parse_contracts(input: &str) -> Result<u32, ValidationRejection> {
    if input.is_empty() || !input.chars().all(|c| c.is_ascii_digit()) {
        return Err(ValidationRejection::Contracts);
    }

    match input.parse::<u32>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(ValidationRejection::Contracts),
    }
}

/// 1-based pick from a list of `count` candidates, returned as a 0-based index
pub fn parse_selection(input: &str, count: usize) -> Result<usize, ValidationRejection> {
    let rejection = ValidationRejection::Selection { max: count };

    match input.trim_start_matches('#').parse::<usize>() {
        Ok(n) if n >= 1 && n <= count => Ok(n - 1),
        _ => Err(rejection),
    }
}
