use super::state::ConversationState;
use crate::error::{ScreenError, ValidationRejection};
use crate::screener::models::{QueryCriteria, ScreenReport, ScreenedContract};

pub const GREETING: &str = "Hi 👋 Let's screen an option.";
pub const RESTART_HINT: &str = "✅ Send 'start' to run another screen.";

/// Question asked while waiting in `state`
pub fn prompt_for(state: ConversationState) -> &'static str {
    match state {
        ConversationState::Init | ConversationState::AwaitType => {
            "What type of option do you want to analyze? (call or put)"
        }
        ConversationState::AwaitSide => "Are you going to BUY or SELL this option? (buy/sell)",
        ConversationState::AwaitOtm => "Only out-of-the-money (OTM) options? (yes/no)",
        ConversationState::AwaitPremium => "What is your target premium? (for example 0.6)",
        ConversationState::AwaitHorizon => {
            "What expiration horizon? (1 week, 2 weeks, 1 month, 2 months)"
        }
        ConversationState::AwaitContracts => "How many contracts?",
        ConversationState::AwaitSelection => "Reply with the number of a contract to see its details.",
        ConversationState::Done => RESTART_HINT,
    }
}

pub fn first_prompt() -> String {
    format!("{}\n{}", GREETING, prompt_for(ConversationState::AwaitType))
}

pub fn rejection(reason: &ValidationRejection, state: ConversationState) -> String {
    format!("⚠️ Sorry, {}.\n{}", reason, prompt_for(state))
}

/// Reply for a session found in a state it can no longer continue from
pub fn recovered_reset() -> String {
    format!(
        "Something went wrong with this conversation, let's start over.\n{}",
        prompt_for(ConversationState::AwaitType)
    )
}

pub fn screen_failure(err: &ScreenError) -> String {
    let body = match err {
        ScreenError::NoExpirationsInRange { .. } => {
            "⚠️ No expirations found in that range.".to_string()
        }
        ScreenError::NoCandidatesFound { expiration } => {
            format!("⚠️ No contracts matched your filters for the {} expiration.", expiration)
        }
        ScreenError::FeedUnavailable(_) => {
            "❌ Market data is unavailable right now, please try again later.".to_string()
        }
    };

    format!("{}\n\n{}", body, RESTART_HINT)
}

pub fn format_delta(delta: Option<f64>) -> String {
    match delta {
        Some(d) => format!("{:.2}", d),
        None => "N/A".to_string(),
    }
}

/// Full detail for one contract
pub fn contract_detail(criteria: &QueryCriteria, report: &ScreenReport, contract: &ScreenedContract) -> String {
    format!(
        "📊 Result:\n\
         ➡️ Type: {} | {}\n\
         🎯 Strike: ${} | Premium: ${:.2}\n\
         📆 Expires: {}\n\
         💰 Total: ${:.2} for {} contract(s)\n\
         📈 ROI: {:.2}% (spot ${:.2})\n\
         ⚖️ Delta: {}\n\n{}",
        criteria.option_type,
        criteria.side,
        contract.strike,
        contract.premium,
        contract.expiration,
        contract.total_cost,
        criteria.contracts,
        contract.roi_estimate,
        report.spot,
        format_delta(contract.delta),
        RESTART_HINT
    )
}

/// Numbered summary when several contracts qualify
pub fn candidate_list(criteria: &QueryCriteria, report: &ScreenReport) -> String {
    let header = if report.used_fallback {
        format!(
            "No premium close to ${:.2}; nearest {} contract(s) for {}:",
            criteria.target_premium,
            report.contracts.len(),
            report.expiration
        )
    } else {
        format!(
            "{} contract(s) near ${:.2} for {}:",
            report.contracts.len(),
            criteria.target_premium,
            report.expiration
        )
    };

    let lines: Vec<String> = report
        .contracts
        .iter()
        .enumerate()
        .map(|(i, c)| {
            format!(
                "{}. {} ${} | ${:.2} | total ${:.2} | Δ {}",
                i + 1,
                criteria.option_type,
                c.strike,
                c.premium,
                c.total_cost,
                format_delta(c.delta)
            )
        })
        .collect();

    format!(
        "{}\n{}\n\n{}",
        header,
        lines.join("\n"),
        prompt_for(ConversationState::AwaitSelection)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_failure_messages_are_distinct() {
        let d = NaiveDate::from_ymd_opt(2026, 3, 13).unwrap();
        let none_in_range = screen_failure(&ScreenError::NoExpirationsInRange { cutoff: d });
        let no_candidates = screen_failure(&ScreenError::NoCandidatesFound { expiration: d });
        let unavailable = screen_failure(&ScreenError::FeedUnavailable("timeout".into()));

        assert_ne!(none_in_range, no_candidates);
        assert_ne!(no_candidates, unavailable);
        assert!(!unavailable.contains("timeout"));
        assert!(none_in_range.ends_with(RESTART_HINT));
    }

    #[test]
    fn test_unavailable_delta_renders_as_na() {
        assert_eq!(format_delta(None), "N/A");
        assert_eq!(format_delta(Some(0.4567)), "0.46");
    }
}
