use option_scout::chat::messages;
use option_scout::chat::{ConversationState, Conversation, SessionStore};
use option_scout::screener::{ChainRow, MarketDataFeed, OptionType, Screener, ScreenerSettings, SnapshotFeed};

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use std::sync::Arc;
use std::time::Duration;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 8).unwrap()
}

fn expiry() -> NaiveDate {
    today().checked_add_days(Days::new(5)).unwrap()
}

/// Spot 50 with two OTM calls: only strike 52 is near a 0.60 premium
fn single_match_feed() -> SnapshotFeed {
    let exp = expiry();
    SnapshotFeed::new(50.0).with_chain(
        exp,
        OptionType::Call,
        vec![
            ChainRow::new(52.0, 0.55, 0.65, exp),
            ChainRow::new(54.0, 0.30, 0.40, exp),
        ],
    )
}

/// Three puts inside the band for a 1.00 premium
fn multi_match_feed() -> SnapshotFeed {
    let exp = expiry();
    SnapshotFeed::new(50.0).with_chain(
        exp,
        OptionType::Put,
        vec![
            ChainRow::new(47.0, 0.95, 1.05, exp),
            ChainRow::new(48.0, 0.96, 1.06, exp),
            ChainRow::new(49.0, 0.90, 1.00, exp),
        ],
    )
}

fn conversation(feed: impl MarketDataFeed + 'static) -> Conversation {
    Conversation::new(SessionStore::new(), Screener::default(), Arc::new(feed)).with_today(today())
}

async fn state_of(convo: &Conversation, user: &str) -> Option<ConversationState> {
    if !convo.store().contains(user).await {
        return None;
    }
    let session = convo.store().acquire(user).await;
    Some(session.state)
}

async fn answer_all(convo: &Conversation, user: &str, answers: &[&str]) -> String {
    let mut reply = String::new();
    for answer in answers {
        reply = convo.handle_turn(user, answer).await;
    }
    reply
}

struct FailingFeed;

#[async_trait]
impl MarketDataFeed for FailingFeed {
    async fn list_expirations(&self) -> Result<Vec<NaiveDate>> {
        Err(anyhow!("upstream returned 503 for secret-host.internal"))
    }

    async fn get_chain(&self, _: NaiveDate, _: OptionType) -> Result<Vec<ChainRow>> {
        Err(anyhow!("upstream returned 503"))
    }

    async fn get_spot_price(&self) -> Result<f64> {
        Err(anyhow!("upstream returned 503"))
    }
}

/// Never answers, to exercise the screening deadline
struct StalledFeed;

#[async_trait]
impl MarketDataFeed for StalledFeed {
    async fn list_expirations(&self) -> Result<Vec<NaiveDate>> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(vec![])
    }

    async fn get_chain(&self, _: NaiveDate, _: OptionType) -> Result<Vec<ChainRow>> {
        Ok(vec![])
    }

    async fn get_spot_price(&self) -> Result<f64> {
        Ok(50.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_full_intake_single_result() {
        let convo = conversation(single_match_feed());
        let user = "whatsapp:+15550001";

        let first = convo.handle_turn(user, "hola").await;
        assert!(first.contains("call or put"));

        assert!(convo.handle_turn(user, "call").await.contains("BUY or SELL"));
        assert!(convo.handle_turn(user, "buy").await.contains("out-of-the-money"));
        assert!(convo.handle_turn(user, "yes").await.contains("target premium"));
        assert!(convo.handle_turn(user, "0,6").await.contains("horizon"));
        assert!(convo.handle_turn(user, "1 week").await.contains("How many contracts"));

        let result = convo.handle_turn(user, "10").await;
        assert!(result.contains("Strike: $52"));
        assert!(result.contains("Premium: $0.60"));
        assert!(result.contains("Total: $600.00"));
        assert!(result.contains(&expiry().to_string()));
        assert!(result.ends_with(messages::RESTART_HINT));

        // Finished sessions are dropped
        assert_eq!(state_of(&convo, user).await, None);
    }

    #[tokio::test]
    async fn test_unknown_user_gets_greeting_for_any_text() {
        let convo = conversation(single_match_feed());

        let reply = convo.handle_turn("u1", "what is this").await;
        assert_eq!(reply, messages::first_prompt());
        assert_eq!(state_of(&convo, "u1").await, Some(ConversationState::AwaitType));
    }

    #[tokio::test]
    async fn test_invalid_answers_leave_state_unchanged() {
        let convo = conversation(single_match_feed());
        let user = "u2";
        convo.handle_turn(user, "start").await;

        let steps: [(&str, &str, ConversationState); 6] = [
            ("straddle", "call", ConversationState::AwaitType),
            ("hold", "sell", ConversationState::AwaitSide),
            ("maybe", "no", ConversationState::AwaitOtm),
            ("-1", "$1.25", ConversationState::AwaitPremium),
            ("3 weeks", "2 meses", ConversationState::AwaitHorizon),
            ("2.5", "3", ConversationState::AwaitContracts),
        ];

        for (bad, good, expected) in &steps[..5] {
            let reply = convo.handle_turn(user, bad).await;
            assert!(reply.starts_with("⚠️"), "no rejection for {:?}", bad);
            assert_eq!(state_of(&convo, user).await, Some(*expected));
            convo.handle_turn(user, good).await;
        }

        let (bad, _, expected) = steps[5];
        convo.handle_turn(user, bad).await;
        assert_eq!(state_of(&convo, user).await, Some(expected));
    }

    #[tokio::test]
    async fn test_zero_and_text_contracts_rejected() {
        let convo = conversation(single_match_feed());
        let user = "u3";
        answer_all(&convo, user, &["start", "call", "buy", "yes", "0.6", "1 week"]).await;

        for bad in ["0", "ten", "-4", ""] {
            let reply = convo.handle_turn(user, bad).await;
            assert!(reply.contains("whole number"));
            assert_eq!(state_of(&convo, user).await, Some(ConversationState::AwaitContracts));
        }
    }

    #[tokio::test]
    async fn test_restart_from_middle_clears_answers() {
        let convo = conversation(single_match_feed());
        let user = "u4";
        answer_all(&convo, user, &["start", "put", "sell", "no"]).await;
        assert_eq!(state_of(&convo, user).await, Some(ConversationState::AwaitPremium));

        let reply = convo.handle_turn(user, "  INICIO ").await;
        assert_eq!(reply, messages::first_prompt());

        let session = convo.store().acquire(user).await;
        assert_eq!(session.state, ConversationState::AwaitType);
        assert!(session.criteria.option_type.is_none());
        assert!(session.criteria.side.is_none());
        assert!(session.criteria.otm_only.is_none());
    }

    #[tokio::test]
    async fn test_multiple_candidates_then_selection() {
        let convo = conversation(multi_match_feed());
        let user = "u5";

        let list = answer_all(&convo, user, &["start", "put", "buy", "yes", "1", "1 semana", "2"]).await;
        assert!(list.contains("1. PUT $"));
        assert!(list.contains("3. PUT $"));
        assert_eq!(state_of(&convo, user).await, Some(ConversationState::AwaitSelection));

        let out_of_range = convo.handle_turn(user, "4").await;
        assert!(out_of_range.contains("between 1 and 3"));
        assert_eq!(state_of(&convo, user).await, Some(ConversationState::AwaitSelection));

        let detail = convo.handle_turn(user, "1").await;
        assert!(detail.contains("📊 Result"));
        assert!(detail.contains("for 2 contract(s)"));
        assert_eq!(state_of(&convo, user).await, None);
    }

    #[tokio::test]
    async fn test_no_expirations_reports_and_ends_session() {
        let exp = today().checked_add_days(Days::new(40)).unwrap();
        let feed = SnapshotFeed::new(50.0).with_chain(
            exp,
            OptionType::Call,
            vec![ChainRow::new(52.0, 0.55, 0.65, exp)],
        );
        let convo = conversation(feed);

        let reply = answer_all(&convo, "u6", &["start", "call", "buy", "yes", "0.6", "1 week", "1"]).await;
        assert!(reply.contains("No expirations found"));
        assert_eq!(state_of(&convo, "u6").await, None);
    }

    #[tokio::test]
    async fn test_feed_failure_hides_details() {
        let convo = conversation(FailingFeed);

        let reply = answer_all(&convo, "u7", &["start", "call", "buy", "yes", "0.6", "1 week", "1"]).await;
        assert!(reply.contains("Market data is unavailable"));
        assert!(!reply.contains("secret-host"));
        assert_eq!(state_of(&convo, "u7").await, None);
    }

    #[tokio::test]
    async fn test_stalled_feed_times_out() {
        let settings = ScreenerSettings {
            feed_timeout: Duration::from_millis(200),
            ..ScreenerSettings::default()
        };
        let convo = Conversation::new(SessionStore::new(), Screener::new(settings), Arc::new(StalledFeed))
            .with_today(today());

        let reply = answer_all(&convo, "u8", &["start", "call", "buy", "yes", "0.6", "1 week", "1"]).await;
        assert!(reply.contains("Market data is unavailable"));
    }

    #[tokio::test]
    async fn test_users_are_independent() {
        let convo = conversation(single_match_feed());

        answer_all(&convo, "alice", &["start", "call", "buy"]).await;
        answer_all(&convo, "bob", &["start", "put"]).await;

        assert_eq!(state_of(&convo, "alice").await, Some(ConversationState::AwaitOtm));
        assert_eq!(state_of(&convo, "bob").await, Some(ConversationState::AwaitSide));
    }

    #[tokio::test]
    async fn test_concurrent_turns_for_one_user_are_serialized() {
        let convo = conversation(single_match_feed());
        convo.handle_turn("u9", "start").await;

        let a = tokio::spawn({
            let convo = convo.clone();
            async move { convo.handle_turn("u9", "call").await }
        });
        let b = tokio::spawn({
            let convo = convo.clone();
            async move { convo.handle_turn("u9", "call").await }
        });
        let (a, b) = (a.await.unwrap(), b.await.unwrap());

        // One turn answers the type question, the other is then a bad side answer
        let replies = [a, b];
        assert_eq!(replies.iter().filter(|r| r.contains("BUY or SELL")).count(), 2);
        assert_eq!(replies.iter().filter(|r| r.starts_with("⚠️")).count(), 1);
        assert_eq!(state_of(&convo, "u9").await, Some(ConversationState::AwaitSide));
    }
}
