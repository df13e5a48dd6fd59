use super::messages;
use super::session::{SessionGuard, SessionStore};
use super::state::{self, ConversationState};
use crate::error::{ScreenError, ValidationRejection};
use crate::screener::feed::MarketDataFeed;
use crate::screener::models::{QueryCriteria, ScreenReport};
use crate::screener::processor::Screener;
use chrono::{Local, NaiveDate};
use std::sync::Arc;
use std::time::Duration;

/// Outcome of applying one answer to the current state
enum Step {
    /// Answer stored, move on and ask the next question
    Advance(ConversationState),
    Reject(ValidationRejection),
}

/// Drives every user's intake flow and runs the screen when it is complete
#[derive(Clone)]
pub struct Conversation {
    store: SessionStore,
    screener: Arc<Screener>,
    feed: Arc<dyn MarketDataFeed>,
    today: Option<NaiveDate>,
}

impl Conversation {
    pub fn new(store: SessionStore, screener: Screener, feed: Arc<dyn MarketDataFeed>) -> Self {
        Self {
            store,
            screener: Arc::new(screener),
            feed,
            today: None,
        }
    }

    /// Screen against a fixed calendar date instead of the local clock
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// Apply one inbound message and return the reply.
    ///
    /// Never fails: every outcome, including feed errors, is a user-facing message.
    pub async fn handle_turn(&self, user_id: &str, text: &str) -> String {
        let mut session = self.store.acquire(user_id).await;
        let input = state::normalize(text);

        if state::is_restart(&input) {
            tracing::info!(user = %user_id, "session restarted");
            session.restart();
            return messages::first_prompt();
        }

        let current = session.state;
        tracing::debug!(user = %user_id, state = ?current, "turn received");

        match current {
            ConversationState::Init => {
                session.restart();
                messages::first_prompt()
            }
            ConversationState::AwaitSelection => self.select(session, &input).await,
            ConversationState::Done => {
                tracing::warn!(user = %user_id, "turn for a finished session, starting over");
                session.restart();
                messages::recovered_reset()
            }
            _ => match apply_answer(&mut session, current, &input) {
                Step::Reject(reason) => {
                    tracing::debug!(user = %user_id, state = ?current, %reason, "answer rejected");
                    messages::rejection(&reason, current)
                }
                Step::Advance(ConversationState::Done) => self.complete(session).await,
                Step::Advance(next) => {
                    session.state = next;
                    messages::prompt_for(next).to_string()
                }
            },
        }
    }

    async fn complete(&self, mut session: SessionGuard) -> String {
        let Some(criteria) = session.criteria.build() else {
            // Contracts was the last answer, so every field should be present
            tracing::error!(user = %session.user_id, "incomplete criteria at the end of intake");
            session.restart();
            return messages::recovered_reset();
        };

        session.state = ConversationState::Done;

        match self.run_screen(&criteria).await {
            Ok(report) if report.contracts.len() > 1 => {
                tracing::info!(
                    user = %session.user_id,
                    candidates = report.contracts.len(),
                    expiration = %report.expiration,
                    "awaiting selection"
                );
                let reply = messages::candidate_list(&criteria, &report);
                session.state = ConversationState::AwaitSelection;
                session.candidates = Some(report);
                reply
            }
            Ok(report) => {
                let reply = match report.contracts.first() {
                    Some(contract) => messages::contract_detail(&criteria, &report, contract),
                    None => messages::screen_failure(&ScreenError::NoCandidatesFound {
                        expiration: report.expiration,
                    }),
                };
                session.remove().await;
                reply
            }
            Err(err) => {
                tracing::warn!(user = %session.user_id, error = %err, "screen ended without candidates");
                session.remove().await;
                messages::screen_failure(&err)
            }
        }
    }

    async fn select(&self, mut session: SessionGuard, input: &str) -> String {
        let (Some(criteria), Some(report)) = (session.criteria.build(), session.candidates.clone()) else {
            tracing::error!(user = %session.user_id, "selection state without candidates");
            session.restart();
            return messages::recovered_reset();
        };

        match state::parse_selection(input, report.contracts.len()) {
            Ok(index) => {
                let reply = messages::contract_detail(&criteria, &report, &report.contracts[index]);
                session.remove().await;
                reply
            }
            Err(reason) => messages::rejection(&reason, ConversationState::AwaitSelection),
        }
    }

    /// Screen with an upper bound on total feed latency
    async fn run_screen(&self, criteria: &QueryCriteria) -> Result<ScreenReport, ScreenError> {
        let today = self.today.unwrap_or_else(|| Local::now().date_naive());
        let timeout: Duration = self.screener.settings().feed_timeout;

        match tokio::time::timeout(timeout, self.screener.screen_at(criteria, self.feed.as_ref(), today)).await {
            Ok(result) => result,
            Err(_) => Err(ScreenError::FeedUnavailable(format!(
                "screening timed out after {}s",
                timeout.as_secs()
            ))),
        }
    }
}

/// Parse `input` for `state` and store it; nothing is written on rejection
fn apply_answer(session: &mut SessionGuard, current: ConversationState, input: &str) -> Step {
    let criteria = &mut session.criteria;

    let result = match current {
        ConversationState::AwaitType => state::parse_option_type(input).map(|v| {
            criteria.option_type = Some(v);
            ConversationState::AwaitSide
        }),
        ConversationState::AwaitSide => state::parse_side(input).map(|v| {
            criteria.side = Some(v);
            ConversationState::AwaitOtm
        }),
        ConversationState::AwaitOtm => state::parse_otm(input).map(|v| {
            criteria.otm_only = Some(v);
            ConversationState::AwaitPremium
        }),
        ConversationState::AwaitPremium => state::parse_premium(input).map(|v| {
            criteria.target_premium = Some(v);
            ConversationState::AwaitHorizon
        }),
        ConversationState::AwaitHorizon => state::parse_horizon(input).map(|v| {
            criteria.horizon = Some(v);
            ConversationState::AwaitContracts
        }),
        ConversationState::AwaitContracts => state::parse_contracts(input).map(|v| {
            criteria.contracts = Some(v);
            ConversationState::Done
        }),
        ConversationState::Init | ConversationState::AwaitSelection | ConversationState::Done => {
            Ok(ConversationState::AwaitType)
        }
    };

    match result {
        Ok(next) => Step::Advance(next),
        Err(reason) => Step::Reject(reason),
    }
}
