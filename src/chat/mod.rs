pub mod config;
pub mod criteria;
pub mod engine;
pub mod messages;
pub mod session;
pub mod state;

// Re-exports (public API)
pub use criteria::CriteriaBuilder;
pub use engine::Conversation;
pub use session::{Session, SessionGuard, SessionStore};
pub use state::{
    normalize,
    parse_contracts,
    parse_horizon,
    parse_otm,
    parse_premium,
    parse_side,
    parse_option_type,
    ConversationState,
};
