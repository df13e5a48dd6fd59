pub mod api_server_axum;
pub mod chat;
pub mod commands;
pub mod error;
pub mod logging;
pub mod screener;
pub mod utility;

// Re-exports for convenience
pub use chat::{Conversation, SessionStore};
pub use error::{ScreenError, ValidationRejection};
pub use screener::{MarketDataFeed, Screener, ScreenerSettings, SnapshotFeed, YahooFeed};
