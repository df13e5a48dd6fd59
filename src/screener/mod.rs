pub mod config;
pub mod delta;
pub mod feed;
pub mod models;
pub mod processor;
pub mod yahoo_client;

// Re-exports (public API)
pub use config::ScreenerSettings;
pub use delta::delta;
pub use feed::{MarketDataFeed, SnapshotFeed};
pub use models::{ChainRow, Horizon, OptionType, QueryCriteria, ScreenReport, ScreenedContract, Side};
pub use processor::{
    filter_otm,
    price_rows,
    round2,
    select_candidates,
    select_expiration,
    total_cost,
    PricedRow,
    Screener,
};
pub use yahoo_client::YahooFeed;
