use super::models::{ChainRow, OptionType};
use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;

/// Source of option chain snapshots for a single underlying.
///
/// Implementations must return empty collections rather than errors when
/// there simply is nothing listed; `Err` is reserved for transport failures.
#[async_trait]
pub trait MarketDataFeed: Send + Sync {
    /// Listed expiration dates, ascending
    async fn list_expirations(&self) -> Result<Vec<NaiveDate>>;

    /// Calls or puts for one expiration
    async fn get_chain(&self, expiration: NaiveDate, option_type: OptionType) -> Result<Vec<ChainRow>>;

    async fn get_spot_price(&self) -> Result<f64>;
}

/// Fixed, in-memory chain snapshot
#[derive(Debug, Clone, Default)]
pub struct SnapshotFeed {
    spot: f64,
    chains: HashMap<(NaiveDate, OptionType), Vec<ChainRow>>,
}

impl SnapshotFeed {
    pub fn new(spot: f64) -> Self {
        Self {
            spot,
            chains: HashMap::new(),
        }
    }

    /// Register rows for an expiration; the expiration is listed even if `rows` is empty
    pub fn with_chain(mut self, expiration: NaiveDate, option_type: OptionType, rows: Vec<ChainRow>) -> Self {
        self.chains
            .entry((expiration, option_type))
            .or_default()
            .extend(rows);
        self
    }
}

#[async_trait]
impl MarketDataFeed for SnapshotFeed {
    async fn list_expirations(&self) -> Result<Vec<NaiveDate>> {
        let mut dates: Vec<NaiveDate> = self.chains.keys().map(|(d, _)| *d).collect();
        dates.sort();
        dates.dedup();
        Ok(dates)
    }

    async fn get_chain(&self, expiration: NaiveDate, option_type: OptionType) -> Result<Vec<ChainRow>> {
        Ok(self
            .chains
            .get(&(expiration, option_type))
            .cloned()
            .unwrap_or_default())
    }

    async fn get_spot_price(&self) -> Result<f64> {
        Ok(self.spot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, d).unwrap()
    }

    #[tokio::test]
    async fn test_snapshot_lists_sorted_unique_expirations() {
        let feed = SnapshotFeed::new(50.0)
            .with_chain(date(20), OptionType::Call, vec![])
            .with_chain(date(6), OptionType::Put, vec![])
            .with_chain(date(6), OptionType::Call, vec![ChainRow::new(52.0, 0.5, 0.6, date(6))]);

        assert_eq!(feed.list_expirations().await.unwrap(), vec![date(6), date(20)]);
        assert_eq!(feed.get_chain(date(6), OptionType::Call).await.unwrap().len(), 1);
        assert!(feed.get_chain(date(13), OptionType::Call).await.unwrap().is_empty());
        assert_eq!(feed.get_spot_price().await.unwrap(), 50.0);
    }
}
