use crate::api_server_axum;
use crate::chat::{self, messages, Conversation, CriteriaBuilder, SessionStore};
use crate::screener::{MarketDataFeed, QueryCriteria, Screener, ScreenerSettings, YahooFeed};

use anyhow::{anyhow, Result};
use colored::Colorize;
use std::sync::Arc;

/// Command handler - one entry point per execution mode
pub struct ScoutCommands;

impl ScoutCommands {
    /// Serve the conversational webhook
    pub async fn run_server(port: u16, symbol: &str, settings: ScreenerSettings) -> Result<()> {
        println!("{}", "=".repeat(60).blue());
        println!("{}", "Option Scout Server".green().bold());
        println!("{}", "=".repeat(60).blue());
        println!();

        let yahoo = YahooFeed::new(symbol)?;
        tracing::info!(symbol = %yahoo.symbol(), "market data feed ready");

        let feed: Arc<dyn MarketDataFeed> = Arc::new(yahoo);
        let conversation = Conversation::new(SessionStore::new(), Screener::new(settings), feed);

        api_server_axum::start_server(port, conversation).await
    }

    /// Run one screen from `SCOUT_*` query variables and print the result
    pub async fn run_single(symbol: &str, settings: ScreenerSettings) -> Result<()> {
        println!("{}", "=".repeat(60).blue());
        println!("{}", "Option Scout Single Screen".green().bold());
        println!("{}", "=".repeat(60).blue());
        println!();

        let criteria = Self::criteria_from_env()?;
        println!(
            "{} {} {} | OTM only: {} | target ${:.2} | {} | {} contract(s)",
            "→".cyan(),
            criteria.side.as_str().yellow(),
            criteria.option_type.as_str().yellow(),
            criteria.otm_only,
            criteria.target_premium,
            criteria.horizon,
            criteria.contracts
        );
        println!();

        let feed = YahooFeed::new(symbol)?;
        let screener = Screener::new(settings);
        let timeout = screener.settings().feed_timeout;

        let result = match tokio::time::timeout(timeout, screener.screen(&criteria, &feed)).await {
            Ok(result) => result,
            Err(_) => {
                println!("{} Timeout reached after {} seconds", "⚠".red(), timeout.as_secs());
                return Ok(());
            }
        };

        match result {
            Ok(report) => {
                println!("{} Expiration: {}", "✓".green(), report.expiration);
                println!("{} Spot: {:.2}", "✓".green(), report.spot);
                if report.used_fallback {
                    println!("{} Nothing inside the premium band, showing nearest rows", "ℹ".blue());
                }
                println!();
                for contract in &report.contracts {
                    println!("{}", messages::contract_detail(&criteria, &report, contract));
                    println!();
                }
            }
            Err(err) => {
                println!("{} {}", "✗".red(), err);
            }
        }

        println!("{}", "=".repeat(60).blue());
        Ok(())
    }

    /// Build a query with the same parsers the conversation uses
    fn criteria_from_env() -> Result<QueryCriteria> {
        let var = |key: &str, default: &str| {
            chat::normalize(&std::env::var(key).unwrap_or_else(|_| default.to_string()))
        };

        let mut builder = CriteriaBuilder::new();
        builder.option_type = Some(chat::parse_option_type(&var("SCOUT_TYPE", "call"))?);
        builder.side = Some(chat::parse_side(&var("SCOUT_SIDE", "buy"))?);
        builder.otm_only = Some(chat::parse_otm(&var("SCOUT_OTM", "yes"))?);
        builder.target_premium = Some(chat::parse_premium(&var("SCOUT_PREMIUM", "0.6"))?);
        builder.horizon = Some(chat::parse_horizon(&var("SCOUT_HORIZON", "1 month"))?);
        builder.contracts = Some(chat::parse_contracts(&var("SCOUT_CONTRACTS", "1"))?);

        builder.build().ok_or_else(|| anyhow!("Incomplete query"))
    }
}
