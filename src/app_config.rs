use anyhow::{bail, Result};
use colored::Colorize;
use option_scout::screener::config;
use option_scout::ScreenerSettings;

/// Application configuration handler
pub struct AppConfig {
    pub mode: String,
    pub port: u16,
    pub symbol: String,
    pub settings: ScreenerSettings,
}

impl AppConfig {
    /// Create new configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            mode: Self::get_mode(),
            port: Self::get_port(),
            symbol: config::get_symbol(),
            settings: ScreenerSettings::from_env(),
        }
    }

    pub fn print_summary(&self) {
        println!("{} Mode: {}", "→".cyan(), self.mode.yellow());
        println!("{} Symbol: {}", "→".cyan(), self.symbol.yellow());
        println!(
            "{} Volatility {:.2} | Risk-free {:.3} | Fallback rows {}",
            "ℹ".blue(),
            self.settings.volatility,
            self.settings.risk_free_rate,
            self.settings.fallback_count
        );
        println!();
    }

    fn get_mode() -> String {
        std::env::var("SCOUT_MODE").unwrap_or_else(|_| "server".to_string())
    }

    /// PORT is honoured for hosted deployments
    fn get_port() -> u16 {
        std::env::var("SCOUT_PORT")
            .or_else(|_| std::env::var("PORT"))
            .unwrap_or_else(|_| "5000".to_string())
            .parse::<u16>()
            .unwrap_or(5000)
    }

    pub fn validate(&self) -> Result<()> {
        if self.symbol.trim().is_empty() {
            bail!("SCOUT_SYMBOL must not be empty");
        }
        if !(self.settings.volatility > 0.0) {
            bail!("SCOUT_VOLATILITY must be positive");
        }
        Ok(())
    }
}
