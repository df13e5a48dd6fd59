mod app_config;

use anyhow::Result;
use app_config::AppConfig;
use colored::Colorize;
use option_scout::commands::ScoutCommands;
use option_scout::logging;

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = logging::init_logging() {
        eprintln!("Logging disabled: {}", e);
    }

    let config = AppConfig::from_env();
    config.validate()?;
    config.print_summary();

    match config.mode.as_str() {
        "server" => ScoutCommands::run_server(config.port, &config.symbol, config.settings).await?,
        "single" => ScoutCommands::run_single(&config.symbol, config.settings).await?,
        _ => {
            eprintln!("{} Invalid mode '{}'. Use 'server' or 'single'", "✗".red(), config.mode);
            eprintln!("Set SCOUT_MODE environment variable to control execution mode");
            eprintln!("Examples:");
            eprintln!("  SCOUT_MODE=server SCOUT_PORT=5000 cargo run");
            eprintln!("  SCOUT_MODE=single SCOUT_TYPE=put SCOUT_PREMIUM=1.2 SCOUT_HORIZON='2 weeks' cargo run");
            std::process::exit(1);
        }
    }

    Ok(())
}
