use std::process::ExitCode;

use fractic_chat_ledger::{config::BotConfig, util::LedgerBot};
use tracing::error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = match BotConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!(error = ?e, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };
    match LedgerBot::new(config).run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = ?e, "ledger bot failed");
            ExitCode::FAILURE
        }
    }
}
