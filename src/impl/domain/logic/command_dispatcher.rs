use std::sync::OnceLock;

use regex::Regex;
use tracing::{info, warn};

use crate::{
    domain::repositories::ledger_repository::LedgerRepository, entities::Account,
    presentation::reply_fmt::ReplyFormatter,
};

#[derive(Debug, PartialEq)]
pub(crate) enum Command {
    Rename(String),
    Help,
    Unknown(String),
}

fn command_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?s)^\s*!(\w+)\s*(.*?)\s*$").expect("hardcoded regex should be valid")
    })
}

/// `None` if the message is not a command (does not start with '!').
pub(crate) fn parse_command(body: &str) -> Option<Command> {
    let caps = command_pattern().captures(body)?;
    let name = caps.get(1).map(|m| m.as_str().to_lowercase())?;
    let argument = caps.get(2).map(|m| m.as_str()).unwrap_or_default();
    Some(match name.as_str() {
        "name" | "nome" => Command::Rename(argument.to_string()),
        "help" | "ajuda" => Command::Help,
        _ => Command::Unknown(name),
    })
}

pub(crate) struct CommandDispatcher<'a, L: LedgerRepository> {
    ledger: &'a L,
    formatter: &'a ReplyFormatter,
}

impl<'a, L: LedgerRepository> CommandDispatcher<'a, L> {
    pub(crate) fn new(ledger: &'a L, formatter: &'a ReplyFormatter) -> Self {
        Self { ledger, formatter }
    }

    /// Runs the command and returns the reply text.
    pub(crate) async fn dispatch(&self, account: &Account, command: Command) -> String {
        match command {
            Command::Rename(name) if name.is_empty() => self.formatter.name_usage(),
            Command::Rename(name) => match self.ledger.rename_account(account.id, &name).await {
                Ok(()) => {
                    info!(account_id = %account.id, "account renamed");
                    self.formatter.name_changed(&name)
                }
                Err(e) => {
                    warn!(account_id = %account.id, error = ?e, "rename failed");
                    self.formatter.command_failed()
                }
            },
            Command::Help | Command::Unknown(_) => self.formatter.help(),
        }
    }
}
