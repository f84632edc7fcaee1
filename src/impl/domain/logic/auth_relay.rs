use std::{sync::Arc, time::Duration};

use fractic_server_error::ServerError;
use futures::StreamExt as _;
use tracing::{debug, info, warn};

use crate::{
    domain::{
        logic::channel_address::{international_digits, phone_address},
        repositories::{chat_repository::ChatRepository, ledger_repository::LedgerRepository},
    },
    entities::{Account, AccountChange},
    presentation::reply_fmt::ReplyFormatter,
};

const SUBSCRIBE_RETRY_DELAY: Duration = Duration::from_secs(1);

/// Delivers one-time auth codes over the messaging channel as soon as the
/// signup flow writes them to an account.
pub(crate) struct AuthRelay<L, C>
where
    L: LedgerRepository,
    C: ChatRepository,
{
    ledger: Arc<L>,
    chat: Arc<C>,
    formatter: Arc<ReplyFormatter>,
    retry_delay: Duration,
}

impl<L, C> AuthRelay<L, C>
where
    L: LedgerRepository,
    C: ChatRepository,
{
    pub(crate) fn new(ledger: Arc<L>, chat: Arc<C>, formatter: Arc<ReplyFormatter>) -> Self {
        Self {
            ledger,
            chat,
            formatter,
            retry_delay: SUBSCRIBE_RETRY_DELAY,
        }
    }

    #[cfg(test)]
    pub(crate) fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    /// Consumes account changes for the lifetime of the process. A failed
    /// subscription or an ended stream is retried after a delay.
    pub(crate) async fn run(&self) {
        loop {
            match self.ledger.subscribe_account_changes().await {
                Ok(mut changes) => {
                    info!("auth relay listening for account changes");
                    while let Some(change) = changes.next().await {
                        self.handle_change(change).await;
                    }
                    warn!("account change stream ended, resubscribing");
                }
                Err(e) => {
                    warn!(error = ?e, "account change subscription failed, retrying");
                }
            }
            tokio::time::sleep(self.retry_delay).await;
        }
    }

    pub(crate) async fn handle_change(&self, change: AccountChange) {
        let Some((account, code)) = introduced_code(&change) else {
            return;
        };
        if let Err(e) = self.deliver(account, code).await {
            debug!(account_id = %account.id, error = ?e, "auth code delivery failed");
        }
    }

    async fn deliver(&self, account: &Account, code: &str) -> Result<(), ServerError> {
        let address = self.delivery_address(account).await?;
        self.chat
            .send_text(&address, &self.formatter.auth_code(code))
            .await?;
        info!(account_id = %account.id, "auth code delivered");
        Ok(())
    }

    async fn delivery_address(&self, account: &Account) -> Result<String, ServerError> {
        if let Some(address) = &account.channel_address {
            return Ok(address.clone());
        }
        // Suffix convention when the transport can't resolve the number.
        Ok(
            match self
                .chat
                .check_number_status(&international_digits(&account.phone))
                .await
            {
                Ok(status) if status.number_exists => status.id,
                Ok(_) => phone_address(&account.phone),
                Err(e) => {
                    debug!(account_id = %account.id, error = ?e, "number status check failed");
                    phone_address(&account.phone)
                }
            },
        )
    }
}

/// The account and its code, if the change introduces a code on a row that
/// also has a phone.
fn introduced_code(change: &AccountChange) -> Option<(&Account, &str)> {
    let current = change.current.as_ref()?;
    let code = current.auth_code.as_deref().filter(|c| !c.is_empty())?;
    if current.phone.trim().is_empty() {
        return None;
    }
    let previous_code = change
        .previous
        .as_ref()
        .and_then(|p| p.auth_code.as_deref());
    (previous_code != Some(code)).then_some((current, code))
}
