use fractic_server_error::ServerError;
use tracing::{debug, info, warn};

use crate::{
    domain::{
        logic::{
            channel_address::{is_anonymized, phone_candidate},
            phone_normalizer::{digits_only, normalize_phone},
            utils::KeyedLocks,
        },
        repositories::{chat_repository::ChatRepository, ledger_repository::LedgerRepository},
    },
    entities::{Account, InboundMessage, Resolution},
};

/// Digit counts of a phone-shaped identifier (area code and local number,
/// optionally with the country code).
const PHONE_DIGITS: std::ops::RangeInclusive<usize> = 10..=13;

/// Maps an inbound channel address to a known account, binding the address
/// to the account the first time a phone-based match succeeds.
pub(crate) struct IdentityResolver<'a, L, C>
where
    L: LedgerRepository,
    C: ChatRepository,
{
    ledger: &'a L,
    chat: &'a C,
    locks: &'a KeyedLocks,
}

impl<'a, L, C> IdentityResolver<'a, L, C>
where
    L: LedgerRepository,
    C: ChatRepository,
{
    pub(crate) fn new(ledger: &'a L, chat: &'a C, locks: &'a KeyedLocks) -> Self {
        Self {
            ledger,
            chat,
            locks,
        }
    }

    pub(crate) async fn resolve(&self, message: &InboundMessage) -> Result<Resolution, ServerError> {
        // Two resolutions for the same address must not both scan and bind.
        let _guard = self.locks.lock(&message.address).await;

        if let Some(account) = self
            .ledger
            .fetch_account_by_channel_address(&message.address)
            .await?
        {
            debug!(account_id = %account.id, "resolved by bound channel address");
            return Ok(Resolution::ResolvedByAddress(account));
        }

        let candidates = self.phone_candidates(message).await;
        if candidates.is_empty() {
            debug!(address = %message.address, "no phone candidate for unbound address");
            return Ok(Resolution::Unresolvable);
        }

        let accounts = self.ledger.fetch_accounts().await?;
        let Some(account) = first_phone_match(&accounts, &candidates) else {
            info!(address = %message.address, "no unbound account matches inbound phone candidates");
            return Ok(Resolution::Unresolvable);
        };

        // The store only binds accounts that are still unbound.
        if !self
            .ledger
            .bind_channel_address(account.id, &message.address)
            .await?
        {
            warn!(account_id = %account.id, address = %message.address, "account was bound concurrently");
            return Ok(Resolution::Unresolvable);
        }
        info!(account_id = %account.id, address = %message.address, "auto-linked channel address");
        Ok(Resolution::ResolvedByAutoLink(Account {
            channel_address: Some(message.address.clone()),
            ..account.clone()
        }))
    }

    /// Phone candidates in precedence order: author, address (or its contact
    /// metadata when anonymized), then digits typed in the message body.
    async fn phone_candidates(&self, message: &InboundMessage) -> Vec<String> {
        let mut candidates = Vec::new();

        if let Some(author) = message.author.as_deref().and_then(phone_candidate) {
            candidates.push(author);
        } else if is_anonymized(&message.address) {
            if let Some(phone) = self.contact_phone(&message.address).await {
                candidates.push(phone);
            }
        } else if let Some(phone) = phone_candidate(&message.address) {
            candidates.push(phone);
        }

        let typed = digits_only(&message.body);
        if PHONE_DIGITS.contains(&typed.len()) {
            candidates.push(typed);
        }
        candidates
    }

    /// Phone carried by the contact metadata of an anonymized address. The
    /// `user` part only counts when the contact id itself is not anonymized,
    /// since it holds the anonymized digits otherwise.
    async fn contact_phone(&self, address: &str) -> Option<String> {
        match self.chat.get_contact(address).await {
            Ok(contact) => {
                let id_is_phone = !is_anonymized(&contact.id);
                [
                    contact.phone_number.as_deref(),
                    contact.user.as_deref().filter(|_| id_is_phone),
                    Some(contact.id.as_str()),
                ]
                .into_iter()
                .flatten()
                .filter_map(phone_candidate)
                .find(|digits| PHONE_DIGITS.contains(&digits.len()))
            }
            Err(e) => {
                warn!(address, error = ?e, "contact lookup for anonymized address failed");
                None
            }
        }
    }
}

/// First unbound account whose phone matches a candidate, trying candidates
/// in order. Accounts that already have a channel address are never
/// rebound.
fn first_phone_match<'b>(accounts: &'b [Account], candidates: &[String]) -> Option<&'b Account> {
    candidates.iter().find_map(|candidate| {
        let key = normalize_phone(candidate);
        accounts.iter().find(|account| {
            account.channel_address.is_none() && normalize_phone(&account.phone) == key
        })
    })
}
