use futures::stream::{self, StreamExt as _};
use tracing::{debug, warn};

use crate::{
    domain::{
        logic::category_normalizer::normalize_category,
        repositories::ledger_repository::LedgerRepository,
    },
    entities::{
        Account, EntryPatch, IntentAction, LedgerEntryId, NewLedgerEntry, Outcome,
        TransactionIntent,
    },
};

/// Applies intents to the ledger of one account. Intents are processed in
/// order and independently: a failed intent never affects its siblings.
pub(crate) struct Reconciler<'a, L: LedgerRepository> {
    ledger: &'a L,
    account: &'a Account,
    channel_address: &'a str,
}

impl<'a, L: LedgerRepository> Reconciler<'a, L> {
    pub(crate) fn new(ledger: &'a L, account: &'a Account, channel_address: &'a str) -> Self {
        Self {
            ledger,
            account,
            channel_address,
        }
    }

    pub(crate) async fn reconcile(&self, intents: Vec<TransactionIntent>) -> Vec<Outcome> {
        stream::iter(intents)
            .then(|intent| async move {
                match intent.action {
                    IntentAction::Create => self.create(intent.patch).await,
                    IntentAction::Edit => self.edit(intent).await,
                }
            })
            .collect()
            .await
    }

    async fn create(&self, patch: EntryPatch) -> Outcome {
        let (Some(kind), Some(amount)) = (patch.kind, patch.amount) else {
            // Unreachable through the extraction contract.
            warn!(account_id = %self.account.id, "create intent without kind or amount");
            return Outcome::PersistenceFailed {
                action: IntentAction::Create,
            };
        };
        let entry = NewLedgerEntry {
            account_id: self.account.id,
            kind,
            amount,
            description: patch.description.unwrap_or_default(),
            category: normalize_category(patch.category.as_deref()),
            date: patch.date.unwrap_or_else(|| chrono::Utc::now().date_naive()),
            channel_phone: self.channel_address.to_string(),
        };
        match self.ledger.insert_entry(entry).await {
            Ok(stored) => {
                debug!(account_id = %self.account.id, entry_id = %stored.id, "entry created");
                Outcome::Created(stored)
            }
            Err(e) => {
                warn!(account_id = %self.account.id, error = ?e, "entry insert failed");
                Outcome::PersistenceFailed {
                    action: IntentAction::Create,
                }
            }
        }
    }

    async fn edit(&self, intent: TransactionIntent) -> Outcome {
        let not_found = Outcome::TargetNotFound {
            target_id: intent.target_id,
            search_amount: intent.search_amount,
        };
        let target = match self.resolve_target(&intent).await {
            Ok(Some(id)) => id,
            Ok(None) => return not_found,
            Err(outcome) => return outcome,
        };

        let patch = EntryPatch {
            category: intent
                .patch
                .category
                .as_deref()
                .map(|c| normalize_category(Some(c))),
            ..intent.patch
        };
        if patch.is_empty() {
            return Outcome::Unchanged { id: target };
        }

        match self.ledger.update_entry(self.account.id, target, &patch).await {
            Ok(true) => {
                debug!(account_id = %self.account.id, entry_id = %target, "entry edited");
                Outcome::Edited { id: target }
            }
            // Unknown id, or an id owned by another account.
            Ok(false) => not_found,
            Err(e) => {
                warn!(account_id = %self.account.id, entry_id = %target, error = ?e, "entry update failed");
                Outcome::PersistenceFailed {
                    action: IntentAction::Edit,
                }
            }
        }
    }

    /// Explicit id first, then the latest own entry with the search amount.
    async fn resolve_target(
        &self,
        intent: &TransactionIntent,
    ) -> Result<Option<LedgerEntryId>, Outcome> {
        if let Some(id) = intent.target_id {
            return Ok(Some(id));
        }
        let Some(amount) = intent.search_amount else {
            return Ok(None);
        };
        self.ledger
            .find_latest_entry_id_by_amount(self.account.id, amount)
            .await
            .map_err(|e| {
                warn!(account_id = %self.account.id, error = ?e, "amount lookup failed");
                Outcome::PersistenceFailed {
                    action: IntentAction::Edit,
                }
            })
    }
}
