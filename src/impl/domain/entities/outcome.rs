use rust_decimal::Decimal;

use super::{
    ledger_entry::{LedgerEntry, LedgerEntryId},
    transaction_intent::IntentAction,
};

/// Per-intent result of reconciliation, aggregated into the outbound reply.
#[derive(Debug, Clone)]
pub enum Outcome {
    Created(LedgerEntry),
    Edited { id: LedgerEntryId },
    /// Edit resolved to an entry but carried no fields to change.
    Unchanged { id: LedgerEntryId },
    TargetNotFound {
        target_id: Option<LedgerEntryId>,
        search_amount: Option<Decimal>,
    },
    PersistenceFailed { action: IntentAction },
}
