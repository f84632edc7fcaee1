use rust_decimal::Decimal;

use super::ledger_entry::{EntryPatch, LedgerEntryId};

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum IntentAction {
    Create,
    Edit,
}

/// Not-yet-committed instruction extracted from freeform text. Never
/// persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionIntent {
    pub action: IntentAction,
    /// Explicit edit target.
    pub target_id: Option<LedgerEntryId>,
    /// Fallback edit target selector: latest own entry with this amount.
    pub search_amount: Option<Decimal>,
    /// For creates, `kind` and `amount` are always present (guaranteed by
    /// the extraction contract).
    pub patch: EntryPatch,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionResult {
    /// Zero or more intents, in oracle order.
    Intents(Vec<TransactionIntent>),
    ParseFailed,
    RateLimited,
}
