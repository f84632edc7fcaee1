use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use fractic_server_error::ServerError;
use rust_decimal::Decimal;

use crate::errors::InvalidEntryKind;

use super::account::AccountId;

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, PartialOrd, Ord)]
pub struct LedgerEntryId(pub i64);

impl std::fmt::Display for LedgerEntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum EntryKind {
    Expense,
    Income,
}

impl EntryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            EntryKind::Expense => "expense",
            EntryKind::Income => "income",
        }
    }
}

impl FromStr for EntryKind {
    type Err = ServerError;

    /// Exact match only; the oracle is expected to use the canonical words.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "expense" => Ok(EntryKind::Expense),
            "income" => Ok(EntryKind::Income),
            other => Err(InvalidEntryKind::new(other)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LedgerEntry {
    pub id: LedgerEntryId,
    pub account_id: AccountId,
    pub kind: EntryKind,
    /// Always positive.
    pub amount: Decimal,
    pub description: String,
    /// Title-Case, never empty.
    pub category: String,
    pub date: NaiveDate,
    /// Channel address the entry was recorded from (audit only).
    pub channel_phone: String,
    pub created_at: DateTime<Utc>,
}

/// Entry to be inserted; id and creation timestamp are assigned by the store.
#[derive(Debug, Clone)]
pub struct NewLedgerEntry {
    pub account_id: AccountId,
    pub kind: EntryKind,
    pub amount: Decimal,
    pub description: String,
    pub category: String,
    pub date: NaiveDate,
    pub channel_phone: String,
}

/// Partial update. Only `Some` fields are written.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EntryPatch {
    pub kind: Option<EntryKind>,
    pub amount: Option<Decimal>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub date: Option<NaiveDate>,
}

impl EntryPatch {
    pub fn is_empty(&self) -> bool {
        self.kind.is_none()
            && self.amount.is_none()
            && self.description.is_none()
            && self.category.is_none()
            && self.date.is_none()
    }
}
