use std::str::FromStr as _;

use chrono::{DateTime, NaiveDate, Utc};
use fractic_server_error::ServerError;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::entities::{AccountId, EntryKind, LedgerEntry, LedgerEntryId};

/// Row of the `ledger_entries` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub(crate) struct LedgerEntryModel {
    pub(crate) id: i64,
    pub(crate) profile_id: Uuid,
    pub(crate) kind: String,
    pub(crate) amount: Decimal,
    pub(crate) description: Option<String>,
    pub(crate) category: Option<String>,
    pub(crate) transaction_date: NaiveDate,
    pub(crate) channel_phone: Option<String>,
    pub(crate) created_at: DateTime<Utc>,
}

impl TryFrom<LedgerEntryModel> for LedgerEntry {
    type Error = ServerError;

    fn try_from(model: LedgerEntryModel) -> Result<Self, Self::Error> {
        Ok(LedgerEntry {
            id: LedgerEntryId(model.id),
            account_id: AccountId(model.profile_id),
            kind: EntryKind::from_str(&model.kind)?,
            amount: model.amount,
            description: model.description.unwrap_or_default(),
            category: model.category.unwrap_or_default(),
            date: model.transaction_date,
            channel_phone: model.channel_phone.unwrap_or_default(),
            created_at: model.created_at,
        })
    }
}
