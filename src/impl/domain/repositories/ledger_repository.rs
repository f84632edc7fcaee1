use async_trait::async_trait;
use fractic_server_error::ServerError;
use futures::stream::BoxStream;
use rust_decimal::Decimal;

use crate::entities::{
    Account, AccountChange, AccountId, EntryPatch, LedgerEntry, LedgerEntryId, NewLedgerEntry,
};

/// Row-level access to the accounts and ledger tables.
///
/// Every entry-level operation takes the owning account id and constrains the
/// underlying query by it, so no caller can read or mutate another account's
/// entries.
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    /// All accounts, in store order.
    async fn fetch_accounts(&self) -> Result<Vec<Account>, ServerError>;

    async fn fetch_account_by_channel_address(
        &self,
        address: &str,
    ) -> Result<Option<Account>, ServerError>;

    /// Binds `address` to the account only if it has none yet. Returns whether
    /// the binding was written; an existing binding is never replaced.
    async fn bind_channel_address(
        &self,
        account_id: AccountId,
        address: &str,
    ) -> Result<bool, ServerError>;

    async fn rename_account(&self, account_id: AccountId, name: &str) -> Result<(), ServerError>;

    async fn insert_entry(&self, entry: NewLedgerEntry) -> Result<LedgerEntry, ServerError>;

    /// Most recently created entry of `account_id` with exactly `amount`.
    async fn find_latest_entry_id_by_amount(
        &self,
        account_id: AccountId,
        amount: Decimal,
    ) -> Result<Option<LedgerEntryId>, ServerError>;

    /// Returns whether a row owned by `account_id` with `entry_id` was found
    /// and updated.
    async fn update_entry(
        &self,
        account_id: AccountId,
        entry_id: LedgerEntryId,
        patch: &EntryPatch,
    ) -> Result<bool, ServerError>;

    async fn subscribe_account_changes(
        &self,
    ) -> Result<BoxStream<'static, AccountChange>, ServerError>;
}
