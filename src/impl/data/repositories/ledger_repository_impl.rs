use async_trait::async_trait;
use fractic_server_error::ServerError;
use futures::{stream::BoxStream, StreamExt as _};
use rust_decimal::Decimal;

use crate::{
    data::datasources::postgres_datasource::{LedgerStoreDatasource, PostgresDatasourceImpl},
    domain::repositories::ledger_repository::LedgerRepository,
    entities::{
        Account, AccountChange, AccountId, EntryPatch, LedgerEntry, LedgerEntryId, NewLedgerEntry,
    },
    errors::StoreQueryFailed,
};

pub(crate) struct LedgerRepositoryImpl<DS = PostgresDatasourceImpl>
where
    DS: LedgerStoreDatasource,
{
    store_datasource: DS,
}

impl<DS: LedgerStoreDatasource> LedgerRepositoryImpl<DS> {
    pub(crate) fn new(store_datasource: DS) -> Self {
        Self { store_datasource }
    }
}

#[async_trait]
impl<DS: LedgerStoreDatasource> LedgerRepository for LedgerRepositoryImpl<DS> {
    async fn fetch_accounts(&self) -> Result<Vec<Account>, ServerError> {
        Ok(self
            .store_datasource
            .fetch_profiles()
            .await?
            .into_iter()
            .map(Into::into)
            .collect())
    }

    async fn fetch_account_by_channel_address(
        &self,
        address: &str,
    ) -> Result<Option<Account>, ServerError> {
        Ok(self
            .store_datasource
            .fetch_profile_by_channel_address(address)
            .await?
            .map(Into::into))
    }

    async fn bind_channel_address(
        &self,
        account_id: AccountId,
        address: &str,
    ) -> Result<bool, ServerError> {
        Ok(self
            .store_datasource
            .set_profile_channel_address(account_id.0, address)
            .await?
            > 0)
    }

    async fn rename_account(&self, account_id: AccountId, name: &str) -> Result<(), ServerError> {
        match self
            .store_datasource
            .set_profile_name(account_id.0, name)
            .await?
        {
            0 => Err(StoreQueryFailed::new("rename_account")),
            _ => Ok(()),
        }
    }

    async fn insert_entry(&self, entry: NewLedgerEntry) -> Result<LedgerEntry, ServerError> {
        self.store_datasource
            .insert_entry(&entry)
            .await?
            .try_into()
    }

    async fn find_latest_entry_id_by_amount(
        &self,
        account_id: AccountId,
        amount: Decimal,
    ) -> Result<Option<LedgerEntryId>, ServerError> {
        Ok(self
            .store_datasource
            .find_latest_entry_id_by_amount(account_id.0, amount)
            .await?
            .map(LedgerEntryId))
    }

    async fn update_entry(
        &self,
        account_id: AccountId,
        entry_id: LedgerEntryId,
        patch: &EntryPatch,
    ) -> Result<bool, ServerError> {
        let updated = self
            .store_datasource
            .update_entry(account_id.0, entry_id.0, patch)
            .await?;
        Ok(updated > 0)
    }

    async fn subscribe_account_changes(
        &self,
    ) -> Result<BoxStream<'static, AccountChange>, ServerError> {
        Ok(self
            .store_datasource
            .listen_profile_changes()
            .await?
            .map(Into::into)
            .boxed())
    }
}
