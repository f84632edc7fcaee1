use std::time::Duration;

use async_trait::async_trait;
use fractic_server_error::ServerError;
use futures::{
    stream::{self, BoxStream},
    StreamExt as _,
};
use rust_decimal::Decimal;
use sqlx::{
    postgres::{PgListener, PgPoolOptions},
    PgPool, Postgres, QueryBuilder,
};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::{
    data::models::{
        ledger_entry_model::LedgerEntryModel,
        profile_model::{ProfileChangeModel, ProfileModel},
    },
    entities::{EntryPatch, NewLedgerEntry},
    errors::{StoreConnectionFailed, StoreQueryFailed, StoreSubscriptionFailed},
};

/// Notification channel fed by the trigger on `profiles`.
pub(crate) const PROFILE_CHANGES_CHANNEL: &str = "profile_changes";
const LISTENER_RETRY_DELAY: Duration = Duration::from_secs(1);

const PROFILE_COLUMNS: &str = "id, name, phone, channel_address, auth_code";
const ENTRY_COLUMNS: &str = "id, profile_id, kind, amount, description, category, \
                             transaction_date, channel_phone, created_at";

#[async_trait]
pub(crate) trait LedgerStoreDatasource: Send + Sync {
    async fn fetch_profiles(&self) -> Result<Vec<ProfileModel>, ServerError>;

    async fn fetch_profile_by_channel_address(
        &self,
        address: &str,
    ) -> Result<Option<ProfileModel>, ServerError>;

    /// Only writes profiles without a channel address yet.
    async fn set_profile_channel_address(
        &self,
        profile_id: Uuid,
        address: &str,
    ) -> Result<u64, ServerError>;

    async fn set_profile_name(&self, profile_id: Uuid, name: &str) -> Result<u64, ServerError>;

    async fn insert_entry(&self, entry: &NewLedgerEntry) -> Result<LedgerEntryModel, ServerError>;

    async fn find_latest_entry_id_by_amount(
        &self,
        profile_id: Uuid,
        amount: Decimal,
    ) -> Result<Option<i64>, ServerError>;

    /// Returns the number of updated rows. `patch` must not be empty.
    async fn update_entry(
        &self,
        profile_id: Uuid,
        entry_id: i64,
        patch: &EntryPatch,
    ) -> Result<u64, ServerError>;

    async fn listen_profile_changes(
        &self,
    ) -> Result<BoxStream<'static, ProfileChangeModel>, ServerError>;
}

pub(crate) struct PostgresDatasourceImpl {
    pool: PgPool,
}

impl PostgresDatasourceImpl {
    pub(crate) async fn connect(
        database_url: &str,
        max_connections: u32,
    ) -> Result<Self, ServerError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .acquire_timeout(Duration::from_secs(30))
            .connect(database_url)
            .await
            .map_err(|e| StoreConnectionFailed::with_debug(&e))?;
        info!(max_connections, "ledger store pool created");
        Ok(Self { pool })
    }
}

#[async_trait]
impl LedgerStoreDatasource for PostgresDatasourceImpl {
    async fn fetch_profiles(&self) -> Result<Vec<ProfileModel>, ServerError> {
        sqlx::query_as::<_, ProfileModel>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StoreQueryFailed::with_debug("fetch_profiles", &e))
    }

    async fn fetch_profile_by_channel_address(
        &self,
        address: &str,
    ) -> Result<Option<ProfileModel>, ServerError> {
        sqlx::query_as::<_, ProfileModel>(&format!(
            "SELECT {PROFILE_COLUMNS} FROM profiles WHERE channel_address = $1 LIMIT 1"
        ))
        .bind(address)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreQueryFailed::with_debug("fetch_profile_by_channel_address", &e))
    }

    async fn set_profile_channel_address(
        &self,
        profile_id: Uuid,
        address: &str,
    ) -> Result<u64, ServerError> {
        sqlx::query(
            "UPDATE profiles SET channel_address = $1 \
             WHERE id = $2 AND (channel_address IS NULL OR channel_address = '')",
        )
            .bind(address)
            .bind(profile_id)
            .execute(&self.pool)
            .await
            .map(|r| r.rows_affected())
            .map_err(|e| StoreQueryFailed::with_debug("set_profile_channel_address", &e))
    }

    async fn set_profile_name(&self, profile_id: Uuid, name: &str) -> Result<u64, ServerError> {
        sqlx::query("UPDATE profiles SET name = $1 WHERE id = $2")
            .bind(name)
            .bind(profile_id)
            .execute(&self.pool)
            .await
            .map(|r| r.rows_affected())
            .map_err(|e| StoreQueryFailed::with_debug("set_profile_name", &e))
    }

    async fn insert_entry(&self, entry: &NewLedgerEntry) -> Result<LedgerEntryModel, ServerError> {
        sqlx::query_as::<_, LedgerEntryModel>(&format!(
            r#"
            INSERT INTO ledger_entries
                (profile_id, kind, amount, description, category, transaction_date, channel_phone)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING {ENTRY_COLUMNS}
            "#
        ))
        .bind(entry.account_id.0)
        .bind(entry.kind.as_str())
        .bind(entry.amount)
        .bind(&entry.description)
        .bind(&entry.category)
        .bind(entry.date)
        .bind(&entry.channel_phone)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| StoreQueryFailed::with_debug("insert_entry", &e))
    }

    async fn find_latest_entry_id_by_amount(
        &self,
        profile_id: Uuid,
        amount: Decimal,
    ) -> Result<Option<i64>, ServerError> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT id FROM ledger_entries
            WHERE profile_id = $1 AND amount = $2
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(profile_id)
        .bind(amount)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StoreQueryFailed::with_debug("find_latest_entry_id_by_amount", &e))
    }

    async fn update_entry(
        &self,
        profile_id: Uuid,
        entry_id: i64,
        patch: &EntryPatch,
    ) -> Result<u64, ServerError> {
        let mut builder = QueryBuilder::<Postgres>::new("UPDATE ledger_entries SET ");
        {
            let mut fields = builder.separated(", ");
            if let Some(kind) = patch.kind {
                fields.push("kind = ").push_bind_unseparated(kind.as_str());
            }
            if let Some(amount) = patch.amount {
                fields.push("amount = ").push_bind_unseparated(amount);
            }
            if let Some(description) = &patch.description {
                fields
                    .push("description = ")
                    .push_bind_unseparated(description.clone());
            }
            if let Some(category) = &patch.category {
                fields
                    .push("category = ")
                    .push_bind_unseparated(category.clone());
            }
            if let Some(date) = patch.date {
                fields
                    .push("transaction_date = ")
                    .push_bind_unseparated(date);
            }
        }
        builder
            .push(" WHERE id = ")
            .push_bind(entry_id)
            .push(" AND profile_id = ")
            .push_bind(profile_id);

        builder
            .build()
            .execute(&self.pool)
            .await
            .map(|r| r.rows_affected())
            .map_err(|e| StoreQueryFailed::with_debug("update_entry", &e))
    }

    async fn listen_profile_changes(
        &self,
    ) -> Result<BoxStream<'static, ProfileChangeModel>, ServerError> {
        let mut listener = PgListener::connect_with(&self.pool)
            .await
            .map_err(|e| StoreSubscriptionFailed::with_debug(PROFILE_CHANGES_CHANNEL, &e))?;
        listener
            .listen(PROFILE_CHANGES_CHANNEL)
            .await
            .map_err(|e| StoreSubscriptionFailed::with_debug(PROFILE_CHANGES_CHANNEL, &e))?;
        info!(channel = PROFILE_CHANGES_CHANNEL, "listening for profile changes");

        // The listener reconnects on its own after a lost connection, so
        // errors are logged and the stream keeps going.
        Ok(stream::unfold(listener, |mut listener| async move {
            loop {
                match listener.recv().await {
                    Ok(notification) => {
                        match serde_json::from_str::<ProfileChangeModel>(notification.payload()) {
                            Ok(change) => return Some((change, listener)),
                            Err(e) => debug!(error = %e, "skipping undecodable profile change"),
                        }
                    }
                    Err(e) => {
                        warn!(error = %e, "profile change listener failed, retrying");
                        tokio::time::sleep(LISTENER_RETRY_DELAY).await;
                    }
                }
            }
        })
        .boxed())
    }
}
