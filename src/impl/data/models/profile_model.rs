use uuid::Uuid;

use crate::entities::{Account, AccountChange, AccountId};

/// Row of the `profiles` table. Also the shape of `record` / `old_record` in
/// change notifications, which carry the row as JSON.
#[derive(Debug, Clone, sqlx::FromRow, serde_derive::Deserialize)]
pub(crate) struct ProfileModel {
    pub(crate) id: Uuid,
    #[serde(default)]
    pub(crate) name: Option<String>,
    #[serde(default)]
    pub(crate) phone: Option<String>,
    #[serde(default)]
    pub(crate) channel_address: Option<String>,
    #[serde(default)]
    pub(crate) auth_code: Option<String>,
}

impl Into<Account> for ProfileModel {
    fn into(self) -> Account {
        Account {
            id: AccountId(self.id),
            name: self.name.unwrap_or_default(),
            phone: self.phone.unwrap_or_default(),
            channel_address: self.channel_address.filter(|a| !a.is_empty()),
            auth_code: self.auth_code,
        }
    }
}

/// Payload published on the profile change channel.
#[derive(Debug, serde_derive::Deserialize)]
pub(crate) struct ProfileChangeModel {
    /// INSERT, UPDATE or DELETE.
    #[serde(rename = "type")]
    pub(crate) operation: String,
    #[serde(default)]
    pub(crate) record: Option<ProfileModel>,
    #[serde(default)]
    pub(crate) old_record: Option<ProfileModel>,
}

impl Into<AccountChange> for ProfileChangeModel {
    fn into(self) -> AccountChange {
        AccountChange {
            previous: self.old_record.map(Into::into),
            current: self.record.map(Into::into),
        }
    }
}
