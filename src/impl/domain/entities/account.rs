use uuid::Uuid;

#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy)]
pub struct AccountId(pub Uuid);

impl std::fmt::Display for AccountId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

/// Account owning a ledger. Created by the external signup flow; this crate
/// only reads it, binds its channel address and renames it.
#[derive(Debug, PartialEq, Eq, Clone)]
pub struct Account {
    pub id: AccountId,
    pub name: String,
    /// Canonical phone, as entered at signup (any formatting).
    pub phone: String,
    /// Messaging channel address, bound once by auto-linking.
    pub channel_address: Option<String>,
    /// One-time auth code waiting to be delivered.
    pub auth_code: Option<String>,
}

/// Row-level change notification for the accounts table.
#[derive(Debug, Clone)]
pub struct AccountChange {
    pub previous: Option<Account>,
    pub current: Option<Account>,
}
