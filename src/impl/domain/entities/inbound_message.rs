use super::account::Account;

/// Message received from the messaging transport.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// Chat address the message came from (may be anonymized).
    pub address: String,
    /// Participant address, when the transport reports one.
    pub author: Option<String>,
    pub body: String,
    pub is_group: bool,
    pub is_status: bool,
}

/// Transport metadata for a contact address.
#[derive(Debug, Clone, Default)]
pub struct ContactInfo {
    pub id: String,
    pub phone_number: Option<String>,
    pub user: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NumberStatus {
    pub number_exists: bool,
    /// Canonical transport address for the number.
    pub id: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    ResolvedByAddress(Account),
    /// Binding was just persisted; the turn ends with a link confirmation.
    ResolvedByAutoLink(Account),
    Unresolvable,
}
