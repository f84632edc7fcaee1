use async_trait::async_trait;
use fractic_server_error::ServerError;

use crate::entities::{ContactInfo, NumberStatus};

/// Outbound side of the messaging transport. Inbound messages are delivered
/// through the webhook and the work queue instead.
#[async_trait]
pub trait ChatRepository: Send + Sync {
    async fn send_text(&self, address: &str, text: &str) -> Result<(), ServerError>;

    async fn check_number_status(&self, phone: &str) -> Result<NumberStatus, ServerError>;

    async fn get_contact(&self, address: &str) -> Result<ContactInfo, ServerError>;
}
