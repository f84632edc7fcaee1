use async_trait::async_trait;
use fractic_server_error::ServerError;

use crate::{
    data::datasources::wppconnect_datasource::{WppConnectDatasource, WppConnectDatasourceImpl},
    domain::repositories::chat_repository::ChatRepository,
    entities::{ContactInfo, NumberStatus},
};

pub(crate) struct ChatRepositoryImpl<DS = WppConnectDatasourceImpl>
where
    DS: WppConnectDatasource,
{
    transport_datasource: DS,
}

impl<DS: WppConnectDatasource> ChatRepositoryImpl<DS> {
    pub(crate) fn new(transport_datasource: DS) -> Self {
        Self {
            transport_datasource,
        }
    }
}

#[async_trait]
impl<DS: WppConnectDatasource> ChatRepository for ChatRepositoryImpl<DS> {
    async fn send_text(&self, address: &str, text: &str) -> Result<(), ServerError> {
        self.transport_datasource.send_message(address, text).await
    }

    async fn check_number_status(&self, phone: &str) -> Result<NumberStatus, ServerError> {
        Ok(self
            .transport_datasource
            .check_number_status(phone)
            .await?
            .into())
    }

    async fn get_contact(&self, address: &str) -> Result<ContactInfo, ServerError> {
        Ok(self.transport_datasource.get_contact(address).await?.into())
    }
}
