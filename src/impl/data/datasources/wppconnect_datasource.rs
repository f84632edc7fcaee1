use std::time::Duration;

use async_trait::async_trait;
use fractic_server_error::ServerError;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::{
    data::models::wppconnect_model::{
        ContactModel, NumberStatusModel, ResponseEnvelopeModel, SendMessageRequest,
    },
    errors::{TransportRequestFailed, TransportResponseInvalid},
};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// REST access to a WPPConnect server session.
#[async_trait]
pub(crate) trait WppConnectDatasource: Send + Sync {
    async fn send_message(&self, phone: &str, message: &str) -> Result<(), ServerError>;

    async fn check_number_status(&self, phone: &str) -> Result<NumberStatusModel, ServerError>;

    async fn get_contact(&self, address: &str) -> Result<ContactModel, ServerError>;
}

pub(crate) struct WppConnectDatasourceImpl {
    client: Client,
    base_url: String,
    session: String,
    token: Option<String>,
}

impl WppConnectDatasourceImpl {
    pub(crate) fn new(
        base_url: impl Into<String>,
        session: impl Into<String>,
        token: Option<String>,
    ) -> Result<Self, ServerError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| TransportRequestFailed::with_debug("client", &e))?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            session: session.into(),
            token,
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/api/{}/{}", self.base_url, self.session, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
        endpoint: &str,
    ) -> Result<T, ServerError> {
        let response = self
            .authorized(request)
            .send()
            .await
            .map_err(|e| TransportRequestFailed::with_debug(endpoint, &e))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TransportRequestFailed::with_debug(endpoint, &e))?;
        debug!(%status, endpoint, "transport responded");
        if !status.is_success() {
            return Err(TransportResponseInvalid::with_debug(endpoint, &body));
        }
        serde_json::from_str::<ResponseEnvelopeModel<T>>(&body)
            .map(|envelope| envelope.response)
            .map_err(|e| TransportResponseInvalid::with_debug(endpoint, &e))
    }
}

#[async_trait]
impl WppConnectDatasource for WppConnectDatasourceImpl {
    async fn send_message(&self, phone: &str, message: &str) -> Result<(), ServerError> {
        let request = self
            .client
            .post(self.endpoint("send-message"))
            .json(&SendMessageRequest {
                phone,
                message,
                is_group: false,
            });
        self.execute::<serde_json::Value>(request, "send-message")
            .await
            .map(|_| ())
    }

    async fn check_number_status(&self, phone: &str) -> Result<NumberStatusModel, ServerError> {
        let request = self
            .client
            .get(self.endpoint(&format!("check-number-status/{phone}")));
        self.execute(request, "check-number-status").await
    }

    async fn get_contact(&self, address: &str) -> Result<ContactModel, ServerError> {
        let request = self.client.get(self.endpoint(&format!("contact/{address}")));
        self.execute(request, "contact").await
    }
}
