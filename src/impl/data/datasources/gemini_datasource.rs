use std::time::Duration;

use async_trait::async_trait;
use fractic_server_error::ServerError;
use reqwest::{Client, StatusCode};
use tracing::{debug, warn};

use crate::errors::{OracleRequestFailed, OracleResponseInvalid};

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const RATE_LIMIT_STATUS: &str = "RESOURCE_EXHAUSTED";

#[derive(Debug, PartialEq)]
pub(crate) enum OracleOutput {
    Text(String),
    /// Quota or rate limit exhausted.
    RateLimited,
}

/// Text-in / text-out access to the extraction oracle.
#[async_trait]
pub(crate) trait OracleDatasource: Send + Sync {
    async fn generate_content(&self, prompt: &str) -> Result<OracleOutput, ServerError>;
}

// Wire format.
// ---

#[derive(Debug, serde_derive::Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<ContentModel<'a>>,
    generation_config: GenerationConfigModel,
}

#[derive(Debug, serde_derive::Serialize)]
struct ContentModel<'a> {
    parts: Vec<PartModel<'a>>,
}

#[derive(Debug, serde_derive::Serialize)]
struct PartModel<'a> {
    text: &'a str,
}

#[derive(Debug, serde_derive::Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfigModel {
    response_mime_type: &'static str,
    temperature: f32,
}

#[derive(Debug, serde_derive::Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<CandidateModel>,
}

#[derive(Debug, serde_derive::Deserialize)]
struct CandidateModel {
    #[serde(default)]
    content: Option<ResponseContentModel>,
}

#[derive(Debug, serde_derive::Deserialize)]
struct ResponseContentModel {
    #[serde(default)]
    parts: Vec<ResponsePartModel>,
}

#[derive(Debug, serde_derive::Deserialize)]
struct ResponsePartModel {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, serde_derive::Deserialize)]
struct ErrorEnvelopeModel {
    error: ErrorModel,
}

#[derive(Debug, serde_derive::Deserialize)]
struct ErrorModel {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

// Implementation.
// ---

pub(crate) struct GeminiDatasourceImpl {
    client: Client,
    api_key: String,
    model: String,
}

impl GeminiDatasourceImpl {
    pub(crate) fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ServerError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| OracleRequestFailed::with_debug(&e))?;
        Ok(Self {
            client,
            api_key: api_key.into(),
            model: model.into(),
        })
    }
}

#[async_trait]
impl OracleDatasource for GeminiDatasourceImpl {
    async fn generate_content(&self, prompt: &str) -> Result<OracleOutput, ServerError> {
        let url = format!("{}/{}:generateContent", GEMINI_BASE_URL, self.model);
        let request = GenerateContentRequest {
            contents: vec![ContentModel {
                parts: vec![PartModel { text: prompt }],
            }],
            generation_config: GenerationConfigModel {
                response_mime_type: "application/json",
                temperature: 0.1,
            },
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| OracleRequestFailed::with_debug(&e))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| OracleRequestFailed::with_debug(&e))?;
        debug!(%status, model = %self.model, "oracle responded");

        if !status.is_success() {
            return classify_error(status, &body);
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&body)
            .map_err(|e| OracleResponseInvalid::with_debug("undecodable body", &e))?;
        let text: String = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();
        if text.is_empty() {
            return Err(OracleResponseInvalid::new("no candidate text"));
        }
        Ok(OracleOutput::Text(text))
    }
}

fn classify_error(status: StatusCode, body: &str) -> Result<OracleOutput, ServerError> {
    let error = serde_json::from_str::<ErrorEnvelopeModel>(body)
        .ok()
        .map(|e| e.error);
    let rate_limited = status == StatusCode::TOO_MANY_REQUESTS
        || error
            .as_ref()
            .and_then(|e| e.status.as_deref())
            .is_some_and(|s| s == RATE_LIMIT_STATUS);
    if rate_limited {
        warn!(%status, "oracle quota exhausted");
        return Ok(OracleOutput::RateLimited);
    }
    let message = error.and_then(|e| e.message).unwrap_or_default();
    Err(OracleResponseInvalid::with_debug(
        status.as_str(),
        &message,
    ))
}
