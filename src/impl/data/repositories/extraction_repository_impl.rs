use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::Value;
use tracing::{debug, warn};

use crate::{
    data::{
        datasources::gemini_datasource::{GeminiDatasourceImpl, OracleDatasource, OracleOutput},
        models::intent_model::{IntentBatchModel, IntentModel, INTENT_SCHEMA_VERSION},
    },
    domain::repositories::extraction_repository::ExtractionRepository,
    entities::{ExtractionResult, TransactionIntent},
};

pub(crate) struct ExtractionRepositoryImpl<DS = GeminiDatasourceImpl>
where
    DS: OracleDatasource,
{
    oracle_datasource: DS,
}

impl<DS: OracleDatasource> ExtractionRepositoryImpl<DS> {
    pub(crate) fn new(oracle_datasource: DS) -> Self {
        Self { oracle_datasource }
    }
}

#[async_trait]
impl<DS: OracleDatasource> ExtractionRepository for ExtractionRepositoryImpl<DS> {
    async fn extract(&self, text: &str, reference_date: NaiveDate) -> ExtractionResult {
        let prompt = build_prompt(text, reference_date);
        match self.oracle_datasource.generate_content(&prompt).await {
            Ok(OracleOutput::Text(raw)) => parse_oracle_text(&raw, reference_date),
            Ok(OracleOutput::RateLimited) => ExtractionResult::RateLimited,
            Err(e) => {
                warn!(error = ?e, "oracle call failed");
                ExtractionResult::ParseFailed
            }
        }
    }
}

fn build_prompt(text: &str, reference_date: NaiveDate) -> String {
    format!(
        r##"Act as a bookkeeper. Today is {today}. Message: "{text}"

TASK: turn the message into ledger intents. A message may describe several
transactions; emit one intent per transaction, in the order they appear.

1. CREATE triggers: "gastei", "paguei", "comprei", "recebi", "pix",
   "transferi", "spent", "paid", "bought", "received", or a bare amount.
2. EDIT triggers: "mudar", "alterar", "corrigir", "editar", "era", "trocar",
   "change", "fix", "edit".

EXTRACTION:
- "categoria X", "tag X", "category X" -> category = X.
- Paid/spent/bought -> kind = "expense". Received/earned -> kind = "income".
- Amounts are positive numbers with '.' as decimal mark.
- Dates are YYYY-MM-DD; relative dates ("ontem", "yesterday") are relative to today.
- For EDIT, set "target_id" when the user gives a record number (ex. "#12"),
  otherwise set "search_amount" to the amount of the record to change, and put
  only the fields being changed in "data".

Respond with JSON only, exactly this shape:
{{"version": {version}, "intents": [{{"action": "create"|"edit", "target_id": null|int, "search_amount": null|number, "data": {{"kind": "expense"|"income", "amount": number, "description": "...", "category": "...", "date": "YYYY-MM-DD"}}}}]}}
If the message contains no transaction, respond {{"version": {version}, "intents": []}}."##,
        today = reference_date.format("%Y-%m-%d"),
        text = text.replace('"', "'"),
        version = INTENT_SCHEMA_VERSION,
    )
}

/// Parse raw oracle text into intents.
///
/// The whole text is first parsed strictly as the JSON payload. If that fails,
/// falls back to the substring between the first '{' and the last '}', which
/// tolerates prose or code fences around the payload.
pub(crate) fn parse_oracle_text(raw: &str, reference_date: NaiveDate) -> ExtractionResult {
    let Some(payload) = locate_payload(raw) else {
        debug!(raw_len = raw.len(), "no JSON object in oracle output");
        return ExtractionResult::ParseFailed;
    };

    let candidates = match payload_candidates(payload) {
        Some(candidates) => candidates,
        None => return ExtractionResult::ParseFailed,
    };
    let candidate_count = candidates.len();

    let intents: Vec<TransactionIntent> = candidates
        .into_iter()
        .enumerate()
        .filter_map(|(i, value)| {
            serde_json::from_value::<IntentModel>(value)
                .map_err(|e| format!("{e}"))
                .and_then(|m| m.into_intent(reference_date).map_err(|e| format!("{e:?}")))
                .map_err(|reason| debug!(index = i, %reason, "dropping invalid intent"))
                .ok()
        })
        .collect();

    if candidate_count > 0 && intents.is_empty() {
        return ExtractionResult::ParseFailed;
    }
    ExtractionResult::Intents(intents)
}

fn locate_payload(raw: &str) -> Option<Value> {
    if let Ok(value @ Value::Object(_)) = serde_json::from_str::<Value>(raw.trim()) {
        return Some(value);
    }
    let start = raw.find('{')?;
    let end = raw.rfind('}')?;
    if end < start {
        return None;
    }
    match serde_json::from_str::<Value>(&raw[start..=end]) {
        Ok(value @ Value::Object(_)) => Some(value),
        _ => None,
    }
}

/// Normalizes both accepted shapes (batch container or single intent) into a
/// list of raw intent values. `None` if the payload has neither shape.
fn payload_candidates(payload: Value) -> Option<Vec<Value>> {
    if payload.get("intents").is_some() {
        let batch: IntentBatchModel = serde_json::from_value(payload)
            .map_err(|e| debug!(error = %e, "malformed intent batch"))
            .ok()?;
        if batch.version.is_some_and(|v| v != INTENT_SCHEMA_VERSION) {
            debug!(version = ?batch.version, "unsupported intent schema version");
            return None;
        }
        Some(batch.intents)
    } else if payload.get("action").is_some() {
        Some(vec![payload])
    } else {
        None
    }
}
