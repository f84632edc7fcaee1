use std::str::FromStr as _;

use chrono::NaiveDate;
use fractic_server_error::ServerError;
use serde::Deserialize;
use serde_json::Value;

use crate::{
    entities::{EntryKind, EntryPatch, IntentAction, LedgerEntryId, TransactionIntent},
    errors::IncompleteIntent,
};

use super::{amount_model::AmountModel, iso_date_model::ISODateModel};

/// Schema version the extraction prompt asks the oracle to produce.
pub(crate) const INTENT_SCHEMA_VERSION: u64 = 1;

/// Container shape: `{"version": 1, "intents": [...]}`. Intents are kept as
/// raw values so each one can be validated (and dropped) on its own.
#[derive(Debug, serde_derive::Deserialize)]
pub(crate) struct IntentBatchModel {
    #[serde(default)]
    pub(crate) version: Option<u64>,
    pub(crate) intents: Vec<Value>,
}

#[derive(Debug, serde_derive::Deserialize)]
#[serde(rename_all = "lowercase")]
pub(crate) enum IntentActionModel {
    Create,
    Edit,
}

/// Entry id as the oracle writes it: a number or a numeric string.
#[derive(Debug)]
pub(crate) struct EntryIdModel(i64);
impl<'de> Deserialize<'de> for EntryIdModel {
    fn deserialize<D>(deserializer: D) -> Result<EntryIdModel, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let id = match Value::deserialize(deserializer)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.trim().trim_start_matches('#').parse().ok(),
            _ => None,
        };
        id.filter(|id| *id >= 0)
            .map(EntryIdModel)
            .ok_or_else(|| serde::de::Error::custom("expected entry id"))
    }
}

#[derive(Debug, Default, serde_derive::Deserialize)]
pub(crate) struct IntentDataModel {
    #[serde(default)]
    pub(crate) kind: Option<String>,
    #[serde(default)]
    pub(crate) amount: Option<AmountModel>,
    #[serde(default)]
    pub(crate) description: Option<String>,
    #[serde(default)]
    pub(crate) category: Option<String>,
    #[serde(default)]
    pub(crate) date: Option<String>,
}

/// Single intent. Deserialization checks the amounts; `into_intent` checks
/// kind and date and enforces the per-action requirements.
#[derive(Debug, serde_derive::Deserialize)]
pub(crate) struct IntentModel {
    pub(crate) action: IntentActionModel,
    #[serde(default)]
    pub(crate) target_id: Option<EntryIdModel>,
    #[serde(default)]
    pub(crate) search_amount: Option<AmountModel>,
    #[serde(default)]
    pub(crate) data: Option<IntentDataModel>,
}

impl IntentModel {
    pub(crate) fn into_intent(
        self,
        reference_date: NaiveDate,
    ) -> Result<TransactionIntent, ServerError> {
        let data = self.data.unwrap_or_default();
        // Zero and blank values mean "not given".
        let amount = data.amount.map(|a| a.0).filter(|a| !a.is_zero());
        let description = data
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        let category = non_blank(data.category);
        let kind = non_blank(data.kind)
            .map(|k| EntryKind::from_str(&k))
            .transpose()?;
        let date: Option<NaiveDate> = non_blank(data.date)
            .map(|d| ISODateModel::from_str(&d))
            .transpose()?
            .map(Into::into);

        Ok(match self.action {
            IntentActionModel::Create => TransactionIntent {
                action: IntentAction::Create,
                target_id: None,
                search_amount: None,
                patch: EntryPatch {
                    kind: Some(kind.ok_or_else(|| IncompleteIntent::new("create", "kind"))?),
                    amount: Some(amount.ok_or_else(|| IncompleteIntent::new("create", "amount"))?),
                    description: Some(description.unwrap_or_default()),
                    category,
                    date: Some(date.unwrap_or(reference_date)),
                },
            },
            IntentActionModel::Edit => TransactionIntent {
                action: IntentAction::Edit,
                target_id: self
                    .target_id
                    .map(|id| id.0)
                    .filter(|id| *id != 0)
                    .map(LedgerEntryId),
                search_amount: self.search_amount.map(|a| a.0).filter(|a| !a.is_zero()),
                patch: EntryPatch {
                    kind,
                    amount,
                    description,
                    category,
                    date,
                },
            },
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
