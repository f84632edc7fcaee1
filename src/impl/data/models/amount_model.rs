use std::str::FromStr;

use fractic_server_error::ServerError;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use crate::errors::InvalidLedgerAmount;

/// Non-negative amount, as produced by the extraction oracle. Accepts JSON
/// numbers or numeric strings ("25.50", "25,50", "R$ 1.234,56").
#[derive(Debug, PartialEq)]
pub(crate) struct AmountModel(pub Decimal);
impl FromStr for AmountModel {
    type Err = ServerError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw: String = s
            .trim()
            .trim_start_matches("R$")
            .chars()
            .filter(|c| !c.is_whitespace())
            .collect();
        // Whichever separator comes last is the decimal mark.
        let numeric_part = match (raw.rfind('.'), raw.rfind(',')) {
            (Some(dot), Some(comma)) if comma > dot => raw.replace('.', "").replace(',', "."),
            (_, Some(_)) if !raw.contains('.') => raw.replace(',', "."),
            _ => raw.replace(',', ""),
        };
        let amount = Decimal::from_str(&numeric_part)
            .map_err(|_| InvalidLedgerAmount::new(s))?;
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(InvalidLedgerAmount::new(s));
        }
        Ok(AmountModel(amount.normalize()))
    }
}
impl<'de> Deserialize<'de> for AmountModel {
    fn deserialize<D>(deserializer: D) -> Result<AmountModel, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let raw = match Value::deserialize(deserializer)? {
            Value::Number(n) => n.to_string(),
            Value::String(s) => s,
            other => {
                return Err(serde::de::Error::custom(format!(
                    "expected amount, found {other}"
                )))
            }
        };
        AmountModel::from_str(&raw).map_err(serde::de::Error::custom)
    }
}

impl Into<Decimal> for AmountModel {
    fn into(self) -> Decimal {
        self.0
    }
}
