use std::{str::FromStr, time::Duration};

use fractic_server_error::ServerError;
use iso_currency::Currency;

use crate::errors::{InvalidConfig, MissingConfig};

const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_ORACLE_TIMEOUT_SECONDS: u64 = 30;
const DEFAULT_WPPCONNECT_SESSION: &str = "financeiro-session";
const DEFAULT_HTTP_HOST: &str = "0.0.0.0";
const DEFAULT_HTTP_PORT: u16 = 8080;
const DEFAULT_DATABASE_POOL_SIZE: u32 = 5;
const DEFAULT_MESSAGE_WORKERS: usize = 1;
const DEFAULT_MESSAGE_QUEUE_CAPACITY: usize = 64;

/// Runtime settings, read from the process environment.
#[derive(Debug, Clone)]
pub struct BotConfig {
    pub database_url: String,
    pub database_pool_size: u32,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub oracle_timeout: Duration,
    pub wppconnect_url: String,
    pub wppconnect_session: String,
    pub wppconnect_token: Option<String>,
    pub http_bind: String,
    pub message_workers: usize,
    pub message_queue_capacity: usize,
    /// Currency used when displaying amounts.
    pub currency: Currency,
}

impl BotConfig {
    pub fn from_env() -> Result<Self, ServerError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ServerError> {
        let var = |name: &str| lookup(name).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let required = |name: &str| var(name).ok_or_else(|| MissingConfig::new(name));

        let http_bind = match (var("HTTP_BIND"), var("PORT")) {
            (Some(bind), _) => bind,
            (None, Some(port)) => format!("{DEFAULT_HTTP_HOST}:{}", parse::<u16>("PORT", &port)?),
            (None, None) => format!("{DEFAULT_HTTP_HOST}:{DEFAULT_HTTP_PORT}"),
        };
        let currency = match var("LEDGER_CURRENCY") {
            Some(code) => Currency::from_code(&code.to_uppercase())
                .ok_or_else(|| InvalidConfig::new("LEDGER_CURRENCY", &code))?,
            None => Currency::BRL,
        };

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            database_pool_size: optional(&var, "DATABASE_POOL_SIZE", DEFAULT_DATABASE_POOL_SIZE)?,
            gemini_api_key: required("GEMINI_API_KEY")?,
            gemini_model: var("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            oracle_timeout: Duration::from_secs(optional(
                &var,
                "ORACLE_TIMEOUT_SECONDS",
                DEFAULT_ORACLE_TIMEOUT_SECONDS,
            )?),
            wppconnect_url: required("WPPCONNECT_URL")?,
            wppconnect_session: var("WPPCONNECT_SESSION")
                .unwrap_or_else(|| DEFAULT_WPPCONNECT_SESSION.to_string()),
            wppconnect_token: var("WPPCONNECT_TOKEN"),
            http_bind,
            message_workers: positive(
                "MESSAGE_WORKERS",
                optional(&var, "MESSAGE_WORKERS", DEFAULT_MESSAGE_WORKERS)?,
            )?,
            message_queue_capacity: positive(
                "MESSAGE_QUEUE_CAPACITY",
                optional(&var, "MESSAGE_QUEUE_CAPACITY", DEFAULT_MESSAGE_QUEUE_CAPACITY)?,
            )?,
            currency,
        })
    }
}

fn parse<T: FromStr>(name: &str, value: &str) -> Result<T, ServerError> {
    value
        .parse::<T>()
        .map_err(|_| InvalidConfig::new(name, value))
}

fn optional<T: FromStr>(
    var: &impl Fn(&str) -> Option<String>,
    name: &str,
    default: T,
) -> Result<T, ServerError> {
    match var(name) {
        Some(value) => parse(name, &value),
        None => Ok(default),
    }
}

fn positive(name: &str, value: usize) -> Result<usize, ServerError> {
    if value == 0 {
        return Err(InvalidConfig::new(name, "0"));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<BotConfig, ServerError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        BotConfig::from_lookup(|name| vars.get(name).cloned())
    }

    const REQUIRED: [(&str, &str); 3] = [
        ("DATABASE_URL", "postgres://localhost/ledger"),
        ("GEMINI_API_KEY", "key"),
        ("WPPCONNECT_URL", "http://localhost:21465"),
    ];

    #[test]
    fn test_defaults() {
        let config = config(&REQUIRED).unwrap();
        assert_eq!(config.gemini_model, "gemini-2.5-flash");
        assert_eq!(config.oracle_timeout, Duration::from_secs(30));
        assert_eq!(config.wppconnect_session, "financeiro-session");
        assert_eq!(config.wppconnect_token, None);
        assert_eq!(config.http_bind, "0.0.0.0:8080");
        assert_eq!(config.message_workers, 1);
        assert_eq!(config.message_queue_capacity, 64);
        assert_eq!(config.currency, Currency::BRL);
    }

    #[test]
    fn test_missing_required_variable() {
        assert!(config(&REQUIRED[1..]).is_err());
        let mut blank = REQUIRED.to_vec();
        blank[1] = ("GEMINI_API_KEY", "  ");
        assert!(config(&blank).is_err());
    }

    #[test]
    fn test_port_and_overrides() {
        let mut vars = REQUIRED.to_vec();
        vars.extend([("PORT", "3000"), ("MESSAGE_WORKERS", "4"), ("LEDGER_CURRENCY", "usd")]);
        let config = config(&vars).unwrap();
        assert_eq!(config.http_bind, "0.0.0.0:3000");
        assert_eq!(config.message_workers, 4);
        assert_eq!(config.currency, Currency::USD);
    }

    #[test]
    fn test_invalid_values() {
        for (name, value) in [
            ("MESSAGE_WORKERS", "0"),
            ("MESSAGE_QUEUE_CAPACITY", "many"),
            ("PORT", "99999"),
            ("LEDGER_CURRENCY", "XYZ1"),
        ] {
            let mut vars = REQUIRED.to_vec();
            vars.push((name, value));
            assert!(config(&vars).is_err(), "{name}={value}");
        }
    }
}
