//! Deployment configuration.
//!
//! Loaded from `MINTLEDGER_*` environment variables or a JSON document.
//! Metadata and implementation have defaults; the supply limit and the four
//! role holders must be provided.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use mintledger_core::{Address, Amount, TokenId};
use mintledger_token::{DEFAULT_DECIMALS, INITIAL_IMPLEMENTATION, TokenMetadata};

pub const ENV_PREFIX: &str = "MINTLEDGER_";

pub const DEFAULT_TOKEN_NAME: &str = "MintLedger Token";
pub const DEFAULT_TOKEN_SYMBOL: &str = "MLT";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required setting {0}")]
    Missing(String),

    #[error("invalid value for {key}: {reason}")]
    Invalid { key: String, reason: String },

    #[error("invalid config document: {0}")]
    Json(#[from] serde_json::Error),
}

/// Holders of the four fixed roles granted at initialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignments {
    pub default_admin: Address,
    pub pauser: Address,
    pub minter: Address,
    pub upgrader: Address,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerConfig {
    /// Pin the token stream id; a fresh UUIDv7 is used when absent.
    #[serde(default)]
    pub token_id: Option<TokenId>,

    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_symbol")]
    pub symbol: String,

    #[serde(default = "default_decimals")]
    pub decimals: u8,

    #[serde(default = "default_implementation")]
    pub implementation: String,

    /// Whole tokens; scaled by `10^decimals` at initialization.
    pub max_supply_limit: Amount,

    pub roles: RoleAssignments,
}

fn default_name() -> String {
    DEFAULT_TOKEN_NAME.to_string()
}

fn default_symbol() -> String {
    DEFAULT_TOKEN_SYMBOL.to_string()
}

fn default_decimals() -> u8 {
    DEFAULT_DECIMALS
}

fn default_implementation() -> String {
    INITIAL_IMPLEMENTATION.to_string()
}

impl LedgerConfig {
    /// Read `MINTLEDGER_*` variables from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup (keys are full variable names, e.g. `MINTLEDGER_MINTER`).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |suffix: &str| {
            let key = format!("{ENV_PREFIX}{suffix}");
            lookup(&key).map(|v| (key, v))
        };
        let required = |suffix: &str| {
            get(suffix).ok_or_else(|| ConfigError::Missing(format!("{ENV_PREFIX}{suffix}")))
        };

        let token_id = get("TOKEN_ID").map(|(k, v)| parse(&k, &v)).transpose()?;
        let decimals = get("DECIMALS")
            .map(|(k, v)| parse(&k, &v))
            .transpose()?
            .unwrap_or(DEFAULT_DECIMALS);

        let (k, v) = required("MAX_SUPPLY_LIMIT")?;
        let max_supply_limit = parse(&k, &v)?;

        let role = |suffix: &str| -> Result<Address, ConfigError> {
            let (k, v) = required(suffix)?;
            parse(&k, &v)
        };
        let roles = RoleAssignments {
            default_admin: role("DEFAULT_ADMIN")?,
            pauser: role("PAUSER")?,
            minter: role("MINTER")?,
            upgrader: role("UPGRADER")?,
        };

        let config = Self {
            token_id,
            name: get("TOKEN_NAME").map(|(_, v)| v).unwrap_or_else(default_name),
            symbol: get("TOKEN_SYMBOL").map(|(_, v)| v).unwrap_or_else(default_symbol),
            decimals,
            implementation: get("IMPLEMENTATION")
                .map(|(_, v)| v)
                .unwrap_or_else(default_implementation),
            max_supply_limit,
            roles,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that initialization would reject anyway.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_supply_limit.is_zero() {
            return Err(invalid("max_supply_limit", "must be greater than zero"));
        }
        if self.max_supply_limit.scaled_by_decimals(self.decimals).is_none() {
            return Err(invalid(
                "max_supply_limit",
                format!("overflows when scaled by 10^{}", self.decimals),
            ));
        }
        self.metadata()
            .validate()
            .map_err(|e| invalid("metadata", e.to_string()))?;
        if self.implementation.trim().is_empty() {
            return Err(invalid("implementation", "cannot be empty"));
        }
        Ok(())
    }

    pub fn metadata(&self) -> TokenMetadata {
        TokenMetadata::new(self.name.clone(), self.symbol.clone(), self.decimals)
    }
}

fn parse<T>(key: &str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError::Invalid {
        key: key.to_string(),
        reason: e.to_string(),
    })
}

fn invalid(key: &str, reason: impl Into<String>) -> ConfigError {
    ConfigError::Invalid {
        key: key.to_string(),
        reason: reason.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (format!("{ENV_PREFIX}{k}"), v.to_string()))
            .collect()
    }

    fn full_env() -> HashMap<String, String> {
        env(&[
            ("MAX_SUPPLY_LIMIT", "1000"),
            ("DEFAULT_ADMIN", "0x1111111111111111111111111111111111111111"),
            ("PAUSER", "0x2222222222222222222222222222222222222222"),
            ("MINTER", "0x3333333333333333333333333333333333333333"),
            ("UPGRADER", "0x4444444444444444444444444444444444444444"),
        ])
    }

    #[test]
    fn env_with_defaults() {
        let vars = full_env();
        let config = LedgerConfig::from_lookup(|k| vars.get(k).cloned()).unwrap();

        assert_eq!(config.max_supply_limit, Amount::new(1000));
        assert_eq!(config.decimals, 18);
        assert_eq!(config.name, DEFAULT_TOKEN_NAME);
        assert_eq!(config.implementation, "v1");
        assert_eq!(config.roles.minter, Address::from_bytes([0x33; 20]));
        assert!(config.token_id.is_none());
    }

    #[test]
    fn missing_role_is_reported_by_name() {
        let mut vars = full_env();
        vars.remove("MINTLEDGER_UPGRADER");

        let err = LedgerConfig::from_lookup(|k| vars.get(k).cloned()).unwrap_err();
        assert!(matches!(err, ConfigError::Missing(ref k) if k == "MINTLEDGER_UPGRADER"));
    }

    #[test]
    fn zero_limit_and_bad_values_are_rejected() {
        let mut vars = full_env();
        vars.insert("MINTLEDGER_MAX_SUPPLY_LIMIT".into(), "0".into());
        assert!(matches!(
            LedgerConfig::from_lookup(|k| vars.get(k).cloned()),
            Err(ConfigError::Invalid { .. })
        ));

        let mut vars = full_env();
        vars.insert("MINTLEDGER_DECIMALS".into(), "eighteen".into());
        assert!(matches!(
            LedgerConfig::from_lookup(|k| vars.get(k).cloned()),
            Err(ConfigError::Invalid { ref key, .. }) if key == "MINTLEDGER_DECIMALS"
        ));
    }

    #[test]
    fn json_document() {
        let json = r#"{
            "symbol": "CUST",
            "max_supply_limit": "500",
            "roles": {
                "default_admin": "0x1111111111111111111111111111111111111111",
                "pauser": "0x2222222222222222222222222222222222222222",
                "minter": "0x3333333333333333333333333333333333333333",
                "upgrader": "0x4444444444444444444444444444444444444444"
            }
        }"#;

        let config = LedgerConfig::from_json_str(json).unwrap();
        assert_eq!(config.symbol, "CUST");
        assert_eq!(config.name, DEFAULT_TOKEN_NAME);
        assert_eq!(config.max_supply_limit, Amount::new(500));

        assert!(matches!(
            LedgerConfig::from_json_str("{}"),
            Err(ConfigError::Json(_))
        ));
    }
}
