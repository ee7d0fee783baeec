use std::env;
use std::num::ParseIntError;
use std::time::Duration;

use thiserror::Error;

use crate::model::OperationType;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{key}: invalid timeout '{value}': {source}")]
    InvalidTimeout {
        key: &'static str,
        value: String,
        source: ParseIntError,
    },

    #[error("{key}: '{value}' is not a debit category")]
    InvalidCategory { key: &'static str, value: String },
}

/// Settlement tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SettlementConfig {
    /// Deadline for the atomic balance write. A settlement exceeding it fails as a whole.
    pub persist_timeout: Duration,
    /// Debit categories a payment settles. Their debits form a single
    /// queue, oldest first, regardless of category.
    pub categories: Vec<OperationType>,
}

impl Default for SettlementConfig {
    fn default() -> Self {
        Self {
            persist_timeout: Duration::from_secs(5),
            categories: vec![OperationType::Purchase],
        }
    }
}

impl SettlementConfig {
    pub const PERSIST_TIMEOUT_ENV: &'static str = "LEDGER_PERSIST_TIMEOUT_MS";
    pub const CATEGORIES_ENV: &'static str = "LEDGER_SETTLE_CATEGORIES";

    /// Defaults overridden by `LEDGER_PERSIST_TIMEOUT_MS` and
    /// `LEDGER_SETTLE_CATEGORIES` (comma-separated names) when set.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        if let Some(value) = lookup(Self::PERSIST_TIMEOUT_ENV) {
            let millis = value
                .trim()
                .parse::<u64>()
                .map_err(|source| ConfigError::InvalidTimeout {
                    key: Self::PERSIST_TIMEOUT_ENV,
                    value: value.clone(),
                    source,
                })?;
            config.persist_timeout = Duration::from_millis(millis);
        }
        if let Some(value) = lookup(Self::CATEGORIES_ENV) {
            config.categories = parse_categories(&value)?;
        }
        Ok(config)
    }

    pub fn with_persist_timeout(mut self, timeout: Duration) -> Self {
        self.persist_timeout = timeout;
        self
    }

    /// Payments never carry debt, so they are dropped from `categories`.
    pub fn with_categories(mut self, categories: impl IntoIterator<Item = OperationType>) -> Self {
        self.categories = categories.into_iter().filter(|c| c.is_debit()).collect();
        self
    }
}

fn parse_categories(value: &str) -> Result<Vec<OperationType>, ConfigError> {
    let invalid = |name: &str| ConfigError::InvalidCategory {
        key: SettlementConfig::CATEGORIES_ENV,
        value: name.to_string(),
    };

    let mut categories = Vec::new();
    for name in value.split(',').map(str::trim) {
        let category = OperationType::from_name(name)
            .filter(|c| c.is_debit())
            .ok_or_else(|| invalid(name))?;
        if !categories.contains(&category) {
            categories.push(category);
        }
    }
    Ok(categories)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(key: &'static str, value: &'static str) -> impl Fn(&str) -> Option<String> {
        move |k| (k == key).then(|| value.to_string())
    }

    #[test]
    fn defaults() {
        let config = SettlementConfig::default();
        assert_eq!(config.persist_timeout, Duration::from_secs(5));
        assert_eq!(config.categories, vec![OperationType::Purchase]);
    }

    #[test]
    fn timeout_from_lookup() {
        let config =
            SettlementConfig::from_lookup(lookup(SettlementConfig::PERSIST_TIMEOUT_ENV, " 250 "))
                .unwrap();
        assert_eq!(config.persist_timeout, Duration::from_millis(250));
    }

    #[test]
    fn missing_variable_keeps_default() {
        let config = SettlementConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, SettlementConfig::default());
    }

    #[test]
    fn invalid_timeout_is_rejected() {
        let err = SettlementConfig::from_lookup(lookup(
            SettlementConfig::PERSIST_TIMEOUT_ENV,
            "soon",
        ))
        .unwrap_err();
        assert!(err.to_string().contains("invalid timeout 'soon'"));
    }

    #[test]
    fn categories_from_lookup() {
        let config = SettlementConfig::from_lookup(lookup(
            SettlementConfig::CATEGORIES_ENV,
            "withdrawal, purchase,withdrawal",
        ))
        .unwrap();
        assert_eq!(
            config.categories,
            vec![OperationType::Withdrawal, OperationType::Purchase]
        );
        assert_eq!(config.persist_timeout, Duration::from_secs(5));
    }

    #[test]
    fn payment_or_unknown_category_is_rejected() {
        for value in ["purchase,payment", "refund", ""] {
            let err =
                SettlementConfig::from_lookup(lookup(SettlementConfig::CATEGORIES_ENV, value))
                    .unwrap_err();
            assert!(
                matches!(err, ConfigError::InvalidCategory { .. }),
                "accepted '{value}'"
            );
        }
    }

    #[test]
    fn payment_category_is_ignored() {
        let config = SettlementConfig::default()
            .with_categories([OperationType::Withdrawal, OperationType::Payment]);
        assert_eq!(config.categories, vec![OperationType::Withdrawal]);
    }
}
