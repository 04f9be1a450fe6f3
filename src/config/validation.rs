//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check endpoint URLs parse and addresses are well-formed
//! - Validate value ranges (timeouts > 0, gas > 0, chain id nonzero)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BuilderConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use alloy::primitives::Address;
use url::Url;

use crate::config::schema::BuilderConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    /// Dotted path of the offending field, e.g. `chain.rpc_url`.
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration, collecting every problem found.
pub fn validate_config(config: &BuilderConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    check_url(&mut errors, "chain.rpc_url", &config.chain.rpc_url);
    check_url(&mut errors, "beacon.url", &config.beacon.url);
    check_url(&mut errors, "relay.url", &config.relay.url);

    if config.chain.chain_id == 0 {
        push(&mut errors, "chain.chain_id", "must be nonzero");
    }
    if config.chain.rpc_timeout_secs == 0 {
        push(&mut errors, "chain.rpc_timeout_secs", "must be positive");
    }
    if config.chain.confirmation_timeout_secs == 0 {
        push(
            &mut errors,
            "chain.confirmation_timeout_secs",
            "must be positive",
        );
    }
    if config.relay.request_timeout_secs == 0 {
        push(&mut errors, "relay.request_timeout_secs", "must be positive");
    }

    if config.job.gas == 0 {
        push(&mut errors, "job.gas", "must be positive");
    }
    if config.job.gas_price_gwei == 0 {
        push(&mut errors, "job.gas_price_gwei", "must be positive");
    }

    check_address(&mut errors, "job.execution_node", &config.job.execution_node);
    if !config.job.builder_contract.is_empty() {
        check_address(
            &mut errors,
            "job.builder_contract",
            &config.job.builder_contract,
        );
    }
    for (i, peeker) in config.job.allowed_peekers.iter().enumerate() {
        check_address(&mut errors, &format!("job.allowed_peekers[{}]", i), peeker);
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn push(errors: &mut Vec<ValidationError>, field: &str, message: &str) {
    errors.push(ValidationError {
        field: field.to_string(),
        message: message.to_string(),
    });
}

fn check_url(errors: &mut Vec<ValidationError>, field: &str, value: &str) {
    if value.is_empty() {
        push(errors, field, "must be set");
    } else if value.parse::<Url>().is_err() {
        push(errors, field, "is not a valid URL");
    }
}

fn check_address(errors: &mut Vec<ValidationError>, field: &str, value: &str) {
    if value.is_empty() {
        push(errors, field, "must be set");
    } else if value.parse::<Address>().is_err() {
        push(errors, field, "is not a valid address");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::BuilderConfig;

    fn valid_config() -> BuilderConfig {
        let mut config = BuilderConfig::default();
        config.job.execution_node = "0x4E2B0c0e428AE1CDE26d5BcF17Ba83f447068E5B".to_string();
        config.job.builder_contract = "0x8f21B4E51e17B09AfA77b1ff87b6BcB26fDb0EA0".to_string();
        config
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(validate_config(&valid_config()).is_ok());
    }

    #[test]
    fn test_collects_all_errors() {
        let mut config = valid_config();
        config.chain.chain_id = 0;
        config.job.gas = 0;
        config.beacon.url = "not a url".to_string();

        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
        let fields: Vec<_> = errors.iter().map(|e| e.field.as_str()).collect();
        assert!(fields.contains(&"chain.chain_id"));
        assert!(fields.contains(&"job.gas"));
        assert!(fields.contains(&"beacon.url"));
    }

    #[test]
    fn test_rejects_malformed_address() {
        let mut config = valid_config();
        config.job.execution_node = "0x1234".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].field, "job.execution_node");
    }
}
