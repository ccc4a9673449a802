//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Check that addresses and network prefixes actually parse
//! - Validate value ranges (window > 0, limits > 0)
//!
//! # Design Decisions
//! - Returns all validation errors, not just the first
//! - Validation is a pure function: ShareConfig → Result<(), Vec<ValidationError>>
//! - Runs before the config is accepted into the system

use std::net::SocketAddr;

use crate::access::policy::parse_network;
use crate::config::schema::ShareConfig;

/// A single semantic validation failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: &str, message: impl Into<String>) -> Self {
        Self {
            field: field.to_string(),
            message: message.into(),
        }
    }
}

/// Validate a parsed configuration. Collects every failure.
pub fn validate_config(config: &ShareConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("not a valid socket address: {}", config.listener.bind_address),
        ));
    }
    if config.listener.request_timeout_secs == 0 {
        errors.push(ValidationError::new(
            "listener.request_timeout_secs",
            "must be greater than zero",
        ));
    }

    if config.access.allowed_networks.is_empty() {
        errors.push(ValidationError::new(
            "access.allowed_networks",
            "at least one network is required; the gate would deny everything",
        ));
    }
    for spec in &config.access.allowed_networks {
        if parse_network(spec).is_err() {
            errors.push(ValidationError::new(
                "access.allowed_networks",
                format!("not a valid CIDR block or address: {spec}"),
            ));
        }
    }
    for spec in &config.access.trusted_proxies {
        if parse_network(spec).is_err() {
            errors.push(ValidationError::new(
                "access.trusted_proxies",
                format!("not a valid CIDR block or address: {spec}"),
            ));
        }
    }

    if config.rate_limit.max_requests == 0 {
        errors.push(ValidationError::new(
            "rate_limit.max_requests",
            "must be greater than zero",
        ));
    }
    if config.rate_limit.window_secs == 0 {
        errors.push(ValidationError::new(
            "rate_limit.window_secs",
            "must be greater than zero",
        ));
    }

    if config.upload.max_upload_bytes == 0 {
        errors.push(ValidationError::new(
            "upload.max_upload_bytes",
            "must be greater than zero",
        ));
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!(
                "not a valid socket address: {}",
                config.observability.metrics_address
            ),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        assert!(validate_config(&ShareConfig::default()).is_ok());
    }

    #[test]
    fn bad_bind_address_is_reported() {
        let mut config = ShareConfig::default();
        config.listener.bind_address = "not-an-address".to_string();
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "listener.bind_address"));
    }

    #[test]
    fn bad_network_is_reported() {
        let mut config = ShareConfig::default();
        config.access.allowed_networks = vec!["192.168.1.x".to_string()];
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "access.allowed_networks"));
    }

    #[test]
    fn bad_trusted_proxy_is_reported() {
        let mut config = ShareConfig::default();
        config.access.trusted_proxies = vec!["proxy-one".to_string()];
        let errors = validate_config(&config).unwrap_err();
        assert!(errors.iter().any(|e| e.field == "access.trusted_proxies"));
    }

    #[test]
    fn zero_limits_are_reported() {
        let mut config = ShareConfig::default();
        config.rate_limit.max_requests = 0;
        config.rate_limit.window_secs = 0;
        config.upload.max_upload_bytes = 0;
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn collects_multiple_errors() {
        let mut config = ShareConfig::default();
        config.listener.bind_address = "nope".to_string();
        config.access.allowed_networks.clear();
        let errors = validate_config(&config).unwrap_err();
        assert_eq!(errors.len(), 2);
    }
}
