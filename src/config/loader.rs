//! Configuration loading.
//!
//! Reads a TOML file, deserializes it into [`ShareConfig`], then runs the
//! semantic validation pass. A missing file is an error here; callers that
//! want "use defaults when absent" check for the file first.

use std::path::Path;

use crate::config::schema::ShareConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid configuration: {}", format_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn format_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Load and validate configuration from a TOML file.
pub fn load_config(path: &Path) -> Result<ShareConfig, ConfigError> {
    let raw = std::fs::read_to_string(path)?;
    let config: ShareConfig = toml::from_str(&raw)?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn empty_file_yields_defaults() {
        let file = write_config("");
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8000");
        assert_eq!(config.rate_limit.max_requests, 80);
    }

    #[test]
    fn partial_section_keeps_other_defaults() {
        let file = write_config(
            r#"
            [rate_limit]
            max_requests = 10
            "#,
        );
        let config = load_config(file.path()).unwrap();
        assert_eq!(config.rate_limit.max_requests, 10);
        assert_eq!(config.rate_limit.window_secs, 60);
    }

    #[test]
    fn invalid_toml_is_a_parse_error() {
        let file = write_config("not = [valid");
        assert!(matches!(
            load_config(file.path()),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn semantic_failure_is_a_validation_error() {
        let file = write_config(
            r#"
            [access]
            allowed_networks = ["10.0.0.0/99"]
            "#,
        );
        assert!(matches!(
            load_config(file.path()),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let missing = Path::new("/nonexistent/lanshare.toml");
        assert!(matches!(load_config(missing), Err(ConfigError::Io(_))));
    }
}
