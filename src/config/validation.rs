use crate::config::types::{Config, CustomExtractor, EngineConfig, FetcherConfig, OutputConfig};
use crate::extract::is_builtin_field;
use crate::ConfigError;
use regex::Regex;
use std::collections::HashSet;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_engine_config(&config.engine)?;
    validate_fetcher_config(&config.fetcher)?;
    validate_output_config(&config.output)?;
    validate_extractors(&config.extractors)?;
    Ok(())
}

/// Validates scheduling and traversal limits
fn validate_engine_config(config: &EngineConfig) -> Result<(), ConfigError> {
    if config.max_concurrent_jobs < 1 || config.max_concurrent_jobs > 64 {
        return Err(ConfigError::Validation(format!(
            "max_concurrent_jobs must be between 1 and 64, got {}",
            config.max_concurrent_jobs
        )));
    }

    if config.max_pages < 1 {
        return Err(ConfigError::Validation(
            "max_pages must be >= 1".to_string(),
        ));
    }

    if config.login_settle_ms > 60_000 {
        return Err(ConfigError::Validation(format!(
            "login_settle_ms must be <= 60000ms, got {}ms",
            config.login_settle_ms
        )));
    }

    Ok(())
}

/// Validates fetcher identity and timeouts
fn validate_fetcher_config(config: &FetcherConfig) -> Result<(), ConfigError> {
    // Validate crawler name: non-empty, alphanumeric + hyphens only
    if config.crawler_name.is_empty() {
        return Err(ConfigError::Validation(
            "crawler_name cannot be empty".to_string(),
        ));
    }

    if !config
        .crawler_name
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "crawler_name must contain only alphanumeric characters and hyphens, got '{}'",
            config.crawler_name
        )));
    }

    Url::parse(&config.contact_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid contact_url: {}", e)))?;

    validate_email(&config.contact_email)?;

    if config.request_timeout_secs == 0 || config.connect_timeout_secs == 0 {
        return Err(ConfigError::Validation(
            "request and connect timeouts must be at least one second".to_string(),
        ));
    }

    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.export_dir.trim().is_empty() {
        return Err(ConfigError::Validation(
            "export_dir cannot be empty".to_string(),
        ));
    }

    if config.download_prefix.trim().is_empty() {
        return Err(ConfigError::Validation(
            "download_prefix cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates user-defined field types
///
/// Names must be lowercase identifiers, unique, and must not shadow a
/// built-in field type. Patterns must compile.
fn validate_extractors(extractors: &[CustomExtractor]) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();

    for entry in extractors {
        let invalid = |message: String| ConfigError::InvalidExtractor {
            name: entry.name.clone(),
            message,
        };

        if entry.name.is_empty() {
            return Err(invalid("name cannot be empty".to_string()));
        }

        if !entry
            .name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
        {
            return Err(invalid(
                "name must contain only lowercase letters, digits and underscores".to_string(),
            ));
        }

        if is_builtin_field(&entry.name) {
            return Err(invalid("name shadows a built-in field type".to_string()));
        }

        if !seen.insert(entry.name.as_str()) {
            return Err(invalid("name is defined more than once".to_string()));
        }

        Regex::new(&entry.pattern).map_err(|e| invalid(e.to_string()))?;
    }

    Ok(())
}

/// Basic email validation
fn validate_email(email: &str) -> Result<(), ConfigError> {
    if email.is_empty() {
        return Err(ConfigError::Validation(
            "contact_email cannot be empty".to_string(),
        ));
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    };

    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    if !domain.contains('.') {
        return Err(ConfigError::Validation(format!(
            "Invalid email domain: '{}'",
            email
        )));
    }

    Ok(())
}
