use crate::config::types::{CacheConfig, Config, CrawlerConfig, SearchConfig};
use crate::search::presets;
use crate::ConfigError;
use regex::Regex;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_cache_config(&config.cache)?;
    validate_search_config(&config.search)?;
    Ok(())
}

/// Validates crawler configuration
///
/// Zero limits are allowed and disable that kind of descent.
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if !config.timeout_secs.is_finite() || config.timeout_secs <= 0.0 {
        return Err(ConfigError::Validation(format!(
            "timeout-secs must be positive, got {}",
            config.timeout_secs
        )));
    }

    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user-agent cannot be empty".to_string(),
        ));
    }

    for ext in &config.valid_extensions {
        if !ext.starts_with('.') || ext.len() < 2 {
            return Err(ConfigError::Validation(format!(
                "valid-extensions entries must look like '.html', got '{}'",
                ext
            )));
        }
    }

    Ok(())
}

/// Validates cache configuration
fn validate_cache_config(config: &CacheConfig) -> Result<(), ConfigError> {
    if config.directory.trim().is_empty() {
        return Err(ConfigError::Validation(
            "cache directory cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validates search configuration
fn validate_search_config(config: &SearchConfig) -> Result<(), ConfigError> {
    for name in &config.presets {
        if presets::preset(name).is_none() {
            return Err(ConfigError::Validation(format!(
                "unknown preset '{}', expected one of {:?}",
                name,
                presets::PRESET_NAMES
            )));
        }
        if config.patterns.contains_key(name) {
            return Err(ConfigError::Validation(format!(
                "pattern '{}' is defined both as preset and as explicit pattern",
                name
            )));
        }
    }

    if config.patterns.is_empty() && config.presets.is_empty() {
        return Err(ConfigError::Validation(
            "at least one search pattern or preset is required".to_string(),
        ));
    }

    for (name, pattern) in &config.patterns {
        Regex::new(pattern)
            .map_err(|e| ConfigError::InvalidPattern(format!("{}: {}", name, e)))?;
    }

    for pattern in &config.ranking {
        Regex::new(pattern)
            .map_err(|e| ConfigError::InvalidPattern(format!("ranking '{}': {}", pattern, e)))?;
    }

    for key in &config.stop_on_found {
        let known = config.patterns.contains_key(key) || config.presets.contains(key);
        if !known {
            return Err(ConfigError::Validation(format!(
                "stop-on-found key '{}' does not name a search pattern",
                key
            )));
        }
    }

    Ok(())
}
