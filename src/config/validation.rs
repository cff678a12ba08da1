use crate::config::types::{
    Config, CrawlerConfig, ExtractionConfig, IndexConfig, SearchConfig, StorageConfig,
    UserAgentConfig,
};
use crate::url::LinkMatcher;
use crate::ConfigError;
use scraper::Selector;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_extraction_config(&config.extraction)?;
    validate_storage_config(&config.storage)?;
    validate_index_config(&config.index)?;
    validate_search_config(&config.search)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.max_urls < 1 {
        return Err(ConfigError::Validation(format!(
            "max_urls must be >= 1, got {}",
            config.max_urls
        )));
    }

    if config.request_timeout_secs < 1 || config.request_timeout_secs > 300 {
        return Err(ConfigError::Validation(format!(
            "request_timeout_secs must be between 1 and 300, got {}",
            config.request_timeout_secs
        )));
    }

    if config.accept_patterns.is_empty() {
        return Err(ConfigError::Validation(
            "accept_patterns must contain at least one pattern".to_string(),
        ));
    }

    // Surfaces the first pattern that does not compile
    LinkMatcher::new(&config.accept_patterns)?;

    Ok(())
}

/// Validates HTTP identification configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    if config.user_agent.contains(['\r', '\n']) {
        return Err(ConfigError::Validation(
            "user_agent must be a single line".to_string(),
        ));
    }

    if let Some(cookie) = &config.cookie {
        if cookie.contains(['\r', '\n']) {
            return Err(ConfigError::Validation(
                "cookie must be a single line".to_string(),
            ));
        }
    }

    Ok(())
}

/// Validates the extraction selectors
fn validate_extraction_config(config: &ExtractionConfig) -> Result<(), ConfigError> {
    for (name, selector) in [
        ("detail_selector", &config.detail_selector),
        ("content_selector", &config.content_selector),
    ] {
        Selector::parse(selector).map_err(|e| {
            ConfigError::Validation(format!("Invalid {} '{}': {:?}", name, selector, e))
        })?;
    }
    Ok(())
}

/// Validates record store configuration
fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }
    Ok(())
}

/// Validates index configuration
fn validate_index_config(config: &IndexConfig) -> Result<(), ConfigError> {
    if config.index_path.is_empty() {
        return Err(ConfigError::Validation(
            "index_path cannot be empty".to_string(),
        ));
    }

    if config.summary_length == 0 {
        return Err(ConfigError::Validation(
            "summary_length must be >= 1".to_string(),
        ));
    }

    Ok(())
}

/// Validates query defaults
fn validate_search_config(config: &SearchConfig) -> Result<(), ConfigError> {
    if config.page_size < 1 || config.page_size > 1000 {
        return Err(ConfigError::Validation(format!(
            "page_size must be between 1 and 1000, got {}",
            config.page_size
        )));
    }
    Ok(())
}
