use crate::config::types::{
    Config, CrawlerConfig, FetcherConfig, RankSettings, StorageConfig, UserAgentConfig,
};
use crate::ConfigError;
use url::Url;

/// Upper bound on the per-search fetch budget
const MAX_BUDGET: u32 = 100_000;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_fetcher_config(&config.fetcher)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_storage_config(&config.storage)?;
    validate_rank_settings(&config.rank)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    if config.budget < 1 || config.budget > MAX_BUDGET {
        return Err(ConfigError::Validation(format!(
            "budget must be between 1 and {}, got {}",
            MAX_BUDGET, config.budget
        )));
    }

    if !config.search_url.contains("{term}") {
        return Err(ConfigError::Validation(format!(
            "search_url must contain a {{term}} placeholder, got '{}'",
            config.search_url
        )));
    }

    let probe = config.search_url.replace("{term}", "probe");
    let url = Url::parse(&probe)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid search_url: {}", e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "search_url must use HTTP or HTTPS, got '{}'",
            url.scheme()
        )));
    }

    if !config.content_prefix.starts_with('/') {
        return Err(ConfigError::Validation(format!(
            "content_prefix must start with '/', got '{}'",
            config.content_prefix
        )));
    }

    if let Some(bad) = config
        .excluded_prefixes
        .iter()
        .find(|prefix| !prefix.starts_with('/'))
    {
        return Err(ConfigError::Validation(format!(
            "excluded prefix must start with '/', got '{}'",
            bad
        )));
    }

    Ok(())
}

/// Validates fetcher configuration
fn validate_fetcher_config(config: &FetcherConfig) -> Result<(), ConfigError> {
    if config.timeout < 1 {
        return Err(ConfigError::Validation(format!(
            "timeout must be >= 1s, got {}s",
            config.timeout
        )));
    }

    if config.max_attempts < 1 || config.max_attempts > 10 {
        return Err(ConfigError::Validation(format!(
            "max_attempts must be between 1 and 10, got {}",
            config.max_attempts
        )));
    }

    Ok(())
}

/// Validates user agent configuration
fn validate_user_agent_config(config: &UserAgentConfig) -> Result<(), ConfigError> {
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

    Ok(())
}

/// Validates storage configuration
fn validate_storage_config(config: &StorageConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database_path cannot be empty".to_string(),
        ));
    }

    Ok(())
}

/// Validates rank engine settings
fn validate_rank_settings(config: &RankSettings) -> Result<(), ConfigError> {
    if !(config.damping > 0.0 && config.damping < 1.0) {
        return Err(ConfigError::Validation(format!(
            "damping must be strictly between 0 and 1, got {}",
            config.damping
        )));
    }

    if !(config.tolerance > 0.0) {
        return Err(ConfigError::Validation(format!(
            "tolerance must be positive, got {}",
            config.tolerance
        )));
    }

    if config.max_iterations < 1 {
        return Err(ConfigError::Validation(
            "max_iterations must be >= 1".to_string(),
        ));
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

    let parts: Vec<&str> = email.split('@').collect();
    if parts.len() != 2 {
        return Err(ConfigError::Validation(format!(
            "Invalid email format: '{}'",
            email
        )));
    }

    let local = parts[0];
    let domain = parts[1];

    if local.is_empty() || domain.is_empty() {
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
