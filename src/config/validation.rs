use crate::config::types::{Config, CrawlerConfig, OutputConfig, RateLimitConfig, UserAgentConfig};
use crate::extract::SelectorMap;
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_crawler_config(&config.crawler)?;
    validate_rate_limit_config(&config.rate_limit)?;
    validate_user_agent_config(&config.user_agent)?;
    validate_output_config(&config.output)?;
    SelectorMap::with_overrides(&config.selectors)?;
    Ok(())
}

/// Validates crawler configuration
fn validate_crawler_config(config: &CrawlerConfig) -> Result<(), ConfigError> {
    // target_count >= 0 is always true for usize; 0 means discovery only
    for seed in config.seeds() {
        validate_listing_url(&seed)?;
    }

    for domain in &config.allowed_domains {
        validate_domain_string(domain)?;
    }

    if config.page_timeout_secs < 1 {
        return Err(ConfigError::Validation(format!(
            "page_timeout_secs must be >= 1, got {}",
            config.page_timeout_secs
        )));
    }

    if config.ready_timeout_secs > config.page_timeout_secs.saturating_mul(10) {
        return Err(ConfigError::Validation(format!(
            "ready_timeout_secs ({}) is unreasonably large compared to page_timeout_secs ({})",
            config.ready_timeout_secs, config.page_timeout_secs
        )));
    }

    Ok(())
}

/// Validates a listing seed URL
fn validate_listing_url(seed: &str) -> Result<(), ConfigError> {
    let url = Url::parse(seed)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid seed URL '{}': {}", seed, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "Seed URL '{}' must use HTTP or HTTPS",
            seed
        )));
    }

    Ok(())
}

/// Validates 429 backoff configuration
fn validate_rate_limit_config(config: &RateLimitConfig) -> Result<(), ConfigError> {
    if config.min_wait_ms > config.max_wait_ms {
        return Err(ConfigError::Validation(format!(
            "min_wait_ms ({}) must not exceed max_wait_ms ({})",
            config.min_wait_ms, config.max_wait_ms
        )));
    }

    if config.max_retries > 20 {
        return Err(ConfigError::Validation(format!(
            "max_retries must be <= 20, got {}",
            config.max_retries
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

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.directory.as_os_str().is_empty() {
        return Err(ConfigError::Validation(
            "output directory cannot be empty".to_string(),
        ));
    }

    for (key, name) in [
        ("ledger_file", &config.ledger_file),
        ("log_file", &config.log_file),
        ("records_file", &config.records_file),
    ] {
        validate_file_name(key, name)?;
    }

    if config.ledger_file == config.log_file
        || config.ledger_file == config.records_file
        || config.log_file == config.records_file
    {
        return Err(ConfigError::Validation(
            "ledger_file, log_file and records_file must be distinct".to_string(),
        ));
    }

    Ok(())
}

/// Output files live directly in the output directory
fn validate_file_name(key: &str, name: &str) -> Result<(), ConfigError> {
    if name.is_empty() || name == "." || name == ".." {
        return Err(ConfigError::Validation(format!(
            "{} must be a file name, got '{}'",
            key, name
        )));
    }

    if name.contains('/') || name.contains('\\') {
        return Err(ConfigError::Validation(format!(
            "{} must not contain path separators, got '{}'",
            key, name
        )));
    }

    Ok(())
}

/// Validates an allowed domain
fn validate_domain_string(domain: &str) -> Result<(), ConfigError> {
    if domain.is_empty() {
        return Err(ConfigError::Validation(
            "Allowed domain cannot be empty".to_string(),
        ));
    }

    if !domain
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-')
    {
        return Err(ConfigError::Validation(format!(
            "Domain '{}' contains invalid characters",
            domain
        )));
    }

    if domain.starts_with('.')
        || domain.ends_with('.')
        || domain.starts_with('-')
        || domain.ends_with('-')
    {
        return Err(ConfigError::Validation(format!(
            "Domain '{}' cannot start or end with '.' or '-'",
            domain
        )));
    }

    if domain.contains("..") {
        return Err(ConfigError::Validation(format!(
            "Domain '{}' cannot contain consecutive dots",
            domain
        )));
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
