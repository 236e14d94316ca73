use crate::config::types::{Config, HttpConfig, IndexConfig, SearchConfig, SourceConfig};
use crate::ConfigError;
use regex::Regex;
use url::Url;

/// Bounds on how many candidates one result page may yield
pub const EXTRACT_LIMIT_RANGE: std::ops::RangeInclusive<usize> = 5..=50;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_source_config(&config.source)?;
    validate_http_config(&config.http)?;
    validate_search_config(&config.search)?;
    if let Some(index) = &config.index {
        validate_index_config(index)?;
    }
    if let Some(persistence) = &config.persistence {
        if persistence.database_path.is_empty() {
            return Err(ConfigError::Validation(
                "database_path cannot be empty".to_string(),
            ));
        }
    }
    Ok(())
}

fn validate_source_config(config: &SourceConfig) -> Result<(), ConfigError> {
    validate_http_url("base_url", &config.base_url)?;

    Regex::new(&config.detail_pattern)
        .map_err(|e| ConfigError::InvalidPattern(format!("{}: {}", config.detail_pattern, e)))?;

    if config.radius_km == 0 {
        return Err(ConfigError::Validation(
            "radius_km must be at least 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_http_config(config: &HttpConfig) -> Result<(), ConfigError> {
    if config.user_agent.trim().is_empty() {
        return Err(ConfigError::Validation(
            "user_agent cannot be empty".to_string(),
        ));
    }

    for (name, value) in [
        ("request_timeout_ms", config.request_timeout_ms),
        ("detail_timeout_ms", config.detail_timeout_ms),
        ("connect_timeout_ms", config.connect_timeout_ms),
    ] {
        if value < 100 {
            return Err(ConfigError::Validation(format!(
                "{} must be >= 100ms, got {}ms",
                name, value
            )));
        }
    }

    Ok(())
}

fn validate_search_config(config: &SearchConfig) -> Result<(), ConfigError> {
    if config.allowed_page_sizes.is_empty() {
        return Err(ConfigError::Validation(
            "allowed_page_sizes cannot be empty".to_string(),
        ));
    }

    if config.allowed_page_sizes.iter().any(|&size| size == 0) {
        return Err(ConfigError::Validation(
            "allowed_page_sizes must be positive".to_string(),
        ));
    }

    if !config
        .allowed_page_sizes
        .contains(&config.default_page_size)
    {
        return Err(ConfigError::Validation(format!(
            "default_page_size {} is not one of allowed_page_sizes {:?}",
            config.default_page_size, config.allowed_page_sizes
        )));
    }

    if !EXTRACT_LIMIT_RANGE.contains(&config.extract_limit) {
        return Err(ConfigError::Validation(format!(
            "extract_limit must be between 5 and 50, got {}",
            config.extract_limit
        )));
    }

    if config.ancestor_depth == 0 {
        return Err(ConfigError::Validation(
            "ancestor_depth must be at least 1".to_string(),
        ));
    }

    if config.min_acceptable_matches == 0 {
        return Err(ConfigError::Validation(
            "min_acceptable_matches must be at least 1".to_string(),
        ));
    }

    for (name, value) in [
        ("enrich_concurrency", config.enrich_concurrency),
        ("scrape_concurrency", config.scrape_concurrency),
    ] {
        if !(1..=16).contains(&value) {
            return Err(ConfigError::Validation(format!(
                "{} must be between 1 and 16, got {}",
                name, value
            )));
        }
    }

    if config.expansion_initial == 0 || config.expansion_initial > config.expansion_max {
        return Err(ConfigError::Validation(format!(
            "expansion_initial must be between 1 and expansion_max ({}), got {}",
            config.expansion_max, config.expansion_initial
        )));
    }

    if config.sample_size == 0 {
        return Err(ConfigError::Validation(
            "sample_size must be at least 1".to_string(),
        ));
    }

    Ok(())
}

fn validate_index_config(config: &IndexConfig) -> Result<(), ConfigError> {
    validate_http_url("index url", &config.url)?;

    if config.index_name.is_empty()
        || !config
            .index_name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(ConfigError::Validation(format!(
            "index_name must be non-empty and contain only alphanumerics, '-' or '_', got '{}'",
            config.index_name
        )));
    }

    Ok(())
}

fn validate_http_url(name: &str, value: &str) -> Result<(), ConfigError> {
    let url =
        Url::parse(value).map_err(|e| ConfigError::InvalidUrl(format!("{} '{}': {}", name, value, e)))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(ConfigError::InvalidUrl(format!(
            "{} '{}' must use http or https",
            name, value
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_base_url() {
        let mut config = Config::default();
        config.source.base_url = "ftp://auto.example.cz/".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));

        config.source.base_url = "not a url".to_string();
        assert!(matches!(validate(&config), Err(ConfigError::InvalidUrl(_))));
    }

    #[test]
    fn test_validate_detail_pattern() {
        let mut config = Config::default();
        config.source.detail_pattern = "/inzerat/(\\d+".to_string();
        assert!(matches!(
            validate(&config),
            Err(ConfigError::InvalidPattern(_))
        ));
    }

    #[test]
    fn test_validate_page_sizes() {
        let mut config = Config::default();
        config.search.default_page_size = 15;
        assert!(validate(&config).is_err());

        config.search.allowed_page_sizes = vec![];
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_extract_limit() {
        let mut config = Config::default();
        config.search.extract_limit = 4;
        assert!(validate(&config).is_err());
        config.search.extract_limit = 51;
        assert!(validate(&config).is_err());
        config.search.extract_limit = 50;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn test_validate_expansion_bounds() {
        let mut config = Config::default();
        config.search.expansion_initial = 60;
        assert!(validate(&config).is_err());
    }

    #[test]
    fn test_validate_index_name() {
        let mut config = Config::default();
        config.index = Some(IndexConfig {
            url: "http://127.0.0.1:7700".to_string(),
            index_name: "bad name".to_string(),
            api_key: None,
            timeout_ms: 500,
        });
        assert!(validate(&config).is_err());
    }
}
