use super::{types::Config, ConfigError, SourceConfig};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - HTTP timeout is not 0
/// - Source base URLs are http(s)
/// - At least one source is enabled
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.http.timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "http.timeout_secs cannot be 0".to_string(),
        ));
    }

    validate_source("sources.hltb", &config.sources.hltb)?;
    validate_source("sources.completionator", &config.sources.completionator)?;

    if !config.sources.hltb.enabled && !config.sources.completionator.enabled {
        return Err(ConfigError::ValidationError(
            "at least one source must be enabled".to_string(),
        ));
    }

    Ok(())
}

fn validate_source(key: &str, source: &SourceConfig) -> Result<(), ConfigError> {
    let url = source.base_url.as_str();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ConfigError::ValidationError(format!(
            "{}.base_url must start with http:// or https://, got {:?}",
            key, url
        )));
    }
    Ok(())
}
