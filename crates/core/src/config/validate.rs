use super::{types::Config, ConfigError};

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - Searcher URL is an http(s) URL and the result limit is positive
/// - Per-call timeout is positive and no service client timeout exceeds it
/// - Empty-result TTL does not exceed the regular TTL
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    let url = config.searcher.url.trim();
    if !(url.starts_with("http://") || url.starts_with("https://")) {
        return Err(ConfigError::ValidationError(format!(
            "searcher.url must be an http(s) URL, got '{}'",
            config.searcher.url
        )));
    }

    if config.searcher.result_limit == 0 {
        return Err(ConfigError::ValidationError(
            "searcher.result_limit must be greater than 0".to_string(),
        ));
    }

    if config.addon.call_timeout_secs == 0 {
        return Err(ConfigError::ValidationError(
            "addon.call_timeout_secs must be greater than 0".to_string(),
        ));
    }

    let call_timeout = config.addon.call_timeout_secs;
    if config.searcher.timeout_secs > call_timeout {
        return Err(ConfigError::ValidationError(format!(
            "searcher.timeout_secs ({}) cannot exceed addon.call_timeout_secs ({})",
            config.searcher.timeout_secs, call_timeout
        )));
    }
    if let Some(debrid) = &config.debrid {
        if debrid.timeout_secs > call_timeout {
            return Err(ConfigError::ValidationError(format!(
                "debrid.timeout_secs ({}) cannot exceed addon.call_timeout_secs ({})",
                debrid.timeout_secs, call_timeout
            )));
        }
    }

    if config.cache.empty_ttl_secs > config.cache.ttl_secs {
        return Err(ConfigError::ValidationError(
            "cache.empty_ttl_secs cannot exceed cache.ttl_secs".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config_from_str;

    fn base_config() -> Config {
        load_config_from_str(
            r#"
[searcher]
url = "http://localhost:3333/graphql"
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(validate_config(&base_config()).is_ok());
    }

    #[test]
    fn test_validate_port_zero_fails() {
        let mut config = base_config();
        config.server.port = 0;
        let result = validate_config(&config);
        assert!(matches!(result, Err(ConfigError::ValidationError(_))));
    }

    #[test]
    fn test_validate_searcher_url_scheme() {
        let mut config = base_config();
        config.searcher.url = "localhost:3333".to_string();
        assert!(validate_config(&config).is_err());

        config.searcher.url = "https://bitmagnet.example/graphql".to_string();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_zero_limit_and_timeout() {
        let mut config = base_config();
        config.searcher.result_limit = 0;
        assert!(validate_config(&config).is_err());

        let mut config = base_config();
        config.addon.call_timeout_secs = 0;
        assert!(validate_config(&config).is_err());
    }

    #[test]
    fn test_validate_service_timeouts_bounded_by_call_timeout() {
        let mut config = base_config();
        config.addon.call_timeout_secs = 10;
        config.searcher.timeout_secs = 30;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::ValidationError(_))
        ));

        config.searcher.timeout_secs = 5;
        config.debrid = Some(crate::config::DebridConfig {
            api_key: "key".to_string(),
            base_url: None,
            timeout_secs: 11,
        });
        assert!(validate_config(&config).is_err());

        config.addon.call_timeout_secs = 11;
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_ttl_ordering() {
        let mut config = base_config();
        config.cache.ttl_secs = 60;
        config.cache.empty_ttl_secs = 120;
        assert!(validate_config(&config).is_err());
    }
}
