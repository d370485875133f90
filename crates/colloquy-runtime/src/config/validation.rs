//! Cross-field checks that the schema's types cannot express.

use super::error::{ConfigError, ConfigResult};
#[cfg(not(feature = "json-log"))]
use super::schema::LogFormat;
use super::schema::{ColloquyConfig, FsmConfig, IsolationMode, LogOutput, LoggingConfig};

/// Checks a loaded [`ColloquyConfig`] before anything is built from it.
pub fn validate_config(config: &ColloquyConfig) -> ConfigResult<()> {
    validate_fsm_config(&config.fsm)?;
    validate_logging_config(&config.logging)?;
    Ok(())
}

/// Validates conversation-state settings.
fn validate_fsm_config(config: &FsmConfig) -> ConfigResult<()> {
    if config.storage.is_empty() {
        return Err(ConfigError::missing_field("fsm.storage"));
    }

    let Some((scheme, _)) = config.storage.split_once("://") else {
        return Err(ConfigError::invalid_url(
            &config.storage,
            "storage URL must look like \"scheme://…\"",
        ));
    };

    // Redis isolation piggybacks on the storage connection string.
    if config.isolation == IsolationMode::Redis && !matches!(scheme, "redis" | "rediss") {
        return Err(ConfigError::validation(format!(
            "Redis isolation requires a redis:// storage URL, got \"{}\"",
            config.storage
        )));
    }

    Ok(())
}

/// Validates logging settings.
fn validate_logging_config(config: &LoggingConfig) -> ConfigResult<()> {
    if config.output == LogOutput::File && config.file_path.is_none() {
        return Err(ConfigError::missing_field("logging.file_path"));
    }

    #[cfg(not(feature = "json-log"))]
    if config.format == LogFormat::Json {
        return Err(ConfigError::validation(
            "JSON log format requires the \"json-log\" cargo feature",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_default_config() {
        let config = ColloquyConfig::default();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_storage_without_scheme() {
        let mut config = ColloquyConfig::default();
        config.fsm.storage = "memory".to_string();
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_validate_redis_isolation_needs_redis_storage() {
        let mut config = ColloquyConfig::default();
        config.fsm.isolation = IsolationMode::Redis;
        assert!(validate_config(&config).is_err());

        config.fsm.storage = "redis://127.0.0.1:6379".to_string();
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_validate_file_output_needs_path() {
        let mut config = ColloquyConfig::default();
        config.logging.output = LogOutput::File;
        assert!(matches!(
            validate_config(&config),
            Err(ConfigError::MissingField { .. })
        ));

        config.logging.file_path = Some("/tmp/colloquy.log".into());
        assert!(validate_config(&config).is_ok());
    }
}
