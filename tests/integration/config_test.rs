//! Integration tests for configuration management
//!
//! These tests verify that the configuration system works correctly
//! across module boundaries.

use hope_radio::audio::EngineConfig;
use hope_radio::config::{Settings, DEFAULT_STREAM_URL};
use std::error::Error;
use std::fs;
use std::time::Duration;
use tempfile::tempdir;

#[cfg(test)]
mod config_integration_tests {
    use super::*;

    /// Test complete configuration workflow
    #[test]
    fn test_config_lifecycle() -> Result<(), Box<dyn Error>> {
        let dir = tempdir()?;
        let config_path = dir.path().join("nested").join("config.json");

        let mut settings = Settings::default();
        settings.info_url = "https://info.example.com/currentsong".to_string();
        settings.metadata_poll_secs = 10;
        settings.max_source_retries = None;

        settings.validate()?;
        settings.save(&config_path)?;

        let loaded = Settings::load(&config_path)?;
        assert_eq!(loaded, settings);
        assert_eq!(loaded.metadata_poll_interval(), Duration::from_secs(10));
        assert_eq!(loaded.max_source_retries, None);

        let engine_config = EngineConfig::from(&loaded);
        assert_eq!(engine_config.stream_url, DEFAULT_STREAM_URL);
        assert_eq!(engine_config.max_source_retries, None);

        Ok(())
    }

    /// Partial files keep defaults for everything they omit
    #[test]
    fn test_partial_config_file() -> Result<(), Box<dyn Error>> {
        let dir = tempdir()?;
        let config_path = dir.path().join("config.json");
        fs::write(&config_path, r#"{ "idle_stop_secs": 60 }"#)?;

        let loaded = Settings::load(&config_path)?;
        assert_eq!(loaded.idle_stop_delay(), Duration::from_secs(60));
        assert_eq!(loaded.stream_url, DEFAULT_STREAM_URL);
        assert_eq!(loaded.max_source_retries, Some(5));
        Ok(())
    }

    /// Test invalid configuration handling
    #[test]
    fn test_invalid_config_validation() {
        let empty_url = Settings {
            stream_url: "".to_string(),
            ..Settings::default()
        };
        let result = empty_url.validate();
        assert!(result.is_err());
        if let Err(e) = result {
            assert!(e.to_string().contains("URL cannot be empty"));
        }

        let loud_duck = Settings {
            duck_volume: 1.5,
            ..Settings::default()
        };
        assert!(loud_duck.validate().is_err());

        let dir = tempdir().expect("temp dir");
        let broken = dir.path().join("config.json");
        fs::write(&broken, "{ not json").expect("write file");
        let err = Settings::load(&broken).expect_err("malformed file rejected");
        assert!(err.to_string().starts_with("Parse error"));
    }
}
