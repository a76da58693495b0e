use cloudinary_upload::CloudinaryConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::AppError;

/// Environment variable that overrides `cloudinary.api_secret`
pub const API_SECRET_ENV: &str = "CLOUDINARY_API_SECRET";

/// Where share links point and how uploads fan out
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ShareSettings {
    /// Page address the `?data=` parameter is appended to
    pub base_url: String,
    #[serde(default)]
    pub max_concurrent: Option<usize>,
}

/// Application configuration (treeshare.toml)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AppConfig {
    pub share: ShareSettings,
    pub cloudinary: CloudinaryConfig,
}

impl AppConfig {
    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    /// Reads, overrides from the environment and validates a config file
    pub fn load(path: &Path) -> Result<Self, AppError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            AppError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let mut config = Self::from_toml(&raw)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?;
        config.apply_env(std::env::var(API_SECRET_ENV).ok());
        config.validate()?;
        log::debug!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn apply_env(&mut self, api_secret: Option<String>) {
        if let Some(secret) = api_secret.filter(|s| !s.is_empty()) {
            self.cloudinary.api_secret = Some(secret);
        }
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.share.base_url.trim().is_empty() {
            return Err(AppError::Config("share.base_url must not be empty".to_string()));
        }
        if self.cloudinary.cloud_name.trim().is_empty() {
            return Err(AppError::Config(
                "cloudinary.cloud_name must not be empty".to_string(),
            ));
        }
        let has_preset = self
            .cloudinary
            .upload_preset
            .as_deref()
            .is_some_and(|p| !p.is_empty());
        if !has_preset && self.cloudinary.credentials().is_none() {
            return Err(AppError::Config(
                "set cloudinary.upload_preset or both api_key and api_secret".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [share]
        base_url = "https://tree.example.com/"
        max_concurrent = 4

        [cloudinary]
        cloud_name = "demo"
        upload_preset = "tree_preset"
        folder = "trees"
    "#;

    #[test]
    fn test_from_toml_with_defaults() {
        let config = AppConfig::from_toml(SAMPLE).unwrap();
        assert_eq!(config.share.max_concurrent, Some(4));
        assert_eq!(config.cloudinary.cloud_name, "demo");
        assert_eq!(config.cloudinary.api_base, cloudinary_upload::DEFAULT_API_BASE);
        assert_eq!(config.cloudinary.timeout_secs, 60);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_requires_identity() {
        let mut config = AppConfig::from_toml(SAMPLE).unwrap();
        config.cloudinary.upload_preset = None;
        assert!(matches!(config.validate(), Err(AppError::Config(_))));

        config.cloudinary.api_key = Some("key".to_string());
        config.apply_env(Some("secret".to_string()));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_requires_base_url() {
        let mut config = AppConfig::from_toml(SAMPLE).unwrap();
        config.share.base_url = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("treeshare.toml");
        std::fs::write(&path, SAMPLE).unwrap();

        let config = AppConfig::load(&path).unwrap();
        assert_eq!(config.share.base_url, "https://tree.example.com/");

        let missing = AppConfig::load(&dir.path().join("missing.toml"));
        assert!(matches!(missing, Err(AppError::Config(_))));
    }
}
