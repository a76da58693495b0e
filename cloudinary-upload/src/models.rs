use serde::{Deserialize, Serialize};

/// Public Cloudinary REST endpoint
pub const DEFAULT_API_BASE: &str = "https://api.cloudinary.com/v1_1";

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

/// Destination identity for uploads
///
/// Either `upload_preset` (unsigned) or `api_key` + `api_secret` (signed)
/// must be set. A preset may be combined with credentials.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    #[serde(default)]
    pub upload_preset: Option<String>,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default, skip_serializing)]
    pub api_secret: Option<String>,
    /// Target folder inside the media library
    #[serde(default)]
    pub folder: Option<String>,
    #[serde(default = "default_api_base")]
    pub api_base: String,
    /// Whole-request timeout; a timed out upload is reported as a failure
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl CloudinaryConfig {
    pub fn unsigned(cloud_name: &str, upload_preset: &str) -> Self {
        Self {
            cloud_name: cloud_name.to_string(),
            upload_preset: Some(upload_preset.to_string()),
            api_key: None,
            api_secret: None,
            folder: None,
            api_base: default_api_base(),
            timeout_secs: default_timeout_secs(),
        }
    }

    /// Credentials for a signed upload, if both halves are present
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.api_key.as_deref(), self.api_secret.as_deref()) {
            (Some(key), Some(secret)) if !key.is_empty() && !secret.is_empty() => {
                Some((key, secret))
            }
            _ => None,
        }
    }
}

/// Successful response of the image upload endpoint
///
/// Only the fields used by callers are modelled; Cloudinary sends more.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UploadResponse {
    pub public_id: String,
    pub secure_url: String,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub width: Option<u32>,
    #[serde(default)]
    pub height: Option<u32>,
    #[serde(default)]
    pub bytes: Option<u64>,
}

/// Error body returned by Cloudinary on non-success responses
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorResponse {
    pub error: ErrorMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorMessage {
    pub message: String,
}
