use crate::models::{CloudinaryConfig, ErrorResponse, UploadResponse};
use sha2::{Digest, Sha256};

/// Error type for upload operations
#[derive(Debug)]
pub enum CloudinaryError {
    ConfigError(String),
    NetworkError(String),
    TimeoutError,
    JsonError(String),
    ServerError { status: u16, message: String },
}

impl std::fmt::Display for CloudinaryError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CloudinaryError::ConfigError(msg) => write!(f, "Configuration error: {}", msg),
            CloudinaryError::NetworkError(msg) => write!(f, "Network error: {}", msg),
            CloudinaryError::TimeoutError => write!(f, "Upload timed out"),
            CloudinaryError::JsonError(msg) => write!(f, "JSON error: {}", msg),
            CloudinaryError::ServerError { status, message } => {
                write!(f, "Server returned status {}: {}", status, message)
            }
        }
    }
}

impl std::error::Error for CloudinaryError {}

impl From<reqwest::Error> for CloudinaryError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CloudinaryError::TimeoutError
        } else {
            CloudinaryError::NetworkError(err.to_string())
        }
    }
}

/// Computes a Cloudinary request signature
///
/// Parameters are sorted by name, joined as `name=value` with `&`, the
/// secret is appended and the result is hashed with SHA-256 (lowercase hex).
pub fn sign_params(params: &[(&str, String)], api_secret: &str) -> String {
    let mut sorted: Vec<&(&str, String)> = params.iter().collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let joined = sorted
        .iter()
        .map(|(name, value)| format!("{}={}", name, value))
        .collect::<Vec<_>>()
        .join("&");

    let digest = Sha256::digest(format!("{}{}", joined, api_secret).as_bytes());
    digest.iter().map(|b| format!("{:02x}", b)).collect()
}

/// Cloudinary upload client
///
/// Holds one configured `reqwest::Client`; cloning the service is cheap
/// because the inner client is reference counted.
#[derive(Clone)]
pub struct CloudinaryClient {
    config: CloudinaryConfig,
    http: reqwest::Client,
}

impl CloudinaryClient {
    /// Create a new client, validating the destination identity
    pub fn new(config: CloudinaryConfig) -> Result<Self, CloudinaryError> {
        if config.cloud_name.trim().is_empty() {
            return Err(CloudinaryError::ConfigError(
                "cloud_name must not be empty".to_string(),
            ));
        }
        let has_preset = config
            .upload_preset
            .as_deref()
            .is_some_and(|p| !p.is_empty());
        if !has_preset && config.credentials().is_none() {
            return Err(CloudinaryError::ConfigError(
                "either upload_preset or api_key and api_secret are required".to_string(),
            ));
        }

        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .connect_timeout(std::time::Duration::from_secs(10))
            .user_agent(concat!("cloudinary-upload/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| CloudinaryError::NetworkError(format!("Client build failed: {}", e)))?;

        Ok(Self { config, http })
    }

    pub fn config(&self) -> &CloudinaryConfig {
        &self.config
    }

    /// Upload endpoint for the configured cloud
    pub fn endpoint(&self) -> String {
        format!(
            "{}/{}/image/upload",
            self.config.api_base.trim_end_matches('/'),
            self.config.cloud_name
        )
    }

    /// Form fields sent next to the file, including the signature when
    /// credentials are configured
    fn form_fields(&self, timestamp: i64) -> Vec<(&'static str, String)> {
        let mut signed: Vec<(&'static str, String)> = Vec::new();
        if let Some(preset) = self.config.upload_preset.as_deref().filter(|p| !p.is_empty()) {
            signed.push(("upload_preset", preset.to_string()));
        }
        if let Some(folder) = self.config.folder.as_deref().filter(|f| !f.is_empty()) {
            signed.push(("folder", folder.to_string()));
        }

        let Some((api_key, api_secret)) = self.config.credentials() else {
            return signed;
        };

        signed.push(("timestamp", timestamp.to_string()));
        let signature = sign_params(&signed, api_secret);

        let mut fields = signed;
        fields.push(("api_key", api_key.to_string()));
        fields.push(("signature", signature));
        fields.push(("signature_algorithm", "sha256".to_string()));
        fields
    }

    /// Upload one image and return the stored asset description
    pub async fn upload_image(
        &self,
        data: Vec<u8>,
        file_name: &str,
        mime_type: &str,
    ) -> Result<UploadResponse, CloudinaryError> {
        let part = reqwest::multipart::Part::bytes(data)
            .file_name(file_name.to_string())
            .mime_str(mime_type)
            .map_err(|e| CloudinaryError::ConfigError(format!("Invalid MIME type: {}", e)))?;

        let mut form = reqwest::multipart::Form::new().part("file", part);
        for (name, value) in self.form_fields(chrono::Utc::now().timestamp()) {
            form = form.text(name, value);
        }

        let url = self.endpoint();
        log::debug!("Uploading {} to {}", file_name, url);

        let response = self.http.post(&url).multipart(form).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| {
                    status
                        .canonical_reason()
                        .unwrap_or("unknown error")
                        .to_string()
                });
            log::warn!("Upload of {} rejected ({}): {}", file_name, status, message);
            return Err(CloudinaryError::ServerError {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        let uploaded: UploadResponse = serde_json::from_str(&body)
            .map_err(|e| CloudinaryError::JsonError(format!("Failed to parse response: {}", e)))?;

        log::info!("Uploaded {} as {}", file_name, uploaded.public_id);
        Ok(uploaded)
    }
}
