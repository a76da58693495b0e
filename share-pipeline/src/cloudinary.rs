//! Cloudinary as an asset host

use async_trait::async_trait;
use cloudinary_upload::{CloudinaryClient, CloudinaryError};

use crate::models::LocalImage;
use crate::upload::{AssetHost, HostError};

impl From<CloudinaryError> for HostError {
    fn from(err: CloudinaryError) -> Self {
        match err {
            CloudinaryError::TimeoutError => HostError::Timeout,
            CloudinaryError::NetworkError(msg) => HostError::Network(msg),
            CloudinaryError::JsonError(msg) => HostError::InvalidResponse(msg),
            CloudinaryError::ServerError { status, message } => {
                HostError::Rejected(format!("{} ({})", message, status))
            }
            CloudinaryError::ConfigError(msg) => HostError::Rejected(msg),
        }
    }
}

#[async_trait]
impl AssetHost for CloudinaryClient {
    fn target(&self) -> String {
        self.endpoint()
    }

    async fn upload(&self, image: &LocalImage) -> Result<String, HostError> {
        let uploaded = self
            .upload_image(image.data().to_vec(), &image.upload_name(), image.mime_type())
            .await?;
        Ok(uploaded.secure_url)
    }
}
