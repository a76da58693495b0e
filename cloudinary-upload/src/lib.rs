//! # Cloudinary Upload
//!
//! A small client for the Cloudinary image upload API.
//!
//! This crate provides:
//! - Unsigned uploads through an upload preset
//! - Signed uploads (SHA-256 signature) when API credentials are configured
//! - Mapping of Cloudinary's JSON error bodies into typed errors
//!
//! ## Separation of Concerns
//!
//! This crate only talks to the asset host. It does **not**:
//! - Read files from disk (handled by the caller)
//! - Decide what to do when an upload fails (handled by the caller)
//! - Store returned URLs anywhere
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use cloudinary_upload::{CloudinaryClient, CloudinaryConfig};
//!
//! let config = CloudinaryConfig::unsigned("demo", "tree_preset");
//! let client = CloudinaryClient::new(config)?;
//! let uploaded = client.upload_image(bytes, "photo.jpg", "image/jpeg").await?;
//! println!("{}", uploaded.secure_url);
//! ```

pub mod models;
pub mod service;

pub use models::{CloudinaryConfig, UploadResponse, DEFAULT_API_BASE};
pub use service::{sign_params, CloudinaryClient, CloudinaryError};
