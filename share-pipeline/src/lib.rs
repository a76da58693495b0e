//! # Share Pipeline
//!
//! Turns a set of locally selected photos into one shareable link, without
//! any server-side session storage.
//!
//! This crate provides:
//! - Ingestion of selected files into ordered in-memory images
//! - Concurrent upload of a batch to an asset host, with progress and
//!   first-failure propagation
//! - A stateless token format that packs the ordered asset URLs into the link
//! - A small state machine (`Idle -> Uploading -> Encoding -> Ready | Failed`)
//!   observable through a `tokio::sync::watch` channel
//!
//! ## Example Usage
//!
//! ```rust,ignore
//! use share_pipeline::{load_images, SharePipeline, UploadConfig, UploadOrchestrator};
//!
//! let images = load_images(&paths).await?;
//! let orchestrator = UploadOrchestrator::new(host, UploadConfig::default());
//! let pipeline = SharePipeline::new(orchestrator, "https://tree.example.com/");
//! let link = pipeline.share(images).await?;
//! ```

pub mod ingest;
pub mod models;
pub mod pipeline;
pub mod token;
pub mod upload;

#[cfg(feature = "cloudinary")]
pub mod cloudinary;

pub use ingest::{load_images, IngestError, IngestResult};
pub use models::{
    BatchCounts, LocalImage, PipelineState, TaskState, UploadBatch, UploadProgress, UploadTask,
};
pub use pipeline::{open_shared, SharePipeline, ShareError};
pub use token::{decode_token, encode_urls, ShareLink, TokenError, SHARE_PARAM};
pub use upload::{AssetHost, HostError, UploadConfig, UploadError, UploadOrchestrator, UploadResult};
