//! Facades over an object-storage bucket.
//!
//! `BucketService` bundles four small services (upload, download,
//! information, modification) that each forward to a `StorageClient`.
//! The binary in `main.rs` serves them over HTTP.

pub mod client;
pub mod config;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use client::{ClientError, MemoryStorageClient, S3StorageClient, StorageClient};
pub use models::stored_file::StoredFile;
pub use services::{BucketError, BucketResult, BucketService};
