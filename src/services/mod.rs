//! The four bucket facades and the `BucketService` that bundles them.

pub mod bucket_service;
pub mod download_service;
pub mod error;
pub mod information_service;
pub mod modification_service;
pub mod upload_service;

pub use bucket_service::BucketService;
pub use download_service::DownloadService;
pub use error::{BucketError, BucketResult};
pub use information_service::InformationService;
pub use modification_service::ModificationService;
pub use upload_service::UploadService;
