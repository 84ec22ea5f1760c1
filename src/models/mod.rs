//! Value types shared by the facades and the storage clients.
//!
//! Request types mirror the storage SDK's own request vocabulary; `StoredFile`
//! is the domain record handed back to callers and serialized as JSON by the
//! HTTP layer.

pub mod acl;
pub mod listing;
pub mod requests;
pub mod stored_file;
