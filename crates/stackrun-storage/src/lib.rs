//! stackrun-storage
//!
//! S3 operations used to stage templates. Thin wrapper around the AWS S3 SDK.

pub mod client;
pub mod error;
pub mod objects;
