//! Signing backend client
//!
//! Fetches a short-lived, object-scoped credential bundle for one upload.

pub mod operations;
pub mod types;

pub use operations::CredentialClient;
pub use types::{SignData, SignResponse};
