//! Client core for the block service.
//!
//! Provides:
//! - A typed HTTP client for the block API (auth, capture, fetch)
//! - The hash-diff sync coordinator that keeps the local store current
//!   while fetching only blocks whose content fingerprint changed
//! - Configuration and the client error taxonomy

pub mod api_client;
pub mod config;
pub mod coordinator;
pub mod error;

pub use api_client::{ApiClient, AuthSession, RegisterRequest};
pub use config::ClientConfig;
pub use coordinator::SyncCoordinator;
pub use error::{ClientError, ClientResult};
