//! drive_upload - Upload local files to Google Drive.
//!
//! This library provides functionality to:
//! - Authenticate with a cached OAuth2 token (interactive first run)
//! - Resolve or create a slash-delimited Drive directory path
//! - List the files already present in a Drive folder
//! - Walk a local directory through a filter chain and upload what is new
//!
//! # Example
//!
//! ```no_run
//! use drive_upload::{split_path, Authenticator, DriveClient, OAuthConfig, ROOT_FOLDER_ID};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let auth =
//!         Authenticator::from_cache_or_prompt(OAuthConfig::default(), "auth.json".as_ref())
//!             .await?;
//!     let client = DriveClient::new(auth);
//!
//!     let segments = split_path("Fotos/2014");
//!     let folder_id = client.find_or_create_path(ROOT_FOLDER_ID, &segments).await?;
//!
//!     for file in client.list_files(&folder_id).await? {
//!         println!("{} {}", file.id, file.name);
//!     }
//!
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod client;
pub mod error;
pub mod models;
pub mod path;
pub mod walk;

// Re-exports for convenience
pub use auth::{Authenticator, OAuthConfig, StoredToken};
pub use client::{DriveClient, ROOT_FOLDER_ID};
pub use error::{DriveError, Result};
pub use models::FileMetadata;
pub use path::split_path;
pub use walk::{collect_files, FilterChain, FilterStage};
