//! Paisley: an async CouchDB client
//!
//! Speaks CouchDB's HTTP API over `reqwest`, with cookie-session
//! re-authentication and an optional read-through document cache.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use paisley::{ConnectOptions, CouchDB, MemoryCache, SessionAuthenticator};
//! use serde_json::json;
//!
//! #[tokio::main]
//! async fn main() -> paisley::Result<()> {
//!     let client = CouchDB::new(
//!         ConnectOptions::new("localhost", 5984)
//!             .with_auth("admin", "secret")
//!             .with_cache(Arc::new(MemoryCache::default()))
//!             .with_authenticator(Arc::new(SessionAuthenticator)),
//!     )?;
//!
//!     let db = client.bind_to_database("recipes");
//!     db.create().await?;
//!
//!     // Save a document under an explicit id
//!     let saved = db.save_doc(&json!({"title": "Soup"}), Some("soup")).await?;
//!     println!("Saved: {}", saved);
//!
//!     // Served from the network the first time, from the cache after that
//!     let doc = db.open_doc("soup").await?;
//!     println!("Opened: {}", doc);
//!
//!     let rev = saved["rev"].as_str().unwrap_or_default();
//!     db.delete_doc("soup", rev).await?;
//!
//!     Ok(())
//! }
//! ```

mod auth;
pub mod cache;
mod client;
mod database;
mod document;
mod error;
pub mod protocol;
pub mod query;
pub mod response;

pub use auth::{Authenticator, SessionAuthenticator};
pub use cache::{Cache, CacheStats, CachedObject, MemoryCache};
pub use client::{ConnectOptions, CouchDB, Request};
pub use database::{Database, OpenDocOptions, OpenedDoc};
pub use document::{add_attachments, add_views, FromDocument};
pub use error::{Error, Result};
pub use protocol::{Scheme, ServerVersion, DEFAULT_PORT, KEEPALIVE_INTERVAL, USER_AGENT};
pub use query::{ListDocOptions, ViewQuery};
pub use response::Body;

// Re-exported so callers can build a `Request` without depending on reqwest
pub use reqwest::Method;
