//! # gitr-server
//!
//! Sync server for versioned AI conversation snapshots. Clients push a
//! branch's full file snapshot plus the conversation history, and pull the
//! latest snapshot back. Usable both as a standalone binary and as a library.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! gitr-server = { version = "0.1", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use gitr_server::server::{AppState, create_router};
//! use gitr_server::store::{SqliteStore, Store};
//!
//! let store = SqliteStore::new("./data/gitr.db")?;
//! store.initialize()?;
//!
//! let state = Arc::new(AppState::new(Arc::new(store)));
//! let router = create_router(state);
//! // Serve with axum...
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Includes CLI module. Disable with `default-features = false`.

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod error;
pub mod server;
pub mod store;
pub mod types;
