//! Recruit Sync - persistence for recruit trees
//!
//! Keeps one canonical [`recruit_tree::Tree`] per signed-in identity and
//! mirrors it to a remote document store:
//! - Edits apply locally at once and are pushed after a debounce window
//! - Inbound snapshots are settled before they are compared or adopted
//! - Echoes of our own pushes are recognised and dropped
//! - Identity changes tear the previous session down before the next starts
//!
//! Stores and identity providers are ports ([`RemoteStore`],
//! [`IdentityProvider`]); [`MemoryStore`] and [`JsonFileStore`] ship with the
//! crate.
//!
//! # Example
//!
//! ```rust,no_run
//! use recruit_sync::{Identity, MemoryStore, SyncConfig, SyncController};
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), recruit_sync::SyncError> {
//! let sync = SyncController::new(SyncConfig::new(), Arc::new(MemoryStore::new()));
//! sync.start_session(Identity::from("user-1")).await;
//! sync.wait_until_settled().await;
//!
//! let first = sync.tree().root().children()[0].clone();
//! sync.set_name(first.as_str(), "Alice")?;
//! sync.flush().await;
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
pub mod controller;
pub mod echo;
pub mod error;
mod fanout;
pub mod file_store;
pub mod identity;
pub mod memory;
pub mod session;
pub mod store;

pub use config::SyncConfig;
pub use controller::{SyncController, SyncStats};
pub use echo::EchoTracker;
pub use error::{AuthError, StoreError, SyncError};
pub use file_store::JsonFileStore;
pub use identity::{Identity, IdentityProvider};
pub use memory::MemoryStore;
pub use session::{allowed_transitions, validate_transition, SessionContext, SessionPhase};
pub use store::{DocumentKey, RemoteStore, Snapshot, Subscription, DEFAULT_DOCUMENT_NAME};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
