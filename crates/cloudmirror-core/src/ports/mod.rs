//! Port definitions (hexagonal architecture interfaces)
//!
//! This module defines the port traits that form the boundaries of the
//! hexagonal architecture. Ports are interfaces that the sync core depends
//! on, but whose implementations live in adapter crates.
//!
//! ## Ports Overview
//!
//! - [`IRemoteCatalog`] - Remote object store holding the owner's files
//! - [`ISyncStateStore`] - Durable storage of the sync ledger
//! - [`IEventNotifier`] - Best-effort delivery of sync events to a consumer

pub mod notifier;
pub mod remote_catalog;
pub mod state_store;

pub use notifier::IEventNotifier;
pub use remote_catalog::IRemoteCatalog;
pub use state_store::ISyncStateStore;
