//! cloudmirror Core - Domain types and port definitions
//!
//! This crate contains the hexagonal architecture core with:
//! - **Domain entities** - `FileRecord`, `SyncState`, `TransferTask`, `SyncEvent`
//! - **Port definitions** - Traits for adapters: `IRemoteCatalog`, `ISyncStateStore`,
//!   `IEventNotifier`
//! - **Configuration** - YAML-backed settings shared by the engine and the CLI
//!
//! # Architecture
//!
//! The domain module contains pure bookkeeping logic with no I/O.
//! Ports define trait interfaces that adapter crates implement
//! (`cloudmirror-catalog`, `cloudmirror-state`, `cloudmirror-notify`).
//! The sync engine in `cloudmirror-sync` orchestrates domain entities
//! through those ports.

pub mod config;
pub mod domain;
pub mod ports;
