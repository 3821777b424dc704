//! Domain error types
//!
//! This module defines error types specific to domain operations,
//! mostly validation failures of records arriving from the catalog.

use thiserror::Error;

/// Errors that can occur in domain operations
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Invalid owner identifier
    #[error("Invalid owner ID: {0}")]
    InvalidOwner(String),

    /// Invalid remote path format
    #[error("Invalid remote path: {0}")]
    InvalidRemotePath(String),

    /// Invalid file name (empty, contains separators, or traverses)
    #[error("Invalid filename: {0}")]
    InvalidFilename(String),

    /// Invalid collection name
    #[error("Invalid collection name: {0}")]
    InvalidCollection(String),

    /// Remote key does not match owner, collection and filename
    #[error("Remote path {actual} does not match expected {expected}")]
    RemotePathMismatch { expected: String, actual: String },

    /// Generic validation failure
    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}
