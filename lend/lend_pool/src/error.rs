//! Error types for the resource pool.

use crate::id::ResourceId;
use std::time::Duration;
use thiserror::Error;

/// Errors returned by pool construction, lookup and borrowing.
#[derive(Error, Debug)]
pub enum PoolError {
    /// The pool configuration was rejected before any resource was created
    #[error("invalid pool configuration: {0}")]
    Configuration(String),

    /// No resource is registered under the given identifier
    #[error("resource not registered: {0}")]
    UnknownResource(ResourceId),

    /// No resource is free for an immediate grant
    #[error("resource pool exhausted")]
    Exhausted,

    /// A waiting borrower was not granted a resource in time
    #[error("timeout after {0:?} waiting for resource")]
    Timeout(Duration),

    /// The pool was dropped while a borrower was still waiting
    #[error("resource pool is closed")]
    PoolClosed,

    /// Reading a configuration file failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type used throughout the pool.
pub type Result<T> = std::result::Result<T, PoolError>;
