#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

//! # Lend Pool
//!
//! A bounded pool of exclusive-use resources.
//!
//! The pool creates a fixed number of resources when it is built. Callers
//! borrow a resource and must release it explicitly; when no resource is
//! free, borrowers wait in FIFO order and each release hands the freed
//! resource to exactly one of them.
//!
//! ```
//! use lend_pool::ResourcePool;
//!
//! let pool = ResourcePool::new(2).unwrap();
//! pool.borrow(|resource, id| {
//!     println!("borrowed {}", id);
//!     resource.release();
//! });
//! assert_eq!(pool.capacity(), 2);
//! ```

/// Borrow requests, grants and cancellation tickets
pub mod borrow;

/// Pool configuration
pub mod config;

/// Error types
pub mod error;

/// Resource and borrow identifiers
pub mod id;

/// The resource pool
pub mod pool;

/// Identifier to resource lookup
pub mod registry;

/// Borrowable resources and release notification
pub mod resource;

pub use borrow::{BorrowState, BorrowTicket, Grant};
pub use config::{PoolConfig, DEFAULT_ID_PREFIX};
pub use error::{PoolError, Result};
pub use id::{BorrowId, ResourceId};
pub use pool::{PoolStats, ResourcePool};
pub use registry::ResourceRegistry;
pub use resource::{ListenerId, ReleaseListener, Resource};
