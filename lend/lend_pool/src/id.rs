//! Identifiers handed out by the pool.
//!
//! Resource identifiers are opaque strings assigned once at pool
//! construction. Borrow identifiers name individual borrow requests so a
//! pending request can be found again when it is cancelled.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a pooled resource, of the form `prefix + sequence`.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceId(String);

impl ResourceId {
    /// Build the identifier for the `sequence`-th resource of a pool.
    ///
    /// # Examples
    ///
    /// ```
    /// use lend_pool::ResourceId;
    ///
    /// let id = ResourceId::from_sequence("resource-", 3);
    /// assert_eq!(id.as_str(), "resource-3");
    /// ```
    pub fn from_sequence(prefix: &str, sequence: usize) -> Self {
        Self(format!("{}{}", prefix, sequence))
    }

    /// The identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ResourceId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Identifier of a single borrow request, unique within one pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct BorrowId(pub(crate) u64);

impl BorrowId {
    /// The raw sequence number.
    pub fn as_u64(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for BorrowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "borrow#{}", self.0)
    }
}
