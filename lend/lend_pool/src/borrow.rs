//! Borrow requests: grants, request state, and cancellation tickets.

use crate::id::{BorrowId, ResourceId};
use crate::pool::PoolInner;
use crate::resource::Resource;
use log::trace;
use parking_lot::Mutex;
use std::fmt;
use std::sync::{Arc, Weak};

/// A resource granted to a borrower
#[derive(Debug)]
pub struct Grant {
    /// The granted resource
    pub resource: Arc<Resource>,

    /// The identifier it is registered under
    pub id: ResourceId,
}

impl Grant {
    /// Release the granted resource back to its pool.
    pub fn release(&self) -> bool {
        self.resource.release()
    }
}

/// Lifecycle of a borrow request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BorrowState {
    /// Queued, waiting for a release
    Pending,

    /// Granted the named resource
    Granted(ResourceId),

    /// Withdrawn before it was granted, or dropped with its pool
    Cancelled,
}

/// Handle to a borrow request, used to inspect or cancel it.
///
/// Dropping the ticket does not cancel the request.
pub struct BorrowTicket {
    pub(crate) id: BorrowId,
    pub(crate) state: Arc<Mutex<BorrowState>>,
    pub(crate) pool: Weak<PoolInner>,
}

impl BorrowTicket {
    /// Identifier of the request.
    pub fn id(&self) -> BorrowId {
        self.id
    }

    /// Current state of the request.
    pub fn state(&self) -> BorrowState {
        self.state.lock().clone()
    }

    /// Whether the request is still waiting.
    pub fn is_pending(&self) -> bool {
        matches!(*self.state.lock(), BorrowState::Pending)
    }

    /// Whether the request has been granted.
    pub fn is_granted(&self) -> bool {
        matches!(*self.state.lock(), BorrowState::Granted(_))
    }

    /// Withdraw a pending request.
    ///
    /// Returns `true` if the request was still queued and has been removed;
    /// its callback will never run. A granted request is left untouched.
    pub fn cancel(&self) -> bool {
        match self.pool.upgrade() {
            Some(pool) => pool.cancel(self.id),
            None => false,
        }
    }
}

impl fmt::Debug for BorrowTicket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BorrowTicket")
            .field("id", &self.id)
            .field("state", &self.state())
            .finish()
    }
}

/// Cancels the wrapped request when dropped, unless it was granted
pub(crate) struct CancelOnDrop(pub(crate) BorrowTicket);

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        if self.0.is_pending() {
            self.0.cancel();
        }
    }
}

/// A grant in transit to an async borrower.
///
/// Dropped without being taken, it releases the resource back to the pool.
pub(crate) struct PendingGrant(Option<Grant>);

impl PendingGrant {
    pub(crate) fn new(grant: Grant) -> Self {
        Self(Some(grant))
    }

    pub(crate) fn take(&mut self) -> Option<Grant> {
        self.0.take()
    }
}

impl Drop for PendingGrant {
    fn drop(&mut self) {
        if let Some(grant) = self.0.take() {
            trace!("Grant of {} was never delivered, releasing", grant.id);
            grant.release();
        }
    }
}
