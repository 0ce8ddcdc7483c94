//! Fixed-capacity pool of exclusive-use resources.
//!
//! The pool creates all of its resources up front and never grows or
//! shrinks. A borrow is granted immediately when a resource is free;
//! otherwise the borrower joins a single FIFO queue and is granted the next
//! resource that is released. One release grants at most one waiter.
//!
//! Grant callbacks always run after the pool lock has been dropped, so a
//! callback may borrow or release again.

use crate::borrow::{BorrowState, BorrowTicket, CancelOnDrop, Grant, PendingGrant};
use crate::config::PoolConfig;
use crate::error::{PoolError, Result};
use crate::id::{BorrowId, ResourceId};
use crate::registry::ResourceRegistry;
use crate::resource::Resource;
use log::{debug, error, info, trace};
use parking_lot::Mutex;
use serde::Serialize;
use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tokio::sync::oneshot;

type GrantCallback = Box<dyn FnOnce(Arc<Resource>, ResourceId) + Send + 'static>;

type Handoff = Box<dyn FnOnce()>;

thread_local! {
    /// Hand-offs triggered by releases nested inside a running hand-off
    static HANDOFFS: RefCell<Option<VecDeque<Handoff>>> = RefCell::new(None);
}

/// Statistics about a resource pool
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    /// Borrows granted without waiting
    pub immediate_grants: u64,

    /// Borrows granted after waiting for a release
    pub deferred_grants: u64,

    /// Releases handled by the pool
    pub releases: u64,

    /// Pending borrows withdrawn before a grant
    pub cancellations: u64,

    /// Largest number of borrowers waiting at once
    pub peak_waiters: usize,
}

/// A borrower waiting for a release
struct Waiter {
    id: BorrowId,
    state: Arc<Mutex<BorrowState>>,
    on_granted: GrantCallback,
    queued_at: Instant,
}

/// Mutable pool state, guarded by a single lock
struct PoolState {
    /// Free identifiers; the top of the stack is granted next
    free: Vec<ResourceId>,

    /// Lent-out identifiers, in grant order
    outstanding: Vec<ResourceId>,

    /// Borrowers waiting for a release, oldest first
    waiters: VecDeque<Waiter>,

    stats: PoolStats,
}

pub(crate) struct PoolInner {
    config: PoolConfig,
    total: usize,
    registry: ResourceRegistry,
    state: Mutex<PoolState>,
    next_borrow: AtomicU64,
}

/// A pool of reusable resources
///
/// Cloning the pool yields another handle to the same resources.
#[derive(Clone)]
pub struct ResourcePool {
    inner: Arc<PoolInner>,
}

impl ResourcePool {
    /// Create a pool of `count` resources named with the default prefix.
    ///
    /// A negative count is rejected with [`PoolError::Configuration`].
    pub fn new(count: i64) -> Result<Self> {
        Self::with_config(PoolConfig::with_size(count))
    }

    /// Create a pool from a configuration.
    pub fn with_config(config: PoolConfig) -> Result<Self> {
        let total = config.validate()?;
        info!("Initializing resource pool with {} resources", total);

        let inner = Arc::new_cyclic(|weak_pool: &Weak<PoolInner>| {
            let mut registry = ResourceRegistry::with_capacity(total);
            let mut free = Vec::with_capacity(total);

            for sequence in 1..=total {
                let id = ResourceId::from_sequence(&config.id_prefix, sequence);
                let resource = Arc::new(Resource::new(id.clone()));

                let pool = weak_pool.clone();
                resource.on_release(move |released| {
                    if let Some(pool) = pool.upgrade() {
                        pool.handle_release(released.id());
                    }
                });

                registry.register(id.clone(), resource);
                free.push(id);
            }

            PoolInner {
                config,
                total,
                registry,
                state: Mutex::new(PoolState {
                    free,
                    outstanding: Vec::with_capacity(total),
                    waiters: VecDeque::new(),
                    stats: PoolStats::default(),
                }),
                next_borrow: AtomicU64::new(1),
            }
        });

        debug!("Resource pool initialized with {} resources", inner.registry.len());
        Ok(Self { inner })
    }

    /// Request a resource.
    ///
    /// `on_granted` runs exactly once with the granted resource and its
    /// identifier: before `borrow` returns if a resource is free, otherwise
    /// from inside the `release` call that frees one. When that release was
    /// itself made from a grant callback, the next callback runs once the
    /// current one returns. The returned ticket can cancel the request while
    /// it is pending.
    pub fn borrow<F>(&self, on_granted: F) -> BorrowTicket
    where
        F: FnOnce(Arc<Resource>, ResourceId) + Send + 'static,
    {
        let id = BorrowId(self.inner.next_borrow.fetch_add(1, Ordering::Relaxed));
        let state = Arc::new(Mutex::new(BorrowState::Pending));
        let ticket = BorrowTicket {
            id,
            state: Arc::clone(&state),
            pool: Arc::downgrade(&self.inner),
        };

        let mut pool_state = self.inner.state.lock();
        let next_free = pool_state.free.pop();
        match next_free {
            Some(resource_id) => {
                let resource = self.inner.lend(&mut pool_state, resource_id.clone());
                pool_state.stats.immediate_grants += 1;
                *state.lock() = BorrowState::Granted(resource_id.clone());
                drop(pool_state);

                debug!("{} granted {} immediately", id, resource_id);
                on_granted(resource, resource_id);
            }
            None => {
                pool_state.waiters.push_back(Waiter {
                    id,
                    state,
                    on_granted: Box::new(on_granted),
                    queued_at: Instant::now(),
                });
                let waiting = pool_state.waiters.len();
                pool_state.stats.peak_waiters = pool_state.stats.peak_waiters.max(waiting);
                drop(pool_state);

                debug!("{} queued, {} borrowers waiting", id, waiting);
            }
        }

        ticket
    }

    /// Take a free resource without waiting.
    pub fn try_borrow(&self) -> Result<Grant> {
        let mut state = self.inner.state.lock();
        let id = state.free.pop().ok_or(PoolError::Exhausted)?;
        let resource = self.inner.lend(&mut state, id.clone());
        state.stats.immediate_grants += 1;
        drop(state);

        debug!("{} granted without waiting", id);
        Ok(Grant { resource, id })
    }

    /// Wait for a resource.
    ///
    /// Dropping the returned future withdraws the request. A resource granted
    /// after the future was dropped is released back to the pool.
    pub async fn acquire(&self) -> Result<Grant> {
        let (sender, receiver) = oneshot::channel();
        let ticket = self.borrow(move |resource, id| {
            // Undelivered grants release themselves when dropped
            let _ = sender.send(PendingGrant::new(Grant { resource, id }));
        });
        let _guard = CancelOnDrop(ticket);

        let mut pending = receiver.await.map_err(|_| PoolError::PoolClosed)?;
        pending.take().ok_or(PoolError::PoolClosed)
    }

    /// Wait for a resource for at most `timeout`.
    pub async fn acquire_timeout(&self, timeout: Duration) -> Result<Grant> {
        match tokio::time::timeout(timeout, self.acquire()).await {
            Ok(result) => result,
            Err(_) => Err(PoolError::Timeout(timeout)),
        }
    }

    /// Number of resources available for an immediate grant.
    pub fn capacity(&self) -> usize {
        self.inner.state.lock().free.len()
    }

    /// Configured number of resources.
    pub fn total_count(&self) -> usize {
        self.inner.total
    }

    /// Identifiers currently lent out, in grant order.
    pub fn outstanding(&self) -> Vec<ResourceId> {
        self.inner.state.lock().outstanding.clone()
    }

    /// Number of borrowers waiting for a release.
    pub fn waiting_count(&self) -> usize {
        self.inner.state.lock().waiters.len()
    }

    /// Snapshot of the pool statistics.
    pub fn stats(&self) -> PoolStats {
        self.inner.state.lock().stats.clone()
    }

    /// Look up a resource by identifier.
    pub fn resource(&self, id: &ResourceId) -> Result<Arc<Resource>> {
        self.inner.registry.get(id).map(Arc::clone)
    }

    /// The registry holding every resource of this pool.
    pub fn registry(&self) -> &ResourceRegistry {
        &self.inner.registry
    }

    /// The configuration this pool was built from.
    pub fn config(&self) -> &PoolConfig {
        &self.inner.config
    }
}

impl fmt::Debug for ResourcePool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.lock();
        f.debug_struct("ResourcePool")
            .field("total", &self.inner.total)
            .field("capacity", &state.free.len())
            .field("outstanding", &state.outstanding)
            .field("waiting", &state.waiters.len())
            .finish()
    }
}

impl PoolInner {
    /// Move `id` to the outstanding list and mark its resource as lent out.
    fn lend(&self, state: &mut PoolState, id: ResourceId) -> Arc<Resource> {
        let resource = Arc::clone(self.lookup(&id));
        if !resource.mark_borrowed() {
            self.invariant_violation(format!("{} granted while already lent out", id));
        }
        state.outstanding.push(id);
        self.check_conservation(state);
        resource
    }

    /// React to the release signal of a lent-out resource.
    fn handle_release(&self, id: &ResourceId) {
        let mut state = self.state.lock();
        let position = match state.outstanding.iter().position(|o| o == id) {
            Some(position) => position,
            None => self.invariant_violation(format!("release of {} which is not lent out", id)),
        };
        state.outstanding.remove(position);
        state.stats.releases += 1;

        let next_waiter = state.waiters.pop_front();
        match next_waiter {
            Some(waiter) => {
                let resource = self.lend(&mut state, id.clone());
                state.stats.deferred_grants += 1;
                *waiter.state.lock() = BorrowState::Granted(id.clone());
                drop(state);

                debug!(
                    "{} granted {} after waiting {:?}",
                    waiter.id,
                    id,
                    waiter.queued_at.elapsed()
                );
                let id = id.clone();
                run_handoff(Box::new(move || (waiter.on_granted)(resource, id)));
            }
            None => {
                state.free.push(id.clone());
                self.check_conservation(&state);
                trace!("{} returned to the free set", id);
            }
        }
    }

    /// Remove a pending borrow from the queue.
    pub(crate) fn cancel(&self, id: BorrowId) -> bool {
        let mut state = self.state.lock();
        let Some(position) = state.waiters.iter().position(|w| w.id == id) else {
            return false;
        };
        let removed = state.waiters.remove(position);
        state.stats.cancellations += 1;
        drop(state);

        if let Some(waiter) = removed {
            *waiter.state.lock() = BorrowState::Cancelled;
            debug!("{} cancelled", waiter.id);
        }
        true
    }

    fn lookup(&self, id: &ResourceId) -> &Arc<Resource> {
        match self.registry.get(id) {
            Ok(resource) => resource,
            Err(e) => self.invariant_violation(e.to_string()),
        }
    }

    fn check_conservation(&self, state: &PoolState) {
        let accounted = state.free.len() + state.outstanding.len();
        if accounted != self.total {
            self.invariant_violation(format!(
                "{} free + {} outstanding != {} total",
                state.free.len(),
                state.outstanding.len(),
                self.total
            ));
        }
    }

    fn invariant_violation(&self, message: String) -> ! {
        error!("Resource pool invariant violated: {}", message);
        panic!("resource pool invariant violated: {}", message);
    }
}

/// Run a deferred grant callback.
///
/// A callback that releases its resource triggers the next hand-off from
/// inside this one. Nested hand-offs are queued on the current thread and
/// run by the outermost call in order, so the stack stays flat however many
/// borrowers are waiting.
fn run_handoff(handoff: Handoff) {
    let mut handoff = Some(handoff);
    HANDOFFS.with(|queue| {
        if let Some(queue) = queue.borrow_mut().as_mut() {
            queue.extend(handoff.take());
        }
    });
    let Some(first) = handoff else {
        return;
    };

    let _draining = DrainGuard::start();
    let mut next = Some(first);
    while let Some(handoff) = next {
        handoff();
        next = HANDOFFS.with(|queue| queue.borrow_mut().as_mut().and_then(VecDeque::pop_front));
    }
}

/// Marks the current thread as draining hand-offs until dropped
struct DrainGuard;

impl DrainGuard {
    fn start() -> Self {
        HANDOFFS.with(|queue| *queue.borrow_mut() = Some(VecDeque::new()));
        DrainGuard
    }
}

impl Drop for DrainGuard {
    fn drop(&mut self) {
        // Only non-empty if a callback panicked
        let leftover = HANDOFFS.with(|queue| queue.borrow_mut().take());
        drop(leftover);
    }
}

impl Drop for PoolInner {
    fn drop(&mut self) {
        let waiters: Vec<Waiter> = self.state.get_mut().waiters.drain(..).collect();
        if !waiters.is_empty() {
            debug!("Dropping resource pool with {} waiting borrowers", waiters.len());
        }
        for waiter in waiters {
            *waiter.state.lock() = BorrowState::Cancelled;
        }
    }
}
