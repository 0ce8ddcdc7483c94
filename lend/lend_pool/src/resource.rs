//! A single borrowable resource and its release notifications.
//!
//! A resource is either lent out or released. Observers register a
//! listener with [`Resource::on_release`]; every registered listener is
//! called synchronously, in registration order, when a holder calls
//! [`Resource::release`].

use crate::id::ResourceId;
use log::{trace, warn};
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// A listener called when a resource is released
pub type ReleaseListener = Arc<dyn Fn(&Resource) + Send + Sync>;

/// Handle to a registered listener, used to remove it again
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

/// An exclusively held unit of capacity
pub struct Resource {
    /// Identifier assigned by the pool
    id: ResourceId,

    /// Whether the resource is currently not lent out
    released: AtomicBool,

    /// Registered listeners, in registration order
    listeners: Mutex<Vec<(ListenerId, ReleaseListener)>>,

    /// Next listener handle
    next_listener: AtomicU64,

    /// Number of releases that notified listeners
    release_count: AtomicU64,
}

impl Resource {
    /// Create a resource that is not lent out.
    pub fn new(id: ResourceId) -> Self {
        Self {
            id,
            released: AtomicBool::new(true),
            listeners: Mutex::new(Vec::new()),
            next_listener: AtomicU64::new(0),
            release_count: AtomicU64::new(0),
        }
    }

    /// The identifier this resource is registered under.
    pub fn id(&self) -> &ResourceId {
        &self.id
    }

    /// Whether the resource is currently released (not lent out).
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    /// Number of times a release has notified listeners.
    pub fn release_count(&self) -> u64 {
        self.release_count.load(Ordering::Relaxed)
    }

    /// Release the resource and notify every registered listener.
    ///
    /// Only the first call after a grant has an effect. Later calls log a
    /// warning, notify nobody, and return `false`.
    pub fn release(&self) -> bool {
        if self.released.swap(true, Ordering::AcqRel) {
            warn!("Resource {} is already released, ignoring release", self.id);
            return false;
        }
        self.release_count.fetch_add(1, Ordering::Relaxed);

        // Snapshot so a listener can register or remove listeners itself
        let listeners: Vec<ReleaseListener> = self
            .listeners
            .lock()
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect();

        trace!(
            "Resource {} released, notifying {} listeners",
            self.id,
            listeners.len()
        );
        for listener in listeners {
            listener(self);
        }
        true
    }

    /// Register a listener for the release signal.
    pub fn on_release<F>(&self, listener: F) -> ListenerId
    where
        F: Fn(&Resource) + Send + Sync + 'static,
    {
        let id = ListenerId(self.next_listener.fetch_add(1, Ordering::Relaxed));
        self.listeners.lock().push((id, Arc::new(listener)));
        id
    }

    /// Remove a previously registered listener.
    ///
    /// Returns `true` if the listener was still registered.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.lock();
        let before = listeners.len();
        listeners.retain(|(listener_id, _)| *listener_id != id);
        listeners.len() != before
    }

    /// Number of registered listeners.
    pub fn listener_count(&self) -> usize {
        self.listeners.lock().len()
    }

    /// Mark the resource as lent out. Returns whether it was released before.
    pub(crate) fn mark_borrowed(&self) -> bool {
        self.released.swap(false, Ordering::AcqRel)
    }
}

impl fmt::Debug for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Resource")
            .field("id", &self.id)
            .field("released", &self.is_released())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    fn borrowed(name: &str) -> Resource {
        let resource = Resource::new(ResourceId::from(name));
        assert!(resource.mark_borrowed());
        resource
    }

    #[test]
    fn test_new_resource_is_released() {
        let resource = Resource::new(ResourceId::from("resource-1"));
        assert!(resource.is_released());
        assert_eq!(resource.release_count(), 0);
    }

    #[test]
    fn test_release_notifies_in_registration_order() {
        let resource = borrowed("resource-1");
        let order = Arc::new(Mutex::new(Vec::new()));

        for n in 0..3 {
            let order = Arc::clone(&order);
            resource.on_release(move |r| order.lock().push((n, r.id().clone())));
        }

        assert!(!resource.is_released());
        assert!(resource.release());
        assert!(resource.is_released());

        let seen = order.lock();
        assert_eq!(seen.len(), 3);
        assert_eq!(seen.iter().map(|(n, _)| *n).collect::<Vec<_>>(), [0, 1, 2]);
        assert!(seen.iter().all(|(_, id)| id.as_str() == "resource-1"));
    }

    #[test]
    fn test_repeated_release_notifies_once() {
        let resource = borrowed("resource-1");
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        resource.on_release(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(resource.release());
        assert!(!resource.release());
        assert!(!resource.release());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(resource.release_count(), 1);

        // A new borrow cycle allows one more notification
        assert!(resource.mark_borrowed());
        assert!(resource.release());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_release_of_idle_resource_is_ignored() {
        let resource = Resource::new(ResourceId::from("resource-1"));
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        resource.on_release(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(!resource.release());
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_remove_listener() {
        let resource = borrowed("resource-1");
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let id = resource.on_release(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(resource.listener_count(), 1);
        assert!(resource.remove_listener(id));
        assert!(!resource.remove_listener(id));
        assert_eq!(resource.listener_count(), 0);

        resource.release();
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_listener_may_register_listeners() {
        let resource = Arc::new(borrowed("resource-1"));
        let inner = Arc::clone(&resource);
        resource.on_release(move |_| {
            inner.on_release(|_| {});
        });

        resource.release();
        assert_eq!(resource.listener_count(), 2);
    }
}
