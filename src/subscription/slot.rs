//! Single-assignment holder for an upstream subscription.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::Result;
use crate::protocol::Subscription;

use super::cancelled::{cancelled, is_cancelled_sentinel};
use super::validate::validate_subscription;

/// The upstream link of an operator: set once, then terminated into the
/// cancelled sentinel.
///
/// The lock is never held while calling into a subscription, so `cancel`
/// and `request` may re-enter the slot.
#[derive(Default)]
pub struct SubscriptionSlot {
    current: Mutex<Option<Arc<dyn Subscription>>>,
}

impl SubscriptionSlot {
    /// Creates an empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Installs `incoming` if the slot is empty.
    ///
    /// Follows [`validate_subscription`]: a slot that was already terminated
    /// cancels `incoming` and returns `Ok(false)`; a slot holding a live
    /// subscription cancels `incoming` and fails.
    pub fn set_once(&self, incoming: Arc<dyn Subscription>) -> Result<bool> {
        let existing = {
            let mut current = self.current.lock();
            if current.is_none() {
                *current = Some(incoming);
                return Ok(true);
            }
            current.clone()
        };
        validate_subscription(existing.as_ref(), Some(&incoming))
    }

    /// Replaces the content with the cancelled sentinel and cancels what was
    /// there. Returns `false` if the slot had already been terminated.
    pub fn terminate(&self) -> bool {
        let previous = {
            let mut current = self.current.lock();
            if current.as_ref().is_some_and(is_cancelled_sentinel) {
                return false;
            }
            current.replace(cancelled())
        };
        if let Some(upstream) = previous {
            upstream.cancel();
        }
        true
    }

    /// Returns `true` once [`terminate`](Self::terminate) has run.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.current.lock().as_ref().is_some_and(is_cancelled_sentinel)
    }

    /// Returns the held subscription, if any.
    #[must_use]
    pub fn get(&self) -> Option<Arc<dyn Subscription>> {
        self.current.lock().clone()
    }

    /// Forwards a request to the held subscription. A no-op while empty.
    pub fn request(&self, n: i64) -> Result<()> {
        match self.get() {
            Some(upstream) => upstream.request(n),
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for SubscriptionSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = match self.current.lock().as_ref() {
            None => "empty",
            Some(s) if is_cancelled_sentinel(s) => "cancelled",
            Some(_) => "set",
        };
        f.debug_struct("SubscriptionSlot").field("state", &state).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FlowError;
    use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingUpstream {
        requested: AtomicI64,
        cancels: AtomicUsize,
    }

    impl Subscription for CountingUpstream {
        fn request(&self, n: i64) -> Result<()> {
            self.requested.fetch_add(n, Ordering::SeqCst);
            Ok(())
        }

        fn cancel(&self) {
            self.cancels.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn set_once_then_duplicate() {
        let slot = SubscriptionSlot::new();
        let first = Arc::new(CountingUpstream::default());
        let second = Arc::new(CountingUpstream::default());

        assert_eq!(slot.set_once(first.clone()), Ok(true));
        assert_eq!(
            slot.set_once(second.clone()),
            Err(FlowError::SubscriptionAlreadySet)
        );
        assert_eq!(second.cancels.load(Ordering::SeqCst), 1);
        assert_eq!(first.cancels.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn terminate_cancels_once() {
        let slot = SubscriptionSlot::new();
        let upstream = Arc::new(CountingUpstream::default());
        slot.set_once(upstream.clone()).expect("first set");

        assert!(slot.terminate());
        assert!(!slot.terminate());
        assert!(slot.is_cancelled());
        assert_eq!(upstream.cancels.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn set_after_terminate_is_dropped() {
        let slot = SubscriptionSlot::new();
        assert!(slot.terminate());
        let late = Arc::new(CountingUpstream::default());
        assert_eq!(slot.set_once(late.clone()), Ok(false));
        assert_eq!(late.cancels.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn request_forwards() {
        let slot = SubscriptionSlot::new();
        assert!(slot.request(3).is_ok());
        let upstream = Arc::new(CountingUpstream::default());
        slot.set_once(upstream.clone()).expect("first set");
        slot.request(2).expect("forwarded");
        slot.request(5).expect("forwarded");
        assert_eq!(upstream.requested.load(Ordering::SeqCst), 7);
    }

    #[test]
    fn debug_reports_state() {
        let slot = SubscriptionSlot::new();
        assert!(format!("{slot:?}").contains("empty"));
        slot.set_once(Arc::new(CountingUpstream::default())).expect("first set");
        assert!(format!("{slot:?}").contains("set"));
        slot.terminate();
        assert!(format!("{slot:?}").contains("cancelled"));
    }
}
