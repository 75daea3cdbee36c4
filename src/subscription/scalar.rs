//! Subscription for a single value known at construction.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::Result;
use crate::protocol::{FusionMode, QueueSubscription, Subscriber, Subscription, SubscriptionRef};
use crate::tracing_compat::trace;

use super::validate::valid_request;

/// The subscriber is only held while the value is pending; delivery, poll
/// and cancel all release it.
enum ScalarState<T> {
    Pending(T, Arc<dyn Subscriber<T>>),
    Delivered,
    Cancelled,
}

/// Emits one pre-known value on the first valid request, then completes.
///
/// The value leaves exactly once, by whichever comes first: a push through
/// [`request`](Subscription::request) or a pull through
/// [`poll`](QueueSubscription::poll). Synchronous fusion is granted on
/// request since the value is already there.
///
/// # Example
///
/// ```
/// use backflow::subscription::ScalarSubscription;
/// use backflow::test_utils::RecordingSubscriber;
///
/// let sub = RecordingSubscriber::new().requesting(1).into_arc();
/// ScalarSubscription::subscribe(sub.clone(), "hello");
/// assert_eq!(sub.values(), vec!["hello"]);
/// assert_eq!(sub.completions(), 1);
/// ```
pub struct ScalarSubscription<T> {
    state: Mutex<ScalarState<T>>,
}

impl<T: Send + 'static> ScalarSubscription<T> {
    /// Creates a subscription that will hand `value` to `subscriber`.
    #[must_use]
    pub fn new(subscriber: Arc<dyn Subscriber<T>>, value: T) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(ScalarState::Pending(value, subscriber)),
        })
    }

    /// Creates the subscription and installs it on `subscriber`.
    pub fn subscribe(subscriber: Arc<dyn Subscriber<T>>, value: T) -> Arc<Self> {
        let subscription = Self::new(Arc::clone(&subscriber), value);
        subscriber.on_subscribe(SubscriptionRef::Fuseable(
            Arc::clone(&subscription) as Arc<dyn QueueSubscription<T>>
        ));
        subscription
    }
}

impl<T> ScalarSubscription<T> {
    fn take(&self) -> Option<(T, Arc<dyn Subscriber<T>>)> {
        let mut state = self.state.lock();
        match std::mem::replace(&mut *state, ScalarState::Delivered) {
            ScalarState::Pending(value, subscriber) => Some((value, subscriber)),
            ScalarState::Delivered => None,
            ScalarState::Cancelled => {
                *state = ScalarState::Cancelled;
                None
            }
        }
    }

    /// Returns `true` once the value has been pushed, polled or cancelled.
    #[must_use]
    pub fn is_delivered(&self) -> bool {
        !matches!(*self.state.lock(), ScalarState::Pending(..))
    }

    /// Returns `true` if the subscription was cancelled.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(*self.state.lock(), ScalarState::Cancelled)
    }
}

impl<T: Send> Subscription for ScalarSubscription<T> {
    fn request(&self, n: i64) -> Result<()> {
        valid_request(n)?;
        let Some((value, subscriber)) = self.take() else {
            return Ok(());
        };
        trace!("scalar push delivery");
        subscriber.on_next(value);
        // on_next may have cancelled us
        if self.is_cancelled() {
            trace!("scalar completion suppressed by cancel");
        } else {
            subscriber.on_complete();
        }
        Ok(())
    }

    fn cancel(&self) {
        let dropped = std::mem::replace(&mut *self.state.lock(), ScalarState::Cancelled);
        drop(dropped);
    }
}

impl<T: Send> QueueSubscription<T> for ScalarSubscription<T> {
    fn request_fusion(&self, mode: FusionMode) -> FusionMode {
        let granted = if mode.wants_sync() {
            FusionMode::SYNC
        } else {
            FusionMode::NONE
        };
        trace!(requested = %mode, granted = %granted, "scalar fusion negotiated");
        granted
    }

    fn poll(&self) -> Option<T> {
        let (value, _subscriber) = self.take()?;
        trace!("scalar poll delivery");
        Some(value)
    }

    fn is_empty(&self) -> bool {
        self.is_delivered()
    }

    fn len(&self) -> usize {
        usize::from(!self.is_delivered())
    }

    fn clear(&self) {
        drop(self.take());
    }
}

impl<T> fmt::Debug for ScalarSubscription<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match *self.state.lock() {
            ScalarState::Pending(..) => "pending",
            ScalarState::Delivered => "delivered",
            ScalarState::Cancelled => "cancelled",
        };
        f.debug_struct("ScalarSubscription")
            .field("state", &state)
            .finish_non_exhaustive()
    }
}
