//! Hides an upstream's fusion capability from the downstream subscriber.

use std::fmt;
use std::sync::{Arc, Weak};

use parking_lot::Mutex;

use crate::error::{Result, StreamError};
use crate::protocol::{FusionMode, QueueSubscription, Subscriber, Subscription, SubscriptionRef};
use crate::tracing_compat::{trace, warn};

use super::slot::SubscriptionSlot;
use super::validate::valid_request;

/// Sits between an upstream and `actual`, forcing plain push delivery.
///
/// On `on_subscribe` it remembers the real upstream and hands itself to
/// `actual` instead, so whatever queue view the upstream offered is never
/// seen downstream. Signals pass through unchanged; `request` and `cancel`
/// go straight to the remembered upstream. Fusion negotiation on the
/// adapter always answers [`FusionMode::NONE`].
///
/// `actual` is released after the terminal signal or a `cancel`, which
/// breaks the reference cycle through the subscription it holds.
///
/// Use it where fusing would reorder work across an asynchronous boundary.
pub struct SuppressFusionSubscriber<T> {
    actual: Mutex<Option<Arc<dyn Subscriber<T>>>>,
    upstream: SubscriptionSlot,
    this: Weak<Self>,
}

impl<T: Send + 'static> SuppressFusionSubscriber<T> {
    /// Wraps `actual`.
    #[must_use]
    pub fn new(actual: Arc<dyn Subscriber<T>>) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            actual: Mutex::new(Some(actual)),
            upstream: SubscriptionSlot::new(),
            this: this.clone(),
        })
    }
}

impl<T> SuppressFusionSubscriber<T> {
    /// The upstream subscription received so far, if any.
    #[must_use]
    pub fn upstream(&self) -> Option<Arc<dyn Subscription>> {
        self.upstream.get()
    }

    /// Returns `true` once `actual` has been released.
    #[must_use]
    pub fn is_released(&self) -> bool {
        self.actual.lock().is_none()
    }

    fn actual(&self) -> Option<Arc<dyn Subscriber<T>>> {
        self.actual.lock().clone()
    }

    fn release(&self) -> Option<Arc<dyn Subscriber<T>>> {
        self.actual.lock().take()
    }
}

impl<T: Send + 'static> Subscriber<T> for SuppressFusionSubscriber<T> {
    fn on_subscribe(&self, subscription: SubscriptionRef<T>) {
        match self.upstream.set_once(subscription.subscription()) {
            Ok(true) => {
                let (Some(this), Some(actual)) = (self.this.upgrade(), self.actual()) else {
                    subscription.cancel();
                    return;
                };
                trace!(
                    upstream_fuseable = subscription.is_fuseable(),
                    "fusion suppressed for downstream"
                );
                actual.on_subscribe(SubscriptionRef::Fuseable(
                    this as Arc<dyn QueueSubscription<T>>,
                ));
            }
            Ok(false) => {}
            Err(_err) => {
                warn!(error = %_err, "second upstream subscription cancelled");
            }
        }
    }

    fn on_next(&self, value: T) {
        if let Some(actual) = self.actual() {
            actual.on_next(value);
        }
    }

    fn on_error(&self, error: StreamError) {
        if let Some(actual) = self.release() {
            actual.on_error(error);
        }
    }

    fn on_complete(&self) {
        if let Some(actual) = self.release() {
            actual.on_complete();
        }
    }
}

impl<T: Send> Subscription for SuppressFusionSubscriber<T> {
    fn request(&self, n: i64) -> Result<()> {
        valid_request(n)?;
        self.upstream.request(n)
    }

    fn cancel(&self) {
        match self.upstream.get() {
            Some(upstream) => upstream.cancel(),
            // an upstream arriving later is cancelled by the slot
            None => {
                self.upstream.terminate();
            }
        }
        drop(self.release());
    }
}

impl<T: Send> QueueSubscription<T> for SuppressFusionSubscriber<T> {
    fn request_fusion(&self, _mode: FusionMode) -> FusionMode {
        FusionMode::NONE
    }

    fn poll(&self) -> Option<T> {
        None
    }

    fn is_empty(&self) -> bool {
        true
    }

    fn len(&self) -> usize {
        0
    }

    fn clear(&self) {}
}

impl<T> fmt::Debug for SuppressFusionSubscriber<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SuppressFusionSubscriber")
            .field("upstream", &self.upstream)
            .field("released", &self.is_released())
            .finish_non_exhaustive()
    }
}
