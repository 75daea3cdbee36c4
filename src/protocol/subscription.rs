//! The consumer's handle on a producer.

use crate::error::{FlowError, Result};

use super::FusionMode;

/// Demand value meaning "no limit".
pub const UNBOUNDED: i64 = i64::MAX;

/// Demand and cancellation channel from a consumer back to its producer.
///
/// Exactly one consumer owns a subscription, received through
/// [`Subscriber::on_subscribe`](super::Subscriber::on_subscribe). Both
/// methods may be called re-entrantly from inside a delivery callback.
pub trait Subscription: Send + Sync {
    /// Asks for up to `n` more values.
    ///
    /// Fails with [`FlowError::InvalidDemand`] when `n <= 0`.
    fn request(&self, n: i64) -> Result<()>;

    /// Stops delivery. Silent towards the subscriber and idempotent.
    fn cancel(&self);
}

/// A subscription that can also be drained as a queue (operator fusion).
///
/// Fusion is producer-to-consumer only, so [`offer`](Self::offer) always
/// fails by default.
pub trait QueueSubscription<T>: Subscription {
    /// Negotiates fusion. Returns the granted mode, [`FusionMode::NONE`] if
    /// the caller must keep using push delivery.
    fn request_fusion(&self, mode: FusionMode) -> FusionMode;

    /// Takes the next value without blocking; `None` when nothing is ready.
    fn poll(&self) -> Option<T>;

    /// Pushes a value into the queue. Not supported by producer-side queues.
    fn offer(&self, value: T) -> Result<bool> {
        drop(value);
        Err(FlowError::Unsupported("offer"))
    }

    /// Returns `true` if [`poll`](Self::poll) would return `None`.
    fn is_empty(&self) -> bool;

    /// Number of values ready to poll (0 or 1 for single-slot queues).
    fn len(&self) -> usize;

    /// Discards anything still queued.
    fn clear(&self);
}
