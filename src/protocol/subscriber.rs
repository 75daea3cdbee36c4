//! The consumer side of the handshake.

use std::fmt;
use std::sync::Arc;

use crate::error::{Result, StreamError};

use super::{FusionMode, QueueSubscription, Subscription};

/// Receives the signals of one subscription.
///
/// Calls arrive in the order `on_subscribe`, `on_next*`, then at most one of
/// `on_error` / `on_complete`. All methods take `&self` because a producer
/// may deliver while the subscriber is itself inside `request` or `cancel`.
pub trait Subscriber<T>: Send + Sync {
    /// Hands over the subscription. Called exactly once, before anything else.
    fn on_subscribe(&self, subscription: SubscriptionRef<T>);

    /// Delivers a value.
    fn on_next(&self, value: T);

    /// Terminal failure of the data stream.
    fn on_error(&self, error: StreamError);

    /// Terminal success.
    fn on_complete(&self);
}

/// The subscription passed to [`Subscriber::on_subscribe`], tagged with its
/// capability.
///
/// Consumers that do not fuse call [`subscription`](Self::subscription);
/// fusion-aware consumers look for a queue with [`queue`](Self::queue) and
/// negotiate through it.
pub enum SubscriptionRef<T> {
    /// Push-only subscription.
    Plain(Arc<dyn Subscription>),
    /// Subscription that can also be drained as a queue.
    Fuseable(Arc<dyn QueueSubscription<T>>),
}

impl<T> SubscriptionRef<T> {
    /// Returns the narrow request/cancel view.
    #[must_use]
    pub fn subscription(&self) -> Arc<dyn Subscription> {
        match self {
            Self::Plain(s) => Arc::clone(s),
            Self::Fuseable(q) => Arc::clone(q) as Arc<dyn Subscription>,
        }
    }

    /// Returns the queue view if the producer offers one.
    #[must_use]
    pub fn queue(&self) -> Option<&Arc<dyn QueueSubscription<T>>> {
        match self {
            Self::Plain(_) => None,
            Self::Fuseable(q) => Some(q),
        }
    }

    /// Returns `true` if the producer offers a queue view.
    #[must_use]
    pub fn is_fuseable(&self) -> bool {
        matches!(self, Self::Fuseable(_))
    }

    /// Negotiates fusion; push-only subscriptions always answer
    /// [`FusionMode::NONE`].
    pub fn request_fusion(&self, mode: FusionMode) -> FusionMode {
        self.queue()
            .map_or(FusionMode::NONE, |q| q.request_fusion(mode))
    }

    /// Forwards to [`Subscription::request`].
    pub fn request(&self, n: i64) -> Result<()> {
        match self {
            Self::Plain(s) => s.request(n),
            Self::Fuseable(q) => q.request(n),
        }
    }

    /// Forwards to [`Subscription::cancel`].
    pub fn cancel(&self) {
        match self {
            Self::Plain(s) => s.cancel(),
            Self::Fuseable(q) => q.cancel(),
        }
    }
}

impl<T> Clone for SubscriptionRef<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Plain(s) => Self::Plain(Arc::clone(s)),
            Self::Fuseable(q) => Self::Fuseable(Arc::clone(q)),
        }
    }
}

impl<T> fmt::Debug for SubscriptionRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Plain(_) => f.write_str("SubscriptionRef::Plain"),
            Self::Fuseable(_) => f.write_str("SubscriptionRef::Fuseable"),
        }
    }
}
