//! Producers built on the subscription primitives.
//!
//! A [`Publisher`] runs the subscribe handshake: it creates a subscription
//! for the incoming subscriber, installs it through `on_subscribe`, then
//! delivers as demand allows.
//!
//! # Examples
//!
//! ```
//! use backflow::publisher::{from_fn, Publisher, PublisherExt};
//! use backflow::protocol::FusionMode;
//! use backflow::test_utils::RecordingSubscriber;
//!
//! // A fusion-aware consumer still gets push delivery behind the adapter.
//! let sub = RecordingSubscriber::new()
//!     .with_fusion(FusionMode::ASYNC)
//!     .requesting(1)
//!     .into_arc();
//! from_fn(|| Ok(3)).suppress_fusion().subscribe(sub.clone());
//! assert_eq!(sub.granted(), FusionMode::NONE);
//! assert_eq!(sub.values(), vec![3]);
//! ```

mod source;
mod suppress;

use std::sync::Arc;

use crate::protocol::Subscriber;

pub use source::{Empty, Fail, FromFn, Just, empty, fail, from_fn, just};
pub use suppress::SuppressFusion;

/// A source of values for any number of subscribers.
pub trait Publisher<T> {
    /// Starts a new subscription for `subscriber`.
    fn subscribe(&self, subscriber: Arc<dyn Subscriber<T>>);
}

impl<T, P: Publisher<T> + ?Sized> Publisher<T> for Arc<P> {
    fn subscribe(&self, subscriber: Arc<dyn Subscriber<T>>) {
        (**self).subscribe(subscriber);
    }
}

impl<T, P: Publisher<T> + ?Sized> Publisher<T> for Box<P> {
    fn subscribe(&self, subscriber: Arc<dyn Subscriber<T>>) {
        (**self).subscribe(subscriber);
    }
}

/// Adapters available on every [`Publisher`].
pub trait PublisherExt<T>: Publisher<T> {
    /// Hides any fusion capability this publisher's subscriptions offer.
    fn suppress_fusion(self) -> SuppressFusion<Self>
    where
        Self: Sized,
    {
        SuppressFusion::new(self)
    }
}

impl<T, P: Publisher<T> + ?Sized> PublisherExt<T> for P {}
