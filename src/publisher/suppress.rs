//! Publisher wrapper that interposes the fusion-suppressing adapter.

use std::sync::Arc;

use crate::protocol::Subscriber;
use crate::subscription::SuppressFusionSubscriber;

use super::Publisher;

/// Publisher whose subscribers never see a fuseable subscription.
///
/// Created by [`PublisherExt::suppress_fusion`](super::PublisherExt::suppress_fusion).
#[derive(Debug, Clone)]
pub struct SuppressFusion<P> {
    inner: P,
}

impl<P> SuppressFusion<P> {
    pub(crate) fn new(inner: P) -> Self {
        Self { inner }
    }

    /// Returns the wrapped publisher.
    pub fn into_inner(self) -> P {
        self.inner
    }
}

impl<T, P> Publisher<T> for SuppressFusion<P>
where
    T: Send + 'static,
    P: Publisher<T>,
{
    fn subscribe(&self, subscriber: Arc<dyn Subscriber<T>>) {
        self.inner.subscribe(SuppressFusionSubscriber::new(subscriber));
    }
}
