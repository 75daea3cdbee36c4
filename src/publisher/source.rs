//! Zero- and one-value sources.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::error::StreamError;
use crate::protocol::Subscriber;
use crate::subscription::{DeferredScalarSubscription, EmptySubscription, ScalarSubscription};

use super::Publisher;

/// Emits one value per subscriber, then completes.
///
/// Created by the [`just`] function.
#[derive(Debug, Clone)]
pub struct Just<T> {
    value: T,
}

impl<T> Publisher<T> for Just<T>
where
    T: Clone + Send + 'static,
{
    fn subscribe(&self, subscriber: Arc<dyn Subscriber<T>>) {
        ScalarSubscription::subscribe(subscriber, self.value.clone());
    }
}

/// A publisher of exactly `value`.
///
/// # Examples
///
/// ```
/// use backflow::publisher::{just, Publisher};
/// use backflow::test_utils::RecordingSubscriber;
///
/// let sub = RecordingSubscriber::new().requesting(1).into_arc();
/// just(5).subscribe(sub.clone());
/// assert_eq!(sub.values(), vec![5]);
/// ```
pub fn just<T>(value: T) -> Just<T> {
    Just { value }
}

/// Completes every subscriber immediately.
///
/// Created by the [`empty`] function.
pub struct Empty<T> {
    _marker: PhantomData<fn() -> T>,
}

impl<T: 'static> Publisher<T> for Empty<T> {
    fn subscribe(&self, subscriber: Arc<dyn Subscriber<T>>) {
        EmptySubscription::complete(subscriber);
    }
}

impl<T> fmt::Debug for Empty<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Empty")
    }
}

/// A publisher with no values.
#[must_use]
pub fn empty<T>() -> Empty<T> {
    Empty {
        _marker: PhantomData,
    }
}

/// Fails every subscriber immediately with the same error.
///
/// Created by the [`fail`] function.
pub struct Fail<T> {
    error: StreamError,
    _marker: PhantomData<fn() -> T>,
}

impl<T: 'static> Publisher<T> for Fail<T> {
    fn subscribe(&self, subscriber: Arc<dyn Subscriber<T>>) {
        EmptySubscription::error(subscriber, self.error.clone());
    }
}

impl<T> fmt::Debug for Fail<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Fail").field("error", &self.error).finish()
    }
}

/// A publisher that fails with `error` before producing anything.
#[must_use]
pub fn fail<T>(error: StreamError) -> Fail<T> {
    Fail {
        error,
        _marker: PhantomData,
    }
}

/// Computes one value per subscriber after the handshake.
///
/// Created by the [`from_fn`] function.
pub struct FromFn<F> {
    f: F,
}

impl<T, F> Publisher<T> for FromFn<F>
where
    T: Send + 'static,
    F: Fn() -> Result<T, StreamError>,
{
    fn subscribe(&self, subscriber: Arc<dyn Subscriber<T>>) {
        let deferred = DeferredScalarSubscription::subscribe(subscriber);
        if deferred.is_cancelled() {
            return;
        }
        match (self.f)() {
            Ok(value) => deferred.complete(value),
            Err(error) => deferred.error(error),
        }
    }
}

impl<F> fmt::Debug for FromFn<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FromFn")
    }
}

/// A publisher that runs `f` for each subscriber once it has subscribed.
///
/// The subscriber may request before or after `f` returns; either way it
/// receives the value once its demand and the value have both arrived.
/// A subscriber that cancels inside `on_subscribe` never runs `f`.
pub fn from_fn<T, F>(f: F) -> FromFn<F>
where
    F: Fn() -> Result<T, StreamError>,
{
    FromFn { f }
}
