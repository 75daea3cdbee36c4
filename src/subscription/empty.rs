//! The subscription of a producer with nothing to deliver.

use std::sync::{Arc, LazyLock};

use crate::error::{Result, StreamError};
use crate::protocol::{FusionMode, QueueSubscription, Subscriber, Subscription, SubscriptionRef};

use super::validate::valid_request;

/// An always-empty queue subscription, shared process-wide.
///
/// Valid requests and cancels are ignored, fusion is never granted and `poll`
/// never yields. Producers that know up front they have no values use
/// [`EmptySubscription::complete`] or [`EmptySubscription::error`] to run
/// the whole handshake in one call.
///
/// # Example
///
/// ```
/// use backflow::subscription::EmptySubscription;
/// use backflow::test_utils::{RecordingSubscriber, Signal};
///
/// let sub = RecordingSubscriber::<u32>::new().into_arc();
/// EmptySubscription::complete(sub.clone());
/// assert_eq!(sub.signals(), vec![Signal::Subscribe { fuseable: true }, Signal::Complete]);
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptySubscription;

static INSTANCE: LazyLock<Arc<EmptySubscription>> =
    LazyLock::new(|| Arc::new(EmptySubscription));

impl EmptySubscription {
    /// Returns the shared instance as a subscription for values of type `T`.
    #[must_use]
    pub fn instance<T: 'static>() -> SubscriptionRef<T> {
        SubscriptionRef::Fuseable(Arc::clone(&*INSTANCE) as Arc<dyn QueueSubscription<T>>)
    }

    /// Subscribes `subscriber` to nothing and completes it immediately.
    pub fn complete<T: 'static>(subscriber: Arc<dyn Subscriber<T>>) {
        subscriber.on_subscribe(Self::instance());
        subscriber.on_complete();
    }

    /// Subscribes `subscriber` to nothing and fails it with `error`.
    pub fn error<T: 'static>(subscriber: Arc<dyn Subscriber<T>>, error: StreamError) {
        subscriber.on_subscribe(Self::instance());
        subscriber.on_error(error);
    }

    /// Returns `true` if `subscription` is the shared instance.
    #[must_use]
    pub fn is_instance<T>(subscription: &SubscriptionRef<T>) -> bool {
        subscription.queue().is_some_and(|q| {
            std::ptr::addr_eq(Arc::as_ptr(q), Arc::as_ptr(&*INSTANCE))
        })
    }
}

impl Subscription for EmptySubscription {
    fn request(&self, n: i64) -> Result<()> {
        valid_request(n)
    }

    fn cancel(&self) {}
}

impl<T> QueueSubscription<T> for EmptySubscription {
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

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::FlowError;
    use crate::test_utils::{RecordingSubscriber, Signal};

    fn init_test(name: &str) {
        crate::test_utils::init_test_logging();
        crate::test_phase!(name);
    }

    #[test]
    fn complete_sequence() {
        init_test("complete_sequence");
        let sub = RecordingSubscriber::<i32>::new().requesting(1).into_arc();
        EmptySubscription::complete(sub.clone());
        let signals = sub.signals();
        let expected = vec![Signal::Subscribe { fuseable: true }, Signal::Complete];
        crate::assert_with_log!(signals == expected, "signals", expected, signals);
        crate::test_complete!("complete_sequence");
    }

    #[test]
    fn error_sequence() {
        init_test("error_sequence");
        let sub = RecordingSubscriber::<i32>::new().into_arc();
        let err = StreamError::msg("nothing to do");
        EmptySubscription::error(sub.clone(), err.clone());
        let signals = sub.signals();
        let expected = vec![Signal::Subscribe { fuseable: true }, Signal::Error(err)];
        crate::assert_with_log!(signals == expected, "signals", expected, signals);
        crate::test_complete!("error_sequence");
    }

    #[test]
    fn queue_view_is_inert() {
        init_test("queue_view_is_inert");
        let s = EmptySubscription::instance::<String>();
        assert!(EmptySubscription::is_instance(&s));
        let q = s.queue().expect("queue view");
        assert_eq!(q.request_fusion(FusionMode::ANY), FusionMode::NONE);
        assert_eq!(q.poll(), None);
        assert!(q.is_empty());
        assert_eq!(q.len(), 0);
        q.clear();
        assert_eq!(q.offer("x".to_string()), Err(FlowError::Unsupported("offer")));
        assert!(q.request(1).is_ok());
        assert_eq!(q.request(0), Err(FlowError::InvalidDemand(0)));
        q.cancel();
        crate::test_complete!("queue_view_is_inert");
    }

    #[test]
    fn fusion_request_is_denied_through_ref() {
        let sub = RecordingSubscriber::<u8>::new()
            .with_fusion(FusionMode::ANY)
            .into_arc();
        EmptySubscription::complete(sub.clone());
        assert_eq!(sub.granted(), FusionMode::NONE);
        assert_eq!(sub.completions(), 1);
    }
}
