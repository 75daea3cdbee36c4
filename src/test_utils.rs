//! Test helpers: logging setup, phase macros and a recording subscriber.
//!
//! Compiled for unit tests and, through the `test-internals` feature, for
//! integration tests. Not for production use.
//!
//! ```ignore
//! use backflow::test_utils::{init_test_logging, RecordingSubscriber, Signal};
//!
//! init_test_logging();
//! let sub = RecordingSubscriber::new().requesting(1).into_arc();
//! backflow::subscription::EmptySubscription::complete(sub.clone());
//! assert_eq!(sub.signals(), vec![Signal::Subscribe { fuseable: true }, Signal::Complete]);
//! ```

use std::fmt;
use std::sync::{Arc, Once};

use parking_lot::Mutex;
use tracing_subscriber::EnvFilter;

use crate::error::{Result, StreamError};
use crate::protocol::{FusionMode, Subscriber, SubscriptionRef};

/// Installs a `tracing` fmt subscriber for tests, once per process.
///
/// Honours `RUST_LOG`; defaults to `backflow=trace`.
pub fn init_test_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new("backflow=trace"));
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init();
    });
}

#[doc(hidden)]
pub fn log_phase(name: &str) {
    tracing::info!(test = name, "test phase start");
}

#[doc(hidden)]
pub fn log_complete(name: &str) {
    tracing::info!(test = name, "test complete");
}

#[doc(hidden)]
pub fn log_assertion(what: &str, expected: &str, actual: &str, passed: bool) {
    if passed {
        tracing::debug!(what, expected, actual, "assertion passed");
    } else {
        tracing::error!(what, expected, actual, "assertion failed");
    }
}

/// Logs the start of a named test phase.
#[macro_export]
macro_rules! test_phase {
    ($name:expr) => {
        $crate::test_utils::log_phase($name)
    };
}

/// Logs the end of a named test.
#[macro_export]
macro_rules! test_complete {
    ($name:expr) => {
        $crate::test_utils::log_complete($name)
    };
}

/// Asserts `cond`, logging the expectation either way.
#[macro_export]
macro_rules! assert_with_log {
    ($cond:expr, $what:expr, $expected:expr, $actual:expr) => {{
        let passed: bool = $cond;
        $crate::test_utils::log_assertion(
            $what,
            &format!("{:?}", $expected),
            &format!("{:?}", $actual),
            passed,
        );
        assert!(
            passed,
            "{}: expected {:?}, got {:?}",
            $what, $expected, $actual
        );
    }};
}

/// One recorded callback.
#[derive(Clone)]
pub enum Signal<T> {
    /// `on_subscribe`, noting whether the subscription offered a queue view.
    Subscribe {
        /// Whether the subscription was [`SubscriptionRef::Fuseable`].
        fuseable: bool,
    },
    /// `on_next(value)`.
    Next(T),
    /// `on_error(err)`.
    Error(StreamError),
    /// `on_complete()`.
    Complete,
}

impl<T: PartialEq> PartialEq for Signal<T> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Subscribe { fuseable: a }, Self::Subscribe { fuseable: b }) => a == b,
            (Self::Next(a), Self::Next(b)) => a == b,
            (Self::Error(a), Self::Error(b)) => a.ptr_eq(b),
            (Self::Complete, Self::Complete) => true,
            _ => false,
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Subscribe { fuseable } => write!(f, "Subscribe(fuseable={fuseable})"),
            Self::Next(v) => write!(f, "Next({v:?})"),
            Self::Error(e) => write!(f, "Error({e})"),
            Self::Complete => f.write_str("Complete"),
        }
    }
}

type NextHook<T> = Box<dyn Fn(&SubscriptionRef<T>) + Send + Sync>;

/// Subscriber that records every signal it receives.
///
/// Optionally negotiates fusion and requests demand from inside
/// `on_subscribe`, and runs a hook after each `on_next` so tests can
/// re-enter the subscription (cancel, request again) mid-delivery.
pub struct RecordingSubscriber<T> {
    signals: Mutex<Vec<Signal<T>>>,
    subscription: Mutex<Option<SubscriptionRef<T>>>,
    initial_request: Option<i64>,
    fusion: FusionMode,
    granted: Mutex<FusionMode>,
    on_next_hook: Option<NextHook<T>>,
}

impl<T> RecordingSubscriber<T> {
    /// Creates a subscriber that does nothing on subscribe.
    #[must_use]
    pub fn new() -> Self {
        Self {
            signals: Mutex::new(Vec::new()),
            subscription: Mutex::new(None),
            initial_request: None,
            fusion: FusionMode::NONE,
            granted: Mutex::new(FusionMode::NONE),
            on_next_hook: None,
        }
    }

    /// Requests `n` inside `on_subscribe` unless fusion was granted.
    #[must_use]
    pub fn requesting(mut self, n: i64) -> Self {
        self.initial_request = Some(n);
        self
    }

    /// Negotiates `mode` inside `on_subscribe`.
    #[must_use]
    pub fn with_fusion(mut self, mode: FusionMode) -> Self {
        self.fusion = mode;
        self
    }

    /// Runs `hook` after every recorded `on_next`.
    #[must_use]
    pub fn on_next_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&SubscriptionRef<T>) + Send + Sync + 'static,
    {
        self.on_next_hook = Some(Box::new(hook));
        self
    }

    /// Wraps the subscriber in an `Arc`, ready to subscribe.
    #[must_use]
    pub fn into_arc(self) -> Arc<Self> {
        Arc::new(self)
    }

    /// The fusion mode granted in `on_subscribe`.
    #[must_use]
    pub fn granted(&self) -> FusionMode {
        *self.granted.lock()
    }

    /// The subscription received in `on_subscribe`.
    #[must_use]
    pub fn subscription(&self) -> Option<SubscriptionRef<T>> {
        self.subscription.lock().clone()
    }

    /// Requests through the held subscription.
    pub fn request(&self, n: i64) -> Result<()> {
        match self.subscription() {
            Some(s) => s.request(n),
            None => Ok(()),
        }
    }

    /// Cancels the held subscription.
    pub fn cancel(&self) {
        if let Some(s) = self.subscription() {
            s.cancel();
        }
    }

    /// Polls the held subscription's queue view.
    pub fn poll(&self) -> Option<T> {
        self.subscription()
            .and_then(|s| s.queue().and_then(|q| q.poll()))
    }

    /// Number of `on_complete` calls seen.
    #[must_use]
    pub fn completions(&self) -> usize {
        self.signals
            .lock()
            .iter()
            .filter(|s| matches!(s, Signal::Complete))
            .count()
    }

    /// Errors seen, in order.
    #[must_use]
    pub fn errors(&self) -> Vec<StreamError> {
        self.signals
            .lock()
            .iter()
            .filter_map(|s| match s {
                Signal::Error(e) => Some(e.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of signals recorded so far.
    #[must_use]
    pub fn signal_count(&self) -> usize {
        self.signals.lock().len()
    }
}

impl<T: Clone> RecordingSubscriber<T> {
    /// Every recorded signal, in order.
    #[must_use]
    pub fn signals(&self) -> Vec<Signal<T>> {
        self.signals.lock().clone()
    }

    /// Values delivered through `on_next`, in order.
    #[must_use]
    pub fn values(&self) -> Vec<T> {
        self.signals
            .lock()
            .iter()
            .filter_map(|s| match s {
                Signal::Next(v) => Some(v.clone()),
                _ => None,
            })
            .collect()
    }
}

impl<T> Default for RecordingSubscriber<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send> Subscriber<T> for RecordingSubscriber<T> {
    fn on_subscribe(&self, subscription: SubscriptionRef<T>) {
        self.signals.lock().push(Signal::Subscribe {
            fuseable: subscription.is_fuseable(),
        });
        *self.subscription.lock() = Some(subscription.clone());

        let granted = if self.fusion.is_none() {
            FusionMode::NONE
        } else {
            subscription.request_fusion(self.fusion)
        };
        *self.granted.lock() = granted;

        if let (Some(n), true) = (self.initial_request, granted.is_none()) {
            if let Err(err) = subscription.request(n) {
                tracing::debug!(%err, "initial request rejected");
            }
        }
    }

    fn on_next(&self, value: T) {
        self.signals.lock().push(Signal::Next(value));
        if let Some(hook) = &self.on_next_hook {
            if let Some(s) = self.subscription() {
                hook(&s);
            }
        }
    }

    fn on_error(&self, error: StreamError) {
        self.signals.lock().push(Signal::Error(error));
    }

    fn on_complete(&self) {
        self.signals.lock().push(Signal::Complete);
    }
}
