//! Error types.
//!
//! Two families of failure exist and they never mix:
//!
//! - [`FlowError`]: a caller broke the protocol contract (non-positive
//!   demand, double subscription, `offer` on a producer-only queue). These
//!   are returned synchronously from the misused call and are never routed
//!   through a subscriber's `on_error`.
//! - [`StreamError`]: the data stream itself failed. These travel to the
//!   consumer through `Subscriber::on_error` as an ordinary terminal event.
//!
//! [`ErrorSlot`] accumulates stream errors from several sources until it is
//! terminated with the shared [`StreamError::terminated`] sentinel.

use core::fmt;
use std::sync::{Arc, LazyLock};

use parking_lot::Mutex;
use thiserror::Error;

/// Protocol contract violation raised at the point of misuse.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum FlowError {
    /// `request(n)` was called with `n <= 0`.
    #[error("invalid demand: request amount must be positive but it was {0}")]
    InvalidDemand(i64),
    /// An absent subscription was offered to `on_subscribe`.
    #[error("subscription cannot be null")]
    NullSubscription,
    /// A second upstream subscription arrived for the same consumer.
    #[error("subscription already set")]
    SubscriptionAlreadySet,
    /// The operation is not supported by this subscription.
    #[error("unsupported operation: {0}")]
    Unsupported(&'static str),
}

impl FlowError {
    /// Returns `true` for a non-positive request amount.
    #[must_use]
    pub const fn is_invalid_demand(&self) -> bool {
        matches!(self, Self::InvalidDemand(_))
    }

    /// Returns `true` when an absent subscription was offered.
    #[must_use]
    pub const fn is_null_subscription(&self) -> bool {
        matches!(self, Self::NullSubscription)
    }

    /// Returns `true` for a duplicate subscription.
    #[must_use]
    pub const fn is_already_set(&self) -> bool {
        matches!(self, Self::SubscriptionAlreadySet)
    }

    /// Returns `true` for a call the subscription does not support.
    #[must_use]
    pub const fn is_unsupported(&self) -> bool {
        matches!(self, Self::Unsupported(_))
    }
}

/// Result type for protocol operations.
pub type Result<T, E = FlowError> = std::result::Result<T, E>;

/// Plain message error used by [`StreamError::msg`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
struct Message(String);

/// Marker behind the terminal sentinel.
#[derive(Debug, Error)]
#[error("stream error slot terminated")]
struct Terminated;

static TERMINATED: LazyLock<StreamError> = LazyLock::new(|| StreamError::new(Terminated));

/// A data-stream failure delivered through `on_error`.
///
/// Cloning shares the underlying error, so the same failure can be handed
/// to several consumers and compared by identity with [`StreamError::ptr_eq`].
///
/// # Example
///
/// ```
/// use backflow::StreamError;
///
/// let err = StreamError::msg("upstream timed out");
/// assert_eq!(err.to_string(), "upstream timed out");
/// assert!(err.ptr_eq(&err.clone()));
/// ```
#[derive(Clone)]
pub struct StreamError {
    inner: Arc<dyn std::error::Error + Send + Sync + 'static>,
}

impl StreamError {
    /// Wraps an arbitrary error.
    pub fn new<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            inner: Arc::new(error),
        }
    }

    /// Creates an error carrying only a message.
    pub fn msg(message: impl Into<String>) -> Self {
        Self::new(Message(message.into()))
    }

    /// Returns the shared "no further errors can be recorded" sentinel.
    #[must_use]
    pub fn terminated() -> Self {
        TERMINATED.clone()
    }

    /// Returns `true` if this is the terminal sentinel.
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        self.ptr_eq(&TERMINATED)
    }

    /// Returns `true` if both values share the same underlying error.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.inner), Arc::as_ptr(&other.inner))
    }

    /// Borrows the wrapped error.
    #[must_use]
    pub fn get_ref(&self) -> &(dyn std::error::Error + Send + Sync + 'static) {
        &*self.inner
    }

    /// Returns the composite this error wraps, if several failures were combined.
    #[must_use]
    pub fn as_composite(&self) -> Option<&CompositeError> {
        self.inner.downcast_ref::<CompositeError>()
    }
}

impl fmt::Debug for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("StreamError").field(&self.inner).finish()
    }
}

impl fmt::Display for StreamError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

impl std::error::Error for StreamError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.inner.source()
    }
}

/// Several stream failures recorded into one [`ErrorSlot`].
#[derive(Debug, Clone)]
pub struct CompositeError {
    errors: Vec<StreamError>,
}

impl CompositeError {
    /// The recorded errors in arrival order.
    #[must_use]
    pub fn errors(&self) -> &[StreamError] {
        &self.errors
    }
}

impl fmt::Display for CompositeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} errors occurred", self.errors.len())?;
        for (i, err) in self.errors.iter().enumerate() {
            write!(f, "; [{i}] {err}")?;
        }
        Ok(())
    }
}

impl std::error::Error for CompositeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.errors
            .first()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

#[derive(Debug, Default)]
enum SlotState {
    #[default]
    Empty,
    Recorded(Vec<StreamError>),
    Terminated,
}

/// Error accumulator shared by several producers.
///
/// Errors are recorded until [`terminate`](Self::terminate) takes them out
/// and leaves the terminal sentinel behind; after that every
/// [`add`](Self::add) is refused.
#[derive(Debug, Default)]
pub struct ErrorSlot {
    state: Mutex<SlotState>,
}

impl ErrorSlot {
    /// Creates an empty slot.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `error`. Returns `false` if the slot was already terminated.
    pub fn add(&self, error: StreamError) -> bool {
        let mut state = self.state.lock();
        match &mut *state {
            SlotState::Terminated => false,
            SlotState::Recorded(errors) => {
                errors.push(error);
                true
            }
            SlotState::Empty => {
                *state = SlotState::Recorded(vec![error]);
                true
            }
        }
    }

    /// Terminates the slot and returns what had been recorded.
    ///
    /// A single error is returned as-is; several are combined into a
    /// [`CompositeError`]. Returns `None` if nothing was recorded or the slot
    /// was already terminated.
    pub fn terminate(&self) -> Option<StreamError> {
        let previous = std::mem::replace(&mut *self.state.lock(), SlotState::Terminated);
        match previous {
            SlotState::Empty | SlotState::Terminated => None,
            SlotState::Recorded(mut errors) if errors.len() == 1 => errors.pop(),
            SlotState::Recorded(errors) => Some(StreamError::new(CompositeError { errors })),
        }
    }

    /// Returns `true` once [`terminate`](Self::terminate) has run.
    #[must_use]
    pub fn is_terminated(&self) -> bool {
        matches!(*self.state.lock(), SlotState::Terminated)
    }

    /// Peeks at the slot: the terminal sentinel once terminated, the most
    /// recent recorded error otherwise.
    #[must_use]
    pub fn current(&self) -> Option<StreamError> {
        match &*self.state.lock() {
            SlotState::Empty => None,
            SlotState::Recorded(errors) => errors.last().cloned(),
            SlotState::Terminated => Some(StreamError::terminated()),
        }
    }
}
