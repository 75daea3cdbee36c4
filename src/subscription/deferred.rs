//! Single-slot subscription whose value arrives after construction.
//!
//! # State
//!
//! The subscription runs on exactly one of two tracks, chosen once:
//!
//! - **push** (default): a request and the value may arrive in either order;
//!   whichever lands second triggers `on_next(value)` followed by
//!   `on_complete()`.
//! - **fused**: entered through `request_fusion(ASYNC)` before any request
//!   or value. The value is parked for [`poll`](QueueSubscription::poll) and
//!   the subscriber only receives `on_complete()` as its drain signal.
//!
//! Cancellation is a third, absorbing state reachable from anywhere.
//!
//! ```text
//!            request            complete(v)
//!   Idle ─────────────▶ Requested ──────────▶ Done   (push v, then complete)
//!    │  complete(v)                 request
//!    └──────────────▶ Ready(v) ─────────────▶ Done   (push v, then complete)
//!
//!   Idle ── request_fusion(ASYNC) ──▶ Armed ── complete(v) ──▶ Ready(v) ── poll ──▶ Done
//!
//!   any ── cancel ──▶ Cancelled
//! ```
//!
//! The subscriber lives inside the states that can still signal it. Leaving
//! them hands it to the pending action or drops it, so a finished or
//! cancelled subscription no longer keeps its subscriber alive.
//!
//! # Re-entrancy
//!
//! Transitions happen under a lock; callbacks run after it is released.
//! `on_next` may cancel or request again before it returns, so the trailing
//! `on_complete` is only sent if the state is not `Cancelled` afterwards.
//! A `cancel` racing in from another thread after that check has passed
//! can still be followed by `on_complete`.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::{Result, StreamError};
use crate::protocol::{FusionMode, QueueSubscription, Subscriber, Subscription, SubscriptionRef};
use crate::tracing_compat::trace;

use super::validate::valid_request;

type Sink<T> = Arc<dyn Subscriber<T>>;

enum PushState<T> {
    Idle(Sink<T>),
    Requested(Sink<T>),
    Ready(T, Sink<T>),
    Done,
}

enum FusedState<T> {
    Armed(Sink<T>),
    Ready(T),
    Done,
}

enum State<T> {
    Push(PushState<T>),
    Fused(FusedState<T>),
    Cancelled,
}

/// Work left to do once the lock is released.
enum Action<T> {
    Nothing,
    Emit(T, Sink<T>),
    SignalFused(Sink<T>),
    Fail(StreamError, Sink<T>),
    Discard(T),
}

/// Holds one value that is produced after the subscription was handed out.
///
/// The producer calls [`complete`](Self::complete) (or
/// [`error`](Self::error)) once; the consumer requests, cancels, or fuses.
/// Whatever the interleaving, the subscriber sees at most one value and at
/// most one terminal signal, and nothing after it cancels.
///
/// # Example
///
/// ```
/// use backflow::subscription::DeferredScalarSubscription;
/// use backflow::test_utils::RecordingSubscriber;
///
/// let sub = RecordingSubscriber::new().requesting(1).into_arc();
/// let deferred = DeferredScalarSubscription::subscribe(sub.clone());
/// assert!(sub.values().is_empty());
///
/// deferred.complete(99);
/// assert_eq!(sub.values(), vec![99]);
/// assert_eq!(sub.completions(), 1);
/// ```
pub struct DeferredScalarSubscription<T> {
    state: Mutex<State<T>>,
}

impl<T: Send + 'static> DeferredScalarSubscription<T> {
    /// Creates an idle subscription delivering to `subscriber`.
    #[must_use]
    pub fn new(subscriber: Arc<dyn Subscriber<T>>) -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(State::Push(PushState::Idle(subscriber))),
        })
    }

    /// Creates the subscription and installs it on `subscriber`.
    pub fn subscribe(subscriber: Arc<dyn Subscriber<T>>) -> Arc<Self> {
        let subscription = Self::new(Arc::clone(&subscriber));
        subscriber.on_subscribe(SubscriptionRef::Fuseable(
            Arc::clone(&subscription) as Arc<dyn QueueSubscription<T>>
        ));
        subscription
    }
}

impl<T> DeferredScalarSubscription<T> {
    fn transition<R>(&self, f: impl FnOnce(State<T>) -> (State<T>, R)) -> R {
        let mut guard = self.state.lock();
        let current = std::mem::replace(&mut *guard, State::Cancelled);
        let (next, out) = f(current);
        *guard = next;
        out
    }

    fn run(&self, action: Action<T>) {
        match action {
            Action::Nothing => {}
            Action::Discard(value) => drop(value),
            Action::Emit(value, subscriber) => {
                trace!("deferred scalar push delivery");
                subscriber.on_next(value);
                if self.is_cancelled() {
                    trace!("deferred scalar completion suppressed by cancel");
                } else {
                    subscriber.on_complete();
                }
            }
            Action::SignalFused(subscriber) => {
                trace!("deferred scalar value parked for poll");
                subscriber.on_complete();
            }
            Action::Fail(error, subscriber) => subscriber.on_error(error),
        }
    }

    /// Supplies the value.
    ///
    /// Delivers at once if a request is outstanding, parks it otherwise. On
    /// the fused track the value becomes pollable and the subscriber gets
    /// only `on_complete()`: pushing it through `on_next` would hand away the
    /// value that `poll` has to return. Ignored after cancellation or a
    /// previous value.
    pub fn complete(&self, value: T) {
        let action = self.transition(|state| match state {
            State::Push(PushState::Idle(subscriber)) => (
                State::Push(PushState::Ready(value, subscriber)),
                Action::Nothing,
            ),
            State::Push(PushState::Requested(subscriber)) => (
                State::Push(PushState::Done),
                Action::Emit(value, subscriber),
            ),
            State::Fused(FusedState::Armed(subscriber)) => (
                State::Fused(FusedState::Ready(value)),
                Action::SignalFused(subscriber),
            ),
            other => (other, Action::Discard(value)),
        });
        self.run(action);
    }

    /// Fails the subscription with a data-stream error.
    ///
    /// Ignored once a value has been supplied, after a terminal signal, or
    /// after cancellation.
    pub fn error(&self, error: StreamError) {
        let action = self.transition(|state| match state {
            State::Push(PushState::Idle(subscriber) | PushState::Requested(subscriber)) => (
                State::Push(PushState::Done),
                Action::Fail(error, subscriber),
            ),
            State::Fused(FusedState::Armed(subscriber)) => (
                State::Fused(FusedState::Done),
                Action::Fail(error, subscriber),
            ),
            other => (other, Action::Nothing),
        });
        self.run(action);
    }

    /// Returns `true` once [`cancel`](Subscription::cancel) has run.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        matches!(*self.state.lock(), State::Cancelled)
    }

    /// Returns `true` if asynchronous fusion was granted.
    #[must_use]
    pub fn is_fused(&self) -> bool {
        matches!(*self.state.lock(), State::Fused(_))
    }

    /// Returns `true` if a value was supplied and is still waiting, on
    /// either track.
    #[must_use]
    pub fn has_value(&self) -> bool {
        matches!(
            *self.state.lock(),
            State::Push(PushState::Ready(..)) | State::Fused(FusedState::Ready(_))
        )
    }
}

impl<T: Send> Subscription for DeferredScalarSubscription<T> {
    fn request(&self, n: i64) -> Result<()> {
        valid_request(n)?;
        let action = self.transition(|state| match state {
            State::Push(PushState::Idle(subscriber)) => {
                (State::Push(PushState::Requested(subscriber)), Action::Nothing)
            }
            State::Push(PushState::Ready(value, subscriber)) => (
                State::Push(PushState::Done),
                Action::Emit(value, subscriber),
            ),
            other => (other, Action::Nothing),
        });
        self.run(action);
        Ok(())
    }

    fn cancel(&self) {
        let previous = self.transition(|state| (State::Cancelled, state));
        drop(previous);
    }
}

impl<T: Send> QueueSubscription<T> for DeferredScalarSubscription<T> {
    /// Grants [`FusionMode::ASYNC`] when asked for it without
    /// [`FusionMode::THREAD_BARRIER`], provided the push track has not been
    /// engaged by a request or a value yet.
    fn request_fusion(&self, mode: FusionMode) -> FusionMode {
        if !mode.wants_async() || mode.crosses_barrier() {
            trace!(requested = %mode, "deferred scalar fusion denied");
            return FusionMode::NONE;
        }
        let granted = self.transition(|state| match state {
            State::Push(PushState::Idle(subscriber)) => {
                (State::Fused(FusedState::Armed(subscriber)), FusionMode::ASYNC)
            }
            fused @ State::Fused(_) => (fused, FusionMode::ASYNC),
            other => (other, FusionMode::NONE),
        });
        trace!(requested = %mode, granted = %granted, "deferred scalar fusion negotiated");
        granted
    }

    fn poll(&self) -> Option<T> {
        self.transition(|state| match state {
            State::Fused(FusedState::Ready(value)) => (State::Fused(FusedState::Done), Some(value)),
            other => (other, None),
        })
    }

    fn is_empty(&self) -> bool {
        !matches!(*self.state.lock(), State::Fused(FusedState::Ready(_)))
    }

    fn len(&self) -> usize {
        usize::from(!self.is_empty())
    }

    fn clear(&self) {
        let previous = self.transition(|state| match state {
            State::Fused(fused) => (State::Fused(FusedState::Done), Some(fused)),
            other => (other, None),
        });
        drop(previous);
    }
}

impl<T> fmt::Debug for DeferredScalarSubscription<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = match *self.state.lock() {
            State::Push(PushState::Idle(_)) => "idle",
            State::Push(PushState::Requested(_)) => "requested",
            State::Push(PushState::Ready(..)) => "ready",
            State::Push(PushState::Done) => "done",
            State::Fused(FusedState::Armed(_)) => "fused-armed",
            State::Fused(FusedState::Ready(_)) => "fused-ready",
            State::Fused(FusedState::Done) => "fused-done",
            State::Cancelled => "cancelled",
        };
        f.debug_struct("DeferredScalarSubscription")
            .field("state", &state)
            .finish_non_exhaustive()
    }
}
