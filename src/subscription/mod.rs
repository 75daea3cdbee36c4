//! Subscription primitives for single-item delivery.
//!
//! | Type                          | Values  | Fusion granted |
//! |-------------------------------|---------|----------------|
//! | [`CancelledSubscription`]     | none    | n/a (marker)   |
//! | [`EmptySubscription`]         | none    | never          |
//! | [`ScalarSubscription`]        | 1, known up front | `SYNC`  |
//! | [`DeferredScalarSubscription`]| 1, supplied later | `ASYNC` |
//! | [`SuppressFusionSubscriber`]  | pass-through      | never   |
//!
//! [`valid_request`], [`validate_subscription`] and [`SubscriptionSlot`]
//! enforce the handshake preconditions: positive demand and a single
//! upstream link per consumer.
//!
//! # Cancel Safety
//!
//! Every subscription here releases its lock before calling into the
//! subscriber and re-checks for cancellation after `on_next` returns, so a
//! subscriber may cancel from inside its own callback and never see a
//! trailing `on_complete`.
//!
//! The re-check is not atomic with the callback that follows it. A `cancel`
//! issued from another thread can return after the check has passed, and
//! the in-flight `on_complete` is then still delivered. Only cancels made
//! before the check, or from within `on_next`, suppress it. Cancelled
//! subscriptions never start a new delivery.
//!
//! Subscriptions hold their subscriber only while they can still signal
//! it. Completion, error, poll and cancel release it, so a finished
//! subscription does not keep its consumer alive.

mod cancelled;
mod deferred;
mod empty;
mod scalar;
mod slot;
mod suppress;
mod validate;

pub use cancelled::{CancelledSubscription, cancelled, is_cancelled_sentinel};
pub use deferred::DeferredScalarSubscription;
pub use empty::EmptySubscription;
pub use scalar::ScalarSubscription;
pub use slot::SubscriptionSlot;
pub use suppress::SuppressFusionSubscriber;
pub use validate::{add_cap, valid_request, validate_subscription};
