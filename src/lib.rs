//! Backflow: cancel-correct Reactive-Streams subscription primitives.
//!
//! # Overview
//!
//! Backflow implements the subscription side of a push/pull messaging
//! protocol. A consumer only receives values it has asked for
//! (backpressure), and a downstream stage may instead drain a single-slot
//! queue directly (operator fusion). The hard part is ordering: a value may
//! land before or after the request, and cancellation may race with a
//! delivery that is already in flight.
//!
//! # Core Guarantees
//!
//! - **Demand first**: nothing is pushed before a positive `request(n)`
//! - **Exactly once**: a value leaves by push or by poll, never both
//! - **Single terminal**: at most one `on_complete`/`on_error`, never after cancel
//! - **Re-entrancy**: callbacks run outside every lock and may cancel or
//!   request from inside `on_next`
//! - **One track**: a subscription is either pushed or fused, chosen once
//!
//! # Module Structure
//!
//! - [`protocol`]: `Subscriber`, `Subscription`, `QueueSubscription`, fusion modes
//! - [`subscription`]: validation guards, sentinels, scalar and deferred
//!   scalar subscriptions, the fusion-suppressing adapter
//! - [`publisher`]: zero- and one-value sources built on the primitives
//! - [`error`](mod@error): protocol errors, stream errors, the error slot
//! - [`tracing_compat`]: optional tracing integration (requires `tracing-integration` feature)
//!
//! # Example
//!
//! ```
//! use backflow::subscription::DeferredScalarSubscription;
//! use backflow::test_utils::RecordingSubscriber;
//!
//! let sub = RecordingSubscriber::new().into_arc();
//! let deferred = DeferredScalarSubscription::subscribe(sub.clone());
//!
//! deferred.complete("ready");     // value first: parked
//! sub.request(1).unwrap();        // demand second: delivered
//! assert_eq!(sub.values(), vec!["ready"]);
//! assert_eq!(sub.completions(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![allow(clippy::module_inception)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_const_for_fn)]

pub mod error;
pub mod protocol;
pub mod publisher;
pub mod subscription;
pub mod tracing_compat;

#[cfg(any(test, feature = "test-internals"))]
pub mod test_utils;

pub use error::{CompositeError, ErrorSlot, FlowError, Result, StreamError};
pub use protocol::{
    FusionMode, QueueSubscription, Subscriber, Subscription, SubscriptionRef, UNBOUNDED,
};
pub use publisher::{Publisher, PublisherExt};
pub use subscription::{
    CancelledSubscription, DeferredScalarSubscription, EmptySubscription, ScalarSubscription,
    SubscriptionSlot, SuppressFusionSubscriber,
};
