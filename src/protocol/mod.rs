//! Reactive-Streams boundary contract.
//!
//! - [`Subscriber`]: the four-callback consumer (`on_subscribe`, `on_next`,
//!   `on_error`, `on_complete`)
//! - [`Subscription`]: demand and cancellation back to the producer
//! - [`QueueSubscription`]: the optional fusion-capable extension
//! - [`SubscriptionRef`]: what `on_subscribe` receives, tagged with its capability
//! - [`FusionMode`]: flags negotiated through `request_fusion`

mod fusion;
mod subscriber;
mod subscription;

pub use fusion::FusionMode;
pub use subscriber::{Subscriber, SubscriptionRef};
pub use subscription::{QueueSubscription, Subscription, UNBOUNDED};
