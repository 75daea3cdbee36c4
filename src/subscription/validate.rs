//! Protocol precondition guards.

use std::sync::Arc;

use crate::error::{FlowError, Result};
use crate::protocol::{Subscription, UNBOUNDED};
use crate::tracing_compat::debug;

use super::cancelled::is_cancelled_sentinel;

/// Checks that a request amount is positive.
///
/// # Example
///
/// ```
/// use backflow::subscription::valid_request;
///
/// assert!(valid_request(1).is_ok());
/// assert!(valid_request(0).unwrap_err().is_invalid_demand());
/// ```
pub fn valid_request(n: i64) -> Result<()> {
    if n <= 0 {
        debug!(demand = n, "rejected non-positive request");
        return Err(FlowError::InvalidDemand(n));
    }
    Ok(())
}

/// Decides whether `incoming` may be installed over `current`.
///
/// - `incoming` absent: fails with [`FlowError::NullSubscription`].
/// - `current` absent: returns `Ok(true)`, the assignment proceeds.
/// - `current` is the cancelled sentinel: cancels `incoming` and returns
///   `Ok(false)`. This is the ordinary lost race against cancellation.
/// - `current` is a live subscription: cancels `incoming` and fails with
///   [`FlowError::SubscriptionAlreadySet`].
pub fn validate_subscription(
    current: Option<&Arc<dyn Subscription>>,
    incoming: Option<&Arc<dyn Subscription>>,
) -> Result<bool> {
    let Some(incoming) = incoming else {
        return Err(FlowError::NullSubscription);
    };
    let Some(current) = current else {
        return Ok(true);
    };

    incoming.cancel();
    let already_cancelled = is_cancelled_sentinel(current);
    debug!(already_cancelled, "cancelled duplicate upstream subscription");
    if already_cancelled {
        Ok(false)
    } else {
        Err(FlowError::SubscriptionAlreadySet)
    }
}

/// Adds two demand amounts, saturating at [`UNBOUNDED`].
#[must_use]
pub const fn add_cap(a: i64, b: i64) -> i64 {
    match a.checked_add(b) {
        Some(sum) if sum < UNBOUNDED => sum,
        _ => UNBOUNDED,
    }
}
