//! The shared "already cancelled" marker.

use std::sync::{Arc, LazyLock};

use crate::error::Result;
use crate::protocol::Subscription;

/// Subscription that ignores every call.
///
/// Stored in place of a real upstream once it has been cancelled, so the
/// slot can be recognised as terminal without allocating per cancellation.
/// Obtain the shared instance with [`cancelled`].
#[derive(Debug, Clone, Copy, Default)]
pub struct CancelledSubscription;

impl Subscription for CancelledSubscription {
    fn request(&self, _n: i64) -> Result<()> {
        Ok(())
    }

    fn cancel(&self) {}
}

static CANCELLED: LazyLock<Arc<CancelledSubscription>> =
    LazyLock::new(|| Arc::new(CancelledSubscription));

/// Returns the process-wide cancelled sentinel.
#[must_use]
pub fn cancelled() -> Arc<dyn Subscription> {
    Arc::clone(&*CANCELLED) as Arc<dyn Subscription>
}

/// Returns `true` if `subscription` is the shared cancelled sentinel.
#[must_use]
pub fn is_cancelled_sentinel(subscription: &Arc<dyn Subscription>) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(subscription), Arc::as_ptr(&*CANCELLED))
}
