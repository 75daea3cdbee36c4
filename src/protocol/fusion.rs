//! Fusion mode negotiation flags.
//!
//! A downstream stage asks for a set of modes with
//! [`QueueSubscription::request_fusion`](super::QueueSubscription::request_fusion)
//! and the upstream answers with the single mode it grants, or
//! [`FusionMode::NONE`].
//!
//! | Flag             | Meaning                                                   |
//! |------------------|-----------------------------------------------------------|
//! | `SYNC`           | every value is already available; `poll` never waits     |
//! | `ASYNC`          | values may still be produced; `poll` may come back empty |
//! | `THREAD_BARRIER` | the consumer sits across an async boundary               |

use core::fmt;
use core::ops::{BitAnd, BitOr, BitOrAssign};

/// A bit set of fusion modes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct FusionMode(u8);

impl FusionMode {
    /// No fusion; values are pushed through `on_next`.
    pub const NONE: Self = Self(0);
    /// Synchronous fusion.
    pub const SYNC: Self = Self(1);
    /// Asynchronous fusion.
    pub const ASYNC: Self = Self(2);
    /// Either synchronous or asynchronous fusion.
    pub const ANY: Self = Self(Self::SYNC.0 | Self::ASYNC.0);
    /// Restriction flag: the requester crosses a boundary where reordering
    /// the poll with upstream work would be unsafe.
    pub const THREAD_BARRIER: Self = Self(4);

    /// Returns the raw bits.
    #[must_use]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Returns `true` if every bit of `other` is set in `self`.
    #[must_use]
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0 && other.0 != 0
    }

    /// Returns `true` if no mode is set.
    #[must_use]
    pub const fn is_none(self) -> bool {
        self.0 == 0
    }

    /// Returns `true` if this set includes synchronous fusion.
    #[must_use]
    pub const fn wants_sync(self) -> bool {
        self.contains(Self::SYNC)
    }

    /// Returns `true` if this set includes asynchronous fusion.
    #[must_use]
    pub const fn wants_async(self) -> bool {
        self.contains(Self::ASYNC)
    }

    /// Returns `true` if the requester crosses a thread barrier.
    #[must_use]
    pub const fn crosses_barrier(self) -> bool {
        self.contains(Self::THREAD_BARRIER)
    }
}

impl BitOr for FusionMode {
    type Output = Self;

    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for FusionMode {
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for FusionMode {
    type Output = Self;

    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl fmt::Display for FusionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            return f.write_str("none");
        }
        let mut first = true;
        for (flag, name) in [
            (Self::SYNC, "sync"),
            (Self::ASYNC, "async"),
            (Self::THREAD_BARRIER, "thread-barrier"),
        ] {
            if self.contains(flag) {
                if !first {
                    f.write_str("|")?;
                }
                f.write_str(name)?;
                first = false;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn any_is_sync_or_async() {
        assert_eq!(FusionMode::ANY, FusionMode::SYNC | FusionMode::ASYNC);
        assert!(FusionMode::ANY.wants_sync());
        assert!(FusionMode::ANY.wants_async());
        assert!(!FusionMode::ANY.crosses_barrier());
    }

    #[test]
    fn none_contains_nothing() {
        assert!(FusionMode::NONE.is_none());
        assert!(!FusionMode::NONE.contains(FusionMode::NONE));
        assert!(!FusionMode::ANY.contains(FusionMode::NONE));
    }

    #[test]
    fn barrier_composes() {
        let mut mode = FusionMode::ASYNC;
        mode |= FusionMode::THREAD_BARRIER;
        assert!(mode.wants_async());
        assert!(mode.crosses_barrier());
        assert_eq!((mode & FusionMode::SYNC), FusionMode::NONE);
        assert_eq!(mode.bits(), 6);
    }

    #[test]
    fn display() {
        assert_eq!(FusionMode::NONE.to_string(), "none");
        assert_eq!(FusionMode::ANY.to_string(), "sync|async");
        assert_eq!(
            (FusionMode::ASYNC | FusionMode::THREAD_BARRIER).to_string(),
            "async|thread-barrier"
        );
    }
}
