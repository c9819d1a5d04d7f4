#![forbid(unsafe_code)]

//! Process-wide gesture lock.
//!
//! At most one drag or swipe session owns input at any instant. The arbiter
//! is an ordinary value owned by the [`GestureController`](crate::controller::GestureController)
//! and lent to every engine through [`GestureCx`](crate::cx::GestureCx), so a
//! fresh arbiter per test carries no hidden state.
//!
//! # Scroll policy
//!
//! Only swipe locks page scrolling. A drag leaves native scroll enabled so
//! the drag engine's synthetic edge auto-scroll composes with it.
//!
//! # Invariants
//!
//! - `request` grants iff no lock is held; a denial is normal control flow.
//! - `release` with a kind that does not hold the lock is a no-op.
//! - `grants() - releases()` is 1 while held and 0 otherwise.

use std::cell::Cell;

use tracing::debug;

use crate::effect::GestureEffect;

/// The kind of gesture holding the lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GestureKind {
    Drag,
    Swipe,
}

impl GestureKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Drag => "drag",
            Self::Swipe => "swipe",
        }
    }
}

/// Mutual-exclusion gate between drag and swipe sessions.
#[derive(Debug, Default)]
pub struct GestureArbiter {
    active: Cell<Option<GestureKind>>,
    grants: Cell<u64>,
    releases: Cell<u64>,
}

impl GestureArbiter {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// True iff a lock is held.
    #[inline]
    #[must_use]
    pub fn has_active(&self) -> bool {
        self.active.get().is_some()
    }

    /// The current holder, if any.
    #[inline]
    #[must_use]
    pub fn active(&self) -> Option<GestureKind> {
        self.active.get()
    }

    /// Grant the lock to `kind` iff none is held.
    ///
    /// A swipe grant appends [`GestureEffect::LockScroll`].
    pub fn request(&self, kind: GestureKind, out: &mut Vec<GestureEffect>) -> bool {
        if let Some(holder) = self.active.get() {
            debug!(
                target: "listgrip.gesture",
                requested = kind.as_str(),
                holder = holder.as_str(),
                "gesture lock denied"
            );
            return false;
        }
        self.active.set(Some(kind));
        self.grants.set(self.grants.get() + 1);
        if kind == GestureKind::Swipe {
            out.push(GestureEffect::LockScroll);
        }
        debug!(target: "listgrip.gesture", kind = kind.as_str(), "gesture lock granted");
        true
    }

    /// Release the lock if `kind` holds it.
    ///
    /// A swipe release appends [`GestureEffect::UnlockScroll`].
    pub fn release(&self, kind: GestureKind, out: &mut Vec<GestureEffect>) {
        if self.active.get() != Some(kind) {
            return;
        }
        self.active.set(None);
        self.releases.set(self.releases.get() + 1);
        if kind == GestureKind::Swipe {
            out.push(GestureEffect::UnlockScroll);
        }
        debug!(target: "listgrip.gesture", kind = kind.as_str(), "gesture lock released");
    }

    /// Number of successful `request` calls.
    #[must_use]
    pub fn grants(&self) -> u64 {
        self.grants.get()
    }

    /// Number of effective `release` calls.
    #[must_use]
    pub fn releases(&self) -> u64 {
        self.releases.get()
    }
}
