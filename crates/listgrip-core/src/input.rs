#![forbid(unsafe_code)]

//! Normalized pointer input.

use std::time::Duration;

use crate::geometry::Point;
use crate::row::{HitTarget, RowId};

/// One pointer event as seen by the host.
#[derive(Debug, Clone, PartialEq)]
pub struct PointerSample {
    pub pointer_id: i32,
    /// The row under the pointer-down, resolved by the host. Ignored on
    /// move/up/cancel, which route by pointer id.
    pub row: Option<RowId>,
    pub target: HitTarget,
    /// Viewport coordinates.
    pub position: Point,
    /// Host monotonic clock.
    pub time: Duration,
    /// Document scroll offset at the time of the event.
    pub scroll_y: f64,
}

impl PointerSample {
    #[must_use]
    pub fn new(pointer_id: i32, position: Point, time: Duration) -> Self {
        Self {
            pointer_id,
            row: None,
            target: HitTarget::Body,
            position,
            time,
            scroll_y: 0.0,
        }
    }

    #[must_use]
    pub fn on_row(mut self, row: impl Into<RowId>, target: HitTarget) -> Self {
        self.row = Some(row.into());
        self.target = target;
        self
    }

    #[must_use]
    pub fn with_scroll(mut self, scroll_y: f64) -> Self {
        self.scroll_y = scroll_y;
        self
    }
}

/// What the host should do with the native event after the engine saw it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum InputDisposition {
    /// No session cares about this event.
    Ignored,
    /// A session is tracking it; let the browser keep its default behaviour.
    Observed,
    /// A gesture owns it; the host must call `preventDefault`.
    Consumed,
}

impl InputDisposition {
    #[inline]
    #[must_use]
    pub fn prevent_default(self) -> bool {
        self == Self::Consumed
    }
}
