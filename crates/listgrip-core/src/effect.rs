#![forbid(unsafe_code)]

//! View-sync commands emitted by the gesture engine.
//!
//! The engine never touches a UI toolkit. Every visible consequence of a
//! gesture (transforms, classes, ghost and placeholder, scroll, haptics,
//! timers, task operations) is a [`GestureEffect`] appended to an output
//! buffer in causal order. The host drains the buffer after each call and
//! applies it to whatever rendering layer is in use.

use std::time::Duration;

use crate::action::TaskAction;
use crate::geometry::Rect;
use crate::hold::TimerToken;
use crate::row::{ListId, RowFlags, RowId, Zone};

/// Named vibration intensity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HapticLevel {
    Light,
    Medium,
    Success,
}

impl HapticLevel {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Light => "light",
            Self::Medium => "medium",
            Self::Success => "success",
        }
    }
}

/// One instruction for the host.
#[derive(Debug, Clone, PartialEq)]
pub enum GestureEffect {
    /// Set the row's horizontal translation immediately (no transition).
    SetRowOffset { row: RowId, x: f64 },
    /// Transition the row to an offset and opacity.
    AnimateRow {
        row: RowId,
        x: f64,
        opacity: f64,
        duration: Duration,
    },
    /// Reveal fractions (0..=1) for the left and right action zones.
    SetReveal { row: RowId, left: f64, right: f64 },
    /// Briefly scale a zone's icon, then restore it after `duration`.
    PulseZone {
        row: RowId,
        zone: Zone,
        scale: f64,
        duration: Duration,
    },
    /// Replace the row's state classes with `flags`.
    SetRowFlags { row: RowId, flags: RowFlags },
    /// Clear transform, opacity, transition, reveal, and state classes.
    ResetRow { row: RowId },
    /// Clone the row into a floating ghost at `ghost`, and replace the row
    /// in flow with a placeholder of the same height at `index` in `list`.
    BeginDrag {
        row: RowId,
        ghost: Rect,
        list: ListId,
        index: usize,
    },
    /// Position the ghost (viewport coordinates of its top-left corner).
    MoveGhost { row: RowId, x: f64, y: f64 },
    /// Move the placeholder before the `index`-th row of `list`, or to the
    /// tail (ahead of any add affordance) when `index` equals the row count.
    MovePlaceholder { list: ListId, index: usize },
    /// Remove the ghost and placeholder and restore the row.
    EndDrag { row: RowId },
    /// Scroll the page by `dy` pixels.
    ScrollBy { dy: f64 },
    /// Prevent native touch scrolling (swipe in progress).
    LockScroll,
    /// Restore native touch scrolling and the saved scroll position.
    UnlockScroll,
    Haptic(HapticLevel),
    /// Call back [`timer_fired`](crate::controller::GestureController::timer_fired)
    /// with `token` after `after` elapses.
    ArmTimer { token: TimerToken, after: Duration },
    /// The timer is no longer needed; a late firing is ignored anyway.
    CancelTimer { token: TimerToken },
    /// Call back [`frame`](crate::controller::GestureController::frame) on the
    /// next animation frame.
    RequestFrame,
    /// Perform a task operation.
    Invoke(TaskAction),
}

impl GestureEffect {
    /// Short stable name, used in logs and host payloads.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::SetRowOffset { .. } => "setRowOffset",
            Self::AnimateRow { .. } => "animateRow",
            Self::SetReveal { .. } => "setReveal",
            Self::PulseZone { .. } => "pulseZone",
            Self::SetRowFlags { .. } => "setRowFlags",
            Self::ResetRow { .. } => "resetRow",
            Self::BeginDrag { .. } => "beginDrag",
            Self::MoveGhost { .. } => "moveGhost",
            Self::MovePlaceholder { .. } => "movePlaceholder",
            Self::EndDrag { .. } => "endDrag",
            Self::ScrollBy { .. } => "scrollBy",
            Self::LockScroll => "lockScroll",
            Self::UnlockScroll => "unlockScroll",
            Self::Haptic(_) => "haptic",
            Self::ArmTimer { .. } => "armTimer",
            Self::CancelTimer { .. } => "cancelTimer",
            Self::RequestFrame => "requestFrame",
            Self::Invoke(_) => "invoke",
        }
    }
}
