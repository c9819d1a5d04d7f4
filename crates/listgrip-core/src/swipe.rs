#![forbid(unsafe_code)]

//! Swipe-to-act state machine for one row.
//!
//! # State Machine
//!
//! ```text
//!            pointer down (body)
//!   Idle ───────────────────────► Tracking ──── vertical / scroll ──► Idle
//!    ▲                               │
//!    │                     |dx| ≥ intent, lock granted
//!    │                               ▼
//!    │       hold, no movement   Captured ──── release ──┬─ fling ─────┐
//!    │   ┌───────────────────────────┘                   ├─ distance ──┤
//!    │   ▼                                               └─ snap ──► Idle
//!    │ Holding ── release ──► Idle (pinned open)                        │
//!    │                                                                  ▼
//!    └──────────────────── settle timer ─────────────────────────── Releasing
//! ```
//!
//! The lock is requested at capture (or at release, for a flick that never
//! reached the intent distance) and held until the session returns to
//! `Idle`. Closing an open drawer never touches the lock.

use std::time::Duration;

use tracing::debug;

use crate::action::TaskAction;
use crate::arbiter::GestureKind;
use crate::config::SwipeConfig;
use crate::cx::GestureCx;
use crate::effect::{GestureEffect, HapticLevel};
use crate::hold::{HoldTimer, TimerToken};
use crate::input::{InputDisposition, PointerSample};
use crate::row::{RowDescriptor, RowFlags, ZoneAction, ZoneWidths};
use crate::tracker::{Intent, PointerTracker};

/// Extra time past the execute animation before the row is reset.
const SETTLE_SLACK: Duration = Duration::from_millis(10);

/// Swipe session phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipePhase {
    Idle,
    /// Pointer down, direction not yet decided.
    Tracking,
    /// Horizontal intent confirmed; the offset follows the pointer.
    Captured,
    /// Held long enough to pin the drawer open.
    Holding,
    /// Execute animation running.
    Releasing,
}

/// How the last release was resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwipeOutcome {
    /// Executed by velocity.
    Fling(ZoneAction),
    /// Executed by distance.
    Execute(ZoneAction),
    /// Snapped open to a zone's full width.
    SnapOpen,
    /// Snapped closed.
    SnapClosed,
    /// Released while pinned open.
    Pinned,
}

/// Rubber-band an unclamped drawer offset.
///
/// Offsets within `zone × max_overextend` pass through unchanged. Past that
/// stop the excess `e` becomes `L·r·e / (L + r·e)` with `L = zone × r`, which
/// is monotonic, has slope `r` at the stop, and never exceeds
/// `zone × (max_overextend + r)`.
#[must_use]
pub fn rubber_band(raw: f64, zone: f64, config: &SwipeConfig) -> f64 {
    let stop = zone * config.max_overextend;
    let magnitude = raw.abs();
    if magnitude <= stop {
        return raw;
    }
    let r = config.resistance;
    let limit = zone * r;
    let excess = magnitude - stop;
    let damped = if limit > 0.0 {
        limit * r * excess / (limit + r * excess)
    } else {
        0.0
    };
    raw.signum() * (stop + damped)
}

/// Per-row swipe engine.
#[derive(Debug, Clone)]
pub struct SwipeEngine {
    row: RowDescriptor,
    zones: ZoneWidths,
    phase: SwipePhase,
    tracker: Option<PointerTracker>,
    hold: HoldTimer,
    settle: Option<TimerToken>,
    /// Settled reveal offset between gestures.
    open_x: f64,
    /// Offset currently on screen.
    offset: f64,
    pinned: bool,
    lease: bool,
    last_outcome: Option<SwipeOutcome>,
}

impl SwipeEngine {
    #[must_use]
    pub fn new(row: RowDescriptor, config: &SwipeConfig) -> Self {
        let zones = Self::zones_for(&row, config);
        Self {
            row,
            zones,
            phase: SwipePhase::Idle,
            tracker: None,
            hold: HoldTimer::new(),
            settle: None,
            open_x: 0.0,
            offset: 0.0,
            pinned: false,
            lease: false,
            last_outcome: None,
        }
    }

    fn zones_for(row: &RowDescriptor, config: &SwipeConfig) -> ZoneWidths {
        row.zones
            .unwrap_or(ZoneWidths::new(config.default_left_zone, config.default_right_zone))
    }

    /// Re-bind to a freshly rendered descriptor for the same row.
    pub fn rebind(&mut self, row: RowDescriptor, config: &SwipeConfig) {
        self.zones = Self::zones_for(&row, config);
        self.row = row;
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    #[inline]
    #[must_use]
    pub fn phase(&self) -> SwipePhase {
        self.phase
    }

    #[must_use]
    pub fn row(&self) -> &RowDescriptor {
        &self.row
    }

    #[must_use]
    pub fn zones(&self) -> ZoneWidths {
        self.zones
    }

    /// Settled reveal offset (positive: left zone open).
    #[must_use]
    pub fn open_x(&self) -> f64 {
        self.open_x
    }

    /// Offset currently on screen.
    #[must_use]
    pub fn offset(&self) -> f64 {
        self.offset
    }

    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open_x != 0.0
    }

    #[must_use]
    pub fn is_pinned(&self) -> bool {
        self.pinned
    }

    /// Whether a session is live (anything but `Idle`).
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.phase != SwipePhase::Idle
    }

    /// Whether this engine currently holds the gesture lock.
    #[must_use]
    pub fn has_lease(&self) -> bool {
        self.lease
    }

    #[must_use]
    pub fn pointer_id(&self) -> Option<i32> {
        self.tracker.as_ref().map(PointerTracker::pointer_id)
    }

    #[must_use]
    pub fn last_outcome(&self) -> Option<SwipeOutcome> {
        self.last_outcome
    }

    // -----------------------------------------------------------------------
    // Input
    // -----------------------------------------------------------------------

    /// Pointer down on the row body.
    pub fn pointer_down(&mut self, cx: &mut GestureCx<'_>, sample: &PointerSample) -> InputDisposition {
        if self.phase != SwipePhase::Idle {
            return InputDisposition::Ignored;
        }
        self.tracker = Some(PointerTracker::new(
            sample.pointer_id,
            sample.position,
            cx.now,
            sample.scroll_y,
            cx.config.swipe.fling_expiry,
        ));
        self.phase = SwipePhase::Tracking;
        InputDisposition::Observed
    }

    pub fn pointer_move(&mut self, cx: &mut GestureCx<'_>, sample: &PointerSample) -> InputDisposition {
        let Some(tracker) = self.tracker.as_mut() else {
            return InputDisposition::Ignored;
        };
        tracker.update(sample.position, cx.now);
        match self.phase {
            SwipePhase::Tracking => match tracker.disambiguate(sample.scroll_y, &cx.config.swipe) {
                Intent::Pending => InputDisposition::Observed,
                Intent::Scroll => {
                    debug!(target: "listgrip.gesture", row = %self.row.id, "swipe yielded to scroll");
                    self.end_session();
                    InputDisposition::Ignored
                }
                Intent::Captured => self.capture(cx, sample),
            },
            SwipePhase::Captured => {
                let tolerance = cx.config.swipe.hold_tolerance;
                self.hold.cancel_if_moved(cx, sample.position, tolerance);
                self.follow(cx);
                InputDisposition::Consumed
            }
            SwipePhase::Holding => InputDisposition::Consumed,
            SwipePhase::Idle | SwipePhase::Releasing => InputDisposition::Ignored,
        }
    }

    pub fn pointer_up(&mut self, cx: &mut GestureCx<'_>, sample: &PointerSample) -> InputDisposition {
        if let Some(tracker) = self.tracker.as_mut() {
            tracker.update(sample.position, cx.now);
        }
        match self.phase {
            SwipePhase::Tracking => self.release_uncaptured(cx, sample.scroll_y),
            SwipePhase::Captured => {
                self.hold.cancel(cx);
                self.release_captured(cx);
                InputDisposition::Consumed
            }
            SwipePhase::Holding => {
                self.last_outcome = Some(SwipeOutcome::Pinned);
                self.set_flags(cx, RowFlags::HELD);
                self.tracker = None;
                self.phase = SwipePhase::Idle;
                self.release_lease(cx);
                InputDisposition::Consumed
            }
            SwipePhase::Idle | SwipePhase::Releasing => InputDisposition::Ignored,
        }
    }

    /// Pointer cancelled by the platform: settle back without acting.
    pub fn pointer_cancel(&mut self, cx: &mut GestureCx<'_>) -> InputDisposition {
        match self.phase {
            SwipePhase::Tracking => {
                self.end_session();
                InputDisposition::Observed
            }
            SwipePhase::Captured | SwipePhase::Holding => {
                self.hold.cancel(cx);
                self.animate_to(cx, self.open_x);
                let flags = if self.pinned { RowFlags::HELD } else { RowFlags::empty() };
                self.set_flags(cx, flags);
                self.end_session();
                self.release_lease(cx);
                InputDisposition::Consumed
            }
            SwipePhase::Idle | SwipePhase::Releasing => InputDisposition::Ignored,
        }
    }

    /// Deliver a host timer. Returns true if the token belonged to this row.
    pub fn timer_fired(&mut self, cx: &mut GestureCx<'_>, token: TimerToken) -> bool {
        if self.hold.fire(token) {
            if self.phase == SwipePhase::Captured {
                self.pin(cx);
            }
            return true;
        }
        if self.settle == Some(token) {
            self.settle = None;
            self.finish_execute(cx);
            return true;
        }
        false
    }

    /// An action button inside a revealed zone was tapped.
    pub fn action_tapped(&mut self, cx: &mut GestureCx<'_>, action: ZoneAction) -> bool {
        if self.phase != SwipePhase::Idle {
            return false;
        }
        let task_action = TaskAction::for_zone(
            action,
            self.row.id.clone(),
            self.row.kind,
            self.row.parent.clone(),
        );
        if action == ZoneAction::Edit {
            cx.emit(GestureEffect::ResetRow {
                row: self.row.id.clone(),
            });
            self.clear_open();
            cx.emit(GestureEffect::Invoke(task_action));
        } else {
            cx.emit(GestureEffect::Invoke(task_action));
            self.close(cx);
        }
        true
    }

    /// Animate an open drawer closed. Does not touch the gesture lock.
    pub fn close(&mut self, cx: &mut GestureCx<'_>) -> bool {
        if self.phase != SwipePhase::Idle || !self.is_open() {
            return false;
        }
        self.animate_to(cx, 0.0);
        self.set_flags(cx, RowFlags::empty());
        self.clear_open();
        true
    }

    /// Tear down everything: timers, visuals, lock. Safe to repeat.
    pub fn abort(&mut self, cx: &mut GestureCx<'_>) {
        if self.phase == SwipePhase::Idle && !self.is_open() && !self.lease && self.settle.is_none() {
            return;
        }
        self.hold.cancel(cx);
        if let Some(token) = self.settle.take() {
            cx.emit(GestureEffect::CancelTimer { token });
        }
        cx.emit(GestureEffect::ResetRow {
            row: self.row.id.clone(),
        });
        self.clear_open();
        self.end_session();
        self.release_lease(cx);
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    fn capture(&mut self, cx: &mut GestureCx<'_>, sample: &PointerSample) -> InputDisposition {
        if !cx.arbiter.request(GestureKind::Swipe, cx.out) {
            self.end_session();
            return InputDisposition::Ignored;
        }
        self.lease = true;
        self.phase = SwipePhase::Captured;
        debug!(target: "listgrip.gesture", row = %self.row.id, "swipe captured");
        self.set_flags(cx, RowFlags::SWIPING);
        let hold = cx.config.swipe.hold;
        self.hold.start(cx, sample.position, hold);
        self.follow(cx);
        InputDisposition::Consumed
    }

    fn follow(&mut self, cx: &mut GestureCx<'_>) {
        let Some(tracker) = &self.tracker else {
            return;
        };
        let raw = self.open_x + tracker.dx();
        self.offset = rubber_band(raw, self.zones.for_offset(raw), &cx.config.swipe);
        cx.emit(GestureEffect::SetRowOffset {
            row: self.row.id.clone(),
            x: self.offset,
        });
        self.emit_reveal(cx);
    }

    fn pin(&mut self, cx: &mut GestureCx<'_>) {
        let sign = if self.offset >= 0.0 { 1.0 } else { -1.0 };
        let target = sign * self.zones.for_offset(sign);
        self.phase = SwipePhase::Holding;
        self.pinned = true;
        self.open_x = target;
        debug!(target: "listgrip.gesture", row = %self.row.id, open_x = target, "swipe drawer pinned");
        self.animate_to(cx, target);
        self.set_flags(cx, RowFlags::SWIPING | RowFlags::HELD);
        cx.emit(GestureEffect::Haptic(HapticLevel::Medium));
    }

    fn release_uncaptured(&mut self, cx: &mut GestureCx<'_>, scroll_y: f64) -> InputDisposition {
        let scrolled = self
            .tracker
            .as_ref()
            .is_some_and(|t| t.disambiguate(scroll_y, &cx.config.swipe) == Intent::Scroll);
        if scrolled {
            debug!(target: "listgrip.gesture", row = %self.row.id, "release read as scroll");
            self.end_session();
            return InputDisposition::Ignored;
        }
        let fling = self
            .tracker
            .as_ref()
            .and_then(|t| t.fling(cx.now, &cx.config.swipe));
        if let Some(sign) = fling
            && cx.arbiter.request(GestureKind::Swipe, cx.out)
        {
            self.lease = true;
            self.set_flags(cx, RowFlags::SWIPING);
            let action = Self::action_for(sign);
            self.last_outcome = Some(SwipeOutcome::Fling(action));
            self.execute(cx, sign);
            return InputDisposition::Consumed;
        }
        self.end_session();
        // A tap on an open drawer closes it.
        self.close(cx);
        InputDisposition::Observed
    }

    fn release_captured(&mut self, cx: &mut GestureCx<'_>) {
        let Some(tracker) = &self.tracker else {
            return;
        };
        let swipe = &cx.config.swipe;
        let dx = tracker.dx();
        let raw = self.open_x + dx;
        let outward = raw.abs() > self.open_x.abs();

        if let Some(sign) = tracker.fling(cx.now, swipe) {
            self.last_outcome = Some(SwipeOutcome::Fling(Self::action_for(sign)));
            self.execute(cx, sign);
        } else if outward && raw.abs() >= swipe.execute_distance {
            let sign = raw.signum();
            self.last_outcome = Some(SwipeOutcome::Execute(Self::action_for(sign)));
            self.execute(cx, sign);
        } else {
            let zone = self.zones.for_offset(self.offset);
            if self.offset.abs() >= zone * swipe.snap_fraction {
                let target = self.offset.signum() * zone;
                self.open_x = target;
                self.last_outcome = Some(SwipeOutcome::SnapOpen);
                self.animate_to(cx, target);
            } else {
                self.last_outcome = Some(SwipeOutcome::SnapClosed);
                self.animate_to(cx, 0.0);
                self.clear_open();
            }
            self.set_flags(cx, RowFlags::empty());
            self.end_session();
            self.release_lease(cx);
        }
    }

    fn execute(&mut self, cx: &mut GestureCx<'_>, sign: f64) {
        let action = Self::action_for(sign);
        let width = self.zones.for_offset(sign);
        self.phase = SwipePhase::Releasing;
        self.tracker = None;
        debug!(target: "listgrip.gesture", row = %self.row.id, action = ?action, "swipe executing");

        cx.emit(GestureEffect::Haptic(HapticLevel::Success));
        cx.emit(GestureEffect::PulseZone {
            row: self.row.id.clone(),
            zone: action.zone(),
            scale: cx.config.swipe.pulse_scale,
            duration: cx.config.swipe.pulse_duration,
        });
        cx.emit(GestureEffect::Invoke(TaskAction::for_zone(
            action,
            self.row.id.clone(),
            self.row.kind,
            self.row.parent.clone(),
        )));

        let duration = cx.config.execute_duration();
        self.offset = sign * width * cx.config.swipe.execute_travel;
        cx.emit(GestureEffect::AnimateRow {
            row: self.row.id.clone(),
            x: self.offset,
            opacity: 0.0,
            duration,
        });
        let token = cx.timers.next();
        cx.emit(GestureEffect::ArmTimer {
            token,
            after: duration + SETTLE_SLACK,
        });
        self.settle = Some(token);
    }

    fn finish_execute(&mut self, cx: &mut GestureCx<'_>) {
        cx.emit(GestureEffect::ResetRow {
            row: self.row.id.clone(),
        });
        self.clear_open();
        self.end_session();
        self.release_lease(cx);
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    fn action_for(sign: f64) -> ZoneAction {
        if sign > 0.0 {
            ZoneAction::Complete
        } else {
            ZoneAction::Delete
        }
    }

    fn animate_to(&mut self, cx: &mut GestureCx<'_>, x: f64) {
        self.offset = x;
        cx.emit(GestureEffect::AnimateRow {
            row: self.row.id.clone(),
            x,
            opacity: 1.0,
            duration: cx.config.snap_duration(),
        });
        self.emit_reveal(cx);
    }

    fn emit_reveal(&self, cx: &mut GestureCx<'_>) {
        let left = (self.offset / self.zones.left).clamp(0.0, 1.0);
        let right = (-self.offset / self.zones.right).clamp(0.0, 1.0);
        cx.emit(GestureEffect::SetReveal {
            row: self.row.id.clone(),
            left,
            right,
        });
    }

    fn set_flags(&self, cx: &mut GestureCx<'_>, flags: RowFlags) {
        cx.emit(GestureEffect::SetRowFlags {
            row: self.row.id.clone(),
            flags,
        });
    }

    fn clear_open(&mut self) {
        self.open_x = 0.0;
        self.offset = 0.0;
        self.pinned = false;
    }

    fn end_session(&mut self) {
        self.tracker = None;
        self.phase = SwipePhase::Idle;
    }

    fn release_lease(&mut self, cx: &mut GestureCx<'_>) {
        if self.lease {
            self.lease = false;
            cx.arbiter.release(GestureKind::Swipe, cx.out);
        }
    }
}
