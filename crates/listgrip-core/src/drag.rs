#![forbid(unsafe_code)]

//! Drag-to-reorder state machine, shared by task cards and subtasks.
//!
//! ```text
//!   Idle ── down on handle ──► Pressed ── hold ──► Armed ── move > 2px ──► Dragging
//!    ▲                            │                  │                        │
//!    │                    jitter / up / cancel   up / cancel            up: commit
//!    │                            ▼                  ▼                        ▼
//!    └──────────────────────────────────── cleanup ◄──────────────────── Committing
//! ```
//!
//! While `Dragging` the engine works per animation frame, not per input
//! event: the pointer only moves the follower's target, and each
//! [`frame`](DragEngine::frame) advances the ghost, auto-scrolls, and
//! re-evaluates the placeholder against live geometry. A failed geometry
//! read at any point aborts the drag with full cleanup.

use std::fmt;

use tracing::{debug, trace, warn};

use crate::action::TaskAction;
use crate::arbiter::GestureKind;
use crate::cx::GestureCx;
use crate::effect::{GestureEffect, HapticLevel};
use crate::frame::Follower;
use crate::geometry::{Point, Rect};
use crate::hold::{HoldTimer, TimerToken};
use crate::input::{InputDisposition, PointerSample};
use crate::layout::LayoutProbe;
use crate::reorder::{
    ReorderState, Swap, autoscroll_step, gate_insertion_index, list_under, same_list_swap,
};
use crate::row::{ListId, RowDescriptor, RowFlags, RowKind};

/// Drag session phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DragPhase {
    Idle,
    /// Handle pressed, hold timer running.
    Pressed,
    /// Hold satisfied; the next small move starts the drag.
    Armed,
    /// Ghost and placeholder live.
    Dragging,
    /// Move operation being issued; cleanup follows immediately.
    Committing,
}

/// Geometry the drag depended on could not be read.
#[derive(Debug, Clone, PartialEq, Eq)]
enum GeometryFailure {
    Viewport,
    RowRect,
    RowNotInList,
    Placeholder,
}

impl fmt::Display for GeometryFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Viewport => "viewport unavailable",
            Self::RowRect => "row is no longer rendered",
            Self::RowNotInList => "row is not in any list",
            Self::Placeholder => "placeholder vanished",
        })
    }
}

/// Ghost and placeholder bookkeeping for an active drag.
#[derive(Debug, Clone)]
struct Placement {
    source_index: usize,
    list: ListId,
    index: usize,
    /// Pointer y minus ghost top at drag start.
    anchor_y: f64,
    rail_left: f64,
    width: f64,
    height: f64,
    follower: Follower,
    reorder: ReorderState,
    /// Pointer y seen by the previous frame.
    frame_pointer_y: f64,
}

/// Per-row drag engine.
#[derive(Debug, Clone)]
pub struct DragEngine {
    row: RowDescriptor,
    phase: DragPhase,
    session: u64,
    pointer_id: Option<i32>,
    last: Point,
    armed_at: Point,
    jitter: f64,
    hold: HoldTimer,
    placement: Option<Placement>,
    lease: bool,
}

impl DragEngine {
    #[must_use]
    pub fn new(row: RowDescriptor) -> Self {
        Self {
            row,
            phase: DragPhase::Idle,
            session: 0,
            pointer_id: None,
            last: Point::default(),
            armed_at: Point::default(),
            jitter: 0.0,
            hold: HoldTimer::new(),
            placement: None,
            lease: false,
        }
    }

    /// Re-bind to a freshly rendered descriptor for the same row.
    pub fn rebind(&mut self, row: RowDescriptor) {
        self.row = row;
    }

    #[inline]
    #[must_use]
    pub fn phase(&self) -> DragPhase {
        self.phase
    }

    #[must_use]
    pub fn row(&self) -> &RowDescriptor {
        &self.row
    }

    /// Generation of the current (or last) session.
    #[must_use]
    pub fn session(&self) -> u64 {
        self.session
    }

    #[must_use]
    pub fn pointer_id(&self) -> Option<i32> {
        self.pointer_id
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.phase != DragPhase::Idle
    }

    #[must_use]
    pub fn has_lease(&self) -> bool {
        self.lease
    }

    /// Whether the engine wants a tick on the next animation frame.
    #[must_use]
    pub fn needs_frames(&self) -> bool {
        self.phase == DragPhase::Dragging
    }

    /// Current placeholder list and index, while dragging.
    #[must_use]
    pub fn placement(&self) -> Option<(&ListId, usize)> {
        self.placement.as_ref().map(|p| (&p.list, p.index))
    }

    // -----------------------------------------------------------------------
    // Input
    // -----------------------------------------------------------------------

    /// Pointer down on the drag handle.
    pub fn pointer_down(
        &mut self,
        cx: &mut GestureCx<'_>,
        sample: &PointerSample,
        device_pixel_ratio: f64,
    ) -> InputDisposition {
        if self.phase != DragPhase::Idle {
            return InputDisposition::Ignored;
        }
        self.session += 1;
        self.phase = DragPhase::Pressed;
        self.pointer_id = Some(sample.pointer_id);
        self.last = sample.position;
        self.jitter = cx.config.drag.jitter_for_dpr(device_pixel_ratio);
        let hold = cx.config.drag.hold;
        self.hold.start(cx, sample.position, hold);
        InputDisposition::Observed
    }

    pub fn pointer_move(
        &mut self,
        cx: &mut GestureCx<'_>,
        sample: &PointerSample,
        layout: &dyn LayoutProbe,
    ) -> InputDisposition {
        self.last = sample.position;
        match self.phase {
            DragPhase::Pressed => {
                if self.hold.cancel_if_moved(cx, sample.position, self.jitter) {
                    debug!(target: "listgrip.gesture", row = %self.row.id, "press moved before hold");
                    self.cleanup(cx);
                    InputDisposition::Ignored
                } else {
                    InputDisposition::Observed
                }
            }
            DragPhase::Armed => {
                if sample.position.manhattan_distance(self.armed_at) > cx.config.drag.start_distance {
                    self.start(cx, sample.position, layout)
                } else {
                    InputDisposition::Consumed
                }
            }
            DragPhase::Dragging => {
                if let Some(p) = self.placement.as_mut() {
                    p.follower.set_target(sample.position.y - p.anchor_y);
                }
                InputDisposition::Consumed
            }
            DragPhase::Idle | DragPhase::Committing => InputDisposition::Ignored,
        }
    }

    pub fn pointer_up(
        &mut self,
        cx: &mut GestureCx<'_>,
        sample: &PointerSample,
        layout: &dyn LayoutProbe,
    ) -> InputDisposition {
        self.last = sample.position;
        match self.phase {
            DragPhase::Pressed | DragPhase::Armed => {
                self.cleanup(cx);
                InputDisposition::Observed
            }
            DragPhase::Dragging => {
                self.commit(cx, layout);
                InputDisposition::Consumed
            }
            DragPhase::Idle | DragPhase::Committing => InputDisposition::Ignored,
        }
    }

    /// Pointer cancelled: unwind without committing.
    pub fn pointer_cancel(&mut self, cx: &mut GestureCx<'_>) -> InputDisposition {
        if self.phase == DragPhase::Idle {
            return InputDisposition::Ignored;
        }
        let consumed = self.phase == DragPhase::Dragging;
        self.cleanup(cx);
        if consumed {
            InputDisposition::Consumed
        } else {
            InputDisposition::Observed
        }
    }

    /// Deliver a host timer. Returns true if the token belonged to this row.
    pub fn timer_fired(&mut self, cx: &mut GestureCx<'_>, token: TimerToken) -> bool {
        if !self.hold.fire(token) {
            return false;
        }
        if self.phase == DragPhase::Pressed {
            self.phase = DragPhase::Armed;
            self.armed_at = self.last;
            debug!(target: "listgrip.gesture", row = %self.row.id, "drag armed");
            cx.emit(GestureEffect::SetRowFlags {
                row: self.row.id.clone(),
                flags: RowFlags::ARMED,
            });
            cx.emit(GestureEffect::Haptic(HapticLevel::Light));
        }
        true
    }

    /// Tear down any session. Safe to repeat.
    pub fn abort(&mut self, cx: &mut GestureCx<'_>) {
        if self.phase != DragPhase::Idle {
            debug!(target: "listgrip.gesture", row = %self.row.id, phase = ?self.phase, "drag aborted");
        }
        self.cleanup(cx);
    }

    // -----------------------------------------------------------------------
    // Frames
    // -----------------------------------------------------------------------

    /// Advance one animation frame against live geometry.
    pub fn frame(&mut self, cx: &mut GestureCx<'_>, layout: &dyn LayoutProbe) {
        if self.phase != DragPhase::Dragging {
            return;
        }
        if let Err(failure) = self.step(cx, layout) {
            warn!(target: "listgrip.gesture", row = %self.row.id, %failure, "drag aborted on geometry failure");
            self.cleanup(cx);
        }
    }

    fn step(&mut self, cx: &mut GestureCx<'_>, layout: &dyn LayoutProbe) -> Result<(), GeometryFailure> {
        let viewport = layout.viewport().ok_or(GeometryFailure::Viewport)?;
        let kind = self.row.kind;
        let Some(p) = self.placement.as_mut() else {
            return Ok(());
        };

        let render_y = p.follower.step(cx.now, &cx.config.follow);
        cx.emit(GestureEffect::MoveGhost {
            row: self.row.id.clone(),
            x: p.rail_left,
            y: render_y,
        });

        let pointer_dy = self.last.y - p.frame_pointer_y;
        p.frame_pointer_y = self.last.y;
        let ghost = Rect::new(p.rail_left, render_y, p.width, p.height);
        let scroll = autoscroll_step(ghost, viewport.height, pointer_dy, &cx.config.autoscroll);
        if scroll != 0.0 {
            trace!(target: "listgrip.gesture", dy = scroll, "drag auto-scroll");
            cx.emit(GestureEffect::ScrollBy { dy: scroll });
        }

        let lists = layout.lists(kind);
        if !lists.iter().any(|l| l.placeholder_index().is_some()) {
            return Err(GeometryFailure::Placeholder);
        }

        let center_y = render_y + p.height / 2.0;
        let probe_x = p.rail_left + p.width / 2.0;
        let sticky = cx.config.drag.card_sticky;
        let direction = p.reorder.direction(p.follower.target(), render_y, sticky);
        let Some(target) = list_under(&lists, kind, probe_x, center_y) else {
            return Ok(());
        };

        let Some(current) = target.placeholder_index() else {
            let index = gate_insertion_index(target, center_y, cx.config.drag.gate);
            trace!(target: "listgrip.gesture", list = ?target.list, index, "placeholder changed list");
            p.list = target.list.clone();
            p.index = index;
            p.reorder.reset_swaps();
            cx.emit(GestureEffect::MovePlaceholder {
                list: target.list.clone(),
                index,
            });
            return Ok(());
        };
        p.list = target.list.clone();
        p.index = current;

        if !p.reorder.may_swap(center_y, sticky) {
            return Ok(());
        }
        let index = match same_list_swap(target, center_y, p.height, direction, &cx.config.drag) {
            Some(Swap::After) => current + 1,
            Some(Swap::Before) => current.saturating_sub(1),
            None => return Ok(()),
        };
        p.index = index;
        p.reorder.record_swap(center_y);
        cx.emit(GestureEffect::MovePlaceholder {
            list: target.list.clone(),
            index,
        });
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------------

    fn start(&mut self, cx: &mut GestureCx<'_>, at: Point, layout: &dyn LayoutProbe) -> InputDisposition {
        if !cx.arbiter.request(GestureKind::Drag, cx.out) {
            self.cleanup(cx);
            return InputDisposition::Ignored;
        }
        self.lease = true;
        match self.begin(cx, at, layout) {
            Ok(()) => InputDisposition::Consumed,
            Err(failure) => {
                warn!(target: "listgrip.gesture", row = %self.row.id, %failure, "drag could not start");
                self.cleanup(cx);
                InputDisposition::Ignored
            }
        }
    }

    fn begin(&mut self, cx: &mut GestureCx<'_>, at: Point, layout: &dyn LayoutProbe) -> Result<(), GeometryFailure> {
        let rect = layout
            .row_rect(&self.row.id)
            .filter(Rect::is_valid)
            .ok_or(GeometryFailure::RowRect)?;
        let (list, index) = layout
            .lists(self.row.kind)
            .iter()
            .find_map(|l| l.row_index(&self.row.id).map(|i| (l.list.clone(), i)))
            .ok_or(GeometryFailure::RowNotInList)?;

        self.phase = DragPhase::Dragging;
        debug!(target: "listgrip.gesture", row = %self.row.id, list = ?list, index, "drag started");
        cx.emit(GestureEffect::SetRowFlags {
            row: self.row.id.clone(),
            flags: RowFlags::DRAGGING,
        });
        cx.emit(GestureEffect::BeginDrag {
            row: self.row.id.clone(),
            ghost: rect,
            list: list.clone(),
            index,
        });
        self.placement = Some(Placement {
            source_index: index,
            list,
            index,
            anchor_y: at.y - rect.top,
            rail_left: rect.left,
            width: rect.width,
            height: rect.height,
            follower: Follower::at(rect.top),
            reorder: ReorderState::new(self.row.kind, rect.top),
            frame_pointer_y: at.y,
        });
        Ok(())
    }

    fn commit(&mut self, cx: &mut GestureCx<'_>, layout: &dyn LayoutProbe) {
        self.phase = DragPhase::Committing;
        let Some(p) = self.placement.as_ref() else {
            self.cleanup(cx);
            return;
        };
        let (list, index) = layout
            .lists(self.row.kind)
            .iter()
            .find_map(|l| l.placeholder_index().map(|i| (l.list.clone(), i)))
            .unwrap_or_else(|| (p.list.clone(), p.index));

        let action = match (self.row.kind, &self.row.parent, list.parent()) {
            (RowKind::Subtask, Some(from), Some(to)) => Some(TaskAction::MoveSubtask {
                from_parent: from.clone(),
                subtask: self.row.id.clone(),
                to_parent: to.clone(),
                to_index: index,
            }),
            (RowKind::Task, _, None) => Some(TaskAction::MoveTask {
                task: self.row.id.clone(),
                from_index: p.source_index,
                to_index: index,
            }),
            _ => None,
        };
        match action {
            Some(action) => {
                debug!(target: "listgrip.gesture", row = %self.row.id, action = action.name(), index, "drag committed");
                cx.emit(GestureEffect::Invoke(action));
            }
            None => {
                warn!(target: "listgrip.gesture", row = %self.row.id, list = ?list, "drop target does not accept this row");
            }
        }
        self.cleanup(cx);
    }

    /// Remove ghost, placeholder, state flags, and the lock.
    fn cleanup(&mut self, cx: &mut GestureCx<'_>) {
        let had_ghost = matches!(self.phase, DragPhase::Dragging | DragPhase::Committing);
        let had_flags = had_ghost || self.phase == DragPhase::Armed;
        self.hold.cancel(cx);
        if had_ghost {
            cx.emit(GestureEffect::EndDrag {
                row: self.row.id.clone(),
            });
        }
        if had_flags {
            cx.emit(GestureEffect::SetRowFlags {
                row: self.row.id.clone(),
                flags: RowFlags::empty(),
            });
        }
        self.phase = DragPhase::Idle;
        self.placement = None;
        self.pointer_id = None;
        if self.lease {
            self.lease = false;
            cx.arbiter.release(GestureKind::Drag, cx.out);
        }
    }
}
