#![forbid(unsafe_code)]

//! Placeholder placement rules and edge auto-scroll for drag-to-reorder.
//!
//! Everything here is a pure function of live geometry, evaluated once per
//! frame by the drag engine.
//!
//! # Gates
//!
//! A row's *gate* is a line `GATE` of its height in from the edge facing the
//! ghost. Entering a list, the placeholder goes before the first row whose
//! top gate lies at or below the ghost centre. Within a list, the
//! placeholder swaps past one neighbour per frame once the ghost centre
//! crosses that neighbour's gate, or once it has travelled `FORCE` of its
//! own height from the placeholder's slot centre.

use crate::config::{AutoScrollConfig, DragConfig};
use crate::geometry::Rect;
use crate::layout::ListGeometry;
use crate::row::RowKind;

/// Vertical travel direction of the ghost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

/// One-step placeholder move inside its current list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Swap {
    /// Past the previous row.
    Before,
    /// Past the next row.
    After,
}

/// Insertion index for a placeholder entering `list` with the ghost centre
/// at `center_y`. Falls back to the tail.
#[must_use]
pub fn gate_insertion_index(list: &ListGeometry, center_y: f64, gate: f64) -> usize {
    list.rows()
        .position(|(_, rect)| center_y <= rect.top + rect.height * gate)
        .unwrap_or_else(|| list.row_count())
}

/// Decide whether the placeholder swaps past a neighbour this frame.
#[must_use]
pub fn same_list_swap(
    list: &ListGeometry,
    center_y: f64,
    ghost_height: f64,
    direction: Direction,
    config: &DragConfig,
) -> Option<Swap> {
    let slot_origin = list.placeholder_rect()?.center_y();
    let (before, after) = list.placeholder_neighbours();
    match direction {
        Direction::Down => {
            let after = after?;
            let gate = after.top + after.height * config.gate;
            let force = slot_origin + ghost_height * config.force;
            (center_y >= gate || center_y >= force).then_some(Swap::After)
        }
        Direction::Up => {
            let before = before?;
            let gate = before.bottom() - before.height * config.gate;
            let force = slot_origin - ghost_height * config.force;
            (center_y <= gate || center_y <= force).then_some(Swap::Before)
        }
    }
}

/// The list under `(x, y)`.
///
/// Task cards live in a single column, so a task drag keeps using that
/// column when the ghost leaves its bounds.
#[must_use]
pub fn list_under(lists: &[ListGeometry], kind: RowKind, x: f64, y: f64) -> Option<&ListGeometry> {
    lists
        .iter()
        .find(|list| list.rect.contains(x, y))
        .or_else(|| match kind {
            RowKind::Task => lists.first(),
            RowKind::Subtask => None,
        })
}

/// Page scroll for this frame: `((band - distance) / band)² × max_step`
/// toward the nearer edge, only while the pointer moves toward it.
#[must_use]
pub fn autoscroll_step(
    ghost: Rect,
    viewport_height: f64,
    pointer_dy: f64,
    config: &AutoScrollConfig,
) -> f64 {
    let band = config.edge_band;
    let intensity = |distance: f64| {
        let f = ((band - distance) / band).clamp(0.0, 1.0);
        f * f
    };

    let to_top = ghost.top;
    let to_bottom = viewport_height - ghost.bottom();
    if to_top < band && to_top <= to_bottom && pointer_dy < 0.0 {
        -intensity(to_top) * config.max_step
    } else if to_bottom < band && pointer_dy > 0.0 {
        intensity(to_bottom) * config.max_step
    } else {
        0.0
    }
}

// ---------------------------------------------------------------------------
// Direction tracking
// ---------------------------------------------------------------------------

/// Per-drag direction state.
///
/// Subtasks follow the raw per-frame direction of the pointer target. Task
/// cards hold a directional intent that only flips after the ghost has moved
/// `card_sticky` back from where the intent was set, and refuse a second
/// swap until the ghost has moved `card_sticky` from the previous one.
#[derive(Debug, Clone, PartialEq)]
pub struct ReorderState {
    sticky: bool,
    prev_target: f64,
    raw: Direction,
    intent: Option<(Direction, f64)>,
    last_swap: Option<f64>,
}

impl ReorderState {
    #[must_use]
    pub fn new(kind: RowKind, target_y: f64) -> Self {
        Self {
            sticky: kind == RowKind::Task,
            prev_target: target_y,
            raw: Direction::Down,
            intent: None,
            last_swap: None,
        }
    }

    /// Direction to evaluate swaps in this frame.
    ///
    /// A stationary target keeps the last direction it moved in.
    pub fn direction(&mut self, target_y: f64, render_y: f64, sticky_distance: f64) -> Direction {
        let raw = if target_y > self.prev_target {
            Direction::Down
        } else if target_y < self.prev_target {
            Direction::Up
        } else {
            self.raw
        };
        self.raw = raw;
        self.prev_target = target_y;
        if !self.sticky {
            return raw;
        }
        match self.intent {
            Some((current, since)) if current != raw => {
                if (render_y - since).abs() > sticky_distance {
                    self.intent = Some((raw, render_y));
                    raw
                } else {
                    current
                }
            }
            Some((current, _)) => current,
            None => {
                self.intent = Some((raw, render_y));
                raw
            }
        }
    }

    /// Whether a swap is allowed with the ghost centre at `center_y`.
    #[must_use]
    pub fn may_swap(&self, center_y: f64, sticky_distance: f64) -> bool {
        !self.sticky || self.last_swap.is_none_or(|y| (center_y - y).abs() > sticky_distance)
    }

    pub fn record_swap(&mut self, center_y: f64) {
        self.last_swap = Some(center_y);
    }

    /// Forget swap history after the placeholder changes list.
    pub fn reset_swaps(&mut self) {
        self.last_swap = None;
    }
}
