#![forbid(unsafe_code)]

//! Live geometry contract between the engine and the rendering host.
//!
//! The drag engine reads geometry every frame and never caches it across
//! frames: its own auto-scroll and placeholder moves reflow the page between
//! calls. Every query may fail (a row vanished under a concurrent render);
//! callers treat `None` or a missing list as abort-and-cleanup.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::geometry::Rect;
use crate::row::{ListId, RowId, RowKind};

/// The visible page area.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct Viewport {
    /// `window.innerHeight`.
    pub height: f64,
    /// Document scroll offset.
    pub scroll_y: f64,
}

/// One in-flow child of a list, in document order.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", tag = "slot"))]
pub enum Slot {
    Row { id: RowId, rect: Rect },
    Placeholder { rect: Rect },
}

impl Slot {
    #[must_use]
    pub fn rect(&self) -> Rect {
        match self {
            Self::Row { rect, .. } | Self::Placeholder { rect } => *rect,
        }
    }

    #[must_use]
    pub fn row_id(&self) -> Option<&RowId> {
        match self {
            Self::Row { id, .. } => Some(id),
            Self::Placeholder { .. } => None,
        }
    }

    #[must_use]
    pub fn is_placeholder(&self) -> bool {
        matches!(self, Self::Placeholder { .. })
    }
}

/// A reorderable container and its current children.
///
/// Trailing "add" affordances are never reported as slots.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ListGeometry {
    pub list: ListId,
    pub rect: Rect,
    pub slots: Vec<Slot>,
}

impl ListGeometry {
    /// Row slots only, in order.
    pub fn rows(&self) -> impl Iterator<Item = (&RowId, Rect)> + '_ {
        self.slots.iter().filter_map(|slot| match slot {
            Slot::Row { id, rect } => Some((id, *rect)),
            Slot::Placeholder { .. } => None,
        })
    }

    /// Number of row slots.
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows().count()
    }

    /// Index of the placeholder counted in rows before it.
    #[must_use]
    pub fn placeholder_index(&self) -> Option<usize> {
        let mut rows_before = 0;
        for slot in &self.slots {
            match slot {
                Slot::Placeholder { .. } => return Some(rows_before),
                Slot::Row { .. } => rows_before += 1,
            }
        }
        None
    }

    #[must_use]
    pub fn placeholder_rect(&self) -> Option<Rect> {
        self.slots
            .iter()
            .find(|slot| slot.is_placeholder())
            .map(Slot::rect)
    }

    /// Index of a row among row slots.
    #[must_use]
    pub fn row_index(&self, row: &RowId) -> Option<usize> {
        self.rows().position(|(id, _)| id == row)
    }

    /// Row slots immediately before and after the placeholder.
    #[must_use]
    pub fn placeholder_neighbours(&self) -> (Option<Rect>, Option<Rect>) {
        let Some(pos) = self.slots.iter().position(Slot::is_placeholder) else {
            return (None, None);
        };
        let before = pos
            .checked_sub(1)
            .and_then(|i| self.slots.get(i))
            .filter(|slot| !slot.is_placeholder())
            .map(Slot::rect);
        let after = self
            .slots
            .get(pos + 1)
            .filter(|slot| !slot.is_placeholder())
            .map(Slot::rect);
        (before, after)
    }
}

/// Read access to live layout, implemented by the rendering host.
pub trait LayoutProbe {
    /// Current viewport height and scroll offset.
    fn viewport(&self) -> Option<Viewport>;

    /// Bounding box of a row, if it is still rendered.
    fn row_rect(&self, row: &RowId) -> Option<Rect>;

    /// Every reorderable container for rows of `kind`: one [`ListId::Tasks`]
    /// column for tasks, one [`ListId::Subtasks`] list per card for subtasks.
    fn lists(&self, kind: RowKind) -> Vec<ListGeometry>;
}

/// Plain-data layout, captured by the host in one pass.
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase", default))]
pub struct LayoutSnapshot {
    pub viewport: Option<Viewport>,
    pub rows: Vec<(RowId, Rect)>,
    pub task_lists: Vec<ListGeometry>,
    pub subtask_lists: Vec<ListGeometry>,
}

impl LayoutProbe for LayoutSnapshot {
    fn viewport(&self) -> Option<Viewport> {
        self.viewport
    }

    fn row_rect(&self, row: &RowId) -> Option<Rect> {
        self.rows
            .iter()
            .find(|(id, _)| id == row)
            .map(|(_, rect)| *rect)
            .or_else(|| {
                self.task_lists
                    .iter()
                    .chain(&self.subtask_lists)
                    .flat_map(|list| list.rows())
                    .find(|(id, _)| *id == row)
                    .map(|(_, rect)| rect)
            })
    }

    fn lists(&self, kind: RowKind) -> Vec<ListGeometry> {
        match kind {
            RowKind::Task => self.task_lists.clone(),
            RowKind::Subtask => self.subtask_lists.clone(),
        }
    }
}

/// A probe that knows nothing; every query fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLayout;

impl LayoutProbe for NoLayout {
    fn viewport(&self) -> Option<Viewport> {
        None
    }

    fn row_rect(&self, _row: &RowId) -> Option<Rect> {
        None
    }

    fn lists(&self, _kind: RowKind) -> Vec<ListGeometry> {
        Vec::new()
    }
}
