#![forbid(unsafe_code)]

//! Row handles: the draggable/swipeable units supplied by the renderer.
//!
//! A [`RowDescriptor`] is valid until the next render replaces the DOM. The
//! host re-attaches descriptors after every render through
//! [`GestureController::attach_rows`](crate::controller::GestureController::attach_rows).

use std::fmt;

use bitflags::bitflags;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Stable row identifier (the row's `data-id`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct RowId(String);

impl RowId {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RowId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

/// Whether a row is a top-level task card or a subtask line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum RowKind {
    Task,
    Subtask,
}

/// A reorderable container.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub enum ListId {
    /// The card column holding every task.
    Tasks,
    /// The subtask list inside the given task card.
    Subtasks(RowId),
}

impl ListId {
    /// Owning task of a subtask list.
    #[must_use]
    pub fn parent(&self) -> Option<&RowId> {
        match self {
            Self::Tasks => None,
            Self::Subtasks(parent) => Some(parent),
        }
    }
}

/// Widths of the two reveal zones behind a swipeable row.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ZoneWidths {
    /// Left zone, revealed by a positive offset ("complete").
    pub left: f64,
    /// Right zone, revealed by a negative offset ("edit"/"delete").
    pub right: f64,
}

impl ZoneWidths {
    #[must_use]
    pub const fn new(left: f64, right: f64) -> Self {
        Self { left, right }
    }

    /// Width of the zone revealed by an offset with the given sign.
    #[inline]
    #[must_use]
    pub fn for_offset(&self, offset: f64) -> f64 {
        if offset >= 0.0 { self.left } else { self.right }
    }
}

/// Which reveal zone an action lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Zone {
    Left,
    Right,
}

/// An action button inside a reveal zone (its `data-act`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ZoneAction {
    Complete,
    Edit,
    Delete,
}

impl ZoneAction {
    /// Parse a `data-act` identifier. Task and subtask spellings both map.
    #[must_use]
    pub fn from_data_act(act: &str) -> Option<Self> {
        match act {
            "complete" | "complete-all" => Some(Self::Complete),
            "edit" | "edit-title" => Some(Self::Edit),
            "delete" | "delete-task" => Some(Self::Delete),
            _ => None,
        }
    }

    /// The `data-act` identifier for a row of the given kind.
    #[must_use]
    pub const fn data_act(self, kind: RowKind) -> &'static str {
        match (self, kind) {
            (Self::Complete, RowKind::Task) => "complete-all",
            (Self::Complete, RowKind::Subtask) => "complete",
            (Self::Edit, RowKind::Task) => "edit-title",
            (Self::Edit, RowKind::Subtask) => "edit",
            (Self::Delete, RowKind::Task) => "delete-task",
            (Self::Delete, RowKind::Subtask) => "delete",
        }
    }

    #[must_use]
    pub const fn zone(self) -> Zone {
        match self {
            Self::Complete => Zone::Left,
            Self::Edit | Self::Delete => Zone::Right,
        }
    }
}

/// What part of a row a pointer-down landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HitTarget {
    /// The row surface: candidate for a swipe.
    Body,
    /// The drag handle: candidate for a drag.
    Handle,
    /// A link, button, input, or editable region: never starts a gesture.
    Control,
    /// An action button inside a revealed zone.
    Action(ZoneAction),
}

bitflags! {
    /// Visual state flags mirrored onto the row as CSS classes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct RowFlags: u8 {
        const SWIPING  = 0b0001;
        const HELD     = 0b0010;
        const ARMED    = 0b0100;
        const DRAGGING = 0b1000;
    }
}

impl RowFlags {
    /// CSS class names for the set flags, in a stable order.
    #[must_use]
    pub fn class_names(self) -> Vec<&'static str> {
        let mut names = Vec::with_capacity(4);
        if self.contains(Self::SWIPING) {
            names.push("swiping");
        }
        if self.contains(Self::HELD) {
            names.push("held");
        }
        if self.contains(Self::ARMED) {
            names.push("armed");
        }
        if self.contains(Self::DRAGGING) {
            names.push("dragging");
        }
        names
    }
}

/// Renderer-supplied description of one row.
#[derive(Debug, Clone, PartialEq)]
pub struct RowDescriptor {
    pub id: RowId,
    pub kind: RowKind,
    /// Owning task id for subtasks.
    pub parent: Option<RowId>,
    /// Measured reveal zone widths; `None` uses the configured defaults.
    pub zones: Option<ZoneWidths>,
}

impl RowDescriptor {
    #[must_use]
    pub fn task(id: impl Into<String>) -> Self {
        Self {
            id: RowId::new(id),
            kind: RowKind::Task,
            parent: None,
            zones: None,
        }
    }

    #[must_use]
    pub fn subtask(id: impl Into<String>, parent: impl Into<String>) -> Self {
        Self {
            id: RowId::new(id),
            kind: RowKind::Subtask,
            parent: Some(RowId::new(parent)),
            zones: None,
        }
    }

    #[must_use]
    pub fn with_zones(mut self, zones: ZoneWidths) -> Self {
        self.zones = Some(zones);
        self
    }

    /// The list this row lives in when rendered.
    #[must_use]
    pub fn home_list(&self) -> ListId {
        match (&self.kind, &self.parent) {
            (RowKind::Subtask, Some(parent)) => ListId::Subtasks(parent.clone()),
            _ => ListId::Tasks,
        }
    }
}
