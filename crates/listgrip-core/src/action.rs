#![forbid(unsafe_code)]

//! Task operations invoked when a gesture completes.
//!
//! The engine only names the operation; the task-operations collaborator
//! performs it. Invocation is fire-and-forget: gesture teardown never waits
//! for, or depends on, the outcome.

use std::fmt;

use crate::row::{RowId, RowKind, ZoneAction};

/// A task-level operation requested by a recognized gesture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskAction {
    /// Toggle a subtask, or toggle completion of a whole task.
    CompleteOrToggle {
        row: RowId,
        kind: RowKind,
        parent: Option<RowId>,
    },
    /// Delete a row. Task deletion confirmation is the collaborator's concern.
    Delete {
        row: RowId,
        kind: RowKind,
        parent: Option<RowId>,
    },
    /// Hand the row to the inline editor.
    Edit {
        row: RowId,
        kind: RowKind,
        parent: Option<RowId>,
    },
    /// Move a subtask to `to_index` within `to_parent`'s list.
    MoveSubtask {
        from_parent: RowId,
        subtask: RowId,
        to_parent: RowId,
        to_index: usize,
    },
    /// Move a task card from `from_index` to `to_index`.
    MoveTask {
        task: RowId,
        from_index: usize,
        to_index: usize,
    },
}

impl TaskAction {
    /// Build the action behind a zone button for a row.
    #[must_use]
    pub fn for_zone(action: ZoneAction, row: RowId, kind: RowKind, parent: Option<RowId>) -> Self {
        match action {
            ZoneAction::Complete => Self::CompleteOrToggle { row, kind, parent },
            ZoneAction::Edit => Self::Edit { row, kind, parent },
            ZoneAction::Delete => Self::Delete { row, kind, parent },
        }
    }

    /// Short stable name, used in logs and host payloads.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::CompleteOrToggle { .. } => "completeOrToggle",
            Self::Delete { .. } => "delete",
            Self::Edit { .. } => "edit",
            Self::MoveSubtask { .. } => "moveSubtask",
            Self::MoveTask { .. } => "moveTask",
        }
    }

    /// The row the action concerns.
    #[must_use]
    pub fn row(&self) -> &RowId {
        match self {
            Self::CompleteOrToggle { row, .. } | Self::Delete { row, .. } | Self::Edit { row, .. } => {
                row
            }
            Self::MoveSubtask { subtask, .. } => subtask,
            Self::MoveTask { task, .. } => task,
        }
    }
}

/// The task-operations collaborator.
pub trait TaskActions {
    /// Start the operation. Asynchronous work may continue after returning;
    /// an `Err` reports a failure the host already knows about.
    fn invoke(&mut self, action: &TaskAction) -> Result<(), ActionError>;
}

/// Failure reported by the task-operations collaborator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionError {
    action: &'static str,
    message: String,
}

impl ActionError {
    #[must_use]
    pub fn new(action: &TaskAction, message: impl Into<String>) -> Self {
        Self {
            action: action.name(),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn action(&self) -> &'static str {
        self.action
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} failed: {}", self.action, self.message)
    }
}

impl std::error::Error for ActionError {}
