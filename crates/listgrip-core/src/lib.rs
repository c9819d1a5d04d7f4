#![forbid(unsafe_code)]

//! Core: pointer gesture recognition for reorderable, swipeable task lists.
//!
//! # Role in ListGrip
//! `listgrip-core` is the headless engine. It turns pointer samples, timer
//! callbacks, and animation frames into [`GestureEffect`] values: offsets,
//! row flags, ghost and placeholder moves, scroll locks, haptics, and task
//! operations. It never touches a DOM, a clock, or storage.
//!
//! # Primary responsibilities
//! - **Swipe to act**: reveal zones, flings, deliberate swipes, pin by hold.
//! - **Hold to drag**: long-press a handle, follow with a ghost, move a
//!   placeholder across gate lines, auto-scroll at viewport edges, commit a
//!   task or subtask move.
//! - **Arbitration**: at most one swipe or drag holds the gesture lock.
//!
//! # How it fits in the system
//! A host (`listgrip-web` in the browser) feeds [`GestureController`] with
//! [`PointerSample`]s and a [`LayoutProbe`] over its live geometry, drains
//! effects, and hands them to [`dispatch`] together with its view, task
//! store, and vibration hardware.

pub mod action;
pub mod arbiter;
pub mod config;
pub mod controller;
pub mod cx;
pub mod drag;
pub mod effect;
pub mod frame;
pub mod geometry;
pub mod hold;
pub mod host;
pub mod input;
pub mod layout;
pub mod logging;
pub mod reorder;
pub mod row;
pub mod swipe;
pub mod tracker;

pub use action::{ActionError, TaskAction, TaskActions};
pub use arbiter::{GestureArbiter, GestureKind};
pub use config::{ConfigError, GestureConfig};
pub use controller::{GestureController, GestureSettings};
pub use drag::{DragEngine, DragPhase};
pub use effect::{GestureEffect, HapticLevel};
pub use geometry::{Point, Rect};
pub use hold::TimerToken;
pub use host::{DispatchReport, HapticSink, NoHaptics, ViewSync, dispatch};
pub use input::{InputDisposition, PointerSample};
pub use layout::{LayoutProbe, LayoutSnapshot, ListGeometry, NoLayout, Slot, Viewport};
pub use row::{HitTarget, ListId, RowDescriptor, RowFlags, RowId, RowKind, ZoneAction, ZoneWidths};
pub use swipe::{SwipeEngine, SwipeOutcome, SwipePhase};
