#![forbid(unsafe_code)]

//! The host-facing gesture controller.
//!
//! One [`GestureController`] serves a whole page. It owns the gesture lock,
//! the timer-token source, the frame loop, and a drag engine (plus, when
//! swipe gestures are enabled, a swipe engine) for every attached row.
//!
//! # Host loop
//!
//! ```text
//! render ──► attach_rows ─┐
//! pointer event ──────────┼──► drain_effects ──► apply (view, actions, haptics)
//! timer / frame callback ─┘
//! ```
//!
//! Every entry point appends to an internal effect buffer; nothing is
//! applied until the host drains it. Pointer move/up/cancel route by
//! pointer id to the engine that accepted the pointer-down.

use std::time::Duration;

use ahash::AHashMap;
use tracing::debug;

use crate::arbiter::{GestureArbiter, GestureKind};
use crate::config::{ConfigError, GestureConfig};
use crate::cx::{GestureCx, TimerIds};
use crate::drag::DragEngine;
use crate::effect::GestureEffect;
use crate::frame::FrameLoop;
use crate::hold::TimerToken;
use crate::input::{InputDisposition, PointerSample};
use crate::layout::LayoutProbe;
use crate::row::{HitTarget, RowDescriptor, RowId, ZoneAction};
use crate::swipe::SwipeEngine;

/// User-facing toggles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GestureSettings {
    /// Attach swipe engines to rows. Drag is unconditional.
    pub swipe_enabled: bool,
}

impl Default for GestureSettings {
    fn default() -> Self {
        Self {
            swipe_enabled: true,
        }
    }
}

#[derive(Debug, Clone)]
struct RowEntry {
    drag: DragEngine,
    swipe: Option<SwipeEngine>,
}

impl RowEntry {
    fn new(row: RowDescriptor, swipe_enabled: bool, config: &GestureConfig) -> Self {
        let swipe = swipe_enabled.then(|| SwipeEngine::new(row.clone(), &config.swipe));
        Self {
            drag: DragEngine::new(row),
            swipe,
        }
    }

    fn abort(&mut self, cx: &mut GestureCx<'_>) {
        self.drag.abort(cx);
        if let Some(swipe) = self.swipe.as_mut() {
            swipe.abort(cx);
        }
    }

    fn engine_active(&self, kind: GestureKind) -> bool {
        match kind {
            GestureKind::Drag => self.drag.is_active(),
            GestureKind::Swipe => self.swipe.as_ref().is_some_and(SwipeEngine::is_active),
        }
    }
}

/// Which engine accepted a pointer.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PointerRoute {
    row: RowId,
    kind: GestureKind,
}

/// Page-wide gesture recognizer.
#[derive(Debug)]
pub struct GestureController {
    config: GestureConfig,
    settings: GestureSettings,
    arbiter: GestureArbiter,
    timers: TimerIds,
    frames: FrameLoop,
    rows: AHashMap<RowId, RowEntry>,
    pointers: AHashMap<i32, PointerRoute>,
    device_pixel_ratio: f64,
    effects: Vec<GestureEffect>,
}

impl GestureController {
    /// Build a controller, rejecting an invalid config.
    pub fn new(config: GestureConfig) -> Result<Self, ConfigError> {
        Ok(Self::with_settings(config.validated()?, GestureSettings::default()))
    }

    fn with_settings(config: GestureConfig, settings: GestureSettings) -> Self {
        Self {
            config,
            settings,
            arbiter: GestureArbiter::new(),
            timers: TimerIds::new(),
            frames: FrameLoop::new(),
            rows: AHashMap::new(),
            pointers: AHashMap::new(),
            device_pixel_ratio: 1.0,
            effects: Vec::with_capacity(32),
        }
    }

    /// Split into an engine context and the per-row state it operates on.
    fn parts(
        &mut self,
        now: Duration,
    ) -> (
        GestureCx<'_>,
        &mut AHashMap<RowId, RowEntry>,
        &mut FrameLoop,
    ) {
        (
            GestureCx {
                config: &self.config,
                arbiter: &self.arbiter,
                timers: &self.timers,
                now,
                out: &mut self.effects,
            },
            &mut self.rows,
            &mut self.frames,
        )
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    #[must_use]
    pub fn config(&self) -> &GestureConfig {
        &self.config
    }

    #[must_use]
    pub fn settings(&self) -> GestureSettings {
        self.settings
    }

    #[must_use]
    pub fn arbiter(&self) -> &GestureArbiter {
        &self.arbiter
    }

    #[must_use]
    pub fn device_pixel_ratio(&self) -> f64 {
        self.device_pixel_ratio
    }

    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    #[must_use]
    pub fn drag(&self, row: &RowId) -> Option<&DragEngine> {
        self.rows.get(row).map(|entry| &entry.drag)
    }

    #[must_use]
    pub fn swipe(&self, row: &RowId) -> Option<&SwipeEngine> {
        self.rows.get(row).and_then(|entry| entry.swipe.as_ref())
    }

    /// Rows whose engine currently holds the gesture lock.
    #[must_use]
    pub fn leased_rows(&self) -> Vec<(RowId, GestureKind)> {
        let mut leased = Vec::new();
        for (id, entry) in &self.rows {
            if entry.drag.has_lease() {
                leased.push((id.clone(), GestureKind::Drag));
            }
            if entry.swipe.as_ref().is_some_and(SwipeEngine::has_lease) {
                leased.push((id.clone(), GestureKind::Swipe));
            }
        }
        leased
    }

    /// Effects queued since the last drain.
    #[must_use]
    pub fn pending_effects(&self) -> &[GestureEffect] {
        &self.effects
    }

    /// Take every queued effect, in causal order.
    pub fn drain_effects(&mut self) -> Vec<GestureEffect> {
        std::mem::take(&mut self.effects)
    }

    // -----------------------------------------------------------------------
    // Configuration
    // -----------------------------------------------------------------------

    /// Re-bind after a render. Rows no longer present lose their sessions.
    pub fn attach_rows<I>(&mut self, rows: I, now: Duration)
    where
        I: IntoIterator<Item = RowDescriptor>,
    {
        let swipe_enabled = self.settings.swipe_enabled;
        let incoming: AHashMap<RowId, RowDescriptor> =
            rows.into_iter().map(|row| (row.id.clone(), row)).collect();
        let (mut cx, map, frames) = self.parts(now);

        let before = map.len();
        map.retain(|id, entry| {
            if incoming.contains_key(id) {
                return true;
            }
            entry.abort(&mut cx);
            frames.cancel(id);
            false
        });
        let removed = before - map.len();

        for (id, row) in incoming {
            match map.get_mut(&id) {
                Some(entry) => {
                    entry.drag.rebind(row.clone());
                    if swipe_enabled {
                        match entry.swipe.as_mut() {
                            Some(swipe) => swipe.rebind(row, &cx.config.swipe),
                            None => entry.swipe = Some(SwipeEngine::new(row, &cx.config.swipe)),
                        }
                    }
                }
                None => {
                    map.insert(id, RowEntry::new(row, swipe_enabled, cx.config));
                }
            }
        }
        let total = map.len();
        debug!(target: "listgrip.gesture", rows = total, removed, "rows attached");

        let rows = &self.rows;
        self.pointers.retain(|_, route| rows.contains_key(&route.row));
    }

    /// Enable or disable swipe gestures. Disabling tears down live swipes.
    pub fn set_swipe_enabled(&mut self, enabled: bool, now: Duration) {
        if self.settings.swipe_enabled == enabled {
            return;
        }
        self.settings.swipe_enabled = enabled;
        let (mut cx, map, _) = self.parts(now);
        for entry in map.values_mut() {
            if enabled {
                let row = entry.drag.row().clone();
                entry.swipe = Some(SwipeEngine::new(row, &cx.config.swipe));
            } else if let Some(mut swipe) = entry.swipe.take() {
                swipe.abort(&mut cx);
            }
        }
        if !enabled {
            self.pointers.retain(|_, route| route.kind != GestureKind::Swipe);
        }
        debug!(target: "listgrip.gesture", enabled, "swipe gestures toggled");
    }

    /// Scale for the drag jitter tolerance. Non-finite or non-positive
    /// values are ignored.
    pub fn set_device_pixel_ratio(&mut self, ratio: f64) {
        if ratio.is_finite() && ratio > 0.0 {
            self.device_pixel_ratio = ratio;
        }
    }

    // -----------------------------------------------------------------------
    // Input
    // -----------------------------------------------------------------------

    /// A press on `sample.row`. A pointer id that is still routed lost its
    /// release; its old session is aborted before the new press is handled.
    pub fn pointer_down(&mut self, sample: &PointerSample) -> InputDisposition {
        let stale = self.pointers.remove(&sample.pointer_id);
        let dpr = self.device_pixel_ratio;
        let (mut cx, map, frames) = self.parts(sample.time);

        if let Some(stale) = stale {
            debug!(
                target: "listgrip.gesture",
                row = %stale.row,
                pointer = sample.pointer_id,
                "stale pointer session aborted"
            );
            if let Some(entry) = map.get_mut(&stale.row) {
                entry.abort(&mut cx);
            }
            frames.cancel(&stale.row);
        }

        for (id, entry) in map.iter_mut() {
            if sample.row.as_ref() != Some(id)
                && let Some(swipe) = entry.swipe.as_mut()
            {
                swipe.close(&mut cx);
            }
        }

        let Some(row) = sample.row.clone() else {
            return InputDisposition::Ignored;
        };
        let Some(entry) = map.get_mut(&row) else {
            return InputDisposition::Ignored;
        };
        let (kind, disposition) = match sample.target {
            HitTarget::Handle => (GestureKind::Drag, entry.drag.pointer_down(&mut cx, sample, dpr)),
            HitTarget::Body => match entry.swipe.as_mut() {
                Some(swipe) => (GestureKind::Swipe, swipe.pointer_down(&mut cx, sample)),
                None => return InputDisposition::Ignored,
            },
            HitTarget::Control | HitTarget::Action(_) => return InputDisposition::Ignored,
        };
        if disposition != InputDisposition::Ignored {
            self.pointers.insert(sample.pointer_id, PointerRoute { row, kind });
        }
        disposition
    }

    pub fn pointer_move(&mut self, sample: &PointerSample, layout: &dyn LayoutProbe) -> InputDisposition {
        let Some(route) = self.pointers.get(&sample.pointer_id).cloned() else {
            return InputDisposition::Ignored;
        };
        let (mut cx, map, frames) = self.parts(sample.time);
        let Some(entry) = map.get_mut(&route.row) else {
            self.pointers.remove(&sample.pointer_id);
            return InputDisposition::Ignored;
        };
        let disposition = match route.kind {
            GestureKind::Drag => {
                let d = entry.drag.pointer_move(&mut cx, sample, layout);
                if entry.drag.needs_frames() {
                    frames.request(&route.row, entry.drag.session(), cx.out);
                }
                d
            }
            GestureKind::Swipe => entry
                .swipe
                .as_mut()
                .map_or(InputDisposition::Ignored, |swipe| swipe.pointer_move(&mut cx, sample)),
        };
        let still_active = entry.engine_active(route.kind);
        if !still_active {
            self.pointers.remove(&sample.pointer_id);
        }
        disposition
    }

    pub fn pointer_up(&mut self, sample: &PointerSample, layout: &dyn LayoutProbe) -> InputDisposition {
        let Some(route) = self.pointers.remove(&sample.pointer_id) else {
            return InputDisposition::Ignored;
        };
        let (mut cx, map, _) = self.parts(sample.time);
        let Some(entry) = map.get_mut(&route.row) else {
            return InputDisposition::Ignored;
        };
        match route.kind {
            GestureKind::Drag => entry.drag.pointer_up(&mut cx, sample, layout),
            GestureKind::Swipe => entry
                .swipe
                .as_mut()
                .map_or(InputDisposition::Ignored, |swipe| swipe.pointer_up(&mut cx, sample)),
        }
    }

    pub fn pointer_cancel(&mut self, sample: &PointerSample) -> InputDisposition {
        let Some(route) = self.pointers.remove(&sample.pointer_id) else {
            return InputDisposition::Ignored;
        };
        let (mut cx, map, frames) = self.parts(sample.time);
        let Some(entry) = map.get_mut(&route.row) else {
            return InputDisposition::Ignored;
        };
        match route.kind {
            GestureKind::Drag => {
                frames.cancel(&route.row);
                entry.drag.pointer_cancel(&mut cx)
            }
            GestureKind::Swipe => entry
                .swipe
                .as_mut()
                .map_or(InputDisposition::Ignored, |swipe| swipe.pointer_cancel(&mut cx)),
        }
    }

    /// A timer armed through [`GestureEffect::ArmTimer`] elapsed.
    ///
    /// Returns false for tokens no engine is waiting on.
    pub fn timer_fired(&mut self, token: TimerToken, now: Duration) -> bool {
        let (mut cx, map, _) = self.parts(now);
        for entry in map.values_mut() {
            if entry.drag.timer_fired(&mut cx, token) {
                return true;
            }
            if let Some(swipe) = entry.swipe.as_mut()
                && swipe.timer_fired(&mut cx, token)
            {
                return true;
            }
        }
        false
    }

    /// An animation frame requested through [`GestureEffect::RequestFrame`].
    pub fn frame(&mut self, now: Duration, layout: &dyn LayoutProbe) {
        let (mut cx, map, frames) = self.parts(now);
        for tick in frames.begin_frame() {
            let Some(entry) = map.get_mut(&tick.row) else {
                continue;
            };
            if entry.drag.session() != tick.session || !entry.drag.needs_frames() {
                continue;
            }
            entry.drag.frame(&mut cx, layout);
            if entry.drag.needs_frames() {
                frames.request(&tick.row, tick.session, cx.out);
            }
        }
    }

    /// An action button inside `row`'s revealed zone was tapped.
    pub fn action_tapped(&mut self, row: &RowId, action: ZoneAction, now: Duration) -> bool {
        let (mut cx, map, _) = self.parts(now);
        map.get_mut(row)
            .and_then(|entry| entry.swipe.as_mut())
            .is_some_and(|swipe| swipe.action_tapped(&mut cx, action))
    }

    /// Unwind every session (pointer capture lost, page hidden).
    pub fn abort_all(&mut self, now: Duration) {
        let (mut cx, map, frames) = self.parts(now);
        for entry in map.values_mut() {
            entry.abort(&mut cx);
        }
        frames.clear();
        self.pointers.clear();
        debug!(target: "listgrip.gesture", "all gestures aborted");
    }
}
