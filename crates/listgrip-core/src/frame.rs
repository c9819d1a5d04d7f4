#![forbid(unsafe_code)]

//! Animation-frame scheduling and the adaptive ghost follower.
//!
//! [`FrameLoop`] replaces recursive `requestAnimationFrame` chains with
//! explicit subscriptions. A subscription lasts exactly one frame; a session
//! that is still alive after its tick subscribes again, so the loop stops on
//! its own once every session has ended. At most one
//! [`GestureEffect::RequestFrame`] is outstanding at a time.

use std::time::Duration;

use crate::config::FollowConfig;
use crate::effect::GestureEffect;
use crate::row::RowId;

// ---------------------------------------------------------------------------
// FrameLoop
// ---------------------------------------------------------------------------

/// One pending per-frame callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameTick {
    pub row: RowId,
    /// Session generation the tick belongs to; a newer session ignores it.
    pub session: u64,
}

/// Per-frame tick scheduler.
#[derive(Debug, Default)]
pub struct FrameLoop {
    ticks: Vec<FrameTick>,
    requested: bool,
    frames: u64,
}

impl FrameLoop {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe `row` to the next frame, requesting one if none is pending.
    pub fn request(&mut self, row: &RowId, session: u64, out: &mut Vec<GestureEffect>) {
        if !self.ticks.iter().any(|t| &t.row == row && t.session == session) {
            self.ticks.push(FrameTick {
                row: row.clone(),
                session,
            });
        }
        if !self.requested {
            self.requested = true;
            out.push(GestureEffect::RequestFrame);
        }
    }

    /// Take the subscriptions due on this frame.
    pub fn begin_frame(&mut self) -> Vec<FrameTick> {
        self.requested = false;
        self.frames += 1;
        std::mem::take(&mut self.ticks)
    }

    /// Drop every subscription for `row`.
    pub fn cancel(&mut self, row: &RowId) {
        self.ticks.retain(|t| &t.row != row);
    }

    pub fn clear(&mut self) {
        self.ticks.clear();
    }

    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.ticks.is_empty()
    }

    /// Frames delivered so far.
    #[must_use]
    pub fn frames(&self) -> u64 {
        self.frames
    }
}

// ---------------------------------------------------------------------------
// Follower
// ---------------------------------------------------------------------------

/// Adaptive 1-D low-pass follower for the drag ghost.
///
/// Each step moves `current` toward `target` by an interpolation factor that
/// grows with the remaining gap and the follower's own speed:
///
/// ```text
/// alpha = min(FOLLOW_MAX, FOLLOW_MIN + gap_gain·gap + speed_gain·speed_px_per_s)
/// ```
///
/// Within `snap_epsilon` of the target the rendered value lands exactly on it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Follower {
    target: f64,
    current: f64,
    prev_step: f64,
    last_frame: Option<Duration>,
}

impl Follower {
    /// A follower resting at `value`.
    #[must_use]
    pub fn at(value: f64) -> Self {
        Self {
            target: value,
            current: value,
            prev_step: value,
            last_frame: None,
        }
    }

    #[inline]
    pub fn set_target(&mut self, target: f64) {
        self.target = target;
    }

    #[inline]
    #[must_use]
    pub fn target(&self) -> f64 {
        self.target
    }

    /// Advance one frame and return the value to render.
    pub fn step(&mut self, now: Duration, config: &FollowConfig) -> f64 {
        let dt_ms = self
            .last_frame
            .map_or(16.0, |last| now.saturating_sub(last).as_secs_f64() * 1000.0)
            .max(1.0);
        self.last_frame = Some(now);

        let gap = (self.target - self.current).abs();
        let speed = (self.target - self.prev_step).abs() / dt_ms;
        let alpha = (config.min + config.gap_gain * gap + config.speed_gain * speed * 1000.0)
            .clamp(config.min, config.max);

        self.current += (self.target - self.current) * alpha;
        self.prev_step = self.current;
        self.rendered(config)
    }

    /// The value currently on screen.
    #[must_use]
    pub fn rendered(&self, config: &FollowConfig) -> f64 {
        if (self.target - self.current).abs() < config.snap_epsilon {
            self.target
        } else {
            self.current
        }
    }
}
