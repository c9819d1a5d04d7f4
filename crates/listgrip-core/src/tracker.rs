#![forbid(unsafe_code)]

//! Pointer session tracking, horizontal velocity, and scroll disambiguation.

use std::collections::VecDeque;
use std::time::Duration;

use crate::config::SwipeConfig;
use crate::geometry::Point;

// ---------------------------------------------------------------------------
// Velocity
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
struct Sample {
    t: Duration,
    x: f64,
}

/// Horizontal velocity over a sliding time window.
///
/// Samples older than `window` behind the newest one are pruned on push.
/// Vertical motion never enters the window.
#[derive(Debug, Clone)]
pub struct VelocityWindow {
    samples: VecDeque<Sample>,
    window: Duration,
}

impl VelocityWindow {
    #[must_use]
    pub fn new(window: Duration) -> Self {
        Self {
            samples: VecDeque::with_capacity(16),
            window,
        }
    }

    pub fn push(&mut self, t: Duration, x: f64) {
        self.samples.push_back(Sample { t, x });
        while let Some(front) = self.samples.front() {
            if t.saturating_sub(front.t) > self.window {
                self.samples.pop_front();
            } else {
                break;
            }
        }
    }

    /// Signed velocity in px/ms, `(latest.x - earliest.x) / dt`.
    ///
    /// `None` with fewer than two samples or zero elapsed time.
    #[must_use]
    pub fn velocity(&self) -> Option<f64> {
        let first = self.samples.front()?;
        let last = self.samples.back()?;
        let dt = last.t.saturating_sub(first.t).as_secs_f64() * 1000.0;
        if dt <= 0.0 {
            return None;
        }
        Some((last.x - first.x) / dt)
    }

    /// Whether the newest sample lies within the window of `now`.
    #[must_use]
    pub fn is_fresh(&self, now: Duration) -> bool {
        self.samples
            .back()
            .is_some_and(|last| now.saturating_sub(last.t) <= self.window)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}

// ---------------------------------------------------------------------------
// Disambiguation
// ---------------------------------------------------------------------------

/// Outcome of the scroll-versus-swipe decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    /// Not enough movement to decide.
    Pending,
    /// The user is scrolling; abandon the session.
    Scroll,
    /// Horizontal intent confirmed.
    Captured,
}

/// One pointer session from down to up.
#[derive(Debug, Clone)]
pub struct PointerTracker {
    pointer_id: i32,
    start: Point,
    start_time: Duration,
    start_scroll: f64,
    last: Point,
    last_time: Duration,
    velocity: VelocityWindow,
}

impl PointerTracker {
    #[must_use]
    pub fn new(pointer_id: i32, at: Point, now: Duration, scroll_y: f64, window: Duration) -> Self {
        let mut velocity = VelocityWindow::new(window);
        velocity.push(now, at.x);
        Self {
            pointer_id,
            start: at,
            start_time: now,
            start_scroll: scroll_y,
            last: at,
            last_time: now,
            velocity,
        }
    }

    pub fn update(&mut self, at: Point, now: Duration) {
        self.last = at;
        self.last_time = now;
        self.velocity.push(now, at.x);
    }

    #[inline]
    #[must_use]
    pub fn pointer_id(&self) -> i32 {
        self.pointer_id
    }

    #[inline]
    #[must_use]
    pub fn start(&self) -> Point {
        self.start
    }

    #[inline]
    #[must_use]
    pub fn last(&self) -> Point {
        self.last
    }

    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.last_time.saturating_sub(self.start_time)
    }

    /// Displacement from the start point.
    #[inline]
    #[must_use]
    pub fn dx(&self) -> f64 {
        self.last.x - self.start.x
    }

    #[inline]
    #[must_use]
    pub fn dy(&self) -> f64 {
        self.last.y - self.start.y
    }

    #[must_use]
    pub fn velocity(&self) -> &VelocityWindow {
        &self.velocity
    }

    /// Decide between scroll and horizontal intent.
    ///
    /// Vertical travel past the guard, or page scroll drift past tolerance,
    /// wins over any horizontal distance.
    #[must_use]
    pub fn disambiguate(&self, scroll_y: f64, config: &SwipeConfig) -> Intent {
        let drift = (scroll_y - self.start_scroll).abs();
        if self.dy().abs() > config.vertical_guard || drift > config.scroll_tolerance {
            Intent::Scroll
        } else if self.dx().abs() >= config.min_intent_distance {
            Intent::Captured
        } else {
            Intent::Pending
        }
    }

    /// Whether a release at `now` qualifies as a fling.
    ///
    /// Returns the direction sign (`1.0` or `-1.0`) when the speed,
    /// travel, and freshness rules all hold.
    #[must_use]
    pub fn fling(&self, now: Duration, config: &SwipeConfig) -> Option<f64> {
        let v = self.velocity.velocity()?;
        let dx = self.dx();
        let fast = v.abs() >= config.fling_velocity;
        let far = dx.abs() >= config.fling_min_distance;
        let agrees = v.signum() == dx.signum();
        (fast && far && agrees && self.velocity.is_fresh(now)).then(|| v.signum())
    }
}
