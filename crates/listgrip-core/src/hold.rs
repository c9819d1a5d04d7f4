#![forbid(unsafe_code)]

//! Liveness-guarded hold timer.
//!
//! The host owns real timers. Arming emits [`GestureEffect::ArmTimer`] with a
//! fresh [`TimerToken`]; the host calls back with that token when it elapses.
//! A token only fires if it is still the armed one, so a callback that lands
//! after cancel, release, or re-arm is ignored.

use std::time::Duration;

use crate::cx::GestureCx;
use crate::effect::GestureEffect;
use crate::geometry::Point;

/// Opaque identity of one armed timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerToken(pub u64);

#[derive(Debug, Clone, Copy)]
struct Armed {
    token: TimerToken,
    origin: Point,
}

/// A single pending hold, measured from an origin point.
#[derive(Debug, Clone, Default)]
pub struct HoldTimer {
    armed: Option<Armed>,
}

impl HoldTimer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm for `after`, replacing any pending hold.
    pub fn start(&mut self, cx: &mut GestureCx<'_>, origin: Point, after: Duration) -> TimerToken {
        self.cancel(cx);
        let token = cx.timers.next();
        cx.emit(GestureEffect::ArmTimer { token, after });
        self.armed = Some(Armed { token, origin });
        token
    }

    /// Drop the pending hold, if any. Never re-arms.
    pub fn cancel(&mut self, cx: &mut GestureCx<'_>) {
        if let Some(armed) = self.armed.take() {
            cx.emit(GestureEffect::CancelTimer {
                token: armed.token,
            });
        }
    }

    /// Cancel if `at` has strayed more than `tolerance` from the origin on
    /// either axis. Returns true if the hold was cancelled by this call.
    pub fn cancel_if_moved(&mut self, cx: &mut GestureCx<'_>, at: Point, tolerance: f64) -> bool {
        match self.armed {
            Some(armed) if armed.origin.chebyshev_distance(at) > tolerance => {
                self.cancel(cx);
                true
            }
            _ => false,
        }
    }

    /// Consume `token` if it is the armed one.
    pub fn fire(&mut self, token: TimerToken) -> bool {
        match self.armed {
            Some(armed) if armed.token == token => {
                self.armed = None;
                true
            }
            _ => false,
        }
    }

    #[inline]
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.armed.is_some()
    }
}
