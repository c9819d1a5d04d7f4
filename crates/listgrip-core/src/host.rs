#![forbid(unsafe_code)]

//! Routing drained effects to the host's collaborators.
//!
//! [`dispatch`] is the only place task operations run. Their failures are
//! logged and swallowed: by the time an [`GestureEffect::Invoke`] is
//! dispatched the engine has already queued its own cleanup, so a failed
//! move or toggle can never leave a ghost or a held lock behind.

use std::time::Duration;

use tracing::{trace, warn};

use crate::action::TaskActions;
use crate::config::FeedbackConfig;
use crate::effect::{GestureEffect, HapticLevel};

/// Vibration hardware. Missing hardware is a silent no-op.
pub trait HapticSink {
    fn vibrate(&mut self, level: HapticLevel, duration: Duration);
}

/// A sink for platforms without vibration.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHaptics;

impl HapticSink for NoHaptics {
    fn vibrate(&mut self, _level: HapticLevel, _duration: Duration) {}
}

/// The rendering side: applies visual, scroll, and timer effects.
pub trait ViewSync {
    fn apply(&mut self, effect: &GestureEffect);
}

/// Counts from one [`dispatch`] pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchReport {
    /// Effects handed to the view.
    pub applied: usize,
    /// Task operations started successfully.
    pub invoked: usize,
    /// Task operations that reported an error.
    pub failed: usize,
    pub haptics: usize,
}

/// Route each effect, in order, to the collaborator that owns it.
pub fn dispatch<I>(
    effects: I,
    view: &mut dyn ViewSync,
    actions: &mut dyn TaskActions,
    haptics: &mut dyn HapticSink,
    feedback: &FeedbackConfig,
) -> DispatchReport
where
    I: IntoIterator<Item = GestureEffect>,
{
    let mut report = DispatchReport::default();
    for effect in effects {
        match &effect {
            GestureEffect::Haptic(level) => {
                haptics.vibrate(*level, feedback.duration(*level));
                report.haptics += 1;
            }
            GestureEffect::Invoke(action) => match actions.invoke(action) {
                Ok(()) => {
                    trace!(target: "listgrip.gesture", action = action.name(), row = %action.row(), "task action started");
                    report.invoked += 1;
                }
                Err(error) => {
                    warn!(
                        target: "listgrip.gesture",
                        action = action.name(),
                        row = %action.row(),
                        %error,
                        "task action failed; gesture cleanup continues"
                    );
                    report.failed += 1;
                }
            },
            _ => {
                view.apply(&effect);
                report.applied += 1;
            }
        }
    }
    report
}
