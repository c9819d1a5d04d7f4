#![forbid(unsafe_code)]

//! Per-call engine context.

use std::cell::Cell;
use std::time::Duration;

use crate::arbiter::GestureArbiter;
use crate::config::GestureConfig;
use crate::effect::GestureEffect;
use crate::hold::TimerToken;

/// Source of controller-unique timer tokens.
#[derive(Debug, Default)]
pub struct TimerIds {
    next: Cell<u64>,
}

impl TimerIds {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A token never returned before by this source.
    pub fn next(&self) -> TimerToken {
        let id = self.next.get() + 1;
        self.next.set(id);
        TimerToken(id)
    }
}

/// Everything an engine may touch while handling one host call.
///
/// Engines own only their per-row session state. Shared services (config,
/// lock, timer ids) are borrowed, and every output goes to `out`.
pub struct GestureCx<'a> {
    pub config: &'a GestureConfig,
    pub arbiter: &'a GestureArbiter,
    pub timers: &'a TimerIds,
    /// Host clock at the moment of the call.
    pub now: Duration,
    pub out: &'a mut Vec<GestureEffect>,
}

impl GestureCx<'_> {
    #[inline]
    pub fn emit(&mut self, effect: GestureEffect) {
        self.out.push(effect);
    }
}
