#![forbid(unsafe_code)]

//! `wasm-bindgen` exports for [`ListGripWeb`].
//!
//! Wraps a [`GestureController`] with JS-friendly signatures. Payloads are
//! JSON strings (see [`crate::protocol`]); malformed input is logged and
//! ignored so a bad event never leaves a gesture half torn down.
//! Only compiled on `wasm32` targets.

use std::time::Duration;

use js_sys::{Array, Function, Reflect};
use listgrip_core::effect::HapticLevel;
use listgrip_core::{GestureController, HapticSink, InputDisposition, RowId, TimerToken, ZoneAction};
use tracing::warn;
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;

use crate::protocol::{
    LazyLayout, PointerPayload, ProtocolError, disposition_label, panic_line, parse_config,
    parse_rows, route_effects, time_from_ms, vibrate_ms,
};

/// `console[method](line)`, looked up through `Reflect` so a host without a
/// console stays silent.
fn console_line(method: &str, line: &str) {
    let console = match Reflect::get(&js_sys::global(), &"console".into()) {
        Ok(console) if console.is_object() => console,
        _ => return,
    };
    let Some(print) = Reflect::get(&console, &method.into())
        .ok()
        .and_then(|f| f.dyn_into::<Function>().ok())
    else {
        return;
    };
    let _ = print.call1(&console, &JsValue::from_str(line));
}

/// Panics reach the page as one `console.error` line. Installed once per module.
fn report_panics_to_console() {
    use std::sync::Once;

    static HOOK: Once = Once::new();
    HOOK.call_once(|| {
        std::panic::set_hook(Box::new(|info| {
            let location = info
                .location()
                .map(|loc| (loc.file(), loc.line(), loc.column()));
            console_line("error", &panic_line(location, &info.to_string()));
        }));
    });
}

fn rejected(error: &ProtocolError) {
    warn!(target: "listgrip.web", %error, "payload rejected");
}

/// `navigator.vibrate`; a missing window or navigator does nothing.
struct NavigatorHaptics;

impl HapticSink for NavigatorHaptics {
    fn vibrate(&mut self, _level: HapticLevel, duration: Duration) {
        if let Some(window) = web_sys::window() {
            let _ = window.navigator().vibrate_with_duration(vibrate_ms(duration));
        }
    }
}

fn measure_with(measure: Option<&Function>) -> impl FnOnce() -> Result<String, String> + '_ {
    move || {
        let measure = measure.ok_or_else(|| "no measure function installed".to_owned())?;
        measure
            .call0(&JsValue::NULL)
            .map_err(|e| format!("measure threw: {e:?}"))?
            .as_string()
            .ok_or_else(|| "measure must return a JSON string".to_owned())
    }
}

/// The gesture engine for one page.
#[wasm_bindgen]
pub struct ListGripWeb {
    controller: GestureController,
    measure: Option<Function>,
}

#[wasm_bindgen]
impl ListGripWeb {
    /// Create an engine, optionally overriding tuning with a JSON config.
    #[wasm_bindgen(constructor)]
    pub fn new(config_json: Option<String>) -> Result<ListGripWeb, JsValue> {
        report_panics_to_console();
        let config = parse_config(config_json.as_deref())
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        let controller =
            GestureController::new(config).map_err(|e| JsValue::from_str(&e.to_string()))?;
        Ok(Self {
            controller,
            measure: None,
        })
    }

    /// Install the function that returns the live layout snapshot as JSON.
    /// It is called at most once per engine call, and only when geometry is
    /// needed.
    #[wasm_bindgen(js_name = setMeasure)]
    pub fn set_measure(&mut self, measure: Function) {
        self.measure = Some(measure);
    }

    /// Re-bind rows after a render.
    #[wasm_bindgen(js_name = attachRows)]
    pub fn attach_rows(&mut self, rows_json: &str, time_ms: f64) -> Result<(), JsValue> {
        let now = time_from_ms(time_ms).map_err(|e| JsValue::from_str(&e.to_string()))?;
        let rows = parse_rows(rows_json, &self.controller.config().swipe)
            .map_err(|e| JsValue::from_str(&e.to_string()))?;
        self.controller.attach_rows(rows, now);
        Ok(())
    }

    /// Returns `"ignored"`, `"observed"`, or `"consumed"`; on `"consumed"`
    /// the caller must `preventDefault`.
    #[wasm_bindgen(js_name = pointerDown)]
    pub fn pointer_down(&mut self, payload_json: &str) -> String {
        let disposition = match PointerPayload::parse(payload_json).and_then(|p| p.to_sample()) {
            Ok(sample) => self.controller.pointer_down(&sample),
            Err(error) => {
                rejected(&error);
                InputDisposition::Ignored
            }
        };
        disposition_label(disposition).to_owned()
    }

    #[wasm_bindgen(js_name = pointerMove)]
    pub fn pointer_move(&mut self, payload_json: &str) -> String {
        let disposition = match PointerPayload::parse(payload_json).and_then(|p| p.to_sample()) {
            Ok(sample) => {
                let layout = LazyLayout::new(measure_with(self.measure.as_ref()));
                self.controller.pointer_move(&sample, &layout)
            }
            Err(error) => {
                rejected(&error);
                InputDisposition::Ignored
            }
        };
        disposition_label(disposition).to_owned()
    }

    #[wasm_bindgen(js_name = pointerUp)]
    pub fn pointer_up(&mut self, payload_json: &str) -> String {
        let disposition = match PointerPayload::parse(payload_json).and_then(|p| p.to_sample()) {
            Ok(sample) => {
                let layout = LazyLayout::new(measure_with(self.measure.as_ref()));
                self.controller.pointer_up(&sample, &layout)
            }
            Err(error) => {
                rejected(&error);
                InputDisposition::Ignored
            }
        };
        disposition_label(disposition).to_owned()
    }

    #[wasm_bindgen(js_name = pointerCancel)]
    pub fn pointer_cancel(&mut self, payload_json: &str) -> String {
        let disposition = match PointerPayload::parse(payload_json).and_then(|p| p.to_sample()) {
            Ok(sample) => self.controller.pointer_cancel(&sample),
            Err(error) => {
                rejected(&error);
                InputDisposition::Ignored
            }
        };
        disposition_label(disposition).to_owned()
    }

    /// Deliver an `armTimer` callback. Stale tokens return `false`.
    #[wasm_bindgen(js_name = timerFired)]
    pub fn timer_fired(&mut self, token: f64, time_ms: f64) -> bool {
        if !token.is_finite() || token < 0.0 {
            return false;
        }
        match time_from_ms(time_ms) {
            Ok(now) => self.controller.timer_fired(TimerToken(token as u64), now),
            Err(error) => {
                rejected(&error);
                false
            }
        }
    }

    /// Deliver a `requestFrame` callback.
    pub fn frame(&mut self, time_ms: f64) {
        match time_from_ms(time_ms) {
            Ok(now) => {
                let layout = LazyLayout::new(measure_with(self.measure.as_ref()));
                self.controller.frame(now, &layout);
            }
            Err(error) => rejected(&error),
        }
    }

    /// An action button in a revealed zone was tapped. `act` is its
    /// `data-act` identifier.
    #[wasm_bindgen(js_name = actionTapped)]
    pub fn action_tapped(&mut self, row: &str, act: &str, time_ms: f64) -> bool {
        let Some(action) = ZoneAction::from_data_act(act) else {
            warn!(target: "listgrip.web", act, "unknown action button");
            return false;
        };
        match time_from_ms(time_ms) {
            Ok(now) => self.controller.action_tapped(&RowId::new(row), action, now),
            Err(error) => {
                rejected(&error);
                false
            }
        }
    }

    #[wasm_bindgen(js_name = setSwipeEnabled)]
    pub fn set_swipe_enabled(&mut self, enabled: bool, time_ms: f64) {
        let now = time_from_ms(time_ms).unwrap_or(Duration::ZERO);
        self.controller.set_swipe_enabled(enabled, now);
    }

    #[wasm_bindgen(js_name = setDevicePixelRatio)]
    pub fn set_device_pixel_ratio(&mut self, ratio: f64) {
        self.controller.set_device_pixel_ratio(ratio);
    }

    /// Tear down every live gesture (pointer capture lost, page hidden).
    #[wasm_bindgen(js_name = abortAll)]
    pub fn abort_all(&mut self, time_ms: f64) {
        let now = time_from_ms(time_ms).unwrap_or(Duration::ZERO);
        self.controller.abort_all(now);
    }

    /// Pending effects as JSON strings, oldest first. Haptics have already
    /// been performed and are not included.
    #[wasm_bindgen(js_name = drainEffects)]
    pub fn drain_effects(&mut self) -> Array {
        let effects = self.controller.drain_effects();
        let lines = route_effects(effects, &mut NavigatorHaptics, self.controller.config());
        let out = Array::new();
        for line in lines {
            out.push(&JsValue::from_str(&line));
        }
        out
    }
}
