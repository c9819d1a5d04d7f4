#![forbid(unsafe_code)]

//! JSON wire protocol between the page script and the gesture engine.
//!
//! Everything here is target-independent so the contract can be tested
//! natively. The page sends camelCase payloads (pointer events, row lists,
//! layout snapshots); the engine answers with one JSON object per effect,
//! tagged by `"type"`.
//!
//! # Inbound
//!
//! ```json
//! {"pointerId":1,"row":"a1","target":"handle","x":40,"y":120,"timeMs":812.5,"scrollY":0}
//! [{"id":"a","kind":"task"},{"id":"a1","kind":"subtask","parent":"a","rightZone":96}]
//! ```
//!
//! `target` is `body`, `handle`, `control`, or a `data-act` identifier such
//! as `complete-all` or `delete`.
//!
//! # Outbound
//!
//! ```json
//! {"type":"animateRow","row":"a1","x":0,"opacity":1,"durationMs":150}
//! ```

use std::cell::{Cell, OnceCell};
use std::fmt;
use std::time::Duration;

use listgrip_core::config::SwipeConfig;
use listgrip_core::geometry::Point;
use listgrip_core::row::Zone;
use listgrip_core::{
    GestureConfig, GestureEffect, HapticSink, HitTarget, InputDisposition, LayoutProbe,
    LayoutSnapshot, ListGeometry, ListId, PointerSample, Rect, RowDescriptor, RowId, RowKind,
    TaskAction, Viewport, ZoneAction, ZoneWidths,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::warn;

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// A payload the page sent could not be understood.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProtocolError {
    /// Which payload failed (`pointer`, `rows`, `layout`, `config`, `time`).
    pub payload: &'static str,
    pub message: String,
}

impl ProtocolError {
    fn new(payload: &'static str, message: impl Into<String>) -> Self {
        Self {
            payload,
            message: message.into(),
        }
    }

    fn json(payload: &'static str, error: &serde_json::Error) -> Self {
        Self::new(payload, error.to_string())
    }
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid {} payload: {}", self.payload, self.message)
    }
}

impl std::error::Error for ProtocolError {}

// ---------------------------------------------------------------------------
// Inbound payloads
// ---------------------------------------------------------------------------

/// Host milliseconds to an engine timestamp.
pub fn time_from_ms(ms: f64) -> Result<Duration, ProtocolError> {
    Duration::try_from_secs_f64(ms / 1000.0)
        .map_err(|_| ProtocolError::new("time", format!("{ms} is not a valid timestamp")))
}

/// One pointer event.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PointerPayload {
    pub pointer_id: i32,
    #[serde(default)]
    pub row: Option<String>,
    #[serde(default = "default_target")]
    pub target: String,
    pub x: f64,
    pub y: f64,
    pub time_ms: f64,
    #[serde(default)]
    pub scroll_y: f64,
}

fn default_target() -> String {
    "body".to_owned()
}

impl PointerPayload {
    pub fn parse(json: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(json).map_err(|e| ProtocolError::json("pointer", &e))
    }

    pub fn to_sample(&self) -> Result<PointerSample, ProtocolError> {
        if !self.x.is_finite() || !self.y.is_finite() {
            return Err(ProtocolError::new("pointer", "non-finite coordinates"));
        }
        let mut sample = PointerSample::new(
            self.pointer_id,
            Point::new(self.x, self.y),
            time_from_ms(self.time_ms)?,
        )
        .with_scroll(if self.scroll_y.is_finite() { self.scroll_y } else { 0.0 });
        sample.target = parse_target(&self.target)?;
        sample.row = self.row.as_deref().map(RowId::from);
        Ok(sample)
    }
}

/// Map a hit-target label to the engine's classification.
pub fn parse_target(label: &str) -> Result<HitTarget, ProtocolError> {
    match label {
        "body" => Ok(HitTarget::Body),
        "handle" => Ok(HitTarget::Handle),
        "control" => Ok(HitTarget::Control),
        act => ZoneAction::from_data_act(act)
            .map(HitTarget::Action)
            .ok_or_else(|| ProtocolError::new("pointer", format!("unknown target `{act}`"))),
    }
}

/// One rendered row.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RowPayload {
    pub id: String,
    pub kind: RowKind,
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub left_zone: Option<f64>,
    #[serde(default)]
    pub right_zone: Option<f64>,
}

impl RowPayload {
    /// Build the engine descriptor. A row that measured only one zone uses
    /// the configured width for the other.
    pub fn into_descriptor(self, swipe: &SwipeConfig) -> Result<RowDescriptor, ProtocolError> {
        let mut row = match (self.kind, self.parent) {
            (RowKind::Task, _) => RowDescriptor::task(self.id),
            (RowKind::Subtask, Some(parent)) => RowDescriptor::subtask(self.id, parent),
            (RowKind::Subtask, None) => {
                return Err(ProtocolError::new(
                    "rows",
                    format!("subtask `{}` has no parent", self.id),
                ));
            }
        };
        if self.left_zone.is_some() || self.right_zone.is_some() {
            row = row.with_zones(ZoneWidths::new(
                self.left_zone.unwrap_or(swipe.default_left_zone),
                self.right_zone.unwrap_or(swipe.default_right_zone),
            ));
        }
        Ok(row)
    }
}

/// Parse the row list sent after every render.
pub fn parse_rows(json: &str, swipe: &SwipeConfig) -> Result<Vec<RowDescriptor>, ProtocolError> {
    let rows: Vec<RowPayload> =
        serde_json::from_str(json).map_err(|e| ProtocolError::json("rows", &e))?;
    rows.into_iter()
        .map(|row| row.into_descriptor(swipe))
        .collect()
}

/// Parse a live layout snapshot.
pub fn parse_layout(json: &str) -> Result<LayoutSnapshot, ProtocolError> {
    serde_json::from_str(json).map_err(|e| ProtocolError::json("layout", &e))
}

/// Parse an optional tuning override. Missing sections keep their defaults.
///
/// The payload must be a JSON object, and the result must pass validation.
pub fn parse_config(json: Option<&str>) -> Result<GestureConfig, ProtocolError> {
    let text = match json {
        Some(text) if !text.trim().is_empty() => text,
        _ => return Ok(GestureConfig::default()),
    };
    let value: Value =
        serde_json::from_str(text).map_err(|e| ProtocolError::json("config", &e))?;
    if !value.is_object() {
        return Err(ProtocolError::new("config", "expected a JSON object"));
    }
    let config: GestureConfig =
        serde_json::from_value(value).map_err(|e| ProtocolError::json("config", &e))?;
    config
        .validated()
        .map_err(|e| ProtocolError::new("config", e.to_string()))
}

// ---------------------------------------------------------------------------
// Lazy layout
// ---------------------------------------------------------------------------

/// A [`LayoutProbe`] that measures the page at most once, on first query.
///
/// Engine calls that never look at geometry cost no DOM reads. A failed
/// measurement yields an empty snapshot, which the engine treats as a
/// geometry failure.
pub struct LazyLayout<F>
where
    F: FnOnce() -> Result<String, String>,
{
    measure: Cell<Option<F>>,
    snapshot: OnceCell<LayoutSnapshot>,
}

impl<F> LazyLayout<F>
where
    F: FnOnce() -> Result<String, String>,
{
    pub fn new(measure: F) -> Self {
        Self {
            measure: Cell::new(Some(measure)),
            snapshot: OnceCell::new(),
        }
    }

    /// Whether the page has been measured.
    #[must_use]
    pub fn measured(&self) -> bool {
        self.snapshot.get().is_some()
    }

    fn snapshot(&self) -> &LayoutSnapshot {
        self.snapshot.get_or_init(|| {
            let Some(measure) = self.measure.take() else {
                return LayoutSnapshot::default();
            };
            match measure().map_err(|e| ProtocolError::new("layout", e)) {
                Ok(json) => parse_layout(&json).unwrap_or_else(|error| {
                    warn!(target: "listgrip.web", %error, "layout snapshot rejected");
                    LayoutSnapshot::default()
                }),
                Err(error) => {
                    warn!(target: "listgrip.web", %error, "layout measurement failed");
                    LayoutSnapshot::default()
                }
            }
        })
    }
}

impl<F> LayoutProbe for LazyLayout<F>
where
    F: FnOnce() -> Result<String, String>,
{
    fn viewport(&self) -> Option<Viewport> {
        self.snapshot().viewport()
    }

    fn row_rect(&self, row: &RowId) -> Option<Rect> {
        self.snapshot().row_rect(row)
    }

    fn lists(&self, kind: RowKind) -> Vec<ListGeometry> {
        self.snapshot().lists(kind)
    }
}

// ---------------------------------------------------------------------------
// Outbound effects
// ---------------------------------------------------------------------------

fn ms(duration: Duration) -> f64 {
    duration.as_micros() as f64 / 1000.0
}

fn list_json(list: &ListId) -> Value {
    match list {
        ListId::Tasks => json!("tasks"),
        ListId::Subtasks(parent) => json!({ "subtasks": parent.as_str() }),
    }
}

fn zone_label(zone: Zone) -> &'static str {
    match zone {
        Zone::Left => "left",
        Zone::Right => "right",
    }
}

fn action_json(action: &TaskAction) -> Value {
    let mut value = match action {
        TaskAction::CompleteOrToggle { row, kind, parent }
        | TaskAction::Delete { row, kind, parent }
        | TaskAction::Edit { row, kind, parent } => {
            let kind = match kind {
                RowKind::Task => "task",
                RowKind::Subtask => "subtask",
            };
            json!({
                "row": row.as_str(),
                "kind": kind,
                "parent": parent.as_ref().map(RowId::as_str),
            })
        }
        TaskAction::MoveSubtask {
            from_parent,
            subtask,
            to_parent,
            to_index,
        } => json!({
            "subtask": subtask.as_str(),
            "fromParent": from_parent.as_str(),
            "toParent": to_parent.as_str(),
            "toIndex": to_index,
        }),
        TaskAction::MoveTask {
            task,
            from_index,
            to_index,
        } => json!({
            "task": task.as_str(),
            "fromIndex": from_index,
            "toIndex": to_index,
        }),
    };
    value["action"] = json!(action.name());
    value
}

/// Encode one effect as a `{"type": ...}` object.
#[must_use]
pub fn effect_to_json(effect: &GestureEffect) -> Value {
    let mut value = match effect {
        GestureEffect::SetRowOffset { row, x } => json!({ "row": row.as_str(), "x": x }),
        GestureEffect::AnimateRow {
            row,
            x,
            opacity,
            duration,
        } => json!({
            "row": row.as_str(),
            "x": x,
            "opacity": opacity,
            "durationMs": ms(*duration),
        }),
        GestureEffect::SetReveal { row, left, right } => {
            json!({ "row": row.as_str(), "left": left, "right": right })
        }
        GestureEffect::PulseZone {
            row,
            zone,
            scale,
            duration,
        } => json!({
            "row": row.as_str(),
            "zone": zone_label(*zone),
            "scale": scale,
            "durationMs": ms(*duration),
        }),
        GestureEffect::SetRowFlags { row, flags } => {
            json!({ "row": row.as_str(), "classes": flags.class_names() })
        }
        GestureEffect::ResetRow { row } | GestureEffect::EndDrag { row } => {
            json!({ "row": row.as_str() })
        }
        GestureEffect::BeginDrag {
            row,
            ghost,
            list,
            index,
        } => json!({
            "row": row.as_str(),
            "ghost": {
                "left": ghost.left,
                "top": ghost.top,
                "width": ghost.width,
                "height": ghost.height,
            },
            "list": list_json(list),
            "index": index,
        }),
        GestureEffect::MoveGhost { row, x, y } => json!({ "row": row.as_str(), "x": x, "y": y }),
        GestureEffect::MovePlaceholder { list, index } => {
            json!({ "list": list_json(list), "index": index })
        }
        GestureEffect::ScrollBy { dy } => json!({ "dy": dy }),
        GestureEffect::LockScroll | GestureEffect::UnlockScroll | GestureEffect::RequestFrame => {
            json!({})
        }
        GestureEffect::Haptic(level) => json!({ "level": level.as_str() }),
        GestureEffect::ArmTimer { token, after } => {
            json!({ "token": token.0, "afterMs": ms(*after) })
        }
        GestureEffect::CancelTimer { token } => json!({ "token": token.0 }),
        GestureEffect::Invoke(action) => action_json(action),
    };
    value["type"] = json!(effect.name());
    value
}

/// Lower-case label for an input disposition.
#[must_use]
pub const fn disposition_label(disposition: InputDisposition) -> &'static str {
    match disposition {
        InputDisposition::Ignored => "ignored",
        InputDisposition::Observed => "observed",
        InputDisposition::Consumed => "consumed",
    }
}

/// Perform haptics in place and encode everything else for the page.
pub fn route_effects<I>(
    effects: I,
    haptics: &mut dyn HapticSink,
    config: &GestureConfig,
) -> Vec<String>
where
    I: IntoIterator<Item = GestureEffect>,
{
    effects
        .into_iter()
        .filter_map(|effect| {
            if let GestureEffect::Haptic(level) = effect {
                haptics.vibrate(level, config.feedback.duration(level));
                return None;
            }
            Some(effect_to_json(&effect).to_string())
        })
        .collect()
}

/// Vibration pattern length for a level, in whole milliseconds.
#[must_use]
pub fn vibrate_ms(duration: Duration) -> u32 {
    u32::try_from(duration.as_millis()).unwrap_or(u32::MAX)
}

/// The console line for a panic: `listgrip panic at file:line:col: message`.
#[must_use]
pub fn panic_line(location: Option<(&str, u32, u32)>, message: &str) -> String {
    match location {
        Some((file, line, column)) => {
            format!("listgrip panic at {file}:{line}:{column}: {message}")
        }
        None => format!("listgrip panic: {message}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use listgrip_core::effect::HapticLevel;
    use listgrip_core::{RowFlags, TimerToken};
    use pretty_assertions::assert_eq;

    #[test]
    fn pointer_payload_to_sample() {
        let payload = PointerPayload::parse(
            r#"{"pointerId":3,"row":"a1","target":"handle","x":40,"y":120.5,"timeMs":812.5,"scrollY":64}"#,
        )
        .expect("payload");
        let sample = payload.to_sample().expect("sample");
        assert_eq!(sample.pointer_id, 3);
        assert_eq!(sample.row, Some(RowId::new("a1")));
        assert_eq!(sample.target, HitTarget::Handle);
        assert_eq!(sample.position, Point::new(40.0, 120.5));
        assert_eq!(sample.time, Duration::from_micros(812_500));
        assert_eq!(sample.scroll_y, 64.0);
    }

    #[test]
    fn pointer_defaults() {
        let payload =
            PointerPayload::parse(r#"{"pointerId":1,"x":0,"y":0,"timeMs":0}"#).expect("payload");
        let sample = payload.to_sample().expect("sample");
        assert_eq!(sample.target, HitTarget::Body);
        assert_eq!(sample.row, None);
        assert_eq!(sample.scroll_y, 0.0);
    }

    #[test]
    fn data_act_targets() {
        assert_eq!(
            parse_target("complete-all"),
            Ok(HitTarget::Action(ZoneAction::Complete))
        );
        assert_eq!(
            parse_target("edit"),
            Ok(HitTarget::Action(ZoneAction::Edit))
        );
        let err = parse_target("archive").unwrap_err();
        assert_eq!(err.payload, "pointer");
        assert!(err.to_string().contains("archive"));
    }

    #[test]
    fn bad_timestamps_are_rejected() {
        assert!(time_from_ms(-1.0).is_err());
        assert!(time_from_ms(f64::NAN).is_err());
        assert!(time_from_ms(f64::INFINITY).is_err());
        assert_eq!(time_from_ms(16.0), Ok(Duration::from_millis(16)));
    }

    #[test]
    fn malformed_pointer_carries_serde_message() {
        let err = PointerPayload::parse("not json").unwrap_err();
        assert!(err.to_string().starts_with("invalid pointer payload: "));
        assert!(PointerPayload::parse(r#"{"pointerId":1}"#).is_err());
    }

    #[test]
    fn rows_fill_missing_zone_from_config() {
        let swipe = SwipeConfig::default();
        let rows = parse_rows(
            r#"[{"id":"a","kind":"task"},
                {"id":"a1","kind":"subtask","parent":"a","rightZone":96}]"#,
            &swipe,
        )
        .expect("rows");
        assert_eq!(rows[0], RowDescriptor::task("a"));
        assert_eq!(
            rows[1],
            RowDescriptor::subtask("a1", "a").with_zones(ZoneWidths::new(80.0, 96.0))
        );
    }

    #[test]
    fn orphan_subtask_is_an_error() {
        let err = parse_rows(r#"[{"id":"x","kind":"subtask"}]"#, &SwipeConfig::default())
            .unwrap_err();
        assert_eq!(err.payload, "rows");
    }

    #[test]
    fn layout_snapshot_shape() {
        let layout = parse_layout(
            r#"{
                "viewport": {"height": 800, "scrollY": 120},
                "taskLists": [{
                    "list": "tasks",
                    "rect": {"left": 0, "top": 0, "width": 320, "height": 96},
                    "slots": [
                        {"slot": "row", "id": "a", "rect": {"left": 0, "top": 0, "width": 320, "height": 48}},
                        {"slot": "placeholder", "rect": {"left": 0, "top": 48, "width": 320, "height": 48}}
                    ]
                }],
                "subtaskLists": [{
                    "list": {"subtasks": "a"},
                    "rect": {"left": 10, "top": 20, "width": 300, "height": 0},
                    "slots": []
                }]
            }"#,
        )
        .expect("layout");
        assert_eq!(
            layout.viewport(),
            Some(Viewport {
                height: 800.0,
                scroll_y: 120.0
            })
        );
        assert_eq!(
            layout.row_rect(&RowId::new("a")),
            Some(Rect::new(0.0, 0.0, 320.0, 48.0))
        );
        assert_eq!(layout.task_lists[0].placeholder_index(), Some(1));
        assert_eq!(
            layout.subtask_lists[0].list,
            ListId::Subtasks(RowId::new("a"))
        );
    }

    #[test]
    fn partial_config_keeps_defaults() {
        let config = parse_config(Some(r#"{"swipe":{"execute_distance":96}}"#)).expect("config");
        assert_eq!(config.swipe.execute_distance, 96.0);
        assert_eq!(config.drag, GestureConfig::default().drag);
        assert_eq!(parse_config(None), Ok(GestureConfig::default()));
        assert_eq!(parse_config(Some("  ")), Ok(GestureConfig::default()));
    }

    #[test]
    fn config_must_be_a_valid_object() {
        for payload in ["[1]", "1", "\"swipe\"", "null"] {
            let err = parse_config(Some(payload)).unwrap_err();
            assert_eq!(err.payload, "config", "{payload}");
        }
        let err = parse_config(Some(r#"{"swipe":{"snap_fraction":0}}"#)).unwrap_err();
        assert_eq!(err.payload, "config");
        assert!(err.to_string().contains("snap_fraction"), "{err}");
    }

    #[test]
    fn lazy_layout_measures_once_and_only_when_asked() {
        let calls = Cell::new(0);
        let untouched = LazyLayout::new(|| {
            calls.set(calls.get() + 1);
            Ok("{}".to_owned())
        });
        assert!(!untouched.measured());
        drop(untouched);
        assert_eq!(calls.get(), 0);

        let layout = LazyLayout::new(|| {
            calls.set(calls.get() + 1);
            Ok(r#"{"viewport":{"height":600,"scrollY":0}}"#.to_owned())
        });
        assert!(layout.viewport().is_some());
        assert!(layout.lists(RowKind::Task).is_empty());
        assert_eq!(layout.row_rect(&RowId::new("a")), None);
        assert!(layout.measured());
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn failed_measurement_reads_as_empty_layout() {
        let layout = LazyLayout::new(|| Err("detached".to_owned()));
        assert_eq!(layout.viewport(), None);
        let garbage = LazyLayout::new(|| Ok("{".to_owned()));
        assert_eq!(garbage.viewport(), None);
    }

    #[test]
    fn effects_are_tagged_by_type() {
        assert_eq!(
            effect_to_json(&GestureEffect::AnimateRow {
                row: RowId::new("a1"),
                x: 0.0,
                opacity: 1.0,
                duration: Duration::from_millis(150),
            }),
            json!({"type": "animateRow", "row": "a1", "x": 0.0, "opacity": 1.0, "durationMs": 150.0})
        );
        assert_eq!(
            effect_to_json(&GestureEffect::MovePlaceholder {
                list: ListId::Subtasks(RowId::new("b")),
                index: 2,
            }),
            json!({"type": "movePlaceholder", "list": {"subtasks": "b"}, "index": 2})
        );
        assert_eq!(
            effect_to_json(&GestureEffect::SetRowFlags {
                row: RowId::new("a"),
                flags: RowFlags::SWIPING | RowFlags::HELD,
            }),
            json!({"type": "setRowFlags", "row": "a", "classes": ["swiping", "held"]})
        );
        assert_eq!(
            effect_to_json(&GestureEffect::LockScroll),
            json!({"type": "lockScroll"})
        );
    }

    #[test]
    fn invoke_carries_action_fields() {
        let value = effect_to_json(&GestureEffect::Invoke(TaskAction::MoveSubtask {
            from_parent: RowId::new("a"),
            subtask: RowId::new("a2"),
            to_parent: RowId::new("b"),
            to_index: 2,
        }));
        assert_eq!(
            value,
            json!({
                "type": "invoke",
                "action": "moveSubtask",
                "subtask": "a2",
                "fromParent": "a",
                "toParent": "b",
                "toIndex": 2,
            })
        );
        let toggle = effect_to_json(&GestureEffect::Invoke(TaskAction::CompleteOrToggle {
            row: RowId::new("t"),
            kind: RowKind::Task,
            parent: None,
        }));
        assert_eq!(toggle["parent"], Value::Null);
        assert_eq!(toggle["kind"], "task");
    }

    struct Recorded(Vec<(HapticLevel, Duration)>);

    impl HapticSink for Recorded {
        fn vibrate(&mut self, level: HapticLevel, duration: Duration) {
            self.0.push((level, duration));
        }
    }

    #[test]
    fn haptics_are_performed_not_forwarded() {
        let config = GestureConfig::default();
        let mut sink = Recorded(Vec::new());
        let lines = route_effects(
            vec![
                GestureEffect::Haptic(HapticLevel::Success),
                GestureEffect::ArmTimer {
                    token: TimerToken(7),
                    after: Duration::from_millis(350),
                },
            ],
            &mut sink,
            &config,
        );
        assert_eq!(sink.0, vec![(HapticLevel::Success, Duration::from_millis(15))]);
        assert_eq!(lines, vec![r#"{"afterMs":350.0,"token":7,"type":"armTimer"}"#]);
    }

    #[test]
    fn vibrate_length_saturates() {
        assert_eq!(vibrate_ms(Duration::from_millis(8)), 8);
        assert_eq!(vibrate_ms(Duration::from_secs(u64::MAX)), u32::MAX);
    }

    #[test]
    fn panic_line_names_the_location_when_known() {
        assert_eq!(
            panic_line(Some(("src/drag.rs", 41, 9)), "slot vanished"),
            "listgrip panic at src/drag.rs:41:9: slot vanished"
        );
        assert_eq!(panic_line(None, "boom"), "listgrip panic: boom");
    }
}
