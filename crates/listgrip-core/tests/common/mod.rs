//! Simulated stacked-list page for integration tests.
//!
//! The page is a single column of task cards. Each card has a 40px header
//! followed by its subtask list (40px rows, never shorter than one row) and
//! 10px of padding. Geometry is recomputed from the board on every probe, so
//! placeholder moves and auto-scroll reflow the page exactly like a browser
//! would between frames.

#![allow(dead_code)]

use std::collections::BTreeMap;
use std::time::Duration;

use ahash::AHashMap;
use listgrip_core::{
    ActionError, GestureConfig, GestureController, GestureEffect, HapticLevel, HapticSink,
    HitTarget, InputDisposition, LayoutProbe, LayoutSnapshot, ListGeometry, ListId, Point,
    PointerSample, Rect, RowDescriptor, RowFlags, RowId, RowKind, Slot, TaskAction, TaskActions,
    TimerToken, ViewSync, Viewport, dispatch,
};

pub const COLUMN_LEFT: f64 = 20.0;
pub const COLUMN_WIDTH: f64 = 300.0;
pub const SUB_LEFT: f64 = 40.0;
pub const SUB_WIDTH: f64 = 260.0;
pub const HEADER: f64 = 40.0;
pub const ROW: f64 = 40.0;
pub const PAD: f64 = 10.0;
pub const FRAME: Duration = Duration::from_millis(16);

pub fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

// ── Board ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub id: String,
    pub subtasks: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Board {
    pub cards: Vec<Card>,
}

impl Board {
    /// `[("A", &["a1", "a2"]), ...]`
    pub fn new(cards: &[(&str, &[&str])]) -> Self {
        Self {
            cards: cards
                .iter()
                .map(|(id, subs)| Card {
                    id: (*id).to_string(),
                    subtasks: subs.iter().map(|s| (*s).to_string()).collect(),
                })
                .collect(),
        }
    }

    pub fn descriptors(&self) -> Vec<RowDescriptor> {
        let mut rows = Vec::new();
        for card in &self.cards {
            rows.push(RowDescriptor::task(card.id.as_str()));
            for sub in &card.subtasks {
                rows.push(RowDescriptor::subtask(sub.as_str(), card.id.as_str()));
            }
        }
        rows
    }

    pub fn subtasks_of(&self, card: &str) -> Vec<&str> {
        self.cards
            .iter()
            .find(|c| c.id == card)
            .map(|c| c.subtasks.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn order(&self) -> Vec<&str> {
        self.cards.iter().map(|c| c.id.as_str()).collect()
    }

    fn apply(&mut self, action: &TaskAction) {
        match action {
            TaskAction::MoveSubtask {
                from_parent,
                subtask,
                to_parent,
                to_index,
            } => {
                let Some(from) = self.cards.iter_mut().find(|c| c.id == from_parent.as_str()) else {
                    return;
                };
                let Some(pos) = from.subtasks.iter().position(|s| s == subtask.as_str()) else {
                    return;
                };
                let moved = from.subtasks.remove(pos);
                if let Some(to) = self.cards.iter_mut().find(|c| c.id == to_parent.as_str()) {
                    let index = (*to_index).min(to.subtasks.len());
                    to.subtasks.insert(index, moved);
                }
            }
            TaskAction::MoveTask {
                from_index,
                to_index,
                ..
            } => {
                if *from_index < self.cards.len() {
                    let card = self.cards.remove(*from_index);
                    let index = (*to_index).min(self.cards.len());
                    self.cards.insert(index, card);
                }
            }
            TaskAction::Delete { row, kind, parent } => match (kind, parent) {
                (RowKind::Task, _) => self.cards.retain(|c| c.id != row.as_str()),
                (RowKind::Subtask, Some(parent)) => {
                    if let Some(card) = self.cards.iter_mut().find(|c| c.id == parent.as_str()) {
                        card.subtasks.retain(|s| s != row.as_str());
                    }
                }
                (RowKind::Subtask, None) => {}
            },
            TaskAction::CompleteOrToggle { .. } | TaskAction::Edit { .. } => {}
        }
    }
}

// ── View ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub struct PlaceholderAt {
    pub row: RowId,
    pub kind: RowKind,
    pub height: f64,
    pub list: ListId,
    pub index: usize,
}

#[derive(Debug)]
pub struct SimView {
    pub board: Board,
    pub viewport_height: f64,
    pub scroll_y: f64,
    pub scroll_locked: bool,
    pub now: Duration,
    pub offsets: AHashMap<RowId, f64>,
    pub opacity: AHashMap<RowId, f64>,
    pub flags: AHashMap<RowId, RowFlags>,
    pub placeholder: Option<PlaceholderAt>,
    pub ghost: Option<(RowId, f64, f64)>,
    pub timers: BTreeMap<TimerToken, Duration>,
    pub next_frame: Option<Duration>,
    pub scrolled: f64,
}

impl SimView {
    pub fn new(board: Board, viewport_height: f64) -> Self {
        Self {
            board,
            viewport_height,
            scroll_y: 0.0,
            scroll_locked: false,
            now: Duration::ZERO,
            offsets: AHashMap::new(),
            opacity: AHashMap::new(),
            flags: AHashMap::new(),
            placeholder: None,
            ghost: None,
            timers: BTreeMap::new(),
            next_frame: None,
            scrolled: 0.0,
        }
    }

    pub fn offset(&self, row: &str) -> f64 {
        self.offsets.get(&RowId::new(row)).copied().unwrap_or(0.0)
    }

    pub fn flags(&self, row: &str) -> RowFlags {
        self.flags.get(&RowId::new(row)).copied().unwrap_or_default()
    }

    fn is_dragged(&self, id: &str) -> bool {
        self.placeholder
            .as_ref()
            .is_some_and(|p| p.row.as_str() == id)
    }

    fn placeholder_in(&self, list: &ListId) -> Option<(usize, f64)> {
        self.placeholder
            .as_ref()
            .filter(|p| &p.list == list)
            .map(|p| (p.index, p.height))
    }

    /// Lay out `ids` from `top`, inserting the placeholder where it belongs.
    fn lay_out(
        &self,
        list: &ListId,
        ids: &[&str],
        left: f64,
        width: f64,
        top: f64,
        row_height: impl Fn(&str) -> f64,
    ) -> (Vec<Slot>, f64) {
        let placeholder = self.placeholder_in(list);
        let mut slots = Vec::new();
        let mut y = top;
        let flow: Vec<&str> = ids.iter().copied().filter(|id| !self.is_dragged(id)).collect();
        let insert_at = placeholder.map(|(i, _)| i.min(flow.len()));
        for i in 0..=flow.len() {
            if insert_at == Some(i)
                && let Some((_, height)) = placeholder
            {
                slots.push(Slot::Placeholder {
                    rect: Rect::new(left, y, width, height),
                });
                y += height;
            }
            if let Some(&id) = flow.get(i) {
                let h = row_height(id);
                slots.push(Slot::Row {
                    id: RowId::new(id),
                    rect: Rect::new(left, y, width, h),
                });
                y += h;
            }
        }
        (slots, y - top)
    }

    /// Geometry in viewport coordinates.
    pub fn snapshot(&self) -> LayoutSnapshot {
        let mut subtask_lists = Vec::new();
        let mut card_heights = AHashMap::new();
        let mut y = -self.scroll_y;

        // Card heights depend on their subtask lists, which do not depend on
        // the card's own position; lay subtasks out first at a fake origin.
        for card in &self.board.cards {
            let list = ListId::Subtasks(RowId::new(card.id.as_str()));
            let ids: Vec<&str> = card.subtasks.iter().map(String::as_str).collect();
            let (_, height) = self.lay_out(&list, &ids, SUB_LEFT, SUB_WIDTH, 0.0, |_| ROW);
            card_heights.insert(card.id.clone(), HEADER + height.max(ROW) + PAD);
        }

        let order: Vec<&str> = self.board.order();
        let card_height = |id: &str| card_heights.get(id).copied().unwrap_or(HEADER + ROW + PAD);
        let (column_slots, column_height) =
            self.lay_out(&ListId::Tasks, &order, COLUMN_LEFT, COLUMN_WIDTH, y, card_height);

        for slot in &column_slots {
            if let Slot::Row { id, rect } = slot {
                let list = ListId::Subtasks(id.clone());
                let ids = self.board.subtasks_of(id.as_str());
                let top = rect.top + HEADER;
                let (slots, height) = self.lay_out(&list, &ids, SUB_LEFT, SUB_WIDTH, top, |_| ROW);
                subtask_lists.push(ListGeometry {
                    list,
                    rect: Rect::new(SUB_LEFT, top, SUB_WIDTH, height.max(ROW)),
                    slots,
                });
            }
        }
        y += column_height;

        let task_lists = vec![ListGeometry {
            list: ListId::Tasks,
            rect: Rect::new(COLUMN_LEFT, -self.scroll_y, COLUMN_WIDTH, y + self.scroll_y),
            slots: column_slots,
        }];
        LayoutSnapshot {
            viewport: Some(Viewport {
                height: self.viewport_height,
                scroll_y: self.scroll_y,
            }),
            rows: Vec::new(),
            task_lists,
            subtask_lists,
        }
    }

    pub fn row_rect(&self, id: &str) -> Option<Rect> {
        self.snapshot().row_rect(&RowId::new(id))
    }

    fn content_height(&self) -> f64 {
        let snapshot = self.snapshot();
        snapshot
            .task_lists
            .first()
            .map_or(0.0, |l| l.rect.height)
    }
}

impl LayoutProbe for SimView {
    fn viewport(&self) -> Option<Viewport> {
        Some(Viewport {
            height: self.viewport_height,
            scroll_y: self.scroll_y,
        })
    }

    fn row_rect(&self, row: &RowId) -> Option<Rect> {
        self.snapshot().row_rect(row)
    }

    fn lists(&self, kind: RowKind) -> Vec<ListGeometry> {
        self.snapshot().lists(kind)
    }
}

impl ViewSync for SimView {
    fn apply(&mut self, effect: &GestureEffect) {
        match effect {
            GestureEffect::SetRowOffset { row, x } => {
                self.offsets.insert(row.clone(), *x);
            }
            GestureEffect::AnimateRow { row, x, opacity, .. } => {
                self.offsets.insert(row.clone(), *x);
                self.opacity.insert(row.clone(), *opacity);
            }
            GestureEffect::ResetRow { row } => {
                self.offsets.remove(row);
                self.opacity.remove(row);
                self.flags.remove(row);
            }
            GestureEffect::SetRowFlags { row, flags } => {
                self.flags.insert(row.clone(), *flags);
            }
            GestureEffect::BeginDrag {
                row,
                ghost,
                list,
                index,
            } => {
                let kind = match list {
                    ListId::Tasks => RowKind::Task,
                    ListId::Subtasks(_) => RowKind::Subtask,
                };
                self.placeholder = Some(PlaceholderAt {
                    row: row.clone(),
                    kind,
                    height: ghost.height,
                    list: list.clone(),
                    index: *index,
                });
                self.ghost = Some((row.clone(), ghost.left, ghost.top));
            }
            GestureEffect::MoveGhost { row, x, y } => {
                self.ghost = Some((row.clone(), *x, *y));
            }
            GestureEffect::MovePlaceholder { list, index } => {
                if let Some(p) = self.placeholder.as_mut() {
                    p.list = list.clone();
                    p.index = *index;
                }
            }
            GestureEffect::EndDrag { .. } => {
                self.placeholder = None;
                self.ghost = None;
            }
            GestureEffect::ScrollBy { dy } => {
                let max = (self.content_height() - self.viewport_height).max(0.0);
                let next = (self.scroll_y + dy).clamp(0.0, max);
                self.scrolled += next - self.scroll_y;
                self.scroll_y = next;
            }
            GestureEffect::LockScroll => self.scroll_locked = true,
            GestureEffect::UnlockScroll => self.scroll_locked = false,
            GestureEffect::ArmTimer { token, after } => {
                self.timers.insert(*token, self.now + *after);
            }
            GestureEffect::CancelTimer { token } => {
                self.timers.remove(token);
            }
            GestureEffect::RequestFrame => {
                self.next_frame.get_or_insert(self.now + FRAME);
            }
            GestureEffect::SetReveal { .. }
            | GestureEffect::PulseZone { .. }
            | GestureEffect::Haptic(_)
            | GestureEffect::Invoke(_) => {}
        }
    }
}

// ── Collaborators ───────────────────────────────────────────────────────

#[derive(Debug, Default)]
pub struct SimStore {
    pub invoked: Vec<TaskAction>,
    pub fail_with: Option<String>,
}

impl TaskActions for SimStore {
    fn invoke(&mut self, action: &TaskAction) -> Result<(), ActionError> {
        self.invoked.push(action.clone());
        match &self.fail_with {
            Some(message) => Err(ActionError::new(action, message.clone())),
            None => Ok(()),
        }
    }
}

#[derive(Debug, Default)]
pub struct SimHaptics(pub Vec<HapticLevel>);

impl HapticSink for SimHaptics {
    fn vibrate(&mut self, level: HapticLevel, _duration: Duration) {
        self.0.push(level);
    }
}

// ── Harness ─────────────────────────────────────────────────────────────

pub struct Harness {
    pub controller: GestureController,
    pub view: SimView,
    pub store: SimStore,
    pub haptics: SimHaptics,
    pub now: Duration,
    /// Every effect dispatched so far, in order.
    pub log: Vec<GestureEffect>,
    applied: usize,
}

impl Harness {
    pub fn new(board: Board) -> Self {
        Self::with_config(board, GestureConfig::default())
    }

    pub fn with_config(board: Board, config: GestureConfig) -> Self {
        let controller = GestureController::new(config).expect("valid config");
        let mut harness = Self {
            controller,
            view: SimView::new(board, 1000.0),
            store: SimStore::default(),
            haptics: SimHaptics::default(),
            now: Duration::ZERO,
            log: Vec::new(),
            applied: 0,
        };
        harness.render();
        harness
    }

    /// Re-attach rows after the board changed.
    pub fn render(&mut self) {
        let rows = self.view.board.descriptors();
        self.controller.attach_rows(rows, self.now);
        self.flush();
    }

    /// Dispatch pending effects and apply successful task moves to the board.
    pub fn flush(&mut self) {
        let effects = self.controller.drain_effects();
        if effects.is_empty() {
            return;
        }
        self.log.extend(effects.iter().cloned());
        self.view.now = self.now;
        let feedback = self.controller.config().feedback.clone();
        dispatch(
            effects,
            &mut self.view,
            &mut self.store,
            &mut self.haptics,
            &feedback,
        );
        if self.store.fail_with.is_some() {
            self.applied = self.store.invoked.len();
            return;
        }
        let fresh: Vec<TaskAction> = self.store.invoked[self.applied..].to_vec();
        self.applied = self.store.invoked.len();
        let mut changed = false;
        for action in &fresh {
            let before = self.view.board.clone();
            self.view.board.apply(action);
            changed |= before != self.view.board;
        }
        if changed {
            self.render();
        }
    }

    /// Let `ms` pass, firing due timers and running requested frames in
    /// time order.
    pub fn advance(&mut self, ms: u64) {
        let end = self.now + Duration::from_millis(ms);
        loop {
            let timer = self
                .view
                .timers
                .iter()
                .min_by_key(|(_, due)| **due)
                .map(|(token, due)| (*token, *due))
                .filter(|(_, due)| *due <= end);
            let frame = self.view.next_frame.filter(|at| *at <= end);
            match (timer, frame) {
                (Some((token, due)), frame) if frame.is_none_or(|f| due <= f) => {
                    self.view.timers.remove(&token);
                    self.now = due;
                    self.controller.timer_fired(token, due);
                    self.flush();
                }
                (_, Some(at)) => {
                    self.view.next_frame = None;
                    self.now = at;
                    self.controller.frame(at, &self.view);
                    self.flush();
                }
                _ => break,
            }
        }
        self.now = end;
    }

    pub fn sample(&self, pointer: i32, row: Option<(&str, HitTarget)>, x: f64, y: f64) -> PointerSample {
        let mut sample =
            PointerSample::new(pointer, Point::new(x, y), self.now).with_scroll(self.view.scroll_y);
        if let Some((id, target)) = row {
            sample = sample.on_row(id, target);
        }
        sample
    }

    pub fn down(&mut self, pointer: i32, row: &str, target: HitTarget, x: f64, y: f64) -> InputDisposition {
        let sample = self.sample(pointer, Some((row, target)), x, y);
        let d = self.controller.pointer_down(&sample);
        self.flush();
        d
    }

    pub fn move_to(&mut self, pointer: i32, x: f64, y: f64) -> InputDisposition {
        let sample = self.sample(pointer, None, x, y);
        let d = self.controller.pointer_move(&sample, &self.view);
        self.flush();
        d
    }

    pub fn up(&mut self, pointer: i32, x: f64, y: f64) -> InputDisposition {
        let sample = self.sample(pointer, None, x, y);
        let d = self.controller.pointer_up(&sample, &self.view);
        self.flush();
        d
    }

    pub fn cancel(&mut self, pointer: i32) -> InputDisposition {
        let sample = self.sample(pointer, None, 0.0, 0.0);
        let d = self.controller.pointer_cancel(&sample);
        self.flush();
        d
    }

    pub fn tap_action(&mut self, row: &str, action: listgrip_core::ZoneAction) -> bool {
        let hit = self
            .controller
            .action_tapped(&RowId::new(row), action, self.now);
        self.flush();
        hit
    }

    /// Press a drag handle, wait out the hold, and nudge past the start
    /// distance. Leaves the drag running.
    pub fn start_drag(&mut self, pointer: i32, row: &str) -> (f64, f64) {
        let rect = self.view.row_rect(row).expect("row is rendered");
        let (x, y) = (rect.left + 10.0, rect.center_y());
        self.down(pointer, row, HitTarget::Handle, x, y);
        let hold = self.controller.config().drag.hold.as_millis() as u64;
        self.advance(hold);
        self.move_to(pointer, x, y + 3.0);
        (x, y + 3.0)
    }

    /// Walk the pointer to `to_y` in `step` increments, letting frames run.
    pub fn drag_to(&mut self, pointer: i32, x: f64, from_y: f64, to_y: f64, step: f64) {
        let mut y = from_y;
        let sign = (to_y - from_y).signum();
        while (to_y - y) * sign > 0.0 {
            y = if ((to_y - y) * sign) > step { y + sign * step } else { to_y };
            self.move_to(pointer, x, y);
            self.advance(48);
        }
        self.advance(200);
    }

    pub fn invoked(&self) -> &[TaskAction] {
        &self.store.invoked
    }

    pub fn count<F: Fn(&GestureEffect) -> bool>(&self, pred: F) -> usize {
        self.log.iter().filter(|e| pred(e)).count()
    }
}
