//! Benchmark: one drag animation frame against live layout.
//!
//! Run with: `cargo bench -p listgrip-core --bench drag_frame_bench`
//!
//! A frame follows the pointer, checks edge auto-scroll, and evaluates the
//! reorder gates for every list of the dragged row's kind. Lists are
//! re-read from the probe each frame, so cost scales with row count.

use std::time::Duration;

use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use listgrip_core::config::DragConfig;
use listgrip_core::reorder::{Direction, gate_insertion_index, same_list_swap};
use listgrip_core::{
    GestureConfig, GestureController, GestureEffect, HitTarget, LayoutSnapshot, ListGeometry,
    ListId, Point, PointerSample, Rect, RowDescriptor, RowId, Slot, Viewport,
};

const ROW_H: f64 = 48.0;

/// A task column of `n` rows with the placeholder standing in for row 0.
fn column(n: usize) -> LayoutSnapshot {
    let mut slots = vec![Slot::Placeholder {
        rect: Rect::new(0.0, 0.0, 320.0, ROW_H),
    }];
    for i in 1..n {
        slots.push(Slot::Row {
            id: RowId::new(format!("t{i}")),
            rect: Rect::new(0.0, ROW_H * i as f64, 320.0, ROW_H),
        });
    }
    LayoutSnapshot {
        viewport: Some(Viewport {
            height: 900.0,
            scroll_y: 0.0,
        }),
        rows: vec![(RowId::new("t0"), Rect::new(0.0, 0.0, 320.0, ROW_H))],
        task_lists: vec![ListGeometry {
            list: ListId::Tasks,
            rect: Rect::new(0.0, 0.0, 320.0, ROW_H * n as f64),
            slots,
        }],
        subtask_lists: Vec::new(),
    }
}

/// Layout used to start the drag: row 0 still in flow.
fn before_drag(n: usize) -> LayoutSnapshot {
    let mut layout = column(n);
    layout.task_lists[0].slots[0] = Slot::Row {
        id: RowId::new("t0"),
        rect: Rect::new(0.0, 0.0, 320.0, ROW_H),
    };
    layout
}

fn dragging_controller(n: usize) -> GestureController {
    let mut c = GestureController::new(GestureConfig::default()).expect("default config");
    c.attach_rows((0..n).map(|i| RowDescriptor::task(format!("t{i}"))), Duration::ZERO);
    let press = PointerSample::new(1, Point::new(10.0, 20.0), Duration::ZERO)
        .on_row("t0", HitTarget::Handle);
    c.pointer_down(&press);
    let token = c
        .drain_effects()
        .into_iter()
        .find_map(|e| match e {
            GestureEffect::ArmTimer { token, .. } => Some(token),
            _ => None,
        })
        .expect("hold timer armed");
    c.timer_fired(token, Duration::from_millis(350));
    let nudge = PointerSample::new(1, Point::new(10.0, 24.0), Duration::from_millis(360));
    c.pointer_move(&nudge, &before_drag(n));
    c.drain_effects();
    c
}

// ===========================================================================
// Full frame
// ===========================================================================

fn bench_drag_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("drag_frame");
    for n in [8usize, 64, 256] {
        let layout = column(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            let mut controller = dragging_controller(n);
            let mut t = 360u64;
            let mut y = 24.0;
            b.iter(|| {
                t += 16;
                y = if y > 200.0 { 24.0 } else { y + 3.0 };
                let now = Duration::from_millis(t);
                controller.pointer_move(&PointerSample::new(1, Point::new(10.0, y), now), &layout);
                controller.frame(now, &layout);
                black_box(controller.drain_effects());
            });
        });
    }
    group.finish();
}

// ===========================================================================
// Gate evaluation
// ===========================================================================

fn bench_gates(c: &mut Criterion) {
    let config = DragConfig::default();
    let layout = column(256);
    let list = &layout.task_lists[0];
    let mut group = c.benchmark_group("gates");
    group.bench_function("gate_insertion_index", |b| {
        b.iter(|| gate_insertion_index(black_box(list), black_box(6000.0), config.gate));
    });
    group.bench_function("same_list_swap", |b| {
        b.iter(|| {
            same_list_swap(
                black_box(list),
                black_box(40.0),
                ROW_H,
                Direction::Down,
                &config,
            )
        });
    });
    group.finish();
}

criterion_group!(benches, bench_drag_frame, bench_gates);
criterion_main!(benches);
