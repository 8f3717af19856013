use clantree_bench::util::generate_clan;
use clantree_graph::Vec2;
use clantree_view::{PointerEvent, TreeView, ViewSettings, ViewportSize};
use criterion::{Criterion, black_box, criterion_group, criterion_main};
use std::time::Duration;

fn loaded_view() -> TreeView {
    let mut view = TreeView::new(ViewSettings::default(), ViewportSize::new(1280.0, 800.0));
    let _ = view.apply_snapshot(&generate_clan(1000, 4));
    view
}

fn bench_pointer_hit_testing(c: &mut Criterion) {
    let mut view = loaded_view();

    c.bench_function("pointer_click_1000_members", |b| {
        b.iter(|| {
            let pos = black_box(Vec2::new(640.0, 100.0));
            view.handle_pointer(PointerEvent::Down(pos));
            view.handle_pointer(PointerEvent::Up(pos));
            view.events().drain();
        })
    });
}

fn bench_focus_animation(c: &mut Criterion) {
    let mut view = loaded_view();

    c.bench_function("focus_animation_47_frames", |b| {
        b.iter(|| {
            let _ = view.focus_node(black_box("m999"));
            for _ in 0..47 {
                view.tick(Duration::from_millis(16));
            }
            view.events().drain();
        })
    });
}

fn bench_render_frame(c: &mut Criterion) {
    let view = loaded_view();

    c.bench_function("render_frame_1000_members", |b| {
        b.iter(|| {
            let frame = view.render_frame();
            black_box(frame.nodes.len());
        })
    });
}

criterion_group!(
    benches,
    bench_pointer_hit_testing,
    bench_focus_animation,
    bench_render_frame
);
criterion_main!(benches);
