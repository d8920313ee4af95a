use criterion::{black_box, criterion_group, criterion_main, Criterion};
use screen_annotate::draw::composite::RgbaBuffer;
use screen_annotate::draw::history::DrawHistory;
use screen_annotate::draw::model::Tool;
use screen_annotate::draw::AnnotationCanvas;

fn zigzag(i: i32) -> (i32, i32) {
    (20 + (i * 7) % 1800, 20 + (i * 13) % 1000)
}

fn bench_freehand(c: &mut Criterion) {
    c.bench_function("pen_stroke_200_segments_1080p", |b| {
        b.iter(|| {
            let mut canvas = AnnotationCanvas::new((1920, 1080));
            canvas.pointer_down(zigzag(0));
            for i in 1..200 {
                black_box(canvas.pointer_move(zigzag(i)));
            }
            black_box(canvas.pointer_up(zigzag(200)));
        })
    });

    c.bench_function("highlighter_stroke_200_segments_1080p", |b| {
        b.iter(|| {
            let mut canvas = AnnotationCanvas::new((1920, 1080));
            canvas.session_mut().set_tool(Tool::Highlighter);
            canvas.session_mut().set_brush_width(30);
            canvas.pointer_down(zigzag(0));
            for i in 1..200 {
                black_box(canvas.pointer_move(zigzag(i)));
            }
            black_box(canvas.pointer_up(zigzag(200)));
        })
    });
}

fn bench_render_and_history(c: &mut Criterion) {
    let mut canvas = AnnotationCanvas::new((1920, 1080));
    canvas.pointer_down((100, 100));
    let _ = canvas.pointer_move((1800, 900));
    let _ = canvas.pointer_up((1800, 900));

    c.bench_function("render_frame_1080p", |b| {
        let mut frame = RgbaBuffer::transparent(1920, 1080);
        b.iter(|| canvas.render(black_box(&mut frame)))
    });

    c.bench_function("history_commit_1080p", |b| {
        let mut history = DrawHistory::new(canvas.overlay());
        b.iter(|| {
            history.commit(black_box(canvas.overlay()));
            let _ = history.undo();
        })
    });
}

criterion_group!(benches, bench_freehand, bench_render_and_history);
criterion_main!(benches);
