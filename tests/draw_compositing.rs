use screen_annotate::draw::model::{Color, Geometry, NormalizedRect, Tool};
use screen_annotate::draw::AnnotationCanvas;

fn stroke(
    canvas: &mut AnnotationCanvas,
    tool: Tool,
    from: (i32, i32),
    to: (i32, i32),
) -> screen_annotate::draw::Stroke {
    canvas.session_mut().set_tool(tool);
    canvas.pointer_down(from);
    let _ = canvas.pointer_move(to);
    canvas.pointer_up(to).expect("stroke finished")
}

#[test]
fn eraser_clears_exactly_the_pen_footprint() {
    let mut canvas = AnnotationCanvas::new((100, 100));
    canvas.session_mut().set_brush_width(4);
    let _ = stroke(&mut canvas, Tool::Pen, (10, 10), (30, 10));
    let untouched_mark = canvas.overlay().clone();

    canvas.session_mut().set_brush_width(10);
    canvas.session_mut().set_eraser_width(10);
    let _ = stroke(&mut canvas, Tool::Pen, (10, 50), (90, 50));
    let _ = stroke(&mut canvas, Tool::Eraser, (10, 50), (90, 50));

    assert_eq!(canvas.overlay(), &untouched_mark);
}

#[test]
fn repeated_highlighter_does_not_accumulate() {
    let mut canvas = AnnotationCanvas::new((60, 30));
    canvas.session_mut().set_color(Color::rgba(255, 230, 0, 255));
    canvas.session_mut().set_brush_width(12);

    let _ = stroke(&mut canvas, Tool::Highlighter, (5, 15), (55, 15));
    let once = canvas.overlay().clone();
    let _ = stroke(&mut canvas, Tool::Highlighter, (5, 15), (55, 15));

    assert_eq!(canvas.overlay(), &once);
    assert_eq!(once.pixel(30, 15).a, 128);
}

#[test]
fn repeated_translucent_pen_does_accumulate() {
    let mut canvas = AnnotationCanvas::new((60, 30));
    canvas.session_mut().set_opacity(128);
    canvas.session_mut().set_brush_width(12);

    let _ = stroke(&mut canvas, Tool::Pen, (5, 15), (55, 15));
    let once = canvas.overlay().pixel(30, 15);
    let _ = stroke(&mut canvas, Tool::Pen, (5, 15), (55, 15));

    assert!(canvas.overlay().pixel(30, 15).a > once.a);
}

#[test]
fn rectangle_is_normalized_whatever_the_drag_direction() {
    let mut forward = AnnotationCanvas::new((80, 80));
    let mut backward = AnnotationCanvas::new((80, 80));

    let a = stroke(&mut forward, Tool::Rect, (20, 10), (70, 60));
    let b = stroke(&mut backward, Tool::Rect, (70, 60), (20, 10));

    assert_eq!(
        a.geometry,
        Geometry::Rect(NormalizedRect {
            x: 20,
            y: 10,
            width: 50,
            height: 50
        })
    );
    assert_eq!(a.geometry, b.geometry);
    assert_eq!(forward.overlay(), backward.overlay());
}

#[test]
fn growing_the_window_preserves_pixels_and_adds_transparency() {
    let mut canvas = AnnotationCanvas::new((40, 30));
    let _ = stroke(&mut canvas, Tool::Pen, (0, 0), (39, 29));
    let _ = stroke(&mut canvas, Tool::Highlighter, (0, 29), (39, 0));
    let before = canvas.overlay().clone();

    canvas.resize((70, 50));

    let after = canvas.overlay();
    for y in 0..50 {
        for x in 0..70 {
            if x < 40 && y < 30 {
                assert_eq!(after.pixel(x, y), before.pixel(x, y), "({x},{y})");
            } else {
                assert_eq!(after.pixel(x, y), Color::TRANSPARENT, "({x},{y})");
            }
        }
    }
}
