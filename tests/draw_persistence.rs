use screen_annotate::draw::model::{Color, Tool};
use screen_annotate::draw::save::AutoSaveStore;
use screen_annotate::draw::settings::DrawSettings;
use screen_annotate::draw::settings_store;
use screen_annotate::draw::AnnotationCanvas;

fn sketch(canvas: &mut AnnotationCanvas) {
    canvas.session_mut().set_color(Color::rgba(0, 128, 0, 255));
    canvas.pointer_down((4, 4));
    let _ = canvas.pointer_move((40, 20));
    let _ = canvas.pointer_up((40, 20));
    canvas.session_mut().set_tool(Tool::Highlighter);
    canvas.pointer_down((4, 30));
    let _ = canvas.pointer_move((40, 30));
    let _ = canvas.pointer_up((40, 30));
}

#[test]
fn png_roundtrip_reproduces_visible_pixels() {
    let mut source = AnnotationCanvas::new((48, 40));
    sketch(&mut source);
    let png = source.overlay_png().expect("encode overlay");

    let mut target = AnnotationCanvas::new((48, 40));
    target.load_overlay_png(&png).expect("decode overlay");

    assert_eq!(target.overlay(), source.overlay());
    assert_eq!(target.history().index(), 1);
}

#[test]
fn loading_into_a_different_window_rescales() {
    let mut source = AnnotationCanvas::new((48, 40));
    sketch(&mut source);
    let png = source.overlay_png().expect("encode overlay");

    let mut target = AnnotationCanvas::new((96, 80));
    target.load_overlay_png(&png).expect("decode overlay");

    assert_eq!(target.overlay().size(), (96, 80));
    assert!(target.overlay().has_visible_content());
}

#[test]
fn clearing_writes_an_empty_autosave() {
    let dir = tempfile::tempdir().expect("temp dir");
    let store = AutoSaveStore::new(dir.path().join("data").join("auto_saved_drawing.txt"));

    let mut canvas = AnnotationCanvas::new((32, 32));
    canvas.set_autosave(Some(store.clone()));
    sketch(&mut canvas);
    canvas.clear_all();

    let saved = store.load().expect("load").expect("auto-save written");
    assert!(!saved.has_visible_content());
}

#[test]
fn canvas_built_from_stored_settings() {
    let dir = tempfile::tempdir().expect("temp dir");
    let path = dir.path().join(settings_store::DRAW_SETTINGS_FILE_NAME);
    std::fs::write(
        &path,
        r#"{"last_tool": "eraser", "eraser_width": 80, "canvas_background_color": {"r": 1, "g": 2, "b": 3, "a": 255}}"#,
    )
    .expect("write settings");

    let settings: DrawSettings = settings_store::load_or_create(&path).expect("load settings");
    let canvas = AnnotationCanvas::from_settings((10, 10), &settings);

    assert_eq!(canvas.session().tool(), Tool::Eraser);
    assert_eq!(canvas.session().eraser_width(), 50);
}
