use crate::draw::composite::RgbaBuffer;
use anyhow::{anyhow, Context, Result};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use chrono::Local;
use image::codecs::png::PngEncoder;
use image::{ColorType, ImageEncoder, ImageFormat};
use std::fs;
use std::path::{Path, PathBuf};

pub const DRAW_EXPORT_SUBDIR: &str = "draw_exports";
pub const AUTOSAVE_FILE_NAME: &str = "auto_saved_drawing.txt";

pub fn encode_png(buffer: &RgbaBuffer) -> Result<Vec<u8>> {
    let mut bytes = Vec::new();
    PngEncoder::new(&mut bytes)
        .write_image(&buffer.pixels, buffer.width, buffer.height, ColorType::Rgba8)
        .with_context(|| format!("encode {}x{} overlay as png", buffer.width, buffer.height))?;
    Ok(bytes)
}

pub fn decode_png(bytes: &[u8]) -> Result<RgbaBuffer> {
    let image = image::load_from_memory_with_format(bytes, ImageFormat::Png)
        .context("decode png drawing")?;
    Ok(RgbaBuffer::from_rgba_image(image.to_rgba8()))
}

pub fn save_png(path: &Path, buffer: &RgbaBuffer) -> Result<()> {
    let bytes = encode_png(buffer)?;
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("create folder {}", parent.display()))?;
    }
    fs::write(path, bytes).with_context(|| format!("write png {}", path.display()))
}

/// Drawing persisted as base64 PNG text, written whenever the canvas is
/// cleared, switches whiteboard mode, or closes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutoSaveStore {
    path: PathBuf,
}

impl AutoSaveStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn next_to_executable() -> Result<Self> {
        let exe_path = std::env::current_exe().context("resolve current executable")?;
        let parent = exe_path
            .parent()
            .ok_or_else(|| anyhow!("executable path has no parent: {}", exe_path.display()))?;
        Ok(Self::new(parent.join("data").join(AUTOSAVE_FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn save(&self, overlay: &RgbaBuffer) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create auto-save folder {}", parent.display()))?;
        }
        let encoded = STANDARD.encode(encode_png(overlay)?);
        fs::write(&self.path, encoded)
            .with_context(|| format!("write auto-save file {}", self.path.display()))?;
        tracing::debug!(
            path = %self.path.display(),
            width = overlay.width,
            height = overlay.height,
            visible = overlay.has_visible_content(),
            "drawing auto-saved"
        );
        Ok(())
    }

    /// `Ok(None)` when there is no auto-save yet or the file is blank.
    pub fn load(&self) -> Result<Option<RgbaBuffer>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("read auto-save file {}", self.path.display()))?;
        let trimmed = content.trim();
        if trimmed.is_empty() {
            return Ok(None);
        }
        let bytes = STANDARD
            .decode(trimmed)
            .with_context(|| format!("decode base64 in {}", self.path.display()))?;
        decode_png(&bytes).map(Some)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportChoice {
    Annotated,
    OverlayOnly,
    Both,
    Discard,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportTargets {
    pub annotated: Option<PathBuf>,
    pub overlay: Option<PathBuf>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExportDispatchOutcome {
    Save(ExportTargets),
    Discard,
}

pub fn exe_relative_output_folder_from_path(exe_path: &Path) -> Result<PathBuf> {
    let parent = exe_path
        .parent()
        .ok_or_else(|| anyhow!("executable path has no parent: {}", exe_path.display()))?;
    Ok(parent.join(DRAW_EXPORT_SUBDIR))
}

pub fn ensure_output_folder() -> Result<PathBuf> {
    let exe_path = std::env::current_exe().context("resolve current executable")?;
    let output = exe_relative_output_folder_from_path(&exe_path)?;
    fs::create_dir_all(&output)
        .with_context(|| format!("create draw output folder {}", output.display()))?;
    Ok(output)
}

pub fn timestamped_stem(now: chrono::DateTime<Local>) -> String {
    now.format("%Y%m%d_%H%M%S").to_string()
}

pub fn build_filename(stem: &str, suffix: &str) -> String {
    format!("{}_{}.png", stem, suffix)
}

pub fn dispatch_export_choice(
    choice: ExportChoice,
    output_dir: &Path,
    now: chrono::DateTime<Local>,
) -> ExportDispatchOutcome {
    let stem = timestamped_stem(now);
    let annotated_path = output_dir.join(build_filename(&stem, "annotated"));
    let overlay_path = output_dir.join(build_filename(&stem, "overlay"));

    match choice {
        ExportChoice::Annotated => ExportDispatchOutcome::Save(ExportTargets {
            annotated: Some(annotated_path),
            overlay: None,
        }),
        ExportChoice::OverlayOnly => ExportDispatchOutcome::Save(ExportTargets {
            annotated: None,
            overlay: Some(overlay_path),
        }),
        ExportChoice::Both => ExportDispatchOutcome::Save(ExportTargets {
            annotated: Some(annotated_path),
            overlay: Some(overlay_path),
        }),
        ExportChoice::Discard => ExportDispatchOutcome::Discard,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::draw::model::Color;
    use chrono::TimeZone;

    fn sample_overlay() -> RgbaBuffer {
        let mut buffer = RgbaBuffer::transparent(6, 4);
        buffer.put_pixel(1, 2, Color::rgba(255, 0, 0, 255));
        buffer.put_pixel(5, 3, Color::rgba(10, 20, 30, 40));
        buffer
    }

    #[test]
    fn png_roundtrip_reproduces_pixels() {
        let overlay = sample_overlay();
        let decoded = decode_png(&encode_png(&overlay).expect("encode")).expect("decode");
        assert_eq!(decoded, overlay);
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(decode_png(b"definitely not png").is_err());
    }

    #[test]
    fn autosave_roundtrip_through_base64_text() {
        let dir = tempfile::tempdir().expect("temp dir");
        let store = AutoSaveStore::new(dir.path().join("data").join(AUTOSAVE_FILE_NAME));

        assert_eq!(store.load().expect("load missing"), None);
        store.save(&sample_overlay()).expect("save");

        let text = fs::read_to_string(store.path()).expect("read text");
        assert!(STANDARD.decode(text.trim()).is_ok());
        assert_eq!(store.load().expect("load"), Some(sample_overlay()));
    }

    #[test]
    fn blank_autosave_file_loads_as_none() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join(AUTOSAVE_FILE_NAME);
        fs::write(&path, "  \n").expect("write");
        assert_eq!(AutoSaveStore::new(path).load().expect("load"), None);
    }

    #[test]
    fn exe_relative_output_folder_is_sibling_of_exe() {
        let exe = Path::new("/tmp/myapp/bin/screen_annotate");
        let output = exe_relative_output_folder_from_path(exe).expect("output path");
        assert_eq!(output, Path::new("/tmp/myapp/bin").join(DRAW_EXPORT_SUBDIR));
    }

    #[test]
    fn dispatcher_returns_expected_targets_for_each_choice() {
        let dt = Local
            .with_ymd_and_hms(2026, 1, 2, 3, 4, 5)
            .single()
            .expect("date time");
        let output_dir = Path::new("/tmp/exports");

        match dispatch_export_choice(ExportChoice::Annotated, output_dir, dt) {
            ExportDispatchOutcome::Save(targets) => {
                assert!(targets
                    .annotated
                    .expect("annotated path")
                    .ends_with("20260102_030405_annotated.png"));
                assert!(targets.overlay.is_none());
            }
            ExportDispatchOutcome::Discard => panic!("unexpected discard"),
        }

        assert!(matches!(
            dispatch_export_choice(ExportChoice::OverlayOnly, output_dir, dt),
            ExportDispatchOutcome::Save(targets) if targets.annotated.is_none() && targets.overlay.is_some()
        ));
        assert!(matches!(
            dispatch_export_choice(ExportChoice::Both, output_dir, dt),
            ExportDispatchOutcome::Save(targets) if targets.annotated.is_some() && targets.overlay.is_some()
        ));
        assert!(matches!(
            dispatch_export_choice(ExportChoice::Discard, output_dir, dt),
            ExportDispatchOutcome::Discard
        ));
    }

    #[test]
    fn filename_builder_suffixes_match_contract() {
        assert_eq!(
            build_filename("20260102_030405", "annotated"),
            "20260102_030405_annotated.png"
        );
        assert_eq!(
            build_filename("20260102_030405", "overlay"),
            "20260102_030405_overlay.png"
        );
    }
}
