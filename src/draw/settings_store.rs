use crate::draw::settings::DrawSettings;
use anyhow::{anyhow, Context, Result};
use std::path::{Path, PathBuf};

pub const DRAW_SETTINGS_FILE_NAME: &str = "draw_settings.json";

pub fn settings_path_from_exe_path(exe_path: &Path) -> Result<PathBuf> {
    let parent = exe_path
        .parent()
        .ok_or_else(|| anyhow!("executable path has no parent: {}", exe_path.display()))?;
    Ok(parent.join(DRAW_SETTINGS_FILE_NAME))
}

pub fn resolve_settings_path() -> Result<PathBuf> {
    let exe_path = std::env::current_exe().context("resolve current executable")?;
    settings_path_from_exe_path(&exe_path)
}

pub fn load() -> Result<DrawSettings> {
    let draw_settings_path = resolve_settings_path()?;
    load_or_create(&draw_settings_path)
}

pub fn save(settings: &DrawSettings) -> Result<PathBuf> {
    let draw_settings_path = resolve_settings_path()?;
    save_to_path(&draw_settings_path, settings)?;
    Ok(draw_settings_path)
}

/// Loads settings, writing the defaults out first when the file is missing.
pub fn load_or_create(draw_settings_path: &Path) -> Result<DrawSettings> {
    if let Some(loaded) = load_dedicated_from_path(draw_settings_path)? {
        return Ok(loaded);
    }

    let settings = DrawSettings::default();
    save_to_path(draw_settings_path, &settings)?;
    tracing::info!(
        path = %draw_settings_path.display(),
        "draw settings created with defaults"
    );
    Ok(settings)
}

pub fn load_dedicated_from_path(draw_settings_path: &Path) -> Result<Option<DrawSettings>> {
    if !draw_settings_path.exists() {
        return Ok(None);
    }

    let content = std::fs::read_to_string(draw_settings_path)
        .with_context(|| format!("read draw settings file {}", draw_settings_path.display()))?;

    if content.trim().is_empty() {
        return Ok(Some(DrawSettings::default()));
    }

    let mut loaded: DrawSettings = serde_json::from_str(&content).with_context(|| {
        format!(
            "deserialize draw settings file {}",
            draw_settings_path.display()
        )
    })?;
    loaded.sanitize();
    Ok(Some(loaded))
}

pub fn save_to_path(draw_settings_path: &Path, settings: &DrawSettings) -> Result<()> {
    if let Some(parent) = draw_settings_path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create draw settings parent folder {}", parent.display()))?;
    }

    let mut sanitized = settings.clone();
    sanitized.sanitize();
    let json = serde_json::to_string_pretty(&sanitized)
        .context("serialize draw settings for dedicated draw settings file")?;
    std::fs::write(draw_settings_path, json)
        .with_context(|| format!("write draw settings file {}", draw_settings_path.display()))
}

#[cfg(test)]
mod tests {
    use super::{
        load_dedicated_from_path, load_or_create, save_to_path, settings_path_from_exe_path,
        DRAW_SETTINGS_FILE_NAME,
    };
    use crate::draw::model::Color;
    use crate::draw::settings::DrawSettings;
    use std::path::Path;

    #[test]
    fn settings_path_is_resolved_next_to_executable() {
        let exe = Path::new("/tmp/myapp/bin/screen_annotate");
        let path = settings_path_from_exe_path(exe).expect("path");
        assert_eq!(
            path,
            Path::new("/tmp/myapp/bin").join(DRAW_SETTINGS_FILE_NAME)
        );
    }

    #[test]
    fn dedicated_load_returns_none_when_file_is_missing() {
        let dir = tempfile::tempdir().expect("temp dir");
        let draw_settings_path = dir.path().join(DRAW_SETTINGS_FILE_NAME);

        let loaded = load_dedicated_from_path(&draw_settings_path).expect("load dedicated");
        assert_eq!(loaded, None);
    }

    #[test]
    fn empty_file_loads_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let draw_settings_path = dir.path().join(DRAW_SETTINGS_FILE_NAME);
        std::fs::write(&draw_settings_path, "\n").expect("write empty");

        let loaded = load_dedicated_from_path(&draw_settings_path).expect("load dedicated");
        assert_eq!(loaded, Some(DrawSettings::default()));
    }

    #[test]
    fn missing_file_is_created_with_defaults() {
        let dir = tempfile::tempdir().expect("temp dir");
        let draw_settings_path = dir.path().join("nested").join(DRAW_SETTINGS_FILE_NAME);

        let loaded = load_or_create(&draw_settings_path).expect("load or create");
        assert_eq!(loaded, DrawSettings::default());
        assert!(draw_settings_path.exists());
    }

    #[test]
    fn dedicated_store_roundtrip_serialization() {
        let dir = tempfile::tempdir().expect("temp dir");
        let draw_settings_path = dir.path().join(DRAW_SETTINGS_FILE_NAME);

        let mut settings = DrawSettings::default();
        settings.eraser_width = 12;
        settings.last_color = Color::rgba(1, 2, 3, 255);

        save_to_path(&draw_settings_path, &settings).expect("save settings");
        let loaded = load_or_create(&draw_settings_path).expect("load settings");

        assert_eq!(loaded, settings);
    }

    #[test]
    fn out_of_range_values_are_clamped_on_load() {
        let dir = tempfile::tempdir().expect("temp dir");
        let draw_settings_path = dir.path().join(DRAW_SETTINGS_FILE_NAME);
        std::fs::write(&draw_settings_path, r#"{"brush_width": 500}"#).expect("write");

        let loaded = load_dedicated_from_path(&draw_settings_path)
            .expect("load dedicated")
            .expect("settings present");
        assert_eq!(loaded.brush_width, 50);
    }

    #[test]
    fn malformed_file_reports_path_in_error() {
        let dir = tempfile::tempdir().expect("temp dir");
        let draw_settings_path = dir.path().join(DRAW_SETTINGS_FILE_NAME);
        std::fs::write(&draw_settings_path, "{not json").expect("write");

        let err = load_dedicated_from_path(&draw_settings_path).expect_err("malformed");
        assert!(format!("{err:#}").contains(DRAW_SETTINGS_FILE_NAME));
    }
}
