use std::path::{Path, PathBuf};
use std::sync::Arc;
use winit::event_loop::ActiveEventLoop;
use winit::window::{Icon, Window, WindowAttributes};

pub struct PlatformConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub icon_path: Option<PathBuf>,
    pub resizable: bool,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            title: "NovaEngine".to_string(),
            width: 800,
            height: 600,
            icon_path: None,
            resizable: false,
        }
    }
}

/// Open the main window. A broken icon is logged and skipped rather than
/// failing window creation.
pub fn create_window(
    event_loop: &ActiveEventLoop,
    config: &PlatformConfig,
) -> Result<Arc<Window>, String> {
    let mut attrs = WindowAttributes::default()
        .with_title(&config.title)
        .with_inner_size(winit::dpi::LogicalSize::new(config.width, config.height))
        .with_resizable(config.resizable);

    if let Some(path) = &config.icon_path {
        match load_icon(path) {
            Ok(icon) => attrs = attrs.with_window_icon(Some(icon)),
            Err(e) => log::warn!("{}", e),
        }
    }

    let window = event_loop
        .create_window(attrs)
        .map_err(|e| format!("Failed to create window: {e}"))?;
    Ok(Arc::new(window))
}

pub fn load_icon(path: &Path) -> Result<Icon, String> {
    let (rgba, width, height) = read_icon_rgba(path)?;
    Icon::from_rgba(rgba, width, height)
        .map_err(|e| format!("Failed to build icon from {}: {e}", path.display()))
}

fn read_icon_rgba(path: &Path) -> Result<(Vec<u8>, u32, u32), String> {
    let bytes = std::fs::read(path)
        .map_err(|e| format!("Failed to read icon {}: {e}", path.display()))?;
    let img = image::load_from_memory(&bytes)
        .map_err(|e| format!("Failed to parse icon {}: {e}", path.display()))?
        .to_rgba8();
    let (width, height) = img.dimensions();
    Ok((img.into_raw(), width, height))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn icon_pixels_are_rgba() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("icon.png");
        image::RgbaImage::from_pixel(4, 2, image::Rgba([1, 2, 3, 255]))
            .save(&path)
            .expect("write png");

        let (rgba, w, h) = read_icon_rgba(&path).expect("decode");
        assert_eq!((w, h), (4, 2));
        assert_eq!(rgba.len(), 4 * 2 * 4);
        assert_eq!(&rgba[..4], &[1, 2, 3, 255]);
        assert!(load_icon(&path).is_ok());
    }

    #[test]
    fn missing_icon_reports_path() {
        let err = load_icon(Path::new("no/such/icon.png")).expect_err("missing file");
        assert!(err.starts_with("Failed to read icon"));
        assert!(err.contains("icon.png"));
    }
}
