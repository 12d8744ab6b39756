use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Number of source images the engine samples (`image0`, `image1`).
pub const TEXTURE_UNIT_COUNT: usize = 2;

/// Default quiet period applied to resize events before the viewport is recomputed.
pub const DEFAULT_RESIZE_DEBOUNCE: Duration = Duration::from_millis(150);

/// Default time allowed for both source images to finish loading.
pub const DEFAULT_LOAD_TIMEOUT: Duration = Duration::from_secs(30);

/// Where a source image comes from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ImageLocator {
    /// Image on the local filesystem.
    Path(PathBuf),
    /// Image fetched over HTTP(S).
    Url(String),
}

impl ImageLocator {
    /// Interprets a user supplied string.
    ///
    /// `http://` and `https://` become [`ImageLocator::Url`]; `file://` URLs and
    /// bare strings are treated as filesystem paths.
    pub fn parse(value: &str) -> Self {
        let trimmed = value.trim();
        let lowered = trimmed.to_ascii_lowercase();
        if lowered.starts_with("http://") || lowered.starts_with("https://") {
            return Self::Url(trimmed.to_string());
        }
        let path = trimmed.strip_prefix("file://").unwrap_or(trimmed);
        Self::Path(PathBuf::from(path))
    }

    /// Resolves relative paths against `base`; URLs are returned unchanged.
    pub fn relative_to(self, base: &Path) -> Self {
        match self {
            Self::Path(path) if path.is_relative() => Self::Path(base.join(path)),
            other => other,
        }
    }
}

impl fmt::Display for ImageLocator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Path(path) => write!(f, "{}", path.display()),
            Self::Url(url) => f.write_str(url),
        }
    }
}

/// Selects the input source that drives the displacement and, for scrolling,
/// which axis receives it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum ResponseMode {
    /// Follow the pointer (or touch) position inside the window.
    #[default]
    PointerMove,
    /// Page scroll drives the horizontal axis only.
    ScrollOnX,
    /// Page scroll drives the vertical axis only.
    ScrollOnY,
    /// Page scroll drives both axes.
    ScrollOnBoth,
}

impl ResponseMode {
    /// Matches the exact mode names accepted in configuration.
    pub fn from_name(value: &str) -> Option<Self> {
        match value.trim() {
            "pointerMove" | "mouseMove" => Some(Self::PointerMove),
            "scrollOnX" => Some(Self::ScrollOnX),
            "scrollOnY" => Some(Self::ScrollOnY),
            "scrollOnBoth" => Some(Self::ScrollOnBoth),
            _ => None,
        }
    }

    /// Resolves an optional configured name.
    ///
    /// A missing value means [`ResponseMode::PointerMove`]. Any unrecognised
    /// name attaches the scroll listener and drives both axes.
    pub fn resolve(value: Option<&str>) -> Self {
        match value {
            None => Self::PointerMove,
            Some(name) => Self::from_name(name).unwrap_or_else(|| {
                tracing::warn!(
                    respond_to = name,
                    "unrecognised response mode; falling back to scrollOnBoth"
                );
                Self::ScrollOnBoth
            }),
        }
    }

    /// True for the modes driven by page scroll.
    pub fn is_scroll(self) -> bool {
        !matches!(self, Self::PointerMove)
    }
}

impl fmt::Display for ResponseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PointerMove => f.write_str("pointerMove"),
            Self::ScrollOnX => f.write_str("scrollOnX"),
            Self::ScrollOnY => f.write_str("scrollOnY"),
            Self::ScrollOnBoth => f.write_str("scrollOnBoth"),
        }
    }
}

/// Which pointer events feed [`ResponseMode::PointerMove`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum PointerDevice {
    /// Cursor movement, measured in window coordinates.
    #[default]
    Mouse,
    /// Touch drags, measured relative to the container.
    Touch,
}

/// Adapter power preference passed to `wgpu`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GpuPowerPreference {
    Low,
    #[default]
    High,
}

/// Placement of the mount element on the virtual page, in logical pixels.
///
/// Unset values are resolved when the engine mounts: pointer mode puts the
/// container at the top of a page with no padding, scroll modes start it one
/// window height down and leave one window height below it.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ContainerLayout {
    /// Distance from the left edge of the window.
    pub left: f32,
    /// Distance from the top of the page.
    pub top: Option<f32>,
    /// Fixed width; `None` fills the window from `left` to the right edge,
    /// capped in scroll modes so the container fits inside the window.
    pub width: Option<f32>,
    /// Page space kept below the container so it can scroll into view.
    pub bottom_padding: Option<f32>,
}

/// Optional replacement shading programs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShaderSources {
    pub vertex: Option<PathBuf>,
    pub fragment: Option<PathBuf>,
}

/// Immutable configuration passed to the engine at mount.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// Base colour image.
    pub original_image: ImageLocator,
    /// Depth map with the same dimensions as the base image.
    pub depth_image: ImageLocator,
    /// Divisor applied to vertical displacement in the shader.
    pub vertical_threshold: f32,
    /// Divisor applied to horizontal displacement in the shader.
    pub horizontal_threshold: f32,
    /// Input source and axis mapping.
    pub respond_to: ResponseMode,
    /// Negate the computed displacement.
    pub reverse_motion: bool,
    /// Mouse or touch for pointer mode.
    pub pointer_device: PointerDevice,
    /// Where the canvas sits on the page.
    pub container: ContainerLayout,
    /// Initial window size in logical pixels.
    pub window_size: (u32, u32),
    /// Window title.
    pub title: String,
    /// Quiet period before a resize is applied to the viewport.
    pub resize_debounce: Duration,
    /// Time allowed for the source images to load.
    pub load_timeout: Duration,
    /// Shader overrides; bundled shaders are used when unset.
    pub shaders: ShaderSources,
    /// Adapter power preference.
    pub gpu_power: GpuPowerPreference,
}

impl EngineConfig {
    /// Builds a configuration with defaults for everything but the two images.
    pub fn new(original_image: ImageLocator, depth_image: ImageLocator) -> Self {
        Self {
            original_image,
            depth_image,
            vertical_threshold: 30.0,
            horizontal_threshold: 40.0,
            respond_to: ResponseMode::default(),
            reverse_motion: false,
            pointer_device: PointerDevice::default(),
            container: ContainerLayout::default(),
            window_size: (1280, 720),
            title: "depthview".to_string(),
            resize_debounce: DEFAULT_RESIZE_DEBOUNCE,
            load_timeout: DEFAULT_LOAD_TIMEOUT,
            shaders: ShaderSources::default(),
            gpu_power: GpuPowerPreference::default(),
        }
    }

    /// The two image locators in texture-unit order.
    pub fn image_locators(&self) -> [ImageLocator; TEXTURE_UNIT_COUNT] {
        [self.original_image.clone(), self.depth_image.clone()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn locator_distinguishes_urls_and_paths() {
        assert_eq!(
            ImageLocator::parse("https://example.com/photo.webp"),
            ImageLocator::Url("https://example.com/photo.webp".to_string())
        );
        assert_eq!(
            ImageLocator::parse("file:///tmp/depth.png"),
            ImageLocator::Path(PathBuf::from("/tmp/depth.png"))
        );
        assert_eq!(
            ImageLocator::parse(" photo.png "),
            ImageLocator::Path(PathBuf::from("photo.png"))
        );
    }

    #[test]
    fn relative_paths_join_base() {
        let base = Path::new("/srv/scenes");
        assert_eq!(
            ImageLocator::parse("photo.png").relative_to(base),
            ImageLocator::Path(PathBuf::from("/srv/scenes/photo.png"))
        );
        assert_eq!(
            ImageLocator::parse("/abs/photo.png").relative_to(base),
            ImageLocator::Path(PathBuf::from("/abs/photo.png"))
        );
    }

    #[test]
    fn response_mode_defaults() {
        assert_eq!(ResponseMode::resolve(None), ResponseMode::PointerMove);
        assert_eq!(
            ResponseMode::resolve(Some("mouseMove")),
            ResponseMode::PointerMove
        );
        assert_eq!(
            ResponseMode::resolve(Some("scrollOnY")),
            ResponseMode::ScrollOnY
        );
        assert_eq!(
            ResponseMode::resolve(Some("sideways")),
            ResponseMode::ScrollOnBoth
        );
        assert!(ResponseMode::resolve(Some("sideways")).is_scroll());
        assert!(!ResponseMode::PointerMove.is_scroll());
    }
}
