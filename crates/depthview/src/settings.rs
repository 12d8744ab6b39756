//! Merges command-line flags over the scene file over engine defaults.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{anyhow, bail, Context, Result};
use depthconfig::{PointerDeviceSetting, PowerSetting, SceneConfig};
use renderer::{
    ContainerLayout, EngineConfig, GpuPowerPreference, ImageLocator, PointerDevice, ResponseMode,
};

use crate::cli::RunArgs;

/// Scene file that was read, if any, and where its relative paths resolve.
#[derive(Debug)]
struct LoadedScene {
    path: PathBuf,
    base_dir: PathBuf,
    scene: SceneConfig,
}

#[derive(Debug)]
pub struct Settings {
    pub engine: EngineConfig,
    pub scene_path: Option<PathBuf>,
}

/// Resolves the final engine configuration.
///
/// An explicit `--config` must exist; `default_scene` is only read when
/// present.
pub fn resolve(args: &RunArgs, default_scene: &Path) -> Result<Settings> {
    let loaded = match args.config.as_deref() {
        Some(path) => Some(load_scene(path)?),
        None if default_scene.is_file() => Some(load_scene(default_scene)?),
        None => None,
    };
    let scene = loaded.as_ref().map(|loaded| &loaded.scene);
    let base_dir = loaded.as_ref().map(|loaded| loaded.base_dir.as_path());

    let original = image_locator(
        args.original.as_deref(),
        scene.and_then(|s| s.original_image.as_deref()),
        base_dir,
    )
    .ok_or_else(|| missing_image("ORIGINAL", "original_image", loaded.as_ref()))?;
    let depth = image_locator(
        args.depth.as_deref(),
        scene.and_then(|s| s.depth_image.as_deref()),
        base_dir,
    )
    .ok_or_else(|| missing_image("DEPTH", "depth_image", loaded.as_ref()))?;

    let mut engine = EngineConfig::new(original, depth);

    if let Some(value) = args
        .vertical_threshold
        .or_else(|| scene.and_then(|s| s.vertical_threshold))
    {
        engine.vertical_threshold = value;
    }
    if let Some(value) = args
        .horizontal_threshold
        .or_else(|| scene.and_then(|s| s.horizontal_threshold))
    {
        engine.horizontal_threshold = value;
    }

    let respond_to = args
        .respond_to
        .as_deref()
        .or_else(|| scene.and_then(|s| s.respond_to.as_deref()));
    engine.respond_to = ResponseMode::resolve(respond_to);
    engine.reverse_motion =
        args.reverse_motion || scene.and_then(|s| s.reverse_motion).unwrap_or(false);
    engine.pointer_device = if args.touch {
        PointerDevice::Touch
    } else {
        match scene.and_then(|s| s.pointer_device) {
            Some(PointerDeviceSetting::Touch) => PointerDevice::Touch,
            Some(PointerDeviceSetting::Mouse) | None => PointerDevice::Mouse,
        }
    };

    if let Some(scene) = scene {
        let (width, height) = engine.window_size;
        engine.window_size = (
            scene.window.width.unwrap_or(width),
            scene.window.height.unwrap_or(height),
        );
        if let Some(title) = &scene.window.title {
            engine.title = title.clone();
        }
        if let Some(debounce) = scene.timing.resize_debounce {
            engine.resize_debounce = debounce;
        }
        if let Some(timeout) = scene.timing.load_timeout {
            engine.load_timeout = timeout;
        }
        if let Some(base_dir) = base_dir {
            engine.shaders.vertex = scene.shaders.vertex.as_deref().map(|p| base_dir.join(p));
            engine.shaders.fragment = scene.shaders.fragment.as_deref().map(|p| base_dir.join(p));
        }
        if let Some(power) = scene.gpu.power {
            engine.gpu_power = match power {
                PowerSetting::Low => GpuPowerPreference::Low,
                PowerSetting::High => GpuPowerPreference::High,
            };
        }
    }
    if let Some(size) = args.size {
        engine.window_size = (size.width, size.height);
    }
    if let Some(power) = args.gpu_power {
        engine.gpu_power = power;
    }

    let container = scene.map(|s| &s.container);
    engine.container = ContainerLayout {
        left: args
            .container_left
            .or_else(|| container.and_then(|c| c.left))
            .unwrap_or_default(),
        top: args.container_top.or_else(|| container.and_then(|c| c.top)),
        width: args.container_width.or_else(|| container.and_then(|c| c.width)),
        bottom_padding: container.and_then(|c| c.bottom_padding),
    };

    Ok(Settings {
        engine,
        scene_path: loaded.map(|loaded| loaded.path),
    })
}

fn load_scene(path: &Path) -> Result<LoadedScene> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read scene {}", path.display()))?;
    let scene = SceneConfig::from_toml_str(&contents)
        .with_context(|| format!("failed to load scene {}", path.display()))?;
    let base_dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_default();
    tracing::debug!(path = %path.display(), "loaded scene");
    Ok(LoadedScene {
        path: path.to_path_buf(),
        base_dir,
        scene,
    })
}

/// Command-line locators resolve against the working directory, scene
/// locators against the scene file.
fn image_locator(
    arg: Option<&str>,
    scene_value: Option<&str>,
    base_dir: Option<&Path>,
) -> Option<ImageLocator> {
    if let Some(value) = arg {
        return Some(ImageLocator::parse(value));
    }
    let locator = ImageLocator::parse(scene_value?);
    Some(match base_dir {
        Some(base) => locator.relative_to(base),
        None => locator,
    })
}

fn missing_image(arg: &str, key: &str, loaded: Option<&LoadedScene>) -> anyhow::Error {
    match loaded {
        Some(loaded) => anyhow!(
            "no {arg} image given; pass it on the command line or set `{key}` in {}",
            loaded.path.display()
        ),
        None => anyhow!("no {arg} image given and no scene file found"),
    }
}

/// Rejects combinations the individual parsers cannot see.
pub fn ensure_usable(settings: &Settings) -> Result<()> {
    let engine = &settings.engine;
    if engine.original_image == engine.depth_image {
        bail!(
            "original and depth image are the same ({})",
            engine.original_image
        );
    }
    Ok(())
}
