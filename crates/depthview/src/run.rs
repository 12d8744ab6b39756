use anyhow::{Context, Result};
use tracing_subscriber::EnvFilter;

use crate::cli::RunArgs;
use crate::paths::AppPaths;
use crate::settings::{self, Settings};

pub fn run(args: &RunArgs, paths: &AppPaths) -> Result<()> {
    let settings = resolve(args, paths)?;
    tracing::debug!(
        config = %paths.config_dir().display(),
        scene = ?settings.scene_path,
        "resolved depthview settings"
    );
    renderer::run(settings.engine)
}

/// Validates everything a run would use without opening a window.
pub fn check(args: &RunArgs, paths: &AppPaths) -> Result<()> {
    let settings = resolve(args, paths)?;
    renderer::check_shaders(&settings.engine.shaders).context("shader check failed")?;

    let engine = &settings.engine;
    match &settings.scene_path {
        Some(path) => println!("Scene:                {}", path.display()),
        None => println!("Scene:                (none)"),
    }
    println!("Original image:       {}", engine.original_image);
    println!("Depth image:          {}", engine.depth_image);
    println!(
        "Thresholds (h, v):    {}, {}",
        engine.horizontal_threshold, engine.vertical_threshold
    );
    println!("Respond to:           {}", engine.respond_to);
    println!("Reverse motion:       {}", engine.reverse_motion);
    println!("Pointer device:       {:?}", engine.pointer_device);
    println!(
        "Window:               {}x{} \"{}\"",
        engine.window_size.0, engine.window_size.1, engine.title
    );
    println!(
        "Container:            left={} top={} width={} bottom_padding={}",
        engine.container.left,
        or_auto(engine.container.top),
        or_auto(engine.container.width),
        or_auto(engine.container.bottom_padding)
    );
    println!(
        "Timing:               debounce={:?} load_timeout={:?}",
        engine.resize_debounce, engine.load_timeout
    );
    println!("GPU power:            {:?}", engine.gpu_power);
    println!("Scene OK");
    Ok(())
}

pub fn print_where(paths: &AppPaths) -> Result<()> {
    println!("Config dir: {}", paths.config_dir().display());
    let scene = paths.scene_file();
    let status = if scene.is_file() { "present" } else { "missing" };
    println!("Scene file: {} ({status})", scene.display());
    Ok(())
}

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

fn resolve(args: &RunArgs, paths: &AppPaths) -> Result<Settings> {
    let settings = settings::resolve(args, &paths.scene_file())?;
    settings::ensure_usable(&settings)?;
    Ok(settings)
}

fn or_auto(value: Option<f32>) -> String {
    value.map_or_else(|| "auto".to_string(), |value| value.to_string())
}
