use std::path::PathBuf;

use clap::{Parser, Subcommand};
use renderer::GpuPowerPreference;

#[derive(Parser, Debug)]
#[command(
    name = "depthview",
    author,
    version,
    about = "Depth-map parallax viewer",
    arg_required_else_help = false
)]
pub struct Cli {
    #[command(flatten)]
    pub run: RunArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Base image (path, `file://` or `http(s)://` URL).
    #[arg(value_name = "ORIGINAL")]
    pub original: Option<String>,

    /// Depth map matching the base image.
    #[arg(value_name = "DEPTH")]
    pub depth: Option<String>,

    /// Scene file to read instead of `<config dir>/scene.toml`.
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Divisor for vertical displacement; larger is subtler.
    #[arg(long, value_name = "VALUE", value_parser = parse_threshold)]
    pub vertical_threshold: Option<f32>,

    /// Divisor for horizontal displacement; larger is subtler.
    #[arg(long, value_name = "VALUE", value_parser = parse_threshold)]
    pub horizontal_threshold: Option<f32>,

    /// Input source: `pointerMove`, `scrollOnX`, `scrollOnY` or `scrollOnBoth`.
    #[arg(long, value_name = "MODE")]
    pub respond_to: Option<String>,

    /// Move the image against the input instead of with it.
    #[arg(long)]
    pub reverse_motion: bool,

    /// Follow touch drags instead of the mouse cursor.
    #[arg(long)]
    pub touch: bool,

    /// Initial window size in logical pixels (e.g. `1280x720`).
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_dimensions)]
    pub size: Option<WindowSize>,

    /// Fixed container width; fills the window when unset. Scroll modes
    /// narrow an unset width so the canvas fits in half the window height.
    #[arg(long, value_name = "PIXELS", value_parser = parse_width)]
    pub container_width: Option<f32>,

    /// Container distance from the left edge of the window.
    #[arg(long, value_name = "PIXELS", value_parser = parse_offset)]
    pub container_left: Option<f32>,

    /// Container distance from the top of the page; one window height in
    /// scroll modes when unset.
    #[arg(long, value_name = "PIXELS", value_parser = parse_offset)]
    pub container_top: Option<f32>,

    /// Adapter power preference: `low` or `high`.
    #[arg(long, value_name = "POWER", value_parser = parse_gpu_power)]
    pub gpu_power: Option<GpuPowerPreference>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowSize {
    pub width: u32,
    pub height: u32,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Inspect scene configuration.
    Config(ConfigCommand),
}

#[derive(Parser, Debug)]
pub struct ConfigCommand {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the resolved config directory and scene file.
    Where,
    /// Resolve and validate all settings and shaders, then exit.
    Check,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_threshold(value: &str) -> Result<f32, String> {
    let parsed = parse_number(value, "threshold")?;
    if parsed == 0.0 {
        return Err("threshold must not be zero".into());
    }
    Ok(parsed)
}

pub fn parse_offset(value: &str) -> Result<f32, String> {
    let parsed = parse_number(value, "offset")?;
    if parsed < 0.0 {
        return Err("offset must not be negative".into());
    }
    Ok(parsed)
}

pub fn parse_width(value: &str) -> Result<f32, String> {
    let parsed = parse_number(value, "width")?;
    if parsed <= 0.0 {
        return Err("width must be greater than zero".into());
    }
    Ok(parsed)
}

fn parse_number(value: &str, what: &str) -> Result<f32, String> {
    let trimmed = value.trim();
    let parsed = trimmed
        .parse::<f32>()
        .map_err(|_| format!("invalid {what} '{trimmed}'"))?;
    if !parsed.is_finite() {
        return Err(format!("{what} must be finite"));
    }
    Ok(parsed)
}

pub fn parse_dimensions(value: &str) -> Result<WindowSize, String> {
    let (w, h) = value
        .split_once(['x', 'X'])
        .ok_or_else(|| "expected WIDTHxHEIGHT".to_string())?;
    let width = w
        .trim()
        .parse::<u32>()
        .map_err(|_| "invalid width in window size".to_string())?;
    let height = h
        .trim()
        .parse::<u32>()
        .map_err(|_| "invalid height in window size".to_string())?;
    if width == 0 || height == 0 {
        return Err("window dimensions must be greater than zero".into());
    }
    Ok(WindowSize { width, height })
}

pub fn parse_gpu_power(value: &str) -> Result<GpuPowerPreference, String> {
    match value.trim().to_ascii_lowercase().as_str() {
        "low" | "low-power" => Ok(GpuPowerPreference::Low),
        "high" | "high-performance" => Ok(GpuPowerPreference::High),
        other => Err(format!("unknown gpu power '{other}'; expected low or high")),
    }
}
