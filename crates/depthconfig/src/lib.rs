//! Scene files for the parallax viewer.
//!
//! A scene names the two images and any settings that differ from the
//! engine defaults. Every field is optional so command-line flags can fill or
//! override it; [`SceneConfig::from_toml_str`] only rejects values that could
//! never be valid.

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::de::{self, Deserializer};
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to parse scene: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid scene: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PointerDeviceSetting {
    Mouse,
    Touch,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PowerSetting {
    Low,
    High,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SceneConfig {
    pub version: u32,
    #[serde(default)]
    pub original_image: Option<String>,
    #[serde(default)]
    pub depth_image: Option<String>,
    #[serde(default)]
    pub vertical_threshold: Option<f32>,
    #[serde(default)]
    pub horizontal_threshold: Option<f32>,
    /// Kept as text; unknown names are resolved by the engine.
    #[serde(default)]
    pub respond_to: Option<String>,
    #[serde(default)]
    pub reverse_motion: Option<bool>,
    #[serde(default)]
    pub pointer_device: Option<PointerDeviceSetting>,
    #[serde(default)]
    pub window: WindowSection,
    #[serde(default)]
    pub container: ContainerSection,
    #[serde(default)]
    pub timing: TimingSection,
    #[serde(default)]
    pub shaders: ShaderSection,
    #[serde(default)]
    pub gpu: GpuSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WindowSection {
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ContainerSection {
    pub left: Option<f32>,
    pub top: Option<f32>,
    pub width: Option<f32>,
    pub bottom_padding: Option<f32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TimingSection {
    #[serde(default, deserialize_with = "deserialize_duration_opt")]
    pub resize_debounce: Option<Duration>,
    #[serde(default, deserialize_with = "deserialize_duration_opt")]
    pub load_timeout: Option<Duration>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShaderSection {
    pub vertex: Option<PathBuf>,
    pub fragment: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GpuSection {
    pub power: Option<PowerSetting>,
}

fn deserialize_duration_opt<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
where
    D: Deserializer<'de>,
{
    struct Visitor;
    impl<'de> de::Visitor<'de> for Visitor {
        type Value = Option<Duration>;

        fn expecting(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
            formatter.write_str("a duration as number of seconds or human-readable string")
        }

        fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            humantime::parse_duration(v)
                .map(Some)
                .map_err(|err| E::custom(format!("invalid duration '{v}': {err}")))
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(Some(Duration::from_secs(v)))
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if v < 0 {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Some(Duration::from_secs(v as u64)))
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            if !v.is_finite() || v.is_sign_negative() {
                return Err(E::custom("duration must be non-negative"));
            }
            Ok(Some(Duration::from_secs_f64(v)))
        }
    }

    deserializer.deserialize_any(Visitor)
}

impl SceneConfig {
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let raw: SceneConfig = toml::from_str(input)?;
        raw.validate()?;
        Ok(raw)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.version != 1 {
            return Err(ConfigError::Invalid(format!(
                "unsupported scene version {}; expected 1",
                self.version
            )));
        }

        for (name, value) in [
            ("vertical_threshold", self.vertical_threshold),
            ("horizontal_threshold", self.horizontal_threshold),
        ] {
            validate_threshold(name, value)?;
        }

        for (name, value) in [
            ("original_image", &self.original_image),
            ("depth_image", &self.depth_image),
        ] {
            if value.as_deref().is_some_and(|value| value.trim().is_empty()) {
                return Err(ConfigError::Invalid(format!("{name} may not be empty")));
            }
        }

        for (name, value) in [("width", self.window.width), ("height", self.window.height)] {
            if value == Some(0) {
                return Err(ConfigError::Invalid(format!(
                    "window.{name} must be greater than zero"
                )));
            }
        }

        for (name, value) in [
            ("left", self.container.left),
            ("top", self.container.top),
            ("bottom_padding", self.container.bottom_padding),
        ] {
            if let Some(value) = value {
                if !value.is_finite() || value < 0.0 {
                    return Err(ConfigError::Invalid(format!(
                        "container.{name} must be a finite, non-negative number"
                    )));
                }
            }
        }
        if let Some(width) = self.container.width {
            if !width.is_finite() || width <= 0.0 {
                return Err(ConfigError::Invalid(
                    "container.width must be a finite number greater than zero".into(),
                ));
            }
        }

        if self.timing.load_timeout.is_some_and(|timeout| timeout.is_zero()) {
            return Err(ConfigError::Invalid(
                "timing.load_timeout must be greater than zero".into(),
            ));
        }

        Ok(())
    }
}

/// Thresholds divide the displacement in the shader.
pub fn validate_threshold(name: &str, value: Option<f32>) -> Result<(), ConfigError> {
    match value {
        Some(value) if !value.is_finite() || value == 0.0 => Err(ConfigError::Invalid(format!(
            "{name} must be a finite, non-zero number (got {value})"
        ))),
        _ => Ok(()),
    }
}
