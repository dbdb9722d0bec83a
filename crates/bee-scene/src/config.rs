//! Scene configuration - camera, lights, models and motion constants
//!
//! Loaded from a TOML file on desktop and patched from URL query
//! parameters in the browser. Every section has defaults, so an empty
//! document is a valid configuration.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;
use tracing::info;

use crate::rotation::RotationMode;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read scene config: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse scene config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Failed to serialize scene config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Invalid scene config: {0}")]
    Invalid(String),
    #[error("Unknown override key: {0}")]
    UnknownOverride(String),
}

/// Query parameter keys accepted by [`SceneConfig::apply_override`]
pub const OVERRIDE_KEYS: &[&str] = &[
    "mode",
    "coefficient",
    "coalesce",
    "hover_speed",
    "hover_height",
    "step",
    "fov",
    "model",
    "model2",
];

/// Top-level scene configuration
#[derive(Debug, Clone, Serialize, Deserialize, Resource)]
pub struct SceneConfig {
    #[serde(default)]
    pub camera: CameraConfig,
    #[serde(default)]
    pub lighting: LightingConfig,
    #[serde(default)]
    pub scroll: ScrollConfig,
    #[serde(default)]
    pub hover: HoverConfig,
    #[serde(default)]
    pub animation: AnimationConfig,
    #[serde(default)]
    pub surface: SurfaceConfig,
    #[serde(default = "default_models", rename = "model")]
    pub models: Vec<ModelConfig>,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            camera: CameraConfig::default(),
            lighting: LightingConfig::default(),
            scroll: ScrollConfig::default(),
            hover: HoverConfig::default(),
            animation: AnimationConfig::default(),
            surface: SurfaceConfig::default(),
            models: default_models(),
        }
    }
}

/// Perspective camera placement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CameraConfig {
    /// Vertical field of view in degrees
    #[serde(default = "default_fov")]
    pub fov_degrees: f32,
    #[serde(default = "default_near")]
    pub near: f32,
    #[serde(default = "default_far")]
    pub far: f32,
    #[serde(default = "default_camera_position")]
    pub position: [f32; 3],
    #[serde(default)]
    pub look_at: [f32; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            fov_degrees: default_fov(),
            near: default_near(),
            far: default_far(),
            position: default_camera_position(),
            look_at: [0.0; 3],
        }
    }
}

fn default_fov() -> f32 {
    10.0
}

fn default_near() -> f32 {
    0.1
}

fn default_far() -> f32 {
    1000.0
}

fn default_camera_position() -> [f32; 3] {
    [0.0, 0.0, 6.0]
}

/// Ambient fill plus one directional "sun"
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LightingConfig {
    /// Linear RGB (0.0-1.0)
    #[serde(default = "default_white")]
    pub ambient_color: [f32; 3],
    #[serde(default = "default_ambient_brightness")]
    pub ambient_brightness: f32,
    #[serde(default = "default_white")]
    pub directional_color: [f32; 3],
    /// Illuminance in lux
    #[serde(default = "default_illuminance")]
    pub directional_illuminance: f32,
    /// The light is aimed from here at the origin
    #[serde(default = "default_light_position")]
    pub directional_position: [f32; 3],
}

impl Default for LightingConfig {
    fn default() -> Self {
        Self {
            ambient_color: default_white(),
            ambient_brightness: default_ambient_brightness(),
            directional_color: default_white(),
            directional_illuminance: default_illuminance(),
            directional_position: default_light_position(),
        }
    }
}

fn default_white() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

fn default_ambient_brightness() -> f32 {
    650.0
}

fn default_illuminance() -> f32 {
    4000.0
}

fn default_light_position() -> [f32; 3] {
    [500.0, 500.0, 500.0]
}

/// Scroll-to-rotation mapping
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrollConfig {
    #[serde(default)]
    pub mode: RotationMode,
    /// Radians per pixel of scroll offset
    #[serde(default = "default_coefficient")]
    pub coefficient: f32,
    /// Apply only the latest scroll sample of each frame
    #[serde(default = "default_true")]
    pub coalesce: bool,
    /// Desktop only: pixels of virtual page offset per wheel line
    #[serde(default = "default_pixels_per_line")]
    pub pixels_per_line: f32,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            mode: RotationMode::default(),
            coefficient: default_coefficient(),
            coalesce: true,
            pixels_per_line: default_pixels_per_line(),
        }
    }
}

fn default_coefficient() -> f32 {
    0.0001
}

fn default_pixels_per_line() -> f32 {
    40.0
}

fn default_true() -> bool {
    true
}

/// Vertical bob applied every frame
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HoverConfig {
    /// World units per frame
    #[serde(default = "default_hover_speed")]
    pub speed: f32,
    /// Half of the bob range
    #[serde(default = "default_hover_height")]
    pub height: f32,
}

impl Default for HoverConfig {
    fn default() -> Self {
        Self {
            speed: default_hover_speed(),
            height: default_hover_height(),
        }
    }
}

fn default_hover_speed() -> f32 {
    0.001
}

fn default_hover_height() -> f32 {
    0.5
}

/// Clip playback driven by a synthetic clock
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimationConfig {
    /// Seconds added to the clip clock every frame
    #[serde(default = "default_step")]
    pub step_secs: f32,
    /// Which clip of the asset to play
    #[serde(default)]
    pub clip_index: usize,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            step_secs: default_step(),
            clip_index: 0,
        }
    }
}

fn default_step() -> f32 {
    0.02
}

/// Where the renderer surface is attached
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurfaceConfig {
    /// Id of the page element that hosts the canvas
    #[serde(default = "default_container")]
    pub container_id: String,
    /// Id given to the canvas created inside the container
    #[serde(default = "default_canvas")]
    pub canvas_id: String,
    /// Clear to fully transparent so the page shows through
    #[serde(default = "default_true")]
    pub transparent: bool,
}

impl Default for SurfaceConfig {
    fn default() -> Self {
        Self {
            container_id: default_container(),
            canvas_id: default_canvas(),
            transparent: true,
        }
    }
}

fn default_container() -> String {
    "container3D".to_string()
}

fn default_canvas() -> String {
    "bee-canvas".to_string()
}

/// One asset to load at startup
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Asset path relative to the asset root (e.g., "mtb.glb")
    pub path: String,
    #[serde(default = "default_model_scale")]
    pub scale: f32,
    #[serde(default)]
    pub position: [f32; 3],
    /// Bob this model up and down
    #[serde(default = "default_true")]
    pub hover: bool,
    /// Rotate this model from scroll offset
    #[serde(default = "default_true")]
    pub scroll_rotation: bool,
}

impl ModelConfig {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            scale: default_model_scale(),
            position: [0.0; 3],
            hover: true,
            scroll_rotation: true,
        }
    }
}

fn default_model_scale() -> f32 {
    0.1
}

fn default_models() -> Vec<ModelConfig> {
    vec![ModelConfig::new("mtb.glb")]
}

impl SceneConfig {
    /// Load configuration from a TOML file, falling back to defaults when
    /// the file does not exist
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            let config = Self::from_toml(&content)?;
            info!(path = %path.display(), "Loaded scene configuration");
            Ok(config)
        } else {
            info!(
                path = %path.display(),
                "Scene configuration not found, using defaults"
            );
            Ok(Self::default())
        }
    }

    /// Parse and validate a TOML document
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: SceneConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Render as a TOML document
    pub fn to_toml(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Reject values that would break the motion invariants
    pub fn validate(&self) -> Result<(), ConfigError> {
        let camera = &self.camera;
        if !(camera.fov_degrees > 0.0 && camera.fov_degrees < 180.0) {
            return Err(ConfigError::Invalid(format!(
                "camera.fov_degrees must be in (0, 180), got {}",
                camera.fov_degrees
            )));
        }
        if !(camera.near > 0.0 && camera.far > camera.near) {
            return Err(ConfigError::Invalid(format!(
                "camera clip planes must satisfy 0 < near < far, got near={} far={}",
                camera.near, camera.far
            )));
        }
        if !self.scroll.coefficient.is_finite() {
            return Err(ConfigError::Invalid(
                "scroll.coefficient must be finite".to_string(),
            ));
        }
        if !(self.hover.height > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "hover.height must be positive, got {}",
                self.hover.height
            )));
        }
        if !(self.hover.speed > 0.0 && self.hover.speed <= self.hover.height) {
            return Err(ConfigError::Invalid(format!(
                "hover.speed must be in (0, hover.height], got {}",
                self.hover.speed
            )));
        }
        if !(self.animation.step_secs >= 0.0 && self.animation.step_secs.is_finite()) {
            return Err(ConfigError::Invalid(format!(
                "animation.step_secs must be non-negative, got {}",
                self.animation.step_secs
            )));
        }
        for model in &self.models {
            if model.path.is_empty() {
                return Err(ConfigError::Invalid("model.path must not be empty".to_string()));
            }
            if !(model.scale > 0.0) {
                return Err(ConfigError::Invalid(format!(
                    "model {} has non-positive scale {}",
                    model.path, model.scale
                )));
            }
        }
        Ok(())
    }

    /// Apply a single `key=value` override (URL query parameter or CLI flag)
    ///
    /// `model` replaces the first model's path, `model2` sets or adds the
    /// second model.
    pub fn apply_override(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "mode" => self.scroll.mode = value.parse()?,
            "coefficient" => self.scroll.coefficient = parse_number(key, value)?,
            "coalesce" => self.scroll.coalesce = parse_flag(key, value)?,
            "hover_speed" => self.hover.speed = parse_number(key, value)?,
            "hover_height" => self.hover.height = parse_number(key, value)?,
            "step" => self.animation.step_secs = parse_number(key, value)?,
            "fov" => self.camera.fov_degrees = parse_number(key, value)?,
            "model" => match self.models.first_mut() {
                Some(first) => first.path = value.to_string(),
                None => self.models.push(ModelConfig::new(value)),
            },
            "model2" => {
                if self.models.len() >= 2 {
                    self.models[1].path = value.to_string();
                } else {
                    self.models.push(ModelConfig::new(value));
                }
            }
            other => return Err(ConfigError::UnknownOverride(other.to_string())),
        }
        Ok(())
    }

    /// Apply several overrides, keeping each only while the configuration
    /// still validates
    ///
    /// A rejected key leaves the others in place. Keys are retried while
    /// progress is made, so `hover_speed` may come before the
    /// `hover_height` it depends on. Returns the keys that stayed rejected.
    pub fn apply_overrides<'a>(
        &mut self,
        overrides: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Vec<(String, ConfigError)> {
        let mut remaining: Vec<(&str, &str)> = overrides.into_iter().collect();
        loop {
            let attempted = remaining.len();
            let mut rejected = Vec::new();
            let mut retry = Vec::new();

            for (key, value) in remaining {
                let mut candidate = self.clone();
                match candidate
                    .apply_override(key, value)
                    .and_then(|()| candidate.validate())
                {
                    Ok(()) => *self = candidate,
                    Err(e) => {
                        rejected.push((key.to_string(), e));
                        retry.push((key, value));
                    }
                }
            }

            if retry.is_empty() || retry.len() == attempted {
                return rejected;
            }
            remaining = retry;
        }
    }
}

fn parse_number(key: &str, value: &str) -> Result<f32, ConfigError> {
    value
        .trim()
        .parse::<f32>()
        .map_err(|_| ConfigError::Invalid(format!("{key} expects a number, got {value:?}")))
}

fn parse_flag(key: &str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::Invalid(format!(
            "{key} expects a boolean, got {value:?}"
        ))),
    }
}
