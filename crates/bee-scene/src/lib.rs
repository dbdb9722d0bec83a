//! Bee Scene - scroll-driven hovering model scene
//!
//! This crate provides the scene used by both the browser build (bee-web)
//! and the native window (bee-desktop):
//! - camera, lights and transparent render surface setup
//! - asynchronous GLTF model loading and one-shot attachment
//! - scroll offset to rotation mapping (accumulating or incremental)
//! - a bounded hover bob and fixed-step animation clip playback

pub mod animation;
pub mod camera;
pub mod config;
pub mod hover;
pub mod input;
pub mod models;
pub mod rotation;
pub mod scene;

use bevy::prelude::*;

/// Plugin that sets up the whole scene from a [`SceneConfig`]
pub struct BeeScenePlugin {
    pub config: SceneConfig,
}

impl BeeScenePlugin {
    pub fn new(config: SceneConfig) -> Self {
        Self { config }
    }
}

impl Plugin for BeeScenePlugin {
    fn build(&self, app: &mut App) {
        app.insert_resource(self.config.clone())
            .add_plugins(camera::CameraPlugin)
            .add_plugins(scene::SceneSetupPlugin)
            .add_plugins(rotation::ScrollPlugin)
            .add_plugins(models::ModelsPlugin)
            .add_plugins(hover::HoverPlugin)
            .add_plugins(animation::ClipPlaybackPlugin);
    }
}

// Re-export commonly used types
pub use config::{ConfigError, ModelConfig, SceneConfig};
pub use input::{PendingScroll, WheelScrollPlugin};
pub use rotation::{RotationMode, ScrollRotation};
