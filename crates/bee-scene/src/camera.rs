//! Camera setup and viewport tracking

use bevy::prelude::*;
use bevy::window::{PrimaryWindow, WindowResized};

use crate::config::SceneConfig;
use crate::scene::rgb;

/// Marker component for the main camera
#[derive(Component)]
pub struct MainCamera;

/// Current drawing surface size in logical pixels
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f32,
    pub height: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280.0,
            height: 720.0,
        }
    }
}

impl Viewport {
    /// Width over height; `None` for a collapsed surface
    pub fn aspect_ratio(&self) -> Option<f32> {
        (self.height > 0.0 && self.width > 0.0).then(|| self.width / self.height)
    }
}

/// Plugin for the camera and its viewport
pub struct CameraPlugin;

impl Plugin for CameraPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<Viewport>()
            .add_systems(Startup, spawn_camera)
            .add_systems(Update, track_viewport);
    }
}

fn spawn_camera(
    mut commands: Commands,
    config: Res<SceneConfig>,
    windows: Query<&Window, With<PrimaryWindow>>,
    mut viewport: ResMut<Viewport>,
) {
    if let Ok(window) = windows.single() {
        viewport.width = window.width();
        viewport.height = window.height();
    }

    let camera = &config.camera;
    let mut projection = PerspectiveProjection {
        fov: camera.fov_degrees.to_radians(),
        near: camera.near,
        far: camera.far,
        ..default()
    };
    if let Some(aspect_ratio) = viewport.aspect_ratio() {
        projection.aspect_ratio = aspect_ratio;
    }

    let clear_color = if config.surface.transparent {
        ClearColorConfig::Custom(Color::NONE)
    } else {
        ClearColorConfig::Default
    };

    commands.spawn((
        Camera3d::default(),
        Camera {
            clear_color,
            ..default()
        },
        Projection::Perspective(projection),
        AmbientLight {
            color: rgb(config.lighting.ambient_color),
            brightness: config.lighting.ambient_brightness,
            ..default()
        },
        Transform::from_translation(Vec3::from_array(camera.position))
            .looking_at(Vec3::from_array(camera.look_at), Vec3::Y),
        MainCamera,
    ));

    tracing::info!(
        fov = camera.fov_degrees,
        width = viewport.width,
        height = viewport.height,
        "Camera ready"
    );
}

/// Keep the viewport and the camera aspect ratio in step with the window
pub fn track_viewport(
    mut resized: MessageReader<WindowResized>,
    mut viewport: ResMut<Viewport>,
    mut cameras: Query<&mut Projection, With<MainCamera>>,
) {
    let Some(last) = resized.read().last() else {
        return;
    };

    viewport.width = last.width;
    viewport.height = last.height;

    let Some(aspect_ratio) = viewport.aspect_ratio() else {
        return;
    };
    for mut projection in cameras.iter_mut() {
        if let Projection::Perspective(perspective) = projection.as_mut() {
            perspective.aspect_ratio = aspect_ratio;
        }
    }
    tracing::debug!(width = last.width, height = last.height, "Viewport resized");
}
