//! Scene setup - the directional "sun"
//!
//! Ambient fill is carried by the camera (see [`crate::camera`]).

use bevy::prelude::*;

use crate::config::{LightingConfig, SceneConfig};

/// Marker component for the main directional light
#[derive(Component)]
pub struct MainDirectionalLight;

/// Plugin for scene setup
pub struct SceneSetupPlugin;

impl Plugin for SceneSetupPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, setup_lighting);
    }
}

fn setup_lighting(mut commands: Commands, config: Res<SceneConfig>) {
    let lighting: &LightingConfig = &config.lighting;

    commands.spawn((
        DirectionalLight {
            color: rgb(lighting.directional_color),
            illuminance: lighting.directional_illuminance,
            shadows_enabled: false,
            ..default()
        },
        Transform::from_translation(Vec3::from_array(lighting.directional_position))
            .looking_at(Vec3::ZERO, Vec3::Y),
        MainDirectionalLight,
    ));
}

pub(crate) fn rgb([r, g, b]: [f32; 3]) -> Color {
    Color::linear_rgb(r, g, b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lighting_from_config() {
        let mut config = SceneConfig::default();
        config.lighting.directional_illuminance = 123.0;

        let mut app = App::new();
        app.insert_resource(config).add_systems(Startup, setup_lighting);
        app.update();

        let mut lights = app
            .world_mut()
            .query_filtered::<(&DirectionalLight, &Transform), With<MainDirectionalLight>>();
        let found: Vec<(f32, Vec3)> = lights
            .iter(app.world())
            .map(|(light, transform)| (light.illuminance, transform.translation))
            .collect();
        assert_eq!(found, vec![(123.0, Vec3::splat(500.0))]);
    }
}
