//! Scroll-driven rotation of the loaded models

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::config::{ConfigError, SceneConfig, ScrollConfig};
use crate::input::{drain_scroll_samples, PendingScroll, ScrollSample};

/// How a scroll sample turns into rotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationMode {
    /// Every sample adds `offset * coefficient` to a running total, which is
    /// then assigned to the models as an absolute rotation
    #[default]
    Accumulate,
    /// Every sample adds `(offset - previous offset) * coefficient`
    Incremental,
}

impl FromStr for RotationMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "accumulate" | "absolute" | "a" => Ok(Self::Accumulate),
            "incremental" | "delta" | "b" => Ok(Self::Incremental),
            other => Err(ConfigError::Invalid(format!(
                "unknown rotation mode {other:?} (expected accumulate or incremental)"
            ))),
        }
    }
}

/// Plugin for scroll sampling and rotation
pub struct ScrollPlugin;

impl Plugin for ScrollPlugin {
    fn build(&self, app: &mut App) {
        let rotation = app
            .world()
            .get_resource::<SceneConfig>()
            .map(|config| ScrollRotation::from_config(&config.scroll))
            .unwrap_or_else(|| ScrollRotation::from_config(&ScrollConfig::default()));

        app.init_resource::<PendingScroll>()
            .insert_resource(rotation)
            .add_message::<ScrollSample>()
            .add_systems(Update, (drain_scroll_samples, apply_scroll_rotation).chain());
    }
}

/// Marker for models that follow [`ScrollRotation`]
#[derive(Component, Debug, Default)]
pub struct ScrollRotated;

/// Accumulated rotation angles (x, y, z) in radians
#[derive(Resource, Debug, Clone)]
pub struct ScrollRotation {
    mode: RotationMode,
    coefficient: f32,
    angles: Vec3,
    last_offset: Option<f32>,
}

impl ScrollRotation {
    pub fn new(mode: RotationMode, coefficient: f32) -> Self {
        Self {
            mode,
            coefficient,
            angles: Vec3::ZERO,
            last_offset: None,
        }
    }

    pub fn from_config(config: &ScrollConfig) -> Self {
        Self::new(config.mode, config.coefficient)
    }

    pub fn angles(&self) -> Vec3 {
        self.angles
    }

    /// Fold one absolute page offset into the angles and return them
    ///
    /// The page starts at offset zero, so the first incremental sample is
    /// measured from there.
    pub fn on_scroll(&mut self, offset: f32) -> Vec3 {
        let step = match self.mode {
            RotationMode::Accumulate => offset * self.coefficient,
            RotationMode::Incremental => {
                (offset - self.last_offset.unwrap_or(0.0)) * self.coefficient
            }
        };
        self.angles += Vec3::splat(step);
        self.last_offset = Some(offset);
        self.angles
    }

    /// Current angles as an XYZ Euler rotation
    pub fn rotation(&self) -> Quat {
        Quat::from_euler(EulerRot::XYZ, self.angles.x, self.angles.y, self.angles.z)
    }
}

/// Fold this frame's scroll samples into the rotation and push it to every
/// loaded model
pub fn apply_scroll_rotation(
    mut samples: MessageReader<ScrollSample>,
    mut rotation: ResMut<ScrollRotation>,
    mut models: Query<&mut Transform, With<ScrollRotated>>,
) {
    let mut changed = false;
    for sample in samples.read() {
        rotation.on_scroll(sample.offset);
        changed = true;
    }
    if !changed {
        return;
    }

    let quat = rotation.rotation();
    for mut transform in models.iter_mut() {
        transform.rotation = quat;
    }
    tracing::trace!(angles = ?rotation.angles(), "Scroll rotation applied");
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f32 = 1e-6;

    #[test]
    fn test_accumulate_is_linear_in_offset() {
        for offset in [0.0_f32, 1.0, 250.0, 1000.0, 12345.0] {
            let mut rotation = ScrollRotation::new(RotationMode::Accumulate, 0.0001);
            let angles = rotation.on_scroll(offset);
            assert!((angles.x - offset * 0.0001).abs() < EPS);
            assert_eq!(angles.x, angles.y);
            assert_eq!(angles.y, angles.z);
        }
    }

    #[test]
    fn test_accumulate_scenario() {
        let mut rotation = ScrollRotation::new(RotationMode::Accumulate, 0.0001);
        let before = rotation.angles();
        let after = rotation.on_scroll(1000.0);
        assert!((after - before - Vec3::splat(0.1)).abs().max_element() < EPS);

        // The same absolute offset adds the same amount again
        let again = rotation.on_scroll(1000.0);
        assert!((again - Vec3::splat(0.2)).abs().max_element() < EPS);
    }

    #[test]
    fn test_incremental_follows_delta() {
        let mut rotation = ScrollRotation::new(RotationMode::Incremental, 0.001);

        let a = rotation.on_scroll(100.0);
        assert!((a.x - 0.1).abs() < EPS);

        let b = rotation.on_scroll(300.0);
        assert!((b.x - (a.x + 200.0 * 0.001)).abs() < EPS);

        // Scrolling back up unwinds, nothing is clamped
        let c = rotation.on_scroll(0.0);
        assert!(c.x.abs() < EPS);
        let d = rotation.on_scroll(0.0);
        assert_eq!(c, d);
    }

    #[test]
    fn test_mode_from_str() {
        assert_eq!("accumulate".parse::<RotationMode>().unwrap(), RotationMode::Accumulate);
        assert_eq!(" Incremental ".parse::<RotationMode>().unwrap(), RotationMode::Incremental);
        assert!("spin".parse::<RotationMode>().is_err());
    }

    fn scroll_app(mode: RotationMode) -> App {
        let mut app = App::new();
        app.add_message::<ScrollSample>()
            .insert_resource(ScrollRotation::new(mode, 0.0001))
            .add_systems(Update, apply_scroll_rotation);
        app
    }

    #[test]
    fn test_scroll_before_load_touches_nothing() {
        let mut app = scroll_app(RotationMode::Accumulate);
        let unrelated = app.world_mut().spawn(Transform::default()).id();

        app.world_mut().write_message(ScrollSample { offset: 1000.0 });
        app.update();

        let angles = app.world().resource::<ScrollRotation>().angles();
        assert!((angles.x - 0.1).abs() < EPS);
        let transform = app.world().get::<Transform>(unrelated).unwrap();
        assert_eq!(transform.rotation, Quat::IDENTITY);
    }

    #[test]
    fn test_scroll_rotates_every_model() {
        let mut app = scroll_app(RotationMode::Accumulate);
        let bee = app.world_mut().spawn((Transform::default(), ScrollRotated)).id();
        let flower = app.world_mut().spawn((Transform::default(), ScrollRotated)).id();

        app.world_mut().write_message(ScrollSample { offset: 1000.0 });
        app.update();

        let expected = Quat::from_euler(EulerRot::XYZ, 0.1, 0.1, 0.1);
        for entity in [bee, flower] {
            let transform = app.world().get::<Transform>(entity).unwrap();
            assert!(transform.rotation.abs_diff_eq(expected, EPS));
        }
    }

    #[test]
    fn test_no_sample_keeps_rotation() {
        let mut app = scroll_app(RotationMode::Incremental);
        let bee = app
            .world_mut()
            .spawn((Transform::from_rotation(Quat::from_rotation_y(1.0)), ScrollRotated))
            .id();

        app.update();

        let transform = app.world().get::<Transform>(bee).unwrap();
        assert!(transform.rotation.abs_diff_eq(Quat::from_rotation_y(1.0), EPS));
    }
}
