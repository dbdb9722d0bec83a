//! Clip playback on a synthetic clock
//!
//! Bevy's player normally advances with frame time. Here the clip is held
//! paused and seeked forward by a fixed step every frame, so playback speed
//! does not depend on the display's frame rate.

use bevy::animation::graph::AnimationNodeIndex;
use bevy::ecs::system::SystemParam;
use bevy::prelude::*;
use bevy::scene::SceneInstanceReady;

use crate::config::SceneConfig;

/// Plugin for synthetic-clock clip playback
pub struct ClipPlaybackPlugin;

impl Plugin for ClipPlaybackPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Update, advance_animation_drivers);
    }
}

/// Fixed-step clip clock that loops at the clip duration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyntheticClock {
    seek: f32,
    step: f32,
}

impl SyntheticClock {
    pub fn new(step: f32) -> Self {
        Self { seek: 0.0, step }
    }

    pub fn seek(&self) -> f32 {
        self.seek
    }

    /// Move forward one frame; a non-positive duration means "unknown yet"
    /// and the clock runs unwrapped
    pub fn advance(&mut self, clip_duration: f32) -> f32 {
        self.seek += self.step;
        if clip_duration > 0.0 {
            self.seek = self.seek.rem_euclid(clip_duration);
        }
        self.seek
    }
}

/// Clip waiting for its model's scene to be instantiated
#[derive(Component, Debug, Clone)]
pub struct PendingClip {
    pub clip: Handle<AnimationClip>,
}

/// Drives one clip on the animation player of a loaded model
#[derive(Component, Debug, Clone)]
pub struct AnimationDriver {
    pub clock: SyntheticClock,
    pub node: AnimationNodeIndex,
    pub clip: Handle<AnimationClip>,
}

/// Starts pending clips on the animation players of spawned models
#[derive(SystemParam)]
pub struct ClipStarter<'w, 's> {
    commands: Commands<'w, 's>,
    pending: Query<'w, 's, &'static PendingClip>,
    children: Query<'w, 's, &'static Children>,
    players: Query<'w, 's, &'static mut AnimationPlayer>,
    graphs: ResMut<'w, Assets<AnimationGraph>>,
}

impl ClipStarter<'_, '_> {
    /// Start the clip pending on `root` on the first animation player found
    /// under it; returns the player entity
    pub fn start(&mut self, root: Entity, step: f32) -> Option<Entity> {
        let clip = self.pending.get(root).ok()?.clip.clone();
        self.commands.entity(root).remove::<PendingClip>();

        let Some(player_entity) = self
            .children
            .iter_descendants(root)
            .find(|entity| self.players.contains(*entity))
        else {
            tracing::warn!("Model has an animation clip but no animation player");
            return None;
        };

        let (graph, node) = AnimationGraph::from_clip(clip.clone());
        let graph = self.graphs.add(graph);

        if let Ok(mut player) = self.players.get_mut(player_entity) {
            player.play(node).repeat().pause();
        }

        self.commands.entity(player_entity).insert((
            AnimationGraphHandle(graph),
            AnimationDriver {
                clock: SyntheticClock::new(step),
                node,
                clip,
            },
        ));
        tracing::info!("Animation clip started");
        Some(player_entity)
    }
}

/// Once the model's scene is spawned, start its clip
pub fn attach_animation_driver(
    ready: On<SceneInstanceReady>,
    mut starter: ClipStarter,
    config: Res<SceneConfig>,
) {
    starter.start(ready.entity, config.animation.step_secs);
}

/// Seek every driven clip forward by one synthetic step
pub fn advance_animation_drivers(
    clips: Res<Assets<AnimationClip>>,
    mut drivers: Query<(&mut AnimationDriver, &mut AnimationPlayer)>,
) {
    for (mut driver, mut player) in drivers.iter_mut() {
        let duration = clips
            .get(&driver.clip)
            .map(|clip| clip.duration())
            .unwrap_or(0.0);
        let node = driver.node;
        let seek = driver.clock.advance(duration);
        if let Some(active) = player.animation_mut(node) {
            active.seek_to(seek);
        }
    }
}
