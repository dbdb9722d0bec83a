//! Model loading and attachment
//!
//! Load requests are issued once at startup. Each frame the outstanding
//! requests are polled; a finished load becomes a [`ModelLoaded`] value that
//! the attach step turns into a scene entity. A slot is attached at most
//! once, so repeated notifications never duplicate a model.

use bevy::asset::LoadState;
use bevy::gltf::Gltf;
use bevy::prelude::*;
use std::collections::HashMap;

use crate::animation::{attach_animation_driver, PendingClip};
use crate::config::{ModelConfig, SceneConfig};
use crate::hover::HoverBob;
use crate::rotation::{ScrollRotated, ScrollRotation};

/// A load request that has not resolved yet
#[derive(Debug, Clone)]
pub struct PendingModel {
    pub slot: usize,
    pub handle: Handle<Gltf>,
}

/// Outstanding loads and the entities of attached models
#[derive(Resource, Default)]
pub struct ModelRegistry {
    pub pending: Vec<PendingModel>,
    pub attached: HashMap<usize, Entity>,
}

impl ModelRegistry {
    pub fn is_attached(&self, slot: usize) -> bool {
        self.attached.contains_key(&slot)
    }
}

/// A resolved load, ready to be placed in the scene
#[derive(Message, Debug, Clone)]
pub struct ModelLoaded {
    pub slot: usize,
    pub scene: Handle<Scene>,
    pub clip: Option<Handle<AnimationClip>>,
}

/// Index of the configured model an entity was spawned from
#[derive(Component, Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelSlot(pub usize);

/// Plugin for model loading
pub struct ModelsPlugin;

impl Plugin for ModelsPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ModelRegistry>()
            .add_message::<ModelLoaded>()
            .add_systems(Startup, request_models)
            .add_systems(Update, (poll_model_loads, attach_models).chain());
    }
}

/// Fire one load request per configured model
fn request_models(
    asset_server: Res<AssetServer>,
    config: Res<SceneConfig>,
    mut registry: ResMut<ModelRegistry>,
) {
    for (slot, model) in config.models.iter().enumerate() {
        tracing::info!("Starting to load model: {}", model.path);
        let handle: Handle<Gltf> = asset_server.load(model.path.clone());
        registry.pending.push(PendingModel { slot, handle });
    }
}

/// What became of a pending request this frame
#[derive(Debug)]
pub enum LoadOutcome {
    /// Still loading, ask again next frame
    Waiting,
    Ready(ModelLoaded),
    /// Failed or unusable; the slot stays empty
    Dropped,
}

/// Classify one request from its load state and, once loaded, its asset
pub fn resolve_load(
    pending: &PendingModel,
    state: Option<LoadState>,
    gltf: Option<&Gltf>,
    clip_index: usize,
    path: &str,
) -> LoadOutcome {
    match state {
        Some(LoadState::Loaded) => {
            let Some(gltf) = gltf else {
                // Reported loaded before the asset landed; try next frame
                return LoadOutcome::Waiting;
            };
            let scene = gltf
                .default_scene
                .clone()
                .or_else(|| gltf.scenes.first().cloned());
            match scene {
                Some(scene) => {
                    tracing::info!("Model loaded: {}", path);
                    LoadOutcome::Ready(ModelLoaded {
                        slot: pending.slot,
                        scene,
                        clip: gltf.animations.get(clip_index).cloned(),
                    })
                }
                None => {
                    tracing::warn!("Model {} has no scenes, skipping", path);
                    LoadOutcome::Dropped
                }
            }
        }
        Some(LoadState::Failed(err)) => {
            tracing::warn!("Failed to load model {}: {}", path, err);
            LoadOutcome::Dropped
        }
        _ => LoadOutcome::Waiting,
    }
}

impl ModelRegistry {
    /// Resolve every pending request, keeping only those still waiting
    pub fn settle(
        &mut self,
        mut resolve: impl FnMut(&PendingModel) -> LoadOutcome,
    ) -> Vec<ModelLoaded> {
        let mut ready = Vec::new();
        self.pending.retain(|pending| match resolve(pending) {
            LoadOutcome::Waiting => true,
            LoadOutcome::Ready(loaded) => {
                ready.push(loaded);
                false
            }
            LoadOutcome::Dropped => false,
        });
        ready
    }
}

/// Check loading state and extract scenes from loaded GLTFs
fn poll_model_loads(
    mut registry: ResMut<ModelRegistry>,
    asset_server: Res<AssetServer>,
    gltf_assets: Res<Assets<Gltf>>,
    config: Res<SceneConfig>,
    mut loaded: MessageWriter<ModelLoaded>,
) {
    let clip_index = config.animation.clip_index;

    let ready = registry.settle(|pending| {
        let path = config
            .models
            .get(pending.slot)
            .map(|m| m.path.as_str())
            .unwrap_or("?");
        resolve_load(
            pending,
            asset_server.get_load_state(pending.handle.id()),
            gltf_assets.get(&pending.handle),
            clip_index,
            path,
        )
    });
    loaded.write_batch(ready);
}

/// Place each newly loaded model in the scene, once per slot
pub fn attach_models(
    mut commands: Commands,
    mut loaded: MessageReader<ModelLoaded>,
    mut registry: ResMut<ModelRegistry>,
    config: Res<SceneConfig>,
    rotation: Res<ScrollRotation>,
) {
    for event in loaded.read() {
        if registry.is_attached(event.slot) {
            tracing::debug!(slot = event.slot, "Model already attached, ignoring");
            continue;
        }
        let Some(model) = config.models.get(event.slot) else {
            tracing::warn!(slot = event.slot, "Loaded model has no configuration");
            continue;
        };

        let entity = spawn_model(&mut commands, event, model, &config, &rotation);
        registry.attached.insert(event.slot, entity);
    }
}

fn spawn_model(
    commands: &mut Commands,
    event: &ModelLoaded,
    model: &ModelConfig,
    config: &SceneConfig,
    rotation: &ScrollRotation,
) -> Entity {
    let position = Vec3::from_array(model.position);
    let mut transform = Transform::from_translation(position).with_scale(Vec3::splat(model.scale));
    if model.scroll_rotation {
        transform.rotation = rotation.rotation();
    }

    let mut entity = commands.spawn((
        Name::new(model.path.clone()),
        SceneRoot(event.scene.clone()),
        transform,
        ModelSlot(event.slot),
    ));
    if model.scroll_rotation {
        entity.insert(ScrollRotated);
    }
    if model.hover {
        entity.insert(HoverBob::new(config.hover.speed, config.hover.height, position.y));
    }
    match &event.clip {
        Some(clip) => {
            entity
                .insert(PendingClip { clip: clip.clone() })
                .observe(attach_animation_driver);
        }
        None => tracing::info!("Model {} has no animation clip", model.path),
    }

    tracing::info!("Spawning model {} in slot {}", model.path, event.slot);
    entity.id()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rotation::RotationMode;
    use bevy::asset::AssetLoadError;
    use bevy::platform::collections::HashMap;
    use std::sync::Arc;

    fn attach_app(config: SceneConfig) -> App {
        let mut app = App::new();
        app.add_message::<ModelLoaded>()
            .insert_resource(config)
            .insert_resource(ScrollRotation::new(RotationMode::Accumulate, 0.0001))
            .init_resource::<ModelRegistry>()
            .add_systems(Update, attach_models);
        app
    }

    fn loaded(slot: usize) -> ModelLoaded {
        ModelLoaded {
            slot,
            scene: Handle::default(),
            clip: None,
        }
    }

    fn slots(app: &mut App) -> Vec<usize> {
        let mut query = app.world_mut().query::<&ModelSlot>();
        let mut slots: Vec<usize> = query.iter(app.world()).map(|s| s.0).collect();
        slots.sort();
        slots
    }

    #[test]
    fn test_model_attached_exactly_once() {
        let mut app = attach_app(SceneConfig::default());

        app.world_mut().write_message(loaded(0));
        app.world_mut().write_message(loaded(0));
        app.update();
        app.world_mut().write_message(loaded(0));
        app.update();
        app.update();

        assert_eq!(slots(&mut app), vec![0]);
        assert!(app.world().resource::<ModelRegistry>().is_attached(0));
    }

    #[test]
    fn test_model_placed_from_config() {
        let mut config = SceneConfig::default();
        config.models[0].position = [0.5, 0.25, -1.0];
        config.models.push(ModelConfig {
            hover: false,
            scroll_rotation: false,
            ..ModelConfig::new("flower.glb")
        });
        let mut app = attach_app(config);
        app.world_mut()
            .resource_mut::<ScrollRotation>()
            .on_scroll(1000.0);

        app.world_mut().write_message(loaded(1));
        app.world_mut().write_message(loaded(0));
        app.update();

        assert_eq!(slots(&mut app), vec![0, 1]);

        let registry = app.world().resource::<ModelRegistry>();
        let bee = registry.attached[&0];
        let flower = registry.attached[&1];

        let world = app.world();
        let bee_transform = world.get::<Transform>(bee).unwrap();
        assert_eq!(bee_transform.translation, Vec3::new(0.5, 0.25, -1.0));
        assert_eq!(bee_transform.scale, Vec3::splat(0.1));
        assert!(bee_transform
            .rotation
            .abs_diff_eq(Quat::from_euler(EulerRot::XYZ, 0.1, 0.1, 0.1), 1e-6));
        assert!(world.get::<ScrollRotated>(bee).is_some());
        assert!(world.get::<HoverBob>(bee).is_some());

        let flower_transform = world.get::<Transform>(flower).unwrap();
        assert_eq!(flower_transform.rotation, Quat::IDENTITY);
        assert!(world.get::<ScrollRotated>(flower).is_none());
        assert!(world.get::<HoverBob>(flower).is_none());
    }

    #[test]
    fn test_unconfigured_slot_is_ignored() {
        let mut app = attach_app(SceneConfig::default());
        app.world_mut().write_message(loaded(7));
        app.update();

        assert!(slots(&mut app).is_empty());
        assert!(!app.world().resource::<ModelRegistry>().is_attached(7));
    }

    #[test]
    fn test_clip_waits_for_scene() {
        let mut app = attach_app(SceneConfig::default());
        app.world_mut().write_message(ModelLoaded {
            slot: 0,
            scene: Handle::default(),
            clip: Some(Handle::default()),
        });
        app.update();

        let bee = app.world().resource::<ModelRegistry>().attached[&0];
        assert!(app.world().get::<PendingClip>(bee).is_some());
    }
    fn gltf_with(scenes: Vec<Handle<Scene>>, animations: Vec<Handle<AnimationClip>>) -> Gltf {
        Gltf {
            scenes,
            named_scenes: HashMap::default(),
            meshes: Vec::new(),
            named_meshes: HashMap::default(),
            materials: Vec::new(),
            named_materials: HashMap::default(),
            nodes: Vec::new(),
            named_nodes: HashMap::default(),
            skins: Vec::new(),
            named_skins: HashMap::default(),
            default_scene: None,
            animations,
            named_animations: HashMap::default(),
            source: None,
        }
    }

    fn pending(slot: usize) -> PendingModel {
        PendingModel {
            slot,
            handle: Handle::default(),
        }
    }

    #[test]
    fn test_failed_load_is_dropped() {
        let error = AssetLoadError::MissingAssetLoader {
            loader_name: None,
            asset_type_id: None,
            extension: Some("glb".to_string()),
            asset_path: Some("mtb.glb".to_string()),
        };
        let outcome = resolve_load(
            &pending(0),
            Some(LoadState::Failed(Arc::new(error))),
            None,
            0,
            "mtb.glb",
        );
        assert!(matches!(outcome, LoadOutcome::Dropped));
    }

    #[test]
    fn test_unfinished_load_waits() {
        for state in [None, Some(LoadState::NotLoaded), Some(LoadState::Loading)] {
            let outcome = resolve_load(&pending(0), state, None, 0, "mtb.glb");
            assert!(matches!(outcome, LoadOutcome::Waiting));
        }
        // Loaded but not yet in the asset store
        let outcome = resolve_load(&pending(0), Some(LoadState::Loaded), None, 0, "mtb.glb");
        assert!(matches!(outcome, LoadOutcome::Waiting));
    }

    #[test]
    fn test_loaded_model_picks_scene_and_clip() {
        let mut scenes = Assets::<Scene>::default();
        let mut clips = Assets::<AnimationClip>::default();
        let scene = scenes.add(Scene::new(World::new()));
        let fly = clips.add(AnimationClip::default());
        let land = clips.add(AnimationClip::default());
        let gltf = gltf_with(vec![scene.clone()], vec![fly, land.clone()]);

        let outcome = resolve_load(&pending(1), Some(LoadState::Loaded), Some(&gltf), 1, "bee.glb");
        let LoadOutcome::Ready(loaded) = outcome else {
            panic!("expected a ready model, got {outcome:?}");
        };
        assert_eq!(loaded.slot, 1);
        assert_eq!(loaded.scene, scene);
        assert_eq!(loaded.clip, Some(land));

        // Clip index past the end: the model still loads, without animation
        let outcome = resolve_load(&pending(1), Some(LoadState::Loaded), Some(&gltf), 5, "bee.glb");
        assert!(matches!(outcome, LoadOutcome::Ready(ModelLoaded { clip: None, .. })));
    }

    #[test]
    fn test_model_without_scene_is_dropped() {
        let gltf = gltf_with(Vec::new(), Vec::new());
        let outcome = resolve_load(&pending(0), Some(LoadState::Loaded), Some(&gltf), 0, "empty.glb");
        assert!(matches!(outcome, LoadOutcome::Dropped));
    }

    #[test]
    fn test_failed_slot_never_attaches() {
        let mut config = SceneConfig::default();
        config.models.push(ModelConfig::new("flower.glb"));
        config.models.push(ModelConfig::new("hive.glb"));
        let mut app = attach_app(config);

        let ready = {
            let mut registry = app.world_mut().resource_mut::<ModelRegistry>();
            registry.pending = vec![pending(0), pending(1), pending(2)];
            registry.settle(|p| match p.slot {
                0 => LoadOutcome::Dropped,
                1 => LoadOutcome::Waiting,
                slot => LoadOutcome::Ready(loaded(slot)),
            })
        };
        assert_eq!(ready.len(), 1);

        for message in ready {
            app.world_mut().write_message(message);
        }
        app.update();

        let registry = app.world().resource::<ModelRegistry>();
        let waiting: Vec<usize> = registry.pending.iter().map(|p| p.slot).collect();
        assert_eq!(waiting, vec![1]);
        assert!(!registry.is_attached(0));
        assert!(!registry.is_attached(1));
        assert!(registry.is_attached(2));
        assert_eq!(slots(&mut app), vec![2]);
    }
}
