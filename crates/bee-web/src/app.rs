//! Bevy application setup

use bee_scene::{BeeScenePlugin, SceneConfig};
use bevy::prelude::*;
use bevy::winit::WinitSettings;

use crate::page::{self, PageScrollPlugin};

/// Build the page configuration: defaults, then the URL overrides that
/// keep it valid
pub fn page_config() -> SceneConfig {
    let mut config = SceneConfig::default();
    page::apply_query_overrides(&mut config);
    config
}

/// Run the Bevy application
pub fn run() {
    let config = page_config();

    // The container must exist before startup; without it there is nothing
    // to render into
    let canvas = match page::prepare_surface(&config.surface) {
        Ok(selector) => selector,
        Err(e) => {
            tracing::error!("Cannot attach renderer: {}", e);
            return;
        }
    };

    let clear_color = if config.surface.transparent {
        Color::NONE
    } else {
        Color::BLACK
    };

    App::new()
        .insert_resource(ClearColor(clear_color))
        // Continuous frames: the hover and the clip advance every display frame
        .insert_resource(WinitSettings::game())
        .add_plugins(DefaultPlugins
            .set(WindowPlugin {
                primary_window: Some(Window {
                    title: "Bee".to_string(),
                    canvas: Some(canvas),
                    fit_canvas_to_parent: true,
                    // Let the page scroll underneath the canvas
                    prevent_default_event_handling: false,
                    transparent: config.surface.transparent,
                    ..default()
                }),
                ..default()
            })
            .set(AssetPlugin {
                // Models are served next to the page (e.g. /mtb.glb)
                file_path: "".to_string(),
                // Don't look for .meta files - static hosting doesn't have them
                meta_check: bevy::asset::AssetMetaCheck::Never,
                ..default()
            })
        )
        .add_plugins(BeeScenePlugin::new(config))
        .add_plugins(PageScrollPlugin)
        .run();
}
