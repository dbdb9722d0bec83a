//! Page integration - render surface, query overrides and the scroll listener

use bee_scene::config::{SurfaceConfig, OVERRIDE_KEYS};
use bee_scene::{PendingScroll, SceneConfig};
use bevy::prelude::*;
use thiserror::Error;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

#[derive(Error, Debug)]
pub enum PageError {
    #[error("No browser window")]
    NoWindow,
    #[error("Window has no document")]
    NoDocument,
    #[error("Container element #{0} not found")]
    MissingContainer(String),
    #[error("DOM call failed: {0}")]
    Dom(String),
}

impl From<JsValue> for PageError {
    fn from(value: JsValue) -> Self {
        PageError::Dom(format!("{:?}", value))
    }
}

/// Make sure the container holds a canvas for the renderer and return its
/// CSS selector
pub fn prepare_surface(surface: &SurfaceConfig) -> Result<String, PageError> {
    let window = web_sys::window().ok_or(PageError::NoWindow)?;
    let document = window.document().ok_or(PageError::NoDocument)?;

    let container = document
        .get_element_by_id(&surface.container_id)
        .ok_or_else(|| PageError::MissingContainer(surface.container_id.clone()))?;

    let selector = format!("#{}", surface.canvas_id);
    if container.query_selector(&selector)?.is_some() {
        tracing::info!("Reusing canvas {} in #{}", selector, surface.container_id);
        return Ok(selector);
    }

    let canvas = document.create_element("canvas")?;
    canvas.set_id(&surface.canvas_id);
    canvas.set_attribute("style", "width: 100%; height: 100%; display: block;")?;
    let _ = container.append_child(&canvas)?;

    tracing::info!("Attached canvas {} to #{}", selector, surface.container_id);
    Ok(selector)
}

/// Apply `?mode=incremental&coefficient=...` style overrides from the page URL
///
/// Each value is checked against the rest of the configuration; a bad one
/// is logged and skipped while the others still apply.
pub fn apply_query_overrides(config: &mut SceneConfig) {
    let Some(window) = web_sys::window() else {
        return;
    };
    let Ok(search) = window.location().search() else {
        return;
    };
    if search.is_empty() {
        return;
    }
    let Ok(params) = web_sys::UrlSearchParams::new_with_str(&search) else {
        tracing::warn!("Ignoring unparsable query string: {}", search);
        return;
    };

    let found: Vec<(&str, String)> = OVERRIDE_KEYS
        .iter()
        .filter_map(|key| params.get(key).map(|value| (*key, value)))
        .collect();

    let rejected = config.apply_overrides(found.iter().map(|(key, value)| (*key, value.as_str())));
    for (key, value) in &found {
        match rejected.iter().find(|(bad, _)| bad.as_str() == *key) {
            Some((_, e)) => tracing::warn!("Ignoring override {}={}: {}", key, value, e),
            None => tracing::info!("Override from URL: {}={}", key, value),
        }
    }
}

/// Plugin that forwards page `scroll` events into [`PendingScroll`]
pub struct PageScrollPlugin;

impl Plugin for PageScrollPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, install_scroll_listener);
    }
}

fn install_scroll_listener(pending: Res<PendingScroll>) {
    let Some(window) = web_sys::window() else {
        tracing::warn!("No window, scroll rotation disabled");
        return;
    };

    let pending: PendingScroll = (*pending).clone();
    let reader = window.clone();
    let closure = Closure::wrap(Box::new(move |_event: web_sys::Event| {
        // Absolute offset; the rotation step works out any delta itself
        let offset = reader.scroll_y().unwrap_or(0.0) as f32;
        pending.push(offset);
    }) as Box<dyn FnMut(_)>);

    match window.add_event_listener_with_callback("scroll", closure.as_ref().unchecked_ref()) {
        Ok(()) => tracing::info!("Scroll listener installed"),
        Err(e) => tracing::error!("Failed to install scroll listener: {:?}", e),
    }
    // The listener lives as long as the page
    closure.forget();
}
