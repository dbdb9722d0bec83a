//! Scroll input bridge
//!
//! Platform callbacks (the page `scroll` listener in the browser, the mouse
//! wheel on desktop) only push absolute page offsets into [`PendingScroll`].
//! Once per frame [`drain_scroll_samples`] turns the queue into
//! [`ScrollSample`] messages for the rotation step.

use bevy::input::mouse::{MouseScrollUnit, MouseWheel};
use bevy::prelude::*;
use std::sync::{Arc, Mutex};

use crate::config::SceneConfig;

/// Absolute vertical scroll offset of the page, in pixels
#[derive(Message, Debug, Clone, Copy, PartialEq)]
pub struct ScrollSample {
    pub offset: f32,
}

/// Shared queue between platform scroll callbacks and Bevy
#[derive(Resource, Default, Clone)]
pub struct PendingScroll(pub Arc<Mutex<Vec<f32>>>);

impl PendingScroll {
    /// Queue one offset; safe to call from any callback
    pub fn push(&self, offset: f32) {
        if let Ok(mut queue) = self.0.lock() {
            queue.push(offset);
        }
    }

    /// Take everything queued since the last call
    pub fn take(&self) -> Vec<f32> {
        match self.0.lock() {
            Ok(mut queue) => std::mem::take(&mut *queue),
            Err(_) => Vec::new(),
        }
    }
}

/// Emit this frame's scroll samples
///
/// With `scroll.coalesce` only the most recent offset is forwarded, so a
/// burst of scroll events costs one rotation update per frame.
pub fn drain_scroll_samples(
    pending: Res<PendingScroll>,
    config: Res<SceneConfig>,
    mut samples: MessageWriter<ScrollSample>,
) {
    let queued = pending.take();
    if queued.is_empty() {
        return;
    }

    if config.scroll.coalesce {
        if let Some(&offset) = queued.last() {
            samples.write(ScrollSample { offset });
        }
    } else {
        for offset in queued {
            samples.write(ScrollSample { offset });
        }
    }
}

/// Virtual page offset driven by the mouse wheel (desktop has no page)
#[derive(Resource, Debug, Clone)]
pub struct VirtualPage {
    offset: f32,
    pixels_per_line: f32,
}

impl VirtualPage {
    pub fn new(pixels_per_line: f32) -> Self {
        Self {
            offset: 0.0,
            pixels_per_line,
        }
    }

    pub fn offset(&self) -> f32 {
        self.offset
    }

    /// Move the page by one wheel event; wheel up scrolls toward the top
    pub fn apply_wheel(&mut self, unit: MouseScrollUnit, y: f32) -> f32 {
        let pixels = match unit {
            MouseScrollUnit::Line => y * self.pixels_per_line,
            MouseScrollUnit::Pixel => y,
        };
        self.offset = (self.offset - pixels).max(0.0);
        self.offset
    }
}

/// Feeds mouse wheel motion into [`PendingScroll`] as page offsets
///
/// Not used in the browser, where the canvas would double-count the page's
/// own scroll events.
pub struct WheelScrollPlugin;

impl Plugin for WheelScrollPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(Startup, init_virtual_page)
            .add_systems(
                Update,
                wheel_to_page_offset.before(drain_scroll_samples),
            );
    }
}

fn init_virtual_page(mut commands: Commands, config: Res<SceneConfig>) {
    commands.insert_resource(VirtualPage::new(config.scroll.pixels_per_line));
}

fn wheel_to_page_offset(
    mut wheel: MessageReader<MouseWheel>,
    page: Option<ResMut<VirtualPage>>,
    pending: Res<PendingScroll>,
) {
    let Some(mut page) = page else {
        wheel.clear();
        return;
    };
    for event in wheel.read() {
        let offset = page.apply_wheel(event.unit, event.y);
        pending.push(offset);
    }
}
