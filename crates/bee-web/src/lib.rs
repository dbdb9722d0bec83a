//! Bee Web - the scene embedded in a webpage
//!
//! Binds the renderer to the page's container element and feeds page
//! scroll events into the scene.

mod app;
mod page;

use wasm_bindgen::prelude::*;

/// Entry point for WASM module
#[wasm_bindgen(start)]
pub fn main() {
    // Set panic hook for better error messages
    console_error_panic_hook::set_once();

    // Initialize logging with filtering to reduce wgpu noise
    tracing_wasm::set_as_global_default_with_config(
        tracing_wasm::WASMLayerConfigBuilder::new()
            .set_max_level(tracing::Level::INFO)
            .build()
    );

    // Run the Bevy app
    app::run();
}
