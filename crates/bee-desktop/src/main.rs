//! Bee Desktop - the scene in a native window
//!
//! Mouse wheel motion stands in for page scroll.

use anyhow::{Context, Result};
use bee_scene::{BeeScenePlugin, SceneConfig, WheelScrollPlugin};
use bevy::prelude::*;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "bee")]
#[command(about = "Scroll-driven hovering bee scene")]
#[command(version)]
struct Args {
    /// Path to scene configuration file
    #[arg(short, long, default_value = "bee.toml")]
    config: PathBuf,

    /// Scroll rotation mode (accumulate, incremental)
    #[arg(short, long)]
    mode: Option<String>,

    /// Radians of rotation per pixel of scroll
    #[arg(long)]
    coefficient: Option<f32>,

    /// Directory the model paths are resolved against
    #[arg(short, long, default_value = "assets")]
    assets: PathBuf,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info")]
    log_level: String,

    /// Print the default configuration as TOML and exit
    #[arg(long)]
    print_default_config: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.print_default_config {
        print!("{}", SceneConfig::default().to_toml()?);
        return Ok(());
    }

    // Initialize logging; keep the GPU stack quiet unless asked
    let filter = EnvFilter::try_new(format!(
        "{},wgpu=warn,naga=warn",
        args.log_level.to_lowercase()
    ))
    .unwrap_or_else(|_| EnvFilter::new("info,wgpu=warn,naga=warn"));

    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    info!("Bee v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let mut config = SceneConfig::load_or_default(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;

    // Override from command line if specified
    if let Some(mode) = &args.mode {
        config.apply_override("mode", mode)?;
    }
    if let Some(coefficient) = args.coefficient {
        config.scroll.coefficient = coefficient;
    }
    config.validate()?;

    info!(
        mode = ?config.scroll.mode,
        coefficient = config.scroll.coefficient,
        models = config.models.len(),
        "Configuration loaded"
    );

    run(config, args.assets);
    Ok(())
}

fn run(config: SceneConfig, assets: PathBuf) {
    let clear_color = if config.surface.transparent {
        Color::NONE
    } else {
        Color::BLACK
    };

    App::new()
        .insert_resource(ClearColor(clear_color))
        .add_plugins(DefaultPlugins
            .set(WindowPlugin {
                primary_window: Some(Window {
                    title: "Bee".to_string(),
                    transparent: config.surface.transparent,
                    ..default()
                }),
                ..default()
            })
            .set(AssetPlugin {
                file_path: assets.to_string_lossy().into_owned(),
                ..default()
            })
        )
        .add_plugins(BeeScenePlugin::new(config))
        .add_plugins(WheelScrollPlugin)
        .run();
}
