//! typeclack - Mechanical typewriter sounds for every keystroke
//!
//! Run with `typeclack` or `typeclack daemon` to start the daemon.
//! Use `typeclack play <category>` to audition one sound.
//! Use `typeclack models` to list installed soundsets.

use clap::Parser;
use tracing_subscriber::EnvFilter;
use typeclack::cli::{Cli, Commands};
use typeclack::config;
use typeclack::cue::SoundCategory;
use typeclack::daemon::Daemon;
use typeclack::sound::{self, bank::installed_models, SoundBank};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.quiet {
        "error"
    } else {
        match cli.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(format!("typeclack={},warn", log_level))),
        )
        .with_target(false)
        .init();

    // Load configuration
    let mut config = config::load_config(cli.config.as_deref())?;

    // Apply CLI overrides
    if let Some(model) = cli.model {
        config.typewriter.model = model;
    }
    if let Some(volume) = cli.volume {
        config.sound.volume = volume.clamp(0.0, 1.0);
    }
    if let Some(margin) = cli.margin {
        config.typewriter.margin_width = margin;
    }

    match cli.command {
        None | Some(Commands::Daemon) => {
            Daemon::new(config).run().await?;
        }

        Some(Commands::Config) => {
            show_config(&config)?;
        }

        Some(Commands::Models) => {
            let soundsets_dir = config.resolve_soundsets_dir();
            println!("Soundsets directory: {}", soundsets_dir.display());
            for model in installed_models(&soundsets_dir) {
                if model == config.typewriter.model {
                    println!("  {} (configured)", model);
                } else {
                    println!("  {}", model);
                }
            }
        }

        Some(Commands::Play { category, list }) => {
            if list {
                for category in SoundCategory::ALL {
                    println!("{}", category);
                }
                return Ok(());
            }

            let Some(category) = category else {
                anyhow::bail!("Category name required (or use --list)");
            };
            play_one(&config, &category).await?;
        }
    }

    Ok(())
}

fn show_config(config: &typeclack::Config) -> anyhow::Result<()> {
    if let Some(path) = config::Config::default_path() {
        println!("# Config file: {}", path.display());
    }
    println!("# Soundsets:   {}", config.resolve_soundsets_dir().display());
    match config.resolve_stats_file() {
        Some(path) => println!("# Stats file:  {}", path.display()),
        None => println!("# Stats file:  disabled"),
    }
    println!();
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}

/// Play one randomly chosen variant of a category and wait for it to
/// finish. Used to audition soundsets without a key listener.
async fn play_one(config: &typeclack::Config, category: &str) -> anyhow::Result<()> {
    let category: SoundCategory = category.parse().map_err(anyhow::Error::from)?;

    let bank = Arc::new(SoundBank::load_or_builtin(
        &config.typewriter.model,
        &config.resolve_soundsets_dir(),
    ));
    let player = sound::create_player(Arc::clone(&bank), config.sound.volume.clamp(0.0, 1.0))?;

    match player.play(category) {
        Some(playback) => {
            println!(
                "Playing {} from '{}' ({:.2}s)",
                category,
                bank.model(),
                playback.duration.as_secs_f32()
            );
            // Pad a little so the sink drains before the stream drops
            tokio::time::sleep(playback.duration + std::time::Duration::from_millis(200)).await;
        }
        None => {
            println!("Model '{}' has no {} sounds", bank.model(), category);
        }
    }

    Ok(())
}
