//! Daemon module - main event loop orchestration
//!
//! Coordinates the global key listener, the typewriter state machine, cue
//! scheduling and the analytics refresh. One event is processed to
//! completion before the next, so all machine state mutation is serialized
//! here; only scheduled cue timers run concurrently.

use crate::analytics::{format_window, AnalyticsSnapshot, KeyAnalytics};
use crate::config::Config;
use crate::cue::RandomSelector;
use crate::error::Result;
use crate::keys::{self, classify::classify, KeyPhase};
use crate::scheduler::CueScheduler;
use crate::sound::{self, bank::installed_models, SoundBank};
use crate::typewriter::{SimulationOptions, Typewriter};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::signal::unix::{signal, SignalKind};

/// Write analytics rows for external integrations (e.g., Waybar)
fn write_stats_file(path: &PathBuf, snapshots: &[AnalyticsSnapshot]) {
    // Ensure parent directory exists
    if let Some(parent) = path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            tracing::warn!("Failed to create stats file directory: {}", e);
            return;
        }
    }

    let mut content = String::new();
    for snapshot in snapshots {
        content.push_str(&format!(
            "Past {}: {} key presses ({:.2} per second)\n",
            format_window(snapshot.window),
            snapshot.total_presses,
            snapshot.average_per_second,
        ));
    }

    if let Err(e) = std::fs::write(path, content) {
        tracing::warn!("Failed to write stats file: {}", e);
    }
}

/// Remove stats file on shutdown
fn cleanup_stats_file(path: &PathBuf) {
    if path.exists() {
        if let Err(e) = std::fs::remove_file(path) {
            tracing::warn!("Failed to remove stats file: {}", e);
        }
    }
}

/// One activated typewriter: loaded soundset, player, scheduler, machine.
/// Swapped wholesale on model switch.
struct ActiveModel {
    machine: Typewriter,
    scheduler: CueScheduler,
    model: String,
}

impl ActiveModel {
    fn load(
        model: &str,
        soundsets_dir: &Path,
        volume: f32,
        options: Arc<SimulationOptions>,
    ) -> Result<Self> {
        let bank = Arc::new(SoundBank::load_or_builtin(model, soundsets_dir));
        let model = bank.model().to_string();

        let player = sound::create_player(Arc::clone(&bank), volume)?;
        let scheduler = CueScheduler::new(Arc::from(player));
        let mut machine = Typewriter::new(options, bank, Box::new(RandomSelector));

        // Lid opens as the model comes alive
        let cues = machine.activate();
        scheduler.dispatch(cues);
        tracing::info!("Typewriter ready: {}", model);

        Ok(Self {
            machine,
            scheduler,
            model,
        })
    }

    /// Lid closes, then every pending scheduled cue is cancelled so nothing
    /// fires against a model that is gone.
    fn teardown(mut self) {
        let cues = self.machine.deactivate();
        self.scheduler.dispatch(cues);
        self.scheduler.shutdown();
    }
}

/// Main daemon that orchestrates all components
pub struct Daemon {
    config: Config,
    stats_file_path: Option<PathBuf>,
}

impl Daemon {
    /// Create a new daemon with the given configuration
    pub fn new(config: Config) -> Self {
        let stats_file_path = config.resolve_stats_file();
        Self {
            config,
            stats_file_path,
        }
    }

    /// Run the daemon main loop
    pub async fn run(&mut self) -> Result<()> {
        tracing::info!("Starting typeclack daemon");

        // Set up signal handlers for external control
        let mut sigusr1 = signal(SignalKind::user_defined1()).map_err(|e| {
            crate::error::TypeclackError::Config(format!("Failed to set up SIGUSR1 handler: {}", e))
        })?;
        let mut sigusr2 = signal(SignalKind::user_defined2()).map_err(|e| {
            crate::error::TypeclackError::Config(format!("Failed to set up SIGUSR2 handler: {}", e))
        })?;
        let mut sigterm = signal(SignalKind::terminate()).map_err(|e| {
            crate::error::TypeclackError::Config(format!("Failed to set up SIGTERM handler: {}", e))
        })?;

        // Ensure required directories exist
        self.config.ensure_directories().map_err(|e| {
            crate::error::TypeclackError::Config(format!("Failed to create directories: {}", e))
        })?;

        let soundsets_dir = self.config.resolve_soundsets_dir();
        let volume = self.config.sound.volume.clamp(0.0, 1.0);

        // Simulation toggles, shared with the signal handlers below
        let options = Arc::new(SimulationOptions::new(
            self.config.typewriter.margin_width,
            self.config.typewriter.paper_return,
            self.config.typewriter.paper_feed,
            self.config.typewriter.advance_on_space,
        ));

        // Initialize key listener (if enabled)
        let mut key_listener = if self.config.listener.enabled {
            Some(keys::create_listener()?)
        } else {
            tracing::info!("Key listener disabled, daemon will only serve signals");
            None
        };

        let mut key_rx = match &mut key_listener {
            Some(listener) => Some(listener.start().await?),
            None => None,
        };

        // Activate the configured model
        let mut active = ActiveModel::load(
            &self.config.typewriter.model,
            &soundsets_dir,
            volume,
            Arc::clone(&options),
        )?;

        // Analytics, refreshed on a fixed cadence independent of typing
        let analytics = Arc::new(KeyAnalytics::new(self.config.analytics_windows()));
        let refresh_interval =
            Duration::from_millis(self.config.analytics.refresh_interval_ms.max(1));
        let mut refresh_tick = tokio::time::interval(refresh_interval);
        refresh_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        if let Some(ref path) = self.stats_file_path {
            tracing::info!("Stats file: {:?}", path);
        }

        tracing::info!(
            "Margin at column {}, paper return {}, paper feed {}",
            options.margin_width(),
            if options.paper_return() { "on" } else { "off" },
            if options.paper_feed() { "on" } else { "off" },
        );

        // Main event loop
        loop {
            tokio::select! {
                // Handle key transitions (only if the listener is enabled)
                Some(transition) = async {
                    match &mut key_rx {
                        Some(rx) => rx.recv().await,
                        None => std::future::pending().await,
                    }
                } => {
                    if self.config.analytics.enabled && transition.phase == KeyPhase::Down {
                        analytics.record();
                    }

                    let action = classify(transition.identity, transition.phase);
                    let cues = active.machine.handle(action);
                    if !cues.is_empty() {
                        active.scheduler.dispatch(cues);
                    }
                }

                // Periodic analytics refresh
                _ = refresh_tick.tick(), if self.config.analytics.enabled => {
                    let snapshots = analytics.refresh();
                    if let Some(ref path) = self.stats_file_path {
                        write_stats_file(path, &snapshots);
                    }
                }

                // Handle SIGUSR1 - cycle to the next installed model
                _ = sigusr1.recv() => {
                    let models = installed_models(&soundsets_dir);
                    let current = models.iter().position(|m| *m == active.model).unwrap_or(0);
                    let next = models[(current + 1) % models.len()].clone();
                    tracing::info!("Switching model: {} -> {}", active.model, next);

                    active.teardown();
                    active = ActiveModel::load(
                        &next,
                        &soundsets_dir,
                        volume,
                        Arc::clone(&options),
                    )?;
                }

                // Handle SIGUSR2 - toggle paper simulation
                _ = sigusr2.recv() => {
                    let enabled = options.toggle_paper_simulation();
                    tracing::info!(
                        "Paper simulation {}",
                        if enabled { "enabled" } else { "disabled" }
                    );
                }

                // Handle graceful shutdown (SIGINT from Ctrl+C)
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Received SIGINT, shutting down...");
                    break;
                }

                // Handle graceful shutdown (SIGTERM from systemctl stop)
                _ = sigterm.recv() => {
                    tracing::info!("Received SIGTERM, shutting down...");
                    break;
                }
            }
        }

        // Cleanup
        active.teardown();

        if let Some(mut listener) = key_listener {
            listener.stop().await?;
        }

        // Remove stats file on shutdown
        if let Some(ref path) = self.stats_file_path {
            cleanup_stats_file(path);
        }

        tracing::info!("Daemon stopped");

        Ok(())
    }
}
