//! Sound playback module
//!
//! Loads per-model soundsets (directories of WAV variants, one directory
//! per sound category) and plays them through rodio. A synthesized builtin
//! soundset keeps the daemon audible when no soundsets are installed.

pub mod bank;
pub mod builtin;
pub mod rodio_player;

pub use bank::{SoundAsset, SoundBank, BUILTIN_MODEL};

use crate::cue::SoundCategory;
use crate::error::SoundError;
use std::sync::Arc;
use std::time::Duration;

/// Handle returned when a sound starts playing.
///
/// The duration is measured from the chosen asset, not assumed: variants of
/// a category differ in length, and chained cues are timed off the variant
/// that actually played.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Playback {
    pub duration: Duration,
}

/// Read-only view of which categories a soundset can play.
///
/// The state machine consults this when picking among variant categories
/// (line returns) so that empty categories are skipped, never selected.
pub trait SoundInventory: Send + Sync {
    fn has(&self, category: SoundCategory) -> bool;
}

/// Trait for sound player implementations
pub trait SoundPlayer: Send + Sync {
    /// Start playing one randomly chosen variant of the category.
    ///
    /// Returns None when the active model has no variants for the category;
    /// playing nothing is the expected degraded behavior, not an error.
    fn play(&self, category: SoundCategory) -> Option<Playback>;

    /// Stop any playing sound of an exclusive category.
    fn stop(&self, category: SoundCategory);
}

/// Factory function to create the rodio-backed player for a loaded bank
pub fn create_player(
    bank: Arc<SoundBank>,
    volume: f32,
) -> Result<Box<dyn SoundPlayer>, SoundError> {
    Ok(Box::new(rodio_player::RodioPlayer::new(bank, volume)?))
}
