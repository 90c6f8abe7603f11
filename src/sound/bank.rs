//! Soundset loading
//!
//! A soundset is a directory named after a typewriter model, containing one
//! subdirectory per sound category, each holding any number of WAV files.
//! Every file is a variant; a random variant plays per firing, which is what
//! keeps a mechanical soundset from feeling like a sampler loop.

use crate::cue::SoundCategory;
use crate::error::SoundError;
use crate::sound::SoundInventory;
use rand::seq::SliceRandom;
use std::collections::HashMap;
use std::io::Cursor;
use std::path::Path;
use std::time::Duration;

/// Name of the synthesized soundset that needs no files on disk.
pub const BUILTIN_MODEL: &str = "builtin";

/// One decoded-enough sound: raw WAV bytes plus the probed duration.
#[derive(Debug, Clone)]
pub struct SoundAsset {
    pub data: Vec<u8>,
    pub duration: Duration,
}

impl SoundAsset {
    /// Wrap WAV bytes, probing their playback duration from the header.
    pub fn from_wav(data: Vec<u8>, origin: &str) -> Result<Self, SoundError> {
        let reader = hound::WavReader::new(Cursor::new(&data[..])).map_err(|e| {
            SoundError::BadAsset {
                path: origin.to_string(),
                reason: e.to_string(),
            }
        })?;
        let spec = reader.spec();
        let frames = reader.duration();
        let duration = Duration::from_secs_f64(frames as f64 / spec.sample_rate as f64);
        Ok(Self { data, duration })
    }
}

/// All loaded sounds for one typewriter model.
pub struct SoundBank {
    model: String,
    sets: HashMap<SoundCategory, Vec<SoundAsset>>,
}

impl SoundBank {
    pub(crate) fn from_sets(
        model: impl Into<String>,
        sets: HashMap<SoundCategory, Vec<SoundAsset>>,
    ) -> Self {
        Self {
            model: model.into(),
            sets,
        }
    }

    /// Load a model's soundset from disk, or synthesize the builtin one.
    pub fn load(model: &str, soundsets_dir: &Path) -> Result<Self, SoundError> {
        if model == BUILTIN_MODEL {
            return Ok(crate::sound::builtin::builtin_bank());
        }

        let model_dir = soundsets_dir.join(model);
        if !model_dir.is_dir() {
            return Err(SoundError::UnknownModel(model.to_string()));
        }

        let mut sets = HashMap::new();
        for category in SoundCategory::ALL {
            let dir = model_dir.join(category.dir_name());
            let variants = load_category_dir(&dir);
            if !variants.is_empty() {
                sets.insert(category, variants);
            }
        }

        let total: usize = sets.values().map(Vec::len).sum();
        tracing::info!(
            "Loaded soundset '{}': {} sounds across {} categories",
            model,
            total,
            sets.len()
        );

        Ok(Self::from_sets(model, sets))
    }

    /// Like [`SoundBank::load`], but falling back to the builtin soundset
    /// with a warning instead of failing. The daemon must degrade to less
    /// sound, never refuse to start.
    pub fn load_or_builtin(model: &str, soundsets_dir: &Path) -> Self {
        match Self::load(model, soundsets_dir) {
            Ok(bank) => bank,
            Err(e) => {
                tracing::warn!("{}; using the builtin soundset", e);
                crate::sound::builtin::builtin_bank()
            }
        }
    }

    /// The model this bank was loaded for.
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Pick a random variant of the category, if any exist.
    pub fn pick(&self, category: SoundCategory) -> Option<&SoundAsset> {
        self.sets
            .get(&category)
            .and_then(|variants| variants.choose(&mut rand::thread_rng()))
    }

    /// Number of loaded variants for the category.
    pub fn variant_count(&self, category: SoundCategory) -> usize {
        self.sets.get(&category).map_or(0, Vec::len)
    }
}

impl SoundInventory for SoundBank {
    fn has(&self, category: SoundCategory) -> bool {
        self.variant_count(category) > 0
    }
}

/// Read every parseable WAV in one category directory. Unreadable files are
/// skipped with a warning; a missing directory is an empty category.
fn load_category_dir(dir: &Path) -> Vec<SoundAsset> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return Vec::new(),
    };

    let mut variants = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        let is_wav = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.eq_ignore_ascii_case("wav"))
            .unwrap_or(false);
        if !is_wav {
            continue;
        }

        match std::fs::read(&path) {
            Ok(data) => match SoundAsset::from_wav(data, &path.display().to_string()) {
                Ok(asset) => variants.push(asset),
                Err(e) => tracing::warn!("Skipping sound: {}", e),
            },
            Err(e) => tracing::warn!("Skipping {}: {}", path.display(), e),
        }
    }
    variants
}

/// Models available to the daemon: the builtin soundset plus every
/// directory under the soundsets dir, sorted by name.
pub fn installed_models(soundsets_dir: &Path) -> Vec<String> {
    let mut models = vec![BUILTIN_MODEL.to_string()];

    if let Ok(entries) = std::fs::read_dir(soundsets_dir) {
        for entry in entries.flatten() {
            if entry.path().is_dir() {
                if let Some(name) = entry.file_name().to_str() {
                    models.push(name.to_string());
                }
            }
        }
    }

    models[1..].sort();
    models
}
