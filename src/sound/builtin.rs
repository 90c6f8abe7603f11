//! Builtin synthesized soundset
//!
//! Generates a complete typewriter soundset programmatically so the daemon
//! makes noise out of the box, with no binary assets shipped or installed.
//! Real recorded soundsets dropped into the soundsets directory replace it.

use crate::cue::SoundCategory;
use crate::sound::bank::{SoundAsset, SoundBank, BUILTIN_MODEL};
use std::collections::HashMap;
use std::time::Duration;

const SAMPLE_RATE: u32 = 44100;

/// Build the complete builtin bank: at least one variant per category.
pub fn builtin_bank() -> SoundBank {
    let mut sets: HashMap<SoundCategory, Vec<SoundAsset>> = HashMap::new();

    let mut put = |category: SoundCategory, variants: Vec<SoundAsset>| {
        sets.insert(category, variants);
    };

    // Typebar strikes: short bright clicks, slightly varied so fast typing
    // doesn't sound like a sampler loop.
    put(
        SoundCategory::KeyDown,
        vec![strike(22, 1.0), strike(20, 0.9), strike(24, 1.1)],
    );
    put(SoundCategory::KeyUp, vec![strike(12, 0.45), strike(14, 0.5)]);

    // Space bar: a duller, lower thock.
    put(
        SoundCategory::SpaceDown,
        vec![thock(30, 150.0), thock(28, 135.0)],
    );
    put(SoundCategory::SpaceUp, vec![strike(12, 0.35)]);

    // Shift mechanism: carriage lifting and dropping.
    put(SoundCategory::ShiftDown, vec![thock(36, 110.0)]);
    put(SoundCategory::ShiftUp, vec![thock(30, 95.0)]);
    put(SoundCategory::ShiftLock, vec![ratchet(2, 45, 0.8)]);
    put(SoundCategory::ShiftRelease, vec![strike(26, 0.7)]);

    put(SoundCategory::BackspaceDown, vec![ratchet(2, 30, 0.9)]);
    put(SoundCategory::BackspaceUp, vec![strike(12, 0.4)]);

    put(SoundCategory::TabDown, vec![ratchet(3, 38, 0.9)]);
    put(SoundCategory::TabUp, vec![strike(12, 0.4)]);

    // Margin bell: a bright decaying ring.
    put(SoundCategory::Bell, vec![bell(1760.0, 650), bell(1680.0, 600)]);

    // Carriage returns: a ratcheting zip, longer per flavor.
    put(SoundCategory::SingleLineReturn, vec![ratchet(8, 26, 0.85)]);
    put(SoundCategory::DoubleLineReturn, vec![ratchet(13, 28, 0.85)]);
    put(SoundCategory::TripleLineReturn, vec![ratchet(18, 30, 0.85)]);

    // Paper handling: longer scraping slides.
    put(SoundCategory::PaperLoad, vec![slide(480)]);
    put(SoundCategory::PaperFeed, vec![ratchet(10, 42, 0.7)]);
    put(SoundCategory::PaperRelease, vec![strike(34, 0.8)]);
    put(SoundCategory::PaperReturn, vec![slide(260)]);

    put(SoundCategory::RibbonSelector, vec![ratchet(2, 70, 0.75)]);
    put(SoundCategory::MarginRelease, vec![bell(940.0, 220)]);

    put(SoundCategory::LidUp, vec![thock(90, 85.0)]);
    put(SoundCategory::LidDown, vec![thock(110, 70.0)]);

    SoundBank::from_sets(BUILTIN_MODEL, sets)
}

/// Wrap synthesized samples into an asset; the duration is exact, no
/// header probing needed for sounds we just computed.
fn asset(samples: Vec<i16>) -> SoundAsset {
    let duration = Duration::from_secs_f64(samples.len() as f64 / SAMPLE_RATE as f64);
    SoundAsset {
        data: encode_wav(&samples, SAMPLE_RATE),
        duration,
    }
}

/// A typebar strike: broadband click with a fast exponential decay.
fn strike(duration_ms: u32, gain: f32) -> SoundAsset {
    let num_samples = samples_for(duration_ms);
    let mut samples = Vec::with_capacity(num_samples);

    for i in 0..num_samples {
        let envelope = (-6.0 * i as f32 / num_samples as f32).exp();
        let noise = if i % 2 == 0 { 1.0 } else { -1.0 };
        samples.push((noise * envelope * gain * 12000.0) as i16);
    }

    asset(samples)
}

/// A dull thump: low sine body under a softened click.
fn thock(duration_ms: u32, body_hz: f32) -> SoundAsset {
    let num_samples = samples_for(duration_ms);
    let mut samples = Vec::with_capacity(num_samples);

    for i in 0..num_samples {
        let t = i as f32 / SAMPLE_RATE as f32;
        let envelope = (-4.0 * i as f32 / num_samples as f32).exp();
        let body = (2.0 * std::f32::consts::PI * body_hz * t).sin();
        let noise = if i % 3 == 0 { 0.4 } else { -0.4 };
        samples.push(((body + noise) * envelope * 9000.0) as i16);
    }

    asset(samples)
}

/// A decaying ring at the given pitch.
fn bell(frequency: f32, duration_ms: u32) -> SoundAsset {
    let num_samples = samples_for(duration_ms);
    let mut samples = Vec::with_capacity(num_samples);

    for i in 0..num_samples {
        let t = i as f32 / SAMPLE_RATE as f32;
        let envelope = (-5.0 * i as f32 / num_samples as f32).exp();
        // A touch of the twelfth gives it a metallic edge
        let tone = (2.0 * std::f32::consts::PI * frequency * t).sin()
            + 0.3 * (2.0 * std::f32::consts::PI * frequency * 3.0 * t).sin();
        samples.push((tone * envelope * 10000.0) as i16);
    }

    asset(samples)
}

/// A run of small clicks: the carriage ratchet.
fn ratchet(clicks: u32, spacing_ms: u32, gain: f32) -> SoundAsset {
    let click_ms = 10;
    let total_ms = clicks * spacing_ms + click_ms;
    let num_samples = samples_for(total_ms);
    let click_samples = samples_for(click_ms);
    let spacing_samples = samples_for(spacing_ms);

    let mut samples = vec![0i16; num_samples];
    for c in 0..clicks as usize {
        let start = c * spacing_samples;
        for i in 0..click_samples {
            let envelope = (-7.0 * i as f32 / click_samples as f32).exp();
            let noise = if i % 2 == 0 { 1.0 } else { -1.0 };
            let idx = start + i;
            if idx < num_samples {
                samples[idx] = (noise * envelope * gain * 10000.0) as i16;
            }
        }
    }

    asset(samples)
}

/// Paper scraping over the platen: shaped noise with a slow envelope.
fn slide(duration_ms: u32) -> SoundAsset {
    let num_samples = samples_for(duration_ms);
    let mut samples = Vec::with_capacity(num_samples);

    let mut level = 0.0f32;
    for i in 0..num_samples {
        let progress = i as f32 / num_samples as f32;
        let envelope = (std::f32::consts::PI * progress).sin();
        // Cheap pseudo-noise with some low-pass smoothing
        let raw = if (i * 7919) % 13 < 6 { 1.0 } else { -1.0 };
        level = level * 0.92 + raw * 0.08;
        samples.push((level * envelope * 11000.0) as i16);
    }

    asset(samples)
}

fn samples_for(duration_ms: u32) -> usize {
    (SAMPLE_RATE * duration_ms / 1000) as usize
}

/// Encode samples as WAV format
pub(crate) fn encode_wav(samples: &[i16], sample_rate: u32) -> Vec<u8> {
    let mut wav = Vec::new();

    // RIFF header
    wav.extend_from_slice(b"RIFF");
    let file_size = (36 + samples.len() * 2) as u32;
    wav.extend_from_slice(&file_size.to_le_bytes());
    wav.extend_from_slice(b"WAVE");

    // fmt chunk
    wav.extend_from_slice(b"fmt ");
    wav.extend_from_slice(&16u32.to_le_bytes()); // chunk size
    wav.extend_from_slice(&1u16.to_le_bytes()); // PCM format
    wav.extend_from_slice(&1u16.to_le_bytes()); // mono
    wav.extend_from_slice(&sample_rate.to_le_bytes());
    wav.extend_from_slice(&(sample_rate * 2).to_le_bytes()); // byte rate
    wav.extend_from_slice(&2u16.to_le_bytes()); // block align
    wav.extend_from_slice(&16u16.to_le_bytes()); // bits per sample

    // data chunk
    wav.extend_from_slice(b"data");
    wav.extend_from_slice(&((samples.len() * 2) as u32).to_le_bytes());
    for sample in samples {
        wav.extend_from_slice(&sample.to_le_bytes());
    }

    wav
}
