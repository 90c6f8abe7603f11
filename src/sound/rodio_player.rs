//! rodio-backed sound player
//!
//! Fire-and-forget sinks for ordinary cues; the exclusive margin-release
//! category keeps its sink around so a new strike can stop the old ring.

use crate::cue::SoundCategory;
use crate::error::SoundError;
use crate::sound::{Playback, SoundBank, SoundPlayer};
use rodio::{Decoder, OutputStream, OutputStreamHandle, Sink, Source};
use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Arc, Mutex};

/// Plays bank assets through the default audio output.
pub struct RodioPlayer {
    _stream: OutputStream,
    stream_handle: OutputStreamHandle,
    bank: Arc<SoundBank>,
    volume: f32,
    /// Live sinks for exclusive categories, so stop() can reach them.
    exclusive: Mutex<HashMap<SoundCategory, Sink>>,
}

impl RodioPlayer {
    /// Open the default audio output for the given bank.
    pub fn new(bank: Arc<SoundBank>, volume: f32) -> Result<Self, SoundError> {
        let (stream, stream_handle) =
            OutputStream::try_default().map_err(|e| SoundError::Output(e.to_string()))?;

        Ok(Self {
            _stream: stream,
            stream_handle,
            bank,
            volume,
            exclusive: Mutex::new(HashMap::new()),
        })
    }
}

impl SoundPlayer for RodioPlayer {
    fn play(&self, category: SoundCategory) -> Option<Playback> {
        let sound = self.bank.pick(category)?;

        let source = match Decoder::new(Cursor::new(sound.data.clone())) {
            Ok(source) => source,
            Err(e) => {
                tracing::warn!("Failed to decode {} sound: {}", category, e);
                return None;
            }
        };

        let sink = match Sink::try_new(&self.stream_handle) {
            Ok(sink) => sink,
            Err(e) => {
                tracing::warn!("Failed to create audio sink: {}", e);
                return None;
            }
        };

        sink.append(source.amplify(self.volume));

        if category.is_exclusive() {
            let mut exclusive = self.exclusive.lock().unwrap();
            // Replacing the entry drops (and thereby silences) any sink the
            // scheduler didn't already stop.
            exclusive.insert(category, sink);
        } else {
            sink.detach(); // Let it play in the background
        }

        Some(Playback {
            duration: sound.duration,
        })
    }

    fn stop(&self, category: SoundCategory) {
        if let Some(sink) = self.exclusive.lock().unwrap().remove(&category) {
            sink.stop();
        }
    }
}
