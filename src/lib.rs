//! typeclack: mechanical typewriter sounds for every keystroke
//!
//! This library provides the core functionality for:
//! - Observing key transitions via evdev (kernel-level, works on all compositors)
//! - Classifying transitions into semantic typewriter actions
//! - Driving a carriage/margin/paper state machine that emits sound cues
//! - Scheduling immediate, delayed and duration-chained cue playback (rodio)
//! - Aggregating key presses into rolling analytics windows
//!
//! # Architecture
//!
//! ```text
//!   ┌──────────────┐   KeyTransition   ┌──────────────┐   KeyAction
//!   │ Key listener │ ────────────────▶ │  classify()  │ ──────────┐
//!   │   (evdev)    │                   └──────────────┘           ▼
//!   └──────────────┘                                      ┌──────────────┐
//!          │ key-down                                     │  Typewriter  │
//!          ▼                                              │ (line state) │
//!   ┌──────────────┐    snapshots                         └──────────────┘
//!   │ KeyAnalytics │ ──────────────▶ stats file /                │ SoundCue*
//!   │ (windows)    │                 subscribers                 ▼
//!   └──────────────┘                                     ┌──────────────┐
//!                                                        │ CueScheduler │
//!                                                        │ (timers)     │
//!                                                        └──────────────┘
//!                                                                │ play/stop
//!                                                                ▼
//!                                                        ┌──────────────┐
//!                                                        │ SoundPlayer  │
//!                                                        │ (rodio bank) │
//!                                                        └──────────────┘
//! ```

pub mod analytics;
pub mod cli;
pub mod config;
pub mod cue;
pub mod daemon;
pub mod error;
pub mod keys;
pub mod scheduler;
pub mod sound;
pub mod typewriter;

pub use cli::{Cli, Commands};
pub use config::Config;
pub use daemon::Daemon;
pub use error::{Result, TypeclackError};
