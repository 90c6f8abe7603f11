//! Error types for typeclack
//!
//! Uses thiserror for ergonomic error definitions with clear messages
//! that guide users toward fixing common issues.

use thiserror::Error;

/// Top-level error type for the typeclack application
#[derive(Error, Debug)]
pub enum TypeclackError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Key listener error: {0}")]
    Listener(#[from] ListenerError),

    #[error("Sound error: {0}")]
    Sound(#[from] SoundError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors related to the global key listener
#[derive(Error, Debug)]
pub enum ListenerError {
    #[error("Cannot open input device '{0}'. Is the user in the 'input' group?\n  Run: sudo usermod -aG input $USER\n  Then log out and back in.")]
    DeviceAccess(String),

    #[error("No keyboard device found in /dev/input/")]
    NoKeyboard,

    #[error("evdev error: {0}")]
    Evdev(String),

    #[error("{0}")]
    NotSupported(String),
}

/// Errors related to soundset loading and playback
#[derive(Error, Debug)]
pub enum SoundError {
    #[error("Failed to open audio output: {0}")]
    Output(String),

    #[error("Soundset not found for model '{0}'. Install it under the soundsets directory or use the builtin model.")]
    UnknownModel(String),

    #[error("Unknown sound category: '{0}'")]
    UnknownCategory(String),

    #[error("Failed to read {path}: {reason}")]
    BadAsset { path: String, reason: String },
}

/// Result type alias using TypeclackError
pub type Result<T> = std::result::Result<T, TypeclackError>;

#[cfg(target_os = "linux")]
impl From<evdev::Error> for ListenerError {
    fn from(e: evdev::Error) -> Self {
        ListenerError::Evdev(e.to_string())
    }
}
