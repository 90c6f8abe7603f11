//! Global key event source
//!
//! On Linux, key transitions are read at the kernel level via evdev, which
//! works on every Wayland compositor and on X11 because it bypasses the
//! display server entirely.
//!
//! Linux: Requires the user to be in the 'input' group.

#[cfg(target_os = "linux")]
pub mod evdev_listener;

pub mod classify;

use crate::error::ListenerError;
use tokio::sync::mpsc;

/// Which physical key a transition came from.
///
/// Identities are deliberately coarse: the sound engine only distinguishes
/// the keys it plays distinct sounds for, everything else collapses into
/// the generic buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyIdentity {
    Shift,
    CapsLock,
    Tab,
    Return,
    KeypadEnter,
    Delete,
    ForwardDelete,
    Escape,
    Space,
    KeypadClear,
    Home,
    End,
    PageUp,
    PageDown,
    Letter,
    Number,
    Symbol,
    Other,
}

/// Which edge of a key transition was observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyPhase {
    Down,
    Up,
    /// A modifier latch changed (shift pressed/released, caps toggled).
    ModifierChanged,
    /// A system-level key (media/volume controls).
    SystemDefined,
}

impl KeyPhase {
    /// Every phase, for exhaustive classification tests.
    pub const ALL: [KeyPhase; 4] = [
        KeyPhase::Down,
        KeyPhase::Up,
        KeyPhase::ModifierChanged,
        KeyPhase::SystemDefined,
    ];
}

/// One raw key transition as delivered by the listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyTransition {
    pub identity: KeyIdentity,
    pub phase: KeyPhase,
}

/// Trait for global key listener implementations
#[async_trait::async_trait]
pub trait KeyEventSource: Send + Sync {
    /// Start listening for key transitions
    /// Returns a channel receiver for events
    async fn start(&mut self) -> Result<mpsc::Receiver<KeyTransition>, ListenerError>;

    /// Stop listening and clean up
    async fn stop(&mut self) -> Result<(), ListenerError>;
}

/// Factory function to create the platform key listener
///
/// On Linux, uses evdev for kernel-level key event detection.
#[cfg(target_os = "linux")]
pub fn create_listener() -> Result<Box<dyn KeyEventSource>, ListenerError> {
    Ok(Box::new(evdev_listener::EvdevListener::new()?))
}

/// Factory function to create the platform key listener
///
/// Only the Linux evdev listener is implemented.
#[cfg(not(target_os = "linux"))]
pub fn create_listener() -> Result<Box<dyn KeyEventSource>, ListenerError> {
    Err(ListenerError::NotSupported(
        "Global key listening is only supported on Linux (evdev).".to_string(),
    ))
}
