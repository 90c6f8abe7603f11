//! evdev-based global key listener
//!
//! Uses the Linux evdev interface to observe key transitions at the kernel
//! level. This works on all Wayland compositors because it bypasses the
//! display server. Devices are only read, never grabbed, so keystrokes
//! reach their target application unchanged.
//!
//! The user must be in the 'input' group to access /dev/input/* devices.

use super::{KeyEventSource, KeyIdentity, KeyPhase, KeyTransition};
use crate::error::ListenerError;
use evdev::{Device, InputEventKind, Key};
use std::os::unix::io::AsRawFd;
use std::path::PathBuf;
use tokio::sync::{mpsc, oneshot};

/// evdev-based key listener
pub struct EvdevListener {
    /// Paths to keyboard devices
    device_paths: Vec<PathBuf>,
    /// Signal to stop the listener task
    stop_signal: Option<oneshot::Sender<()>>,
}

impl EvdevListener {
    /// Create a listener over every keyboard found in /dev/input
    pub fn new() -> Result<Self, ListenerError> {
        let device_paths = find_keyboard_devices()?;

        if device_paths.is_empty() {
            return Err(ListenerError::NoKeyboard);
        }

        tracing::debug!(
            "Found {} keyboard device(s): {:?}",
            device_paths.len(),
            device_paths
        );

        Ok(Self {
            device_paths,
            stop_signal: None,
        })
    }
}

#[async_trait::async_trait]
impl KeyEventSource for EvdevListener {
    async fn start(&mut self) -> Result<mpsc::Receiver<KeyTransition>, ListenerError> {
        let (tx, rx) = mpsc::channel(128);
        let (stop_tx, stop_rx) = oneshot::channel();
        self.stop_signal = Some(stop_tx);

        let device_paths = self.device_paths.clone();

        // Spawn the listener task
        tokio::task::spawn_blocking(move || {
            evdev_listener_loop(device_paths, tx, stop_rx);
        });

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<(), ListenerError> {
        if let Some(stop) = self.stop_signal.take() {
            let _ = stop.send(());
        }
        Ok(())
    }
}

/// Main listener loop running in a blocking task
fn evdev_listener_loop(
    device_paths: Vec<PathBuf>,
    tx: mpsc::Sender<KeyTransition>,
    mut stop_rx: oneshot::Receiver<()>,
) {
    // Open all keyboard devices in non-blocking mode
    let mut devices: Vec<Device> = device_paths
        .iter()
        .filter_map(|path| match Device::open(path) {
            Ok(device) => {
                // Set device to non-blocking mode so fetch_events doesn't block
                let fd = device.as_raw_fd();
                unsafe {
                    let flags = libc::fcntl(fd, libc::F_GETFL);
                    if flags != -1 {
                        libc::fcntl(fd, libc::F_SETFL, flags | libc::O_NONBLOCK);
                    }
                }
                tracing::debug!("Opened device (non-blocking): {:?}", path);
                Some(device)
            }
            Err(e) => {
                tracing::warn!("Failed to open {:?}: {}", path, e);
                None
            }
        })
        .collect();

    if devices.is_empty() {
        tracing::error!("No keyboard devices could be opened");
        return;
    }

    tracing::info!("Listening on {} keyboard device(s)", devices.len());

    loop {
        // Check for stop signal (non-blocking)
        match stop_rx.try_recv() {
            Ok(_) | Err(oneshot::error::TryRecvError::Closed) => {
                tracing::debug!("Key listener stopping");
                return;
            }
            Err(oneshot::error::TryRecvError::Empty) => {}
        }

        // Poll each device (all set to non-blocking mode)
        for device in &mut devices {
            // fetch_events returns immediately if no events (non-blocking)
            if let Ok(events) = device.fetch_events() {
                for event in events {
                    if let InputEventKind::Key(key) = event.kind() {
                        if let Some(transition) = map_key(key, event.value()) {
                            if tx.blocking_send(transition).is_err() {
                                return; // Channel closed
                            }
                        }
                    }
                }
            }
        }

        // Small sleep to avoid busy-waiting
        std::thread::sleep(std::time::Duration::from_millis(5));
    }
}

/// Translate one evdev key event into a key transition.
///
/// evdev values: 1 = press, 0 = release, 2 = autorepeat. Autorepeats are
/// delivered as further key-downs so a held key keeps clacking. Shift
/// reports a latch change on both edges; caps lock only on the press that
/// flips the lock. Media keys surface as system-defined transitions and
/// never as ordinary key-downs.
fn map_key(key: Key, value: i32) -> Option<KeyTransition> {
    let identity = match key {
        Key::KEY_LEFTSHIFT | Key::KEY_RIGHTSHIFT => {
            return match value {
                0 | 1 => Some(KeyTransition {
                    identity: KeyIdentity::Shift,
                    phase: KeyPhase::ModifierChanged,
                }),
                _ => None,
            };
        }
        Key::KEY_CAPSLOCK => {
            return (value == 1).then_some(KeyTransition {
                identity: KeyIdentity::CapsLock,
                phase: KeyPhase::ModifierChanged,
            });
        }
        Key::KEY_MUTE
        | Key::KEY_VOLUMEDOWN
        | Key::KEY_VOLUMEUP
        | Key::KEY_PLAYPAUSE
        | Key::KEY_NEXTSONG
        | Key::KEY_PREVIOUSSONG => {
            return (value == 1).then_some(KeyTransition {
                identity: KeyIdentity::Other,
                phase: KeyPhase::SystemDefined,
            });
        }
        Key::KEY_TAB => KeyIdentity::Tab,
        Key::KEY_ENTER => KeyIdentity::Return,
        Key::KEY_KPENTER => KeyIdentity::KeypadEnter,
        Key::KEY_BACKSPACE => KeyIdentity::Delete,
        Key::KEY_DELETE => KeyIdentity::ForwardDelete,
        Key::KEY_ESC => KeyIdentity::Escape,
        Key::KEY_SPACE => KeyIdentity::Space,
        Key::KEY_CLEAR | Key::KEY_NUMLOCK => KeyIdentity::KeypadClear,
        Key::KEY_HOME => KeyIdentity::Home,
        Key::KEY_END => KeyIdentity::End,
        Key::KEY_PAGEUP => KeyIdentity::PageUp,
        Key::KEY_PAGEDOWN => KeyIdentity::PageDown,
        other => bucket_by_code(other),
    };

    let phase = match value {
        1 | 2 => KeyPhase::Down,
        0 => KeyPhase::Up,
        _ => return None,
    };

    Some(KeyTransition { identity, phase })
}

/// Coarse identity for keys without a dedicated sound: letters, digits and
/// punctuation by their positions in the main key block, everything else
/// (arrows, function keys, keypad digits) as Other. All four buckets play
/// the generic key sounds.
fn bucket_by_code(key: Key) -> KeyIdentity {
    match key.code() {
        // KEY_1 ..= KEY_0
        2..=11 => KeyIdentity::Number,
        // qwertyuiop / asdfghjkl / zxcvbnm rows
        16..=25 | 30..=38 | 44..=50 => KeyIdentity::Letter,
        // minus, equal, brackets, semicolon, apostrophe, grave, backslash,
        // comma, dot, slash
        12 | 13 | 26 | 27 | 39..=41 | 43 | 51..=53 => KeyIdentity::Symbol,
        _ => KeyIdentity::Other,
    }
}

/// Find all keyboard input devices
fn find_keyboard_devices() -> Result<Vec<PathBuf>, ListenerError> {
    let mut keyboards = Vec::new();

    let input_dir = std::fs::read_dir("/dev/input")
        .map_err(|e| ListenerError::DeviceAccess(format!("/dev/input: {}", e)))?;

    for entry in input_dir {
        let entry = entry.map_err(|e| ListenerError::DeviceAccess(e.to_string()))?;
        let path = entry.path();

        // Only look at event* devices
        let is_event_device = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with("event"))
            .unwrap_or(false);

        if !is_event_device {
            continue;
        }

        // Try to open and check if it's a keyboard
        match Device::open(&path) {
            Ok(device) => {
                // Check if device has keyboard capabilities
                let has_keys = device
                    .supported_keys()
                    .map(|keys| {
                        // A keyboard should have at least some letter keys
                        keys.contains(Key::KEY_A)
                            && keys.contains(Key::KEY_Z)
                            && keys.contains(Key::KEY_ENTER)
                    })
                    .unwrap_or(false);

                if has_keys {
                    tracing::debug!(
                        "Found keyboard: {:?} ({:?})",
                        path,
                        device.name().unwrap_or("unknown")
                    );
                    keyboards.push(path);
                }
            }
            Err(e) => {
                // Permission denied is common for non-input-group users
                if e.kind() == std::io::ErrorKind::PermissionDenied {
                    return Err(ListenerError::DeviceAccess(path.display().to_string()));
                }
                // Other errors (device busy, etc.) - just skip
                tracing::trace!("Skipping {:?}: {}", path, e);
            }
        }
    }

    Ok(keyboards)
}
