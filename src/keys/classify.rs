//! Key transition classification
//!
//! Turns each raw key transition into the single semantic action the
//! typewriter reacts to. Classification is a pure function and total:
//! every identity/phase combination maps to exactly one action, with
//! [`KeyAction::Generic`] as the catch-all.

use super::{KeyIdentity, KeyPhase};

/// Keys that ring the margin bell when struck.
pub const BELL_KEYS: [KeyIdentity; 4] = [
    KeyIdentity::Home,
    KeyIdentity::End,
    KeyIdentity::PageUp,
    KeyIdentity::PageDown,
];

/// Semantic action derived from one key transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Shift(KeyPhase),
    Space(KeyPhase),
    LineBreak(KeyPhase),
    Backspace(KeyPhase),
    Escape(KeyPhase),
    CapsLock(KeyPhase),
    Tab(KeyPhase),
    Bell(KeyPhase),
    RibbonSelector(KeyPhase),
    MarginSystem(KeyPhase),
    Generic(KeyPhase),
}

impl KeyAction {
    /// The phase the originating transition carried.
    pub fn phase(&self) -> KeyPhase {
        match *self {
            KeyAction::Shift(p)
            | KeyAction::Space(p)
            | KeyAction::LineBreak(p)
            | KeyAction::Backspace(p)
            | KeyAction::Escape(p)
            | KeyAction::CapsLock(p)
            | KeyAction::Tab(p)
            | KeyAction::Bell(p)
            | KeyAction::RibbonSelector(p)
            | KeyAction::MarginSystem(p)
            | KeyAction::Generic(p) => p,
        }
    }
}

/// Classify one raw key transition.
///
/// System-defined transitions win over identity no matter which key they
/// arrived on. The identity checks are ordered by how often each key fires
/// on a real keyboard; ordering only affects lookup cost, the categories
/// are mutually exclusive.
pub fn classify(identity: KeyIdentity, phase: KeyPhase) -> KeyAction {
    if phase == KeyPhase::SystemDefined {
        return KeyAction::MarginSystem(phase);
    }

    if matches!(
        identity,
        KeyIdentity::Letter | KeyIdentity::Number | KeyIdentity::Symbol | KeyIdentity::Other
    ) {
        KeyAction::Generic(phase)
    } else if identity == KeyIdentity::Space {
        KeyAction::Space(phase)
    } else if identity == KeyIdentity::Shift {
        KeyAction::Shift(phase)
    } else if identity == KeyIdentity::Return || identity == KeyIdentity::KeypadEnter {
        KeyAction::LineBreak(phase)
    } else if identity == KeyIdentity::Delete || identity == KeyIdentity::ForwardDelete {
        KeyAction::Backspace(phase)
    } else if identity == KeyIdentity::Escape {
        KeyAction::Escape(phase)
    } else if identity == KeyIdentity::CapsLock {
        KeyAction::CapsLock(phase)
    } else if identity == KeyIdentity::Tab {
        KeyAction::Tab(phase)
    } else if BELL_KEYS.contains(&identity) {
        KeyAction::Bell(phase)
    } else {
        debug_assert_eq!(identity, KeyIdentity::KeypadClear);
        KeyAction::RibbonSelector(phase)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_IDENTITIES: [KeyIdentity; 18] = [
        KeyIdentity::Shift,
        KeyIdentity::CapsLock,
        KeyIdentity::Tab,
        KeyIdentity::Return,
        KeyIdentity::KeypadEnter,
        KeyIdentity::Delete,
        KeyIdentity::ForwardDelete,
        KeyIdentity::Escape,
        KeyIdentity::Space,
        KeyIdentity::KeypadClear,
        KeyIdentity::Home,
        KeyIdentity::End,
        KeyIdentity::PageUp,
        KeyIdentity::PageDown,
        KeyIdentity::Letter,
        KeyIdentity::Number,
        KeyIdentity::Symbol,
        KeyIdentity::Other,
    ];

    #[test]
    fn test_classification_is_total_and_deterministic() {
        for identity in ALL_IDENTITIES {
            for phase in KeyPhase::ALL {
                let first = classify(identity, phase);
                let second = classify(identity, phase);
                assert_eq!(first, second);
                assert_eq!(first.phase(), phase);
            }
        }
    }

    #[test]
    fn test_system_defined_wins_over_identity() {
        for identity in ALL_IDENTITIES {
            assert_eq!(
                classify(identity, KeyPhase::SystemDefined),
                KeyAction::MarginSystem(KeyPhase::SystemDefined)
            );
        }
    }

    #[test]
    fn test_both_enters_are_line_breaks() {
        assert_eq!(
            classify(KeyIdentity::Return, KeyPhase::Down),
            KeyAction::LineBreak(KeyPhase::Down)
        );
        assert_eq!(
            classify(KeyIdentity::KeypadEnter, KeyPhase::Down),
            KeyAction::LineBreak(KeyPhase::Down)
        );
    }

    #[test]
    fn test_both_deletes_are_backspace() {
        assert_eq!(
            classify(KeyIdentity::Delete, KeyPhase::Up),
            KeyAction::Backspace(KeyPhase::Up)
        );
        assert_eq!(
            classify(KeyIdentity::ForwardDelete, KeyPhase::Up),
            KeyAction::Backspace(KeyPhase::Up)
        );
    }

    #[test]
    fn test_bell_keys_ring_the_bell() {
        for identity in BELL_KEYS {
            assert_eq!(
                classify(identity, KeyPhase::Down),
                KeyAction::Bell(KeyPhase::Down)
            );
        }
    }

    #[test]
    fn test_escape_classifies_regardless_of_soundset() {
        // Whether a model has paper sounds is resolved at dispatch time;
        // the classification itself never changes.
        assert_eq!(
            classify(KeyIdentity::Escape, KeyPhase::Down),
            KeyAction::Escape(KeyPhase::Down)
        );
    }

    #[test]
    fn test_keypad_clear_selects_ribbon() {
        assert_eq!(
            classify(KeyIdentity::KeypadClear, KeyPhase::Down),
            KeyAction::RibbonSelector(KeyPhase::Down)
        );
    }

    #[test]
    fn test_generic_buckets() {
        for identity in [
            KeyIdentity::Letter,
            KeyIdentity::Number,
            KeyIdentity::Symbol,
            KeyIdentity::Other,
        ] {
            assert_eq!(
                classify(identity, KeyPhase::Down),
                KeyAction::Generic(KeyPhase::Down)
            );
        }
    }
}
