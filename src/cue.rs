//! Sound cue types
//!
//! A cue is a request to play one categorized typewriter sound, possibly
//! delayed, possibly chained onto another cue's measured playback duration.
//! Cues are produced by the typewriter state machine and consumed by the
//! scheduler; neither touches audio data directly.

use rand::seq::SliceRandom;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use crate::error::SoundError;

/// Every sound a typewriter soundset can provide.
///
/// The names double as soundset subdirectory names, so `KeyDown` sounds for
/// a model live in `<soundsets>/<model>/KeyDown/*.wav`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SoundCategory {
    ShiftUp,
    ShiftDown,
    ShiftLock,
    ShiftRelease,
    SpaceUp,
    SpaceDown,
    SingleLineReturn,
    DoubleLineReturn,
    TripleLineReturn,
    BackspaceUp,
    BackspaceDown,
    PaperRelease,
    PaperReturn,
    PaperLoad,
    PaperFeed,
    TabUp,
    TabDown,
    Bell,
    RibbonSelector,
    MarginRelease,
    KeyUp,
    KeyDown,
    LidUp,
    LidDown,
}

/// The three carriage-return flavors; one is picked at random per firing.
pub const LINE_RETURNS: [SoundCategory; 3] = [
    SoundCategory::SingleLineReturn,
    SoundCategory::DoubleLineReturn,
    SoundCategory::TripleLineReturn,
];

impl SoundCategory {
    /// All categories, in soundset directory order.
    pub const ALL: [SoundCategory; 24] = [
        SoundCategory::ShiftUp,
        SoundCategory::ShiftDown,
        SoundCategory::ShiftLock,
        SoundCategory::ShiftRelease,
        SoundCategory::SpaceUp,
        SoundCategory::SpaceDown,
        SoundCategory::SingleLineReturn,
        SoundCategory::DoubleLineReturn,
        SoundCategory::TripleLineReturn,
        SoundCategory::BackspaceUp,
        SoundCategory::BackspaceDown,
        SoundCategory::PaperRelease,
        SoundCategory::PaperReturn,
        SoundCategory::PaperLoad,
        SoundCategory::PaperFeed,
        SoundCategory::TabUp,
        SoundCategory::TabDown,
        SoundCategory::Bell,
        SoundCategory::RibbonSelector,
        SoundCategory::MarginRelease,
        SoundCategory::KeyUp,
        SoundCategory::KeyDown,
        SoundCategory::LidUp,
        SoundCategory::LidDown,
    ];

    /// Soundset subdirectory name for this category.
    pub fn dir_name(&self) -> &'static str {
        match self {
            SoundCategory::ShiftUp => "ShiftUp",
            SoundCategory::ShiftDown => "ShiftDown",
            SoundCategory::ShiftLock => "ShiftLock",
            SoundCategory::ShiftRelease => "ShiftRelease",
            SoundCategory::SpaceUp => "SpaceUp",
            SoundCategory::SpaceDown => "SpaceDown",
            SoundCategory::SingleLineReturn => "SingleLineReturn",
            SoundCategory::DoubleLineReturn => "DoubleLineReturn",
            SoundCategory::TripleLineReturn => "TripleLineReturn",
            SoundCategory::BackspaceUp => "BackspaceUp",
            SoundCategory::BackspaceDown => "BackspaceDown",
            SoundCategory::PaperRelease => "PaperRelease",
            SoundCategory::PaperReturn => "PaperReturn",
            SoundCategory::PaperLoad => "PaperLoad",
            SoundCategory::PaperFeed => "PaperFeed",
            SoundCategory::TabUp => "TabUp",
            SoundCategory::TabDown => "TabDown",
            SoundCategory::Bell => "Bell",
            SoundCategory::RibbonSelector => "RibbonSelector",
            SoundCategory::MarginRelease => "MarginRelease",
            SoundCategory::KeyUp => "KeyUp",
            SoundCategory::KeyDown => "KeyDown",
            SoundCategory::LidUp => "LidUp",
            SoundCategory::LidDown => "LidDown",
        }
    }

    /// At most one sound of an exclusive category plays at a time; starting
    /// a new one stops the previous one first.
    pub fn is_exclusive(&self) -> bool {
        matches!(self, SoundCategory::MarginRelease)
    }
}

impl fmt::Display for SoundCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.dir_name())
    }
}

impl FromStr for SoundCategory {
    type Err = SoundError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        // Accept "KeyDown", "keydown", "key-down", "key_down"
        let normalized: String = s
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .map(|c| c.to_ascii_lowercase())
            .collect();

        SoundCategory::ALL
            .iter()
            .find(|c| c.dir_name().to_ascii_lowercase() == normalized)
            .copied()
            .ok_or_else(|| SoundError::UnknownCategory(s.to_string()))
    }
}

/// A request to play one categorized sound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SoundCue {
    pub category: SoundCategory,
    /// Base delay before the cue starts. For a chained cue this is added on
    /// top of the parent's measured playback duration.
    pub delay: Duration,
    /// Category of an earlier cue in the same batch whose measured playback
    /// duration gates this cue's start time.
    pub after: Option<SoundCategory>,
    /// Stop any sound of the same category still playing before starting.
    pub preempt: bool,
}

impl SoundCue {
    /// A cue that fires immediately.
    pub fn now(category: SoundCategory) -> Self {
        Self {
            category,
            delay: Duration::ZERO,
            after: None,
            preempt: false,
        }
    }

    /// A cue that fires after a fixed delay.
    pub fn delayed(category: SoundCategory, delay: Duration) -> Self {
        Self {
            category,
            delay,
            after: None,
            preempt: false,
        }
    }

    /// A cue that fires when the given earlier cue finishes playing.
    pub fn chained(category: SoundCategory, after: SoundCategory) -> Self {
        Self {
            category,
            delay: Duration::ZERO,
            after: Some(after),
            preempt: false,
        }
    }

    /// A cue that stops any same-category sound before starting.
    pub fn preempting(category: SoundCategory) -> Self {
        Self {
            category,
            delay: Duration::ZERO,
            after: None,
            preempt: true,
        }
    }
}

/// Picks one category out of a candidate set.
///
/// Injected into the state machine so tests can substitute a deterministic
/// selection for the random one.
pub trait CueSelector: Send {
    /// Returns one element of `candidates`, or None when it is empty.
    fn choose(&mut self, candidates: &[SoundCategory]) -> Option<SoundCategory>;
}

/// Uniformly random selection.
#[derive(Debug, Default)]
pub struct RandomSelector;

impl CueSelector for RandomSelector {
    fn choose(&mut self, candidates: &[SoundCategory]) -> Option<SoundCategory> {
        candidates.choose(&mut rand::thread_rng()).copied()
    }
}
