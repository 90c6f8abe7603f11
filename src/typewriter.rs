//! Typewriter line state machine
//!
//! Owns the simulated carriage: cursor column, margin, modifier latches and
//! the 25-line paper counter. Each semantic key action mutates that state
//! and yields the sound cues to dispatch, in order. The machine is strictly
//! sequential: one action is processed to completion before the next, and
//! `handle` never blocks; timing lives in the cues, not here.

use crate::cue::{CueSelector, SoundCategory, SoundCue, LINE_RETURNS};
use crate::keys::classify::KeyAction;
use crate::keys::KeyPhase;
use crate::sound::SoundInventory;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Classic typewriter page width in characters.
pub const DEFAULT_MARGIN_WIDTH: usize = 80;

/// Line feeds before a fresh sheet of paper goes in.
pub const LINES_PER_PAGE: usize = 25;

/// Columns a tab stop advances the carriage.
const TAB_STOP: usize = 5;

/// Pause before the paper-load sound, so it reads as a separate gesture
/// from the line return that triggered it.
const PAPER_LOAD_LEAD: Duration = Duration::from_secs(1);

/// Live simulation toggles, shared between the machine, the daemon and
/// signal handlers. Read at decision time, so flipping one mid-session
/// takes effect on the next keystroke.
#[derive(Debug)]
pub struct SimulationOptions {
    margin_width: AtomicUsize,
    paper_return: AtomicBool,
    paper_feed: AtomicBool,
    advance_on_space: AtomicBool,
}

impl SimulationOptions {
    pub fn new(
        margin_width: usize,
        paper_return: bool,
        paper_feed: bool,
        advance_on_space: bool,
    ) -> Self {
        Self {
            margin_width: AtomicUsize::new(margin_width),
            paper_return: AtomicBool::new(paper_return),
            paper_feed: AtomicBool::new(paper_feed),
            advance_on_space: AtomicBool::new(advance_on_space),
        }
    }

    pub fn margin_width(&self) -> usize {
        self.margin_width.load(Ordering::Relaxed)
    }

    pub fn paper_return(&self) -> bool {
        self.paper_return.load(Ordering::Relaxed)
    }

    pub fn paper_feed(&self) -> bool {
        self.paper_feed.load(Ordering::Relaxed)
    }

    pub fn advance_on_space(&self) -> bool {
        self.advance_on_space.load(Ordering::Relaxed)
    }

    /// Flip both paper simulations together. Returns the new state.
    pub fn toggle_paper_simulation(&self) -> bool {
        let enabled = !self.paper_return();
        self.paper_return.store(enabled, Ordering::Relaxed);
        self.paper_feed.store(enabled, Ordering::Relaxed);
        enabled
    }
}

impl Default for SimulationOptions {
    fn default() -> Self {
        Self::new(DEFAULT_MARGIN_WIDTH, true, true, false)
    }
}

/// The typewriter state machine for one active model.
pub struct Typewriter {
    cursor: usize,
    lines_since_feed: usize,
    shift_latched: bool,
    caps_latched: bool,
    options: Arc<SimulationOptions>,
    inventory: Arc<dyn SoundInventory>,
    selector: Box<dyn CueSelector>,
}

impl Typewriter {
    pub fn new(
        options: Arc<SimulationOptions>,
        inventory: Arc<dyn SoundInventory>,
        selector: Box<dyn CueSelector>,
    ) -> Self {
        Self {
            cursor: 0,
            lines_since_feed: 0,
            shift_latched: false,
            caps_latched: false,
            options,
            inventory,
            selector,
        }
    }

    /// Cues to play when this machine takes over (lid opens). Best-effort:
    /// a model without a lid sound activates silently.
    pub fn activate(&mut self) -> Vec<SoundCue> {
        vec![SoundCue::now(SoundCategory::LidUp)]
    }

    /// Cues to play when this machine is torn down (lid closes).
    pub fn deactivate(&mut self) -> Vec<SoundCue> {
        vec![SoundCue::now(SoundCategory::LidDown)]
    }

    /// Current carriage column.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Line feeds since the last simulated sheet change.
    pub fn lines_since_feed(&self) -> usize {
        self.lines_since_feed
    }

    /// Process one action, returning the cues to dispatch in order.
    pub fn handle(&mut self, action: KeyAction) -> Vec<SoundCue> {
        let mut cues = Vec::new();

        // Latch toggles don't move the carriage, so they never wrap it
        if !matches!(action, KeyAction::Shift(_) | KeyAction::CapsLock(_)) {
            self.wrap_at_margin(&mut cues);
        }

        match action {
            KeyAction::Shift(_) => {
                cues.push(SoundCue::now(if self.shift_latched {
                    SoundCategory::ShiftUp
                } else {
                    SoundCategory::ShiftDown
                }));
                self.shift_latched = !self.shift_latched;
            }

            KeyAction::Space(phase) => {
                if phase == KeyPhase::Up {
                    cues.push(SoundCue::now(SoundCategory::SpaceUp));
                } else {
                    cues.push(SoundCue::now(SoundCategory::SpaceDown));
                    if self.options.advance_on_space() {
                        self.cursor += 1;
                    }
                }
            }

            KeyAction::LineBreak(phase) => {
                self.cursor = 0;
                if let Some(line_return) = self.pick_line_return() {
                    cues.push(SoundCue::now(line_return));
                }

                if self.lines_since_feed == LINES_PER_PAGE {
                    self.lines_since_feed = 0;
                    if self.options.paper_feed() {
                        cues.push(SoundCue::delayed(SoundCategory::PaperLoad, PAPER_LOAD_LEAD));
                        cues.push(SoundCue::chained(
                            SoundCategory::PaperFeed,
                            SoundCategory::PaperLoad,
                        ));
                    }
                } else if phase == KeyPhase::Down {
                    // Count each press once, not on both edges
                    self.lines_since_feed += 1;
                }
            }

            KeyAction::Backspace(phase) => {
                if phase == KeyPhase::Up {
                    cues.push(SoundCue::now(SoundCategory::BackspaceUp));
                } else {
                    cues.push(SoundCue::now(SoundCategory::BackspaceDown));
                    if self.cursor > 0 {
                        self.cursor -= 1;
                    }
                }
            }

            KeyAction::Escape(phase) => {
                cues.push(SoundCue::now(if phase == KeyPhase::Up {
                    SoundCategory::PaperRelease
                } else {
                    SoundCategory::PaperReturn
                }));
            }

            KeyAction::CapsLock(_) => {
                cues.push(SoundCue::now(if self.caps_latched {
                    SoundCategory::ShiftRelease
                } else {
                    SoundCategory::ShiftLock
                }));
                self.caps_latched = !self.caps_latched;
            }

            KeyAction::Tab(phase) => {
                if phase == KeyPhase::Up {
                    cues.push(SoundCue::now(SoundCategory::TabUp));
                } else {
                    cues.push(SoundCue::now(SoundCategory::TabDown));
                    // Not clamped here; the wrap fires on the next action
                    self.cursor += TAB_STOP;
                }
            }

            KeyAction::Bell(_) => {
                cues.push(SoundCue::now(SoundCategory::Bell));
            }

            KeyAction::RibbonSelector(_) => {
                cues.push(SoundCue::now(SoundCategory::RibbonSelector));
            }

            KeyAction::MarginSystem(_) => {
                // At most one margin release rings at a time
                cues.push(SoundCue::preempting(SoundCategory::MarginRelease));
            }

            KeyAction::Generic(phase) => {
                if phase == KeyPhase::Up {
                    cues.push(SoundCue::now(SoundCategory::KeyUp));
                } else {
                    cues.push(SoundCue::now(SoundCategory::KeyDown));
                    self.cursor += 1;
                }
            }
        }

        cues
    }

    /// Carriage reached the margin: snap back to column 0 and, when paper
    /// return is simulated, ring the bell with the return chained onto it.
    fn wrap_at_margin(&mut self, cues: &mut Vec<SoundCue>) {
        if self.cursor < self.options.margin_width() {
            return;
        }

        self.cursor = 0;
        if self.options.paper_return() {
            cues.push(SoundCue::now(SoundCategory::Bell));
            if let Some(line_return) = self.pick_line_return() {
                cues.push(SoundCue::chained(line_return, SoundCategory::Bell));
            }
        }
    }

    /// One of the line-return flavors the active model can actually play.
    fn pick_line_return(&mut self) -> Option<SoundCategory> {
        let available: Vec<SoundCategory> = LINE_RETURNS
            .iter()
            .copied()
            .filter(|c| self.inventory.has(*c))
            .collect();
        self.selector.choose(&available)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Inventory stub claiming every category exists.
    struct Everything;

    impl SoundInventory for Everything {
        fn has(&self, _category: SoundCategory) -> bool {
            true
        }
    }

    /// Inventory stub with only one line-return flavor.
    struct OnlyDoubleReturn;

    impl SoundInventory for OnlyDoubleReturn {
        fn has(&self, category: SoundCategory) -> bool {
            category == SoundCategory::DoubleLineReturn
        }
    }

    /// Deterministic selector: always the first candidate.
    struct First;

    impl CueSelector for First {
        fn choose(&mut self, candidates: &[SoundCategory]) -> Option<SoundCategory> {
            candidates.first().copied()
        }
    }

    fn machine() -> Typewriter {
        Typewriter::new(
            Arc::new(SimulationOptions::default()),
            Arc::new(Everything),
            Box::new(First),
        )
    }

    fn categories(cues: &[SoundCue]) -> Vec<SoundCategory> {
        cues.iter().map(|c| c.category).collect()
    }

    #[test]
    fn test_shift_alternates_down_then_up() {
        let mut tw = machine();
        let first = tw.handle(KeyAction::Shift(KeyPhase::ModifierChanged));
        let second = tw.handle(KeyAction::Shift(KeyPhase::ModifierChanged));
        assert_eq!(categories(&first), [SoundCategory::ShiftDown]);
        assert_eq!(categories(&second), [SoundCategory::ShiftUp]);
    }

    #[test]
    fn test_caps_lock_alternates_lock_release_lock() {
        let mut tw = machine();
        let presses: Vec<_> = (0..3)
            .flat_map(|_| tw.handle(KeyAction::CapsLock(KeyPhase::ModifierChanged)))
            .collect();
        assert_eq!(
            categories(&presses),
            [
                SoundCategory::ShiftLock,
                SoundCategory::ShiftRelease,
                SoundCategory::ShiftLock,
            ]
        );
    }

    #[test]
    fn test_generic_down_advances_cursor_and_up_does_not() {
        let mut tw = machine();
        tw.handle(KeyAction::Generic(KeyPhase::Down));
        tw.handle(KeyAction::Generic(KeyPhase::Up));
        assert_eq!(tw.cursor(), 1);
    }

    #[test]
    fn test_backspace_never_goes_below_zero() {
        let mut tw = machine();
        for _ in 0..3 {
            let cues = tw.handle(KeyAction::Backspace(KeyPhase::Down));
            assert_eq!(categories(&cues), [SoundCategory::BackspaceDown]);
        }
        assert_eq!(tw.cursor(), 0);
    }

    #[test]
    fn test_tab_advances_five_columns_unclamped() {
        let mut tw = machine();
        for _ in 0..16 {
            tw.handle(KeyAction::Tab(KeyPhase::Down));
        }
        // 16 tabs = column 80: at the margin but not yet wrapped
        assert_eq!(tw.cursor(), 80);
    }

    #[test]
    fn test_margin_wrap_rings_bell_with_chained_return() {
        let mut tw = machine();
        for _ in 0..80 {
            tw.handle(KeyAction::Generic(KeyPhase::Down));
        }
        assert_eq!(tw.cursor(), 80);

        let cues = tw.handle(KeyAction::Generic(KeyPhase::Down));
        assert_eq!(cues[0], SoundCue::now(SoundCategory::Bell));
        assert_eq!(
            cues[1],
            SoundCue::chained(SoundCategory::SingleLineReturn, SoundCategory::Bell)
        );
        assert_eq!(cues[2], SoundCue::now(SoundCategory::KeyDown));
        // The wrapped keystroke still printed its own character
        assert_eq!(tw.cursor(), 1);
    }

    #[test]
    fn test_margin_wrap_without_paper_return_is_silent() {
        let options = Arc::new(SimulationOptions::new(80, false, false, false));
        let mut tw = Typewriter::new(options, Arc::new(Everything), Box::new(First));
        for _ in 0..81 {
            tw.handle(KeyAction::Generic(KeyPhase::Down));
        }
        assert_eq!(tw.cursor(), 1);
    }

    #[test]
    fn test_latch_toggles_do_not_wrap() {
        let mut tw = machine();
        for _ in 0..80 {
            tw.handle(KeyAction::Generic(KeyPhase::Down));
        }
        let cues = tw.handle(KeyAction::Shift(KeyPhase::ModifierChanged));
        assert_eq!(categories(&cues), [SoundCategory::ShiftDown]);
        assert_eq!(tw.cursor(), 80);
    }

    #[test]
    fn test_line_break_resets_cursor_and_counts_downs_only() {
        let mut tw = machine();
        for _ in 0..10 {
            tw.handle(KeyAction::Generic(KeyPhase::Down));
        }
        tw.handle(KeyAction::LineBreak(KeyPhase::Down));
        tw.handle(KeyAction::LineBreak(KeyPhase::Up));
        assert_eq!(tw.cursor(), 0);
        assert_eq!(tw.lines_since_feed(), 1);
    }

    #[test]
    fn test_paper_feed_chain_after_a_full_page() {
        let mut tw = machine();
        for _ in 0..LINES_PER_PAGE {
            tw.handle(KeyAction::LineBreak(KeyPhase::Down));
        }
        assert_eq!(tw.lines_since_feed(), LINES_PER_PAGE);

        let cues = tw.handle(KeyAction::LineBreak(KeyPhase::Down));
        assert_eq!(tw.lines_since_feed(), 0);
        assert_eq!(
            cues,
            vec![
                SoundCue::now(SoundCategory::SingleLineReturn),
                SoundCue::delayed(SoundCategory::PaperLoad, Duration::from_secs(1)),
                SoundCue::chained(SoundCategory::PaperFeed, SoundCategory::PaperLoad),
            ]
        );
    }

    #[test]
    fn test_paper_feed_disabled_still_resets_counter() {
        let options = Arc::new(SimulationOptions::new(80, true, false, false));
        let mut tw = Typewriter::new(options, Arc::new(Everything), Box::new(First));
        for _ in 0..=LINES_PER_PAGE {
            tw.handle(KeyAction::LineBreak(KeyPhase::Down));
        }
        assert_eq!(tw.lines_since_feed(), 0);
    }

    #[test]
    fn test_line_return_skips_missing_flavors() {
        let mut tw = Typewriter::new(
            Arc::new(SimulationOptions::default()),
            Arc::new(OnlyDoubleReturn),
            Box::new(First),
        );
        let cues = tw.handle(KeyAction::LineBreak(KeyPhase::Down));
        assert_eq!(categories(&cues), [SoundCategory::DoubleLineReturn]);
    }

    #[test]
    fn test_space_advance_is_configurable() {
        let mut fixed = machine();
        fixed.handle(KeyAction::Space(KeyPhase::Down));
        assert_eq!(fixed.cursor(), 0);

        let options = Arc::new(SimulationOptions::new(80, true, true, true));
        let mut advancing = Typewriter::new(options, Arc::new(Everything), Box::new(First));
        advancing.handle(KeyAction::Space(KeyPhase::Down));
        advancing.handle(KeyAction::Space(KeyPhase::Up));
        assert_eq!(advancing.cursor(), 1);
    }

    #[test]
    fn test_escape_maps_to_paper_release_and_return() {
        let mut tw = machine();
        let down = tw.handle(KeyAction::Escape(KeyPhase::Down));
        let up = tw.handle(KeyAction::Escape(KeyPhase::Up));
        assert_eq!(categories(&down), [SoundCategory::PaperReturn]);
        assert_eq!(categories(&up), [SoundCategory::PaperRelease]);
    }

    #[test]
    fn test_margin_system_preempts_previous_release() {
        let mut tw = machine();
        let cues = tw.handle(KeyAction::MarginSystem(KeyPhase::SystemDefined));
        assert_eq!(cues, vec![SoundCue::preempting(SoundCategory::MarginRelease)]);
    }

    #[test]
    fn test_activation_cues() {
        let mut tw = machine();
        assert_eq!(tw.activate(), vec![SoundCue::now(SoundCategory::LidUp)]);
        assert_eq!(tw.deactivate(), vec![SoundCue::now(SoundCategory::LidDown)]);
    }

    #[test]
    fn test_paper_toggle_flips_both_simulations() {
        let options = SimulationOptions::default();
        assert!(options.paper_return() && options.paper_feed());
        assert!(!options.toggle_paper_simulation());
        assert!(!options.paper_return() && !options.paper_feed());
        assert!(options.toggle_paper_simulation());
    }
}
