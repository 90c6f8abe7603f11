//! Cue scheduling
//!
//! Dispatches the cues a typewriter emits: immediate cues go straight to
//! the player on the caller's thread, delayed and chained cues get a timer
//! task. A chained cue starts when its parent's measured playback duration
//! elapses; the duration comes from whichever variant the player actually
//! chose, so it is read back at play time, never assumed up front.
//!
//! Chains are at most two deep: a cue may depend on one parent, and no cue
//! depends on a dependent.
//!
//! Tearing the scheduler down (model switch, daemon exit) cancels every
//! pending timer, so no cue can fire against a model that is no longer
//! active. Individual cues are otherwise fire-and-forget.

use crate::cue::SoundCue;
use crate::sound::{Playback, SoundPlayer};
use std::sync::Arc;
use tokio::sync::watch;

/// Owns the timer tasks for one active model.
pub struct CueScheduler {
    player: Arc<dyn SoundPlayer>,
    cancel: watch::Sender<bool>,
}

impl CueScheduler {
    pub fn new(player: Arc<dyn SoundPlayer>) -> Self {
        let (cancel, _) = watch::channel(false);
        Self { player, cancel }
    }

    /// Dispatch one batch of cues, in order. Never blocks the caller:
    /// zero-delay cues start inline (playback itself is asynchronous),
    /// timer waits happen on spawned tasks.
    pub fn dispatch(&self, cues: Vec<SoundCue>) {
        for (cue, follow_up) in pair_chains(cues) {
            if cue.delay.is_zero() {
                // A silent parent takes its dependent down with it: the
                // chain's start time is defined by a playback that never
                // happened.
                let Some(playback) = play_cue(self.player.as_ref(), &cue) else {
                    continue;
                };
                if let Some(follow) = follow_up {
                    self.schedule(follow, playback.duration);
                }
                continue;
            }

            let player = Arc::clone(&self.player);
            let mut cancelled = self.cancel.subscribe();
            tokio::spawn(async move {
                if *cancelled.borrow() {
                    return;
                }

                tokio::select! {
                    _ = cancelled.changed() => return,
                    _ = tokio::time::sleep(cue.delay) => {}
                }

                let Some(playback) = play_cue(player.as_ref(), &cue) else {
                    return;
                };

                if let Some(follow) = follow_up {
                    let gap = playback.duration + follow.delay;
                    tokio::select! {
                        _ = cancelled.changed() => return,
                        _ = tokio::time::sleep(gap) => {}
                    }
                    play_cue(player.as_ref(), &follow);
                }
            });
        }
    }

    /// Fire one cue after its parent's measured playback duration.
    fn schedule(&self, follow: SoundCue, parent_duration: std::time::Duration) {
        let player = Arc::clone(&self.player);
        let mut cancelled = self.cancel.subscribe();
        tokio::spawn(async move {
            if *cancelled.borrow() {
                return;
            }
            tokio::select! {
                _ = cancelled.changed() => return,
                _ = tokio::time::sleep(parent_duration + follow.delay) => {}
            }
            play_cue(player.as_ref(), &follow);
        });
    }

    /// Cancel every pending timer task. Sounds already handed to the
    /// player keep ringing out; only unfired cues are dropped.
    pub fn shutdown(&self) {
        let _ = self.cancel.send(true);
    }
}

fn play_cue(player: &dyn SoundPlayer, cue: &SoundCue) -> Option<Playback> {
    if cue.preempt {
        player.stop(cue.category);
    }
    let playback = player.play(cue.category);
    if playback.is_none() {
        tracing::trace!("No {} sound loaded, skipping", cue.category);
    }
    playback
}

/// Attach each chained cue to the most recent earlier cue of the category
/// it names. A chained cue with no parent in the batch is dropped.
fn pair_chains(cues: Vec<SoundCue>) -> Vec<(SoundCue, Option<SoundCue>)> {
    let mut paired: Vec<(SoundCue, Option<SoundCue>)> = Vec::new();

    for cue in cues {
        match cue.after {
            None => paired.push((cue, None)),
            Some(parent) => {
                let slot = paired
                    .iter_mut()
                    .rev()
                    .find(|(root, follow)| root.category == parent && follow.is_none());
                match slot {
                    Some(slot) => slot.1 = Some(cue),
                    None => tracing::debug!(
                        "Dropping chained {} cue: no {} in batch",
                        cue.category,
                        parent
                    ),
                }
            }
        }
    }

    paired
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cue::SoundCategory;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;
    use tokio::time::Instant;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Event {
        Played(SoundCategory),
        Stopped(SoundCategory),
    }

    /// Player stub that records what happened and when.
    struct RecordingPlayer {
        durations: HashMap<SoundCategory, Duration>,
        events: Mutex<Vec<(Event, Instant)>>,
    }

    impl RecordingPlayer {
        fn new(durations: &[(SoundCategory, Duration)]) -> Arc<Self> {
            Arc::new(Self {
                durations: durations.iter().copied().collect(),
                events: Mutex::new(Vec::new()),
            })
        }

        fn events(&self) -> Vec<(Event, Instant)> {
            self.events.lock().unwrap().clone()
        }
    }

    impl SoundPlayer for RecordingPlayer {
        fn play(&self, category: SoundCategory) -> Option<Playback> {
            let duration = *self.durations.get(&category)?;
            self.events
                .lock()
                .unwrap()
                .push((Event::Played(category), Instant::now()));
            Some(Playback { duration })
        }

        fn stop(&self, category: SoundCategory) {
            self.events
                .lock()
                .unwrap()
                .push((Event::Stopped(category), Instant::now()));
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_immediate_cue_plays_inline() {
        let player = RecordingPlayer::new(&[(SoundCategory::KeyDown, Duration::from_millis(25))]);
        let scheduler = CueScheduler::new(player.clone());

        scheduler.dispatch(vec![SoundCue::now(SoundCategory::KeyDown)]);

        // No task round-trip for the common case
        assert_eq!(
            player.events(),
            vec![(Event::Played(SoundCategory::KeyDown), Instant::now())]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_chained_cue_waits_for_measured_duration() {
        let player = RecordingPlayer::new(&[
            (SoundCategory::Bell, Duration::from_millis(300)),
            (SoundCategory::SingleLineReturn, Duration::from_millis(900)),
        ]);
        let scheduler = CueScheduler::new(player.clone());
        let start = Instant::now();

        scheduler.dispatch(vec![
            SoundCue::now(SoundCategory::Bell),
            SoundCue::chained(SoundCategory::SingleLineReturn, SoundCategory::Bell),
        ]);
        tokio::time::sleep(Duration::from_secs(2)).await;

        let events = player.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].0, Event::Played(SoundCategory::Bell));
        assert_eq!(events[1].0, Event::Played(SoundCategory::SingleLineReturn));
        assert_eq!(events[1].1 - events[0].1, Duration::from_millis(300));
        assert_eq!(events[0].1 - start, Duration::ZERO);
    }

    #[tokio::test(start_paused = true)]
    async fn test_delayed_parent_shifts_the_whole_chain() {
        let player = RecordingPlayer::new(&[
            (SoundCategory::PaperLoad, Duration::from_millis(480)),
            (SoundCategory::PaperFeed, Duration::from_millis(400)),
        ]);
        let scheduler = CueScheduler::new(player.clone());
        let start = Instant::now();

        scheduler.dispatch(vec![
            SoundCue::delayed(SoundCategory::PaperLoad, Duration::from_secs(1)),
            SoundCue::chained(SoundCategory::PaperFeed, SoundCategory::PaperLoad),
        ]);
        tokio::time::sleep(Duration::from_secs(3)).await;

        let events = player.events();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].1 - start, Duration::from_secs(1));
        assert_eq!(events[1].1 - start, Duration::from_millis(1480));
    }

    #[tokio::test(start_paused = true)]
    async fn test_silent_parent_drops_dependent() {
        // No Bell asset loaded
        let player =
            RecordingPlayer::new(&[(SoundCategory::SingleLineReturn, Duration::from_millis(900))]);
        let scheduler = CueScheduler::new(player.clone());

        scheduler.dispatch(vec![
            SoundCue::now(SoundCategory::Bell),
            SoundCue::chained(SoundCategory::SingleLineReturn, SoundCategory::Bell),
        ]);
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert!(player.events().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_missing_chained_category_degrades_to_silence() {
        let player = RecordingPlayer::new(&[(SoundCategory::PaperLoad, Duration::from_millis(480))]);
        let scheduler = CueScheduler::new(player.clone());

        scheduler.dispatch(vec![
            SoundCue::now(SoundCategory::PaperLoad),
            SoundCue::chained(SoundCategory::PaperFeed, SoundCategory::PaperLoad),
        ]);
        tokio::time::sleep(Duration::from_secs(5)).await;

        let events = player.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].0, Event::Played(SoundCategory::PaperLoad));
    }

    #[tokio::test(start_paused = true)]
    async fn test_orphan_chained_cue_is_dropped() {
        let player = RecordingPlayer::new(&[(SoundCategory::PaperFeed, Duration::from_millis(400))]);
        let scheduler = CueScheduler::new(player.clone());

        scheduler.dispatch(vec![SoundCue::chained(
            SoundCategory::PaperFeed,
            SoundCategory::PaperLoad,
        )]);
        tokio::time::sleep(Duration::from_secs(2)).await;

        assert!(player.events().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_shutdown_cancels_pending_cues() {
        let player = RecordingPlayer::new(&[
            (SoundCategory::PaperLoad, Duration::from_millis(480)),
            (SoundCategory::PaperFeed, Duration::from_millis(400)),
        ]);
        let scheduler = CueScheduler::new(player.clone());

        scheduler.dispatch(vec![
            SoundCue::delayed(SoundCategory::PaperLoad, Duration::from_secs(1)),
            SoundCue::chained(SoundCategory::PaperFeed, SoundCategory::PaperLoad),
        ]);
        scheduler.shutdown();
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert!(player.events().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_preempting_cue_stops_before_playing() {
        let player =
            RecordingPlayer::new(&[(SoundCategory::MarginRelease, Duration::from_millis(220))]);
        let scheduler = CueScheduler::new(player.clone());

        scheduler.dispatch(vec![SoundCue::preempting(SoundCategory::MarginRelease)]);
        scheduler.dispatch(vec![SoundCue::preempting(SoundCategory::MarginRelease)]);

        let kinds: Vec<Event> = player.events().into_iter().map(|(e, _)| e).collect();
        assert_eq!(
            kinds,
            vec![
                Event::Stopped(SoundCategory::MarginRelease),
                Event::Played(SoundCategory::MarginRelease),
                Event::Stopped(SoundCategory::MarginRelease),
                Event::Played(SoundCategory::MarginRelease),
            ]
        );
    }
}
