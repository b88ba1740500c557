use crate::model::config::EngineConfig;
use crate::model::song::Timeline;
use log::debug;
use std::collections::BTreeSet;
use std::sync::Arc;

pub mod capture;
pub mod clock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Playing,
    Frozen,
    Finished,
}

/// Notifications emitted by [`SyncEngine`], delivered in the order they happen.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineEvent {
    /// The playhead moved while playing.
    TickUpdate(f64),
    /// The pitches still required to leave the freeze changed.
    TargetsChanged(BTreeSet<u8>),
    /// The last chord group was cleared. Fired once per load.
    Finished,
    /// Judgement of one key press.
    Feedback { pitch: u8, correct: bool },
}

pub trait EngineObserver: Send {
    fn notify(&mut self, event: &EngineEvent);
}

impl<F: FnMut(&EngineEvent) + Send> EngineObserver for F {
    fn notify(&mut self, event: &EngineEvent) {
        self(event)
    }
}

/// Walks a [`Timeline`], freezing the playhead on each chord group until every pitch of
/// the group has been played.
///
/// Not synchronised: `advance` and `input` must be called from the one thread that owns
/// the engine. Other threads hand their events over through a channel (see
/// [`crate::Player`]).
pub struct SyncEngine {
    config: EngineConfig,
    timeline: Arc<Timeline>,
    phase: Phase,
    cursor: usize,
    current_tick: f64,
    targets: BTreeSet<u8>,
    observers: Vec<Box<dyn EngineObserver>>,
}

impl SyncEngine {
    /// A new engine has nothing loaded and sits in [`Phase::Finished`].
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            timeline: Arc::new(Timeline::default()),
            phase: Phase::Finished,
            cursor: 0,
            current_tick: 0.0,
            targets: BTreeSet::new(),
            observers: Vec::new(),
        }
    }

    pub fn subscribe<O: EngineObserver + 'static>(&mut self, observer: O) {
        self.observers.push(Box::new(observer));
    }

    /// Replaces the timeline and restarts playback from tick 0.
    pub fn load(&mut self, timeline: impl Into<Arc<Timeline>>) {
        self.timeline = timeline.into();
        self.phase = Phase::Playing;
        self.cursor = 0;
        self.current_tick = 0.0;
        self.targets.clear();

        debug!(
            "Sync engine loaded {} chord groups..!",
            self.timeline.len()
        );
    }

    /// Feeds `dt` seconds of elapsed time. Only has an effect while playing.
    pub fn advance(&mut self, dt: f64) {
        if self.phase != Phase::Playing {
            return;
        }

        let Some(group) = self.timeline.get(self.cursor) else {
            self.phase = Phase::Finished;
            debug!("Timeline exhausted at tick {:.3}..!", self.current_tick);
            self.emit(EngineEvent::Finished);
            return;
        };

        let target_tick = group.start_tick() as f64;
        // negative or NaN steps (from dt or the config) would move the playhead backwards
        let dt = if dt > 0.0 { dt } else { 0.0 };
        let step = self.config.ticks_for(dt);
        let step = if step > 0.0 { step } else { 0.0 };
        let next_tick = self.current_tick + step;

        if next_tick >= target_tick {
            self.current_tick = target_tick;
            self.targets = group.pitches();
            self.phase = Phase::Frozen;

            debug!(
                "Frozen at tick {} on group {} waiting for {:?}..!",
                target_tick, self.cursor, self.targets
            );
            self.emit(EngineEvent::TickUpdate(self.current_tick));
            self.emit(EngineEvent::TargetsChanged(self.targets.clone()));
        } else {
            self.current_tick = next_tick;
            self.emit(EngineEvent::TickUpdate(self.current_tick));
        }
    }

    /// Judges a detected key press. Only presses matching a pending target while frozen
    /// are correct; every press produces feedback.
    pub fn input(&mut self, pitch: u8) {
        let correct = self.phase == Phase::Frozen && self.targets.remove(&pitch);
        self.emit(EngineEvent::Feedback { pitch, correct });

        if !correct {
            return;
        }

        self.emit(EngineEvent::TargetsChanged(self.targets.clone()));

        if self.targets.is_empty() {
            // the next group is only checked on the following advance
            self.cursor += 1;
            self.phase = Phase::Playing;
            debug!("Group cleared, {} remaining..!", self.remaining());
        }
    }

    pub fn config(&self) -> EngineConfig {
        self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn current_tick(&self) -> f64 {
        self.current_tick
    }

    pub fn targets(&self) -> &BTreeSet<u8> {
        &self.targets
    }

    pub fn timeline(&self) -> Arc<Timeline> {
        Arc::clone(&self.timeline)
    }

    pub fn remaining(&self) -> usize {
        self.timeline.len().saturating_sub(self.cursor)
    }

    fn emit(&mut self, event: EngineEvent) {
        for observer in self.observers.iter_mut() {
            observer.notify(&event);
        }
    }
}
