use crate::engine::capture::{CaptureWorker, PitchSource};
use crate::engine::clock::ClockDriver;
use crate::engine::{EngineEvent, Phase, SyncEngine};
use crate::model::config::EngineConfig;
use crate::model::song::Timeline;
use crate::util::pitch_name;
use anyhow::bail;
use log::{debug, info, warn};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

/// Everything the engine's owner thread reacts to.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HostMsg {
    /// Seconds elapsed since the previous frame.
    Frame(f64),
    /// A detected key press.
    Pitch(u8),
    Stop,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionSummary {
    pub groups_cleared: usize,
    pub correct: usize,
    pub incorrect: usize,
    pub free_play: usize,
    pub finished: bool,
}

/// Owns the [`SyncEngine`] and serialises the clock and capture threads onto it.
pub struct Player {
    verbose: bool,
    frame_rate: f64,
    engine: SyncEngine,
    host_tx: Sender<HostMsg>,
    host_rx: Receiver<HostMsg>,
    events_rx: Receiver<EngineEvent>,
}

impl Player {
    pub fn new(config: EngineConfig, frame_rate: f64, verbose: bool) -> Self {
        let (host_tx, host_rx) = mpsc::channel::<HostMsg>();
        let (events_tx, events_rx) = mpsc::channel::<EngineEvent>();

        let mut engine = SyncEngine::new(config);
        engine.subscribe(move |event: &EngineEvent| {
            let _ = events_tx.send(event.clone());
        });

        Self {
            verbose,
            frame_rate,
            engine,
            host_tx,
            host_rx,
            events_rx,
        }
    }

    /// A handle for other threads (clock, capture, Ctrl-C) to post messages with.
    pub fn sender(&self) -> Sender<HostMsg> {
        self.host_tx.clone()
    }

    pub fn engine(&self) -> &SyncEngine {
        &self.engine
    }

    pub fn load_timeline(&mut self, timeline: impl Into<Arc<Timeline>>) {
        self.engine.load(timeline);
        // stale messages from a previous run
        while self.host_rx.try_recv().is_ok() {}
        while self.events_rx.try_recv().is_ok() {}

        info!(
            "Loaded timeline with {} chord groups..!",
            self.engine.remaining()
        );
    }

    /// Runs a practice session on the calling thread until the timeline is finished or a
    /// `HostMsg::Stop` arrives.
    pub fn play<S: PitchSource + 'static>(&mut self, source: S) -> anyhow::Result<SessionSummary> {
        if self.engine.phase() == Phase::Finished {
            bail!("Nothing left to play, load a timeline first..!")
        }
        self.engine.config().validate()?;

        let mut clock = ClockDriver::new();
        let mut capture = CaptureWorker::new();

        clock.start(self.frame_rate, self.sender())?;
        if let Err(why) = capture.start(source, self.sender()) {
            clock.stop();
            return Err(why);
        }

        let summary = self.run();

        clock.stop();
        capture.stop();
        info!("Practice session ended: {:?}", summary);

        Ok(summary)
    }

    /// Drains host messages until finished or stopped.
    pub fn run(&mut self) -> SessionSummary {
        let mut summary = SessionSummary::default();

        while let Ok(msg) = self.host_rx.recv() {
            if self.dispatch(msg, &mut summary) {
                break;
            }
        }

        summary
    }

    /// Returns `true` once the session is over.
    fn dispatch(&mut self, msg: HostMsg, summary: &mut SessionSummary) -> bool {
        let phase_before = self.engine.phase();

        match msg {
            HostMsg::Frame(dt) => self.engine.advance(dt),
            HostMsg::Pitch(pitch) => self.engine.input(pitch),
            HostMsg::Stop => {
                warn!("Stop requested, ending practice session..!");
                return true;
            }
        }

        let mut done = false;
        while let Ok(event) = self.events_rx.try_recv() {
            match event {
                EngineEvent::TickUpdate(tick) => {
                    debug!("Tick {:.3}", tick);
                }
                EngineEvent::TargetsChanged(targets) => {
                    if targets.is_empty() {
                        summary.groups_cleared += 1;
                        self.log(format!(
                            "Chord cleared, {} to go..!",
                            self.engine.remaining()
                        ));
                    } else {
                        let names: Vec<String> = targets.iter().map(|&p| pitch_name(p)).collect();
                        self.log(format!("Waiting for: {}", names.join(" ")));
                    }
                }
                EngineEvent::Feedback { pitch, correct } => {
                    let verdict = if correct {
                        summary.correct += 1;
                        "correct"
                    } else if phase_before == Phase::Frozen {
                        summary.incorrect += 1;
                        "incorrect"
                    } else {
                        summary.free_play += 1;
                        "free play"
                    };
                    self.log(format!("{:>5} ({:>3}) {}", pitch_name(pitch), pitch, verdict));
                }
                EngineEvent::Finished => {
                    summary.finished = true;
                    info!("Piece complete..!");
                    done = true;
                }
            }
        }

        done
    }

    fn log(&self, line: String) {
        if self.verbose {
            info!("{}", line);
        } else {
            debug!("{}", line);
        }
    }
}
