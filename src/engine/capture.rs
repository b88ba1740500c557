use crate::player::HostMsg;
use crate::util::parse_pitch;
use log::{debug, info, warn};
use std::io::BufRead;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

pub const STOP_TIMEOUT: Duration = Duration::from_millis(1000);

/// Something that produces detected key presses, e.g. a pitch tracker fed by a microphone.
pub trait PitchSource: Send {
    /// Blocks until the next detection. `Ok(None)` means the source is exhausted.
    fn next_pitch(&mut self) -> anyhow::Result<Option<u8>>;
}

/// Reads one pitch per line: MIDI numbers, note names or frequencies (`440hz`).
pub struct StdinPitchSource {
    line: String,
}

impl StdinPitchSource {
    pub fn new() -> Self {
        Self {
            line: String::new(),
        }
    }
}

impl Default for StdinPitchSource {
    fn default() -> Self {
        Self::new()
    }
}

impl PitchSource for StdinPitchSource {
    fn next_pitch(&mut self) -> anyhow::Result<Option<u8>> {
        let stdin = std::io::stdin();
        let mut lock = stdin.lock();

        loop {
            self.line.clear();
            if lock.read_line(&mut self.line)? == 0 {
                return Ok(None);
            }

            match parse_pitch(&self.line) {
                Some(pitch) => return Ok(Some(pitch)),
                None if self.line.trim().is_empty() => {}
                None => warn!("Could not read '{}' as a pitch..!", self.line.trim()),
            }
        }
    }
}

impl<I: Iterator<Item = u8> + Send> PitchSource for I {
    fn next_pitch(&mut self) -> anyhow::Result<Option<u8>> {
        Ok(self.next())
    }
}

struct Session {
    stop: Arc<AtomicBool>,
    done_rx: Receiver<()>,
    handle: JoinHandle<()>,
}

/// Runs a [`PitchSource`] on its own thread and forwards every detection, in order, as
/// `HostMsg::Pitch` to the thread that owns the engine.
#[derive(Default)]
pub struct CaptureWorker {
    session: Option<Session>,
}

impl CaptureWorker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.session.is_some()
    }

    /// Starts capturing. A session that is already running is stopped first.
    pub fn start<S: PitchSource + 'static>(
        &mut self,
        mut source: S,
        pitches: Sender<HostMsg>,
    ) -> anyhow::Result<()> {
        if self.is_running() {
            self.stop();
        }

        let stop = Arc::new(AtomicBool::new(false));
        let worker_stop = Arc::clone(&stop);
        let (done_tx, done_rx) = mpsc::channel::<()>();

        let handle = thread::Builder::new()
            .name("siano-capture".into())
            .spawn(move || {
                while !worker_stop.load(Ordering::Acquire) {
                    match source.next_pitch() {
                        Ok(Some(pitch)) => {
                            if worker_stop.load(Ordering::Acquire) {
                                break;
                            }
                            if pitches.send(HostMsg::Pitch(pitch)).is_err() {
                                debug!("Pitch receiver dropped, stopping capture..!");
                                break;
                            }
                        }
                        Ok(None) => {
                            info!("Pitch source exhausted, stopping capture..!");
                            break;
                        }
                        Err(why) => {
                            warn!("Pitch source failed: {:?}", why);
                            break;
                        }
                    }
                }

                let _ = done_tx.send(());
            })?;

        self.session = Some(Session {
            stop,
            done_rx,
            handle,
        });
        debug!("Capture worker started..!");

        Ok(())
    }

    /// Asks the worker to halt and waits up to [`STOP_TIMEOUT`] for it. A worker stuck in a
    /// blocking read is left to finish on its own.
    pub fn stop(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };

        session.stop.store(true, Ordering::Release);

        match session.done_rx.recv_timeout(STOP_TIMEOUT) {
            Ok(()) | Err(RecvTimeoutError::Disconnected) => {
                if session.handle.join().is_err() {
                    warn!("Capture thread panicked..!");
                } else {
                    debug!("Capture thread joined..!");
                }
            }
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    "Capture thread did not stop within {:?}, detaching it..!",
                    STOP_TIMEOUT
                );
            }
        }
    }
}

impl Drop for CaptureWorker {
    fn drop(&mut self) {
        self.stop();
    }
}
