use crate::player::HostMsg;
use anyhow::bail;
use log::{debug, info, warn};
use spin_sleep::{SpinSleeper, SpinStrategy};
use std::sync::mpsc::{self, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

enum ControlMsg {
    Stop,
}

/// Turns frame timestamps into elapsed seconds. The first frame after a (re)start has no
/// previous timestamp and reports zero.
#[derive(Debug, Default)]
pub struct FrameClock {
    last: Option<Instant>,
}

impl FrameClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick(&mut self, now: Instant) -> f64 {
        let dt = match self.last {
            Some(last) => now.saturating_duration_since(last).as_secs_f64(),
            None => 0.0,
        };
        self.last = Some(now);
        dt
    }

    pub fn reset(&mut self) {
        self.last = None;
    }
}

/// Fires `HostMsg::Frame(dt)` at a fixed refresh rate from a background thread.
#[derive(Debug, Default)]
pub struct ClockDriver {
    control_tx: Option<Sender<ControlMsg>>,
    worker_handle: Option<JoinHandle<()>>,
}

impl ClockDriver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_running(&self) -> bool {
        self.worker_handle.is_some()
    }

    pub fn start(&mut self, frame_rate: f64, frames: Sender<HostMsg>) -> anyhow::Result<()> {
        if !(frame_rate.is_finite() && frame_rate > 0.0) {
            bail!("Frame rate must be a positive number, got {}..!", frame_rate);
        }

        if self.is_running() {
            self.stop();
        }

        let (tx, rx) = mpsc::channel::<ControlMsg>();
        let period = Duration::from_secs_f64(1.0 / frame_rate);

        let handle = thread::Builder::new()
            .name("siano-clock".into())
            .spawn(move || {
                let sleeper =
                    SpinSleeper::new(100_000).with_spin_strategy(SpinStrategy::YieldThread);
                let mut clock = FrameClock::new();
                let mut next_frame = Instant::now();

                loop {
                    if let Ok(ControlMsg::Stop) = rx.try_recv() {
                        debug!("Clock driver stopped via control message..!");
                        return;
                    }

                    let dt = clock.tick(Instant::now());
                    if frames.send(HostMsg::Frame(dt)).is_err() {
                        debug!("Frame receiver dropped, stopping clock driver..!");
                        return;
                    }

                    next_frame += period;
                    let now = Instant::now();
                    if next_frame > now {
                        sleeper.sleep(next_frame - now);
                    } else {
                        // fell behind, don't try to catch up with a burst of frames
                        next_frame = now;
                    }
                }
            })?;

        self.control_tx = Some(tx);
        self.worker_handle = Some(handle);
        info!("Clock driver running at {:.1} frames per second..!", frame_rate);

        Ok(())
    }

    pub fn stop(&mut self) {
        if let Some(tx) = self.control_tx.take() {
            let _ = tx.send(ControlMsg::Stop);
        }

        if let Some(handle) = self.worker_handle.take() {
            if handle.join().is_err() {
                warn!("Clock driver thread panicked..!");
            } else {
                debug!("Clock driver thread joined..!");
            }
        }
    }
}

impl Drop for ClockDriver {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn first_frame_is_zero() {
        let mut clock = FrameClock::new();
        let t0 = Instant::now();

        assert_eq!(clock.tick(t0), 0.0);
        let dt = clock.tick(t0 + Duration::from_millis(16));
        assert!((dt - 0.016).abs() < 1e-9);

        clock.reset();
        assert_eq!(clock.tick(t0 + Duration::from_secs(10)), 0.0);
    }

    #[test]
    fn clock_goes_backwards_as_zero() {
        let mut clock = FrameClock::new();
        let t0 = Instant::now() + Duration::from_secs(1);

        clock.tick(t0);
        assert_eq!(clock.tick(t0 - Duration::from_millis(500)), 0.0);
    }

    #[test]
    fn driver_emits_frames() {
        env_logger::try_init().unwrap_or(());

        let (tx, rx) = mpsc::channel();
        let mut driver = ClockDriver::new();
        driver.start(200.0, tx).expect("driver should start");

        let mut frames = Vec::new();
        while frames.len() < 5 {
            match rx.recv_timeout(Duration::from_secs(2)) {
                Ok(HostMsg::Frame(dt)) => frames.push(dt),
                Ok(_) => {}
                Err(e) => panic!("No frame received: {:?}", e),
            }
        }
        driver.stop();
        assert!(!driver.is_running());

        assert_eq!(frames[0], 0.0);
        assert!(frames.iter().all(|dt| *dt >= 0.0));
    }

    #[test]
    fn rejects_bad_frame_rate() {
        let (tx, _rx) = mpsc::channel();
        let mut driver = ClockDriver::new();
        assert!(driver.start(0.0, tx.clone()).is_err());
        assert!(driver.start(f64::NAN, tx).is_err());
    }
}
