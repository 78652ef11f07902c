// Playback: advance the window start on a cadence until the data runs out

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info};

/// The four user-settable playback/window parameters.
///
/// Each value has a single slot; manual edits and playback steps both write
/// the same slot and the last write wins.
#[derive(Debug, Default)]
pub struct WindowControls {
    window_start: AtomicUsize,
    window_size: AtomicUsize,
    animation_time_ms: AtomicU64,
    animation_increment: AtomicUsize,
}

impl WindowControls {
    pub fn new(window_start: usize, window_size: usize, animation_time: Duration, animation_increment: usize) -> Self {
        Self {
            window_start: AtomicUsize::new(window_start),
            window_size: AtomicUsize::new(window_size),
            animation_time_ms: AtomicU64::new(animation_time.as_millis() as u64),
            animation_increment: AtomicUsize::new(animation_increment),
        }
    }

    pub fn window_start(&self) -> usize {
        self.window_start.load(Ordering::Acquire)
    }

    pub fn set_window_start(&self, start: usize) {
        self.window_start.store(start, Ordering::Release);
    }

    pub fn window_size(&self) -> usize {
        self.window_size.load(Ordering::Acquire)
    }

    pub fn set_window_size(&self, size: usize) {
        self.window_size.store(size, Ordering::Release);
    }

    pub fn animation_time(&self) -> Duration {
        Duration::from_millis(self.animation_time_ms.load(Ordering::Acquire))
    }

    pub fn set_animation_time(&self, cadence: Duration) {
        self.animation_time_ms.store(cadence.as_millis() as u64, Ordering::Release);
    }

    pub fn animation_increment(&self) -> usize {
        self.animation_increment.load(Ordering::Acquire)
    }

    pub fn set_animation_increment(&self, step: usize) {
        self.animation_increment.store(step, Ordering::Release);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Cadence not yet elapsed.
    Idle,
    Advanced(usize),
    /// The next window would reach the end; start was pinned to the total.
    Clamped(usize),
}

/// The polling step rule, driven with explicit instants.
#[derive(Debug, Default)]
pub struct PlaybackClock {
    last_tick: Option<Instant>,
}

impl PlaybackClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tick(&mut self, now: Instant, controls: &WindowControls, total_points: usize) -> TickOutcome {
        if let Some(last) = self.last_tick {
            if now.saturating_duration_since(last) < controls.animation_time() {
                return TickOutcome::Idle;
            }
        }

        let next = controls.window_start().saturating_add(controls.animation_increment());
        let outcome = if next.saturating_add(controls.window_size()) >= total_points {
            controls.set_window_start(total_points);
            TickOutcome::Clamped(total_points)
        } else {
            controls.set_window_start(next);
            TickOutcome::Advanced(next)
        };

        self.last_tick = Some(now);
        outcome
    }
}

/// Spawns the playback loop on the current tokio runtime.
///
/// `total_points` is sampled on every tick so a file still being ingested
/// keeps extending the playable range.
pub fn start_playback<F>(controls: Arc<WindowControls>, total_points: F, frame_interval: Duration) -> PlaybackHandle
where
    F: Fn() -> usize + Send + 'static,
{
    let active = Arc::new(Mutex::new(true));
    let flag = active.clone();

    let task = tokio::spawn(async move {
        let mut interval = tokio::time::interval(frame_interval.max(Duration::from_millis(1)));
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut clock = PlaybackClock::new();
        let mut clamped = false;

        loop {
            interval.tick().await;

            // Stop takes this lock too, so no step can land after it returns.
            let guard = flag.lock().unwrap_or_else(PoisonError::into_inner);
            if !*guard {
                break;
            }
            match clock.tick(Instant::now(), &controls, total_points()) {
                TickOutcome::Idle => {}
                TickOutcome::Advanced(start) => {
                    clamped = false;
                    debug!("Playback advanced to {}", start);
                }
                TickOutcome::Clamped(start) => {
                    if !clamped {
                        info!("Playback reached end of data at {}", start);
                    }
                    clamped = true;
                }
            }
        }
    });

    info!("Playback started");
    PlaybackHandle { active, task }
}

#[derive(Debug)]
pub struct PlaybackHandle {
    active: Arc<Mutex<bool>>,
    task: JoinHandle<()>,
}

impl PlaybackHandle {
    pub fn is_active(&self) -> bool {
        *self.active.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Cancels playback. Once this returns the window start is no longer
    /// written by the loop.
    pub fn stop(&self) {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if *active {
            *active = false;
            info!("Playback stopped");
        }
        drop(active);
        self.task.abort();
    }
}

impl Drop for PlaybackHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
