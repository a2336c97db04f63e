use std::fmt;
use std::str::FromStr;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};

use crate::config::{
    DEFAULT_SPEED_INDEX, FRAME_SKIP_2_BELOW_MS, FRAME_SKIP_4_BELOW_MS, PLAYBACK_SPEEDS,
};

/// Shortest tick interval the controller will schedule.
const MIN_TICK_INTERVAL: Duration = Duration::from_millis(1);

/// One of the discrete speeds offered by the speed bar.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct PlaybackSpeed(usize);

impl PlaybackSpeed {
    pub fn from_index(index: usize) -> Option<Self> {
        (index < PLAYBACK_SPEEDS.len()).then_some(Self(index))
    }

    pub fn index(self) -> usize {
        self.0
    }

    pub fn multiplier(self) -> f64 {
        PLAYBACK_SPEEDS[self.0] as f64
    }

    pub fn all() -> impl Iterator<Item = Self> {
        (0..PLAYBACK_SPEEDS.len()).map(Self)
    }
}

impl Default for PlaybackSpeed {
    fn default() -> Self {
        Self(DEFAULT_SPEED_INDEX)
    }
}

impl fmt::Display for PlaybackSpeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "x{}", PLAYBACK_SPEEDS[self.0])
    }
}

impl TryFrom<f64> for PlaybackSpeed {
    type Error = String;

    fn try_from(multiplier: f64) -> Result<Self, Self::Error> {
        PLAYBACK_SPEEDS
            .iter()
            .position(|&s| (s as f64 - multiplier).abs() < 1e-6)
            .map(Self)
            .ok_or_else(|| format!("unsupported playback speed {multiplier}, expected one of {PLAYBACK_SPEEDS:?}"))
    }
}

impl From<PlaybackSpeed> for f64 {
    fn from(speed: PlaybackSpeed) -> Self {
        speed.multiplier()
    }
}

impl FromStr for PlaybackSpeed {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim().trim_start_matches(['x', 'X']);
        let multiplier: f64 = trimmed
            .parse()
            .map_err(|_| format!("invalid playback speed {s:?}"))?;
        Self::try_from(multiplier)
    }
}

/// How often the autoplay timer fires and how many frames each tick advances.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickPlan {
    pub interval: Duration,
    pub frame_skip: usize,
}

/// Picks the frame skip that keeps ticks at or below roughly 30 Hz and the
/// matching interval for `time_step` seconds per frame at `speed`.
pub fn tick_plan(time_step: f64, speed: PlaybackSpeed) -> TickPlan {
    let time_step = if time_step.is_finite() { time_step.max(0.0) } else { 0.0 };
    let unskipped_ms = time_step * 1000.0 / speed.multiplier();
    let frame_skip = if unskipped_ms < FRAME_SKIP_4_BELOW_MS {
        4
    } else if unskipped_ms < FRAME_SKIP_2_BELOW_MS {
        2
    } else {
        1
    };
    let interval = Duration::try_from_secs_f64(time_step * frame_skip as f64 / speed.multiplier())
        .unwrap_or(MIN_TICK_INTERVAL)
        .max(MIN_TICK_INTERVAL);
    TickPlan { interval, frame_skip }
}

/// Whether the autoplay timer is running.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlaybackState {
    Stopped,
    Playing,
}

/// A move of the time index. Derived lists must be refreshed for `to`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameChange {
    pub from: usize,
    pub to: usize,
}

#[derive(Clone, Copy, Debug)]
struct Timer {
    plan: TickPlan,
    next_due: Instant,
}

/// Owns the time index over a loaded history and the single autoplay timer.
///
/// The timer is driven by [`PlaybackController::poll`]; it exists exactly while
/// the controller is playing and is only ever replaced through `reschedule`.
#[derive(Clone, Debug)]
pub struct PlaybackController {
    index: usize,
    total_frames: Option<usize>,
    time_step: f64,
    speed: PlaybackSpeed,
    timer: Option<Timer>,
}

impl Default for PlaybackController {
    fn default() -> Self {
        Self::new()
    }
}

impl PlaybackController {
    pub fn new() -> Self {
        Self {
            index: 0,
            total_frames: None,
            time_step: 0.0,
            speed: PlaybackSpeed::default(),
            timer: None,
        }
    }

    /// Attaches a freshly loaded history: index 0, stopped, any pending timer cancelled.
    pub fn load(&mut self, total_frames: usize, time_step: f64) {
        self.cancel_timer();
        self.index = 0;
        self.total_frames = Some(total_frames);
        self.time_step = time_step;
    }

    /// Detaches the history (e.g. the current configuration is shown instead).
    pub fn unload(&mut self) {
        self.cancel_timer();
        self.index = 0;
        self.total_frames = None;
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// Last valid index, `0` when nothing is loaded.
    pub fn total_frames(&self) -> usize {
        self.total_frames.unwrap_or(0)
    }

    pub fn is_loaded(&self) -> bool {
        self.total_frames.is_some()
    }

    pub fn speed(&self) -> PlaybackSpeed {
        self.speed
    }

    pub fn state(&self) -> PlaybackState {
        if self.timer.is_some() {
            PlaybackState::Playing
        } else {
            PlaybackState::Stopped
        }
    }

    pub fn is_playing(&self) -> bool {
        self.timer.is_some()
    }

    /// Current tick plan, whether or not the timer runs.
    pub fn plan(&self) -> TickPlan {
        tick_plan(self.time_step, self.speed)
    }

    /// When the next tick is due, if playing.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timer.map(|t| t.next_due)
    }

    fn cancel_timer(&mut self) {
        if self.timer.take().is_some() {
            log::debug!("Playback timer cancelled at frame {}", self.index);
        }
    }

    /// The only path that installs a timer. Any previous timer is dropped first.
    fn reschedule(&mut self, now: Instant) {
        self.cancel_timer();
        let plan = self.plan();
        log::debug!(
            "Playback timer every {:?}, {} frame(s) per tick, from frame {}",
            plan.interval,
            plan.frame_skip,
            self.index
        );
        self.timer = Some(Timer {
            plan,
            next_due: now + plan.interval,
        });
    }

    /// Starts autoplay. Does nothing without a history or when already playing.
    pub fn play(&mut self, now: Instant) {
        if !self.is_loaded() || self.is_playing() {
            return;
        }
        self.reschedule(now);
    }

    pub fn pause(&mut self) {
        self.cancel_timer();
    }

    pub fn toggle(&mut self, now: Instant) {
        if self.is_playing() {
            self.pause();
        } else {
            self.play(now);
        }
    }

    /// Moves one frame forward (`1`) or back (`-1`). Only while stopped, and only to
    /// an index inside `[0, total_frames]`; anything else is ignored.
    pub fn step(&mut self, delta: isize) -> Option<FrameChange> {
        let total = self.total_frames?;
        if self.is_playing() || delta.unsigned_abs() != 1 {
            return None;
        }
        let target = self.index.checked_add_signed(delta)?;
        if target > total {
            return None;
        }
        let from = self.index;
        self.index = target;
        Some(FrameChange { from, to: target })
    }

    /// Jumps to `index`, clamped into range. While playing, the timer restarts from
    /// the new position at the current speed.
    pub fn scrub(&mut self, index: usize, now: Instant) -> Option<FrameChange> {
        let total = self.total_frames?;
        let from = self.index;
        self.index = index.min(total);
        if self.is_playing() {
            self.reschedule(now);
        }
        Some(FrameChange {
            from,
            to: self.index,
        })
    }

    /// Changes the speed; a running timer is restarted with the new interval.
    pub fn set_speed(&mut self, speed: PlaybackSpeed, now: Instant) {
        self.speed = speed;
        if self.is_playing() {
            self.reschedule(now);
        }
    }

    /// Runs the timer: if a tick is due at `now`, advances by the frame skip or
    /// stops when that would pass the last frame.
    pub fn poll(&mut self, now: Instant) -> Option<FrameChange> {
        let timer = self.timer?;
        if now < timer.next_due {
            return None;
        }
        let total = self.total_frames?;
        let skip = timer.plan.frame_skip;

        if self.index + skip > total {
            log::debug!("Playback reached the end at frame {}", self.index);
            self.cancel_timer();
            return None;
        }

        let from = self.index;
        self.index += skip;

        // a late poll drops the missed ticks instead of bursting through them
        let mut next_due = timer.next_due + timer.plan.interval;
        if next_due <= now {
            next_due = now + timer.plan.interval;
        }
        self.timer = Some(Timer { next_due, ..timer });

        Some(FrameChange {
            from,
            to: self.index,
        })
    }
}
