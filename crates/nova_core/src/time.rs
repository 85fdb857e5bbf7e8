use std::time::{Duration, Instant};

const FPS_SAMPLE_COUNT: usize = 60;
const MAX_FRAME_DT: f64 = 0.25;

/// Variable-step frame clock. One frame is measured from one `begin_frame` to
/// the next; `pace()` blocks until the target frame interval has elapsed.
pub struct FrameClock {
    pub target_fps: u32,
    pub dt: f64,
    pub frame_count: u64,
    pub smoothed_fps: f64,
    pub smoothed_frame_time_ms: f64,

    started: Instant,
    last_instant: Instant,
    frame_started: Instant,

    frozen_since: Option<Instant>,
    frozen_total: Duration,

    fps_samples: [f64; FPS_SAMPLE_COUNT],
    fps_sample_index: usize,
}

impl FrameClock {
    pub fn new(target_fps: u32) -> Self {
        let now = Instant::now();
        let nominal = if target_fps > 0 {
            1.0 / target_fps as f64
        } else {
            1.0 / 60.0
        };
        Self {
            target_fps,
            dt: 0.0,
            frame_count: 0,
            smoothed_fps: 1.0 / nominal,
            smoothed_frame_time_ms: nominal * 1000.0,
            started: now,
            last_instant: now,
            frame_started: now,
            frozen_since: None,
            frozen_total: Duration::ZERO,
            fps_samples: [nominal; FPS_SAMPLE_COUNT],
            fps_sample_index: 0,
        }
    }

    pub fn begin_frame(&mut self) {
        self.begin_frame_at(Instant::now());
    }

    pub fn begin_frame_at(&mut self, now: Instant) {
        self.dt = now.saturating_duration_since(self.last_instant).as_secs_f64();
        self.last_instant = now;
        self.frame_started = now;

        if self.dt > MAX_FRAME_DT {
            log::warn!(
                "Frame took {:.1}ms, capping dt to {}ms",
                self.dt * 1000.0,
                MAX_FRAME_DT * 1000.0
            );
            self.dt = MAX_FRAME_DT;
        }
        self.frame_count += 1;

        self.fps_samples[self.fps_sample_index] = self.dt;
        self.fps_sample_index = (self.fps_sample_index + 1) % FPS_SAMPLE_COUNT;
        let avg_dt: f64 = self.fps_samples.iter().sum::<f64>() / FPS_SAMPLE_COUNT as f64;
        self.smoothed_frame_time_ms = avg_dt * 1000.0;
        self.smoothed_fps = if avg_dt > 0.0 { 1.0 / avg_dt } else { 0.0 };
    }

    /// Milliseconds since the clock was created.
    pub fn ticks_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    /// Milliseconds of unfrozen time since the clock was created.
    pub fn in_game_ms(&self) -> u64 {
        self.in_game_ms_at(Instant::now())
    }

    pub fn in_game_ms_at(&self, now: Instant) -> u64 {
        let mut frozen = self.frozen_total;
        if let Some(since) = self.frozen_since {
            frozen += now.saturating_duration_since(since);
        }
        now.saturating_duration_since(self.started)
            .saturating_sub(frozen)
            .as_millis() as u64
    }

    pub fn freeze(&mut self) {
        self.freeze_at(Instant::now());
    }

    pub fn freeze_at(&mut self, now: Instant) {
        if self.frozen_since.is_none() {
            self.frozen_since = Some(now);
        }
    }

    pub fn unfreeze(&mut self) {
        self.unfreeze_at(Instant::now());
    }

    pub fn unfreeze_at(&mut self, now: Instant) {
        if let Some(since) = self.frozen_since.take() {
            self.frozen_total += now.saturating_duration_since(since);
        }
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen_since.is_some()
    }

    pub fn frame_interval(&self) -> Option<Duration> {
        (self.target_fps > 0).then(|| Duration::from_secs_f64(1.0 / self.target_fps as f64))
    }

    pub fn frame_budget_remaining(&self, now: Instant) -> Duration {
        match self.frame_interval() {
            Some(interval) => interval.saturating_sub(now.saturating_duration_since(self.frame_started)),
            None => Duration::ZERO,
        }
    }

    /// Sleep out whatever is left of this frame's interval.
    pub fn pace(&self) {
        let remaining = self.frame_budget_remaining(Instant::now());
        if !remaining.is_zero() {
            std::thread::sleep(remaining);
        }
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(60)
    }
}

/// Ready-gate for rate-limited actions. A cooldown that was never started is
/// ready.
#[derive(Debug, Clone)]
pub struct Cooldown {
    pub duration: Duration,
    started: Option<Instant>,
}

impl Cooldown {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            started: None,
        }
    }

    /// Negative or NaN becomes zero; values too large for a `Duration`
    /// (including infinity) saturate to `Duration::MAX`.
    pub fn from_secs(secs: f32) -> Self {
        let duration = Duration::try_from_secs_f32(secs.max(0.0)).unwrap_or(Duration::MAX);
        Self::new(duration)
    }

    pub fn start(&mut self) {
        self.start_at(Instant::now());
    }

    pub fn start_at(&mut self, now: Instant) {
        self.started = Some(now);
    }

    pub fn check(&self) -> bool {
        self.check_at(Instant::now())
    }

    pub fn check_at(&self, now: Instant) -> bool {
        self.remaining_at(now).is_zero()
    }

    pub fn remaining(&self) -> Duration {
        self.remaining_at(Instant::now())
    }

    pub fn remaining_at(&self, now: Instant) -> Duration {
        match self.started {
            Some(started) => self
                .duration
                .saturating_sub(now.saturating_duration_since(started)),
            None => Duration::ZERO,
        }
    }

    pub fn reset(&mut self) {
        self.started = None;
    }
}
