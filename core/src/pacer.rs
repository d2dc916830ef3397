//! Frame pacing and frame rate measurement.
//!
//! Pacing targets a fixed 60 Hz cadence measured from an epoch. When a frame
//! finishes after its target (a slow frame, or resuming from a long pause),
//! the epoch restarts at the current tick. Lost time is never repaid, so the
//! loop cannot run a burst of unthrottled frames to catch up.

/// Target frame rate in Hz.
pub const FRAME_RATE: u32 = 60;

/// How often the FPS reading refreshes, in milliseconds.
pub const FPS_SAMPLE_MS: u32 = 1000;

/// What the loop should do after a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pace {
    /// Sleep this many milliseconds to reach the frame's target time.
    Wait(u32),
    /// The target was already missed; the epoch restarted at the current tick.
    Resync,
}

/// Tick bookkeeping for pacing and FPS sampling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameClock {
    epoch: u32,
    frames_since_epoch: u32,
    fps_sample_start: u32,
    frames_since_sample: u32,
}

impl FrameClock {
    pub fn new(now: u32) -> Self {
        Self {
            epoch: now,
            frames_since_epoch: 0,
            fps_sample_start: now,
            frames_since_sample: 0,
        }
    }

    pub fn epoch(&self) -> u32 {
        self.epoch
    }

    pub fn frames_since_epoch(&self) -> u32 {
        self.frames_since_epoch
    }

    /// Target tick of frame `index` counted from the epoch.
    fn target(&self, index: u32) -> u32 {
        let offset = (index as f32 * 1000.0 / FRAME_RATE as f32) as u32;
        self.epoch.wrapping_add(offset)
    }

    /// Account for one more frame and decide how long to wait for it.
    pub fn pace(&mut self, now: u32) -> Pace {
        self.frames_since_epoch += 1;
        let target = self.target(self.frames_since_epoch);

        // Signed distance so tick counter wraparound is harmless.
        let ahead = target.wrapping_sub(now) as i32;
        if ahead >= 0 {
            Pace::Wait(ahead as u32)
        } else {
            self.epoch = now;
            self.frames_since_epoch = 0;
            Pace::Resync
        }
    }

    /// Count a frame toward the FPS reading. Returns a new reading once at
    /// least [`FPS_SAMPLE_MS`] passed since the previous one.
    pub fn sample_fps(&mut self, now: u32) -> Option<f32> {
        self.frames_since_sample += 1;
        let elapsed = now.wrapping_sub(self.fps_sample_start);
        if elapsed < FPS_SAMPLE_MS {
            return None;
        }

        let fps = self.frames_since_sample as f32 * 1000.0 / elapsed as f32;
        self.fps_sample_start = now;
        self.frames_since_sample = 0;
        Some(fps)
    }
}
