use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use sdl2::AudioSubsystem;
use sdl2::audio::{AudioCallback, AudioDevice, AudioSpecDesired};

/// Number of samples over which to fade in/out (~5.8 ms at 44.1 kHz).
const FADE_SAMPLES: u32 = 256;

/// Playback starts once this many samples are buffered.
const START_THRESHOLD: usize = 1024;

/// Oldest samples are dropped beyond this, bounding latency when the
/// emulator runs faster than real time.
const MAX_QUEUED: usize = 8192;

/// Shared audio ring buffer. The emulator thread pushes samples in;
/// the SDL audio callback thread pops them out.
type AudioRing = Arc<Mutex<VecDeque<i16>>>;

pub(crate) struct AudioPlayer {
    buffer: AudioRing,
    fade_in_pos: u32,
    fading_out: Arc<AtomicBool>,
    fade_out_pos: u32,
}

impl AudioCallback for AudioPlayer {
    type Channel = i16;
    fn callback(&mut self, out: &mut [i16]) {
        let Ok(mut buf) = self.buffer.lock() else {
            out.fill(0);
            return;
        };
        for sample in out.iter_mut() {
            let raw = buf.pop_front().unwrap_or(0);

            if self.fade_in_pos < FADE_SAMPLES {
                // Ramp up from silence at startup
                let gain = self.fade_in_pos as f32 / FADE_SAMPLES as f32;
                *sample = (raw as f32 * gain) as i16;
                self.fade_in_pos += 1;
            } else if self.fading_out.load(Ordering::Relaxed) {
                // Ramp down to silence at shutdown
                if self.fade_out_pos < FADE_SAMPLES {
                    let gain = 1.0 - (self.fade_out_pos as f32 / FADE_SAMPLES as f32);
                    *sample = (raw as f32 * gain) as i16;
                    self.fade_out_pos += 1;
                } else {
                    *sample = 0;
                }
            } else {
                *sample = raw;
            }
        }
    }
}

/// Mono SDL playback fed one frame at a time.
pub struct AudioOutput {
    device: AudioDevice<AudioPlayer>,
    ring: AudioRing,
    fade_out: Arc<AtomicBool>,
    gain: f32,
    playing: bool,
}

impl AudioOutput {
    /// Open the default playback device at `sample_rate`. `volume` is in
    /// percent. The device stays paused until enough audio is queued.
    pub fn open(
        sdl_audio: &AudioSubsystem,
        sample_rate: u32,
        volume: u32,
    ) -> Result<Self, String> {
        let ring: AudioRing = Arc::new(Mutex::new(VecDeque::with_capacity(MAX_QUEUED)));
        let fade_out = Arc::new(AtomicBool::new(false));

        let desired_spec = AudioSpecDesired {
            freq: Some(sample_rate as i32),
            channels: Some(1),
            samples: Some(512), // ~11.6 ms at 44100 Hz
        };

        let device = sdl_audio.open_playback(None, &desired_spec, |_spec| AudioPlayer {
            buffer: Arc::clone(&ring),
            fade_in_pos: 0,
            fading_out: Arc::clone(&fade_out),
            fade_out_pos: 0,
        })?;

        Ok(Self {
            device,
            ring,
            fade_out,
            gain: volume as f32 / 100.0,
            playing: false,
        })
    }

    pub fn queue(&mut self, samples: &[i16]) {
        let Ok(mut ring) = self.ring.lock() else {
            return;
        };
        ring.extend(samples.iter().map(|&s| scale(s, self.gain)));
        if ring.len() > MAX_QUEUED {
            let excess = ring.len() - MAX_QUEUED;
            ring.drain(..excess);
        }
        let ready = ring.len() >= START_THRESHOLD;
        drop(ring);

        if !self.playing && ready {
            self.device.resume();
            self.playing = true;
        }
    }

    /// Fade out and stop. The device closes when `self` drops.
    pub fn close(self) {
        if self.playing {
            self.fade_out.store(true, Ordering::Relaxed);
            std::thread::sleep(fade_out_duration());
        }
        self.device.pause();
    }
}

fn scale(sample: i16, gain: f32) -> i16 {
    (sample as f32 * gain).clamp(i16::MIN as f32, i16::MAX as f32) as i16
}

/// Duration to sleep after signalling fade-out, allowing the callback
/// to ramp down before the device is paused.
fn fade_out_duration() -> Duration {
    // FADE_SAMPLES at 44100 Hz is about 5.8 ms; round up to 10 ms.
    Duration::from_millis(10)
}
