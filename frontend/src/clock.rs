use gantry_core::platform::Clock;
use sdl2::TimerSubsystem;

/// Millisecond ticks from SDL's timer.
pub struct SdlClock {
    timer: TimerSubsystem,
}

impl SdlClock {
    pub fn new(sdl: &sdl2::Sdl) -> Result<Self, String> {
        Ok(Self { timer: sdl.timer()? })
    }
}

impl Clock for SdlClock {
    fn ticks(&self) -> u32 {
        self.timer.ticks()
    }

    fn delay(&mut self, ms: u32) {
        self.timer.delay(ms);
    }
}
