/// Optional hook into the main loop, e.g. a debugger.
///
/// When present it is attached before the first frame, polled once per
/// iteration ahead of the UI commands, and detached after the last one.
pub trait SessionObserver {
    fn attach(&mut self);

    fn detach(&mut self);

    fn poll(&mut self);

    /// The observer wants the session to end.
    fn check_exit(&self) -> bool;

    /// The observer wants emulation paused.
    fn check_pause(&self) -> bool;

    /// The machine was reset or had its state replaced.
    fn reset(&mut self);
}
