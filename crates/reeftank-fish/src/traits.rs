//! Hooks the simulation calls out through
//!
//! The world never talks to a UI directly. Anything that wants to react to
//! litters (a generation counter, a toast popup) implements [`TankEvents`]
//! and is handed to [`crate::World::with_events`].

/// Notifications raised while the tank updates
pub trait TankEvents {
    /// A litter hatched and the tank gained a generation
    fn generation_advanced(&mut self) {}

    /// Short user-facing message
    fn toast(&mut self, _message: &str) {}
}

/// Default sink: forwards everything to the `log` facade
#[derive(Debug, Default, Clone, Copy)]
pub struct LogEvents;

impl TankEvents for LogEvents {
    fn generation_advanced(&mut self) {
        log::debug!("Generation advanced");
    }

    fn toast(&mut self, message: &str) {
        log::info!("{}", message);
    }
}

/// Discards every event
#[derive(Debug, Default, Clone, Copy)]
pub struct NoEvents;

impl TankEvents for NoEvents {}
