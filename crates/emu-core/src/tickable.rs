//! Trait for components that can be advanced by clock ticks.

use crate::Ticks;

/// A component that can be advanced by clock ticks.
///
/// What one tick means is up to the component: a pin-level CPU model treats
/// it as one half clock period, a whole-instruction model as one T-state.
pub trait Tickable {
    /// Advance the component by one tick.
    fn tick(&mut self);

    /// Advance the component by multiple ticks.
    ///
    /// Components may override this, but must produce the same state as
    /// calling `tick()` `count` times.
    fn tick_n(&mut self, count: Ticks) {
        for _ in 0..count.get() {
            self.tick();
        }
    }

    /// Tick until `done` holds after a tick. Always ticks at least once.
    /// Returns the ticks taken.
    fn tick_until(&mut self, mut done: impl FnMut(&Self) -> bool) -> Ticks
    where
        Self: Sized,
    {
        let mut taken = Ticks::ZERO;
        loop {
            self.tick();
            taken += Ticks::new(1);
            if done(self) {
                return taken;
            }
        }
    }
}
