use core::cell::Cell;

use super::dispatch::TickHandler;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mode {
    OneShot,
    Periodic,
}

/// Counts ticks down to zero.
///
/// Interior mutability lets it sit inside a [`TickHandler`] and be driven
/// from the interrupt. A length of zero never fires.
pub struct Countdown {
    remaining: Cell<u32>,
    length: u32,
    mode: Mode,
}

impl Countdown {
    /// Fires once, on tick `ticks`.
    pub const fn one_shot(ticks: u32) -> Self {
        Self {
            remaining: Cell::new(ticks),
            length: ticks,
            mode: Mode::OneShot,
        }
    }

    /// Fires on every `ticks`-th tick.
    pub const fn periodic(ticks: u32) -> Self {
        Self {
            remaining: Cell::new(ticks),
            length: ticks,
            mode: Mode::Periodic,
        }
    }

    /// Count one tick. Returns true on the tick that reaches zero.
    pub fn tick(&self) -> bool {
        let remaining = self.remaining.get();
        if remaining == 0 {
            return false;
        }
        if remaining > 1 {
            self.remaining.set(remaining - 1);
            return false;
        }
        self.remaining.set(match self.mode {
            Mode::OneShot => 0,
            Mode::Periodic => self.length,
        });
        true
    }

    pub fn restart(&self) {
        self.remaining.set(self.length);
    }

    pub fn remaining(&self) -> u32 {
        self.remaining.get()
    }

    pub fn is_expired(&self) -> bool {
        self.remaining.get() == 0
    }
}

/// Runs `action` from the tick interrupt whenever its countdown fires.
pub struct CountdownHandler<F> {
    countdown: Countdown,
    action: F,
}

impl<F> CountdownHandler<F> {
    pub const fn new(countdown: Countdown, action: F) -> Self {
        Self { countdown, action }
    }

    pub fn countdown(&self) -> &Countdown {
        &self.countdown
    }
}

impl<F: Fn()> TickHandler for CountdownHandler<F> {
    fn on_tick(&self) {
        if self.countdown.tick() {
            (self.action)();
        }
    }
}
