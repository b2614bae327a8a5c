//! Simulated tick source.
//!
//! Stands in for a timer/counter on the host. The interrupt enable bit and
//! the pending-interrupt latch behave like the hardware ones: a tick raised
//! while masked is latched, and any number of such ticks collapse into a
//! single pending interrupt.

use core::cell::Cell;

use super::timer::TickSource;
use crate::tick::{Channel, Dispatch};

pub struct SimTickSource {
    enabled: Cell<bool>,
    latched: Cell<bool>,
    compare: Cell<Option<u16>>,
    clock_select: Cell<u8>,
    configures: Cell<u32>,
}

impl SimTickSource {
    pub const fn new() -> Self {
        Self {
            enabled: Cell::new(false),
            latched: Cell::new(false),
            compare: Cell::new(None),
            clock_select: Cell::new(0),
            configures: Cell::new(0),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled.get()
    }

    pub fn is_latched(&self) -> bool {
        self.latched.get()
    }

    /// Compare value of the last `configure`, `None` before the first one.
    pub fn compare(&self) -> Option<u16> {
        self.compare.get()
    }

    pub fn clock_select(&self) -> u8 {
        self.clock_select.get()
    }

    pub fn configures(&self) -> u32 {
        self.configures.get()
    }

    fn latch(&self) {
        self.latched.set(true);
    }

    fn take_latched(&self) -> bool {
        self.latched.replace(false)
    }
}

impl Default for SimTickSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TickSource for SimTickSource {
    fn configure(&self, compare: u16, clock_select: u8) {
        self.compare.set(Some(compare));
        self.clock_select.set(clock_select);
        self.configures.set(self.configures.get() + 1);
        self.latched.set(false);
    }

    fn mask(&self) -> bool {
        self.enabled.replace(false)
    }

    fn restore(&self, was_enabled: bool) {
        if was_enabled {
            self.enabled.set(true);
        }
    }
}

impl<D: Dispatch> Channel<SimTickSource, D> {
    /// Raise one compare match. Serviced at once when the interrupt is
    /// enabled, latched otherwise.
    pub fn fire(&self) {
        if self.source().is_enabled() {
            self.service_interrupt();
        } else {
            self.source().latch();
        }
    }

    /// Service a latched interrupt if the source has been unmasked since.
    /// Returns whether one was serviced.
    pub fn settle(&self) -> bool {
        if self.source().is_enabled() && self.source().take_latched() {
            self.service_interrupt();
            true
        } else {
            false
        }
    }

    pub fn run_ticks(&self, ticks: u32) {
        for _ in 0..ticks {
            self.fire();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_masked_until_armed() {
        let source = SimTickSource::new();
        assert!(!source.is_enabled());
        assert_eq!(source.compare(), None);

        source.configure(249, 3);
        assert!(!source.is_enabled());
        assert_eq!(source.compare(), Some(249));
        assert_eq!(source.clock_select(), 3);
        assert_eq!(source.configures(), 1);

        source.restore(true);
        assert!(source.is_enabled());
    }

    #[test]
    fn test_configure_drops_pending_tick() {
        let source = SimTickSource::new();
        source.latch();
        source.configure(249, 3);
        assert!(!source.is_latched());
    }

    #[test]
    fn test_restore_keeps_previous_state() {
        let source = SimTickSource::new();
        source.configure(249, 3);
        source.restore(true);

        let outer = source.mask();
        let inner = source.mask();
        assert!(outer);
        assert!(!inner);

        source.restore(inner);
        assert!(!source.is_enabled());
        source.restore(outer);
        assert!(source.is_enabled());
    }

    #[test]
    fn test_latch_is_a_single_flag() {
        let source = SimTickSource::new();
        source.latch();
        source.latch();
        assert!(source.take_latched());
        assert!(!source.take_latched());
    }
}
