use core::cell::{Cell, UnsafeCell};
use core::ptr;

use super::dispatch::{Callback, Dispatch, Flag};
use super::state::{TickState, Timestamp};
use crate::hal::timer::{TickConfig, TickSource};

/// One independent tick service bound to one timer/counter.
///
/// Meant to live in a `static` so the interrupt vector can reach it:
///
/// ```ignore
/// static PRIMARY: Channel<Tc1, Flag> =
///     Channel::new(Tc1::new(), config::PRIMARY_TICK, Flag::new());
///
/// #[avr_device::interrupt(atmega128a)]
/// fn TIMER1_COMPA() {
///     PRIMARY.service_interrupt();
/// }
/// ```
///
/// The accumulator is written only by [`Channel::service_interrupt`] and
/// read by everyone else under [`Channel::lock`], which masks this
/// channel's interrupt and nothing else.
pub struct Channel<S, D> {
    source: S,
    config: TickConfig,
    dispatch: D,
    state: UnsafeCell<TickState>,
    nesting: Cell<u8>,
}

// SAFETY: single core. `state` is only written by `service_interrupt`,
// which runs with interrupts disabled, and only read while this channel's
// interrupt is masked. `nesting` is balanced by every guard before a
// preempting context returns.
unsafe impl<S: Send, D: Send> Sync for Channel<S, D> {}

impl<S: TickSource, D: Dispatch> Channel<S, D> {
    pub const fn new(source: S, config: TickConfig, dispatch: D) -> Self {
        Self {
            source,
            config,
            dispatch,
            state: UnsafeCell::new(TickState::ZERO),
            nesting: Cell::new(0),
        }
    }

    /// Zero the accumulator and start the timer.
    ///
    /// The timer is reprogrammed and the accumulator cleared with the
    /// interrupt masked, so a compare match pending from before the call is
    /// dropped and the first tick is a full period away. Calling it again
    /// restarts time from zero; consumers comparing timestamps across the
    /// restart see time go backwards. Not to be called under [`Channel::lock`].
    pub fn init(&self) {
        debug_assert_eq!(self.nesting_depth(), 0);
        self.source.mask();
        self.source
            .configure(self.config.compare(), self.config.clock_select());
        unsafe { ptr::write_volatile(self.state.get(), TickState::ZERO) };
        self.source.restore(true);
    }

    /// Body of the compare-match interrupt.
    ///
    /// Must be entered with interrupts disabled, as the vector is. The
    /// accumulator update completes before anything else can run; the
    /// dispatch then runs with only this channel masked.
    pub fn service_interrupt(&self) {
        let state = self.state.get();
        unsafe {
            let mut next = ptr::read_volatile(state);
            next.advance(self.config.period_ms());
            ptr::write_volatile(state, next);
        }

        let _guard = self.lock();
        self.source.preemptible(|| self.dispatch.dispatch());
    }

    /// Mask this channel's interrupt until the guard is dropped.
    ///
    /// Guards nest; each one restores the enable state it found.
    pub fn lock(&self) -> MaskGuard<'_, S> {
        let was_enabled = self.source.mask();
        self.nesting.set(self.nesting.get() + 1);
        MaskGuard {
            source: &self.source,
            nesting: &self.nesting,
            was_enabled,
        }
    }

    /// Number of live guards on this channel.
    pub fn nesting_depth(&self) -> u8 {
        self.nesting.get()
    }

    pub fn now(&self) -> Timestamp {
        let _guard = self.lock();
        unsafe { ptr::read_volatile(self.state.get()) }.timestamp()
    }

    pub fn seconds(&self) -> u32 {
        let _guard = self.lock();
        unsafe { ptr::read_volatile(self.state.get()) }.seconds()
    }

    pub fn milliseconds(&self) -> u16 {
        let _guard = self.lock();
        unsafe { ptr::read_volatile(self.state.get()) }.millis()
    }

    pub fn config(&self) -> &TickConfig {
        &self.config
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Read the accumulator without masking, as an unprotected reader would.
    #[cfg(test)]
    pub(crate) fn peek_unmasked(&self) -> TickState {
        unsafe { ptr::read_volatile(self.state.get()) }
    }
}

impl<S: TickSource> Channel<S, Flag> {
    /// The changed flag raised on every tick.
    pub fn changed(&self) -> &Flag {
        &self.dispatch
    }
}

impl<S: TickSource, H> Channel<S, Callback<H>> {
    /// The handler run on every tick. State it shares with the main loop
    /// must only be touched from there under [`Channel::lock`].
    pub fn handler(&self) -> &H {
        self.dispatch.handler()
    }
}

/// Critical section scoped to a single channel's interrupt.
pub struct MaskGuard<'a, S: TickSource> {
    source: &'a S,
    nesting: &'a Cell<u8>,
    was_enabled: bool,
}

impl<S: TickSource> Drop for MaskGuard<'_, S> {
    fn drop(&mut self) {
        self.nesting.set(self.nesting.get() - 1);
        self.source.restore(self.was_enabled);
    }
}
