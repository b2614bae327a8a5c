use core::sync::atomic::{AtomicBool, Ordering};

/// How a channel tells its consumers that a tick happened.
///
/// Called from interrupt context, once per tick, after the accumulator has
/// been updated.
pub trait Dispatch {
    fn dispatch(&self);
}

/// Work done inside the tick interrupt.
///
/// Runs with the channel's own interrupt masked, so it is never re-entered
/// by the same channel, but other interrupts may preempt it. Keep it short
/// and never block.
pub trait TickHandler {
    fn on_tick(&self);
}

/// Invoke a handler synchronously on every tick.
pub struct Callback<H> {
    handler: H,
}

impl<H> Callback<H> {
    pub const fn new(handler: H) -> Self {
        Self { handler }
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }
}

impl<H: TickHandler> Dispatch for Callback<H> {
    #[inline]
    fn dispatch(&self) {
        self.handler.on_tick();
    }
}

/// Changed flag raised on every tick and cleared by the consumer.
///
/// Not a counter: several ticks between two polls are observed as one.
pub struct Flag {
    changed: AtomicBool,
}

impl Flag {
    pub const fn new() -> Self {
        Self {
            changed: AtomicBool::new(false),
        }
    }

    pub fn is_set(&self) -> bool {
        self.changed.load(Ordering::Acquire)
    }

    /// Read and clear the flag.
    ///
    /// A tick landing between the read and the clear is merged into this
    /// observation.
    pub fn take(&self) -> bool {
        if self.changed.load(Ordering::Acquire) {
            self.changed.store(false, Ordering::Release);
            true
        } else {
            false
        }
    }

    pub fn clear(&self) {
        self.changed.store(false, Ordering::Release);
    }
}

impl Default for Flag {
    fn default() -> Self {
        Self::new()
    }
}

impl Dispatch for Flag {
    #[inline]
    fn dispatch(&self) {
        self.changed.store(true, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::cell::Cell;

    struct Counter(Cell<u32>);

    impl TickHandler for Counter {
        fn on_tick(&self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn test_flag_coalesces_ticks() {
        let flag = Flag::new();
        flag.dispatch();
        flag.dispatch();
        assert!(flag.is_set());
        assert!(flag.take());
        assert!(!flag.take());
        assert!(!flag.is_set());
    }

    #[test]
    fn test_flag_clear() {
        let flag = Flag::new();
        flag.dispatch();
        flag.clear();
        assert!(!flag.take());
    }

    #[test]
    fn test_callback_runs_every_tick() {
        let callback = Callback::new(Counter(Cell::new(0)));
        callback.dispatch();
        callback.dispatch();
        callback.dispatch();
        assert_eq!(callback.handler().0.get(), 3);
    }
}
