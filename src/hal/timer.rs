//! Hardware tick source.
//!
//! A timer/counter runs in Clear Timer on Compare (CTC) mode and raises one
//! compare-match interrupt per tick. The compare value is derived at build
//! time from the CPU clock, the prescaler and the requested tick period:
//!
//! ```text
//! period = (compare + 1) * prescale / f_cpu
//! ```
//!
//! When the period does not divide the clock evenly the compare value is
//! rounded to the nearest count and the tick runs slightly fast or slow.
//! [`TickConfig::drift_ppm`] reports that error; it is never treated as a
//! failure.

use core::fmt;

/// Longest tick period the accumulator can carry in a single step.
pub const MAX_PERIOD_MS: u16 = 1000;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Prescaler {
    Div1,
    Div8,
    Div32,
    Div64,
    Div128,
    Div256,
    Div1024,
}

impl Prescaler {
    pub const fn divisor(self) -> u32 {
        match self {
            Prescaler::Div1 => 1,
            Prescaler::Div8 => 8,
            Prescaler::Div32 => 32,
            Prescaler::Div64 => 64,
            Prescaler::Div128 => 128,
            Prescaler::Div256 => 256,
            Prescaler::Div1024 => 1024,
        }
    }
}

/// The timer/counter a tick configuration is computed for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Counter {
    /// 8-bit asynchronous Timer/Counter0, compare register `OCR0`.
    Timer0,
    /// 16-bit Timer/Counter1, compare register `OCR1A`.
    Timer1,
}

impl Counter {
    pub const fn max_compare(self) -> u16 {
        match self {
            Counter::Timer0 => 0xFF,
            Counter::Timer1 => 0xFFFF,
        }
    }

    /// Clock-select bits (`CSn2:0`) for `prescaler`, if this counter has it.
    pub const fn clock_select(self, prescaler: Prescaler) -> Option<u8> {
        match self {
            Counter::Timer0 => Some(match prescaler {
                Prescaler::Div1 => 1,
                Prescaler::Div8 => 2,
                Prescaler::Div32 => 3,
                Prescaler::Div64 => 4,
                Prescaler::Div128 => 5,
                Prescaler::Div256 => 6,
                Prescaler::Div1024 => 7,
            }),
            Counter::Timer1 => match prescaler {
                Prescaler::Div1 => Some(1),
                Prescaler::Div8 => Some(2),
                Prescaler::Div64 => Some(3),
                Prescaler::Div256 => Some(4),
                Prescaler::Div1024 => Some(5),
                Prescaler::Div32 | Prescaler::Div128 => None,
            },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ConfigError {
    ZeroPeriod,
    /// More than [`MAX_PERIOD_MS`]; the seconds carry would need several steps.
    PeriodTooLong,
    /// The tick is shorter than two timer clocks.
    CompareUnderflow,
    /// The compare value does not fit the counter.
    CompareOverflow,
    UnsupportedPrescaler,
}

impl ConfigError {
    pub const fn as_str(self) -> &'static str {
        match self {
            ConfigError::ZeroPeriod => "tick period is zero",
            ConfigError::PeriodTooLong => "tick period exceeds 1000 ms",
            ConfigError::CompareUnderflow => "tick period shorter than two timer clocks",
            ConfigError::CompareOverflow => "compare value does not fit the counter",
            ConfigError::UnsupportedPrescaler => "prescaler not available on this counter",
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl ufmt::uDisplay for ConfigError {
    fn fmt<W>(&self, f: &mut ufmt::Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: ufmt::uWrite + ?Sized,
    {
        f.write_str(self.as_str())
    }
}

/// Build-time description of one channel's tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickConfig {
    cpu_hz: u32,
    counter: Counter,
    prescaler: Prescaler,
    period_ms: u16,
    compare: u16,
    clock_select: u8,
}

impl TickConfig {
    pub const fn try_new(
        cpu_hz: u32,
        counter: Counter,
        prescaler: Prescaler,
        period_ms: u16,
    ) -> Result<Self, ConfigError> {
        if period_ms == 0 {
            return Err(ConfigError::ZeroPeriod);
        }
        if period_ms > MAX_PERIOD_MS {
            return Err(ConfigError::PeriodTooLong);
        }
        let clock_select = match counter.clock_select(prescaler) {
            Some(bits) => bits,
            None => return Err(ConfigError::UnsupportedPrescaler),
        };

        // Timer clocks per tick, rounded to the nearest count
        let scale = prescaler.divisor() as u64 * 1000;
        let counts = (cpu_hz as u64 * period_ms as u64 + scale / 2) / scale;
        if counts < 2 {
            return Err(ConfigError::CompareUnderflow);
        }
        if counts - 1 > counter.max_compare() as u64 {
            return Err(ConfigError::CompareOverflow);
        }

        Ok(Self {
            cpu_hz,
            counter,
            prescaler,
            period_ms,
            compare: (counts - 1) as u16,
            clock_select,
        })
    }

    /// Like [`TickConfig::try_new`], but a bad configuration is a build
    /// failure when evaluated in a `const`.
    pub const fn new(cpu_hz: u32, counter: Counter, prescaler: Prescaler, period_ms: u16) -> Self {
        match Self::try_new(cpu_hz, counter, prescaler, period_ms) {
            Ok(config) => config,
            Err(ConfigError::ZeroPeriod) => panic!("tick period is zero"),
            Err(ConfigError::PeriodTooLong) => panic!("tick period exceeds 1000 ms"),
            Err(ConfigError::CompareUnderflow) => {
                panic!("tick period shorter than two timer clocks")
            }
            Err(ConfigError::CompareOverflow) => panic!("compare value does not fit the counter"),
            Err(ConfigError::UnsupportedPrescaler) => {
                panic!("prescaler not available on this counter")
            }
        }
    }

    pub const fn cpu_hz(&self) -> u32 {
        self.cpu_hz
    }

    pub const fn counter(&self) -> Counter {
        self.counter
    }

    pub const fn prescaler(&self) -> Prescaler {
        self.prescaler
    }

    /// Nominal tick period; this is what the accumulator adds per tick.
    pub const fn period_ms(&self) -> u16 {
        self.period_ms
    }

    pub const fn compare(&self) -> u16 {
        self.compare
    }

    pub const fn clock_select(&self) -> u8 {
        self.clock_select
    }

    /// Period the hardware really produces, in nanoseconds.
    pub const fn actual_period_ns(&self) -> u64 {
        (self.compare as u64 + 1) * self.prescaler.divisor() as u64 * 1_000_000_000
            / self.cpu_hz as u64
    }

    /// Signed deviation of the real period from the nominal one in
    /// parts per million. Negative means the tick runs fast.
    pub const fn drift_ppm(&self) -> i32 {
        let nominal = self.period_ms as i64 * 1_000_000;
        let actual = self.actual_period_ns() as i64;
        ((actual - nominal) * 1_000_000 / nominal) as i32
    }
}

/// A timer/counter that can drive a tick channel.
///
/// Implementations only touch their own interrupt enable bit; a channel
/// never needs to block unrelated interrupts to read its state.
pub trait TickSource {
    /// Enter CTC mode with `compare`, clear the counter and drop any
    /// pending compare match. The compare interrupt is left as it was;
    /// callers mask it first and arm it with [`TickSource::restore`].
    fn configure(&self, compare: u16, clock_select: u8);

    /// Disable this source's interrupt. Returns whether it was enabled.
    fn mask(&self) -> bool;

    /// Put the interrupt enable back to what [`TickSource::mask`] returned.
    fn restore(&self, was_enabled: bool);

    /// Run `f` with other interrupts allowed while this source stays masked.
    ///
    /// Only meaningful from the interrupt handler; sources without nested
    /// interrupt support just call `f`.
    fn preemptible<R>(&self, f: impl FnOnce() -> R) -> R {
        f()
    }
}

impl<T: TickSource> TickSource for &T {
    fn configure(&self, compare: u16, clock_select: u8) {
        (**self).configure(compare, clock_select)
    }

    fn mask(&self) -> bool {
        (**self).mask()
    }

    fn restore(&self, was_enabled: bool) {
        (**self).restore(was_enabled)
    }

    fn preemptible<R>(&self, f: impl FnOnce() -> R) -> R {
        (**self).preemptible(f)
    }
}

#[cfg(target_arch = "avr")]
pub use self::avr::{Tc0, Tc1};

#[cfg(target_arch = "avr")]
mod avr {
    use avr_device::atmega128a::{TC0, TC1};

    use super::TickSource;

    const WGM01: u8 = 1 << 3;
    const OCIE0: u8 = 1 << 1;
    const OCF0: u8 = 1 << 1;

    const WGM12: u8 = 1 << 3;
    const OCIE1A: u8 = 1 << 4;
    const OCF1A: u8 = 1 << 4;

    // One TIMSK serves Timer/Counter0 to 2 and is read-modify-written by
    // every channel, including from nested handlers
    fn mask_bit(bit: u8) -> bool {
        avr_device::interrupt::free(|_| unsafe {
            let timsk = &(*TC1::ptr()).timsk;
            let was = timsk.read().bits();
            timsk.write(|w| w.bits(was & !bit));
            was & bit != 0
        })
    }

    fn restore_bit(bit: u8, was_enabled: bool) {
        if was_enabled {
            avr_device::interrupt::free(|_| unsafe {
                (*TC1::ptr()).timsk.modify(|r, w| w.bits(r.bits() | bit));
            });
        }
    }

    fn preemptible<R>(f: impl FnOnce() -> R) -> R {
        // The vector entered with I cleared; RETI sets it again
        unsafe { avr_device::interrupt::enable() };
        let result = f();
        avr_device::interrupt::disable();
        result
    }

    /// Timer/Counter0 (8-bit), vector `TIMER0_COMP`.
    pub struct Tc0 {
        _private: (),
    }

    impl Tc0 {
        pub const fn new() -> Self {
            Self { _private: () }
        }
    }

    impl TickSource for Tc0 {
        fn configure(&self, compare: u16, clock_select: u8) {
            unsafe {
                let tc0 = &*TC0::ptr();
                tc0.tccr0.write(|w| w.bits(0));
                tc0.tcnt0.write(|w| w.bits(0));
                tc0.ocr0.write(|w| w.bits(compare as u8));
                // Flags clear by writing a one
                tc0.tifr.write(|w| w.bits(OCF0));
                tc0.tccr0.write(|w| w.bits(WGM01 | (clock_select & 0x07)));
            }
        }

        fn mask(&self) -> bool {
            mask_bit(OCIE0)
        }

        fn restore(&self, was_enabled: bool) {
            restore_bit(OCIE0, was_enabled)
        }

        fn preemptible<R>(&self, f: impl FnOnce() -> R) -> R {
            preemptible(f)
        }
    }

    /// Timer/Counter1 (16-bit), vector `TIMER1_COMPA`.
    pub struct Tc1 {
        _private: (),
    }

    impl Tc1 {
        pub const fn new() -> Self {
            Self { _private: () }
        }
    }

    impl TickSource for Tc1 {
        fn configure(&self, compare: u16, clock_select: u8) {
            unsafe {
                let tc1 = &*TC1::ptr();
                tc1.tccr1b.write(|w| w.bits(0));
                tc1.tccr1a.write(|w| w.bits(0));
                // 16-bit accesses go through the shared TEMP latch
                avr_device::interrupt::free(|_| {
                    tc1.tcnt1.write(|w| w.bits(0));
                    tc1.ocr1a.write(|w| w.bits(compare));
                });
                tc1.tifr.write(|w| w.bits(OCF1A));
                tc1.tccr1b.write(|w| w.bits(WGM12 | (clock_select & 0x07)));
            }
        }

        fn mask(&self) -> bool {
            mask_bit(OCIE1A)
        }

        fn restore(&self, was_enabled: bool) {
            restore_bit(OCIE1A, was_enabled)
        }

        fn preemptible<R>(&self, f: impl FnOnce() -> R) -> R {
            preemptible(f)
        }
    }
}
