use core::fmt;

use crate::hal::timer::MAX_PERIOD_MS;

/// Seconds and milliseconds accumulated by one channel.
///
/// `seconds` is 32 bits wide and wraps after about 136 years of uptime.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickState {
    seconds: u32,
    millis: u16,
}

impl TickState {
    pub const ZERO: Self = Self {
        seconds: 0,
        millis: 0,
    };

    pub const fn seconds(&self) -> u32 {
        self.seconds
    }

    /// Always below 1000.
    pub const fn millis(&self) -> u16 {
        self.millis
    }

    /// Account for one tick of `period_ms`.
    ///
    /// Carries at most once into `seconds`, hence the period limit.
    pub fn advance(&mut self, period_ms: u16) {
        debug_assert!(period_ms <= MAX_PERIOD_MS);
        self.millis += period_ms;
        if self.millis >= 1000 {
            self.seconds = self.seconds.wrapping_add(1);
            self.millis -= 1000;
        }
        debug_assert!(self.millis < 1000);
    }

    pub const fn timestamp(&self) -> Timestamp {
        Timestamp {
            seconds: self.seconds,
            millis: self.millis,
        }
    }
}

/// A consistent (seconds, milliseconds) reading of a channel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp {
    seconds: u32,
    millis: u16,
}

impl Timestamp {
    pub const fn new(seconds: u32, millis: u16) -> Self {
        Self { seconds, millis }
    }

    pub const fn seconds(&self) -> u32 {
        self.seconds
    }

    pub const fn millis(&self) -> u16 {
        self.millis
    }

    pub const fn as_millis(&self) -> u64 {
        self.seconds as u64 * 1000 + self.millis as u64
    }

    /// Milliseconds from `earlier` to `self`, correct across one wrap of
    /// the seconds counter. `earlier` must not be later than `self`.
    pub fn elapsed_since(&self, earlier: Timestamp) -> u32 {
        let seconds = self.seconds.wrapping_sub(earlier.seconds) as u64;
        (seconds * 1000 + self.millis as u64).wrapping_sub(earlier.millis as u64) as u32
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:03}", self.seconds, self.millis)
    }
}

impl ufmt::uDisplay for Timestamp {
    fn fmt<W>(&self, f: &mut ufmt::Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: ufmt::uWrite + ?Sized,
    {
        // ufmt has no width specifier
        ufmt::uwrite!(f, "{}.", self.seconds)?;
        if self.millis < 100 {
            f.write_str("0")?;
        }
        if self.millis < 10 {
            f.write_str("0")?;
        }
        ufmt::uwrite!(f, "{}", self.millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use proptest::prelude::*;

    struct Sink(String);

    impl ufmt::uWrite for Sink {
        type Error = Infallible;

        fn write_str(&mut self, s: &str) -> Result<(), Infallible> {
            self.0.push_str(s);
            Ok(())
        }
    }

    fn after(ticks: u32, period_ms: u16) -> TickState {
        let mut state = TickState::ZERO;
        for _ in 0..ticks {
            state.advance(period_ms);
        }
        state
    }

    #[test]
    fn test_1500_ticks_of_1ms() {
        let state = after(1500, 1);
        assert_eq!(state.seconds(), 1);
        assert_eq!(state.millis(), 500);
    }

    #[test]
    fn test_100_ticks_of_10ms() {
        let state = after(100, 10);
        assert_eq!(state.seconds(), 1);
        assert_eq!(state.millis(), 0);
    }

    #[test]
    fn test_full_second_period() {
        let state = after(3, 1000);
        assert_eq!(state.seconds(), 3);
        assert_eq!(state.millis(), 0);
    }

    #[test]
    fn test_seconds_wrap() {
        let mut state = TickState {
            seconds: u32::MAX,
            millis: 999,
        };
        state.advance(1);
        assert_eq!(state.seconds(), 0);
        assert_eq!(state.millis(), 0);
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic]
    fn test_period_over_one_second_is_rejected() {
        let mut state = TickState::ZERO;
        state.advance(1001);
    }

    #[test]
    fn test_elapsed_since() {
        let start = Timestamp::new(4, 900);
        let end = Timestamp::new(6, 150);
        assert_eq!(end.elapsed_since(start), 1250);
        assert_eq!(start.elapsed_since(start), 0);

        let before_wrap = Timestamp::new(u32::MAX, 500);
        let after_wrap = Timestamp::new(0, 250);
        assert_eq!(after_wrap.elapsed_since(before_wrap), 750);
    }

    #[test]
    fn test_display_pads_millis() {
        let mut sink = Sink(String::new());
        ufmt::uwrite!(
            sink,
            "{} {} {}",
            Timestamp::new(1, 5),
            Timestamp::new(2, 50),
            Timestamp::new(3, 500)
        )
        .unwrap();
        assert_eq!(sink.0, "1.005 2.050 3.500");
        assert_eq!(format!("{}", Timestamp::new(12, 7)), "12.007");
    }

    proptest! {
        #[test]
        fn accumulated_time_matches_tick_count(ticks in 0u32..5_000, period in 1u16..=1000) {
            let state = after(ticks, period);
            let total = ticks as u64 * period as u64;
            prop_assert_eq!(state.seconds() as u64, total / 1000);
            prop_assert_eq!(state.millis() as u64, total % 1000);
            prop_assert_eq!(state.timestamp().as_millis(), total);
        }
    }
}
