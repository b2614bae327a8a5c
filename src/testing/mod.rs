//! Self-test harness that runs on the target and reports over any `ufmt`
//! sink. Enabled at boot by the `selftest` feature.

use ufmt::{uDisplay, uWrite, uwrite, Formatter};

use crate::hal::timer::TickSource;
use crate::tick::{Channel, Dispatch, Timestamp};

pub struct TestRunner<'a, W: ?Sized> {
    out: &'a mut W,
    total_tests: u32,
    passed_tests: u32,
    current_suite: &'static str,
}

pub trait TestCase {
    fn run(&self) -> TestResult;
    fn name(&self) -> &'static str;
}

#[derive(Debug, PartialEq)]
pub enum TestResult {
    Pass,
    Fail(TestError),
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub enum TestError {
    AssertionFailed(&'static str),
    Timeout,
}

impl uDisplay for TestError {
    fn fmt<W>(&self, f: &mut Formatter<'_, W>) -> Result<(), W::Error>
    where
        W: uWrite + ?Sized,
    {
        match self {
            TestError::AssertionFailed(what) => uwrite!(f, "assertion failed: {}", *what),
            TestError::Timeout => f.write_str("timeout"),
        }
    }
}

impl<'a, W: uWrite + ?Sized> TestRunner<'a, W> {
    pub fn new(out: &'a mut W) -> Self {
        Self {
            out,
            total_tests: 0,
            passed_tests: 0,
            current_suite: "",
        }
    }

    /// Runs every case and prints a summary. Returns whether all passed.
    pub fn run_suite(&mut self, name: &'static str, tests: &[&dyn TestCase]) -> bool {
        self.current_suite = name;
        self.total_tests = 0;
        self.passed_tests = 0;
        uwrite!(self.out, "\r\n=== Test Suite: {} ===\r\n", name).ok();

        for test in tests {
            self.total_tests += 1;
            uwrite!(self.out, "Running {}: ", test.name()).ok();

            match test.run() {
                TestResult::Pass => {
                    self.passed_tests += 1;
                    self.out.write_str("PASS\r\n").ok();
                }
                TestResult::Fail(err) => {
                    uwrite!(self.out, "FAIL - {}\r\n", err).ok();
                }
            }
        }

        self.print_summary();
        self.passed_tests == self.total_tests
    }

    pub fn passed(&self) -> u32 {
        self.passed_tests
    }

    pub fn total(&self) -> u32 {
        self.total_tests
    }

    fn print_summary(&mut self) {
        uwrite!(self.out, "\r\nTest Summary for {}:\r\n", self.current_suite).ok();
        let percent = if self.total_tests == 0 {
            100
        } else {
            (self.passed_tests * 100) / self.total_tests
        };
        uwrite!(
            self.out,
            "Passed: {}/{} ({}%)\r\n",
            self.passed_tests,
            self.total_tests,
            percent
        )
        .ok();
    }
}

#[macro_export]
macro_rules! check_eq {
    ($left:expr, $right:expr) => {
        if $left != $right {
            return $crate::testing::TestResult::Fail($crate::testing::TestError::AssertionFailed(
                concat!(stringify!($left), " == ", stringify!($right)),
            ));
        }
    };
}

#[macro_export]
macro_rules! check {
    ($cond:expr) => {
        if !$cond {
            return $crate::testing::TestResult::Fail($crate::testing::TestError::AssertionFailed(
                stringify!($cond),
            ));
        }
    };
}

/// Passes once the channel's time moves, failing after `budget` calls to
/// `idle` without a tick.
pub struct TickAdvances<'a, S, D, F> {
    pub name: &'static str,
    pub channel: &'a Channel<S, D>,
    pub budget: u32,
    pub idle: F,
}

impl<S: TickSource, D: Dispatch, F: Fn()> TestCase for TickAdvances<'_, S, D, F> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn run(&self) -> TestResult {
        let start = self.channel.now();
        for _ in 0..self.budget {
            (self.idle)();
            if self.channel.now() != start {
                return TestResult::Pass;
            }
        }
        TestResult::Fail(TestError::Timeout)
    }
}

/// Takes `samples` readings while the channel is running and checks each
/// one is well-formed and none goes backwards.
pub struct ReadConsistency<'a, S, D, F> {
    pub name: &'static str,
    pub channel: &'a Channel<S, D>,
    pub samples: u32,
    pub between: F,
}

impl<S: TickSource, D: Dispatch, F: Fn()> TestCase for ReadConsistency<'_, S, D, F> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn run(&self) -> TestResult {
        let mut last: Timestamp = self.channel.now();
        for _ in 0..self.samples {
            (self.between)();
            let now = self.channel.now();
            check!(now.millis() < 1000);
            check!(now >= last);
            check!(self.channel.milliseconds() < 1000);
            last = now;
        }
        TestResult::Pass
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config;
    use crate::hal::SimTickSource;
    use crate::tick::Flag;
    use core::convert::Infallible;

    struct Capture(String);

    impl uWrite for Capture {
        type Error = Infallible;

        fn write_str(&mut self, s: &str) -> Result<(), Infallible> {
            self.0.push_str(s);
            Ok(())
        }
    }

    fn running_channel() -> Channel<SimTickSource, Flag> {
        let channel = Channel::new(SimTickSource::new(), config::PRIMARY_TICK, Flag::new());
        channel.init();
        channel
    }

    struct AlwaysFails;

    impl TestCase for AlwaysFails {
        fn name(&self) -> &'static str {
            "always fails"
        }

        fn run(&self) -> TestResult {
            check_eq!(1 + 1, 3);
            TestResult::Pass
        }
    }

    #[test]
    fn test_tick_self_tests_pass_on_running_channel() {
        let channel = running_channel();
        let advances = TickAdvances {
            name: "primary advances",
            channel: &channel,
            budget: 10,
            idle: || channel.fire(),
        };
        let consistent = ReadConsistency {
            name: "primary reads",
            channel: &channel,
            samples: 2500,
            between: || channel.fire(),
        };

        let mut out = Capture(String::new());
        let mut runner = TestRunner::new(&mut out);
        assert!(runner.run_suite("tick", &[&advances, &consistent]));
        assert_eq!(runner.passed(), 2);
        assert!(out.0.contains("Running primary reads: PASS\r\n"));
        assert!(out.0.ends_with("Passed: 2/2 (100%)\r\n"));
        assert_eq!(channel.now(), Timestamp::new(2, 501));
    }

    #[test]
    fn test_stalled_channel_times_out() {
        let channel = running_channel();
        let advances = TickAdvances {
            name: "stalled",
            channel: &channel,
            budget: 100,
            idle: || {},
        };
        assert_eq!(advances.run(), TestResult::Fail(TestError::Timeout));
    }

    #[test]
    fn test_failure_is_reported() {
        let mut out = Capture(String::new());
        let mut runner = TestRunner::new(&mut out);
        assert!(!runner.run_suite("broken", &[&AlwaysFails]));
        assert_eq!((runner.passed(), runner.total()), (0, 1));
        assert!(out
            .0
            .contains("Running always fails: FAIL - assertion failed: 1 + 1 == 3\r\n"));
        assert!(out.0.ends_with("Passed: 0/1 (0%)\r\n"));
    }
}
