//! Levelled logging over the serial console.
//!
//! Lines go out through `ufmt`, prefixed with a level tag and terminated
//! with CR LF like every other console line. Write errors are dropped at
//! this boundary; a dead UART must not stop the firmware.

use embedded_hal::serial;

use crate::drivers::SerialConsole;

#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Error = 0,
    Warn = 1,
    Info = 2,
    Debug = 3,
}

impl Level {
    pub const fn tag(self) -> &'static str {
        match self {
            Level::Error => "[ERR] ",
            Level::Warn => "[WRN] ",
            Level::Info => "[INF] ",
            Level::Debug => "[DBG] ",
        }
    }
}

pub struct Logger<W> {
    console: SerialConsole<W>,
    level: Level,
}

impl<W: serial::Write<u8>> Logger<W> {
    pub fn new(console: SerialConsole<W>, level: Level) -> Self {
        Self { console, level }
    }

    pub fn enabled(&self, level: Level) -> bool {
        level <= self.level
    }

    pub fn set_level(&mut self, level: Level) {
        self.level = level;
    }

    pub fn console(&mut self) -> &mut SerialConsole<W> {
        &mut self.console
    }

    /// Starts a line at `level`: writes the tag and hands back the console
    /// for the message body, or `None` when the level is filtered out.
    pub fn begin(&mut self, level: Level) -> Option<&mut SerialConsole<W>> {
        if !self.enabled(level) {
            return None;
        }
        self.console.write_str(level.tag()).ok();
        Some(&mut self.console)
    }

    pub fn release(self) -> SerialConsole<W> {
        self.console
    }
}

#[doc(hidden)]
#[macro_export]
macro_rules! log_at {
    ($logger:expr, $level:expr, $($arg:tt)*) => {
        if let Some(console) = $logger.begin($level) {
            ::ufmt::uwrite!(*console, $($arg)*).ok();
            console.write_str("\r\n").ok();
        }
    };
}

#[macro_export]
macro_rules! log_error {
    ($logger:expr, $($arg:tt)*) => {
        $crate::log_at!($logger, $crate::logger::Level::Error, $($arg)*)
    };
}

#[macro_export]
macro_rules! log_warn {
    ($logger:expr, $($arg:tt)*) => {
        $crate::log_at!($logger, $crate::logger::Level::Warn, $($arg)*)
    };
}

#[macro_export]
macro_rules! log_info {
    ($logger:expr, $($arg:tt)*) => {
        $crate::log_at!($logger, $crate::logger::Level::Info, $($arg)*)
    };
}

#[macro_export]
macro_rules! log_debug {
    ($logger:expr, $($arg:tt)*) => {
        $crate::log_at!($logger, $crate::logger::Level::Debug, $($arg)*)
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::serial::{Mock as SerialMock, Transaction as SerialTransaction};

    fn logger(expected: &[u8], level: Level) -> Logger<SerialMock<u8>> {
        let expectations = [SerialTransaction::write_many(expected)];
        Logger::new(SerialConsole::new(SerialMock::new(&expectations)), level)
    }

    #[test]
    fn test_level_order() {
        assert!(Level::Error < Level::Warn);
        assert!(Level::Info < Level::Debug);
    }

    #[test]
    fn test_tagged_line() {
        let mut log = logger(b"[INF] tick 1000 ms\r\n", Level::Info);
        log_info!(log, "tick {} ms", 1000u16);
        log.release().release().done();
    }

    #[test]
    fn test_log_and_console_lines_share_terminator() {
        let mut log = logger(b"banner\r\n[INF] ready\r\n", Level::Info);
        log.console().write_line("banner").unwrap();
        log_info!(log, "ready");
        log.release().release().done();
    }

    #[test]
    fn test_filtered_levels_write_nothing() {
        let mut log = logger(b"[WRN] late\r\n", Level::Warn);
        log_debug!(log, "noise");
        log_info!(log, "noise");
        log_warn!(log, "late");
        log.release().release().done();
    }

    #[test]
    fn test_raise_level() {
        let mut log = logger(b"[DBG] x=7\r\n", Level::Error);
        assert!(!log.enabled(Level::Debug));
        log.set_level(Level::Debug);
        log_debug!(log, "x={}", 7u8);
        log.release().release().done();
    }
}
