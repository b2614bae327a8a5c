//! Periodic uptime line on the log.

use embedded_hal::serial;

use crate::log_info;
use crate::logger::Logger;
use crate::tick::Timestamp;

pub struct UptimeReport {
    interval_s: u32,
    next_due: u32,
}

impl UptimeReport {
    pub const fn new(interval_s: u32) -> Self {
        Self {
            interval_s,
            next_due: interval_s,
        }
    }

    pub fn next_due(&self) -> u32 {
        self.next_due
    }

    /// Logs `uptime <s>.<mmm>s` once `now` reaches the next due second.
    /// A late poll reports once and schedules from `now`.
    pub fn poll<W: serial::Write<u8>>(&mut self, now: Timestamp, logger: &mut Logger<W>) -> bool {
        // Signed distance so the comparison survives `seconds` wrapping.
        if (now.seconds().wrapping_sub(self.next_due) as i32) < 0 {
            return false;
        }

        log_info!(logger, "uptime {}s", now);
        self.next_due = now.seconds().wrapping_add(self.interval_s);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::SerialConsole;
    use crate::logger::Level;
    use embedded_hal_mock::serial::{Mock as SerialMock, Transaction as SerialTransaction};

    fn logger(expected: &[u8]) -> Logger<SerialMock<u8>> {
        let expectations = [SerialTransaction::write_many(expected)];
        Logger::new(SerialConsole::new(SerialMock::new(&expectations)), Level::Info)
    }

    #[test]
    fn test_reports_on_interval() {
        let mut log = logger(b"[INF] uptime 10.000s\r\n[INF] uptime 20.004s\r\n");
        let mut report = UptimeReport::new(10);

        assert!(!report.poll(Timestamp::new(9, 999), &mut log));
        assert!(report.poll(Timestamp::new(10, 0), &mut log));
        assert!(!report.poll(Timestamp::new(10, 1), &mut log));
        assert!(!report.poll(Timestamp::new(19, 999), &mut log));
        assert!(report.poll(Timestamp::new(20, 4), &mut log));
        assert_eq!(report.next_due(), 30);
        log.release().release().done();
    }

    #[test]
    fn test_late_poll_reports_once() {
        let mut log = logger(b"[INF] uptime 35.500s\r\n");
        let mut report = UptimeReport::new(10);

        assert!(report.poll(Timestamp::new(35, 500), &mut log));
        assert!(!report.poll(Timestamp::new(40, 0), &mut log));
        assert_eq!(report.next_due(), 45);
        log.release().release().done();
    }

    #[test]
    fn test_survives_seconds_wrap() {
        let mut log = logger(
            b"[INF] uptime 2147483648.000s\r\n[INF] uptime 4294967293.000s\r\n[INF] uptime 7.000s\r\n",
        );
        let mut report = UptimeReport::new(10);

        assert!(report.poll(Timestamp::new(1 << 31, 0), &mut log));
        assert!(report.poll(Timestamp::new(u32::MAX - 2, 0), &mut log));
        assert_eq!(report.next_due(), 7);
        assert!(!report.poll(Timestamp::new(3, 0), &mut log));
        assert!(report.poll(Timestamp::new(7, 0), &mut log));
        log.release().release().done();
    }
}
