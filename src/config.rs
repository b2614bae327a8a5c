//! Build-time configuration for the ATmega128 tick firmware

use crate::hal::timer::{Counter, Prescaler, TickConfig};
use crate::logger::Level;

/// CPU frequency in Hz, from `MCU_FREQ_HZ` at build time
pub const CPU_FREQ_HZ: u32 = parse_hz(env!("MCU_FREQ_HZ"));

/// UART baud rate
pub const UART_BAUD: u32 = 9600;

/// Primary channel: Timer/Counter1, 1 ms tick
pub const PRIMARY_TICK: TickConfig =
    TickConfig::new(CPU_FREQ_HZ, Counter::Timer1, Prescaler::Div64, 1);

/// Secondary channel: Timer/Counter0, 10 ms tick
pub const SECONDARY_TICK: TickConfig =
    TickConfig::new(CPU_FREQ_HZ, Counter::Timer0, Prescaler::Div1024, 10);

/// Heartbeat LED toggle interval in milliseconds
pub const HEARTBEAT_HALF_PERIOD_MS: u32 = 500;

/// Button debounce time in milliseconds
pub const BUTTON_DEBOUNCE_MS: u32 = 50;

/// Strobe output toggle interval, in secondary ticks
pub const STROBE_TICKS: u32 = 25;

/// Uptime report interval in seconds
pub const REPORT_INTERVAL_S: u32 = 10;

#[cfg(feature = "debug")]
pub const LOG_LEVEL: Level = Level::Debug;
#[cfg(not(feature = "debug"))]
pub const LOG_LEVEL: Level = Level::Info;

// build.rs has already checked the value is all digits
const fn parse_hz(digits: &str) -> u32 {
    let bytes = digits.as_bytes();
    let mut value: u32 = 0;
    let mut i = 0;
    while i < bytes.len() {
        value = value * 10 + (bytes[i] - b'0') as u32;
        i += 1;
    }
    value
}
