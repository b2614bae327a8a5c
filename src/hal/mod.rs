#[cfg(target_arch = "avr")]
pub mod gpio;
#[cfg(target_arch = "avr")]
pub mod power;
pub mod sim;
pub mod timer;
#[cfg(target_arch = "avr")]
pub mod uart;

// Re-export commonly used types
pub use sim::SimTickSource;
pub use timer::{ConfigError, Counter, Prescaler, TickConfig, TickSource};
#[cfg(target_arch = "avr")]
pub use timer::{Tc0, Tc1};
#[cfg(target_arch = "avr")]
pub use power::Power;
#[cfg(target_arch = "avr")]
pub use uart::Usart0;
