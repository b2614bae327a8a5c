pub mod button_handler;
pub mod heartbeat;
pub mod serial_console;

pub use button_handler::{ButtonEvent, ButtonHandler};
pub use heartbeat::Heartbeat;
pub use serial_console::SerialConsole;
