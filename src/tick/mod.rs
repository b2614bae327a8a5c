//! Real-time tick service.
//!
//! Each [`Channel`] binds one timer/counter to its own seconds/milliseconds
//! accumulator and to a dispatch policy chosen by type: [`Callback`] runs a
//! handler inside the interrupt, [`Flag`] raises a changed flag for the main
//! loop to poll.

mod channel;
mod countdown;
mod dispatch;
mod state;

pub use channel::{Channel, MaskGuard};
pub use countdown::{Countdown, CountdownHandler};
pub use dispatch::{Callback, Dispatch, Flag, TickHandler};
pub use state::{TickState, Timestamp};
