//! Millisecond tick service for the ATmega128.
//!
//! Two independent channels, each driven by its own timer/counter compare
//! interrupt, keep a seconds + milliseconds clock. Reads are race-free: a
//! channel masks only its own interrupt while it is read. Each channel
//! either calls a handler from the interrupt or raises a flag for the main
//! loop to poll, chosen by its type.
//!
//! Register access and interrupt vectors only exist on AVR; everything
//! else builds on the host, where [`hal::SimTickSource`] stands in for the
//! timers.

#![cfg_attr(not(test), no_std)]

pub mod config;
pub mod drivers;
pub mod hal;
pub mod logger;
pub mod report;
pub mod testing;
pub mod tick;
