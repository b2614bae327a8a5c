use core::cell::Cell;
use core::convert::Infallible;
use core::marker::PhantomData;

use avr_device::atmega128a::{PORTA, PORTB, PORTC, PORTD};
use avr_device::interrupt::Mutex;
use embedded_hal::digital::v2::{InputPin, OutputPin, ToggleableOutputPin};

pub trait PinMode {}
pub struct Input;
pub struct Output;
impl PinMode for Input {}
impl PinMode for Output {}

/// Pin `P` of `PORT`, typed by direction.
pub struct Pin<PORT, const P: u8, MODE> {
    _port: PhantomData<PORT>,
    _mode: PhantomData<MODE>,
}

impl<PORT, const P: u8> Pin<PORT, P, Input> {
    // Only `board::take` creates pins
    const fn new() -> Self {
        Self {
            _port: PhantomData,
            _mode: PhantomData,
        }
    }
}

// PORTx and DDRx are shared with the other pins of the port, which may be
// driven from a tick handler, so every read-modify-write is done with
// interrupts off
macro_rules! impl_port {
    ($PORT:ident, $pin:ident, $ddr:ident, $port:ident) => {
        impl<const P: u8, MODE: PinMode> Pin<$PORT, P, MODE> {
            pub fn into_output(self) -> Pin<$PORT, P, Output> {
                avr_device::interrupt::free(|_| unsafe {
                    (*$PORT::ptr()).$ddr.modify(|r, w| w.bits(r.bits() | (1 << P)));
                });
                Pin {
                    _port: PhantomData,
                    _mode: PhantomData,
                }
            }

            pub fn into_pull_up_input(self) -> Pin<$PORT, P, Input> {
                avr_device::interrupt::free(|_| unsafe {
                    (*$PORT::ptr()).$ddr.modify(|r, w| w.bits(r.bits() & !(1 << P)));
                    (*$PORT::ptr()).$port.modify(|r, w| w.bits(r.bits() | (1 << P)));
                });
                Pin {
                    _port: PhantomData,
                    _mode: PhantomData,
                }
            }
        }

        impl<const P: u8> OutputPin for Pin<$PORT, P, Output> {
            type Error = Infallible;

            #[inline]
            fn set_high(&mut self) -> Result<(), Infallible> {
                avr_device::interrupt::free(|_| unsafe {
                    (*$PORT::ptr()).$port.modify(|r, w| w.bits(r.bits() | (1 << P)));
                });
                Ok(())
            }

            #[inline]
            fn set_low(&mut self) -> Result<(), Infallible> {
                avr_device::interrupt::free(|_| unsafe {
                    (*$PORT::ptr()).$port.modify(|r, w| w.bits(r.bits() & !(1 << P)));
                });
                Ok(())
            }
        }

        // The ATmega128 has no toggle-by-PINx-write
        impl<const P: u8> ToggleableOutputPin for Pin<$PORT, P, Output> {
            type Error = Infallible;

            #[inline]
            fn toggle(&mut self) -> Result<(), Infallible> {
                avr_device::interrupt::free(|_| unsafe {
                    (*$PORT::ptr()).$port.modify(|r, w| w.bits(r.bits() ^ (1 << P)));
                });
                Ok(())
            }
        }

        impl<const P: u8> InputPin for Pin<$PORT, P, Input> {
            type Error = Infallible;

            #[inline]
            fn is_high(&self) -> Result<bool, Infallible> {
                Ok(unsafe { (*$PORT::ptr()).$pin.read().bits() } & (1 << P) != 0)
            }

            #[inline]
            fn is_low(&self) -> Result<bool, Infallible> {
                self.is_high().map(|high| !high)
            }
        }
    };
}

impl_port!(PORTA, pina, ddra, porta);
impl_port!(PORTB, pinb, ddrb, portb);
impl_port!(PORTC, pinc, ddrc, portc);
impl_port!(PORTD, pind, ddrd, portd);

// BigAVR2 board-specific pin assignments
pub mod board {
    use super::*;

    /// Heartbeat LED.
    pub type Led0 = Pin<PORTA, 0, Input>;
    /// Output toggled by the secondary channel's countdown.
    pub type Strobe = Pin<PORTC, 0, Input>;
    /// Active-low push button.
    pub type Btn0 = Pin<PORTB, 0, Input>;

    pub struct Pins {
        pub led0: Led0,
        pub strobe: Strobe,
        pub btn0: Btn0,
    }

    static TAKEN: Mutex<Cell<bool>> = Mutex::new(Cell::new(false));

    /// The board's pins in their reset state. Returns `None` after the
    /// first call, so each pin has a single owner.
    pub fn take() -> Option<Pins> {
        avr_device::interrupt::free(|cs| {
            if TAKEN.borrow(cs).replace(true) {
                None
            } else {
                Some(Pins {
                    led0: Pin::new(),
                    strobe: Pin::new(),
                    btn0: Pin::new(),
                })
            }
        })
    }
}
