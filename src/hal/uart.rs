use core::convert::Infallible;

use avr_device::atmega128a::USART0;
use embedded_hal::serial;

use crate::config::CPU_FREQ_HZ;

const UDRE0: u8 = 1 << 5;
const TXC0: u8 = 1 << 6;
const TXEN0: u8 = 1 << 3;
// Asynchronous, 8 data bits, no parity, 1 stop bit
const FORMAT_8N1: u8 = 0x06;

/// USART0 transmitter, polled.
pub struct Usart0 {
    sending: bool,
}

impl Usart0 {
    pub fn new(baud: u32) -> Self {
        let ubrr = (CPU_FREQ_HZ / (16 * baud)).saturating_sub(1) as u16;
        unsafe {
            let p = &*USART0::ptr();
            p.ubrr0h.write(|w| w.bits((ubrr >> 8) as u8));
            p.ubrr0l.write(|w| w.bits(ubrr as u8));
            p.ucsr0c.write(|w| w.bits(FORMAT_8N1));
            p.ucsr0b.write(|w| w.bits(TXEN0));
        }
        Self { sending: false }
    }

    fn status(&self) -> u8 {
        unsafe { (*USART0::ptr()).ucsr0a.read().bits() }
    }
}

impl serial::Write<u8> for Usart0 {
    type Error = Infallible;

    fn write(&mut self, word: u8) -> nb::Result<(), Infallible> {
        if self.status() & UDRE0 == 0 {
            return Err(nb::Error::WouldBlock);
        }
        unsafe {
            let p = &*USART0::ptr();
            // TXC0 is cleared by writing a one
            p.ucsr0a.write(|w| w.bits(TXC0));
            p.udr0.write(|w| w.bits(word));
        }
        self.sending = true;
        Ok(())
    }

    fn flush(&mut self) -> nb::Result<(), Infallible> {
        // TXC0 never sets if nothing was sent since the last flush
        if self.sending && self.status() & TXC0 == 0 {
            return Err(nb::Error::WouldBlock);
        }
        self.sending = false;
        Ok(())
    }
}
