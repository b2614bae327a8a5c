use avr_device::atmega128a::CPU;

use crate::tick::Flag;

// MCUCR: SE is bit 5, SM2:0 sit at bits 2, 4 and 3. Idle is SM = 0.
const SE: u8 = 1 << 5;
const SM_MASK: u8 = 0x1C;

pub struct Power {
    _private: (),
}

impl Power {
    pub fn new() -> Self {
        Self { _private: () }
    }

    /// Idle until `flag` is raised by a tick handler.
    ///
    /// Idle keeps the timer clocks running, so either channel can wake the
    /// CPU. The flag is tested with interrupts disabled and `sei` is
    /// immediately followed by `sleep`, so a tick landing between the test
    /// and the sleep still wakes the CPU. Must be called with interrupts
    /// enabled.
    pub fn wait_for(&mut self, flag: &Flag) {
        let cpu = unsafe { &*CPU::ptr() };
        loop {
            avr_device::interrupt::disable();
            if flag.is_set() {
                unsafe { avr_device::interrupt::enable() };
                return;
            }
            cpu.mcucr.modify(|r, w| unsafe { w.bits((r.bits() & !SM_MASK) | SE) });
            unsafe { avr_device::interrupt::enable() };
            avr_device::asm::sleep();
            avr_device::interrupt::free(|_| {
                cpu.mcucr.modify(|r, w| unsafe { w.bits(r.bits() & !SE) })
            });
        }
    }
}

impl Default for Power {
    fn default() -> Self {
        Self::new()
    }
}
