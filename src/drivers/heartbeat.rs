use embedded_hal::digital::v2::OutputPin;

use crate::tick::Timestamp;

/// Blinks an LED from channel timestamps: toggles whenever `half_period_ms`
/// has elapsed since the last toggle.
pub struct Heartbeat<P> {
    led: P,
    half_period_ms: u32,
    last_toggle: Timestamp,
    lit: bool,
}

impl<P: OutputPin> Heartbeat<P> {
    pub fn new(led: P, half_period_ms: u32) -> Self {
        Self {
            led,
            half_period_ms,
            last_toggle: Timestamp::new(0, 0),
            lit: false,
        }
    }

    /// Returns whether the LED was toggled.
    pub fn update(&mut self, now: Timestamp) -> Result<bool, P::Error> {
        if now.elapsed_since(self.last_toggle) < self.half_period_ms {
            return Ok(false);
        }

        self.lit = !self.lit;
        if self.lit {
            self.led.set_high()?;
        } else {
            self.led.set_low()?;
        }
        self.last_toggle = now;
        Ok(true)
    }

    pub fn is_lit(&self) -> bool {
        self.lit
    }

    pub fn release(self) -> P {
        self.led
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::pin::{Mock as PinMock, State as PinState, Transaction as PinTransaction};

    #[test]
    fn test_toggles_every_half_period() {
        let expectations = [
            PinTransaction::set(PinState::High),
            PinTransaction::set(PinState::Low),
        ];
        let mut heartbeat = Heartbeat::new(PinMock::new(&expectations), 500);

        assert!(!heartbeat.update(Timestamp::new(0, 499)).unwrap());
        assert!(heartbeat.update(Timestamp::new(0, 500)).unwrap());
        assert!(heartbeat.is_lit());
        assert!(!heartbeat.update(Timestamp::new(0, 999)).unwrap());
        assert!(heartbeat.update(Timestamp::new(1, 0)).unwrap());
        assert!(!heartbeat.is_lit());
        heartbeat.release().done();
    }

    #[test]
    fn test_late_update_toggles_once() {
        let expectations = [PinTransaction::set(PinState::High)];
        let mut heartbeat = Heartbeat::new(PinMock::new(&expectations), 500);

        assert!(heartbeat.update(Timestamp::new(7, 250)).unwrap());
        assert!(!heartbeat.update(Timestamp::new(7, 600)).unwrap());
        heartbeat.release().done();
    }
}
