use embedded_hal::digital::v2::InputPin;

use crate::tick::Timestamp;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ButtonEvent {
    Pressed,
    Released,
}

/// Debounces one active-low button against channel time.
///
/// A change is reported once every sample for `stable_ms` has disagreed
/// with the debounced state. Sampling may be irregular: a poll loop that
/// misses ticks still measures the settle time in milliseconds.
pub struct ButtonHandler<P> {
    pin: P,
    pressed: bool,
    changing_since: Option<Timestamp>,
    stable_ms: u32,
}

impl<P: InputPin> ButtonHandler<P> {
    pub fn new(pin: P, stable_ms: u32) -> Self {
        Self {
            pin,
            pressed: false,
            changing_since: None,
            stable_ms,
        }
    }

    pub fn sample(&mut self, now: Timestamp) -> Result<Option<ButtonEvent>, P::Error> {
        let raw_state = self.pin.is_low()?; // Buttons are active low

        if raw_state == self.pressed {
            self.changing_since = None;
            return Ok(None);
        }

        let since = *self.changing_since.get_or_insert(now);
        if now.elapsed_since(since) < self.stable_ms {
            return Ok(None);
        }

        self.pressed = raw_state;
        self.changing_since = None;
        Ok(Some(if raw_state {
            ButtonEvent::Pressed
        } else {
            ButtonEvent::Released
        }))
    }

    pub fn is_pressed(&self) -> bool {
        self.pressed
    }

    pub fn release(self) -> P {
        self.pin
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use embedded_hal_mock::pin::{Mock as PinMock, State as PinState, Transaction as PinTransaction};

    fn samples(states: &[PinState]) -> Vec<PinTransaction> {
        states.iter().map(|s| PinTransaction::get(s.clone())).collect()
    }

    fn at(ms: u32) -> Timestamp {
        Timestamp::new(ms / 1000, (ms % 1000) as u16)
    }

    #[test]
    fn test_press_after_stable_time() {
        use PinState::Low;
        let expectations = samples(&[Low, Low, Low, Low]);
        let mut button = ButtonHandler::new(PinMock::new(&expectations), 50);

        assert_eq!(button.sample(at(100)).unwrap(), None);
        assert_eq!(button.sample(at(149)).unwrap(), None);
        assert_eq!(button.sample(at(150)).unwrap(), Some(ButtonEvent::Pressed));
        assert!(button.is_pressed());
        assert_eq!(button.sample(at(151)).unwrap(), None);
        button.release().done();
    }

    #[test]
    fn test_sparse_samples_measure_time_not_calls() {
        use PinState::Low;
        // Two samples 60 ms apart, as when the poll loop is held up by
        // logging and several tick flags coalesce
        let expectations = samples(&[Low, Low]);
        let mut button = ButtonHandler::new(PinMock::new(&expectations), 50);

        assert_eq!(button.sample(at(1_000)).unwrap(), None);
        assert_eq!(button.sample(at(1_060)).unwrap(), Some(ButtonEvent::Pressed));
        button.release().done();
    }

    #[test]
    fn test_bounce_restarts_settle_time() {
        use PinState::{High, Low};
        let expectations = samples(&[Low, Low, High, Low, Low, Low]);
        let mut button = ButtonHandler::new(PinMock::new(&expectations), 50);

        let times = [0, 40, 45, 50, 99, 100];
        let events: Vec<_> = times.iter().map(|&t| button.sample(at(t)).unwrap()).collect();
        assert_eq!(events, vec![None, None, None, None, None, Some(ButtonEvent::Pressed)]);
        button.release().done();
    }

    #[test]
    fn test_release() {
        use PinState::{High, Low};
        let expectations = samples(&[Low, Low, High, High, High]);
        let mut button = ButtonHandler::new(PinMock::new(&expectations), 10);

        assert_eq!(button.sample(at(0)).unwrap(), None);
        assert_eq!(button.sample(at(10)).unwrap(), Some(ButtonEvent::Pressed));
        assert_eq!(button.sample(at(20)).unwrap(), None);
        assert_eq!(button.sample(at(30)).unwrap(), Some(ButtonEvent::Released));
        assert_eq!(button.sample(at(40)).unwrap(), None);
        assert!(!button.is_pressed());
        button.release().done();
    }
}
