#![cfg_attr(target_arch = "avr", no_std, no_main, feature(abi_avr_interrupt))]

#[cfg(not(target_arch = "avr"))]
fn main() {}

#[cfg(target_arch = "avr")]
mod firmware {
    use core::cell::RefCell;

    use avr_device::atmega128a::PORTC;
    use avr_device::interrupt::{self, Mutex};
    use embedded_hal::digital::v2::ToggleableOutputPin;
    use panic_halt as _;

    use atmega128_tick::config;
    use atmega128_tick::drivers::{ButtonEvent, ButtonHandler, Heartbeat, SerialConsole};
    use atmega128_tick::hal::gpio::{board, Output, Pin};
    use atmega128_tick::hal::{Power, Tc0, Tc1, Usart0};
    use atmega128_tick::logger::Logger;
    use atmega128_tick::report::UptimeReport;
    use atmega128_tick::tick::{Callback, Channel, Countdown, CountdownHandler, Flag};
    use atmega128_tick::{log_debug, log_info};

    static PRIMARY: Channel<Tc1, Flag> =
        Channel::new(Tc1::new(), config::PRIMARY_TICK, Flag::new());

    static SECONDARY: Channel<Tc0, Callback<CountdownHandler<fn()>>> = Channel::new(
        Tc0::new(),
        config::SECONDARY_TICK,
        Callback::new(CountdownHandler::new(
            Countdown::periodic(config::STROBE_TICKS),
            toggle_strobe as fn(),
        )),
    );

    static STROBE_PIN: Mutex<RefCell<Option<Pin<PORTC, 0, Output>>>> =
        Mutex::new(RefCell::new(None));

    // Runs from TIMER0_COMP with other interrupts enabled
    fn toggle_strobe() {
        interrupt::free(|cs| {
            if let Some(pin) = STROBE_PIN.borrow(cs).borrow_mut().as_mut() {
                pin.toggle().ok();
            }
        });
    }

    #[avr_device::interrupt(atmega128a)]
    fn TIMER1_COMPA() {
        PRIMARY.service_interrupt();
    }

    #[avr_device::interrupt(atmega128a)]
    fn TIMER0_COMP() {
        SECONDARY.service_interrupt();
    }

    #[avr_device::entry]
    fn main() -> ! {
        let console = SerialConsole::new(Usart0::new(config::UART_BAUD));
        let mut logger = Logger::new(console, config::LOG_LEVEL);

        log_info!(logger, "ATmega128 tick service v{}", env!("CARGO_PKG_VERSION"));
        for (name, tick) in [("primary", config::PRIMARY_TICK), ("secondary", config::SECONDARY_TICK)] {
            log_info!(
                logger,
                "{}: {} ms, OCR {}, drift {} ppm",
                name,
                tick.period_ms(),
                tick.compare(),
                tick.drift_ppm()
            );
        }

        let Some(pins) = board::take() else {
            panic!("board pins taken twice");
        };

        let strobe = pins.strobe.into_output();
        interrupt::free(|cs| STROBE_PIN.borrow(cs).replace(Some(strobe)));

        let mut heartbeat = Heartbeat::new(pins.led0.into_output(), config::HEARTBEAT_HALF_PERIOD_MS);
        let mut button = ButtonHandler::new(
            pins.btn0.into_pull_up_input(),
            config::BUTTON_DEBOUNCE_MS,
        );
        let mut report = UptimeReport::new(config::REPORT_INTERVAL_S);
        let mut power = Power::new();
        let mut presses = 0u8;

        PRIMARY.init();
        SECONDARY.init();

        // Enable interrupts globally
        unsafe { interrupt::enable() };

        #[cfg(feature = "selftest")]
        self_test(&mut logger);

        log_info!(logger, "Ready...");

        loop {
            power.wait_for(PRIMARY.changed());
            if !PRIMARY.changed().take() {
                continue;
            }
            let now = PRIMARY.now();

            heartbeat.update(now).ok();

            match button.sample(now) {
                Ok(Some(ButtonEvent::Pressed)) => {
                    presses = presses.wrapping_add(1);
                    logger.console().debug("presses", presses).ok();
                    // The countdown is shared with TIMER0_COMP
                    let _guard = SECONDARY.lock();
                    SECONDARY.handler().countdown().restart();
                }
                Ok(Some(ButtonEvent::Released)) => {
                    log_debug!(logger, "released at {}", now);
                }
                _ => {}
            }

            report.poll(now, &mut logger);
        }
    }

    #[cfg(feature = "selftest")]
    fn self_test(logger: &mut Logger<Usart0>) {
        use atmega128_tick::log_warn;
        use atmega128_tick::testing::{ReadConsistency, TestRunner, TickAdvances};

        let idle = || avr_device::asm::nop();
        let primary_advances = TickAdvances {
            name: "primary advances",
            channel: &PRIMARY,
            budget: 60_000,
            idle,
        };
        let secondary_advances = TickAdvances {
            name: "secondary advances",
            channel: &SECONDARY,
            budget: 60_000,
            idle,
        };
        let primary_reads = ReadConsistency {
            name: "primary reads",
            channel: &PRIMARY,
            samples: 5_000,
            between: idle,
        };
        let secondary_reads = ReadConsistency {
            name: "secondary reads",
            channel: &SECONDARY,
            samples: 5_000,
            between: idle,
        };

        let passed = TestRunner::new(logger.console()).run_suite(
            "tick",
            &[
                &primary_advances,
                &secondary_advances,
                &primary_reads,
                &secondary_reads,
            ],
        );
        if !passed {
            log_warn!(logger, "self-test failed");
        }
    }
}
