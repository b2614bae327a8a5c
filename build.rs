use std::env;

const DEFAULT_MCU_FREQ_HZ: &str = "16000000";

fn main() {
    println!("cargo:rerun-if-env-changed=MCU_FREQ_HZ");

    // Pass CPU frequency for timing calculations
    let freq = env::var("MCU_FREQ_HZ").unwrap_or_else(|_| DEFAULT_MCU_FREQ_HZ.to_string());
    if freq.is_empty() || !freq.bytes().all(|b| b.is_ascii_digit()) {
        panic!("MCU_FREQ_HZ must be a decimal frequency in Hz, got {:?}", freq);
    }
    println!("cargo:rustc-env=MCU_FREQ_HZ={}", freq);

    // Debug vs Release configurations
    if env::var("PROFILE").map(|p| p == "debug").unwrap_or(false) {
        println!("cargo:rustc-cfg=feature=\"debug\"");
    }

    // Host builds only run the unit tests and the simulated tick sources
    let target = env::var("TARGET").unwrap_or_default();
    if target.contains("avr") {
        println!("cargo:rustc-link-arg=-mmcu=atmega128");
        println!("cargo:warning=Building for ATmega128 at {} Hz", freq);
    }
}
