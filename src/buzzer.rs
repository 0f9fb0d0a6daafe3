//! Piezo buzzer control.

use embassy_time::{
    Duration,
    Timer,
};
use esp_hal::gpio::Output;

/// Drives the buzzer GPIO. Cadence lives in the buzzer worker; this type
/// only knows on, off and a timed pulse.
pub struct Buzzer {
    pin: Output<'static>,
}

impl Buzzer {
    pub const fn new(pin: Output<'static>) -> Self {
        Self { pin }
    }

    pub fn on(&mut self) {
        self.pin.set_high();
    }

    pub fn off(&mut self) {
        self.pin.set_low();
    }

    /// Sound for the given duration, then stop.
    pub async fn pulse(&mut self, duration: Duration) {
        self.on();
        Timer::after(duration).await;
        self.off();
    }
}
