//! SK6812 RGBW strip driver using the RMT peripheral.
//!
//! The hill is a 40-LED strip mounted along the contested table edge.
//! During a game the lit fraction shows how much of the session has
//! elapsed, in the owning team's color.

extern crate alloc;

use defmt::error;
use embassy_time::{
    Duration,
    Timer,
};
use esp_hal::{
    Blocking,
    gpio::Level,
    rmt::{
        PulseCode,
        Tx,
    },
};
use palette::Srgb;

/// Number of SK6812 LEDs on the strip.
pub const STRIP_LEN: usize = 40;

/// SK6812 strip driver.
///
/// Maintains an in-memory framebuffer that is flushed to hardware with
/// [`update`](Strip::update). The white channel of the RGBW LEDs is unused.
pub struct Strip<'a> {
    channel: Option<esp_hal::rmt::Channel<'a, Blocking, Tx>>,
    framebuffer: [Srgb<u8>; STRIP_LEN],
}

impl<'a> Strip<'a> {
    pub const fn new(channel: esp_hal::rmt::Channel<'a, Blocking, Tx>) -> Self {
        Self {
            channel: Some(channel),
            framebuffer: [Srgb::new(0, 0, 0); STRIP_LEN],
        }
    }

    /// Flush the framebuffer to the physical LEDs.
    pub async fn update(&mut self) {
        let Some(channel) = self.channel.take() else {
            error!("RMT channel lost during previous transmission");
            return;
        };

        let pulses = self
            .framebuffer
            .iter()
            .flat_map(|color| {
                // SK6812 expects GRBW byte order; white stays off.
                [
                    Self::byte_to_pulses(color.green),
                    Self::byte_to_pulses(color.red),
                    Self::byte_to_pulses(color.blue),
                    Self::byte_to_pulses(0),
                ]
                .into_iter()
                .flatten()
            })
            .chain(core::iter::once(PulseCode::end_marker()))
            .collect::<alloc::vec::Vec<_>>();

        let transaction = match channel.transmit(&pulses) {
            Ok(t) => t,
            Err(e) => {
                error!("RMT transmit failed: {}", e);
                return;
            }
        };

        self.channel = Some(match transaction.wait() {
            Ok(ch) => ch,
            Err((err, ch)) => {
                error!("RMT transaction failed: {}", err);
                ch
            }
        });

        // SK6812 reset time
        Timer::after(Duration::from_micros(80)).await;
    }

    /// Light the first `lit` LEDs in `color`, the rest off.
    pub fn set_progress(&mut self, lit: usize, color: Srgb<u8>) {
        for (i, led) in self.framebuffer.iter_mut().enumerate() {
            *led = if i < lit { color } else { Srgb::new(0, 0, 0) };
        }
    }

    /// Fill all LEDs with one colour.
    pub fn fill(&mut self, color: Srgb<u8>) {
        self.framebuffer.fill(color);
    }

    /// Turn all LEDs off.
    pub fn clear(&mut self) {
        self.fill(Srgb::new(0, 0, 0));
    }

    /// Number of LEDs on the strip.
    pub const fn len(&self) -> usize {
        STRIP_LEN
    }

    // ── Internal helpers ────────────────────────────────────────────────

    /// SK6812 bit timing at 40 MHz RMT clock.
    const fn bit_to_pulse(bit: bool) -> PulseCode {
        if bit {
            // '1': 0.6 µs high (24 ticks), 0.6 µs low (24 ticks)
            PulseCode::new(Level::High, 24, Level::Low, 24)
        } else {
            // '0': 0.3 µs high (12 ticks), 0.9 µs low (36 ticks)
            PulseCode::new(Level::High, 12, Level::Low, 36)
        }
    }

    fn byte_to_pulses(byte: u8) -> [PulseCode; 8] {
        let mut pulses = [PulseCode::default(); 8];
        for (i, pulse) in pulses.iter_mut().enumerate() {
            *pulse = Self::bit_to_pulse((byte >> (7 - i)) & 1 != 0);
        }
        pulses
    }
}

/// How many LEDs represent `elapsed` out of `duration` seconds.
pub fn progress_leds(elapsed_secs: u32, duration_secs: u32) -> usize {
    if duration_secs == 0 {
        return STRIP_LEN;
    }
    let lit = (elapsed_secs as u64 * STRIP_LEN as u64) / duration_secs as u64;
    (lit as usize).min(STRIP_LEN)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn progress_scales_with_elapsed_time() {
        assert_eq!(progress_leds(0, 900), 0);
        assert_eq!(progress_leds(450, 900), 20);
        assert_eq!(progress_leds(900, 900), 40);
        // Never beyond the physical strip.
        assert_eq!(progress_leds(1000, 900), 40);
    }
}
