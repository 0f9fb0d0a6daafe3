//! SSD1306 status screen — 128×64 monochrome OLED over I²C.
//!
//! Render is a pure function of one [`Snapshot`], redrawn whole each pass:
//! an idle prompt with the link indicator, the countdown and current owner
//! while a game runs, the winner once it is over.

use core::fmt::Write as _;

use defmt::{
    Debug2Format,
    error,
};
use embedded_graphics::{
    mono_font::{
        MonoTextStyle,
        ascii::{
            FONT_6X10,
            FONT_9X15,
        },
    },
    pixelcolor::BinaryColor,
    prelude::*,
    text::Text,
};
use esp_hal::{
    i2c::master::{
        Config as I2cConfig,
        I2c,
    },
    time::Rate,
};
use heapless::String;
use ssd1306::{
    I2CDisplayInterface,
    Ssd1306,
    mode::BufferedGraphicsMode,
    prelude::*,
};

use crate::{
    ScreenResources,
    session::{
        Phase,
        Snapshot,
    },
    timefmt::format_remaining,
};

type Driver = Ssd1306<
    I2CInterface<I2c<'static, esp_hal::Blocking>>,
    DisplaySize128x64,
    BufferedGraphicsMode<DisplaySize128x64>,
>;

/// The status screen, ready to draw on with `embedded-graphics`.
pub struct Screen {
    driver: Driver,
}

impl From<ScreenResources<'static>> for Screen {
    fn from(res: ScreenResources<'static>) -> Self {
        let i2c = I2c::new(
            res.i2c,
            I2cConfig::default().with_frequency(Rate::from_khz(400)),
        )
        .expect("I2C init failed")
        .with_sda(res.sda)
        .with_scl(res.scl);

        let interface = I2CDisplayInterface::new(i2c);
        let mut driver = Ssd1306::new(interface, DisplaySize128x64, DisplayRotation::Rotate0)
            .into_buffered_graphics_mode();
        driver.init().expect("SSD1306 init failed");

        Self { driver }
    }
}

impl Screen {
    /// Redraw the whole panel from one consistent state snapshot.
    pub fn render(&mut self, snapshot: &Snapshot, link_up: bool) {
        self.driver.clear_buffer();
        let small = MonoTextStyle::new(&FONT_6X10, BinaryColor::On);
        let large = MonoTextStyle::new(&FONT_9X15, BinaryColor::On);

        match snapshot.phase {
            Phase::Idle => {
                let _ = Text::new("Press to start", Point::new(2, 30), large)
                    .draw(&mut self.driver);
                let link = if link_up { "WiFi: up" } else { "WiFi: down" };
                let _ = Text::new(link, Point::new(2, 56), small).draw(&mut self.driver);
            }
            Phase::Active => {
                let mut line: String<32> = String::new();
                let _ = write!(
                    line,
                    "Time: {}",
                    format_remaining(snapshot.remaining_secs).as_str()
                );
                let _ = Text::new(&line, Point::new(2, 24), large).draw(&mut self.driver);

                line.clear();
                let owner = match snapshot.owner {
                    Some(team) => team.name(),
                    None => "NONE",
                };
                let _ = write!(line, "Currently: {}", owner);
                let _ = Text::new(&line, Point::new(2, 48), small).draw(&mut self.driver);
            }
            Phase::Finished => {
                let mut line: String<32> = String::new();
                let winner = match snapshot.owner {
                    Some(team) => team.name(),
                    None => "NOBODY",
                };
                let _ = write!(line, "{} wins!", winner);
                let _ = Text::new(&line, Point::new(2, 36), large).draw(&mut self.driver);
            }
        }

        if let Err(err) = self.driver.flush() {
            error!("display flush failed: {}", Debug2Format(&err));
        }
    }
}
