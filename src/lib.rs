//! # king-of-the-hill
//!
//! Firmware library for a two-team "king of the hill" contest controller
//! on an ESP32-S3 devkit:
//! - **Buttons**: one claim button per team (RED left, BLUE right) with debouncing
//! - **Strip**: 40× SK6812 addressable RGBW LEDs via RMT, used as a progress bar
//! - **Buzzer**: piezo buzzer for second ticks and the end-of-game signal
//! - **Screen**: 128×64 SSD1306 OLED over I²C showing the game status
//! - **Session**: the shared game state machine every task coordinates through
//! - **Notify**: bounded outbound queue + retrying webhook delivery
//!
//! ## Quick start
//!
//! ```rust,ignore
//! let peripherals = king_of_the_hill::init();
//! let resources = king_of_the_hill::split_resources!(peripherals);
//!
//! let buttons: king_of_the_hill::Buttons = resources.buttons.into();
//! let strip: king_of_the_hill::Strip = resources.strip.into();
//! let screen: king_of_the_hill::Screen = resources.screen.into();
//! ```

#![no_std]

mod buttons;
mod buzzer;
pub mod config;
pub mod net;
pub mod notify;
mod screen;
pub mod session;
mod strip;
pub mod timefmt;

pub use buttons::Buttons;
pub use buzzer::Buzzer;
use esp_hal::{
    Blocking,
    assign_resources,
    clock::CpuClock,
    gpio::{
        Level,
        Output,
        OutputConfig,
    },
    rmt::{
        Rmt,
        Tx,
        TxChannelConfig,
        TxChannelCreator as _,
    },
    time::Rate,
};
pub use screen::Screen;
pub use strip::{
    STRIP_LEN,
    Strip,
    progress_leds,
};

/// StaticCell helper — allocates a value into a `static` exactly once.
#[macro_export]
macro_rules! mk_static {
    ($t:ty, $val:expr) => {{
        static STATIC_CELL: static_cell::StaticCell<$t> = static_cell::StaticCell::new();
        #[deny(unused_attributes)]
        let x = STATIC_CELL.uninit().write($val);
        x
    }};
}

// ── Pin / peripheral assignments ────────────────────────────────────────────

assign_resources! {
    pub Resources<'d> {
        buttons: ButtonResources<'d> {
            left: GPIO47,
            right: GPIO21,
        },
        buzzer: BuzzerResources<'d> {
            pin: GPIO46,
        },
        strip: StripResources<'d> {
            io: GPIO3,
            rmt: RMT,
        },
        screen: ScreenResources<'d> {
            sda: GPIO48,
            scl: GPIO45,
            i2c: I2C0,
        },
    }
}

// ── Board initialisation ────────────────────────────────────────────────────

/// Initialise the board and return the raw peripheral set.
///
/// Call this once at the top of your `main`. Then use [`split_resources!`] to
/// break the peripherals into typed resource groups.
#[must_use]
pub fn init() -> esp_hal::peripherals::Peripherals {
    let config = esp_hal::Config::default().with_cpu_clock(CpuClock::max());
    esp_hal::init(config)
}

// ── Resource → peripheral conversions ───────────────────────────────────────

impl From<esp_hal::peripherals::Peripherals> for Resources<'_> {
    fn from(peripherals: esp_hal::peripherals::Peripherals) -> Self {
        split_resources!(peripherals)
    }
}

impl<'a> From<StripResources<'a>> for esp_hal::rmt::Channel<'a, Blocking, Tx> {
    fn from(res: StripResources<'a>) -> Self {
        let rmt = Rmt::new(res.rmt, Rate::from_mhz(40)).expect("RMT init failed");
        let tx_config = TxChannelConfig::default().with_clk_divider(1);
        rmt.channel0
            .configure_tx(res.io, tx_config)
            .expect("RMT TX channel config failed")
    }
}

impl<'a> From<StripResources<'a>> for Strip<'a> {
    fn from(res: StripResources<'a>) -> Self {
        Strip::new(res.into())
    }
}

impl From<BuzzerResources<'static>> for Buzzer {
    fn from(res: BuzzerResources<'static>) -> Self {
        Buzzer::new(Output::new(res.pin, Level::Low, OutputConfig::default()))
    }
}
