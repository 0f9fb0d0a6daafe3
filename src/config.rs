//! Build-time configuration surface with documented defaults.
//!
//! Everything here is fixed at compile time; the WiFi credentials and the
//! notification endpoint can be overridden through environment variables
//! when flashing a new venue.

use embassy_net::Ipv4Address;
use embassy_time::Duration;

/// Capacity of the outbound notification queue.
///
/// Channel capacity is a const generic, so this lives here rather than in
/// [`GameConfig`].
pub const QUEUE_CAPACITY: usize = 10;

/// How long the continuous end-of-game tone sounds, in seconds.
pub const END_SIGNAL_SECS: u64 = 10;

/// WiFi station credentials. Override with `KOTH_WIFI_SSID` /
/// `KOTH_WIFI_PASSWORD` at build time.
pub const WIFI_SSID: &str = match option_env!("KOTH_WIFI_SSID") {
    Some(v) => v,
    None => "hill-net",
};
pub const WIFI_PASSWORD: &str = match option_env!("KOTH_WIFI_PASSWORD") {
    Some(v) => v,
    None => "king-of-the-hill",
};

/// Notification endpoint — plain HTTP on the venue LAN.
pub const NOTIFY_ADDR: Ipv4Address = Ipv4Address::new(192, 168, 1, 10);
pub const NOTIFY_PORT: u16 = 8080;
pub const NOTIFY_PATH: &str = "/koth/events";

/// Bounded retry for notification delivery.
#[derive(Clone, Copy, Debug, defmt::Format)]
pub struct RetryPolicy {
    /// Total delivery attempts per message, at least 1.
    pub attempts: u8,
    /// Pause between attempts.
    pub delay: Duration,
}

impl RetryPolicy {
    pub const DEFAULT: Self = Self {
        attempts: 3,
        delay: Duration::from_millis(2000),
    };
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Game parameters.
#[derive(Clone, Copy, Debug, defmt::Format)]
pub struct GameConfig {
    /// Total countdown length in seconds. Default: 900 (15 minutes).
    pub duration_secs: u32,
    /// Delivery retry policy for outbound notifications.
    pub retry: RetryPolicy,
}

impl GameConfig {
    pub const DEFAULT: Self = Self {
        duration_secs: 900,
        retry: RetryPolicy::DEFAULT,
    };
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
