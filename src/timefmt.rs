//! Remaining-time formatting for the display and notification texts.

use core::fmt::Write as _;

use heapless::String;

/// Format a number of seconds as `"1h5m0s"` / `"5m50s"` / `"45s"`.
///
/// Hours appear only when nonzero, minutes when there is at least a minute
/// (or an hour) left, seconds always.
pub fn format_remaining(secs: u32) -> String<16> {
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;

    let mut out = String::new();
    if hours > 0 {
        let _ = write!(out, "{}h", hours);
    }
    if minutes > 0 || hours > 0 {
        let _ = write!(out, "{}m", minutes);
    }
    let _ = write!(out, "{}s", seconds);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seconds_only() {
        assert_eq!(format_remaining(0).as_str(), "0s");
        assert_eq!(format_remaining(45).as_str(), "45s");
    }

    #[test]
    fn minutes_and_seconds() {
        assert_eq!(format_remaining(60).as_str(), "1m0s");
        assert_eq!(format_remaining(350).as_str(), "5m50s");
        assert_eq!(format_remaining(900).as_str(), "15m0s");
    }

    #[test]
    fn hours_shown_only_when_nonzero() {
        assert_eq!(format_remaining(3900).as_str(), "1h5m0s");
        assert_eq!(format_remaining(3599).as_str(), "59m59s");
        assert_eq!(format_remaining(3600).as_str(), "1h0m0s");
    }
}
