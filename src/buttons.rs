//! Two-button team input with async debouncing.
//!
//! Left button claims for team RED, right button for team BLUE. Both are
//! active low with internal pull-ups; edge detection runs on the GPIO
//! interrupt, the settle delay filters contact bounce.

use embassy_futures::select::{
    Either,
    select,
};
use embassy_time::{
    Duration,
    Timer,
};
use esp_hal::gpio::{
    Input,
    InputConfig,
    Pull,
};

use crate::{
    ButtonResources,
    session::Team,
};

/// The two claim buttons, ready for async edge detection.
pub struct Buttons {
    pub left: Input<'static>,
    pub right: Input<'static>,
}

const DEBOUNCE_MS: u64 = 20;

impl From<ButtonResources<'static>> for Buttons {
    fn from(res: ButtonResources<'static>) -> Self {
        let pull_up = InputConfig::default().with_pull(Pull::Up);
        Self {
            left: Input::new(res.left, pull_up),
            right: Input::new(res.right, pull_up),
        }
    }
}

impl Buttons {
    /// Wait for a debounced press on either button and map it to its team.
    pub async fn wait_for_claim(&mut self) -> Team {
        match select(
            Self::debounce_press(&mut self.left),
            Self::debounce_press(&mut self.right),
        )
        .await
        {
            Either::First(()) => Team::Red,
            Either::Second(()) => Team::Blue,
        }
    }

    /// Wait for a debounced button press (falling edge, active low).
    pub async fn debounce_press(button: &mut Input<'_>) {
        loop {
            button.wait_for_falling_edge().await;
            Timer::after(Duration::from_millis(DEBOUNCE_MS)).await;
            if button.is_low() {
                return;
            }
        }
    }
}
