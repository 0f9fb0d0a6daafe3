//! WiFi station bring-up and the HTTP notification client.
//!
//! Both sides of the network boundary live here: keeping the station
//! associated (with automatic reconnect) and pushing one notification text
//! per request to the configured endpoint. Nothing in this module feeds
//! back into game state — a dead link only ever stalls the dispatcher.

extern crate alloc;

use alloc::string::ToString as _;
use core::fmt::Write as _;

use defmt::{
    Debug2Format,
    info,
    warn,
};
use embassy_net::{
    IpEndpoint,
    Stack,
    tcp::TcpSocket,
};
use embassy_time::{
    Duration,
    Timer,
};
use embedded_io_async::Write as _;
use esp_radio::wifi::{
    ClientConfig,
    ModeConfig,
    WifiController,
    WifiEvent,
    WifiStaState,
    sta_state,
};
use heapless::String;

use crate::{
    config,
    notify::{
        NotifyClient,
        NotifyError,
    },
};

const RECONNECT_DELAY: Duration = Duration::from_secs(5);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Keep the station associated with the configured network forever.
///
/// Runs the start → connect → wait-for-disconnect cycle; every drop is
/// retried after a short pause. Holding the controller here also keeps the
/// radio alive.
pub async fn maintain_wifi(mut controller: WifiController<'static>) -> ! {
    info!("WiFi supervisor started, SSID {}", config::WIFI_SSID);
    loop {
        if sta_state() == WifiStaState::Connected {
            controller.wait_for_event(WifiEvent::StaDisconnected).await;
            warn!("WiFi link lost");
            Timer::after(RECONNECT_DELAY).await;
        }

        if !matches!(controller.is_started(), Ok(true)) {
            let client_config = ClientConfig::default()
                .with_ssid(config::WIFI_SSID.to_string())
                .with_password(config::WIFI_PASSWORD.to_string());
            controller
                .set_config(&ModeConfig::Client(client_config))
                .expect("invalid WiFi station config");
            controller
                .start_async()
                .await
                .expect("WiFi start failed");
        }

        match controller.connect_async().await {
            Ok(()) => info!("WiFi associated"),
            Err(err) => {
                warn!("WiFi connect failed: {}", Debug2Format(&err));
                Timer::after(RECONNECT_DELAY).await;
            }
        }
    }
}

/// Plain-HTTP notification client: one `POST` per delivery attempt.
pub struct HttpClient {
    stack: Stack<'static>,
    endpoint: IpEndpoint,
}

impl HttpClient {
    pub fn new(stack: Stack<'static>) -> Self {
        Self {
            stack,
            endpoint: IpEndpoint::new(config::NOTIFY_ADDR.into(), config::NOTIFY_PORT),
        }
    }
}

impl NotifyClient for HttpClient {
    async fn post(&mut self, text: &str) -> Result<(), NotifyError> {
        let mut rx_buffer = [0u8; 512];
        let mut tx_buffer = [0u8; 512];
        let mut socket = TcpSocket::new(self.stack, &mut rx_buffer, &mut tx_buffer);
        socket.set_timeout(Some(REQUEST_TIMEOUT));

        socket
            .connect(self.endpoint)
            .await
            .map_err(|_| NotifyError::Connect)?;

        let mut header: String<256> = String::new();
        write!(
            header,
            "POST {path} HTTP/1.1\r\nHost: {addr}\r\nContent-Type: text/plain\r\nContent-Length: {len}\r\nConnection: close\r\n\r\n",
            path = config::NOTIFY_PATH,
            addr = config::NOTIFY_ADDR,
            len = text.len(),
        )
        .map_err(|_| NotifyError::Io)?;

        socket
            .write_all(header.as_bytes())
            .await
            .map_err(|_| NotifyError::Io)?;
        socket
            .write_all(text.as_bytes())
            .await
            .map_err(|_| NotifyError::Io)?;
        socket.flush().await.map_err(|_| NotifyError::Io)?;

        let mut reply = [0u8; 128];
        let n = socket.read(&mut reply).await.map_err(|_| NotifyError::Io)?;
        socket.close();

        match status_code(&reply[..n]) {
            Some(status) if (200..300).contains(&status) => Ok(()),
            Some(status) => Err(NotifyError::Status(status)),
            None => Err(NotifyError::Io),
        }
    }
}

/// Pull the status code out of an HTTP response head.
fn status_code(reply: &[u8]) -> Option<u16> {
    let text = core::str::from_utf8(reply).ok()?;
    let mut parts = text.split(' ');
    let version = parts.next()?;
    if !version.starts_with("HTTP/") {
        return None;
    }
    parts.next()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_status_lines() {
        assert_eq!(status_code(b"HTTP/1.1 200 OK\r\n"), Some(200));
        assert_eq!(status_code(b"HTTP/1.1 204 No Content\r\n\r\n"), Some(204));
        assert_eq!(status_code(b"HTTP/1.0 503 Unavailable\r\n"), Some(503));
    }

    #[test]
    fn rejects_garbage() {
        assert_eq!(status_code(b""), None);
        assert_eq!(status_code(b"not http at all"), None);
        assert_eq!(status_code(b"HTTP/1.1 abc\r\n"), None);
    }
}
