//! Outbound notification queue and delivery policy.
//!
//! State transitions produce a short text message for a remote endpoint.
//! The queue decouples gameplay from network reachability: producers
//! (button input, tick driver) never block — on overflow the newest message
//! is dropped and counted. The single dispatcher consumer drains the queue
//! in FIFO order and delivers each message with a bounded retry; delivery is
//! best-effort and never touches game state.

use core::sync::atomic::{
    AtomicU32,
    Ordering,
};

use defmt::warn;
use embassy_sync::{
    blocking_mutex::raw::CriticalSectionRawMutex,
    channel::Channel,
};
use embassy_time::{
    Duration,
    Timer,
};
use heapless::String;

use crate::{
    config::{
        QUEUE_CAPACITY,
        RetryPolicy,
    },
    session::GameEvent,
    timefmt::format_remaining,
};

/// Upper bound on a single notification text.
pub const MAX_NOTIFICATION_LEN: usize = 128;

/// One immutable outbound message. Ownership moves into the queue on
/// enqueue and out again when the dispatcher receives it.
pub type Notification = String<MAX_NOTIFICATION_LEN>;

type NotifyChannel = Channel<CriticalSectionRawMutex, Notification, QUEUE_CAPACITY>;

/// The bounded outbound queue. Producers use [`enqueue`], the dispatcher
/// task is the sole consumer.
pub static NOTIFICATIONS: NotifyChannel = Channel::new();

static DROPPED: AtomicU32 = AtomicU32::new(0);

/// Render a [`GameEvent`] into its notification text.
pub fn notification_for(event: &GameEvent) -> Notification {
    use core::fmt::Write as _;

    let mut text = Notification::new();
    let _ = match *event {
        GameEvent::Started { team } => {
            write!(text, "Game started by team {}", team.name())
        }
        GameEvent::Captured {
            team,
            remaining_secs,
        } => {
            write!(
                text,
                "Team {} took the hill, {} left",
                team.name(),
                format_remaining(remaining_secs).as_str()
            )
        }
        GameEvent::Halfway { remaining_secs } => {
            write!(
                text,
                "Halfway point, {} left",
                format_remaining(remaining_secs).as_str()
            )
        }
        GameEvent::GameOver { winner } => {
            write!(text, "Game over, team {} won", winner.name())
        }
        GameEvent::Reset { winner } => {
            write!(text, "Game over, team {} won. Ready for a new game", winner.name())
        }
    };
    text
}

/// Non-blocking enqueue with a drop-newest overflow policy.
///
/// Safe to call from the input path: a full queue drops the message and
/// bumps the counter instead of waiting for the dispatcher.
pub fn enqueue(notification: Notification) {
    if !try_enqueue(&NOTIFICATIONS, &DROPPED, notification) {
        warn!(
            "notification queue full, {} dropped so far",
            DROPPED.load(Ordering::Relaxed)
        );
    }
}

/// Number of notifications dropped because the queue was full.
pub fn dropped_count() -> u32 {
    DROPPED.load(Ordering::Relaxed)
}

fn try_enqueue<const N: usize>(
    queue: &Channel<CriticalSectionRawMutex, Notification, N>,
    dropped: &AtomicU32,
    notification: Notification,
) -> bool {
    if queue.try_send(notification).is_err() {
        dropped.fetch_add(1, Ordering::Relaxed);
        return false;
    }
    true
}

/// Why a delivery attempt failed.
#[derive(Clone, Copy, PartialEq, Eq, Debug, defmt::Format)]
pub enum NotifyError {
    /// TCP connect failed or timed out.
    Connect,
    /// The connection dropped mid-request or the reply was unreadable.
    Io,
    /// The endpoint answered with a non-2xx status.
    Status(u16),
}

/// A single POST-style delivery attempt to the remote endpoint.
pub trait NotifyClient {
    async fn post(&mut self, text: &str) -> Result<(), NotifyError>;

    /// Pause between attempts. A default so tests can override it with an
    /// immediate return instead of a clock.
    async fn backoff(&mut self, delay: Duration) {
        Timer::after(delay).await;
    }
}

/// Deliver one notification, retrying up to `policy.attempts` times with
/// `policy.delay` between attempts. Exhaustion returns the last error; the
/// caller logs and discards.
pub async fn deliver_with_retry<C: NotifyClient>(
    client: &mut C,
    notification: &Notification,
    policy: RetryPolicy,
) -> Result<(), NotifyError> {
    let mut attempt = 1u8;
    loop {
        match client.post(notification.as_str()).await {
            Ok(()) => return Ok(()),
            Err(err) if attempt < policy.attempts => {
                warn!(
                    "delivery attempt {}/{} failed: {}",
                    attempt, policy.attempts, err
                );
                client.backoff(policy.delay).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use core::{
        future::Future,
        pin::pin,
        task::{
            Context,
            Poll,
            RawWaker,
            RawWakerVTable,
            Waker,
        },
    };

    use super::*;
    use crate::session::Team;

    /// Drive a future that never actually suspends.
    fn block_on<F: Future>(fut: F) -> F::Output {
        const VTABLE: RawWakerVTable = RawWakerVTable::new(
            |_| RawWaker::new(core::ptr::null(), &VTABLE),
            |_| {},
            |_| {},
            |_| {},
        );
        let waker = unsafe { Waker::from_raw(RawWaker::new(core::ptr::null(), &VTABLE)) };
        let mut cx = Context::from_waker(&waker);
        let mut fut = pin!(fut);
        match fut.as_mut().poll(&mut cx) {
            Poll::Ready(out) => out,
            Poll::Pending => panic!("test future suspended"),
        }
    }

    struct FailingClient {
        posts: u32,
        backoffs: u32,
    }

    impl NotifyClient for FailingClient {
        async fn post(&mut self, _text: &str) -> Result<(), NotifyError> {
            self.posts += 1;
            Err(NotifyError::Connect)
        }

        async fn backoff(&mut self, _delay: Duration) {
            self.backoffs += 1;
        }
    }

    struct FlakyClient {
        failures_left: u32,
        posts: u32,
    }

    impl NotifyClient for FlakyClient {
        async fn post(&mut self, _text: &str) -> Result<(), NotifyError> {
            self.posts += 1;
            if self.failures_left > 0 {
                self.failures_left -= 1;
                return Err(NotifyError::Io);
            }
            Ok(())
        }

        async fn backoff(&mut self, _delay: Duration) {}
    }

    fn msg(text: &str) -> Notification {
        let mut out = Notification::new();
        out.push_str(text).unwrap();
        out
    }

    #[test]
    fn event_texts() {
        assert_eq!(
            notification_for(&GameEvent::Started { team: Team::Red }).as_str(),
            "Game started by team RED"
        );
        assert_eq!(
            notification_for(&GameEvent::Captured {
                team: Team::Blue,
                remaining_secs: 350,
            })
            .as_str(),
            "Team BLUE took the hill, 5m50s left"
        );
        assert_eq!(
            notification_for(&GameEvent::Halfway { remaining_secs: 450 }).as_str(),
            "Halfway point, 7m30s left"
        );
        assert_eq!(
            notification_for(&GameEvent::GameOver { winner: Team::Red }).as_str(),
            "Game over, team RED won"
        );
        assert_eq!(
            notification_for(&GameEvent::Reset { winner: Team::Blue }).as_str(),
            "Game over, team BLUE won. Ready for a new game"
        );
    }

    #[test]
    fn overflow_drops_newest_and_counts() {
        let queue: Channel<CriticalSectionRawMutex, Notification, 2> = Channel::new();
        let dropped = AtomicU32::new(0);

        assert!(try_enqueue(&queue, &dropped, msg("one")));
        assert!(try_enqueue(&queue, &dropped, msg("two")));
        assert!(!try_enqueue(&queue, &dropped, msg("three")));
        assert!(!try_enqueue(&queue, &dropped, msg("four")));

        assert_eq!(queue.len(), 2);
        assert_eq!(dropped.load(Ordering::Relaxed), 2);

        // FIFO order survives, the dropped messages are simply gone.
        assert_eq!(queue.try_receive().unwrap().as_str(), "one");
        assert_eq!(queue.try_receive().unwrap().as_str(), "two");
        assert!(queue.try_receive().is_err());
    }

    #[test]
    fn retry_gives_up_after_configured_attempts() {
        let mut client = FailingClient {
            posts: 0,
            backoffs: 0,
        };
        let policy = RetryPolicy {
            attempts: 3,
            delay: Duration::from_millis(2000),
        };

        let result = block_on(deliver_with_retry(&mut client, &msg("ping"), policy));
        assert_eq!(result, Err(NotifyError::Connect));
        assert_eq!(client.posts, 3);
        assert_eq!(client.backoffs, 2);
    }

    #[test]
    fn retry_stops_on_first_success() {
        let mut client = FlakyClient {
            failures_left: 1,
            posts: 0,
        };
        let policy = RetryPolicy::DEFAULT;

        let result = block_on(deliver_with_retry(&mut client, &msg("ping"), policy));
        assert_eq!(result, Ok(()));
        assert_eq!(client.posts, 2);
    }
}
