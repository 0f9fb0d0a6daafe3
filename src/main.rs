//! Two-team "king of the hill" contest controller.
//!
//! A claim button per team drives a shared countdown session; the LED strip,
//! buzzer and OLED render it, and a dispatcher pushes state transitions to a
//! webhook over WiFi. Gameplay never waits for the network: the session is
//! guarded by one mutex, presentation workers poll consistent snapshots, and
//! notifications go through a bounded drop-on-full queue.

#![no_std]
#![no_main]

use defmt::{
    info,
    warn,
};
use embassy_executor::Spawner;
use embassy_net::{
    Runner,
    Stack,
    StackResources,
};
use embassy_sync::{
    blocking_mutex::raw::CriticalSectionRawMutex,
    mutex::Mutex,
};
use embassy_time::{
    Duration,
    Instant,
    Ticker,
    Timer,
};
use esp_backtrace as _;
use esp_hal::{
    interrupt::software::SoftwareInterruptControl,
    timer::timg::TimerGroup,
};
use esp_println as _;
use king_of_the_hill::{
    Buttons,
    Buzzer,
    Screen,
    Strip,
    config::{
        self,
        GameConfig,
    },
    mk_static,
    net::{
        self,
        HttpClient,
    },
    notify,
    progress_leds,
    session::{
        BuzzerPhase,
        GameSession,
        Phase,
    },
    split_resources,
};

extern crate alloc;

esp_bootloader_esp_idf::esp_app_desc!();

/// The single source of truth. Only the input task and the tick driver
/// mutate it; everyone else takes a snapshot inside the lock.
static SESSION: Mutex<CriticalSectionRawMutex, GameSession> =
    Mutex::new(GameSession::new(GameConfig::DEFAULT));

// Outbound-only TCP on a LAN; no strong randomness required.
const NET_SEED: u64 = 0x4b6f_7448_696c_6c21;

/// Button input path: one debounced press, one locked state transition,
/// one non-blocking enqueue.
#[embassy_executor::task]
async fn input_task(buttons: &'static mut Buttons) {
    info!("input task started");
    loop {
        let team = buttons.wait_for_claim().await;
        let event = SESSION.lock().await.apply_input(team);
        if let Some(event) = event {
            info!("input: {}", event);
            notify::enqueue(notify::notification_for(&event));
        }
    }
}

/// 1 Hz tick driver. `Ticker` schedules against absolute deadlines, so the
/// countdown does not drift over a long session.
#[embassy_executor::task]
async fn tick_task() {
    let mut ticker = Ticker::every(Duration::from_secs(1));
    loop {
        ticker.next().await;
        let event = SESSION.lock().await.apply_tick();
        if let Some(event) = event {
            info!("tick: {}", event);
            notify::enqueue(notify::notification_for(&event));
        }
    }
}

/// LED strip worker: progress bar while a game runs, full winner color once
/// it is over.
#[embassy_executor::task]
async fn strip_task(strip: &'static mut Strip<'static>) {
    loop {
        let snapshot = SESSION.lock().await.snapshot();
        match (snapshot.phase, snapshot.owner) {
            (Phase::Active, Some(team)) => {
                let lit = progress_leds(snapshot.elapsed_secs, snapshot.duration_secs);
                strip.set_progress(lit, team.color());
            }
            (Phase::Finished, Some(winner)) => strip.fill(winner.color()),
            _ => strip.clear(),
        }
        strip.update().await;
        Timer::after(Duration::from_millis(100)).await;
    }
}

/// Private end-of-game signal state for the buzzer worker. Re-armed when
/// the session returns to Idle, so the long tone fires once per game.
#[derive(Clone, Copy, PartialEq)]
enum EndSignal {
    Armed,
    Sounding { since: Instant },
    Done,
}

/// Buzzer worker: short pulse each second while a game runs, one long tone
/// when it finishes.
#[embassy_executor::task]
async fn buzzer_task(buzzer: &'static mut Buzzer) {
    let mut end_signal = EndSignal::Armed;
    loop {
        let snapshot = SESSION.lock().await.snapshot();
        match snapshot.buzzer {
            BuzzerPhase::Silent => {
                buzzer.off();
                end_signal = EndSignal::Armed;
                Timer::after(Duration::from_millis(100)).await;
            }
            BuzzerPhase::Ticking => {
                end_signal = EndSignal::Armed;
                buzzer.pulse(Duration::from_millis(10)).await;
                Timer::after(Duration::from_millis(990)).await;
            }
            BuzzerPhase::EndSignal => {
                match end_signal {
                    EndSignal::Armed => {
                        buzzer.on();
                        end_signal = EndSignal::Sounding {
                            since: Instant::now(),
                        };
                    }
                    EndSignal::Sounding { since } => {
                        if since.elapsed() >= Duration::from_secs(config::END_SIGNAL_SECS) {
                            buzzer.off();
                            end_signal = EndSignal::Done;
                        }
                    }
                    EndSignal::Done => {}
                }
                // Keep polling so a reset cuts the tone short.
                Timer::after(Duration::from_millis(100)).await;
            }
        }
    }
}

/// OLED worker.
#[embassy_executor::task]
async fn screen_task(screen: &'static mut Screen, stack: Stack<'static>) {
    loop {
        let snapshot = SESSION.lock().await.snapshot();
        screen.render(&snapshot, stack.is_config_up());
        Timer::after(Duration::from_millis(250)).await;
    }
}

/// Single consumer of the notification queue. Waits for the link, then
/// delivers each message with bounded retry; exhausted messages are logged
/// and discarded.
#[embassy_executor::task]
async fn dispatch_task(stack: Stack<'static>) {
    let mut client = HttpClient::new(stack);
    let policy = GameConfig::DEFAULT.retry;
    loop {
        let notification = notify::NOTIFICATIONS.receive().await;
        stack.wait_config_up().await;
        match notify::deliver_with_retry(&mut client, &notification, policy).await {
            Ok(()) => info!("delivered: {}", notification.as_str()),
            Err(err) => warn!(
                "discarding notification after {} attempts: {}",
                policy.attempts, err
            ),
        }
    }
}

#[embassy_executor::task]
async fn net_task(mut runner: Runner<'static, esp_radio::wifi::WifiDevice<'static>>) {
    runner.run().await;
}

#[embassy_executor::task]
async fn wifi_task(controller: esp_radio::wifi::WifiController<'static>) {
    net::maintain_wifi(controller).await;
}

#[esp_rtos::main]
async fn main(spawner: Spawner) -> ! {
    let peripherals = king_of_the_hill::init();
    let resources = split_resources!(peripherals);

    esp_alloc::heap_allocator!(size: 96 * 1024);

    let timg0 = TimerGroup::new(peripherals.TIMG0);
    let sw_int = SoftwareInterruptControl::new(peripherals.SW_INTERRUPT);
    esp_rtos::start(timg0.timer0, sw_int.software_interrupt0);

    // Gameplay peripherals. Failing to bring any of these up is fatal; the
    // game must not run without its inputs and outputs.
    let buttons = mk_static!(Buttons, resources.buttons.into());
    let buzzer = mk_static!(Buzzer, resources.buzzer.into());
    let strip = mk_static!(Strip<'static>, resources.strip.into());
    let screen = mk_static!(Screen, resources.screen.into());

    // Radio and network stack.
    let radio = mk_static!(
        esp_radio::Controller<'static>,
        esp_radio::init().expect("esp-radio init failed")
    );
    let (controller, interfaces) = esp_radio::wifi::new(
        radio,
        peripherals.WIFI,
        esp_radio::wifi::Config::default(),
    )
    .expect("WiFi driver init failed");

    let net_config = embassy_net::Config::dhcpv4(Default::default());
    let stack_resources = mk_static!(StackResources<4>, StackResources::new());
    let (stack, runner) = embassy_net::new(interfaces.sta, net_config, stack_resources, NET_SEED);

    spawner.must_spawn(net_task(runner));
    spawner.must_spawn(wifi_task(controller));
    spawner.must_spawn(dispatch_task(stack));
    spawner.must_spawn(input_task(buttons));
    spawner.must_spawn(tick_task());
    spawner.must_spawn(strip_task(strip));
    spawner.must_spawn(buzzer_task(buzzer));
    spawner.must_spawn(screen_task(screen, stack));

    info!(
        "king of the hill ready: {}s per game, notifying {}:{}",
        GameConfig::DEFAULT.duration_secs,
        defmt::Debug2Format(&config::NOTIFY_ADDR),
        config::NOTIFY_PORT
    );

    loop {
        Timer::after(Duration::from_secs(600)).await;
    }
}
