//! Water-routing slave board: main entry point.
//!
//! Hexagonal architecture, three FreeRTOS tasks.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter     LogEventSink   NvsConfigStore  SystemClock│
//! │  (Device+Indicator)  (EventSink)    (ConfigPort)    (Clock)    │
//! │  PeerHandle          SharedTankState                           │
//! │  (PeerLink)          (TankLevelPort)                           │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │            CaseOrchestrator (pure logic)               │    │
//! │  │  transition rule · guard · apply sequence · watchdog   │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//!
//!  buttons task ──Click──▶ ┌──────────────┐ ◀──SetAux/RequestCase── comms task
//!      (20 Hz)             │ command chan │                          (UART)
//!                          └──────┬───────┘
//!                                 ▼
//!                        orchestrator task (1 Hz housekeeping)
//! ```
#![deny(unused_must_use)]

// ── Imports ───────────────────────────────────────────────────
use std::sync::Arc;
use std::thread;

use anyhow::Result;
use log::{info, warn};

use esp_idf_svc::hal::gpio::{AnyIOPin, AnyInputPin, AnyOutputPin, Input, Output, PinDriver, Pull};
use esp_idf_svc::hal::i2c::{I2cConfig, I2cDriver};
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::hal::prelude::*;
use esp_idf_svc::hal::uart::{UartDriver, config::Config as UartConfig};
use esp_idf_svc::nvs::EspDefaultNvsPartition;

use vanwater::adapters::hardware::HardwareAdapter;
use vanwater::adapters::log_sink::LogEventSink;
use vanwater::adapters::nvs::NvsConfigStore;
use vanwater::adapters::tank_levels::SharedTankState;
use vanwater::adapters::time::SystemClock;
use vanwater::adapters::uart::UartTransport;
use vanwater::app::commands::{AppCommand, CommandChannel};
use vanwater::app::events::AppEvent;
use vanwater::app::ports::{Clock, ConfigPort, EventSink, PeerCommand};
use vanwater::app::service::CaseOrchestrator;
use vanwater::buttons::ButtonId;
use vanwater::comms::link::{PeerChannels, PeerHandle};
use vanwater::comms::task::PeerComms;
use vanwater::config::SystemConfig;
use vanwater::drivers::button::{ButtonClassifier, ButtonFlags, PhysicalButtons};
use vanwater::drivers::current_sensor::{AddressLines, CurrentSense};
use vanwater::drivers::shift_register::{OutputDriver, ShiftRegisterPins};
use vanwater::pins;

/// Orchestrator command-queue poll step.
const COMMAND_POLL_MS: u32 = 20;
/// Comms task service period.
const COMMS_POLL_MS: u32 = 10;
/// Telemetry every N housekeeping ticks.
const TELEMETRY_EVERY: u32 = 10;

const TASK_STACK: usize = 8 * 1024;

type OutPin = PinDriver<'static, AnyOutputPin, Output>;
type InPin = PinDriver<'static, AnyInputPin, Input>;

fn output_pin(gpio: i32) -> Result<OutPin> {
    // SAFETY: every GPIO number in `pins` is claimed once, during boot.
    let pin = unsafe { AnyOutputPin::new(gpio) };
    Ok(PinDriver::output(pin)?)
}

fn button_pin(gpio: i32) -> Result<InPin> {
    // SAFETY: as above.
    let pin = unsafe { AnyInputPin::new(gpio) };
    let mut driver = PinDriver::input(pin)?;
    driver.set_pull(Pull::Up)?;
    Ok(driver)
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  VanWater slave v{}                  ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let peripherals = Peripherals::take()?;
    let clock = SystemClock::new();

    // ── 2. Load config from NVS (or defaults) ─────────────────
    let store = EspDefaultNvsPartition::take()
        .map_err(|e| warn!("NVS partition unavailable ({}), using defaults", e))
        .ok()
        .and_then(|partition| NvsConfigStore::new(partition).ok());
    let config = match store.as_ref().map(ConfigPort::load) {
        Some(Ok(cfg)) => cfg,
        Some(Err(e)) => {
            warn!("Config load failed ({}), using defaults", e);
            SystemConfig::default()
        }
        None => SystemConfig::default(),
    };
    info!("Config: {:?}", config);

    // ── 3. Output chain: safe state before enabling ───────────
    let chain = ShiftRegisterPins::new(
        output_pin(pins::SR_DS_GPIO)?,
        output_pin(pins::SR_SHCP_GPIO)?,
        output_pin(pins::SR_STCP_GPIO)?,
        output_pin(pins::SR_OE_GPIO)?,
        output_pin(pins::SR_MR_GPIO)?,
    )?;
    let outputs = Arc::new(OutputDriver::new(chain, clock, config.resource_lock_timeout_ms));
    outputs.set_all_outputs_safe()?;
    outputs.enable_outputs(true)?;
    info!("Output chain latched all-off and enabled");

    // ── 4. Current-sense front end ────────────────────────────
    let i2c = I2cDriver::new(
        peripherals.i2c0,
        // SAFETY: as above.
        unsafe { AnyIOPin::new(pins::I2C_SDA_GPIO) },
        unsafe { AnyIOPin::new(pins::I2C_SCL_GPIO) },
        &I2cConfig::new().baudrate(pins::I2C_FREQ_HZ.Hz().into()),
    )?;
    let address_lines = AddressLines::new(
        output_pin(pins::MUX_A0_GPIO)?,
        output_pin(pins::MUX_A1_GPIO)?,
        output_pin(pins::MUX_A2_GPIO)?,
    );
    let sense = CurrentSense::with_fallback(
        i2c,
        address_lines,
        clock,
        config.resource_lock_timeout_ms,
    );

    // ── 5. Shared state between tasks ─────────────────────────
    let commands: Arc<CommandChannel> = Arc::new(CommandChannel::new());
    let channels = PeerChannels::new();
    let tank = SharedTankState::new();
    let simulated = ButtonFlags::new();
    let virtual_flags = ButtonFlags::new();

    // ── 6. Buttons task ───────────────────────────────────────
    let mut physical = PhysicalButtons::new();
    for button in ButtonId::ALL {
        if let Some(gpio) = button.gpio() {
            physical = physical.with_pin(button, button_pin(gpio)?);
        }
    }
    let mut classifier =
        ButtonClassifier::standard(&config, simulated.clone(), physical, virtual_flags.clone());
    let button_cmds = commands.clone();
    let button_period = config.button_poll_interval_ms;
    thread::Builder::new()
        .name("buttons".into())
        .stack_size(TASK_STACK)
        .spawn(move || {
            loop {
                for event in classifier.poll(clock.now_ms()) {
                    if button_cmds.try_send(AppCommand::Click(event)).is_err() {
                        warn!("buttons: command queue full, {} dropped", event.button);
                    }
                }
                clock.sleep_ms(button_period);
            }
        })?;

    // ── 7. Peer comms task ────────────────────────────────────
    let uart = UartDriver::new(
        peripherals.uart1,
        // SAFETY: as above.
        unsafe { AnyIOPin::new(pins::PEER_UART_TX_GPIO) },
        unsafe { AnyIOPin::new(pins::PEER_UART_RX_GPIO) },
        Option::<AnyIOPin>::None,
        Option::<AnyIOPin>::None,
        &UartConfig::new().baudrate(Hertz(pins::PEER_UART_BAUD)),
    )?;
    let mut comms = PeerComms::new(
        UartTransport::new(uart),
        clock,
        channels.clone(),
        config.peer_state_period_ms,
    )
    .with_buttons(simulated, virtual_flags)
    .with_tank_state(tank.clone());
    let peer_cmds = commands.clone();
    comms.register_command_callback(move |cmd| match cmd {
        PeerCommand::SetHood(on) => peer_cmds.try_send(AppCommand::SetAux(on)).is_ok(),
        PeerCommand::RequestCase(case) => {
            peer_cmds.try_send(AppCommand::RequestCase(case)).is_ok()
        }
        _ => false,
    });
    thread::Builder::new()
        .name("comms".into())
        .stack_size(TASK_STACK)
        .spawn(move || {
            loop {
                if let Err(e) = comms.poll() {
                    warn!("comms: {}", e);
                }
                clock.sleep_ms(COMMS_POLL_MS);
            }
        })?;

    // ── 8. Orchestrator (this task) ───────────────────────────
    let mut hw = HardwareAdapter::new(outputs, sense, clock, &config);
    let mut peer = PeerHandle::new(channels, clock, &config);
    let mut sink = LogEventSink::new();
    let mut orchestrator = CaseOrchestrator::new(config, clock);
    orchestrator.start(&mut hw, &mut peer, &mut sink);

    info!("System ready. Entering orchestrator loop.");

    let mut last_tick = clock.now_ms();
    let mut ticks: u32 = 0;
    loop {
        while let Ok(cmd) = commands.try_receive() {
            // Failures are recorded and reported inside the orchestrator.
            let _ = orchestrator.handle_command(cmd, &mut hw, &tank, &mut peer, &mut sink);
        }

        let now = clock.now_ms();
        let period = u64::from(orchestrator.config().orchestrator_interval_ms);
        if now.saturating_sub(last_tick) >= period {
            last_tick = now;
            let _ = orchestrator.watchdog_tick(&mut hw, &tank, &mut peer, &mut sink);

            ticks = ticks.wrapping_add(1);
            if ticks % TELEMETRY_EVERY == 0 {
                hw.sample_all();
                sink.emit(&AppEvent::Telemetry(orchestrator.build_telemetry(&hw, &tank)));
            }
        }

        clock.sleep_ms(COMMAND_POLL_MS);
    }
}
