//! Sensorlink - UART sensor firmware
//!
//! Firmware binary for RP2040 boards with a particulate matter sensor on
//! UART0 and a GPS receiver on UART1. Each link runs its own read loop and
//! publishes decoded records into one shared state store.

#![no_std]
#![no_main]

use defmt::*;
use embassy_executor::Spawner;
use embassy_rp::bind_interrupts;
use embassy_rp::peripherals::{UART0, UART1};
use embassy_rp::uart::{
    BufferedInterruptHandler, Config as UartConfig, DataBits as RpDataBits, Parity as RpParity,
    StopBits as RpStopBits, Uart,
};
use embassy_time::{Duration, Ticker};
use static_cell::StaticCell;
use {defmt_rtt as _, panic_probe as _};

use sensorlink_drivers::{gps, pms};
use sensorlink_hal::uart::{DataBits, Parity, StopBits};
use sensorlink_hal::UartSettings;

use crate::channels::{Channels, SENSORS};

mod channels;
mod source;
mod tasks;

bind_interrupts!(struct Irqs {
    UART0_IRQ => BufferedInterruptHandler<UART0>;
    UART1_IRQ => BufferedInterruptHandler<UART1>;
});

// Static cells for UART buffers (must live forever)
static PMS_TX_BUF: StaticCell<[u8; 32]> = StaticCell::new();
static PMS_RX_BUF: StaticCell<[u8; 256]> = StaticCell::new();
static GPS_TX_BUF: StaticCell<[u8; 16]> = StaticCell::new();
static GPS_RX_BUF: StaticCell<[u8; 512]> = StaticCell::new();

/// Heartbeat log period
const HEARTBEAT_S: u64 = 60;

/// Main entry point
#[embassy_executor::main]
async fn main(spawner: Spawner) {
    info!("Sensorlink firmware starting...");

    let p = embassy_rp::init(Default::default());
    info!("Peripherals initialized");

    let channels = match Channels::register() {
        Ok(channels) => channels,
        Err(e) => {
            error!("Channel setup failed: {:?}", e);
            return;
        }
    };
    info!("{} channels registered", SENSORS.channel_count());

    // Particulate sensor on UART0 (TX=GPIO0, RX=GPIO1)
    let pms_settings = UartSettings::new_8n1(pms::BAUDRATE);
    let uart = Uart::new_blocking(p.UART0, p.PIN_0, p.PIN_1, uart_config(pms_settings));
    let uart = uart.into_buffered(Irqs, PMS_TX_BUF.init([0u8; 32]), PMS_RX_BUF.init([0u8; 256]));
    let (pms_tx, pms_rx) = uart.split();
    info!("UART0 initialized for PMS at {} baud", pms_settings.baudrate);

    // GPS receiver on UART1 (TX=GPIO4, RX=GPIO5)
    let gps_settings = UartSettings::new_8n1(gps::BAUDRATE);
    let uart = Uart::new_blocking(p.UART1, p.PIN_4, p.PIN_5, uart_config(gps_settings));
    let uart = uart.into_buffered(Irqs, GPS_TX_BUF.init([0u8; 16]), GPS_RX_BUF.init([0u8; 512]));
    // The receiver is never commanded; its TX half stays idle
    let (_gps_tx, gps_rx) = uart.split();
    info!("UART1 initialized for GPS at {} baud", gps_settings.baudrate);

    // Spawn tasks
    unwrap!(spawner.spawn(tasks::pms_task(pms_rx, pms_tx, channels.particulate)));
    unwrap!(spawner.spawn(tasks::gps_task(gps_rx, channels)));
    unwrap!(spawner.spawn(tasks::monitor_task(channels)));

    info!("All tasks spawned, system ready");

    let mut ticker = Ticker::every(Duration::from_secs(HEARTBEAT_S));
    loop {
        ticker.next().await;
        trace!("heartbeat");
    }
}

/// Translate board-independent line settings to the RP2040 UART config
fn uart_config(settings: UartSettings) -> UartConfig {
    let mut config = UartConfig::default();
    config.baudrate = settings.baudrate;
    config.data_bits = match settings.data_bits {
        DataBits::Seven => RpDataBits::DataBits7,
        DataBits::Eight => RpDataBits::DataBits8,
    };
    config.parity = match settings.parity {
        Parity::None => RpParity::ParityNone,
        Parity::Even => RpParity::ParityEven,
        Parity::Odd => RpParity::ParityOdd,
    };
    config.stop_bits = match settings.stop_bits {
        StopBits::One => RpStopBits::STOP1,
        StopBits::Two => RpStopBits::STOP2,
    };
    config
}
