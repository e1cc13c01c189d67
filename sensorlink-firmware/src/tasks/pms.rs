//! Particulate sensor task

use defmt::*;
use embassy_rp::uart::{BufferedUartRx, BufferedUartTx};
use embassy_time::Timer;

use sensorlink_core::store::ChannelId;
use sensorlink_drivers::pms::{self, send_command, PmsCommand};

use super::link::serve;
use crate::source::UartSource;

/// Pause after each start-up command before the next one is accepted
const COMMAND_SETTLE_MS: u64 = 2_000;

/// Wake the sensor, switch it to streaming and decode its frames
#[embassy_executor::task]
pub async fn pms_task(rx: BufferedUartRx, mut tx: BufferedUartTx, channel: ChannelId) {
    info!("PMS task started");

    for command in [PmsCommand::Wakeup, PmsCommand::ActiveMode] {
        match send_command(&mut tx, command).await {
            Ok(()) => debug!("PMS: sent {:?}", command),
            Err(e) => warn!("PMS: {:?} failed: {:?}", command, e),
        }
        Timer::after_millis(COMMAND_SETTLE_MS).await;
    }

    let config = match pms::source_config("pms") {
        Ok(config) => config,
        Err(e) => {
            error!("PMS: bad source config: {:?}", e);
            return;
        }
    };

    serve(
        UartSource::new(rx),
        pms::FRAMING,
        &config,
        &[(&pms::PARTICULATE, channel)],
    )
    .await
}
