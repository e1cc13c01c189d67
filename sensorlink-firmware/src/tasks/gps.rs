//! GPS receiver task

use defmt::*;
use embassy_rp::uart::BufferedUartRx;

use sensorlink_core::decode::{FrameSpec, Selector};
use sensorlink_drivers::gps::{self, sentence_description};

use super::link::serve;
use crate::channels::Channels;
use crate::source::UartSource;

/// Decode GGA, VTG and RMC sentences from a `$GP` talker
#[embassy_executor::task]
pub async fn gps_task(rx: BufferedUartRx, channels: Channels) {
    info!("GPS task started");

    let routes: [(&'static FrameSpec, _); 3] = [
        (&gps::GGA, channels.gps_fix),
        (&gps::VTG, channels.gps_velocity),
        (&gps::RMC, channels.gps_recommended),
    ];
    for (spec, _) in &routes {
        if let Selector::Sentence(id) = spec.selector {
            info!(
                "GPS: decoding {} ({})",
                id,
                sentence_description(id).unwrap_or("unknown")
            );
        }
    }

    let config = match gps::source_config("gps") {
        Ok(config) => config,
        Err(e) => {
            error!("GPS: bad source config: {:?}", e);
            return;
        }
    };

    serve(UartSource::new(rx), gps::GP_FRAMING, &config, &routes).await
}
