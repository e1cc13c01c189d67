//! Periodic health report of every channel

use defmt::*;
use embassy_time::{Duration, Instant, Ticker};

use sensorlink_core::snapshot::MAX_SNAPSHOT_LEN;
use sensorlink_core::store::{ChannelId, ChannelStatus};

use crate::channels::{Channels, SENSORS};

/// Report period in seconds
const REPORT_INTERVAL_S: u64 = 10;

/// Log status, rolling average and snapshot size per channel
#[embassy_executor::task]
pub async fn monitor_task(channels: Channels) {
    info!("Monitor task started");

    let mut ticker = Ticker::every(Duration::from_secs(REPORT_INTERVAL_S));

    loop {
        ticker.next().await;
        let now_ms = Instant::now().as_millis();

        for channel in channels.all() {
            report(channel, now_ms);
        }
    }
}

fn report(channel: ChannelId, now_ms: u64) {
    let Some(name) = SENSORS.name(channel) else {
        return;
    };

    let Some(snapshot) = SENSORS.snapshot(channel, now_ms) else {
        info!("{}: no data", name.as_str());
        return;
    };

    let mut buf = [0u8; MAX_SNAPSHOT_LEN];
    let encoded = match snapshot.encode(&mut buf) {
        Ok(bytes) => bytes.len(),
        Err(e) => {
            warn!("{}: snapshot encode failed: {:?}", name.as_str(), e);
            0
        }
    };

    let age_ms = now_ms.saturating_sub(snapshot.received_at_ms);
    match snapshot.status {
        ChannelStatus::Stale => warn!(
            "{}: stale, last {} {} ms ago",
            name.as_str(),
            snapshot.record.kind(),
            age_ms
        ),
        _ => info!(
            "{}: {} age={}ms avg={:?} samples={} ({} B)",
            name.as_str(),
            snapshot.record.kind(),
            age_ms,
            snapshot.average,
            SENSORS.sample_count(channel),
            encoded
        ),
    }
}
