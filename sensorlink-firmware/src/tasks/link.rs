//! Shared read loop driver for the sensor link tasks

use defmt::*;
use embassy_time::{Delay, Duration, Instant, Timer};

use sensorlink_core::config::SourceConfig;
use sensorlink_core::decode::FrameSpec;
use sensorlink_core::runtime::ReadLoop;
use sensorlink_core::store::ChannelId;
use sensorlink_hal::ByteSource;
use sensorlink_protocol::Framing;

use crate::channels::SENSORS;
use crate::source::EmbassyClock;

/// First back-off after a link fault
const RETRY_MIN_MS: u64 = 500;

/// Back-off ceiling
const RETRY_MAX_MS: u64 = 30_000;

/// A link that ran this long before faulting starts over at the minimum back-off
const STABLE_RUN_MS: u64 = 60_000;

/// Decode `source` into the shared store until the end of time
///
/// After a link fault the source is reinitialized and the same read loop
/// resumes, with an exponential back-off between attempts. Configuration
/// errors park the task.
pub async fn serve<S: ByteSource>(
    source: S,
    framing: Framing,
    config: &SourceConfig,
    routes: &[(&'static FrameSpec, ChannelId)],
) -> ! {
    let built: Result<ReadLoop<'_, S, Delay, EmbassyClock, _>, _> =
        ReadLoop::new(source, Delay, EmbassyClock, &SENSORS, framing, config);
    let mut link = match built {
        Ok(link) => link,
        Err(e) => {
            error!("{}: invalid link config: {:?}", config.label.as_str(), e);
            park().await
        }
    };

    for &(spec, channel) in routes {
        if let Err(e) = link.route(spec, channel) {
            error!("{}: cannot route {}: {:?}", link.label(), spec.name, e);
            park().await
        }
    }

    let mut backoff_ms = RETRY_MIN_MS;

    loop {
        let started = Instant::now();
        let fault = link.run().await;
        let stats = link.stats();
        warn!(
            "{}: link fault {:?} ({} published, {} store rejects, {} bad frames, {} resyncs)",
            link.label(),
            fault,
            stats.published,
            stats.rejected,
            stats.bad_frames(),
            stats.resyncs()
        );

        if started.elapsed() >= Duration::from_millis(STABLE_RUN_MS) {
            backoff_ms = RETRY_MIN_MS;
        }

        // Retry reinitialization until the link comes back
        loop {
            Timer::after_millis(backoff_ms).await;
            backoff_ms = (backoff_ms * 2).min(RETRY_MAX_MS);

            match link.recover().await {
                Ok(()) => break,
                Err(kind) => warn!("{}: reinit failed: {:?}", link.label(), kind),
            }
        }
        info!("{}: link reinitialized", link.label());
    }
}

async fn park() -> ! {
    loop {
        Timer::after_secs(3600).await;
    }
}
