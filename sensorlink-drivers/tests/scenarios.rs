//! End-to-end decoding of recorded sensor streams

use core::cell::Cell;

use embassy_futures::block_on;
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embedded_hal_async::delay::DelayNs;
use proptest::prelude::*;
use sensorlink_core::config::{ChannelConfig, SourceConfig};
use sensorlink_core::record::DecodedRecord;
use sensorlink_core::runtime::{LinkStats, LoopPhase, ReadLoop};
use sensorlink_core::store::{ChannelId, SensorStateStore};
use sensorlink_drivers::{gps, pms};
use sensorlink_hal::{Clock, SliceSource};
use sensorlink_protocol::{Checksum, Framing};

type Store = SensorStateStore<NoopRawMutex, 4>;

struct TestClock(Cell<u64>);

impl Clock for TestClock {
    fn now_ms(&self) -> u64 {
        // Every reading gets a distinct timestamp
        let now = self.0.get();
        self.0.set(now + 1_000);
        now
    }
}

struct NoDelay;

impl DelayNs for NoDelay {
    async fn delay_ns(&mut self, _ns: u32) {}
}

const GGA: &str = "$GPGGA,123519,4807.038,N,01131.000,E,1,08,0.9,545.4,M,46.9,M,,*47\r\n";

fn pms_frame(pm1_0: u16, pm2_5: u16, pm10_0: u16) -> Vec<u8> {
    let mut frame = vec![0x42, 0x4D, 0x00, 0x1C];
    for word in [pm1_0, pm2_5, pm10_0, pm1_0, pm2_5, pm10_0, 900, 300, 60, 6, 2, 0] {
        frame.extend_from_slice(&word.to_be_bytes());
    }
    frame.extend_from_slice(&[0x91, 0x00]);
    let sum = Checksum::additive16(&frame);
    frame.extend_from_slice(&sum.to_be_bytes());
    frame
}

/// Feed `data` through a read loop and return its counters
fn decode_stream(
    store: &Store,
    data: &[u8],
    framing: Framing,
    config: &SourceConfig,
    routes: &[(&'static sensorlink_core::decode::FrameSpec, ChannelId)],
) -> LinkStats {
    let clock = TestClock(Cell::new(0));
    let mut rl: ReadLoop<'_, _, _, _, _> =
        ReadLoop::new(SliceSource::new(data), NoDelay, &clock, store, framing, config).unwrap();
    for &(spec, channel) in routes {
        rl.route(spec, channel).unwrap();
    }

    for _ in 0..10_000 {
        if rl.source().is_exhausted() && rl.phase() == LoopPhase::Syncing && rl.pending() == 0 {
            return rl.stats();
        }
        block_on(rl.step()).unwrap();
    }
    panic!("read loop did not settle");
}

fn pms_store() -> (Store, ChannelId) {
    let store = Store::new();
    let ch = store
        .register(ChannelConfig::new("pms").unwrap().averaging("pm2_5_atm").unwrap())
        .unwrap();
    (store, ch)
}

fn decode_pms(data: &[u8]) -> (Store, ChannelId, LinkStats) {
    let (store, ch) = pms_store();
    let config = pms::source_config("pms").unwrap().with_min_interval(0);
    let stats = decode_stream(&store, data, pms::FRAMING, &config, &[(&pms::PARTICULATE, ch)]);
    (store, ch, stats)
}

#[test]
fn test_particulate_frame_decodes_to_reading() {
    let (store, ch, stats) = decode_pms(&pms_frame(5, 10, 8));

    assert_eq!(stats.published, 1);
    match store.latest(ch) {
        Some(DecodedRecord::Particulate(r)) => {
            assert_eq!((r.pm1_0, r.pm2_5, r.pm10_0), (5, 10, 8));
            assert_eq!(r.count_0_3, 900);
        }
        other => panic!("unexpected record {:?}", other),
    }
}

#[test]
fn test_particulate_average() {
    let mut data = Vec::new();
    for pm in [10, 20, 30] {
        data.extend_from_slice(&pms_frame(1, pm, 1));
    }
    let (store, ch, stats) = decode_pms(&data);

    assert_eq!(stats.published, 3);
    assert_eq!(store.average(ch), Some(20.0));
    assert_eq!(store.reading(ch).unwrap().received_at_ms, 2_000);
}

#[test]
fn test_particulate_corrupted_frame_is_skipped() {
    let mut bad = pms_frame(50, 50, 50);
    bad[9] ^= 0x01;
    let mut data = pms_frame(1, 2, 3);
    data.extend_from_slice(&bad);

    let (store, ch, stats) = decode_pms(&data);
    assert_eq!(stats.published, 1);
    assert_eq!(stats.checksum_errors, 1);
    match store.latest(ch) {
        Some(DecodedRecord::Particulate(r)) => assert_eq!(r.pm2_5, 2),
        other => panic!("unexpected record {:?}", other),
    }
}

fn gps_store() -> (Store, ChannelId, ChannelId) {
    let store = Store::new();
    let fix = store.register(ChannelConfig::new("gps.fix").unwrap()).unwrap();
    let vel = store.register(ChannelConfig::new("gps.vel").unwrap()).unwrap();
    (store, fix, vel)
}

fn decode_gps(store: &Store, fix: ChannelId, vel: ChannelId, data: &[u8]) -> LinkStats {
    let config = gps::source_config("gps").unwrap();
    decode_stream(
        store,
        data,
        gps::GP_FRAMING,
        &config,
        &[(&gps::GGA, fix), (&gps::VTG, vel), (&gps::RMC, fix)],
    )
}

#[test]
fn test_gga_sentence_decodes_to_fix() {
    let (store, fix, vel) = gps_store();
    let stats = decode_gps(&store, fix, vel, GGA.as_bytes());

    assert_eq!(stats.published, 1);
    match store.latest(fix) {
        Some(DecodedRecord::GpsFix(f)) => {
            assert!((f.latitude.unwrap() - 48.1173).abs() < 1e-4);
            assert!((f.longitude.unwrap() - 11.5167).abs() < 1e-4);
            assert_eq!(f.quality, 1);
            assert_eq!(f.satellites, 8);
        }
        other => panic!("unexpected record {:?}", other),
    }
}

#[test]
fn test_gga_with_wrong_checksum_is_not_published() {
    let (store, fix, vel) = gps_store();
    let bad = GGA.replace("*47", "*48");

    let stats = decode_gps(&store, fix, vel, bad.as_bytes());
    assert_eq!(stats.published, 0);
    assert_eq!(stats.checksum_errors, 1);
    assert_eq!(store.latest(fix), None);

    // A good sentence followed by the corrupted one keeps the good record
    let mut data = String::from(GGA);
    data.push_str(&bad);
    decode_gps(&store, fix, vel, data.as_bytes());
    assert_eq!(store.reading(fix).unwrap().sequence, 1);
}

#[test]
fn test_mixed_sentence_stream() {
    let (store, fix, vel) = gps_store();
    let data = concat!(
        "$GPGSV,1,1,00*79\r\n",
        "$GPGGA,123519,4807.0", // truncated by the next sentence
        "$GPVTG,054.7,T,034.4,M,005.5,N,010.2,K*48\r\n",
        "$GPRMC,123519,A,4807.038,N,01131.000,E,022.4,084.4,230394,003.1,W*6A\r\n",
    );

    let stats = decode_gps(&store, fix, vel, data.as_bytes());
    assert_eq!(stats.unsupported, 1);
    assert_eq!(stats.resync_truncated, 1);
    assert_eq!(stats.published, 2);

    match store.latest(vel) {
        Some(DecodedRecord::GpsVelocity(v)) => assert_eq!(v.speed_kph, Some(10.2)),
        other => panic!("unexpected record {:?}", other),
    }
    match store.latest(fix) {
        Some(DecodedRecord::GpsRecommended(r)) => {
            assert!(r.active);
            assert_eq!(r.date.map(|d| d.year), Some(1994));
        }
        other => panic!("unexpected record {:?}", other),
    }
}

proptest! {
    #[test]
    fn prop_garbage_then_one_frame_yields_one_record(
        garbage in proptest::collection::vec(any::<u8>(), 0..200),
        pm in any::<u16>(),
    ) {
        // No start pattern in the noise
        let mut data: Vec<u8> = garbage
            .into_iter()
            .map(|b| if b == 0x4D { 0x4E } else { b })
            .collect();
        data.extend_from_slice(&pms_frame(pm, pm, pm));

        let (store, ch, stats) = decode_pms(&data);
        prop_assert_eq!(stats.published, 1);
        match store.latest(ch) {
            Some(DecodedRecord::Particulate(r)) => prop_assert_eq!(r.pm2_5, pm),
            other => prop_assert!(false, "unexpected record {:?}", other),
        }
    }
}
