//! Sensor driver descriptions
//!
//! This crate provides the concrete frame kinds decoded by
//! sensorlink-core for the supported serial sensors:
//!
//! - Particulate matter sensors (PMS5003/7003/9103M binary protocol)
//! - GPS receivers (NMEA 0183 GGA, VTG and RMC sentences)

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_code)]

pub mod gps;
pub mod pms;
