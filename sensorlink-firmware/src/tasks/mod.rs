//! Embassy async tasks
//!
//! One task per sensor link, plus a monitor reading the shared store.

mod link;

pub mod gps;
pub mod monitor;
pub mod pms;

pub use gps::gps_task;
pub use monitor::monitor_task;
pub use pms::pms_task;
