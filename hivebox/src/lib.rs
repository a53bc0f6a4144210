//! HiveBox - average outdoor temperature from a fixed set of senseBoxes
//!
//! The service exposes two read endpoints:
//! - `GET /version`: the build version string
//! - `GET /temperature`: the rounded mean of the latest temperature reading
//!   of each configured senseBox, fetched from the openSenseMap API

pub mod api;
pub mod config;
pub mod error;
pub mod sensebox;
pub mod temperature;
pub mod version;

pub use api::{router, AppState};
pub use config::ServiceConfig;
pub use error::{TemperatureError, TemperatureResult};
pub use sensebox::SenseBoxClient;
pub use temperature::{TemperatureAggregator, SENSEBOX_IDS};
pub use version::VERSION;
