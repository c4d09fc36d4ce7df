//! ==============================================================================
//! domain.rs - synthetic sensor readings
//! ==============================================================================
//!
//! purpose:
//!     the one entity this program produces. a reading is built fresh for
//!     every cycle and serialized as the json body of the POST.
//!
//! wire format (exactly these four keys):
//!     {"sensor_id": "temp_01", "temperature": 24.7, "humidity": 58,
//!      "timestamp": "2025-06-01T12:00:00.123456Z"}
//!
//! ==============================================================================

use chrono::{DateTime, SecondsFormat, Utc};
use rand::Rng;
use serde::Serialize;

pub const BASE_TEMPERATURE: f64 = 25.0;
pub const TEMPERATURE_SPREAD: f64 = 4.0;
pub const BASE_HUMIDITY: f64 = 60.0;
pub const HUMIDITY_SPREAD: f64 = 5.0;

/// one simulated data point
///
/// fields are private: a reading is never modified after it is generated.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Reading {
    sensor_id: String,
    /// celsius, one decimal place
    temperature: f64,
    /// relative humidity in percent
    humidity: i64,
    timestamp: String,
}

/// `<prefix>_<nn>`, e.g. `temp_01`
pub fn sensor_id(prefix: &str, sensor_num: u32) -> String {
    format!("{}_{:02}", prefix, sensor_num)
}

impl Reading {
    /// generate a reading for `sensor_num` from the thread rng and the wall clock
    pub fn generate(prefix: &str, sensor_num: u32) -> Self {
        Self::generate_with(&mut rand::thread_rng(), Utc::now(), prefix, sensor_num)
    }

    pub fn generate_with<R: Rng + ?Sized>(
        rng: &mut R,
        now: DateTime<Utc>,
        prefix: &str,
        sensor_num: u32,
    ) -> Self {
        let temperature = round_tenths(
            BASE_TEMPERATURE + rng.gen_range(-TEMPERATURE_SPREAD..=TEMPERATURE_SPREAD),
        );
        let humidity = (BASE_HUMIDITY + rng.gen_range(-HUMIDITY_SPREAD..=HUMIDITY_SPREAD)).trunc() as i64;

        Self {
            sensor_id: sensor_id(prefix, sensor_num),
            temperature,
            humidity,
            timestamp: now.to_rfc3339_opts(SecondsFormat::Micros, true),
        }
    }

    pub fn sensor_id(&self) -> &str {
        &self.sensor_id
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    pub fn humidity(&self) -> i64 {
        self.humidity
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }
}

fn round_tenths(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
