#![allow(dead_code)]

use chrono::{DateTime, Duration, TimeZone, Utc};
use ndarray_rand::rand::Rng;

use co2_calibration::bottle::BottleRegistry;
use co2_calibration::record::{BottleReference, RawRecord};

pub const LOW_BOTTLE: (u32, f64) = (1, 400.0);
pub const HIGH_BOTTLE: (u32, f64) = (2, 600.0);

/// The sensor reads `(true - INTERCEPT) / SLOPE`
pub const SLOPE: f64 = 1.03;
pub const INTERCEPT: f64 = -6.0;

pub const FIRST_BOTTLE_START: i64 = 120;
pub const FIRST_BOTTLE_LEN: i64 = 100;
pub const SECOND_BOTTLE_LEN: i64 = 60;
/// Minute of the day at which the last calibration sample is taken
pub const CALIBRATION_MINUTE: i64 = FIRST_BOTTLE_START + FIRST_BOTTLE_LEN + SECOND_BOTTLE_LEN - 1;

pub fn registry() -> BottleRegistry {
    BottleRegistry::new([
        BottleReference {
            bottle_id: LOW_BOTTLE.0,
            true_concentration: LOW_BOTTLE.1,
        },
        BottleReference {
            bottle_id: HIGH_BOTTLE.0,
            true_concentration: HIGH_BOTTLE.1,
        },
    ])
    .unwrap()
}

pub fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, 10, 0, 0, 0).unwrap()
}

/// Ambient concentration following a daily cycle
#[allow(clippy::cast_precision_loss)]
pub fn true_concentration(minute: i64) -> f64 {
    420.0 + 10.0 * (minute as f64 / 1440.0 * std::f64::consts::TAU).sin()
}

pub fn sensor_reading(true_value: f64) -> f64 {
    (true_value - INTERCEPT) / SLOPE
}

pub struct Stream {
    pub start: DateTime<Utc>,
    pub days: i64,
    /// Day whose second bottle reads so high that the calibration slope becomes 1.25
    pub rejected_day: Option<i64>,
    /// Minute (counted from `start`) at which a +300 ppm spike is injected
    pub spike: Option<i64>,
}

impl Default for Stream {
    fn default() -> Self {
        Self {
            start: start(),
            days: 3,
            rejected_day: None,
            spike: None,
        }
    }
}

#[allow(clippy::cast_precision_loss)]
fn exposure_bias(index: i64, len: i64) -> f64 {
    let position = index as f64 / len as f64;
    if position < 0.3 {
        // still settling after the valve switch
        25.0
    } else if position >= 0.95 {
        -40.0
    } else {
        0.0
    }
}

impl Stream {
    pub fn generate<R: Rng>(&self, rng: &mut R) -> Vec<RawRecord> {
        let mut records = Vec::new();
        for minute in 0..self.days * 1440 {
            let day = minute / 1440;
            let minute_of_day = minute % 1440;
            let timestamp = self.start + Duration::minutes(minute);
            let second_bottle_start = FIRST_BOTTLE_START + FIRST_BOTTLE_LEN;

            let row = if (FIRST_BOTTLE_START..second_bottle_start).contains(&minute_of_day) {
                let index = minute_of_day - FIRST_BOTTLE_START;
                let value = sensor_reading(LOW_BOTTLE.1)
                    + exposure_bias(index, FIRST_BOTTLE_LEN)
                    + rng.gen_range(-0.05..0.05);
                calibration_row(timestamp, LOW_BOTTLE.0, value)
            } else if (second_bottle_start..=CALIBRATION_MINUTE).contains(&minute_of_day) {
                let index = minute_of_day - second_bottle_start;
                let measured = if self.rejected_day == Some(day) {
                    sensor_reading(LOW_BOTTLE.1) + 160.0
                } else {
                    sensor_reading(HIGH_BOTTLE.1)
                };
                let value = measured
                    + exposure_bias(index, SECOND_BOTTLE_LEN)
                    + rng.gen_range(-0.05..0.05);
                calibration_row(timestamp, HIGH_BOTTLE.0, value)
            } else {
                let mut value =
                    sensor_reading(true_concentration(minute)) + rng.gen_range(-0.2..0.2);
                if self.spike == Some(minute) {
                    value += 300.0;
                }
                measurement_row(timestamp, value, minute)
            };
            records.push(row);
        }
        records
    }
}

fn calibration_row(timestamp: DateTime<Utc>, bottle_id: u32, value: f64) -> RawRecord {
    RawRecord {
        timestamp,
        cal_bottle_id: Some(bottle_id),
        cal_co2: Some(value),
        cal_temperature: Some(22.0),
        cal_humidity: Some(0.5),
        cal_pressure: Some(955.0),
        ..RawRecord::default()
    }
}

#[allow(clippy::cast_precision_loss)]
fn measurement_row(timestamp: DateTime<Utc>, co2_dry: f64, minute: i64) -> RawRecord {
    RawRecord {
        timestamp,
        co2: Some(co2_dry * 0.99),
        co2_dry: Some(co2_dry),
        temperature: Some(18.0),
        humidity: Some(55.0),
        pressure: Some(955.0),
        wind_speed: (minute % 10 == 0).then_some(2.5),
        wind_direction: (minute % 10 == 0).then_some(270.0),
        enclosure_temperature: (minute % 5 == 0).then_some(25.0),
        cpu_temperature: (minute % 5 == 0).then_some(48.0),
        edge_slope: (minute % 1440 == 0).then_some(1.01),
        edge_intercept: (minute % 1440 == 0).then_some(-2.0),
        ..RawRecord::default()
    }
}
