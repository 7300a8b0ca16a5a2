use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

pub type SystemId = u32;
pub type BottleId = u32;

/// Anything positioned on the time axis of a system's stream
pub trait Timestamped {
    fn timestamp(&self) -> DateTime<Utc>;
}

/// One row of a system's raw acquisition stream
///
/// Every column apart from the timestamp is optional: measurement rows, calibration rows and
/// auxiliary rows share the same stream and only populate their own columns.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct RawRecord {
    pub timestamp: DateTime<Utc>,
    /// Wet CO2 mole fraction in ppm
    pub co2: Option<f64>,
    /// Dry CO2 mole fraction in ppm, derived from `co2` when absent
    pub co2_dry: Option<f64>,
    /// Sensor temperature in degrees Celsius
    pub temperature: Option<f64>,
    /// Relative humidity in percent
    pub humidity: Option<f64>,
    /// Pressure in hPa
    pub pressure: Option<f64>,

    pub cal_bottle_id: Option<BottleId>,
    pub cal_co2: Option<f64>,
    pub cal_temperature: Option<f64>,
    pub cal_humidity: Option<f64>,
    pub cal_pressure: Option<f64>,

    pub wind_speed: Option<f64>,
    pub wind_direction: Option<f64>,

    pub enclosure_temperature: Option<f64>,
    pub enclosure_humidity: Option<f64>,
    pub enclosure_pressure: Option<f64>,
    pub cpu_temperature: Option<f64>,
    pub ups_powered_by_grid: Option<f64>,
    pub ups_battery_charge: Option<f64>,

    pub edge_slope: Option<f64>,
    pub edge_intercept: Option<f64>,
    pub edge_humidity_offset: Option<f64>,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct MeasurementRecord {
    pub timestamp: DateTime<Utc>,
    pub system_id: SystemId,
    pub raw_dry_concentration: f64,
    pub temperature: f64,
    pub humidity: f64,
    pub pressure: f64,
}

/// A raw reading taken while the sensor was exposed to a reference bottle
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CalibrationSample {
    pub system_id: SystemId,
    pub bottle_id: BottleId,
    pub timestamp: DateTime<Utc>,
    pub measured_concentration: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub struct BottleReference {
    #[serde(rename = "cal_bottle_id")]
    pub bottle_id: BottleId,
    #[serde(rename = "cal_bottle_co2")]
    pub true_concentration: f64,
}

/// The robust estimate of one bottle exposure on one day
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CalibrationEvent {
    pub date: NaiveDate,
    pub system_id: SystemId,
    pub bottle_id: BottleId,
    pub robust_estimate: f64,
    pub last_sample_time: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct CalibrationCoefficient {
    pub timestamp: DateTime<Utc>,
    pub system_id: SystemId,
    pub slope: f64,
    pub intercept: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WindRecord {
    pub timestamp: DateTime<Utc>,
    pub system_id: SystemId,
    pub speed: f64,
    pub direction: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HousekeepingRecord {
    pub timestamp: DateTime<Utc>,
    pub system_id: SystemId,
    pub enclosure_temperature: f64,
    pub enclosure_humidity: Option<f64>,
    pub enclosure_pressure: Option<f64>,
    pub cpu_temperature: Option<f64>,
    pub ups_powered_by_grid: Option<f64>,
    pub ups_battery_charge: Option<f64>,
}

/// Calibration computed on the device itself, carried along for comparison
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeCalibrationRecord {
    pub timestamp: DateTime<Utc>,
    pub system_id: SystemId,
    pub slope: f64,
    pub intercept: f64,
    pub humidity_offset: Option<f64>,
}

/// How the coefficients of a corrected record were obtained
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Resolution {
    /// A coefficient lies within the matching tolerance
    Exact,
    /// Linear interpolation between the neighbouring coefficients
    Interpolated,
    /// The record precedes the timeline, the first coefficient is used
    ForwardFilled,
    /// The record follows the timeline, the last coefficient is used
    BackwardFilled,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CorrectedRecord {
    pub measurement: MeasurementRecord,
    pub slope: f64,
    pub intercept: f64,
    pub corrected_concentration: f64,
    pub resolution: Resolution,
    pub wind: Option<WindRecord>,
    pub housekeeping: Option<HousekeepingRecord>,
    pub edge_calibration: Option<EdgeCalibrationRecord>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Flag {
    #[serde(rename = "U")]
    Unflagged,
    #[serde(rename = "H")]
    Hampel,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FlaggedRecord {
    pub record: CorrectedRecord,
    pub flag: Flag,
}

macro_rules! impl_timestamped {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Timestamped for $ty {
                fn timestamp(&self) -> DateTime<Utc> {
                    self.timestamp
                }
            }
        )*
    };
}

impl_timestamped!(
    RawRecord,
    MeasurementRecord,
    CalibrationSample,
    CalibrationCoefficient,
    WindRecord,
    HousekeepingRecord,
    EdgeCalibrationRecord,
);

impl Timestamped for CorrectedRecord {
    fn timestamp(&self) -> DateTime<Utc> {
        self.measurement.timestamp
    }
}

impl Timestamped for FlaggedRecord {
    fn timestamp(&self) -> DateTime<Utc> {
        self.record.measurement.timestamp
    }
}
