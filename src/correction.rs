use chrono::Duration;

use crate::record::{CorrectedRecord, MeasurementRecord};
use crate::timeline::CoefficientTimeline;
use crate::{Error, Result};

/// Apply the calibration timeline to every measurement
///
/// Each record receives the nearest coefficient within `tolerance`, an interpolated one between
/// calibrations, or the first/last coefficient outside the calibrated span. The corrected
/// concentration is `raw_dry * slope + intercept`. Auxiliary streams are left unattached.
///
/// # Errors
/// Returns [`Error::NoCalibration`] if the timeline is empty while there are records to correct.
pub fn apply_correction(
    measurements: &[MeasurementRecord],
    timeline: &CoefficientTimeline,
    tolerance: Duration,
) -> Result<Vec<CorrectedRecord>> {
    measurements
        .iter()
        .map(|measurement| {
            let coefficients = timeline
                .resolve(measurement.timestamp, tolerance)
                .ok_or(Error::NoCalibration(timeline.system_id()))?;
            Ok(CorrectedRecord {
                measurement: *measurement,
                slope: coefficients.slope,
                intercept: coefficients.intercept,
                corrected_concentration: measurement.raw_dry_concentration * coefficients.slope
                    + coefficients.intercept,
                resolution: coefficients.resolution,
                wind: None,
                housekeeping: None,
                edge_calibration: None,
            })
        })
        .collect()
}
