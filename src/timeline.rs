use chrono::{DateTime, Duration, Utc};

use crate::math::lerp;
use crate::record::{CalibrationCoefficient, Resolution, SystemId};

/// Slope and intercept chosen for one point in time
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Coefficients {
    pub slope: f64,
    pub intercept: f64,
    pub resolution: Resolution,
}

impl Coefficients {
    const fn from_coefficient(coefficient: &CalibrationCoefficient, resolution: Resolution) -> Self {
        Self {
            slope: coefficient.slope,
            intercept: coefficient.intercept,
            resolution,
        }
    }
}

/// Calibration coefficients of one system, strictly increasing in time
#[derive(Clone, Debug)]
pub struct CoefficientTimeline {
    system_id: SystemId,
    coefficients: Vec<CalibrationCoefficient>,
}

impl CoefficientTimeline {
    /// Build the timeline of `system_id`
    ///
    /// Coefficients of other systems are ignored. Entries sharing a timestamp collapse to the first
    /// one in input order.
    #[must_use]
    pub fn new(system_id: SystemId, coefficients: &[CalibrationCoefficient]) -> Self {
        let mut coefficients = coefficients
            .iter()
            .filter(|coefficient| coefficient.system_id == system_id)
            .copied()
            .collect::<Vec<_>>();
        coefficients.sort_by_key(|coefficient| coefficient.timestamp);
        coefficients.dedup_by_key(|coefficient| coefficient.timestamp);
        Self {
            system_id,
            coefficients,
        }
    }

    #[must_use]
    pub const fn system_id(&self) -> SystemId {
        self.system_id
    }

    #[must_use]
    pub fn coefficients(&self) -> &[CalibrationCoefficient] {
        &self.coefficients
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.coefficients.is_empty()
    }

    #[must_use]
    pub fn first(&self) -> Option<&CalibrationCoefficient> {
        self.coefficients.first()
    }

    #[must_use]
    pub fn last(&self) -> Option<&CalibrationCoefficient> {
        self.coefficients.last()
    }

    /// The coefficient closest to `timestamp` if it lies within `tolerance`
    ///
    /// When two coefficients are equally close the earlier one wins.
    #[must_use]
    pub fn nearest(
        &self,
        timestamp: DateTime<Utc>,
        tolerance: Duration,
    ) -> Option<&CalibrationCoefficient> {
        let idx = self
            .coefficients
            .partition_point(|coefficient| coefficient.timestamp < timestamp);
        let before = idx.checked_sub(1).map(|ii| &self.coefficients[ii]);
        let after = self.coefficients.get(idx);

        let closest = match (before, after) {
            (Some(before), Some(after)) => {
                if timestamp - before.timestamp <= after.timestamp - timestamp {
                    before
                } else {
                    after
                }
            }
            (Some(only), None) | (None, Some(only)) => only,
            (None, None) => return None,
        };
        let distance = if closest.timestamp >= timestamp {
            closest.timestamp - timestamp
        } else {
            timestamp - closest.timestamp
        };
        (distance <= tolerance).then_some(closest)
    }

    /// Interpolate slope and intercept linearly in time between the bracketing coefficients
    ///
    /// Returns `None` outside the span of the timeline.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn interpolate(&self, timestamp: DateTime<Utc>) -> Option<Coefficients> {
        let idx = self
            .coefficients
            .partition_point(|coefficient| coefficient.timestamp <= timestamp);
        if idx == 0 {
            return None;
        }
        let before = &self.coefficients[idx - 1];
        if before.timestamp == timestamp {
            return Some(Coefficients::from_coefficient(
                before,
                Resolution::Interpolated,
            ));
        }
        let after = self.coefficients.get(idx)?;

        let x = (timestamp - before.timestamp).num_milliseconds() as f64;
        let span = (after.timestamp - before.timestamp).num_milliseconds() as f64;
        Some(Coefficients {
            slope: lerp(0.0, before.slope, span, after.slope, x),
            intercept: lerp(0.0, before.intercept, span, after.intercept, x),
            resolution: Resolution::Interpolated,
        })
    }

    /// Coefficients for `timestamp` using the nearest entry within `tolerance`, then
    /// interpolation, then the first or last entry outside the span
    ///
    /// Returns `None` only for an empty timeline.
    #[must_use]
    pub fn resolve(&self, timestamp: DateTime<Utc>, tolerance: Duration) -> Option<Coefficients> {
        if let Some(coefficient) = self.nearest(timestamp, tolerance) {
            return Some(Coefficients::from_coefficient(coefficient, Resolution::Exact));
        }
        if let Some(coefficients) = self.interpolate(timestamp) {
            return Some(coefficients);
        }
        let first = self.first()?;
        if timestamp < first.timestamp {
            return Some(Coefficients::from_coefficient(
                first,
                Resolution::ForwardFilled,
            ));
        }
        self.last()
            .map(|last| Coefficients::from_coefficient(last, Resolution::BackwardFilled))
    }
}
