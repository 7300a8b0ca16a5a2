use std::collections::BTreeMap;

use chrono::NaiveDate;
use itertools::Itertools;
use log::debug;

use crate::bottle::BottleRegistry;
use crate::config::{BottleBand, CalibrationConfig};
use crate::math::trimmed_median;
use crate::record::{
    BottleId, CalibrationCoefficient, CalibrationEvent, CalibrationSample, SystemId,
};

/// Reduce one bottle exposure to a robust concentration estimate
///
/// The exposure length selects the first matching band, whose trim fractions decide which part of
/// the exposure is trusted. Exposures outside every band yield `0.0`, which marks the window as
/// unusable.
#[must_use]
pub fn reduce_window(values: &[f64], bands: &[BottleBand]) -> f64 {
    bands
        .iter()
        .find(|band| band.contains(values.len()))
        .and_then(|band| trimmed_median(values, band.trim_start, band.trim_end))
        .unwrap_or(0.0)
}

/// Group calibration samples into daily bottle exposures and reduce each one
///
/// Samples are grouped by (UTC date, system, bottle) keeping their arrival order. Events with a
/// non-positive estimate are dropped. The result is ordered by (date, system, bottle).
pub fn extract_events(
    samples: &[CalibrationSample],
    bands: &[BottleBand],
) -> Vec<CalibrationEvent> {
    let mut windows: BTreeMap<(NaiveDate, SystemId, BottleId), Vec<&CalibrationSample>> =
        BTreeMap::new();
    for sample in samples {
        windows
            .entry((
                sample.timestamp.date_naive(),
                sample.system_id,
                sample.bottle_id,
            ))
            .or_default()
            .push(sample);
    }

    windows
        .into_iter()
        .filter_map(|((date, system_id, bottle_id), window)| {
            let values = window
                .iter()
                .map(|sample| sample.measured_concentration)
                .collect::<Vec<_>>();
            let robust_estimate = reduce_window(&values, bands);
            if robust_estimate <= 0.0 {
                debug!(
                    "system {system_id}: discarding bottle {bottle_id} on {date}, {} samples",
                    values.len()
                );
                return None;
            }
            let last_sample_time = window.iter().map(|sample| sample.timestamp).max()?;
            Some(CalibrationEvent {
                date,
                system_id,
                bottle_id,
                robust_estimate,
                last_sample_time,
            })
        })
        .collect()
}

/// Slope and intercept of the line through two (measured, true) points
///
/// Returns `None` when both measured values coincide. Swapping the points gives the same line.
#[must_use]
#[allow(clippy::float_cmp)]
pub fn two_point(measured: [f64; 2], reference: [f64; 2]) -> Option<(f64, f64)> {
    // Order by measured value so the arithmetic does not depend on argument order
    let (low, high) = if measured[0] <= measured[1] {
        ((measured[0], reference[0]), (measured[1], reference[1]))
    } else {
        ((measured[1], reference[1]), (measured[0], reference[0]))
    };
    if low.0 == high.0 {
        return None;
    }
    let slope = (high.1 - low.1) / (high.0 - low.0);
    let intercept = low.1 - slope * low.0;
    (slope.is_finite() && intercept.is_finite()).then_some((slope, intercept))
}

/// Derive a coefficient from the two bottle events of one calibration day
///
/// Unknown bottles, degenerate measurements and slopes outside the open plausibility band all
/// yield `None`.
#[must_use]
pub fn calibrate_pair(
    first: &CalibrationEvent,
    second: &CalibrationEvent,
    registry: &BottleRegistry,
    config: &CalibrationConfig,
) -> Option<CalibrationCoefficient> {
    let Some(references) = registry
        .true_concentration(first.bottle_id)
        .zip(registry.true_concentration(second.bottle_id))
    else {
        debug!(
            "system {}: unknown bottle in pair ({}, {}) on {}",
            first.system_id, first.bottle_id, second.bottle_id, first.date
        );
        return None;
    };

    let (slope, intercept) = two_point(
        [first.robust_estimate, second.robust_estimate],
        [references.0, references.1],
    )?;

    if !(config.slope_min < slope && slope < config.slope_max) {
        debug!(
            "system {}: rejecting slope {slope:.4} on {}",
            first.system_id, first.date
        );
        return None;
    }

    Some(CalibrationCoefficient {
        timestamp: first.last_sample_time.max(second.last_sample_time),
        system_id: first.system_id,
        slope,
        intercept,
    })
}

/// Turn bottle events into coefficients, one per (date, system) with exactly two events
///
/// `events` must be ordered by (date, system) as returned by [`extract_events`]. The output is
/// sorted by timestamp.
pub fn calibrate(
    events: &[CalibrationEvent],
    registry: &BottleRegistry,
    config: &CalibrationConfig,
) -> Vec<CalibrationCoefficient> {
    let mut coefficients = Vec::new();
    for ((date, system_id), day) in &events
        .iter()
        .group_by(|event| (event.date, event.system_id))
    {
        let day = day.collect::<Vec<_>>();
        match day.as_slice() {
            [first, second] => {
                if let Some(coefficient) = calibrate_pair(first, second, registry, config) {
                    coefficients.push(coefficient);
                }
            }
            _ => debug!(
                "system {system_id}: {} bottle events on {date}, expected 2",
                day.len()
            ),
        }
    }
    coefficients.sort_by_key(|coefficient| coefficient.timestamp);
    coefficients
}
