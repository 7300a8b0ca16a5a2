use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use itertools::Itertools;
use serde::Serialize;

use crate::math::mean_and_variance;
use crate::record::{Flag, FlaggedRecord, MeasurementRecord, SystemId, Timestamped};

/// Summary of the flagged records falling into one time bucket
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct AggregatedRecord {
    /// Start of the bucket
    pub timestamp: DateTime<Utc>,
    pub system_id: SystemId,
    pub count: usize,
    pub hampel_count: usize,
    pub raw_dry_mean: f64,
    pub corrected_mean: f64,
    /// Sample standard deviation of the corrected concentration, undefined below two samples
    pub corrected_std: Option<f64>,
    pub corrected_var: Option<f64>,
}

/// Start of the epoch-aligned bucket of length `every` containing `timestamp`
fn bucket_start(timestamp: DateTime<Utc>, every: Duration) -> DateTime<Utc> {
    let width = every.num_milliseconds().max(1);
    let start = timestamp.timestamp_millis().div_euclid(width) * width;
    Utc.timestamp_millis_opt(start).single().unwrap_or(timestamp)
}

/// Average time-ordered measurement rows sharing a bucket of length `every`
///
/// The averaged row is stamped with the bucket start. Rows already on the bucket grid pass
/// through unchanged.
#[allow(clippy::cast_precision_loss)]
pub fn average_measurements(
    records: &[MeasurementRecord],
    every: Duration,
) -> Vec<MeasurementRecord> {
    let mut averaged = Vec::with_capacity(records.len());
    for ((system_id, timestamp), bucket) in &records
        .iter()
        .group_by(|record| (record.system_id, bucket_start(record.timestamp, every)))
    {
        let bucket = bucket.collect::<Vec<_>>();
        let n = bucket.len() as f64;
        let mean = |field: fn(&MeasurementRecord) -> f64| {
            bucket.iter().copied().map(field).sum::<f64>() / n
        };
        averaged.push(MeasurementRecord {
            timestamp,
            system_id,
            raw_dry_concentration: mean(|record| record.raw_dry_concentration),
            temperature: mean(|record| record.temperature),
            humidity: mean(|record| record.humidity),
            pressure: mean(|record| record.pressure),
        });
    }
    averaged
}

/// Average time-ordered flagged records into buckets of length `every`
///
/// Records of several systems may be passed as long as each system's records are contiguous.
pub fn resample(records: &[FlaggedRecord], every: Duration) -> Vec<AggregatedRecord> {
    let mut aggregated = Vec::new();
    for ((system_id, timestamp), bucket) in &records.iter().group_by(|record| {
        (
            record.record.measurement.system_id,
            bucket_start(record.timestamp(), every),
        )
    }) {
        let bucket = bucket.collect::<Vec<_>>();
        let corrected = bucket
            .iter()
            .map(|record| record.record.corrected_concentration)
            .collect::<Vec<_>>();
        let raw_dry = bucket
            .iter()
            .map(|record| record.record.measurement.raw_dry_concentration)
            .collect::<Vec<_>>();
        let (Some((corrected_mean, corrected_var)), Some((raw_dry_mean, _))) =
            (mean_and_variance(&corrected), mean_and_variance(&raw_dry))
        else {
            continue;
        };

        aggregated.push(AggregatedRecord {
            timestamp,
            system_id,
            count: bucket.len(),
            hampel_count: bucket
                .iter()
                .filter(|record| record.flag == Flag::Hampel)
                .count(),
            raw_dry_mean,
            corrected_mean,
            corrected_std: corrected_var.map(f64::sqrt),
            corrected_var,
        });
    }
    aggregated
}

/// Split a time-ordered series by UTC calendar year
pub fn partition_by_year<T: Timestamped + Clone>(records: &[T]) -> BTreeMap<i32, Vec<T>> {
    let mut years: BTreeMap<i32, Vec<T>> = BTreeMap::new();
    for record in records {
        years
            .entry(record.timestamp().year())
            .or_default()
            .push(record.clone());
    }
    years
}
