use chrono::Duration;
use log::debug;

use crate::config::ToleranceConfig;
use crate::record::{
    CorrectedRecord, EdgeCalibrationRecord, HousekeepingRecord, Timestamped, WindRecord,
};

/// For every primary row, the secondary row closest in time within `tolerance`
///
/// Both slices must be sorted by timestamp. Equidistant candidates resolve to the earlier row.
pub fn nearest_join<'a, P: Timestamped, S: Timestamped>(
    primary: &[P],
    secondary: &'a [S],
    tolerance: Duration,
) -> Vec<Option<&'a S>> {
    primary
        .iter()
        .map(|row| {
            let timestamp = row.timestamp();
            let idx = secondary.partition_point(|candidate| candidate.timestamp() < timestamp);
            let before = idx
                .checked_sub(1)
                .map(|ii| (&secondary[ii], timestamp - secondary[ii].timestamp()));
            let after = secondary
                .get(idx)
                .map(|candidate| (candidate, candidate.timestamp() - timestamp));

            let closest = match (before, after) {
                (Some(before), Some(after)) if after.1 < before.1 => after,
                (Some(before), _) => before,
                (None, Some(after)) => after,
                (None, None) => return None,
            };
            (closest.1 <= tolerance).then_some(closest.0)
        })
        .collect()
}

/// The auxiliary streams of one system, each sorted by timestamp
#[derive(Clone, Debug, Default)]
pub struct AuxiliaryStreams {
    pub wind: Vec<WindRecord>,
    pub housekeeping: Vec<HousekeepingRecord>,
    pub edge_calibration: Vec<EdgeCalibrationRecord>,
}

/// Attach the auxiliary rows to the corrected records
///
/// An empty stream leaves its field untouched.
pub fn align_auxiliary(
    mut records: Vec<CorrectedRecord>,
    streams: &AuxiliaryStreams,
    tolerances: &ToleranceConfig,
) -> Vec<CorrectedRecord> {
    if !streams.wind.is_empty() {
        let matches = nearest_join(&records, &streams.wind, tolerances.wind());
        debug!("wind matched {} of {} records", count(&matches), records.len());
        for (record, wind) in records.iter_mut().zip(matches) {
            record.wind = wind.copied();
        }
    }
    if !streams.housekeeping.is_empty() {
        let matches = nearest_join(&records, &streams.housekeeping, tolerances.housekeeping());
        debug!(
            "housekeeping matched {} of {} records",
            count(&matches),
            records.len()
        );
        for (record, housekeeping) in records.iter_mut().zip(matches) {
            record.housekeeping = housekeeping.copied();
        }
    }
    if !streams.edge_calibration.is_empty() {
        let matches = nearest_join(
            &records,
            &streams.edge_calibration,
            tolerances.edge_calibration(),
        );
        debug!(
            "edge calibration matched {} of {} records",
            count(&matches),
            records.len()
        );
        for (record, edge_calibration) in records.iter_mut().zip(matches) {
            record.edge_calibration = edge_calibration.copied();
        }
    }
    records
}

fn count<T>(matches: &[Option<T>]) -> usize {
    matches.iter().filter(|m| m.is_some()).count()
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration, TimeZone, Utc};

    use super::{align_auxiliary, nearest_join, AuxiliaryStreams};
    use crate::config::ToleranceConfig;
    use crate::record::{
        CorrectedRecord, EdgeCalibrationRecord, MeasurementRecord, Resolution, WindRecord,
    };

    fn at(seconds: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 9, 9, 9, 0, 0).unwrap() + Duration::seconds(seconds)
    }

    fn wind(seconds: i64, speed: f64) -> WindRecord {
        WindRecord {
            timestamp: at(seconds),
            system_id: 1,
            speed,
            direction: 180.0,
        }
    }

    fn corrected(seconds: i64) -> CorrectedRecord {
        CorrectedRecord {
            measurement: MeasurementRecord {
                timestamp: at(seconds),
                system_id: 1,
                raw_dry_concentration: 420.0,
                temperature: 20.0,
                humidity: 40.0,
                pressure: 950.0,
            },
            slope: 1.0,
            intercept: 0.0,
            corrected_concentration: 420.0,
            resolution: Resolution::Exact,
            wind: None,
            housekeeping: None,
            edge_calibration: None,
        }
    }

    #[test]
    fn nearest_row_within_tolerance_is_joined() {
        let primary = [corrected(0), corrected(60), corrected(600)];
        let secondary = [wind(-30, 1.0), wind(100, 2.0)];

        let joined = nearest_join(&primary, &secondary, Duration::minutes(2));

        assert_eq!(joined[0].map(|w| w.speed), Some(1.0));
        assert_eq!(joined[1].map(|w| w.speed), Some(2.0));
        assert!(joined[2].is_none());
    }

    #[test]
    fn equidistant_rows_resolve_to_the_earlier_one() {
        let secondary = [wind(-60, 1.0), wind(60, 2.0)];
        let joined = nearest_join(
            &[corrected(0)],
            &secondary,
            Duration::minutes(2),
        );
        assert_eq!(joined[0].map(|w| w.speed), Some(1.0));
    }

    #[test]
    fn empty_streams_pass_records_through() {
        let records = vec![corrected(0), corrected(60)];
        let aligned = align_auxiliary(
            records.clone(),
            &AuxiliaryStreams::default(),
            &ToleranceConfig::default(),
        );
        assert_eq!(aligned, records);
    }

    #[test]
    fn each_stream_uses_its_own_tolerance() {
        let streams = AuxiliaryStreams {
            wind: vec![wind(3 * 60 * 60, 4.0)],
            housekeeping: Vec::new(),
            edge_calibration: vec![EdgeCalibrationRecord {
                timestamp: at(3 * 60 * 60),
                system_id: 1,
                slope: 1.01,
                intercept: -2.0,
                humidity_offset: None,
            }],
        };

        let aligned = align_auxiliary(
            vec![corrected(0)],
            &streams,
            &ToleranceConfig::default(),
        );

        assert!(aligned[0].wind.is_none());
        assert!(aligned[0].housekeeping.is_none());
        assert_eq!(aligned[0].edge_calibration.map(|e| e.slope), Some(1.01));
    }
}
