//! Hampel filtering of corrected concentrations.
//!
//! Every sample is compared with the median of its surrounding window. A sample further than
//! `n_sigma` robust standard deviations (scaled median absolute deviation) from that median is an
//! outlier and its filtered value is the window median. Windows are clipped at the ends of the
//! series rather than skipped.

use ndarray::{Array1, ArrayView1};
use num_traits::Float;

use crate::config::DespikeConfig;
use crate::math::{median_and_scale, round_to};
use crate::record::{CorrectedRecord, Flag, FlaggedRecord};

#[derive(Clone, Debug, PartialEq)]
pub struct HampelOutput<E> {
    /// Input series with outliers replaced by their window median
    pub filtered: Array1<E>,
    pub outlier_indices: Vec<usize>,
}

/// Run a Hampel filter with `half_window` neighbours on each side
pub fn hampel<E: Float>(data: ArrayView1<E>, half_window: usize, n_sigma: E) -> HampelOutput<E> {
    let n = data.len();
    let mut filtered = data.to_owned();
    let mut outlier_indices = Vec::new();
    let mut window = Vec::with_capacity(half_window.saturating_mul(2).saturating_add(1).min(n));

    for ii in 0..n {
        let lower = ii.saturating_sub(half_window);
        let upper = ii.saturating_add(half_window).saturating_add(1).min(n);
        window.clear();
        window.extend(data.slice(ndarray::s![lower..upper]).iter().copied());

        let Some((centre, scale)) = median_and_scale(&window) else {
            continue;
        };
        if (data[ii] - centre).abs() > n_sigma * scale {
            filtered[ii] = centre;
            outlier_indices.push(ii);
        }
    }

    HampelOutput {
        filtered,
        outlier_indices,
    }
}

/// Flag the corrected records of one system
///
/// Records must be sorted by timestamp. A record is flagged when its corrected concentration and
/// the filtered value differ at the configured precision. The corrected concentration itself is
/// left unchanged.
pub fn despike(records: Vec<CorrectedRecord>, config: &DespikeConfig) -> Vec<FlaggedRecord> {
    let series = records
        .iter()
        .map(|record| record.corrected_concentration)
        .collect::<Array1<f64>>();
    let output = hampel(series.view(), config.window, config.n_sigma);

    records
        .into_iter()
        .zip(output.filtered.iter())
        .map(|(record, filtered)| {
            let original = round_to(record.corrected_concentration, config.decimals);
            let filtered = round_to(*filtered, config.decimals);
            #[allow(clippy::float_cmp)]
            let flag = if original == filtered {
                Flag::Unflagged
            } else {
                Flag::Hampel
            };
            FlaggedRecord { record, flag }
        })
        .collect()
}

/// Share of records flagged as spikes, zero for an empty series
#[allow(clippy::cast_precision_loss)]
#[must_use]
pub fn outlier_fraction(records: &[FlaggedRecord]) -> f64 {
    if records.is_empty() {
        return 0.0;
    }
    let flagged = records
        .iter()
        .filter(|record| record.flag == Flag::Hampel)
        .count();
    flagged as f64 / records.len() as f64
}
