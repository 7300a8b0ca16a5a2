use std::fs;
use std::path::Path;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Finest comparison precision of the despiker, beyond it f64 has no significant digits left
pub const MAX_DECIMALS: i32 = 15;

/// Engine configuration
///
/// Every table and field is optional in the TOML representation, missing values fall back to the
/// defaults below.
///
/// ```toml
/// [despike]
/// window = 5
/// n_sigma = 3.0
///
/// [calibration]
/// slope_min = 0.9
/// slope_max = 1.1
///
/// [tolerance]
/// calibration_secs = 600
/// ```
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub despike: DespikeConfig,
    pub calibration: CalibrationConfig,
    pub tolerance: ToleranceConfig,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DespikeConfig {
    /// Number of neighbouring samples on each side of the window centre
    pub window: usize,
    pub n_sigma: f64,
    /// Precision at which original and filtered values are compared
    pub decimals: i32,
}

impl Default for DespikeConfig {
    fn default() -> Self {
        Self {
            window: 5,
            n_sigma: 3.0,
            decimals: 2,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct CalibrationConfig {
    /// Exclusive lower bound of a plausible slope
    pub slope_min: f64,
    /// Exclusive upper bound of a plausible slope
    pub slope_max: f64,
    pub bottle_bands: Vec<BottleBand>,
}

impl Default for CalibrationConfig {
    fn default() -> Self {
        Self {
            slope_min: 0.9,
            slope_max: 1.1,
            bottle_bands: BottleBand::defaults(),
        }
    }
}

/// A range of exposure lengths and the part of the exposure trusted within it
///
/// The bounds are exclusive. Readings settle after a bottle switch, so the leading fraction of
/// the window is dropped, and the trailing 5% is dropped because of the next switch.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub struct BottleBand {
    pub min_len: usize,
    pub max_len: usize,
    pub trim_start: f64,
    pub trim_end: f64,
}

impl BottleBand {
    /// Empirically tuned for one-minute sampling: the short second-bottle exposure and the
    /// longer first-bottle exposure.
    #[must_use]
    pub fn defaults() -> Vec<Self> {
        vec![
            Self {
                min_len: 50,
                max_len: 70,
                trim_start: 0.3,
                trim_end: 0.95,
            },
            Self {
                min_len: 70,
                max_len: 130,
                trim_start: 0.5,
                trim_end: 0.95,
            },
        ]
    }

    #[must_use]
    pub const fn contains(&self, len: usize) -> bool {
        self.min_len < len && len < self.max_len
    }
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct ToleranceConfig {
    pub calibration_secs: i64,
    pub wind_secs: i64,
    pub housekeeping_secs: i64,
    pub edge_calibration_secs: i64,
}

impl Default for ToleranceConfig {
    fn default() -> Self {
        Self {
            calibration_secs: 10 * 60,
            wind_secs: 2 * 60,
            housekeeping_secs: 2 * 60,
            edge_calibration_secs: 24 * 60 * 60,
        }
    }
}

/// Tolerances as durations, valid once [`Config::validate`] has accepted the values
impl ToleranceConfig {
    #[must_use]
    pub fn calibration(&self) -> Duration {
        Duration::seconds(self.calibration_secs)
    }

    #[must_use]
    pub fn wind(&self) -> Duration {
        Duration::seconds(self.wind_secs)
    }

    #[must_use]
    pub fn housekeeping(&self) -> Duration {
        Duration::seconds(self.housekeeping_secs)
    }

    #[must_use]
    pub fn edge_calibration(&self) -> Duration {
        Duration::seconds(self.edge_calibration_secs)
    }
}

impl Config {
    /// Read and validate a TOML configuration file
    ///
    /// # Errors
    /// Returns an error if the file is missing, is not valid TOML, or fails [`Config::validate`].
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(Error::FileNotFound(path.to_path_buf()));
        }
        let contents = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configurations that cannot produce meaningful output
    ///
    /// # Errors
    /// Returns [`Error::Config`] describing the first offending value.
    pub fn validate(&self) -> Result<()> {
        let despike = &self.despike;
        if despike.window == 0 {
            return Err(Error::Config("despike window must be positive".into()));
        }
        if !despike.n_sigma.is_finite() || despike.n_sigma <= 0.0 {
            return Err(Error::Config(format!(
                "despike n_sigma must be positive, got {}",
                despike.n_sigma
            )));
        }
        if !(0..=MAX_DECIMALS).contains(&despike.decimals) {
            return Err(Error::Config(format!(
                "despike decimals must lie within [0, {MAX_DECIMALS}], got {}",
                despike.decimals
            )));
        }

        let calibration = &self.calibration;
        if !(calibration.slope_min.is_finite()
            && calibration.slope_max.is_finite()
            && calibration.slope_min < calibration.slope_max)
        {
            return Err(Error::Config(format!(
                "slope band ({}, {}) is empty",
                calibration.slope_min, calibration.slope_max
            )));
        }
        for band in &calibration.bottle_bands {
            if band.min_len >= band.max_len {
                return Err(Error::Config(format!(
                    "bottle band ({}, {}) is empty",
                    band.min_len, band.max_len
                )));
            }
            if !(0.0..=1.0).contains(&band.trim_start)
                || !(0.0..=1.0).contains(&band.trim_end)
                || band.trim_start >= band.trim_end
            {
                return Err(Error::Config(format!(
                    "bottle band trim [{}, {}) must lie within [0, 1]",
                    band.trim_start, band.trim_end
                )));
            }
        }

        let tolerance = &self.tolerance;
        for (name, secs) in [
            ("calibration", tolerance.calibration_secs),
            ("wind", tolerance.wind_secs),
            ("housekeeping", tolerance.housekeeping_secs),
            ("edge calibration", tolerance.edge_calibration_secs),
        ] {
            if secs <= 0 {
                return Err(Error::Config(format!(
                    "{name} tolerance must be positive, got {secs}s"
                )));
            }
            if Duration::try_seconds(secs).is_none() {
                return Err(Error::Config(format!(
                    "{name} tolerance of {secs}s is out of range"
                )));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::{BottleBand, Config, MAX_DECIMALS};
    use crate::Error;

    #[test]
    fn defaults_are_valid() {
        Config::default().validate().unwrap();
    }

    #[test]
    fn partial_toml_falls_back_to_defaults() {
        let config: Config = toml::from_str(
            r#"
            [despike]
            n_sigma = 2.5

            [tolerance]
            wind_secs = 300
            "#,
        )
        .unwrap();

        assert_eq!(config.despike.window, 5);
        approx::assert_relative_eq!(config.despike.n_sigma, 2.5);
        assert_eq!(config.tolerance.wind().num_seconds(), 300);
        assert_eq!(config.tolerance.calibration().num_minutes(), 10);
        assert_eq!(config.tolerance.edge_calibration().num_days(), 1);
        assert_eq!(config.calibration.bottle_bands, BottleBand::defaults());
    }

    #[test]
    fn negative_window_is_rejected_when_parsed() {
        let parsed: Result<Config, _> = toml::from_str("[despike]\nwindow = -1\n");
        assert!(parsed.is_err());
    }

    #[test]
    fn non_positive_sigma_is_rejected() {
        for n_sigma in [0.0, -1.0, f64::NAN] {
            let mut config = Config::default();
            config.despike.n_sigma = n_sigma;
            assert!(matches!(config.validate(), Err(Error::Config(_))));
        }
    }

    #[test]
    fn zero_window_is_rejected() {
        let mut config = Config::default();
        config.despike.window = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn inverted_slope_band_is_rejected() {
        let mut config = Config::default();
        config.calibration.slope_min = 1.1;
        config.calibration.slope_max = 0.9;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn malformed_bottle_band_is_rejected() {
        let mut config = Config::default();
        config.calibration.bottle_bands[0].trim_start = 0.96;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn non_positive_tolerance_is_rejected() {
        let mut config = Config::default();
        config.tolerance.housekeeping_secs = 0;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn tolerance_beyond_duration_range_is_rejected() {
        let config: Config =
            toml::from_str("[tolerance]\ncalibration_secs = 9223372036854775807\n").unwrap();
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        let mut config = Config::default();
        config.tolerance.edge_calibration_secs = i64::MAX / 1000 + 1;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        config.tolerance.edge_calibration_secs = 365 * 24 * 60 * 60;
        config.validate().unwrap();
        assert_eq!(config.tolerance.edge_calibration().num_days(), 365);
    }

    #[test]
    fn precision_beyond_f64_is_rejected() {
        let mut config = Config::default();
        config.despike.decimals = 400;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        config.despike.decimals = -1;
        assert!(matches!(config.validate(), Err(Error::Config(_))));

        config.despike.decimals = MAX_DECIMALS;
        config.validate().unwrap();
    }

    #[test]
    fn band_bounds_are_exclusive() {
        let band = BottleBand::defaults()[0];
        assert!(!band.contains(50));
        assert!(band.contains(51));
        assert!(band.contains(69));
        assert!(!band.contains(70));
    }
}
