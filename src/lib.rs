#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
// #![warn(clippy::cargo)]

//! Calibration and despiking of low-cost CO2 sensor time series.
//!
//! A raw per-system stream is sorted once and split into measurement, calibration and auxiliary
//! streams. Reference bottle exposures are reduced to daily two-point calibrations, the resulting
//! coefficient timeline is applied to the measurements, auxiliary streams are attached by
//! nearest-in-time joins and a Hampel filter flags local spikes.
//!
//! ```no_run
//! use co2_calibration::{bottle::BottleRegistry, config::Config, io, pipeline};
//!
//! # fn main() -> co2_calibration::Result<()> {
//! let config = Config::from_file("config.toml".as_ref())?;
//! let registry = BottleRegistry::from_csv("bottles.csv".as_ref())?;
//! let batch = pipeline::SystemBatch::new(3, io::read_raw_records("system-3.csv".as_ref())?);
//!
//! let report = pipeline::run(vec![batch], &registry, &config)?;
//! for output in &report.outputs {
//!     println!("{}: {:.4} flagged", output.system_id, output.outlier_fraction);
//! }
//! # Ok(())
//! # }
//! ```

pub mod aggregate;
pub mod align;
pub mod bottle;
pub mod calibration;
pub mod config;
pub mod correction;
pub mod despike;
pub mod dilution;
pub mod error;
pub mod extract;
pub mod io;
pub(crate) mod math;
pub mod pipeline;
pub mod record;
pub mod timeline;

pub use error::{BatchError, Error, Stage};

pub type Result<T> = ::std::result::Result<T, Error>;
