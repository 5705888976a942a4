//! # Asymmetry Pipeline
//!
//! Turns a pair of detector histograms into a background-corrected asymmetry
//! signal with counting uncertainties, and derives coarser and
//! frequency-domain views of it.
//!
//! ## Example Usage
//!
//! ```rust
//! use asymfit_rs::asymmetry::{
//!     spectral_transform, BinRange, Histogram, HistogramWindows, RebinMode, RunDataset, RunMetadata,
//! };
//!
//! let counts = |scale: f64| (0..200).map(|i| if i < 20 { 2.0 } else { scale * 100.0 }).collect::<Vec<f64>>();
//! let forward = Histogram::from_vec("Forw", counts(1.2));
//! let backward = Histogram::from_vec("Back", counts(0.8));
//!
//! let windows = |title: &str| HistogramWindows {
//!     title: title.to_string(),
//!     background: BinRange::new(0, 19),
//!     good: BinRange::new(25, 199),
//! };
//! let meta = RunMetadata {
//!     title: "Ag reference".to_string(),
//!     bin_width_ns: 10.0,
//!     time_zero_bin: 25.0,
//!     forward: windows("Forw"),
//!     backward: windows("Back"),
//! };
//!
//! let mut run = RunDataset::new(forward, backward, meta).unwrap();
//! assert_eq!(run.asymmetry().len(), 175);
//!
//! let coarse = run.rebin(50.0, 0.0, 1.5, RebinMode::Exact).unwrap();
//! assert_eq!(coarse.len(), 30);
//!
//! let spectrum = spectral_transform(run.asymmetry()).unwrap();
//! assert_eq!(spectrum.magnitudes()[0], 0.0);
//! ```

pub mod histogram;
pub mod rebin;
pub mod run;
pub mod series;
pub mod spectrum;
pub mod spline;

pub use histogram::{BinRange, Histogram, HistogramSet, HistogramSource};
pub use rebin::{rebin, RebinMode};
pub use run::{compute_asymmetry, Detector, HistogramWindows, RunDataset, RunMetadata};
pub use series::AsymmetrySeries;
pub use spectrum::{spectral_transform, Spectrum, DEFAULT_SMOOTHED_POINTS};
pub use spline::CubicSpline;
