//! Tests for the asymmetry pipeline: reduction of histogram pairs, the run
//! cache and the derived rebinned and frequency-domain views.

use crate::test_helpers::{metadata, muon_histogram};
use approx::assert_relative_eq;
use asymfit_rs::asymmetry::{
    compute_asymmetry, rebin, spectral_transform, AsymmetrySeries, BinRange, Detector, Histogram,
    HistogramSet, RebinMode, RunDataset, DEFAULT_SMOOTHED_POINTS,
};
use asymfit_rs::AsymFitError;
use ndarray::Array1;

fn synthetic_run() -> RunDataset {
    let forward = muon_histogram("Forw", 400, 20, 4.0, 1200.0);
    let backward = muon_histogram("Back", 400, 20, 6.0, 800.0);
    let meta = metadata(BinRange::new(0, 9), BinRange::new(20, 399), 10.0);
    RunDataset::new(forward, backward, meta).unwrap()
}

#[test]
fn test_identical_histograms_give_zero_asymmetry() {
    let hist = muon_histogram("Forw", 400, 20, 4.0, 1000.0);
    let twin = Histogram::new("Back", hist.counts().clone());
    let meta = metadata(BinRange::new(0, 9), BinRange::new(20, 399), 10.0);

    let series = compute_asymmetry(&hist, &twin, &meta).unwrap();
    assert_eq!(series.len(), 380);
    assert!(series.values().iter().all(|&a| a == 0.0));
    assert!(series.uncertainty().unwrap().iter().all(|&s| s > 0.0));
}

#[test]
fn test_zero_denominator_gives_zero() {
    let mut forward = vec![5.0; 40];
    let mut backward = vec![3.0; 40];
    for i in 21..40 {
        forward[i] = 50.0;
        backward[i] = 30.0;
    }
    let forward = Histogram::from_vec("Forw", forward);
    let backward = Histogram::from_vec("Back", backward);
    let meta = metadata(BinRange::new(0, 9), BinRange::new(20, 39), 10.0);

    let series = compute_asymmetry(&forward, &backward, &meta).unwrap();
    // Bin 20 holds background only in both histograms
    assert_eq!(series.values()[0], 0.0);
    // (45 - 27) / (45 + 27)
    assert_relative_eq!(series.values()[1], 0.25, epsilon = 1e-12);
    assert!(series.values().iter().all(|a| a.is_finite()));
}

#[test]
fn test_time_axis_starts_at_time_zero() {
    let run = synthetic_run();
    let time = run.asymmetry().time();
    assert_eq!(time[0], 0.0);
    assert_relative_eq!(time[1], 0.01, epsilon = 1e-12);
    assert_relative_eq!(time[379], 3.79, epsilon = 1e-9);
}

#[test]
fn test_rebin_is_idempotent() {
    let mut run = synthetic_run();
    let once = run.rebin(50.0, 0.0, 3.5, RebinMode::Exact).unwrap().clone();
    assert_eq!(once.len(), 70);

    let twice = rebin(&once, 50.0, 0.0, 3.5, RebinMode::Exact).unwrap();
    assert_eq!(twice.len(), once.len());
    assert_eq!(twice.time(), once.time());
    assert_eq!(twice.values(), once.values());
    for (a, b) in twice
        .uncertainty()
        .unwrap()
        .iter()
        .zip(once.uncertainty().unwrap().iter())
    {
        assert_relative_eq!(*a, *b, max_relative = 1e-12);
    }
}

#[test]
fn test_interactive_rebin_skips_uncertainty() {
    let run = synthetic_run();
    let exact = rebin(run.asymmetry(), 100.0, 0.0, 3.0, RebinMode::Exact).unwrap();
    let quick = rebin(run.asymmetry(), 100.0, 0.0, 3.0, RebinMode::Interactive).unwrap();

    assert_eq!(exact.values(), quick.values());
    assert!(exact.uncertainty().is_some());
    assert!(quick.uncertainty().is_none());
}

#[test]
fn test_metadata_change_recomputes_and_drops_cache() {
    let mut run = synthetic_run();
    run.rebin(50.0, 0.0, 3.5, RebinMode::Exact).unwrap();
    run.rebin(100.0, 0.0, 3.5, RebinMode::Exact).unwrap();
    assert_eq!(run.rebinned().len(), 2);
    assert!(run.rebinned_at(100.0).is_some());

    let before = run.asymmetry().values()[0];
    run.set_background(Detector::Forward, BinRange::new(0, 4)).unwrap();
    assert!(run.rebinned().is_empty());
    // Flat background: same mean over a shorter window
    assert_relative_eq!(run.asymmetry().values()[0], before, epsilon = 1e-12);

    run.set_good_region(Detector::Backward, BinRange::new(30, 399))
        .unwrap();
    assert_eq!(run.asymmetry().len(), 370);
}

#[test]
fn test_rejected_metadata_change_leaves_run_untouched() {
    let mut run = synthetic_run();
    let before = run.asymmetry().clone();

    let result = run.set_good_region(Detector::Forward, BinRange::new(20, 1000));
    assert!(matches!(result, Err(AsymFitError::InvalidRange(_))));
    assert_eq!(run.asymmetry(), &before);
    assert_eq!(run.metadata().forward.good, BinRange::new(20, 399));
}

#[test]
fn test_run_from_histogram_source() {
    let source: HistogramSet = vec![
        muon_histogram("Forw", 400, 20, 4.0, 1200.0),
        muon_histogram("Back", 400, 20, 6.0, 800.0),
        muon_histogram("Left", 400, 20, 5.0, 900.0),
    ]
    .into_iter()
    .collect();
    let meta = metadata(BinRange::new(0, 9), BinRange::new(20, 399), 10.0);

    let run = RunDataset::from_source(&source, meta.clone()).unwrap();
    assert_eq!(run.asymmetry(), synthetic_run().asymmetry());

    let mut missing = meta;
    missing.backward.title = "Right".to_string();
    assert!(matches!(
        RunDataset::from_source(&source, missing),
        Err(AsymFitError::EmptyDataset(_))
    ));
}

#[test]
fn test_smoothed_spectrum_spans_the_raw_spectrum() {
    let n = 256;
    let values = Array1::from_shape_fn(n, |i| {
        0.2 * (2.0 * std::f64::consts::PI * 5.0 * i as f64 * 0.01).cos()
    });
    let series = AsymmetrySeries::from_values(0.0, 10.0, values, None).unwrap();

    let spectrum = spectral_transform(&series).unwrap();
    let smooth = spectrum.smoothed(DEFAULT_SMOOTHED_POINTS).unwrap();

    assert_eq!(smooth.len(), DEFAULT_SMOOTHED_POINTS);
    assert_eq!(smooth.frequencies()[0], spectrum.frequencies()[0]);
    assert_relative_eq!(
        smooth.frequencies()[DEFAULT_SMOOTHED_POINTS - 1],
        spectrum.frequencies()[spectrum.len() - 1],
        epsilon = 1e-9
    );
}
