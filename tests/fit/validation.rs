//! Requests the engine must reject before optimizing.

use crate::test_helpers::decay_series;
use asymfit_rs::asymmetry::AsymmetrySeries;
use asymfit_rs::fit::{FitEngine, FitOptions, FitSpecification};
use asymfit_rs::parameters::FitVariable;
use asymfit_rs::AsymFitError;
use ndarray::array;

fn decay_spec() -> FitSpecification {
    FitSpecification::new("A*exp(-l*t)")
        .unwrap()
        .with_variable(FitVariable::with_bounds("A", 0.2, 0.0, 1.0))
        .with_variable(FitVariable::with_bounds("l", 0.5, 0.0, 5.0))
}

fn assert_fit_error(spec: &FitSpecification) {
    let result = FitEngine::new().fit(spec);
    assert!(
        matches!(result, Err(AsymFitError::Fit(_))),
        "expected a fit error, got {:?}",
        result.map(|r| r.len())
    );
}

#[test]
fn test_no_datasets() {
    assert_fit_error(&decay_spec());
}

#[test]
fn test_unequal_dataset_lengths() {
    let spec = decay_spec()
        .with_dataset("1", decay_series(0.2, 0.5, 100, 50.0, 0.01))
        .with_dataset("2", decay_series(0.2, 0.5, 90, 50.0, 0.01));
    assert_fit_error(&spec);
    assert_fit_error(&spec.with_options(FitOptions {
        global: true,
        alpha_correction: false,
    }));
}

#[test]
fn test_missing_uncertainty() {
    let bare = AsymmetrySeries::from_values(0.0, 50.0, array![0.2, 0.19, 0.18], None).unwrap();
    assert_fit_error(&decay_spec().with_dataset("1", bare));
}

#[test]
fn test_empty_expression() {
    let spec = FitSpecification::new("   ")
        .unwrap()
        .with_dataset("1", decay_series(0.2, 0.5, 10, 50.0, 0.01));
    assert_fit_error(&spec);
}

#[test]
fn test_free_parameter_without_variable() {
    let spec = FitSpecification::new("A*exp(-l*t) + c")
        .unwrap()
        .with_variable(FitVariable::with_bounds("A", 0.2, 0.0, 1.0))
        .with_variable(FitVariable::with_bounds("l", 0.5, 0.0, 5.0))
        .with_dataset("1", decay_series(0.2, 0.5, 10, 50.0, 0.01));
    assert_fit_error(&spec);
}

#[test]
fn test_alpha_correction_needs_alpha() {
    let spec = decay_spec()
        .with_dataset("1", decay_series(0.2, 0.5, 10, 50.0, 0.01))
        .with_options(FitOptions {
            global: false,
            alpha_correction: true,
        });
    assert_fit_error(&spec);
}

#[test]
fn test_guess_outside_bounds() {
    let spec = decay_spec()
        .with_variable(FitVariable::with_bounds("l", 6.0, 0.0, 5.0))
        .with_dataset("1", decay_series(0.2, 0.5, 10, 50.0, 0.01));
    assert_fit_error(&spec);

    let spec = decay_spec()
        .with_variable(FitVariable::with_bounds("l", f64::NAN, 0.0, 5.0))
        .with_dataset("1", decay_series(0.2, 0.5, 10, 50.0, 0.01));
    assert_fit_error(&spec);
}

#[test]
fn test_inverted_bounds() {
    let spec = decay_spec()
        .with_variable(FitVariable::with_bounds("l", 0.5, 5.0, 0.0))
        .with_dataset("1", decay_series(0.2, 0.5, 10, 50.0, 0.01));
    assert_fit_error(&spec);
}

#[test]
fn test_fixed_variable_bounds_are_not_checked() {
    let spec = decay_spec()
        .with_variable(FitVariable::with_bounds("l", 0.5, 5.0, 0.0).fixed())
        .with_dataset("1", decay_series(0.2, 0.5, 10, 50.0, 0.01));
    assert!(FitEngine::new().fit(&spec).is_ok());
}

#[test]
fn test_malformed_expression_is_a_compilation_error() {
    let spec = FitSpecification::new("A*exp(-l*t")
        .unwrap()
        .with_variable(FitVariable::with_bounds("A", 0.2, 0.0, 1.0))
        .with_variable(FitVariable::with_bounds("l", 0.5, 0.0, 5.0))
        .with_dataset("1", decay_series(0.2, 0.5, 10, 50.0, 0.01));
    assert!(matches!(
        FitEngine::new().fit(&spec),
        Err(AsymFitError::Compilation(_))
    ));
}
