//! Per-run fits.

use crate::test_helpers::{decay_series, noisy_decay_series};
use approx::assert_relative_eq;
use asymfit_rs::fit::{alpha_correction, FitEngine, FitOptions, FitSpecification, FunctionRegistry};
use asymfit_rs::parameters::FitVariable;
use asymfit_rs::Result;
use ndarray::Array1;

#[test]
fn test_exponential_recovers_parameters() -> Result<()> {
    let series = decay_series(0.2, 0.1, 300, 50.0, 0.01);
    let spec = FitSpecification::new("f(t)=A0*exp(-lambda*t)")?
        .with_variable(FitVariable::with_bounds("A0", 0.5, 0.0, 1.0))
        .with_variable(FitVariable::with_bounds("lambda", 0.5, 0.0, 1.0))
        .with_dataset("68011-M20", series);

    let result = FitEngine::new().fit(&spec)?;
    assert_eq!(result.len(), 1);
    assert!(result.id().starts_with("fit-"));

    let fit = result.fit("68011-M20").unwrap();
    assert!((fit.variable("A0").unwrap().value() - 0.2).abs() < 1e-3);
    assert!((fit.variable("lambda").unwrap().value() - 0.1).abs() < 1e-3);
    assert!(fit.solution().unwrap().success);
    Ok(())
}

#[test]
fn test_noisy_data_within_uncertainty() -> Result<()> {
    let series = noisy_decay_series(0.2, 0.3, 400, 50.0, 0.002, 7);
    let spec = FitSpecification::new("A*exp(-l*t)")?
        .with_variable(FitVariable::with_bounds("A", 0.1, 0.0, 1.0))
        .with_variable(FitVariable::with_bounds("l", 1.0, 0.0, 10.0))
        .with_dataset("68011", series.clone());

    let result = FitEngine::new().fit(&spec)?;
    let fit = &result.fits()[0];
    let estimate = fit.estimate_uncertainty(&series)?;

    // Reduced chi-square of correctly weighted Gaussian noise
    assert!(estimate.chi_square > 0.7 && estimate.chi_square < 1.3);
    for (k, (name, truth)) in [("A", 0.2), ("l", 0.3)].into_iter().enumerate() {
        let error = estimate.std_errors[k];
        assert!(error > 0.0);
        assert!((fit.variable(name).unwrap().value() - truth).abs() < 5.0 * error);
    }
    assert_relative_eq!(estimate.correlation[[0, 0]], 1.0, epsilon = 1e-12);
    Ok(())
}

#[test]
fn test_fixed_parameters_returned_verbatim() -> Result<()> {
    let offset = 0.012_345_678_9;
    let values = decay_series(0.2, 0.5, 200, 50.0, 0.01).values().mapv(|v| v + offset);
    let series = asymfit_rs::asymmetry::AsymmetrySeries::from_values(
        0.0,
        50.0,
        values,
        Some(Array1::from_elem(200, 0.01)),
    )?;

    let spec = FitSpecification::new("A*exp(-l*t) + c")?
        .with_variable(FitVariable::with_bounds("A", 0.3, 0.0, 1.0))
        .with_variable(FitVariable::with_bounds("l", 1.0, 0.0, 5.0))
        .with_variable(FitVariable::with_bounds("c", offset, -1.0, 1.0).fixed())
        .with_variable(FitVariable::with_bounds("unused", 3.5, 0.0, 10.0))
        .with_dataset("68011", series);

    let result = FitEngine::new().fit(&spec)?;
    let fit = &result.fits()[0];

    let c = fit.variable("c").unwrap();
    assert_eq!(c.value(), offset);
    assert!(c.fixed);
    assert_eq!((c.lower(), c.upper()), (-1.0, 1.0));
    assert_eq!(fit.variable("unused").unwrap().value(), 3.5);

    assert!((fit.variable("A").unwrap().value() - 0.2).abs() < 1e-4);
    assert!((fit.variable("l").unwrap().value() - 0.5).abs() < 1e-4);

    // The evaluator keeps the fixed offset
    assert_relative_eq!(fit.evaluate_at(0.0), 0.2 + offset, epsilon = 1e-4);
    assert_eq!(fit.evaluator().parameters(), &["A".to_string(), "l".to_string()]);
    Ok(())
}

#[test]
fn test_all_fixed_skips_optimization() -> Result<()> {
    let series = decay_series(0.2, 0.5, 50, 50.0, 0.01);
    let spec = FitSpecification::new("A*exp(-l*t)")?
        .with_variable(FitVariable::new("A", 0.2).fixed())
        .with_variable(FitVariable::new("l", 0.5).fixed())
        .with_dataset("68011", series.clone());

    let result = FitEngine::new().fit(&spec)?;
    let fit = &result.fits()[0];
    assert!(fit.solution().is_none());
    assert_eq!(fit.evaluator().parameter_count(), 0);

    let curve = fit.evaluate(series.time())?;
    for (model, data) in curve.iter().zip(series.values().iter()) {
        assert_relative_eq!(*model, *data, epsilon = 1e-12);
    }
    Ok(())
}

#[test]
fn test_alpha_correction_reports_uncorrected_model() -> Result<()> {
    let alpha = 0.9;
    let time = Array1::from_shape_fn(300, |i| i as f64 * 0.05);
    let corrected = |t: f64| {
        let f = 0.2 * (-0.5 * t).exp();
        ((1.0 - alpha) + (1.0 + alpha) * f) / ((1.0 + alpha) + (1.0 - alpha) * f)
    };
    let series = asymfit_rs::asymmetry::AsymmetrySeries::from_values(
        0.0,
        50.0,
        time.mapv(corrected),
        Some(Array1::from_elem(300, 0.01)),
    )?;

    let spec = FitSpecification::new("A*exp(-l*t)")?
        .with_variable(FitVariable::with_bounds("A", 0.3, 0.0, 1.0))
        .with_variable(FitVariable::with_bounds("l", 1.0, 0.0, 5.0))
        .with_variable(FitVariable::new("α", alpha).fixed())
        .with_dataset("68011", series)
        .with_options(FitOptions { global: false, alpha_correction: true });

    let result = FitEngine::new().fit(&spec)?;
    let fit = &result.fits()[0];
    assert!((fit.variable("A").unwrap().value() - 0.2).abs() < 1e-3);
    assert!((fit.variable("l").unwrap().value() - 0.5).abs() < 1e-3);

    // Evaluator is the model as written, not the corrected one
    assert_relative_eq!(fit.evaluate_at(0.0), fit.variable("A").unwrap().value(), epsilon = 1e-12);
    assert_eq!(fit.expression(), "A*exp(-l*t)");
    assert!(alpha_correction("f").contains("((1+α)*(f))"));
    Ok(())
}

#[test]
fn test_per_run_fits_keep_run_order() -> Result<()> {
    let spec = FitSpecification::new("A*exp(-l*t)")?
        .with_variable(FitVariable::with_bounds("A", 0.3, 0.0, 1.0))
        .with_variable(FitVariable::with_bounds("l", 1.0, 0.0, 5.0))
        .with_dataset("68013-M20", decay_series(0.15, 0.2, 200, 50.0, 0.01))
        .with_dataset("68011-M20", decay_series(0.25, 0.4, 200, 50.0, 0.01));

    let result = FitEngine::new().with_max_iterations(500).fit(&spec)?;
    let ids: Vec<&str> = result.fits().iter().map(|f| f.run_id()).collect();
    assert_eq!(ids, vec!["68013-M20", "68011-M20"]);

    let first = result.fit("68013-M20").unwrap();
    let second = result.fit("68011-M20").unwrap();
    assert!((first.variable("A").unwrap().value() - 0.15).abs() < 1e-4);
    assert!((second.variable("l").unwrap().value() - 0.4).abs() < 1e-4);
    assert!(result.global_solution().is_none());
    Ok(())
}

#[test]
fn test_registry_function_with_default_variables() -> Result<()> {
    let mut registry = FunctionRegistry::new();
    registry.insert("my decay", "a*exp(-r*t)")?;

    let spec = FitSpecification::from_registry(&registry, "my decay")?
        .with_default_variables(0.5)
        .with_dataset("68011", decay_series(0.2, 0.3, 200, 50.0, 0.01));

    let result = FitEngine::new().fit(&spec)?;
    let fit = &result.fits()[0];
    assert!((fit.variable("a").unwrap().value() - 0.2).abs() < 1e-4);
    assert!((fit.variable("r").unwrap().value() - 0.3).abs() < 1e-4);
    Ok(())
}

#[test]
fn test_starting_values_on_bounds() -> Result<()> {
    let series = decay_series(0.2, 0.1, 100, 100.0, 0.01);
    let cases = [
        // A0 on a one-sided lower bound
        ((0.0, 0.0, f64::INFINITY), (0.5, 0.0, f64::INFINITY)),
        // A0 on the lower end of a closed interval
        ((0.0, 0.0, 1.0), (0.5, 0.0, 1.0)),
        // lambda on the upper end of a closed interval
        ((0.5, 0.0, 1.0), (1.0, 0.0, 1.0)),
        // lambda on a one-sided upper bound
        ((0.5, 0.0, 1.0), (1.0, f64::NEG_INFINITY, 1.0)),
    ];

    for ((a, a_lo, a_hi), (l, l_lo, l_hi)) in cases {
        let spec = FitSpecification::new("f(t)=A0*exp(-lambda*t)")?
            .with_variable(FitVariable::with_bounds("A0", a, a_lo, a_hi))
            .with_variable(FitVariable::with_bounds("lambda", l, l_lo, l_hi))
            .with_dataset("68011", series.clone());

        let result = FitEngine::new().fit(&spec)?;
        let fit = &result.fits()[0];
        let solution = fit.solution().unwrap();
        assert!(solution.success, "A0 = {}, lambda = {}: {}", a, l, solution.message);
        assert!(solution.iterations < 100);
        assert_relative_eq!(fit.variable("A0").unwrap().value(), 0.2, epsilon = 1e-6);
        assert_relative_eq!(fit.variable("lambda").unwrap().value(), 0.1, epsilon = 1e-6);
    }
    Ok(())
}
