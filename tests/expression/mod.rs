//! Tests for model expressions: free parameters, model strings, textual
//! substitution and compiled evaluation.

use approx::assert_relative_eq;
use asymfit_rs::expression::{
    compile_model, is_valid_expression, parse_free_parameters, split_expression,
    substitute_values, ExpressionError,
};
use asymfit_rs::fit::{builtin_function, BUILTIN_FUNCTIONS};
use ndarray::array;
use std::collections::BTreeSet;

fn set(names: &[&str]) -> BTreeSet<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[test]
fn test_free_parameters() {
    assert_eq!(parse_free_parameters("lambda*t + beta"), set(&["lambda", "beta"]));
    assert_eq!(parse_free_parameters("sin(omega*t)"), set(&["omega"]));
    assert_eq!(
        parse_free_parameters("A(t) = A0*exp(-λ*t)*cos(2*π*v*t)"),
        set(&["A0", "λ", "v"])
    );
    assert!(parse_free_parameters("2*pi*t").is_empty());
}

#[test]
fn test_model_string_validity() {
    assert!(is_valid_expression("A(t)=a*t+b"));
    assert!(is_valid_expression("P(x) = exp(-(l*x)^b)"));
    assert!(!is_valid_expression("a*t+b"));
    assert!(!is_valid_expression("A(t)="));
    assert!(!is_valid_expression("A(t)=a*(t+b"));
    assert!(!is_valid_expression("A(t)=foo(t)"));

    assert_eq!(
        split_expression("P(x) = A*exp(-l*x)"),
        Some(("x".to_string(), "A*exp(-l*x)".to_string()))
    );
    assert_eq!(split_expression("A*exp(-l*t)"), None);
}

#[test]
fn test_substitution_keeps_longer_identifiers() {
    let expression = "a*exp(-lambda*t) + alpha + a2";
    let substituted = substitute_values(expression, &[("a", 0.5)]);
    assert_eq!(substituted, "(0.5)*exp(-lambda*t) + alpha + a2");

    let substituted = substitute_values("b^beta + b", &[("b", -1.5)]);
    assert_eq!(substituted, "(-1.5)^beta + (-1.5)");
}

#[test]
fn test_substituted_model_evaluates() {
    let substituted = substitute_values("A*exp(-l*t) + c", &[("c", -0.05)]);
    let model = compile_model(&substituted, &["A", "l"], "t").unwrap();

    let values = model.eval(&array![0.0, 2.0], &[0.25, 0.5]).unwrap();
    assert_relative_eq!(values[0], 0.2, epsilon = 1e-12);
    assert_relative_eq!(values[1], 0.25 * (-1.0f64).exp() - 0.05, epsilon = 1e-12);
}

#[test]
fn test_compile_errors() {
    assert!(matches!(
        compile_model("a*t + q", &["a"], "t"),
        Err(ExpressionError::UnknownSymbol { .. })
    ));
    assert!(matches!(
        compile_model("a*log(t)", &["a"], "t"),
        Err(ExpressionError::UndefinedFunction { .. })
    ));

    let model = compile_model("a*t", &["a"], "t").unwrap();
    assert!(matches!(
        model.eval(&array![1.0], &[1.0, 2.0]),
        Err(ExpressionError::ParameterCount { expected: 1, found: 2 })
    ));
}

#[test]
fn test_kubo_toyabe_functions_start_at_one() {
    for name in ["Gaussian KT", "Lorentzian KT", "Combined KT", "Stretched KT"] {
        let expression = builtin_function(name).unwrap();
        let parameters: Vec<String> = parse_free_parameters(expression).into_iter().collect();
        let values = vec![0.7; parameters.len()];
        let model = compile_model(expression, &parameters, "t").unwrap();
        assert_relative_eq!(model.eval_point(0.0, &values), 1.0, epsilon = 1e-12);
    }
    assert_eq!(BUILTIN_FUNCTIONS.len(), 11);
}

#[test]
fn test_gaussian_kt_minimum() {
    // Gaussian Kubo-Toyabe has its minimum 1/3 + 2/3 * (-2) * exp(-1.5) at σt = √3
    let expression = builtin_function("Gaussian KT").unwrap();
    let model = compile_model(expression, &["σ"], "t").unwrap();
    let expected = 1.0 / 3.0 - 4.0 / 3.0 * (-1.5f64).exp();
    assert_relative_eq!(model.eval_point(3f64.sqrt(), &[1.0]), expected, epsilon = 1e-12);
}
