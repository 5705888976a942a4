//! Free-parameter extraction.

use std::collections::BTreeSet;

use super::model_string::ModelString;
use super::tokens::tokenize;
use super::{is_constant, is_function, DEFAULT_INDEPENDENT_VARIABLE};

/// Names of the free parameters of a model.
///
/// Accepts either a full model string (`A(t)=a*t+b`), in which case the
/// declared independent variable is excluded, or a bare expression, for which
/// the default independent variable `t` is excluded. Function and constant
/// tokens are never parameters, and matching is by whole identifier, so
/// `lambda` does not imply `a` and `expo` is a parameter.
///
/// # Examples
///
/// ```
/// use asymfit_rs::expression::parse_free_parameters;
///
/// let params = parse_free_parameters("lambda*t + beta");
/// assert_eq!(params.into_iter().collect::<Vec<_>>(), vec!["beta", "lambda"]);
///
/// let params = parse_free_parameters("P(x) = sin(omega*x) + t");
/// assert_eq!(params.into_iter().collect::<Vec<_>>(), vec!["omega", "t"]);
/// ```
pub fn parse_free_parameters(expression: &str) -> BTreeSet<String> {
    match ModelString::parse(expression) {
        Ok(model) => parse_free_parameters_with(&model.expression, &model.independent),
        Err(_) => parse_free_parameters_with(expression, DEFAULT_INDEPENDENT_VARIABLE),
    }
}

/// Names of the free parameters of `expression`, excluding `independent`.
pub fn parse_free_parameters_with(expression: &str, independent: &str) -> BTreeSet<String> {
    tokenize(expression)
        .into_iter()
        .filter(|token| token.is_identifier())
        .map(|token| token.text)
        .filter(|name| *name != independent && !is_function(name) && !is_constant(name))
        .map(str::to_string)
        .collect()
}
