//! Description of one fit request.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use super::library::FunctionRegistry;
use crate::asymmetry::AsymmetrySeries;
use crate::error::{AsymFitError, Result};
use crate::expression::{parse_free_parameters_with, ModelString, DEFAULT_INDEPENDENT_VARIABLE};
use crate::parameters::FitVariable;

/// Switches of a fit request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FitOptions {
    /// Fit all runs jointly, sharing global variables
    pub global: bool,
    /// Wrap the model in the alpha (detector efficiency) correction
    pub alpha_correction: bool,
}

/// A model, its variables and the runs to fit it to.
///
/// Variables and datasets keep insertion order; variable order determines
/// the optimizer's unknown vector.
#[derive(Debug, Clone)]
pub struct FitSpecification {
    expression: String,
    independent: String,
    variables: Vec<FitVariable>,
    datasets: Vec<(String, AsymmetrySeries)>,
    options: FitOptions,
}

impl FitSpecification {
    /// Start a specification from a model.
    ///
    /// `model` is either a model string `name(var) = expression` or a bare
    /// expression in `t`.
    ///
    /// # Examples
    ///
    /// ```
    /// use asymfit_rs::fit::FitSpecification;
    ///
    /// let spec = FitSpecification::new("P(x) = A*exp(-l*x)").unwrap();
    /// assert_eq!(spec.expression(), "A*exp(-l*x)");
    /// assert_eq!(spec.independent_variable(), "x");
    ///
    /// let spec = FitSpecification::new("A*exp(-l*t)").unwrap();
    /// assert_eq!(spec.independent_variable(), "t");
    /// ```
    pub fn new(model: &str) -> Result<Self> {
        let (independent, expression) = if model.contains('=') {
            let parsed = ModelString::parse(model)?;
            (parsed.independent, parsed.expression)
        } else {
            (
                DEFAULT_INDEPENDENT_VARIABLE.to_string(),
                model.trim().to_string(),
            )
        };

        Ok(Self {
            expression,
            independent,
            variables: Vec::new(),
            datasets: Vec::new(),
            options: FitOptions::default(),
        })
    }

    /// Start from a saved or built-in function (saved functions take
    /// precedence).
    pub fn from_registry(registry: &FunctionRegistry, name: &str) -> Result<Self> {
        let expression = registry
            .resolve(name)
            .ok_or_else(|| AsymFitError::Fit(format!("no function named '{}'", name)))?;
        Self::new(expression)
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn independent_variable(&self) -> &str {
        &self.independent
    }

    /// Free parameters of the model expression.
    pub fn free_parameters(&self) -> BTreeSet<String> {
        parse_free_parameters_with(&self.expression, &self.independent)
    }

    pub fn variables(&self) -> &[FitVariable] {
        &self.variables
    }

    pub fn variable(&self, name: &str) -> Option<&FitVariable> {
        self.variables.iter().find(|v| v.name == name)
    }

    pub fn variable_mut(&mut self, name: &str) -> Option<&mut FitVariable> {
        self.variables.iter_mut().find(|v| v.name == name)
    }

    /// Add a variable, replacing one of the same name in place.
    pub fn add_variable(&mut self, variable: FitVariable) -> &mut Self {
        match self.variable_mut(&variable.name) {
            Some(existing) => *existing = variable,
            None => self.variables.push(variable),
        }
        self
    }

    pub fn with_variable(mut self, variable: FitVariable) -> Self {
        self.add_variable(variable);
        self
    }

    /// Add an unbounded variable with value `guess` for every free parameter
    /// that has none yet.
    pub fn with_default_variables(mut self, guess: f64) -> Self {
        for name in self.free_parameters() {
            if self.variable(&name).is_none() {
                self.variables.push(FitVariable::new(&name, guess));
            }
        }
        self
    }

    pub fn datasets(&self) -> &[(String, AsymmetrySeries)] {
        &self.datasets
    }

    pub fn run_ids(&self) -> Vec<&str> {
        self.datasets.iter().map(|(id, _)| id.as_str()).collect()
    }

    /// Add the series of run `run_id`, replacing an earlier one of the same id.
    pub fn add_dataset(&mut self, run_id: &str, series: AsymmetrySeries) -> &mut Self {
        match self.datasets.iter_mut().find(|(id, _)| id == run_id) {
            Some(existing) => existing.1 = series,
            None => self.datasets.push((run_id.to_string(), series)),
        }
        self
    }

    pub fn with_dataset(mut self, run_id: &str, series: AsymmetrySeries) -> Self {
        self.add_dataset(run_id, series);
        self
    }

    pub fn options(&self) -> FitOptions {
        self.options
    }

    pub fn with_options(mut self, options: FitOptions) -> Self {
        self.options = options;
        self
    }

    pub fn set_options(&mut self, options: FitOptions) -> &mut Self {
        self.options = options;
        self
    }
}
