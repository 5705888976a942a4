//! Outcome of a fit request.

use std::fmt;

use ndarray::Array1;

use super::layout::UnknownLayout;
use super::spec::{FitOptions, FitSpecification};
use crate::asymmetry::AsymmetrySeries;
use crate::error::{AsymFitError, Result};
use crate::expression::CompiledModel;
use crate::lm::LmResult;
use crate::parameters::FitVariable;
use crate::uncertainty::{estimate_uncertainty, UncertaintyEstimate};

/// Uncertainties as used in the weighted residuals: points with zero or
/// non-finite uncertainty carry no weight.
fn effective_errors(sigma: &Array1<f64>) -> Array1<f64> {
    sigma.mapv(|s| if s == 0.0 || !s.is_finite() { f64::INFINITY } else { s })
}

/// Final model of one run.
#[derive(Debug, Clone)]
pub struct Fit {
    pub(crate) run_id: String,
    pub(crate) expression: String,
    pub(crate) variables: Vec<FitVariable>,
    pub(crate) evaluator: CompiledModel,
    pub(crate) values: Vec<f64>,
    pub(crate) solution: Option<LmResult>,
}

impl Fit {
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// The user's model expression, without alpha correction.
    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn independent_variable(&self) -> &str {
        self.evaluator.independent_variable()
    }

    /// Final variables: optimized values for free variables, fixed ones as given.
    pub fn variables(&self) -> &[FitVariable] {
        &self.variables
    }

    pub fn variable(&self, name: &str) -> Option<&FitVariable> {
        self.variables.iter().find(|v| v.name == name)
    }

    /// Model with fixed variables substituted, compiled over the free ones.
    pub fn evaluator(&self) -> &CompiledModel {
        &self.evaluator
    }

    /// Optimizer solution of a per-run fit. `None` when nothing was optimized
    /// or when the run was part of a global fit.
    pub fn solution(&self) -> Option<&LmResult> {
        self.solution.as_ref()
    }

    /// The fitted model over `time` (no alpha correction).
    pub fn evaluate(&self, time: &Array1<f64>) -> Result<Array1<f64>> {
        Ok(self.evaluator.eval(time, &self.values)?)
    }

    pub fn evaluate_at(&self, t: f64) -> f64 {
        self.evaluator.eval_point(t, &self.values)
    }

    /// Parameter uncertainties of a per-run fit, against the series it was
    /// fitted to. Entries follow the order of the free variables.
    pub fn estimate_uncertainty(&self, series: &AsymmetrySeries) -> Result<UncertaintyEstimate> {
        let solution = self.solution.as_ref().ok_or_else(|| {
            AsymFitError::Fit(format!("run '{}' has no per-run solution", self.run_id))
        })?;
        let errors = series
            .uncertainty()
            .map(effective_errors)
            .ok_or_else(|| AsymFitError::Fit("dataset carries no uncertainty".to_string()))?;
        estimate_uncertainty(solution, series.values(), Some(&errors), 0)
    }
}

impl fmt::Display for Fit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Fit of run {}: {}", self.run_id, self.expression)?;
        for variable in &self.variables {
            let marker = if variable.fixed { " (fixed)" } else { "" };
            writeln!(f, "  {} = {:.6e}{}", variable.name, variable.value(), marker)?;
        }
        Ok(())
    }
}

/// Joint solution of a global fit.
#[derive(Debug, Clone)]
pub struct GlobalSolution {
    pub layout: UnknownLayout,
    pub solution: LmResult,
}

impl GlobalSolution {
    /// Uncertainties of every unknown (ordered as `layout.labels()`), against
    /// the runs of `spec` concatenated in run order.
    pub fn estimate_uncertainty(&self, spec: &FitSpecification) -> Result<UncertaintyEstimate> {
        let mut data = Vec::new();
        let mut errors = Vec::new();
        for (run_id, series) in spec.datasets() {
            let sigma = series.uncertainty().ok_or_else(|| {
                AsymFitError::Fit(format!("dataset '{}' carries no uncertainty", run_id))
            })?;
            data.extend(series.values().iter().copied());
            errors.extend(effective_errors(sigma).iter().copied());
        }
        estimate_uncertainty(
            &self.solution,
            &Array1::from_vec(data),
            Some(&Array1::from_vec(errors)),
            0,
        )
    }
}

/// All fits of one request, in run order.
#[derive(Debug, Clone)]
pub struct FitDataset {
    pub(crate) id: String,
    pub(crate) fits: Vec<Fit>,
    pub(crate) options: FitOptions,
    pub(crate) expression: String,
    pub(crate) global: Option<GlobalSolution>,
}

impl FitDataset {
    /// Identifier of the request, `fit-<unix seconds>`.
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn fits(&self) -> &[Fit] {
        &self.fits
    }

    pub fn fit(&self, run_id: &str) -> Option<&Fit> {
        self.fits.iter().find(|fit| fit.run_id == run_id)
    }

    pub fn options(&self) -> FitOptions {
        self.options
    }

    pub fn expression(&self) -> &str {
        &self.expression
    }

    /// The joint solution, for global fits with at least one free variable.
    pub fn global_solution(&self) -> Option<&GlobalSolution> {
        self.global.as_ref()
    }

    pub fn len(&self) -> usize {
        self.fits.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fits.is_empty()
    }
}
