//! Weighted least-squares residuals of asymmetry fits.

use ndarray::Array1;

use super::layout::UnknownLayout;
use crate::asymmetry::AsymmetrySeries;
use crate::error::{AsymFitError, Result};
use crate::expression::CompiledModel;
use crate::problem::Problem;

/// `(data - model) / sigma`, with zero wherever sigma is zero or non-finite.
pub fn weighted_residual(data: f64, model: f64, sigma: f64) -> f64 {
    if sigma == 0.0 || !sigma.is_finite() {
        0.0
    } else {
        (data - model) / sigma
    }
}

fn uncertainty_of(series: &AsymmetrySeries) -> Result<&Array1<f64>> {
    series
        .uncertainty()
        .ok_or_else(|| AsymFitError::Fit("dataset carries no uncertainty".to_string()))
}

/// Residuals of one run against a compiled model.
pub struct SingleRunProblem<'a> {
    model: &'a CompiledModel,
    time: &'a Array1<f64>,
    values: &'a Array1<f64>,
    sigma: &'a Array1<f64>,
}

impl<'a> SingleRunProblem<'a> {
    pub fn new(model: &'a CompiledModel, series: &'a AsymmetrySeries) -> Result<Self> {
        Ok(Self {
            model,
            time: series.time(),
            values: series.values(),
            sigma: uncertainty_of(series)?,
        })
    }
}

impl Problem for SingleRunProblem<'_> {
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        let params = params.to_vec();
        let model = self.model.eval(self.time, &params)?;
        Ok(Array1::from_shape_fn(self.values.len(), |i| {
            weighted_residual(self.values[i], model[i], self.sigma[i])
        }))
    }

    fn parameter_count(&self) -> usize {
        self.model.parameter_count()
    }

    fn residual_count(&self) -> usize {
        self.values.len()
    }
}

/// Cumulative sample offsets of concatenated runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SegmentTable {
    offsets: Vec<usize>,
}

impl SegmentTable {
    pub fn new(lengths: impl IntoIterator<Item = usize>) -> Self {
        let mut offsets = vec![0];
        for length in lengths {
            let last = offsets[offsets.len() - 1];
            offsets.push(last + length);
        }
        Self { offsets }
    }

    /// Number of runs.
    pub fn len(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total number of samples.
    pub fn total(&self) -> usize {
        self.offsets[self.offsets.len() - 1]
    }

    /// Sample range of run `run` in the concatenated arrays.
    pub fn range(&self, run: usize) -> std::ops::Range<usize> {
        self.offsets[run]..self.offsets[run + 1]
    }

    /// Run that sample `sample` belongs to.
    pub fn run_of(&self, sample: usize) -> Option<usize> {
        if sample >= self.total() {
            return None;
        }
        Some(self.offsets.partition_point(|&offset| offset <= sample) - 1)
    }
}

/// Residuals of all runs of a global fit, over the full unknown vector.
pub struct GlobalProblem<'a> {
    model: &'a CompiledModel,
    layout: &'a UnknownLayout,
    segments: SegmentTable,
    time: Array1<f64>,
    values: Array1<f64>,
    sigma: Array1<f64>,
}

impl<'a> GlobalProblem<'a> {
    /// Concatenate the runs' samples in run order.
    pub fn new(
        model: &'a CompiledModel,
        layout: &'a UnknownLayout,
        runs: &[&AsymmetrySeries],
    ) -> Result<Self> {
        if runs.len() != layout.run_count() {
            return Err(AsymFitError::Fit(format!(
                "layout covers {} runs but {} datasets were given",
                layout.run_count(),
                runs.len()
            )));
        }
        if layout.parameters().len() != model.parameter_count() {
            return Err(AsymFitError::Fit(format!(
                "layout has {} parameters but the model takes {}",
                layout.parameters().len(),
                model.parameter_count()
            )));
        }

        let mut sigma = Vec::new();
        for series in runs {
            sigma.extend(uncertainty_of(series)?.iter().copied());
        }
        let time = runs.iter().flat_map(|s| s.time().iter().copied()).collect();
        let values = runs.iter().flat_map(|s| s.values().iter().copied()).collect();

        Ok(Self {
            model,
            layout,
            segments: SegmentTable::new(runs.iter().map(|s| s.len())),
            time,
            values,
            sigma: Array1::from_vec(sigma),
        })
    }

    pub fn segments(&self) -> &SegmentTable {
        &self.segments
    }

    /// Concatenated asymmetry values.
    pub fn values(&self) -> &Array1<f64> {
        &self.values
    }

    /// Concatenated uncertainties.
    pub fn sigma(&self) -> &Array1<f64> {
        &self.sigma
    }
}

impl Problem for GlobalProblem<'_> {
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        if params.len() != self.layout.len() {
            return Err(AsymFitError::DimensionMismatch(format!(
                "Expected {} unknowns, got {}",
                self.layout.len(),
                params.len()
            )));
        }

        let mut residuals = Array1::zeros(self.values.len());
        for run in 0..self.segments.len() {
            let run_params = self.layout.gather(params, run);
            for i in self.segments.range(run) {
                let model = self.model.eval_point(self.time[i], &run_params);
                residuals[i] = weighted_residual(self.values[i], model, self.sigma[i]);
            }
        }
        Ok(residuals)
    }

    fn parameter_count(&self) -> usize {
        self.layout.len()
    }

    fn residual_count(&self) -> usize {
        self.values.len()
    }
}
