//! Fitting user models to asymmetry data.

use std::time::{SystemTime, UNIX_EPOCH};

use log::{debug, info, warn};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::layout::UnknownLayout;
use super::residual::{GlobalProblem, SingleRunProblem};
use super::result::{Fit, FitDataset, GlobalSolution};
use super::spec::FitSpecification;
use crate::asymmetry::AsymmetrySeries;
use crate::error::{AsymFitError, Result};
use crate::expression::{compile_model, substitute_values, CompiledModel};
use crate::lm::{LevenbergMarquardt, LmConfig, LmResult};
use crate::parameters::FitVariable;

/// Name of the detector-efficiency variable used by the alpha correction.
pub const ALPHA_SYMBOL: &str = "α";

/// Wrap `expression` in the alpha correction
/// `((1-α)+((1+α)*(f)))/((1+α)+((1-α)*(f)))`.
///
/// # Examples
///
/// ```
/// use asymfit_rs::fit::alpha_correction;
///
/// assert_eq!(
///     alpha_correction("a*t"),
///     "((1-α)+((1+α)*(a*t)))/((1+α)+((1-α)*(a*t)))"
/// );
/// ```
pub fn alpha_correction(expression: &str) -> String {
    format!(
        "((1-{a})+((1+{a})*({f})))/((1+{a})+((1-{a})*({f})))",
        a = ALPHA_SYMBOL,
        f = expression
    )
}

/// Solves fit requests with a bounded Levenberg-Marquardt optimizer.
///
/// # Examples
///
/// ```
/// use asymfit_rs::asymmetry::AsymmetrySeries;
/// use asymfit_rs::fit::{FitEngine, FitSpecification};
/// use asymfit_rs::parameters::FitVariable;
/// use ndarray::Array1;
///
/// let series = AsymmetrySeries::from_values(
///     0.0,
///     100.0,
///     Array1::from_shape_fn(100, |i| 0.2 * (-0.1 * i as f64 * 0.1).exp()),
///     Some(Array1::from_elem(100, 0.01)),
/// )
/// .unwrap();
///
/// let spec = FitSpecification::new("f(t)=A0*exp(-lambda*t)")
///     .unwrap()
///     .with_variable(FitVariable::with_bounds("A0", 0.5, 0.0, 1.0))
///     .with_variable(FitVariable::with_bounds("lambda", 0.5, 0.0, 1.0))
///     .with_dataset("68011-M20", series);
///
/// let result = FitEngine::new().fit(&spec).unwrap();
/// let fit = result.fit("68011-M20").unwrap();
/// assert!((fit.variable("A0").unwrap().value() - 0.2).abs() < 1e-3);
/// assert!((fit.variable("lambda").unwrap().value() - 0.1).abs() < 1e-3);
/// ```
#[derive(Debug, Clone, Default)]
pub struct FitEngine {
    config: LmConfig,
}

/// Compiled forms of a request's model.
struct Models {
    /// Optimized model: alpha-corrected if requested, fixed values substituted
    fitted: CompiledModel,
    /// Reported model: as written, fixed values substituted
    evaluator: CompiledModel,
}

impl FitEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: LmConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LmConfig {
        &self.config
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.config.max_iterations = max_iterations;
        self
    }

    pub fn with_ftol(mut self, ftol: f64) -> Self {
        self.config.ftol = ftol;
        self
    }

    pub fn with_xtol(mut self, xtol: f64) -> Self {
        self.config.xtol = xtol;
        self
    }

    pub fn with_gtol(mut self, gtol: f64) -> Self {
        self.config.gtol = gtol;
        self
    }

    fn optimizer(&self) -> LevenbergMarquardt {
        LevenbergMarquardt::with_config(self.config.clone())
    }

    /// Fit the model of `spec` to its datasets.
    ///
    /// Without the global option every run is fitted on its own with the
    /// same starting values. With it, all runs are fitted jointly: global
    /// variables are shared, every other free variable gets one value per
    /// run.
    ///
    /// # Errors
    ///
    /// [`AsymFitError::Fit`] when the request is inconsistent: no datasets,
    /// datasets of different or zero length, an empty expression, a dataset
    /// without uncertainties, a free parameter without a variable, alpha
    /// correction without an `α` variable, or a free variable whose value is
    /// non-finite or outside its bounds. [`AsymFitError::Compilation`] when
    /// the expression does not compile.
    pub fn fit(&self, spec: &FitSpecification) -> Result<FitDataset> {
        validate(spec)?;
        let options = spec.options();

        let free_parameters = spec.free_parameters();
        let active: Vec<&FitVariable> = spec
            .variables()
            .iter()
            .filter(|v| !v.fixed)
            .filter(|v| {
                free_parameters.contains(&v.name)
                    || (options.alpha_correction && v.name == ALPHA_SYMBOL)
            })
            .collect();
        let models = compile_models(spec, &active)?;

        let (fits, global) = if options.global {
            self.fit_global(spec, &active, &models)?
        } else {
            (self.fit_each(spec, &active, &models)?, None)
        };

        let solutions: Vec<&LmResult> = match &global {
            Some(g) => vec![&g.solution],
            None => fits.iter().filter_map(|fit| fit.solution()).collect(),
        };
        info!(
            "fitted {} run(s) of '{}' ({} free variable(s){}): {} iterations, cost {:.6e}",
            fits.len(),
            spec.expression(),
            active.len(),
            if options.global { ", global" } else { "" },
            solutions.iter().map(|s| s.iterations).sum::<usize>(),
            solutions.iter().map(|s| s.cost).sum::<f64>()
        );

        Ok(FitDataset {
            id: dataset_id(),
            fits,
            options,
            expression: spec.expression().to_string(),
            global,
        })
    }

    fn fit_each(
        &self,
        spec: &FitSpecification,
        active: &[&FitVariable],
        models: &Models,
    ) -> Result<Vec<Fit>> {
        let optimizer = self.optimizer();
        let solve = |(run_id, series): &(String, AsymmetrySeries)| -> Result<Fit> {
            let layout = UnknownLayout::new(active, &[run_id]);
            if layout.is_empty() {
                return Ok(build_fit(spec, run_id, models, &[], Vec::new(), None));
            }

            let problem = SingleRunProblem::new(&models.fitted, series)?;
            let solution = optimizer.minimize_bounded(
                &problem,
                layout.guesses(),
                &layout.lower(),
                &layout.upper(),
            )?;
            report(run_id, &solution);

            let values = solution.params.to_vec();
            Ok(build_fit(
                spec,
                run_id,
                models,
                layout.parameters(),
                values,
                Some(solution),
            ))
        };

        #[cfg(feature = "parallel")]
        let fits = spec.datasets().par_iter().map(solve).collect();
        #[cfg(not(feature = "parallel"))]
        let fits = spec.datasets().iter().map(solve).collect();
        fits
    }

    fn fit_global(
        &self,
        spec: &FitSpecification,
        active: &[&FitVariable],
        models: &Models,
    ) -> Result<(Vec<Fit>, Option<GlobalSolution>)> {
        let run_ids = spec.run_ids();
        let layout = UnknownLayout::new(active, &run_ids);
        debug!(
            "global layout: {} unknown(s) for {} run(s): {:?}",
            layout.len(),
            run_ids.len(),
            layout.labels()
        );

        if layout.is_empty() {
            let fits = run_ids
                .iter()
                .map(|run_id| build_fit(spec, run_id, models, &[], Vec::new(), None))
                .collect();
            return Ok((fits, None));
        }

        let runs: Vec<&AsymmetrySeries> = spec.datasets().iter().map(|(_, s)| s).collect();
        let problem = GlobalProblem::new(&models.fitted, &layout, &runs)?;
        let solution = self.optimizer().minimize_bounded(
            &problem,
            layout.guesses(),
            &layout.lower(),
            &layout.upper(),
        )?;
        report("global", &solution);

        let fits = run_ids
            .iter()
            .enumerate()
            .map(|(run, run_id)| {
                let values = layout.gather(&solution.params, run);
                build_fit(spec, run_id, models, layout.parameters(), values, None)
            })
            .collect();

        Ok((fits, Some(GlobalSolution { layout, solution })))
    }
}

fn validate(spec: &FitSpecification) -> Result<()> {
    let datasets = spec.datasets();
    let (_, first) = datasets
        .first()
        .ok_or_else(|| AsymFitError::Fit("no datasets to fit".to_string()))?;
    if datasets.iter().any(|(_, s)| s.len() != first.len()) {
        return Err(AsymFitError::Fit(
            "datasets must all be of equal length".to_string(),
        ));
    }
    if first.is_empty() {
        return Err(AsymFitError::Fit("datasets are empty".to_string()));
    }
    if let Some((run_id, _)) = datasets.iter().find(|(_, s)| s.uncertainty().is_none()) {
        return Err(AsymFitError::Fit(format!(
            "dataset '{}' carries no uncertainty",
            run_id
        )));
    }

    if spec.expression().trim().is_empty() {
        return Err(AsymFitError::Fit("empty model expression".to_string()));
    }
    let missing: Vec<String> = spec
        .free_parameters()
        .into_iter()
        .filter(|name| spec.variable(name).is_none())
        .collect();
    if !missing.is_empty() {
        return Err(AsymFitError::Fit(format!(
            "no variable defined for {}",
            missing.join(", ")
        )));
    }
    if spec.options().alpha_correction && spec.variable(ALPHA_SYMBOL).is_none() {
        return Err(AsymFitError::Fit(format!(
            "alpha correction requires a variable named '{}'",
            ALPHA_SYMBOL
        )));
    }

    for variable in spec.variables().iter().filter(|v| !v.fixed) {
        variable
            .bounds()
            .map_err(|e| AsymFitError::Fit(format!("variable '{}': {}", variable.name, e)))?;
        if !variable.value().is_finite() || !variable.is_within_bounds() {
            return Err(AsymFitError::Fit(format!(
                "variable '{}': initial value {} outside [{}, {}]",
                variable.name,
                variable.value(),
                variable.lower(),
                variable.upper()
            )));
        }
    }
    Ok(())
}

fn compile_models(spec: &FitSpecification, active: &[&FitVariable]) -> Result<Models> {
    let fixed: Vec<(&str, f64)> = spec
        .variables()
        .iter()
        .filter(|v| v.fixed)
        .map(|v| (v.name.as_str(), v.value()))
        .collect();
    let names: Vec<&str> = active.iter().map(|v| v.name.as_str()).collect();
    let independent = spec.independent_variable();

    let fitted_source = if spec.options().alpha_correction {
        alpha_correction(spec.expression())
    } else {
        spec.expression().to_string()
    };
    let fitted = compile_model(&substitute_values(&fitted_source, &fixed), &names, independent)?;
    debug!("fitting {}({}) = {}", independent, names.join(", "), fitted.expression());

    let evaluator =
        compile_model(&substitute_values(spec.expression(), &fixed), &names, independent)?;
    Ok(Models { fitted, evaluator })
}

/// Copy the request's variables, overwriting the optimized ones.
fn build_fit(
    spec: &FitSpecification,
    run_id: &str,
    models: &Models,
    parameters: &[String],
    values: Vec<f64>,
    solution: Option<LmResult>,
) -> Fit {
    let mut variables = spec.variables().to_vec();
    for (name, value) in parameters.iter().zip(values.iter()) {
        if let Some(variable) = variables.iter_mut().find(|v| &v.name == name) {
            variable.set_value(*value);
        }
    }

    Fit {
        run_id: run_id.to_string(),
        expression: spec.expression().to_string(),
        variables,
        evaluator: models.evaluator.clone(),
        values,
        solution,
    }
}

fn report(run: &str, solution: &LmResult) {
    if solution.success {
        debug!(
            "{}: {} after {} iterations, cost {:.6e}",
            run, solution.message, solution.iterations, solution.cost
        );
    } else {
        warn!(
            "{}: optimizer stopped without converging ({}), cost {:.6e}",
            run, solution.message, solution.cost
        );
    }
}

fn dataset_id() -> String {
    let seconds = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    format!("fit-{}", seconds)
}
