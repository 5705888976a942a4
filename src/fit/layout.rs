//! Placement of fit variables in the optimizer's unknown vector.
//!
//! Variables are laid out in insertion order. A global variable takes one
//! position shared by every run; any other variable takes one position per
//! run, in run order. Each run then reads its model parameters from the
//! unknown vector through an index vector.

use ndarray::Array1;

use crate::parameters::FitVariable;

/// The part of a run id before its first `-`, used in unknown labels.
///
/// # Examples
///
/// ```
/// use asymfit_rs::fit::short_run_id;
///
/// assert_eq!(short_run_id("68011-M20-2021"), "68011");
/// assert_eq!(short_run_id("68011"), "68011");
/// ```
pub fn short_run_id(run_id: &str) -> &str {
    run_id.split('-').next().unwrap_or(run_id)
}

/// Label suffix of each run: its short id, or the full id when another run
/// shares the short one.
fn run_suffixes<S: AsRef<str>>(run_ids: &[S]) -> Vec<&str> {
    run_ids
        .iter()
        .map(|run_id| {
            let short = short_run_id(run_id.as_ref());
            let shared = run_ids
                .iter()
                .filter(|other| short_run_id(other.as_ref()) == short)
                .count()
                > 1;
            if shared {
                run_id.as_ref()
            } else {
                short
            }
        })
        .collect()
}

/// One entry of the unknown vector.
#[derive(Debug, Clone, PartialEq)]
pub struct UnknownSlot {
    /// Name of the variable this unknown belongs to
    pub variable: String,
    /// Run the unknown belongs to; `None` for a global variable
    pub run: Option<usize>,
    /// Reporting label: the variable name, suffixed with `_<short run id>`
    /// for per-run unknowns (`_<run id>` when short ids collide)
    pub label: String,
    /// Initial value
    pub guess: f64,
    pub lower: f64,
    pub upper: f64,
}

/// Table mapping each (variable, run) pair to its position in the unknown
/// vector.
#[derive(Debug, Clone, PartialEq)]
pub struct UnknownLayout {
    slots: Vec<UnknownSlot>,
    parameters: Vec<String>,
    run_indices: Vec<Vec<usize>>,
}

impl UnknownLayout {
    /// Lay out `variables` for the runs `run_ids`.
    ///
    /// Every variable passed in becomes a model parameter; callers leave out
    /// fixed variables.
    pub fn new<S: AsRef<str>>(variables: &[&FitVariable], run_ids: &[S]) -> Self {
        let mut slots = Vec::new();
        let mut run_indices = vec![Vec::with_capacity(variables.len()); run_ids.len()];
        let suffixes = run_suffixes(run_ids);

        for variable in variables {
            let slot = |run: Option<usize>, label: String| UnknownSlot {
                variable: variable.name.clone(),
                run,
                label,
                guess: variable.value(),
                lower: variable.lower(),
                upper: variable.upper(),
            };

            if variable.global {
                let position = slots.len();
                slots.push(slot(None, variable.name.clone()));
                for indices in run_indices.iter_mut() {
                    indices.push(position);
                }
            } else {
                for (run, suffix) in suffixes.iter().enumerate() {
                    run_indices[run].push(slots.len());
                    let label = format!("{}_{}", variable.name, suffix);
                    slots.push(slot(Some(run), label));
                }
            }
        }

        Self {
            slots,
            parameters: variables.iter().map(|v| v.name.clone()).collect(),
            run_indices,
        }
    }

    /// Number of unknowns.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn slots(&self) -> &[UnknownSlot] {
        &self.slots
    }

    /// Model parameter names, in the order of each run's index vector.
    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    pub fn run_count(&self) -> usize {
        self.run_indices.len()
    }

    /// Positions of run `run`'s model parameters in the unknown vector.
    pub fn run_indices(&self, run: usize) -> &[usize] {
        &self.run_indices[run]
    }

    pub fn labels(&self) -> Vec<&str> {
        self.slots.iter().map(|slot| slot.label.as_str()).collect()
    }

    /// Position of `variable` for `run` (any run for a global variable).
    pub fn position(&self, variable: &str, run: usize) -> Option<usize> {
        let k = self.parameters.iter().position(|name| name == variable)?;
        self.run_indices.get(run).map(|indices| indices[k])
    }

    /// Run `run`'s model parameters, gathered from the unknown vector.
    pub fn gather(&self, unknowns: &Array1<f64>, run: usize) -> Vec<f64> {
        self.run_indices[run].iter().map(|&i| unknowns[i]).collect()
    }

    pub fn guesses(&self) -> Array1<f64> {
        self.slots.iter().map(|slot| slot.guess).collect()
    }

    pub fn lower(&self) -> Array1<f64> {
        self.slots.iter().map(|slot| slot.lower).collect()
    }

    pub fn upper(&self) -> Array1<f64> {
        self.slots.iter().map(|slot| slot.upper).collect()
    }
}
