//! Named model expressions: the built-in relaxation functions and the
//! user's saved functions.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::expression::{
    compile_model, parse_free_parameters_with, ModelString, DEFAULT_INDEPENDENT_VARIABLE,
};

/// Built-in muon-spin relaxation models, as `(name, expression)` in `t`.
pub const BUILTIN_FUNCTIONS: [(&str, &str); 11] = [
    ("Simple Exponential", "exp(-λ*t)"),
    ("Stretched Exponential", "exp(-(λ*t)^β)"),
    ("Simple Gaussian", "exp(-1/2*(σ*t)^2)"),
    ("Gaussian KT", "1/3 + 2/3*(1 - (σ*t)^2)*exp(-1/2*(σ*t)^2)"),
    ("Lorentzian KT", "1/3 + 2/3*(1 - λ*t)*exp(-λ*t)"),
    ("Combined KT", "1/3 + 2/3*(1-σ^2*t^2-λ*t)*exp(-σ^2*t^2/2-λ*t)"),
    ("Stretched KT", "1/3 + 2/3*(1-(σ*t)^β)*exp(-(σ*t)^β/β)"),
    ("Cosine", "a*cos(2*π*v*t + π*Φ/180)*exp(-β*t)"),
    (
        "Internal Cosine",
        "α*cos(2*π*v*t + π*Φ/180)*exp(-λ*t) + (1-α)*exp(-λ*t)",
    ),
    ("Bessel", "j₀*(2*π*v*t + π*Φ/180)"),
    (
        "Internal Bessel",
        "α*j₀*(2*π*v*t + π*Φ/180)*exp(-λ*t) + (1-α)*exp(-λ*t)",
    ),
];

/// Expression of the built-in model `name`.
///
/// # Examples
///
/// ```
/// use asymfit_rs::fit::builtin_function;
///
/// assert_eq!(builtin_function("Simple Exponential"), Some("exp(-λ*t)"));
/// assert_eq!(builtin_function("simple exponential"), None);
/// ```
pub fn builtin_function(name: &str) -> Option<&'static str> {
    BUILTIN_FUNCTIONS
        .iter()
        .find(|(builtin, _)| *builtin == name)
        .map(|(_, expression)| *expression)
}

/// User-saved model expressions keyed by name.
///
/// Persisted as a flat JSON object `{ "name": "expression", ... }`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FunctionRegistry {
    functions: BTreeMap<String, String>,
}

impl FunctionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read a registry from a JSON file.
    pub fn load_json<P: AsRef<Path>>(path: P) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    /// Write the registry to a JSON file, replacing its contents.
    pub fn save_json<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    pub fn from_json(text: &str) -> Result<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Save `expression` under `name`, returning the expression it replaces.
    ///
    /// A full model string `name(var) = rhs` must compile as a function of
    /// its declared variable, a bare expression as a function of `t`. The
    /// text is stored as given.
    pub fn insert(&mut self, name: &str, expression: &str) -> Result<Option<String>> {
        let (independent, body) = if expression.contains('=') {
            let model = ModelString::parse(expression)?;
            (model.independent, model.expression)
        } else {
            (DEFAULT_INDEPENDENT_VARIABLE.to_string(), expression.to_string())
        };
        let parameters: Vec<String> =
            parse_free_parameters_with(&body, &independent).into_iter().collect();
        compile_model(&body, &parameters, &independent)?;
        Ok(self
            .functions
            .insert(name.to_string(), expression.to_string()))
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.functions.get(name).map(String::as_str)
    }

    pub fn remove(&mut self, name: &str) -> Option<String> {
        self.functions.remove(name)
    }

    /// Saved function, falling back to the built-in of the same name.
    pub fn resolve(&self, name: &str) -> Option<&str> {
        self.get(name).or_else(|| builtin_function(name))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }
}
