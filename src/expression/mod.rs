//! # Model Expressions
//!
//! Run-time handling of user-entered fit models such as
//! `A(t) = A0*exp(-λ*t)`:
//!
//! - [`tokens`]: boundary-aware tokenizer used for every textual rewrite
//! - [`parser`]: free-parameter extraction
//! - [`model_string`]: `name(var)=expr` splitting and validation
//! - [`grammar`] and [`compile`]: the `nom` grammar and the numeric evaluator
//!   built from it
//!
//! ## Example Usage
//!
//! ```rust
//! use asymfit_rs::expression::{compile_model, parse_free_parameters};
//! use ndarray::array;
//!
//! let params: Vec<String> = parse_free_parameters("A0*exp(-lambda*t)").into_iter().collect();
//! assert_eq!(params, vec!["A0".to_string(), "lambda".to_string()]);
//!
//! let model = compile_model("A0*exp(-lambda*t)", &params, "t").unwrap();
//! let values = model.eval(&array![0.0, 1.0], &[0.2, 0.1]).unwrap();
//! assert!((values[0] - 0.2).abs() < 1e-12);
//! ```

pub mod compile;
pub mod grammar;
pub mod model_string;
pub mod parser;
pub mod tokens;

use thiserror::Error;

pub use compile::{compile_model, CompiledModel};
pub use model_string::{is_valid_expression, split_expression, ModelString};
pub use parser::{parse_free_parameters, parse_free_parameters_with};
pub use tokens::{normalize, rename_symbol, substitute_values, tokenize, Token, TokenKind};

/// Independent variable assumed for bare expressions.
pub const DEFAULT_INDEPENDENT_VARIABLE: &str = "t";

/// Functions the grammar understands (matched case-insensitively).
pub const FUNCTIONS: [&str; 7] = ["sin", "cos", "tan", "exp", "sinh", "cosh", "tanh"];

/// Nullary constants (matched case-insensitively), besides the `π` glyph.
pub const CONSTANTS: [&str; 3] = ["e", "i", "pi"];

/// Error that can occur while parsing or compiling a model expression
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExpressionError {
    #[error("Failed to parse expression: {message}")]
    ParseError { message: String },

    #[error("Unknown symbol: {name}")]
    UnknownSymbol { name: String },

    #[error("Undefined function: {name}")]
    UndefinedFunction { name: String },

    #[error("Unsupported construct: {message}")]
    Unsupported { message: String },

    #[error("Invalid model string: {message}")]
    InvalidModel { message: String },

    #[error("Expected {expected} parameter values, got {found}")]
    ParameterCount { expected: usize, found: usize },
}

/// Whether `name` is one of the recognized function tokens.
pub fn is_function(name: &str) -> bool {
    FUNCTIONS.iter().any(|f| f.eq_ignore_ascii_case(name))
}

/// Whether `name` is one of the recognized constant tokens.
pub fn is_constant(name: &str) -> bool {
    name == "π" || CONSTANTS.iter().any(|c| c.eq_ignore_ascii_case(name))
}
