//! Model strings of the form `name(var) = expression`.

use std::str::FromStr;

use super::compile::compile_model;
use super::parser::parse_free_parameters_with;
use super::tokens::{tokenize, TokenKind};
use super::ExpressionError;

/// A model string split into its parts. Splitting is purely syntactic; use
/// [`is_valid_expression`] to also check that the right-hand side compiles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelString {
    /// Function name on the left-hand side (may be empty)
    pub name: String,
    /// Declared independent variable
    pub independent: String,
    /// Right-hand side
    pub expression: String,
}

impl ModelString {
    pub fn parse(model: &str) -> Result<Self, ExpressionError> {
        let invalid = |message: &str| ExpressionError::InvalidModel {
            message: message.to_string(),
        };

        let (lhs, rhs) = model
            .split_once('=')
            .ok_or_else(|| invalid("missing '='"))?;

        let lhs = lhs.trim();
        let open = lhs.find('(').ok_or_else(|| invalid("missing '(' on the left-hand side"))?;
        let inner = lhs[open + 1..]
            .strip_suffix(')')
            .ok_or_else(|| invalid("left-hand side must end with ')'"))?;

        let independent = inner.trim();
        if independent.is_empty() {
            return Err(invalid("empty independent variable"));
        }
        let tokens = tokenize(independent);
        if tokens.len() != 1 || tokens[0].kind != TokenKind::Identifier {
            return Err(invalid("independent variable must be a single identifier"));
        }

        let expression = rhs.trim();
        if expression.is_empty() {
            return Err(invalid("empty right-hand side"));
        }

        Ok(Self {
            name: lhs[..open].trim().to_string(),
            independent: independent.to_string(),
            expression: expression.to_string(),
        })
    }
}

impl FromStr for ModelString {
    type Err = ExpressionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Split a valid model string into `(independent variable, expression)`.
///
/// Returns `None` for anything [`is_valid_expression`] rejects.
pub fn split_expression(model: &str) -> Option<(String, String)> {
    let parsed = ModelString::parse(model).ok()?;
    let params: Vec<String> = parse_free_parameters_with(&parsed.expression, &parsed.independent)
        .into_iter()
        .collect();
    compile_model(&parsed.expression, &params, &parsed.independent).ok()?;
    Some((parsed.independent, parsed.expression))
}

/// Whether `model` is a well-formed `name(var)=expression` whose right-hand
/// side compiles.
///
/// # Examples
///
/// ```
/// use asymfit_rs::expression::is_valid_expression;
///
/// assert!(is_valid_expression("A(t)=a*t+b"));
/// assert!(!is_valid_expression("a*t+b"));
/// assert!(!is_valid_expression("A()=a*t"));
/// ```
pub fn is_valid_expression(model: &str) -> bool {
    split_expression(model).is_some()
}
