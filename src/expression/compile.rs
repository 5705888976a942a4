//! Compilation of model expressions into numeric evaluators.
//!
//! A [`CompiledModel`] is a resolved syntax tree: the independent variable,
//! each parameter (by position) and the constants `pi` and `e` are bound at
//! compile time, so evaluation is a plain tree walk.

use ndarray::Array1;
use std::f64::consts::{E, PI};

use super::grammar::{parse_expression, BinaryOp, Node};
use super::tokens::normalize;
use super::ExpressionError;

/// Elementary functions available to models
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Function {
    Sin,
    Cos,
    Tan,
    Exp,
    Sinh,
    Cosh,
    Tanh,
}

impl Function {
    fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "sin" => Some(Function::Sin),
            "cos" => Some(Function::Cos),
            "tan" => Some(Function::Tan),
            "exp" => Some(Function::Exp),
            "sinh" => Some(Function::Sinh),
            "cosh" => Some(Function::Cosh),
            "tanh" => Some(Function::Tanh),
            _ => None,
        }
    }

    fn apply(self, x: f64) -> f64 {
        match self {
            Function::Sin => x.sin(),
            Function::Cos => x.cos(),
            Function::Tan => x.tan(),
            Function::Exp => x.exp(),
            Function::Sinh => x.sinh(),
            Function::Cosh => x.cosh(),
            Function::Tanh => x.tanh(),
        }
    }
}

/// Resolved expression tree
#[derive(Debug, Clone, PartialEq)]
enum Expr {
    Constant(f64),
    Independent,
    Parameter(usize),
    Neg(Box<Expr>),
    Factorial(Box<Expr>),
    Call(Function, Box<Expr>),
    Binary(BinaryOp, Box<Expr>, Box<Expr>),
}

impl Expr {
    fn eval(&self, t: f64, params: &[f64]) -> f64 {
        match self {
            Expr::Constant(value) => *value,
            Expr::Independent => t,
            Expr::Parameter(index) => params.get(*index).copied().unwrap_or(f64::NAN),
            Expr::Neg(inner) => -inner.eval(t, params),
            Expr::Factorial(inner) => factorial(inner.eval(t, params)),
            Expr::Call(function, arg) => function.apply(arg.eval(t, params)),
            Expr::Binary(op, lhs, rhs) => {
                let a = lhs.eval(t, params);
                let b = rhs.eval(t, params);
                match op {
                    BinaryOp::Add => a + b,
                    BinaryOp::Sub => a - b,
                    BinaryOp::Mul => a * b,
                    BinaryOp::Div => a / b,
                    BinaryOp::Pow => pow(a, b),
                }
            }
        }
    }
}

fn pow(base: f64, exponent: f64) -> f64 {
    if exponent.fract() == 0.0 && exponent.abs() <= i32::MAX as f64 {
        base.powi(exponent as i32)
    } else {
        base.powf(exponent)
    }
}

/// Factorial of a non-negative integer value; NaN for anything else.
fn factorial(x: f64) -> f64 {
    if x.is_nan() || x < 0.0 || x.fract() != 0.0 {
        return f64::NAN;
    }
    if x > 170.0 {
        return f64::INFINITY;
    }
    (1..=x as u32).fold(1.0, |acc, k| acc * k as f64)
}

/// A model expression compiled against an ordered parameter list.
#[derive(Debug, Clone)]
pub struct CompiledModel {
    expression: String,
    independent: String,
    parameters: Vec<String>,
    root: Expr,
}

impl CompiledModel {
    /// Compile `expression` as a function of `independent` and `parameters`.
    ///
    /// The expression and the names are normalized first (`π`, `^`, `₀`). The
    /// independent variable is dropped from `parameters` if present, as are
    /// repeated names.
    pub fn compile<S: AsRef<str>>(
        expression: &str,
        parameters: &[S],
        independent: &str,
    ) -> Result<Self, ExpressionError> {
        let normalized = normalize(expression);
        let independent = normalize(independent);

        let mut names: Vec<String> = Vec::with_capacity(parameters.len());
        for name in parameters {
            let name = normalize(name.as_ref());
            if name != independent && !names.contains(&name) {
                names.push(name);
            }
        }

        let tree = parse_expression(&normalized)?;
        let root = resolve(&tree, &independent, &names)?;

        Ok(Self {
            expression: normalized,
            independent,
            parameters: names,
            root,
        })
    }

    /// Normalized source text
    pub fn expression(&self) -> &str {
        &self.expression
    }

    pub fn independent_variable(&self) -> &str {
        &self.independent
    }

    /// Parameter names in the order `eval` expects their values
    pub fn parameters(&self) -> &[String] {
        &self.parameters
    }

    pub fn parameter_count(&self) -> usize {
        self.parameters.len()
    }

    /// Evaluate at a single point. Parameters missing from a short `params`
    /// evaluate as NaN; [`eval`](Self::eval) rejects a wrong count instead.
    pub fn eval_point(&self, t: f64, params: &[f64]) -> f64 {
        self.root.eval(t, params)
    }

    /// Evaluate over every sample of `time`.
    pub fn eval(&self, time: &Array1<f64>, params: &[f64]) -> Result<Array1<f64>, ExpressionError> {
        self.check_parameter_count(params.len())?;
        Ok(time.mapv(|t| self.root.eval(t, params)))
    }

    fn check_parameter_count(&self, found: usize) -> Result<(), ExpressionError> {
        if found != self.parameters.len() {
            return Err(ExpressionError::ParameterCount {
                expected: self.parameters.len(),
                found,
            });
        }
        Ok(())
    }
}

/// Compile a model expression. See [`CompiledModel::compile`].
pub fn compile_model<S: AsRef<str>>(
    expression: &str,
    parameters: &[S],
    independent: &str,
) -> Result<CompiledModel, ExpressionError> {
    CompiledModel::compile(expression, parameters, independent)
}

fn resolve(node: &Node, independent: &str, parameters: &[String]) -> Result<Expr, ExpressionError> {
    let resolved = match node {
        Node::Number(value) => Expr::Constant(*value),
        Node::Name(name) => resolve_name(name, independent, parameters)?,
        Node::Neg(inner) => Expr::Neg(Box::new(resolve(inner, independent, parameters)?)),
        Node::Factorial(inner) => {
            Expr::Factorial(Box::new(resolve(inner, independent, parameters)?))
        }
        Node::Call(name, arg) => {
            let function =
                Function::from_name(name).ok_or_else(|| ExpressionError::UndefinedFunction {
                    name: name.clone(),
                })?;
            Expr::Call(function, Box::new(resolve(arg, independent, parameters)?))
        }
        Node::Binary(op, lhs, rhs) => Expr::Binary(
            *op,
            Box::new(resolve(lhs, independent, parameters)?),
            Box::new(resolve(rhs, independent, parameters)?),
        ),
    };
    Ok(resolved)
}

fn resolve_name(name: &str, independent: &str, parameters: &[String]) -> Result<Expr, ExpressionError> {
    if name == independent {
        return Ok(Expr::Independent);
    }
    if let Some(index) = parameters.iter().position(|p| p == name) {
        return Ok(Expr::Parameter(index));
    }

    match name.to_ascii_lowercase().as_str() {
        "pi" => Ok(Expr::Constant(PI)),
        "e" => Ok(Expr::Constant(E)),
        "i" => Err(ExpressionError::Unsupported {
            message: "complex values (imaginary unit 'i') cannot be fitted".to_string(),
        }),
        _ if Function::from_name(name).is_some() => Err(ExpressionError::ParseError {
            message: format!("function '{}' must be called with an argument", name),
        }),
        _ => Err(ExpressionError::UnknownSymbol {
            name: name.to_string(),
        }),
    }
}
