//! Recursive-descent grammar for model expressions.
//!
//! ```text
//! expr    := term (('+' | '-') term)*
//! term    := unary (('*' | '/') unary)*
//! unary   := ('-' | '+') unary | power
//! power   := postfix ('**' unary)?
//! postfix := primary '!'*
//! primary := number | name '(' expr ')' | name
//!          | '(' expr ')' | '[' expr ']' | '{' expr '}'
//! ```
//!
//! The input is expected in normalized form (see
//! [`normalize`](super::tokens::normalize)), so `^` has already become `**`.
//! Names are kept as written; [`compile`](super::compile) resolves them.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::{char, digit0, digit1, multispace0, one_of, satisfy},
    combinator::{opt, recognize},
    error::{Error, ErrorKind},
    sequence::pair,
    IResult, Parser,
};

use super::ExpressionError;

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

/// Syntax tree with unresolved names
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Number(f64),
    Name(String),
    Call(String, Box<Node>),
    Neg(Box<Node>),
    Factorial(Box<Node>),
    Binary(BinaryOp, Box<Node>, Box<Node>),
}

type PResult<'a, T> = IResult<&'a str, T>;

/// Parse a complete expression; trailing input is an error.
pub fn parse_expression(input: &str) -> Result<Node, ExpressionError> {
    match expr(input) {
        Ok((rest, node)) => {
            let (rest, _) = ws(rest).map_err(|_| parse_error(rest))?;
            if rest.is_empty() {
                Ok(node)
            } else {
                Err(ExpressionError::ParseError {
                    message: format!("unexpected input at '{}'", rest),
                })
            }
        }
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(parse_error(e.input)),
        Err(nom::Err::Incomplete(_)) => Err(ExpressionError::ParseError {
            message: "incomplete expression".to_string(),
        }),
    }
}

fn parse_error(at: &str) -> ExpressionError {
    let message = if at.is_empty() {
        "unexpected end of expression".to_string()
    } else {
        format!("unexpected input at '{}'", at)
    };
    ExpressionError::ParseError { message }
}

fn ws(input: &str) -> PResult<'_, &str> {
    multispace0(input)
}

fn symbol(input: &str, c: char) -> PResult<'_, char> {
    let (input, _) = ws(input)?;
    char(c).parse(input)
}

fn operator<'a>(input: &'a str, op: &'static str) -> PResult<'a, &'a str> {
    let (input, _) = ws(input)?;
    tag(op).parse(input)
}

/// Parse an additive expression, folding to the left
fn expr(input: &str) -> PResult<'_, Node> {
    let (mut input, mut left) = term(input)?;
    loop {
        let op = if let Ok((rest, _)) = symbol(input, '+') {
            Some((rest, BinaryOp::Add))
        } else if let Ok((rest, _)) = symbol(input, '-') {
            Some((rest, BinaryOp::Sub))
        } else {
            None
        };

        match op {
            Some((rest, op)) => {
                let (rest, right) = term(rest)?;
                left = Node::Binary(op, Box::new(left), Box::new(right));
                input = rest;
            }
            None => return Ok((input, left)),
        }
    }
}

/// Parse a multiplicative expression, folding to the left
fn term(input: &str) -> PResult<'_, Node> {
    let (mut input, mut left) = unary(input)?;
    loop {
        let op = if operator(input, "**").is_ok() {
            None
        } else if let Ok((rest, _)) = symbol(input, '*') {
            Some((rest, BinaryOp::Mul))
        } else if let Ok((rest, _)) = symbol(input, '/') {
            Some((rest, BinaryOp::Div))
        } else {
            None
        };

        match op {
            Some((rest, op)) => {
                let (rest, right) = unary(rest)?;
                left = Node::Binary(op, Box::new(left), Box::new(right));
                input = rest;
            }
            None => return Ok((input, left)),
        }
    }
}

/// Parse a signed expression (-x, +x)
fn unary(input: &str) -> PResult<'_, Node> {
    if let Ok((rest, _)) = symbol(input, '-') {
        let (rest, inner) = unary(rest)?;
        return Ok((rest, Node::Neg(Box::new(inner))));
    }
    if let Ok((rest, _)) = symbol(input, '+') {
        return unary(rest);
    }
    power(input)
}

/// Parse an exponentiation, binding to the right
fn power(input: &str) -> PResult<'_, Node> {
    let (input, base) = postfix(input)?;
    match operator(input, "**") {
        Ok((rest, _)) => {
            let (rest, exponent) = unary(rest)?;
            Ok((
                rest,
                Node::Binary(BinaryOp::Pow, Box::new(base), Box::new(exponent)),
            ))
        }
        Err(_) => Ok((input, base)),
    }
}

/// Parse trailing factorials
fn postfix(input: &str) -> PResult<'_, Node> {
    let (mut input, mut node) = primary(input)?;
    while let Ok((rest, _)) = symbol(input, '!') {
        node = Node::Factorial(Box::new(node));
        input = rest;
    }
    Ok((input, node))
}

fn primary(input: &str) -> PResult<'_, Node> {
    let (input, _) = ws(input)?;

    let starts_number = input
        .chars()
        .next()
        .map_or(false, |c| c.is_ascii_digit() || c == '.');
    if starts_number {
        return number(input);
    }

    if let Ok((rest, name)) = identifier(input) {
        return match symbol(rest, '(') {
            Ok((after_open, _)) => {
                let (after_arg, argument) = expr(after_open)?;
                let (after_close, _) = symbol(after_arg, ')')?;
                Ok((after_close, Node::Call(name.to_string(), Box::new(argument))))
            }
            Err(_) => Ok((rest, Node::Name(name.to_string()))),
        };
    }

    group(input, '(', ')')
        .or_else(|_| group(input, '[', ']'))
        .or_else(|_| group(input, '{', '}'))
}

fn group(input: &str, open: char, close: char) -> PResult<'_, Node> {
    let (input, _) = symbol(input, open)?;
    let (input, inner) = expr(input)?;
    let (input, _) = symbol(input, close)?;
    Ok((input, inner))
}

fn number_literal(input: &str) -> PResult<'_, &str> {
    recognize(pair(
        alt((
            recognize(pair(digit1, opt(pair(char('.'), digit0)))),
            recognize(pair(char('.'), digit1)),
        )),
        opt((one_of("eE"), opt(one_of("+-")), digit1)),
    ))
    .parse(input)
}

fn number(input: &str) -> PResult<'_, Node> {
    let (rest, text) = number_literal(input)?;
    match text.parse::<f64>() {
        Ok(value) => Ok((rest, Node::Number(value))),
        Err(_) => Err(nom::Err::Error(Error::new(input, ErrorKind::Float))),
    }
}

fn identifier(input: &str) -> PResult<'_, &str> {
    recognize(pair(
        satisfy(|c| c.is_alphabetic() || c == '_'),
        take_while(|c: char| c.is_alphanumeric() || c == '_'),
    ))
    .parse(input)
}
