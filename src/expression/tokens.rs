//! Lexical scanning of model expressions.
//!
//! Every symbol operation on a model string (free-parameter extraction, fixed
//! value substitution, renaming) goes through [`tokenize`], so a rewrite of
//! `d` can never touch the inside of `delta`.

/// Category of a lexical token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// A letter or `_` followed by letters, digits, `_` or `₀`
    Identifier,

    /// An unsigned decimal literal, optionally with an exponent
    Number,

    /// Any other single character (operators, brackets, `=`)
    Symbol,

    /// A run of whitespace
    Whitespace,
}

/// A slice of the input together with its category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    /// Byte offset of the token in the input
    pub start: usize,
}

impl Token<'_> {
    pub fn is_identifier(&self) -> bool {
        self.kind == TokenKind::Identifier
    }
}

fn is_identifier_start(c: char) -> bool {
    c.is_alphabetic() || c == '_'
}

fn is_identifier_continue(c: char) -> bool {
    c.is_alphanumeric() || c == '_' || c == '₀'
}

/// Split an expression into tokens. Concatenating the token texts gives the
/// input back unchanged.
///
/// # Examples
///
/// ```
/// use asymfit_rs::expression::{tokenize, TokenKind};
///
/// let tokens = tokenize("delta*d");
/// let idents: Vec<&str> = tokens
///     .iter()
///     .filter(|t| t.kind == TokenKind::Identifier)
///     .map(|t| t.text)
///     .collect();
/// assert_eq!(idents, vec!["delta", "d"]);
/// ```
pub fn tokenize(input: &str) -> Vec<Token<'_>> {
    let chars: Vec<(usize, char)> = input.char_indices().collect();
    let end_of = |idx: usize| chars.get(idx).map(|(pos, _)| *pos).unwrap_or(input.len());

    let mut tokens = Vec::new();
    let mut i = 0;
    while i < chars.len() {
        let (start, c) = chars[i];
        let (kind, next) = if c.is_whitespace() {
            let mut j = i + 1;
            while j < chars.len() && chars[j].1.is_whitespace() {
                j += 1;
            }
            (TokenKind::Whitespace, j)
        } else if is_identifier_start(c) {
            let mut j = i + 1;
            while j < chars.len() && is_identifier_continue(chars[j].1) {
                j += 1;
            }
            (TokenKind::Identifier, j)
        } else if c.is_ascii_digit()
            || (c == '.' && chars.get(i + 1).map_or(false, |(_, n)| n.is_ascii_digit()))
        {
            (TokenKind::Number, scan_number(&chars, i))
        } else {
            (TokenKind::Symbol, i + 1)
        };

        tokens.push(Token {
            kind,
            text: &input[start..end_of(next)],
            start,
        });
        i = next;
    }

    tokens
}

fn scan_number(chars: &[(usize, char)], start: usize) -> usize {
    let digit_at = |idx: usize| chars.get(idx).map_or(false, |(_, c)| c.is_ascii_digit());

    let mut j = start;
    while digit_at(j) {
        j += 1;
    }
    if chars.get(j).map_or(false, |(_, c)| *c == '.') {
        j += 1;
        while digit_at(j) {
            j += 1;
        }
    }

    // An exponent only belongs to the literal when digits follow it; `2e`
    // stays a number followed by the constant `e`.
    if chars.get(j).map_or(false, |(_, c)| *c == 'e' || *c == 'E') {
        let mut k = j + 1;
        if chars.get(k).map_or(false, |(_, c)| *c == '+' || *c == '-') {
            k += 1;
        }
        if digit_at(k) {
            j = k;
            while digit_at(j) {
                j += 1;
            }
        }
    }

    j
}

/// Replace every whole identifier equal to `old` with `new`.
///
/// # Examples
///
/// ```
/// use asymfit_rs::expression::rename_symbol;
///
/// assert_eq!(rename_symbol("d*delta + d", "d", "d_1"), "d_1*delta + d_1");
/// ```
pub fn rename_symbol(expression: &str, old: &str, new: &str) -> String {
    tokenize(expression)
        .into_iter()
        .map(|token| {
            if token.is_identifier() && token.text == old {
                new
            } else {
                token.text
            }
        })
        .collect()
}

/// Replace whole identifiers with parenthesized numeric literals.
///
/// Parentheses keep negative values well-formed (`x^(-1.5)` rather than
/// `x^-1.5`).
pub fn substitute_values<S: AsRef<str>>(expression: &str, values: &[(S, f64)]) -> String {
    let mut out = String::with_capacity(expression.len());
    for token in tokenize(expression) {
        let replacement = if token.is_identifier() {
            values
                .iter()
                .find(|(name, _)| name.as_ref() == token.text)
                .map(|(_, value)| format!("({})", value))
        } else {
            None
        };

        match replacement {
            Some(text) => out.push_str(&text),
            None => out.push_str(token.text),
        }
    }
    out
}

/// Canonical spelling used before compilation: `π` becomes `pi`, `^` becomes
/// `**` and the subscript `₀` becomes `0`.
pub fn normalize(expression: &str) -> String {
    let mut out = String::with_capacity(expression.len() + 4);
    for c in expression.chars() {
        match c {
            'π' => out.push_str("pi"),
            '^' => out.push_str("**"),
            '₀' => out.push('0'),
            other => out.push(other),
        }
    }
    out
}
