//! Recursive-descent evaluator for arithmetic expressions.
//!
//! Grammar:
//! ```text
//! sum     = product (('+' | '-') product)*
//! product = power (('*' | '/') power)*
//! power   = unary ('^' power)?
//! unary   = '-' unary | atom
//! atom    = NUMBER | '(' sum ')'
//! ```

use std::iter::Peekable;
use std::str::CharIndices;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ExprError {
    #[error("unexpected character '{ch}' at {at}")]
    UnexpectedChar { ch: char, at: usize },

    #[error("invalid number '{0}'")]
    InvalidNumber(String),

    #[error("unexpected {0}")]
    UnexpectedToken(String),

    #[error("unexpected end of expression")]
    UnexpectedEnd,

    #[error("missing closing parenthesis")]
    UnclosedParen,

    #[error("Division by zero")]
    DivisionByZero,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Tok {
    Num(f64),
    Op(char),
    Open,
    Close,
}

fn lex(input: &str) -> Result<Vec<Tok>, ExprError> {
    let mut out = Vec::new();
    let mut chars: Peekable<CharIndices<'_>> = input.char_indices().peekable();
    while let Some((at, ch)) = chars.next() {
        match ch {
            c if c.is_whitespace() => {}
            '+' | '-' | '*' | '/' | '^' => out.push(Tok::Op(ch)),
            '×' => out.push(Tok::Op('*')),
            '÷' => out.push(Tok::Op('/')),
            '(' => out.push(Tok::Open),
            ')' => out.push(Tok::Close),
            c if c.is_ascii_digit() || c == '.' => {
                let mut literal = String::from(c);
                while let Some(&(_, next)) = chars.peek() {
                    if next.is_ascii_digit() || next == '.' {
                        literal.push(next);
                        chars.next();
                    } else {
                        break;
                    }
                }
                let n = literal
                    .parse::<f64>()
                    .map_err(|_| ExprError::InvalidNumber(literal.clone()))?;
                out.push(Tok::Num(n));
            }
            _ => return Err(ExprError::UnexpectedChar { ch, at }),
        }
    }
    Ok(out)
}

struct Cursor {
    toks: Vec<Tok>,
    at: usize,
}

impl Cursor {
    fn peek(&self) -> Option<Tok> {
        self.toks.get(self.at).copied()
    }

    fn bump(&mut self) -> Option<Tok> {
        let t = self.peek();
        self.at += usize::from(t.is_some());
        t
    }

    fn eat_op(&mut self, ops: &[char]) -> Option<char> {
        match self.peek() {
            Some(Tok::Op(op)) if ops.contains(&op) => {
                self.at += 1;
                Some(op)
            }
            _ => None,
        }
    }

    fn sum(&mut self) -> Result<f64, ExprError> {
        let mut acc = self.product()?;
        while let Some(op) = self.eat_op(&['+', '-']) {
            let rhs = self.product()?;
            acc = if op == '+' { acc + rhs } else { acc - rhs };
        }
        Ok(acc)
    }

    fn product(&mut self) -> Result<f64, ExprError> {
        let mut acc = self.power()?;
        while let Some(op) = self.eat_op(&['*', '/']) {
            let rhs = self.power()?;
            if op == '*' {
                acc *= rhs;
            } else if rhs == 0.0 {
                return Err(ExprError::DivisionByZero);
            } else {
                acc /= rhs;
            }
        }
        Ok(acc)
    }

    // Right-associative: 2^3^2 = 2^9.
    fn power(&mut self) -> Result<f64, ExprError> {
        let base = self.unary()?;
        if self.eat_op(&['^']).is_some() {
            return Ok(base.powf(self.power()?));
        }
        Ok(base)
    }

    fn unary(&mut self) -> Result<f64, ExprError> {
        if self.eat_op(&['-']).is_some() {
            return Ok(-self.unary()?);
        }
        self.atom()
    }

    fn atom(&mut self) -> Result<f64, ExprError> {
        match self.bump() {
            Some(Tok::Num(n)) => Ok(n),
            Some(Tok::Open) => {
                let inner = self.sum()?;
                match self.bump() {
                    Some(Tok::Close) => Ok(inner),
                    _ => Err(ExprError::UnclosedParen),
                }
            }
            Some(tok) => Err(ExprError::UnexpectedToken(format!("{tok:?}"))),
            None => Err(ExprError::UnexpectedEnd),
        }
    }
}

/// Evaluate an arithmetic expression.
pub fn evaluate(expr: &str) -> Result<f64, ExprError> {
    let mut cursor = Cursor { toks: lex(expr)?, at: 0 };
    let value = cursor.sum()?;
    match cursor.peek() {
        None => Ok(value),
        Some(tok) => Err(ExprError::UnexpectedToken(format!("{tok:?}"))),
    }
}
