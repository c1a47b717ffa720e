//! Conditional expressions over conditional signals.
//!
//! Competing bursts with identical input changes are disambiguated by a
//! boolean expression over conditional signal names. The expression
//! language supports:
//!
//! - `name` - a conditional signal, read as its sampled level
//! - `0` / `1` - constant false / true
//! - `!expr` - logical NOT
//! - `expr && expr` - logical AND (higher precedence than OR)
//! - `expr || expr` - logical OR
//! - `(expr)` - grouping for precedence control
//!
//! Examples:
//! - `sel` - fires when sel is high
//! - `!sel` - fires when sel is low
//! - `mode && !halt` - compound condition
//! - `(a || b) && c` - grouping to change precedence
//!
//! Syntax errors are rejected when an expression is set on an event.
//! Whether every named signal is a declared conditional signal is checked
//! lazily by the distinguishability verification, so that removing a
//! signal never faults an unrelated edit.

use crate::error::ModelError;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// A parsed conditional expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConditionalExpr {
    /// A conditional signal, by name.
    Var(String),
    /// Constant `0` or `1`.
    Lit(bool),
    /// Logical NOT.
    Not(Box<ConditionalExpr>),
    /// Logical AND.
    And(Box<ConditionalExpr>, Box<ConditionalExpr>),
    /// Logical OR.
    Or(Box<ConditionalExpr>, Box<ConditionalExpr>),
}

impl ConditionalExpr {
    /// Parses an expression from source text.
    pub fn parse(s: &str) -> Result<Self, ModelError> {
        let s = s.trim();
        if s.is_empty() {
            return Err(ModelError::InvalidConditional {
                reason: "empty conditional expression".to_string(),
            });
        }

        let mut parser = Parser::new(s);
        let expr = parser.parse_or()?;
        parser.skip_whitespace();
        if parser.pos != parser.input.len() {
            return Err(ModelError::InvalidConditional {
                reason: format!("unexpected input at '{}'", &parser.input[parser.pos..]),
            });
        }
        Ok(expr)
    }

    /// Evaluates the expression under an assignment.
    /// Unassigned variables read as false.
    pub fn evaluate(&self, assignment: &BTreeMap<String, bool>) -> bool {
        match self {
            ConditionalExpr::Var(name) => assignment.get(name).copied().unwrap_or(false),
            ConditionalExpr::Lit(value) => *value,
            ConditionalExpr::Not(inner) => !inner.evaluate(assignment),
            ConditionalExpr::And(left, right) => {
                left.evaluate(assignment) && right.evaluate(assignment)
            }
            ConditionalExpr::Or(left, right) => {
                left.evaluate(assignment) || right.evaluate(assignment)
            }
        }
    }

    /// The set of signal names the expression references.
    pub fn variables(&self) -> BTreeSet<String> {
        let mut vars = BTreeSet::new();
        self.collect_variables(&mut vars);
        vars
    }

    fn collect_variables(&self, vars: &mut BTreeSet<String>) {
        match self {
            ConditionalExpr::Var(name) => {
                vars.insert(name.clone());
            }
            ConditionalExpr::Lit(_) => {}
            ConditionalExpr::Not(inner) => inner.collect_variables(vars),
            ConditionalExpr::And(left, right) | ConditionalExpr::Or(left, right) => {
                left.collect_variables(vars);
                right.collect_variables(vars);
            }
        }
    }

    /// Rewrites every reference to `old` into `new`.
    pub fn rename_variable(&mut self, old: &str, new: &str) {
        match self {
            ConditionalExpr::Var(name) => {
                if name == old {
                    *name = new.to_string();
                }
            }
            ConditionalExpr::Lit(_) => {}
            ConditionalExpr::Not(inner) => inner.rename_variable(old, new),
            ConditionalExpr::And(left, right) | ConditionalExpr::Or(left, right) => {
                left.rename_variable(old, new);
                right.rename_variable(old, new);
            }
        }
    }

    /// Deletes every occurrence of `name` by existential quantification:
    /// the result holds iff the original held for some value of `name`.
    /// Removing a literal from a conjunction drops just that conjunct.
    pub fn remove_variable(&self, name: &str) -> ConditionalExpr {
        if !self.variables().contains(name) {
            return self.clone();
        }
        let high = self.substitute(name, true).fold();
        let low = self.substitute(name, false).fold();
        ConditionalExpr::Or(Box::new(high), Box::new(low)).fold()
    }

    fn substitute(&self, name: &str, value: bool) -> ConditionalExpr {
        match self {
            ConditionalExpr::Var(n) if n == name => ConditionalExpr::Lit(value),
            ConditionalExpr::Var(_) | ConditionalExpr::Lit(_) => self.clone(),
            ConditionalExpr::Not(inner) => {
                ConditionalExpr::Not(Box::new(inner.substitute(name, value)))
            }
            ConditionalExpr::And(left, right) => ConditionalExpr::And(
                Box::new(left.substitute(name, value)),
                Box::new(right.substitute(name, value)),
            ),
            ConditionalExpr::Or(left, right) => ConditionalExpr::Or(
                Box::new(left.substitute(name, value)),
                Box::new(right.substitute(name, value)),
            ),
        }
    }

    /// Constant folding plus collapse of identical branches.
    fn fold(&self) -> ConditionalExpr {
        match self {
            ConditionalExpr::Var(_) | ConditionalExpr::Lit(_) => self.clone(),
            ConditionalExpr::Not(inner) => match inner.fold() {
                ConditionalExpr::Lit(value) => ConditionalExpr::Lit(!value),
                folded => ConditionalExpr::Not(Box::new(folded)),
            },
            ConditionalExpr::And(left, right) => match (left.fold(), right.fold()) {
                (ConditionalExpr::Lit(false), _) | (_, ConditionalExpr::Lit(false)) => {
                    ConditionalExpr::Lit(false)
                }
                (ConditionalExpr::Lit(true), other) | (other, ConditionalExpr::Lit(true)) => other,
                (a, b) if a == b => a,
                (a, b) => ConditionalExpr::And(Box::new(a), Box::new(b)),
            },
            ConditionalExpr::Or(left, right) => match (left.fold(), right.fold()) {
                (ConditionalExpr::Lit(true), _) | (_, ConditionalExpr::Lit(true)) => {
                    ConditionalExpr::Lit(true)
                }
                (ConditionalExpr::Lit(false), other) | (other, ConditionalExpr::Lit(false)) => {
                    other
                }
                (a, b) if a == b => a,
                (a, b) => ConditionalExpr::Or(Box::new(a), Box::new(b)),
            },
        }
    }

    fn precedence(&self) -> u8 {
        match self {
            ConditionalExpr::Or(..) => 0,
            ConditionalExpr::And(..) => 1,
            ConditionalExpr::Not(_) => 2,
            ConditionalExpr::Var(_) | ConditionalExpr::Lit(_) => 3,
        }
    }

    fn fmt_child(child: &ConditionalExpr, parent_prec: u8, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if child.precedence() < parent_prec {
            write!(f, "({})", child)
        } else {
            write!(f, "{}", child)
        }
    }
}

impl fmt::Display for ConditionalExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConditionalExpr::Var(name) => write!(f, "{}", name),
            ConditionalExpr::Lit(true) => write!(f, "1"),
            ConditionalExpr::Lit(false) => write!(f, "0"),
            ConditionalExpr::Not(inner) => {
                write!(f, "!")?;
                Self::fmt_child(inner, 2, f)
            }
            ConditionalExpr::And(left, right) => {
                Self::fmt_child(left, 1, f)?;
                write!(f, " && ")?;
                Self::fmt_child(right, 1, f)
            }
            ConditionalExpr::Or(left, right) => {
                Self::fmt_child(left, 0, f)?;
                write!(f, " || ")?;
                Self::fmt_child(right, 0, f)
            }
        }
    }
}

/// Simple recursive descent parser for conditional expressions.
struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn parse_or(&mut self) -> Result<ConditionalExpr, ModelError> {
        let mut left = self.parse_and()?;
        self.skip_whitespace();

        while self.peek_str("||") {
            self.pos += 2;
            self.skip_whitespace();
            let right = self.parse_and()?;
            left = ConditionalExpr::Or(Box::new(left), Box::new(right));
            self.skip_whitespace();
        }

        Ok(left)
    }

    fn parse_and(&mut self) -> Result<ConditionalExpr, ModelError> {
        let mut left = self.parse_unary()?;
        self.skip_whitespace();

        while self.peek_str("&&") {
            self.pos += 2;
            self.skip_whitespace();
            let right = self.parse_unary()?;
            left = ConditionalExpr::And(Box::new(left), Box::new(right));
            self.skip_whitespace();
        }

        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<ConditionalExpr, ModelError> {
        self.skip_whitespace();

        if self.peek_char() == Some('!') {
            self.pos += 1;
            self.skip_whitespace();
            let inner = self.parse_unary()?; // Recursive to allow !!a
            return Ok(ConditionalExpr::Not(Box::new(inner)));
        }

        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Result<ConditionalExpr, ModelError> {
        self.skip_whitespace();

        match self.peek_char() {
            Some('(') => {
                self.pos += 1;
                let expr = self.parse_or()?;
                self.skip_whitespace();
                if self.peek_char() != Some(')') {
                    return Err(ModelError::InvalidConditional {
                        reason: "expected ')'".to_string(),
                    });
                }
                self.pos += 1;
                Ok(expr)
            }
            Some('0') => {
                self.pos += 1;
                Ok(ConditionalExpr::Lit(false))
            }
            Some('1') => {
                self.pos += 1;
                Ok(ConditionalExpr::Lit(true))
            }
            Some(c) if c.is_alphabetic() || c == '_' => self.parse_variable(),
            Some(c) => Err(ModelError::InvalidConditional {
                reason: format!("unexpected character '{}'", c),
            }),
            None => Err(ModelError::InvalidConditional {
                reason: "unexpected end of expression".to_string(),
            }),
        }
    }

    fn parse_variable(&mut self) -> Result<ConditionalExpr, ModelError> {
        let start = self.pos;
        while let Some(c) = self.peek_char() {
            if c.is_alphanumeric() || c == '_' {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
        Ok(ConditionalExpr::Var(self.input[start..self.pos].to_string()))
    }

    fn skip_whitespace(&mut self) {
        while let Some(c) = self.peek_char() {
            if c.is_whitespace() {
                self.pos += c.len_utf8();
            } else {
                break;
            }
        }
    }

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_str(&self, s: &str) -> bool {
        self.input[self.pos..].starts_with(s)
    }
}
