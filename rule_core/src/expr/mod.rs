//! Expression language for amounts and custom conditions
//!
//! Formulas combine numbers, `{id.layers}` / `{id.potency}` stack
//! references, `{pooled.extra}` style pool counts, `NdM` dice and the
//! functions `floor ceil round max min abs` with `+ - * / %`. Text is
//! tokenized and parsed into an [`Expr`] tree; nothing outside that grammar
//! is ever executed.

mod eval;
mod lexer;
mod parser;

pub use eval::{ActorResolver, Resolver};
pub use parser::{BinOp, Expr, Func, PoolField, StackProp, VarRef};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Longest formula accepted
pub const MAX_EXPRESSION_LEN: usize = 512;

/// Error parsing or evaluating an expression
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExprError {
    #[error("expression is empty")]
    Empty,
    #[error("expression is longer than {0} characters")]
    TooLong(usize),
    #[error("unexpected character '{0}' at {1}")]
    UnexpectedChar(char, usize),
    #[error("unbalanced brace at {0}")]
    UnbalancedBrace(usize),
    #[error("empty reference at {0}")]
    EmptyReference(usize),
    #[error("malformed number '{0}'")]
    BadNumber(String),
    #[error("malformed dice '{0}'")]
    BadDice(String),
    #[error("unknown property '{0}'")]
    UnknownProperty(String),
    #[error("unknown function '{0}'")]
    UnknownFunction(String),
    #[error("'{0}' is not a function call or reference")]
    BareIdentifier(String),
    #[error("function '{0}' does not take {1} arguments")]
    Arity(String, usize),
    #[error("unexpected token {0}")]
    Unexpected(String),
    #[error("unexpected end of expression")]
    UnexpectedEnd,
    #[error("unexpected trailing token {0}")]
    Trailing(String),
    #[error("result is not a finite number")]
    NonFinite,
}

/// Result of [`validate`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Validation {
    pub valid: bool,
    pub error: Option<String>,
}

impl Expr {
    /// Parse formula text into a tree
    pub fn parse(source: &str) -> Result<Expr, ExprError> {
        if source.chars().count() > MAX_EXPRESSION_LEN {
            return Err(ExprError::TooLong(MAX_EXPRESSION_LEN));
        }
        let tokens = lexer::tokenize(source)?;
        parser::Parser::new(tokens).parse()
    }
}

/// Check that a formula parses, without evaluating it
pub fn validate(source: &str) -> Validation {
    match Expr::parse(source) {
        Ok(_) => Validation {
            valid: true,
            error: None,
        },
        Err(e) => Validation {
            valid: false,
            error: Some(e.to_string()),
        },
    }
}

/// Parse and evaluate, reporting failures
pub fn try_evaluate(source: &str, resolver: &mut dyn Resolver) -> Result<f64, ExprError> {
    Expr::parse(source)?.eval(resolver)
}

/// Parse and evaluate; any failure logs a diagnostic and yields 0
pub fn evaluate(source: &str, resolver: &mut dyn Resolver) -> f64 {
    match try_evaluate(source, resolver) {
        Ok(value) => value,
        Err(error) => {
            tracing::warn!(expression = source, %error, "expression evaluation failed, using 0");
            0.0
        }
    }
}
