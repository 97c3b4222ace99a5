//! Error types for wavefield.
//!
//! None of these ever escape the per-frame update loop: a failed custom
//! equation degrades to a zero height contribution. They surface through
//! the equation compiler, settings import and the preview facade.

use thiserror::Error;

/// Lexing or parsing failure in a custom equation.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParseError {
    /// A character that is not part of the expression language.
    #[error("unexpected character '{0}' at offset {1}")]
    UnexpectedChar(char, usize),

    /// Input ended while an operand or closing token was still expected.
    #[error("unexpected end of expression")]
    UnexpectedEnd,

    /// A token that does not fit the grammar at this position.
    #[error("unexpected token: {0}")]
    UnexpectedToken(String),

    /// A numeric literal that failed to parse.
    #[error("invalid number: '{0}'")]
    InvalidNumber(String),

    /// Expression nesting went past the parser's depth limit.
    #[error("expression nested deeper than {0} levels")]
    TooDeep(usize),
}

/// Failure to turn equation text into an evaluable program.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompileError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// Text contains a denylisted word (loop keywords, eval primitives).
    #[error("forbidden construct: '{0}'")]
    Forbidden(String),

    /// An identifier that is neither a coordinate, a constant nor a bound variable.
    #[error("unknown identifier: '{0}'")]
    UnknownIdentifier(String),

    /// A call to a function outside the built-in table.
    #[error("unknown function: '{0}'")]
    UnknownFunction(String),

    #[error("function '{func}' expects {expected} args, got {got}")]
    WrongArgCount {
        func: String,
        expected: usize,
        got: usize,
    },

    /// The text was rejected earlier in this process and is not retried.
    #[error("equation previously rejected")]
    PreviouslyRejected,
}

/// Settings import/export failure.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("settings json: {0}")]
    Json(#[from] serde_json::Error),
}
