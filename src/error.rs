use crate::conditional::Branch;
use thiserror::Error;

/// Error type for the ruleexpr crate
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Error while splitting an expression into tokens
    #[error("LexError: {message} (at offset {offset})")]
    Lex {
        /// What the lexer expected or found
        message: String,
        /// Byte offset in the source text
        offset: usize,
    },
    /// Error while parsing the infix syntax of an expression
    #[error("ParseError: {message} (at offset {offset})")]
    Parse {
        /// The unmet expectation
        message: String,
        /// Byte offset in the source text
        offset: usize,
    },
    /// The expression nests deeper than the configured limit
    #[error("ParseError: expression nests deeper than {limit} levels")]
    TooDeep {
        /// The configured recursion limit
        limit: usize,
    },
    /// Unknown function name or malformed literal in call notation
    #[error("ResolutionError: {0}")]
    Resolution(String),
    /// Compilation of one branch of a conditional failed
    #[error("{branch} `{expression}`: {source}")]
    Branch {
        /// Which branch failed
        branch: Branch,
        /// The source text of that branch
        expression: String,
        /// The underlying compile error
        source: Box<Error>,
    },
    /// Invalid rule or registry configuration
    #[error("ConfigError: {0}")]
    Config(String),
    /// Evaluation could not produce a value
    #[error("EvalError: {0}")]
    Eval(String),
}

impl Error {
    pub(crate) fn lex(message: impl Into<String>, offset: usize) -> Self {
        Self::Lex {
            message: message.into(),
            offset,
        }
    }

    pub(crate) fn parse(message: impl Into<String>, offset: usize) -> Self {
        Self::Parse {
            message: message.into(),
            offset,
        }
    }

    /// Strip any `Branch` wrappers and get the error that caused them.
    #[must_use]
    pub fn root_cause(&self) -> &Self {
        match self {
            Self::Branch { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
