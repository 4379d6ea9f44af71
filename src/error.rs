//! Every way a translation can fail.
//!
//! Line numbers are 1-based and refer to the original source text.

use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The text could not be broken into tokens.
    Lexical,
    /// The tokens do not form a recognisable program.
    Structural,
    /// Valid input using a construct the translator does not cover yet.
    Unsupported,
    /// A pass produced output that a later pass cannot accept.
    Internal,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum TranslateError {
    #[error("line {line}: unterminated string literal")]
    UnterminatedString { line: usize },
    #[error("line {line}: unterminated date literal")]
    UnterminatedDateLiteral { line: usize },
    #[error("line {line}: script block opened with <% is never closed")]
    UnterminatedScriptBlock { line: usize },
    #[error("line {line}: line continuation character must be followed by a line return")]
    InvalidLineContinuation { line: usize },
    #[error("line {line}: numeric literal '{content}' has more than one decimal point")]
    InvalidNumericLiteral { line: usize, content: String },
    #[error("line {line}: mismatched brackets")]
    MismatchedBrackets { line: usize },
    #[error("line {line}: argument separator with no preceding content")]
    OrphanedArgumentSeparator { line: usize },
    #[error("line {line}: member accessor / decimal point was never resolved")]
    UnresolvedAmbiguousToken { line: usize },
    #[error("line {line}: invalid date literal #{literal}#")]
    InvalidDateLiteral { line: usize, literal: String },
    #[error("line {line}: syntax error: {message}")]
    Syntax { line: usize, message: String },
    #[error("line {line}: expected {expected} before end of content")]
    MissingBlockEnd { line: usize, expected: String },
    #[error("line {line}: class {class_name} already defines {member}")]
    DuplicateMember {
        line: usize,
        class_name: String,
        member: String,
    },
    #[error("line {line}: {construct} is not supported yet")]
    Unsupported { line: usize, construct: String },
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl TranslateError {
    pub fn syntax(line: usize, message: impl Into<String>) -> Self {
        Self::Syntax {
            line,
            message: message.into(),
        }
    }

    pub fn unsupported(line: usize, construct: impl Into<String>) -> Self {
        Self::Unsupported {
            line,
            construct: construct.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::UnterminatedString { .. }
            | Self::UnterminatedDateLiteral { .. }
            | Self::UnterminatedScriptBlock { .. }
            | Self::InvalidLineContinuation { .. }
            | Self::InvalidNumericLiteral { .. }
            | Self::MismatchedBrackets { .. }
            | Self::OrphanedArgumentSeparator { .. }
            | Self::InvalidDateLiteral { .. } => ErrorCategory::Lexical,
            Self::Syntax { .. } | Self::MissingBlockEnd { .. } | Self::DuplicateMember { .. } => {
                ErrorCategory::Structural
            }
            Self::Unsupported { .. } => ErrorCategory::Unsupported,
            Self::UnresolvedAmbiguousToken { .. } | Self::Internal { .. } => ErrorCategory::Internal,
        }
    }

    pub fn is_unsupported(&self) -> bool {
        self.category() == ErrorCategory::Unsupported
    }
}

pub type TranslateResult<T> = Result<T, TranslateError>;
