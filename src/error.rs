use thiserror::Error as ThisError;

#[derive(Debug, Clone, PartialEq, ThisError)]
pub enum Error {
    #[error("{message} at position {position}")]
    Syntax { message: String, position: usize },

    #[error("Unknown function: {0}")]
    UnknownFunction(String),

    #[error("Division by zero")]
    DivisionByZero,

    #[error("Invalid expression: {0}")]
    InvalidExpression(String),

    #[error("{name}: {message}")]
    Function { name: String, message: String },

    #[error("Invalid context: {0}")]
    InvalidContext(String),

    #[error("Batch recompute failed: {0}")]
    Batch(String),

    #[error("Expression nesting too deep")]
    NestingTooDeep,
}

/// Coarse classification used by callers that only care about the failure family.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Syntax,
    UnknownFunction,
    DivisionByZero,
    InvalidExpression,
    Function,
    InvalidContext,
    Batch,
    NestingTooDeep,
}

impl Error {
    pub fn syntax<M: Into<String>>(message: M, position: usize) -> Self {
        Self::Syntax { message: message.into(), position }
    }

    pub fn invalid<M: Into<String>>(message: M) -> Self {
        Self::InvalidExpression(message.into())
    }

    pub fn function<N: Into<String>, M: Into<String>>(name: N, message: M) -> Self {
        Self::Function { name: name.into(), message: message.into() }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Syntax { .. } => ErrorKind::Syntax,
            Error::UnknownFunction(_) => ErrorKind::UnknownFunction,
            Error::DivisionByZero => ErrorKind::DivisionByZero,
            Error::InvalidExpression(_) => ErrorKind::InvalidExpression,
            Error::Function { .. } => ErrorKind::Function,
            Error::InvalidContext(_) => ErrorKind::InvalidContext,
            Error::Batch(_) => ErrorKind::Batch,
            Error::NestingTooDeep => ErrorKind::NestingTooDeep,
        }
    }
}
