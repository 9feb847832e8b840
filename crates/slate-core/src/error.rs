//! The runtime error taxonomy (spec.md §7).
//!
//! Every variant is fatal: the VM has no in-language exception mechanism,
//! so a `RuntimeError` always aborts the current execution (§6.4, §7).

use thiserror::Error;

/// Coarse error classification, carried alongside the message so a host
/// can branch on error *kind* without string-matching (spec.md §6.4/§7).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Type,
    Arity,
    Range,
    Value,
    Arithmetic,
    Overflow,
    Resource,
    StackOverflow,
    Internal,
}

/// A fatal runtime error: kind, human message, and the source line from
/// the bytecode chunk's line table (spec.md §6.4).
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{kind:?} error: {message}")]
pub struct RuntimeError {
    pub kind: ErrorKind,
    pub message: String,
    pub line: Option<u32>,
}

impl RuntimeError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        RuntimeError { kind, message: message.into(), line: None }
    }

    pub fn at_line(mut self, line: u32) -> Self {
        self.line = Some(line);
        self
    }

    pub fn type_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Type, message)
    }

    pub fn arity_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Arity, message)
    }

    pub fn range_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Range, message)
    }

    pub fn value_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Value, message)
    }

    pub fn arithmetic_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Arithmetic, message)
    }

    pub fn overflow_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Overflow, message)
    }

    pub fn resource_error(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Resource, message)
    }

    pub fn stack_overflow() -> Self {
        Self::new(ErrorKind::StackOverflow, "call stack overflow")
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Internal, message)
    }
}

pub type RuntimeResult<T> = Result<T, RuntimeError>;
