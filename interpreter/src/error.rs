use astrum_core::{Error as ScanError, Token};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveErrorKind {
    AlreadyDeclared,
    OwnInitializer,
    ReturnOutsideFunction,
    ReturnInConstructor,
    ThisOutsideClass,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeErrorKind {
    UndefinedVariable,
    AlreadyDeclared,
    NotCallable,
    ArityMismatch,
    OperandType,
    TypeMismatch,
    DivisionByZero,
    InvalidPropertyAccess,
    InvalidPropertyAssignment,
    InvalidIndexTarget,
    InvalidIndex,
    StackOverflow,
    Native,
}

#[derive(Debug, Error, PartialEq, Clone)]
#[allow(clippy::enum_variant_names)]
pub enum Error {
    #[error(transparent)]
    ScanError(#[from] ScanError),

    // line and col are copied from the token, thiserror can't reach into fields of fields,
    // e.g {token.line}, in error strings
    #[error("[line {line}:{col}] parser error: {msg}")]
    ParseError {
        token: Token,
        line: usize,
        col: usize,
        msg: String,
    },

    #[error("[line {line}:{col}] resolver error: {msg}")]
    ResolveError {
        token: Token,
        kind: ResolveErrorKind,
        line: usize,
        col: usize,
        msg: String,
    },

    #[error("[line {line}:{col}] runtime error: {msg}")]
    RuntimeError {
        token: Token,
        kind: RuntimeErrorKind,
        line: usize,
        col: usize,
        msg: String,
    },
}

impl Error {
    pub(crate) fn parse_error(token: &Token, msg: &str) -> Self {
        Error::ParseError {
            token: token.clone(),
            line: token.line,
            col: token.col,
            msg: String::from(msg),
        }
    }

    pub(crate) fn resolve_error(token: &Token, kind: ResolveErrorKind, msg: &str) -> Self {
        Error::ResolveError {
            token: token.clone(),
            kind,
            line: token.line,
            col: token.col,
            msg: String::from(msg),
        }
    }

    pub(crate) fn runtime_error(token: &Token, kind: RuntimeErrorKind, msg: &str) -> Self {
        Error::RuntimeError {
            token: token.clone(),
            kind,
            line: token.line,
            col: token.col,
            msg: String::from(msg),
        }
    }

    pub fn line(&self) -> usize {
        match self {
            Error::ScanError(err) => err.line(),
            Error::ParseError { line, .. }
            | Error::ResolveError { line, .. }
            | Error::RuntimeError { line, .. } => *line,
        }
    }

    pub fn col(&self) -> usize {
        match self {
            Error::ScanError(err) => err.col(),
            Error::ParseError { col, .. }
            | Error::ResolveError { col, .. }
            | Error::RuntimeError { col, .. } => *col,
        }
    }

    /// The message without the position prefix.
    pub fn message(&self) -> String {
        match self {
            Error::ScanError(err) => err.message(),
            Error::ParseError { msg, .. }
            | Error::ResolveError { msg, .. }
            | Error::RuntimeError { msg, .. } => msg.clone(),
        }
    }

    pub fn runtime_kind(&self) -> Option<RuntimeErrorKind> {
        match self {
            Error::RuntimeError { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    pub fn resolve_kind(&self) -> Option<ResolveErrorKind> {
        match self {
            Error::ResolveError { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    /// Scan, parse and resolve errors all abort before anything runs.
    pub fn is_static(&self) -> bool {
        !matches!(self, Error::RuntimeError { .. })
    }
}
