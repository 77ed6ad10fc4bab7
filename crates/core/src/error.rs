//! Interpreter error taxonomy
//!
//! A single flat error enum covers every failure the interpreter can
//! surface. All errors are fatal to the current run; nothing inside the
//! pipeline catches and recovers. Lex and parse errors carry a fully
//! rendered diagnostic (context window plus caret); runtime errors carry
//! the offending detail in their message.

use thiserror::Error;

/// Alias for `std::result::Result<T, AuaError>`.
pub type Result<T> = std::result::Result<T, AuaError>;

/// Every way an Aua program can fail.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum AuaError {
    /// Unexpected character, unterminated string, malformed number.
    #[error("{0}")]
    Lex(String),

    /// Expected X got Y, unmatched delimiter, unexpected end of input.
    #[error("{0}")]
    Parse(String),

    /// Undefined type, cast to a non-klass, unsupported operand types.
    #[error("type error: {0}")]
    Type(String),

    /// Undefined variable, unknown builtin, unknown method.
    #[error("name error: {0}")]
    Name(String),

    /// Wrong number of arguments to a function or builtin.
    #[error("arity error: {0}")]
    Arity(String),

    /// Division by zero, missing record field, and similar value misuse.
    #[error("value error: {0}")]
    Value(String),

    /// File write failure, HTTP non-success, stdin closed.
    #[error("io error: {0}")]
    Io(String),

    /// Upstream model client failure or unparseable schema-constrained reply.
    #[error("model error: {0}")]
    Model(String),
}
