pub mod constants;
pub mod pool;

use serde::{Deserialize, Serialize};

/// Crate-wide result type, returning [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// A database error. Every failure surfaced by the engine is one of these
/// kinds; messages carry the offending table/column/value where applicable.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Error {
    /// A database, table, or column does not exist.
    NotFound(String),
    /// A database, table, or column already exists.
    Duplicate(String),
    /// A NOT NULL, UNIQUE, PRIMARY KEY, or FOREIGN KEY check failed.
    ConstraintViolation {
        constraint: Constraint,
        table: String,
        column: String,
        value: String,
    },
    /// A bad column definition or table schema.
    Schema(String),
    /// A page read, write, or sync failed.
    IO(String),
    /// Tuple deserialization failed.
    Codec(String),
    /// The planner was handed an unsupported operator or condition.
    Planner(String),
    /// A procedure exceeded its deadline or fuel budget.
    Timeout(String),
    /// The session is not permitted to perform the operation.
    Unauthorized(String),
    /// Malformed statement or argument.
    InvalidInput(String),
}

/// The constraint kind behind a [`Error::ConstraintViolation`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Constraint {
    NotNull,
    Unique,
    PrimaryKey,
    ForeignKey,
}

impl std::fmt::Display for Constraint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotNull => f.write_str("NOT NULL"),
            Self::Unique => f.write_str("UNIQUE"),
            Self::PrimaryKey => f.write_str("PRIMARY KEY"),
            Self::ForeignKey => f.write_str("FOREIGN KEY"),
        }
    }
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound(msg) => write!(f, "not found: {msg}"),
            Self::Duplicate(msg) => write!(f, "duplicate: {msg}"),
            Self::ConstraintViolation {
                constraint,
                table,
                column,
                value,
            } => write!(
                f,
                "{constraint} constraint violated on {table}.{column}: value {value}"
            ),
            Self::Schema(msg) => write!(f, "schema error: {msg}"),
            Self::IO(msg) => write!(f, "io error: {msg}"),
            Self::Codec(msg) => write!(f, "codec error: {msg}"),
            Self::Planner(msg) => write!(f, "planner error: {msg}"),
            Self::Timeout(msg) => write!(f, "timeout: {msg}"),
            Self::Unauthorized(msg) => write!(f, "unauthorized: {msg}"),
            Self::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

impl Error {
    /// Builds a constraint-violation error naming the offending column and
    /// value. `value` is formatted for user display.
    pub fn constraint(
        constraint: Constraint,
        table: &str,
        column: &str,
        value: impl std::fmt::Display,
    ) -> Error {
        Error::ConstraintViolation {
            constraint,
            table: table.to_string(),
            column: column.to_string(),
            value: value.to_string(),
        }
    }

    /// True if the statement failed validation before any page was touched.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            Self::ConstraintViolation { .. } | Self::Schema(_) | Self::InvalidInput(_)
        )
    }
}

/// Constructs a Result::Err for the given Error, so `?` and return sites can
/// use `errinput!(...)` directly.
impl<T> From<Error> for Result<T> {
    fn from(error: Error) -> Self {
        Err(error)
    }
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::IO(err.to_string())
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Error::Codec(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Codec(err.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for Error {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Error::IO(format!("lock poisoned: {err}"))
    }
}

/// Constructs an `Error::InvalidInput` via `format!` and `into()`, usable
/// both as an `Error` and as a `Result::Err` return value.
#[macro_export]
macro_rules! errinput {
    ($($args:tt)*) => {
        $crate::common::Error::InvalidInput(format!($($args)*)).into()
    };
}
