use std::fmt;

use thiserror::Error;

/// Error reported by the native client: the engine's numeric code and its
/// (usually multi-line) message text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NativeError {
    pub code: Option<i32>,
    pub message: String,
}

impl NativeError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            message: message.into(),
        }
    }

    /// An error raised by the driver itself, with no engine code attached.
    pub fn driver(message: impl Into<String>) -> Self {
        Self {
            code: None,
            message: message.into(),
        }
    }
}

impl fmt::Display for NativeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "[{}] {}", code, self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Last error recorded on a connection or statement.
/// A missing code means no error is pending.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ErrorInfo {
    pub code: Option<i32>,
    pub message: Option<String>,
}

impl ErrorInfo {
    pub fn none() -> Self {
        Self::default()
    }

    pub fn is_pending(&self) -> bool {
        self.code.is_some()
    }
}

/// The kinds an error can be classified as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    Usage,
    Config,
    Connection,
    Transaction,
    SyntaxError,
    TableNotFound,
    InvalidFieldName,
    NonUniqueFieldName,
    UniqueConstraintViolation,
    ForeignKeyConstraintViolation,
    TableExists,
    Driver,
}

/// Error type for ibrs operations
#[derive(Debug, Error)]
pub enum IbrsError {
    #[error("Usage error: {0}")]
    Usage(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Connection error: {0}")]
    Connection(NativeError),

    #[error("Transaction error: {0}")]
    Transaction(NativeError),

    #[error("Syntax error: {0}")]
    SyntaxError(NativeError),

    #[error("Table not found: {0}")]
    TableNotFound(NativeError),

    #[error("Invalid field name: {0}")]
    InvalidFieldName(NativeError),

    #[error("Non-unique field name: {0}")]
    NonUniqueFieldName(NativeError),

    #[error("Unique constraint violation: {0}")]
    UniqueConstraintViolation(NativeError),

    #[error("Foreign key constraint violation: {0}")]
    ForeignKeyConstraintViolation(NativeError),

    #[error("Table already exists: {0}")]
    TableExists(NativeError),

    #[error("Driver error: {0}")]
    Driver(NativeError),
}

impl IbrsError {
    /// Builds the error of the given kind around a native error.
    /// Usage and configuration kinds keep only the message.
    pub fn from_kind(kind: ErrorKind, native: NativeError) -> Self {
        match kind {
            ErrorKind::Usage => IbrsError::Usage(native.message),
            ErrorKind::Config => IbrsError::Config(native.message),
            ErrorKind::Connection => IbrsError::Connection(native),
            ErrorKind::Transaction => IbrsError::Transaction(native),
            ErrorKind::SyntaxError => IbrsError::SyntaxError(native),
            ErrorKind::TableNotFound => IbrsError::TableNotFound(native),
            ErrorKind::InvalidFieldName => IbrsError::InvalidFieldName(native),
            ErrorKind::NonUniqueFieldName => IbrsError::NonUniqueFieldName(native),
            ErrorKind::UniqueConstraintViolation => IbrsError::UniqueConstraintViolation(native),
            ErrorKind::ForeignKeyConstraintViolation => {
                IbrsError::ForeignKeyConstraintViolation(native)
            }
            ErrorKind::TableExists => IbrsError::TableExists(native),
            ErrorKind::Driver => IbrsError::Driver(native),
        }
    }

    pub fn usage(message: impl Into<String>) -> Self {
        IbrsError::Usage(message.into())
    }

    pub fn connection(message: impl Into<String>) -> Self {
        IbrsError::Connection(NativeError::driver(message))
    }

    pub fn transaction(message: impl Into<String>) -> Self {
        IbrsError::Transaction(NativeError::driver(message))
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            IbrsError::Usage(_) => ErrorKind::Usage,
            IbrsError::Config(_) => ErrorKind::Config,
            IbrsError::Connection(_) => ErrorKind::Connection,
            IbrsError::Transaction(_) => ErrorKind::Transaction,
            IbrsError::SyntaxError(_) => ErrorKind::SyntaxError,
            IbrsError::TableNotFound(_) => ErrorKind::TableNotFound,
            IbrsError::InvalidFieldName(_) => ErrorKind::InvalidFieldName,
            IbrsError::NonUniqueFieldName(_) => ErrorKind::NonUniqueFieldName,
            IbrsError::UniqueConstraintViolation(_) => ErrorKind::UniqueConstraintViolation,
            IbrsError::ForeignKeyConstraintViolation(_) => {
                ErrorKind::ForeignKeyConstraintViolation
            }
            IbrsError::TableExists(_) => ErrorKind::TableExists,
            IbrsError::Driver(_) => ErrorKind::Driver,
        }
    }

    /// The native error carried by this error, if it came from the engine
    /// or the transaction/connection layer.
    pub fn native(&self) -> Option<&NativeError> {
        match self {
            IbrsError::Usage(_) | IbrsError::Config(_) => None,
            IbrsError::Connection(e)
            | IbrsError::Transaction(e)
            | IbrsError::SyntaxError(e)
            | IbrsError::TableNotFound(e)
            | IbrsError::InvalidFieldName(e)
            | IbrsError::NonUniqueFieldName(e)
            | IbrsError::UniqueConstraintViolation(e)
            | IbrsError::ForeignKeyConstraintViolation(e)
            | IbrsError::TableExists(e)
            | IbrsError::Driver(e) => Some(e),
        }
    }

    pub fn code(&self) -> Option<i32> {
        self.native().and_then(|e| e.code)
    }

    /// Converts this error into the `ErrorInfo` recorded on the object that raised it.
    /// Errors without an engine code are reported under code 0 so they still
    /// count as pending.
    pub fn info(&self) -> ErrorInfo {
        match self.native() {
            Some(native) => ErrorInfo {
                code: Some(native.code.unwrap_or(0)),
                message: Some(native.message.clone()),
            },
            None => ErrorInfo {
                code: Some(0),
                message: Some(self.to_string()),
            },
        }
    }
}

/// Result type alias for ibrs operations
pub type Result<T> = std::result::Result<T, IbrsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_native_error_display() {
        let err = NativeError::new(-104, "Token unknown");
        assert_eq!(err.to_string(), "[-104] Token unknown");
        assert_eq!(NativeError::driver("boom").to_string(), "boom");
    }

    #[test]
    fn test_from_kind_round_trips_kind() {
        let kinds = [
            ErrorKind::Connection,
            ErrorKind::Transaction,
            ErrorKind::SyntaxError,
            ErrorKind::TableNotFound,
            ErrorKind::InvalidFieldName,
            ErrorKind::NonUniqueFieldName,
            ErrorKind::UniqueConstraintViolation,
            ErrorKind::ForeignKeyConstraintViolation,
            ErrorKind::TableExists,
            ErrorKind::Driver,
        ];
        for kind in kinds {
            let err = IbrsError::from_kind(kind, NativeError::new(-1, "x"));
            assert_eq!(err.kind(), kind);
            assert_eq!(err.code(), Some(-1));
        }
    }

    #[test]
    fn test_info_for_usage_error() {
        let info = IbrsError::usage("positional parameters only").info();
        assert!(info.is_pending());
        assert_eq!(info.code, Some(0));
        assert!(info.message.unwrap().contains("positional parameters only"));
    }
}
