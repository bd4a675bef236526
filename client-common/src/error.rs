//! Ledger client errors
use std::fmt;

use thiserror::Error as ThisError;

use crate::Status;

/// Alias of `Result` objects that return [`Error`]
///
/// [`Error`]: self::Error
pub type Result<T> = std::result::Result<T, Error>;

/// An opaque error type, used for all errors in `client-*` crates
#[derive(Debug)]
pub struct Error {
    kind: ErrorKind,
    message: String,
    status: Option<Status>,
    origin: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

/// Different variants of possible errors
#[derive(Copy, Clone, Eq, PartialEq, Debug, ThisError)]
pub enum ErrorKind {
    /// Invalid input
    #[error("Invalid input")]
    InvalidInput,
    /// Serialization error
    #[error("Serialization error")]
    SerializationError,
    /// Deserialization error
    #[error("Deserialization error")]
    DeserializationError,
    /// Key generation error
    #[error("Key generation error")]
    KeyGenerationError,
    /// Signing error
    #[error("Signing error")]
    SigningError,
    /// No operator is bound to the client and no explicit payer was given
    #[error("Operator not set")]
    OperatorNotSet,
    /// Transaction rejected before reaching consensus
    #[error("Transaction precheck failed")]
    PrecheckFailed,
    /// Transaction reached consensus with a non-success status
    #[error("Receipt status is not success")]
    ReceiptStatusError,
    /// Transaction not found
    #[error("Transaction not found")]
    TransactionNotFound,
    /// Entity (account, token or topic) not found
    #[error("Entity not found")]
    EntityNotFound,
    /// Timed out while waiting on the network
    #[error("Timed out")]
    Timeout,
    /// Connection error
    #[error("Connection error")]
    ConnectionError,
    /// Topic subscription error
    #[error("Subscription error")]
    SubscriptionError,
    /// Configuration error
    #[error("Configuration error")]
    ConfigError,
    /// IO error
    #[error("IO error")]
    IoError,
    /// Error while locking a shared resource
    #[error("Error while locking a shared resource")]
    LockError,
}

impl Error {
    /// Creates a new instance of `Error`
    pub fn new(kind: ErrorKind, message: impl ToString) -> Error {
        Error {
            kind,
            message: message.to_string(),
            status: None,
            origin: None,
        }
    }

    /// Creates a new instance of `Error` caused by `origin`
    pub fn new_with_source(
        kind: ErrorKind,
        message: impl ToString,
        origin: Box<dyn std::error::Error + Send + Sync + 'static>,
    ) -> Error {
        Error {
            kind,
            message: message.to_string(),
            status: None,
            origin: Some(origin),
        }
    }

    /// Attaches the ledger status code which caused this error
    pub fn with_status(mut self, status: Status) -> Error {
        self.status = Some(status);
        self
    }

    /// Returns [`ErrorKind`] of current error
    ///
    /// [`ErrorKind`]: self::ErrorKind
    #[inline]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Returns the message of current error
    #[inline]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns the ledger status code attached to current error, if any
    #[inline]
    pub fn status(&self) -> Option<Status> {
        self.status
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "{}: {} ({})", self.kind, self.message, status),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.origin
            .as_ref()
            .map(|origin| origin.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl From<ErrorKind> for Error {
    fn from(kind: ErrorKind) -> Error {
        Error::new(kind, "")
    }
}

/// Extension trait for attaching an [`ErrorKind`] and message to foreign errors
///
/// [`ErrorKind`]: self::ErrorKind
pub trait ResultExt<T> {
    /// Converts the failure case into [`Error`] with kind and message returned by `f`
    ///
    /// [`Error`]: self::Error
    fn chain<F, M>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> (ErrorKind, M),
        M: ToString;

    /// Converts the failure case into [`Error`] of given kind
    ///
    /// [`Error`]: self::Error
    fn err_kind<F, M>(self, kind: ErrorKind, f: F) -> Result<T>
    where
        F: FnOnce() -> M,
        M: ToString,
        Self: Sized,
    {
        self.chain(|| (kind, f()))
    }
}

impl<T, E> ResultExt<T> for std::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn chain<F, M>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> (ErrorKind, M),
        M: ToString,
    {
        self.map_err(|err| {
            let (kind, message) = f();
            Error::new_with_source(kind, message, Box::new(err))
        })
    }
}

impl<T> ResultExt<T> for Option<T> {
    fn chain<F, M>(self, f: F) -> Result<T>
    where
        F: FnOnce() -> (ErrorKind, M),
        M: ToString,
    {
        self.ok_or_else(|| {
            let (kind, message) = f();
            Error::new(kind, message)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::error::Error as _;

    #[test]
    fn check_chain_on_foreign_error() {
        let parsed: std::result::Result<u64, _> = "abc".parse::<u64>();
        let error = parsed
            .chain(|| (ErrorKind::InvalidInput, "Unable to parse entity number"))
            .unwrap_err();

        assert_eq!(ErrorKind::InvalidInput, error.kind());
        assert_eq!("Unable to parse entity number", error.message());
        assert!(error.source().is_some());
    }

    #[test]
    fn check_chain_on_none() {
        let error = None::<u8>
            .err_kind(ErrorKind::EntityNotFound, || "Token not found")
            .unwrap_err();

        assert_eq!(ErrorKind::EntityNotFound, error.kind());
        assert!(error.status().is_none());
    }

    #[test]
    fn check_display_with_status() {
        let error = Error::new(ErrorKind::PrecheckFailed, "Payer cannot cover fee")
            .with_status(Status::InsufficientPayerBalance);

        assert_eq!(
            "Transaction precheck failed: Payer cannot cover fee (INSUFFICIENT_PAYER_BALANCE)",
            error.to_string()
        );
        assert_eq!(Some(Status::InsufficientPayerBalance), error.status());
    }
}
