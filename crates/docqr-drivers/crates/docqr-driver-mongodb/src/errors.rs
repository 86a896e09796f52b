//! Translation of MongoDB driver errors into docqr errors

use docqr_core::DocqrError;
use mongodb::error::{ErrorKind, WriteFailure};

/// Server error code for a unique index violation
pub(crate) const DUPLICATE_KEY_CODE: i32 = 11000;

/// Classify a driver error so connect failures can be told apart in logs.
pub(crate) fn classify(error: &mongodb::error::Error, context: &str) -> DocqrError {
    match error.kind.as_ref() {
        ErrorKind::ServerSelection { message, .. } => {
            DocqrError::ServerSelection(format!("{context}: {message}"))
        }
        ErrorKind::Io(io) => DocqrError::Network(format!("{context}: {io}")),
        ErrorKind::DnsResolve { message, .. } => {
            DocqrError::Network(format!("{context}: DNS resolution failed: {message}"))
        }
        ErrorKind::Authentication { message, .. } => {
            DocqrError::Connection(format!("{context}: authentication failed: {message}"))
        }
        ErrorKind::InvalidArgument { message, .. } => {
            DocqrError::Driver(format!("{context}: invalid argument: {message}"))
        }
        _ => DocqrError::Driver(format!("{context}: {error}")),
    }
}

/// Whether the error is a unique index violation
pub(crate) fn is_duplicate_key(error: &mongodb::error::Error) -> bool {
    match error.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => {
            write_error.code == DUPLICATE_KEY_CODE
        }
        ErrorKind::Command(command_error) => command_error.code == DUPLICATE_KEY_CODE,
        _ => false,
    }
}
