use core::fmt;

use alloc::collections::TryReserveError;

/// An error that can occur while tokenizing a single line.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Error {
    /// The line produced a different number of fields than expected.
    FieldCount {
        /// The number of fields the caller asked for.
        expected: usize,
        /// The number of fields actually found on the line.
        found: usize,
    },
    /// Memory for a token or field could not be reserved.
    OutOfMemory,
}

impl From<TryReserveError> for Error {
    fn from(_: TryReserveError) -> Error {
        Error::OutOfMemory
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::FieldCount { expected, found } => write!(
                f,
                "found line with {} fields, but expected {} fields",
                found, expected
            ),
            Error::OutOfMemory => {
                write!(f, "failed to allocate memory for a field")
            }
        }
    }
}
