use std::collections::TryReserveError;
use std::error;
use std::fmt;
use std::io;
use std::result;

/// A type alias for `Result<T, csvparse::Error>`.
pub type Result<T> = result::Result<T, Error>;

/// An error that can occur when parsing or writing CSV data.
///
/// Every parse error is terminal: the parse that produced it is abandoned,
/// and anything it had allocated is dropped before the error is returned.
/// In particular, no partially built `Table` is ever handed out.
#[derive(Debug)]
pub enum Error {
    /// An I/O error that occurred while reading or writing CSV data.
    Io(io::Error),
    /// The input has no header line. This happens when the input is empty
    /// or when its first line is blank.
    EmptyFile,
    /// A line's quote-aware field count does not match the header's.
    Parse {
        /// The 1-based line number of the offending line.
        line: u64,
        /// The number of fields in the header.
        expected: u64,
        /// The number of fields found on the offending line.
        found: u64,
    },
    /// A line is not valid UTF-8.
    Utf8 {
        /// The 1-based line number of the offending line.
        line: u64,
        /// The byte offset into the line up to which UTF-8 was valid.
        valid_up_to: usize,
    },
    /// Memory could not be reserved while building the table.
    OutOfMemory,
}

/// The kind of an error, without any of its details.
///
/// This is useful for mapping errors onto process exit codes.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ErrorKind {
    /// See `Error::Parse`.
    Parse,
    /// See `Error::OutOfMemory`.
    OutOfMemory,
    /// See `Error::EmptyFile`.
    EmptyFile,
    /// See `Error::Utf8`.
    Utf8,
    /// See `Error::Io`.
    Io,
}

impl ErrorKind {
    /// The ordinal of this kind of error.
    ///
    /// Ordinals are distinct and nonzero, so they are suitable as process
    /// exit codes.
    pub fn code(self) -> i32 {
        match self {
            ErrorKind::Parse => 1,
            ErrorKind::OutOfMemory => 2,
            ErrorKind::EmptyFile => 4,
            ErrorKind::Utf8 => 8,
            ErrorKind::Io => 16,
        }
    }
}

impl Error {
    /// Return the kind of this error.
    pub fn kind(&self) -> ErrorKind {
        match *self {
            Error::Io(_) => ErrorKind::Io,
            Error::EmptyFile => ErrorKind::EmptyFile,
            Error::Parse { .. } => ErrorKind::Parse,
            Error::Utf8 { .. } => ErrorKind::Utf8,
            Error::OutOfMemory => ErrorKind::OutOfMemory,
        }
    }

    /// The ordinal of this error's kind. See `ErrorKind::code`.
    pub fn code(&self) -> i32 {
        self.kind().code()
    }

    /// Returns true if this is an I/O error.
    pub fn is_io_error(&self) -> bool {
        match *self {
            Error::Io(_) => true,
            _ => false,
        }
    }

    /// Attach a line number to an error from the tokenizer.
    pub(crate) fn from_core(err: csvparse_core::Error, line: u64) -> Error {
        match err {
            csvparse_core::Error::FieldCount { expected, found } => {
                Error::Parse {
                    line,
                    expected: expected as u64,
                    found: found as u64,
                }
            }
            csvparse_core::Error::OutOfMemory => Error::OutOfMemory,
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Error {
        Error::Io(err)
    }
}

impl From<TryReserveError> for Error {
    fn from(_: TryReserveError) -> Error {
        Error::OutOfMemory
    }
}

impl error::Error for Error {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match *self {
            Error::Io(ref err) => Some(err),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Error::Io(ref err) => write!(f, "{}", err),
            Error::EmptyFile => {
                write!(f, "CSV error: empty file (no header line found)")
            }
            Error::Parse { line, expected, found } => write!(
                f,
                "CSV parse error: line {}: found record with {} fields, \
                 but the header has {} fields",
                line, found, expected
            ),
            Error::Utf8 { line, valid_up_to } => write!(
                f,
                "CSV parse error: line {}: invalid UTF-8 near byte index {}",
                line, valid_up_to
            ),
            Error::OutOfMemory => {
                write!(f, "CSV error: failed to allocate memory")
            }
        }
    }
}
