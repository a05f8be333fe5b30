//! Status codes and error values shared by every codec and driver.
//!
//! `Status` is the stable, wire-level enumeration: every public operation in
//! this crate resolves to exactly one of these eight codes. `Error` pairs a
//! non-`Ok` status with a short human-readable detail string; handles keep a
//! copy of the most recent one for the `last_error()` / `error_detail()`
//! accessors.

use core::fmt;

/// Maximum length of an error detail string, in bytes. Longer messages are
/// truncated on construction.
pub const ERROR_DETAIL_MAX: usize = 256;

// ─────────────────────────────────────────────────────────────────────────────
// Status
// ─────────────────────────────────────────────────────────────────────────────

/// Stable status codes for compression operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// Operation succeeded.
    Ok,
    /// Caller contract violation (bad argument, option out of range).
    InvalidArg,
    /// Memory allocation failed.
    Memory,
    /// Resource cap exceeded, or the output buffer is full.
    Limit,
    /// Malformed input data.
    Corrupt,
    /// Unknown method, or method lacks the requested capability.
    Unsupported,
    /// Library invariant broken.
    Internal,
    /// A caller-supplied I/O callback reported failure.
    Io,
}

impl Status {
    /// Fixed identifier for the status code. Pure; safe to call from any
    /// thread.
    pub const fn as_str(self) -> &'static str {
        match self {
            Status::Ok => "ok",
            Status::InvalidArg => "invalid_arg",
            Status::Memory => "memory",
            Status::Limit => "limit",
            Status::Corrupt => "corrupt",
            Status::Unsupported => "unsupported",
            Status::Internal => "internal",
            Status::Io => "io",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Error
// ─────────────────────────────────────────────────────────────────────────────

/// A non-`Ok` status plus a bounded detail string.
///
/// Detail strings are advisory only; they are truncated at
/// [`ERROR_DETAIL_MAX`] bytes and never required for program logic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Error {
    status: Status,
    detail: String,
}

impl Error {
    /// Build an error from a status and detail message.
    pub fn new(status: Status, detail: impl Into<String>) -> Error {
        let mut detail = detail.into();
        if detail.len() > ERROR_DETAIL_MAX {
            // Truncate on a char boundary so the stored detail stays valid UTF-8.
            let mut cut = ERROR_DETAIL_MAX;
            while !detail.is_char_boundary(cut) {
                cut -= 1;
            }
            detail.truncate(cut);
        }
        Error { status, detail }
    }

    pub fn invalid_arg(detail: impl Into<String>) -> Error {
        Error::new(Status::InvalidArg, detail)
    }

    pub fn memory(detail: impl Into<String>) -> Error {
        Error::new(Status::Memory, detail)
    }

    pub fn limit(detail: impl Into<String>) -> Error {
        Error::new(Status::Limit, detail)
    }

    pub fn corrupt(detail: impl Into<String>) -> Error {
        Error::new(Status::Corrupt, detail)
    }

    pub fn unsupported(detail: impl Into<String>) -> Error {
        Error::new(Status::Unsupported, detail)
    }

    pub fn internal(detail: impl Into<String>) -> Error {
        Error::new(Status::Internal, detail)
    }

    pub fn io(detail: impl Into<String>) -> Error {
        Error::new(Status::Io, detail)
    }

    /// The status code carried by this error. Never `Status::Ok`.
    pub fn status(&self) -> Status {
        self.status
    }

    /// The (possibly truncated) detail message.
    pub fn detail(&self) -> &str {
        &self.detail
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.detail.is_empty() {
            f.write_str(self.status.as_str())
        } else {
            write!(f, "{}: {}", self.status.as_str(), self.detail)
        }
    }
}

impl std::error::Error for Error {}

/// Crate-wide result alias.
pub type Result<T> = core::result::Result<T, Error>;
