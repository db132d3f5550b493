use std::io;

use libc::c_int;

/// Result type returned by the checked operations of this crate.
pub type Result<T> = core::result::Result<T, Error>;

/// An error reported by one of the checked operations.
///
/// The unchecked operations never produce this type; they treat a non-zero
/// status from the platform as a broken contract instead.
#[derive(Debug, Clone, Copy, Eq, PartialEq, thiserror::Error)]
pub enum Error {
    /// The underlying pthread call returned a non-zero status.
    ///
    /// The raw code is kept as-is so it can be compared against the `libc`
    /// errno constants (`EDEADLK`, `EPERM`, `ETIMEDOUT`, ...).
    #[error("{}", describe(.0))]
    Os(c_int),

    /// A bounded wait was handed a deadline that has already passed or that
    /// cannot be expressed as a platform timestamp.
    #[error("wait deadline has already passed or cannot be represented")]
    InvalidDeadline,
}

impl Error {
    /// Returns the raw platform status, if this error carries one.
    pub fn code(&self) -> Option<c_int> {
        match *self {
            Error::Os(code) => Some(code),
            Error::InvalidDeadline => None,
        }
    }

    /// Whether a bounded wait gave up because its deadline elapsed.
    pub fn is_timeout(&self) -> bool {
        self.code() == Some(libc::ETIMEDOUT)
    }

    /// Whether a non-blocking acquisition found the lock held.
    pub fn is_busy(&self) -> bool {
        self.code() == Some(libc::EBUSY)
    }

    /// Whether the primitive detected that the caller would deadlock on
    /// itself (error-checking mutexes, rwlocks).
    pub fn is_deadlock(&self) -> bool {
        self.code() == Some(libc::EDEADLK)
    }
}

impl From<Error> for io::Error {
    fn from(err: Error) -> io::Error {
        match err {
            Error::Os(code) => io::Error::from_raw_os_error(code),
            Error::InvalidDeadline => io::Error::new(io::ErrorKind::InvalidInput, err),
        }
    }
}

fn describe(code: &c_int) -> io::Error {
    io::Error::from_raw_os_error(*code)
}

/// Maps a pthread status to a `Result`.
#[inline]
pub(crate) fn cvt(status: c_int) -> Result<()> {
    if status == 0 {
        Ok(())
    } else {
        Err(Error::Os(status))
    }
}

/// Like `cvt`, but reports `EBUSY` as `Ok(false)` for the try-acquire calls.
#[inline]
pub(crate) fn cvt_try(status: c_int) -> Result<bool> {
    match status {
        0 => Ok(true),
        libc::EBUSY => Ok(false),
        code => Err(Error::Os(code)),
    }
}
