//! Raw pthread layer.
//!
//! Everything in here returns the platform status untouched; deciding what a
//! non-zero status means is left to the wrappers at the crate root.

pub use self::attr::{CondAttr, MutexAttr, RwLockAttr};
pub use self::condvar::Condvar;
pub use self::mutex::Mutex;
pub use self::rwlock::RwLock;

pub mod attr;
pub mod condvar;
pub mod mutex;
pub mod rwlock;

pub(crate) mod ffi;

/// Aborts construction of a primitive whose attribute block or handle could
/// not be initialized. Such an object has no valid state to return.
#[cold]
#[track_caller]
pub(crate) fn setup_failed(call: &'static str, code: libc::c_int) -> ! {
    let err = std::io::Error::from_raw_os_error(code);
    tracing::error!(call, code, error = %err, "native primitive setup failed");
    panic!("{call} failed: {err}");
}
