//! Configurable wrappers over the platform's native synchronization
//! primitives.
//!
//! The crate drives the pthread mutex, reader-writer lock and condition
//! variable rather than implementing its own locking. Each primitive can be
//! constructed with an options record whose unset fields keep the platform
//! default, and each operation comes both as a plain call, whose misuse is as
//! undefined as it is for the native primitive, and as a `_checked` call that
//! reports the raw platform status through [`Error`].
//!
//! Code that only needs locking should depend on the capability traits
//! ([`BasicLock`], [`Lock`], [`BasicReadWriteLock`], [`ReadWriteLock`]) so
//! the backend can be chosen for its trade-offs without touching call sites.
//!
//! ```rust
//! use native_sync::{BasicLock, Mutex, MutexConfig, MutexKind};
//!
//! fn critical(lock: &impl BasicLock, counter: &mut u32) {
//!     lock.with_locked(|| *counter += 1);
//! }
//!
//! let mut n = 0;
//! critical(&Mutex::with_config(MutexConfig::new().kind(MutexKind::Recursive)), &mut n);
//! assert_eq!(n, 1);
//! ```

#[cfg(not(unix))]
compile_error!("native-sync only supports platforms with pthreads");

pub use crate::condvar::{Condvar, CondvarConfig};
pub use crate::config::Configurable;
pub use crate::error::{Error, Result};
pub use crate::lock::{BasicLock, BasicReadWriteLock, Lock, ReadWriteLock};
pub use crate::mutex::{Mutex, MutexConfig, MutexKind, MutexProtocol};
pub use crate::rwlock::{RwLock, RwLockConfig};
pub use crate::semaphore::{BinarySemaphore, Semaphore};

pub mod sys;

mod condvar;
mod config;
mod error;
mod lock;
mod mutex;
mod rwlock;
mod semaphore;

#[cfg(test)]
mod test_util;
