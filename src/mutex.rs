use std::fmt;
use std::mem::MaybeUninit;

use libc::c_int;

use crate::config::Configurable;
use crate::error::{cvt, cvt_try, Result};
use crate::lock::{BasicLock, Lock};
use crate::sys::{self, attr::forward};

/// Re-entry behavior of a `Mutex`, fixed for its lifetime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutexKind {
    /// Re-locking from the owning thread deadlocks.
    Normal,
    /// Re-locking from the owning thread, or unlocking from a thread that
    /// does not own the mutex, is reported as an error.
    ErrorCheck,
    /// The owning thread may lock again; each lock needs its own unlock.
    Recursive,
    /// Whatever the platform maps `PTHREAD_MUTEX_DEFAULT` to.
    Default,
}

/// Scheduling protocol used while the mutex is held.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MutexProtocol {
    /// Holding the mutex leaves the owner's priority alone.
    None,
    /// The owner runs at the priority of the highest waiter.
    Inherit,
    /// The owner runs at the mutex's priority ceiling.
    ///
    /// Locking raises the caller to the ceiling, which the platform refuses
    /// (`EINVAL` on glibc) for a thread that is not under a real-time
    /// scheduling policy. Only [`Mutex::lock_checked`] and
    /// [`Mutex::try_lock_checked`] report that; the plain `lock` merely
    /// debug-asserts and returns without holding the mutex in a release
    /// build.
    Protect,
}

/// Options for constructing a `Mutex`. Unset fields keep the platform default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MutexConfig {
    pub kind: Option<MutexKind>,
    /// Fair hand-off between waiters instead of first-fit. Only forwarded on
    /// Apple platforms.
    pub fair: Option<bool>,
    pub process_shared: Option<bool>,
    pub protocol: Option<MutexProtocol>,
    /// Real-time priority the owner runs at under [`MutexProtocol::Protect`].
    /// Must lie within the `SCHED_FIFO` priority range; other values are
    /// rejected and the platform default ceiling is kept. Locking still fails
    /// for threads that are not real-time, see [`MutexProtocol::Protect`].
    pub priority_ceiling: Option<i32>,
}

impl MutexConfig {
    pub fn new() -> MutexConfig {
        MutexConfig::default()
    }

    pub fn kind(mut self, kind: MutexKind) -> MutexConfig {
        self.kind = Some(kind);
        self
    }

    pub fn fair(mut self, fair: bool) -> MutexConfig {
        self.fair = Some(fair);
        self
    }

    pub fn process_shared(mut self, shared: bool) -> MutexConfig {
        self.process_shared = Some(shared);
        self
    }

    pub fn protocol(mut self, protocol: MutexProtocol) -> MutexConfig {
        self.protocol = Some(protocol);
        self
    }

    pub fn priority_ceiling(mut self, ceiling: i32) -> MutexConfig {
        self.priority_ceiling = Some(ceiling);
        self
    }

    fn apply(&self, attr: &mut sys::MutexAttr<'_>) {
        if let Some(kind) = self.kind {
            let kind = match kind {
                MutexKind::Normal => libc::PTHREAD_MUTEX_NORMAL,
                MutexKind::ErrorCheck => libc::PTHREAD_MUTEX_ERRORCHECK,
                MutexKind::Recursive => libc::PTHREAD_MUTEX_RECURSIVE,
                MutexKind::Default => libc::PTHREAD_MUTEX_DEFAULT,
            };
            forward("mutex", "type", attr.set_type(kind));
        }
        if let Some(fair) = self.fair {
            forward("mutex", "policy", attr.set_fair(fair));
        }
        if let Some(shared) = self.process_shared {
            forward("mutex", "pshared", attr.set_pshared(shared));
        }
        if let Some(protocol) = self.protocol {
            let protocol: c_int = match protocol {
                MutexProtocol::None => sys::ffi::PTHREAD_PRIO_NONE,
                MutexProtocol::Inherit => sys::ffi::PTHREAD_PRIO_INHERIT,
                MutexProtocol::Protect => sys::ffi::PTHREAD_PRIO_PROTECT,
            };
            forward("mutex", "protocol", attr.set_protocol(protocol));
        }
        if let Some(ceiling) = self.priority_ceiling {
            forward("mutex", "prioceiling", attr.set_prioceiling(ceiling));
        }
    }
}

/// A configurable mutual exclusion lock backed by `pthread_mutex_t`.
///
/// Every operation comes in two forms. The plain form (`lock`, `unlock`,
/// `try_lock`) treats a failing platform call as a broken contract: misuse is
/// undefined behavior exactly as it is for the native mutex, and is only
/// caught by debug assertions. The `_checked` form reports every non-zero
/// status as an [`Error`](crate::Error).
///
/// # Example
///
/// ```rust
/// use native_sync::{Mutex, MutexConfig, MutexKind};
///
/// let m = Mutex::with_config(MutexConfig::new().kind(MutexKind::ErrorCheck));
/// m.lock_checked().unwrap();
/// assert!(m.lock_checked().unwrap_err().is_deadlock());
/// unsafe { m.unlock_checked().unwrap() };
/// ```
pub struct Mutex {
    // The native mutex must never move once initialized, so it lives in a box
    // and only the box is moved around with the `Mutex`.
    inner: Box<sys::Mutex>,
}

impl Mutex {
    /// Creates a mutex with the platform's default attributes.
    pub fn new() -> Mutex {
        Mutex::with_config(MutexConfig::default())
    }

    /// Creates a mutex from `config`.
    ///
    /// # Panics
    ///
    /// Panics if the platform cannot initialize the attribute block or the
    /// mutex itself.
    pub fn with_config(config: MutexConfig) -> Mutex {
        let mut inner = Box::new(sys::Mutex::new());
        let mut storage = MaybeUninit::uninit();
        let mut attr = sys::MutexAttr::init(&mut storage)
            .unwrap_or_else(|code| sys::setup_failed("pthread_mutexattr_init", code));
        config.apply(&mut attr);
        match unsafe { inner.init(&attr) } {
            0 => {}
            code => sys::setup_failed("pthread_mutex_init", code),
        }
        drop(attr);
        tracing::trace!(?config, "initialized mutex");
        Mutex { inner }
    }

    /// Acquires the mutex, blocking the current thread until it is able to do
    /// so.
    ///
    /// What happens when the owning thread calls this again depends on the
    /// configured [`MutexKind`]: a recursive mutex counts the extra hold, a
    /// normal one deadlocks. Use [`lock_checked`](Mutex::lock_checked) to
    /// observe an error-checking mutex refusing the re-entry.
    #[inline]
    pub fn lock(&self) {
        let r = unsafe { self.inner.lock() };
        debug_assert_eq!(r, 0);
    }

    /// Releases one level of ownership.
    ///
    /// # Safety
    ///
    /// The calling thread must hold the mutex.
    #[inline]
    pub unsafe fn unlock(&self) {
        let r = self.inner.unlock();
        debug_assert_eq!(r, 0);
    }

    /// Attempts to acquire the mutex without blocking.
    #[inline]
    pub fn try_lock(&self) -> bool {
        unsafe { self.inner.try_lock() == 0 }
    }

    /// Like `lock`, but reports any failure from the platform, such as
    /// `EDEADLK` when an error-checking mutex is re-locked by its owner.
    #[inline]
    pub fn lock_checked(&self) -> Result<()> {
        cvt(unsafe { self.inner.lock() })
    }

    /// Like `unlock`, but reports any failure from the platform.
    ///
    /// # Safety
    ///
    /// Only error-checking and recursive mutexes detect an unlock by a thread
    /// that does not own them (`EPERM`). For the other kinds the calling
    /// thread must hold the mutex.
    #[inline]
    pub unsafe fn unlock_checked(&self) -> Result<()> {
        cvt(self.inner.unlock())
    }

    /// Like `try_lock`, but distinguishes "held elsewhere" (`Ok(false)`) from
    /// other failures, such as `EAGAIN` when a recursive mutex's hold count
    /// would overflow.
    #[inline]
    pub fn try_lock_checked(&self) -> Result<bool> {
        cvt_try(unsafe { self.inner.try_lock() })
    }

    pub(crate) fn raw(&self) -> &sys::Mutex {
        &self.inner
    }
}

impl Default for Mutex {
    fn default() -> Mutex {
        Mutex::new()
    }
}

impl fmt::Debug for Mutex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mutex").finish_non_exhaustive()
    }
}

impl Drop for Mutex {
    fn drop(&mut self) {
        // EBUSY here means a hold was leaked.
        let r = unsafe { self.inner.destroy() };
        debug_assert_eq!(r, 0);
        tracing::trace!("destroyed mutex");
    }
}

impl Configurable for Mutex {
    type Config = MutexConfig;

    fn with_config(config: MutexConfig) -> Mutex {
        Mutex::with_config(config)
    }
}

impl BasicLock for Mutex {
    fn new() -> Mutex {
        Mutex::new()
    }

    #[inline]
    fn lock(&self) {
        Mutex::lock(self)
    }

    #[inline]
    unsafe fn unlock(&self) {
        Mutex::unlock(self)
    }
}

impl Lock for Mutex {
    #[inline]
    fn try_lock(&self) -> bool {
        Mutex::try_lock(self)
    }
}
