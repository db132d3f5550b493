use std::cell::UnsafeCell;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use libc::c_int;

use super::attr::CondAttr;
use super::mutex::{self, Mutex};

/// An OS-based condition variable.
///
/// This structure is the lowest layer possible on top of `pthread_cond_t`.
/// It is consequently entirely unsafe to use. It is recommended to use the
/// types at the top level of this crate instead of this type.
pub struct Condvar { inner: UnsafeCell<libc::pthread_cond_t> }

unsafe impl Send for Condvar {}
unsafe impl Sync for Condvar {}

impl Condvar {
    /// Creates a condition variable holding the static initializer.
    pub const fn new() -> Condvar {
        Condvar { inner: UnsafeCell::new(libc::PTHREAD_COND_INITIALIZER) }
    }

    /// Initializes the condition variable from `attr`.
    ///
    /// Behavior is undefined if the condition variable is moved after this
    /// call.
    #[inline]
    pub unsafe fn init(&mut self, attr: &CondAttr<'_>) -> c_int {
        libc::pthread_cond_init(self.inner.get(), attr.as_ptr())
    }

    /// Signal one waiter on this condition variable to wake up.
    #[inline]
    pub unsafe fn signal(&self) -> c_int {
        libc::pthread_cond_signal(self.inner.get())
    }

    /// Awaken all current waiters on this condition variable.
    #[inline]
    pub unsafe fn broadcast(&self) -> c_int {
        libc::pthread_cond_broadcast(self.inner.get())
    }

    /// Wait for a signal on the specified mutex.
    ///
    /// Behavior is undefined if the mutex is not locked by the current thread.
    /// Behavior is also undefined if more than one mutex is used concurrently
    /// on this condition variable.
    #[inline]
    pub unsafe fn wait(&self, mutex: &Mutex) -> c_int {
        libc::pthread_cond_wait(self.inner.get(), mutex::raw(mutex))
    }

    /// Wait for a signal on the specified mutex until the absolute wall-clock
    /// time `abstime`. Returns `ETIMEDOUT` if it passes first.
    ///
    /// Same preconditions as `wait`.
    #[inline]
    pub unsafe fn wait_until(&self, mutex: &Mutex, abstime: &libc::timespec) -> c_int {
        libc::pthread_cond_timedwait(self.inner.get(), mutex::raw(mutex), abstime)
    }

    /// Deallocate all resources associated with this condition variable.
    ///
    /// Behavior is undefined if there are current or will be future users of
    /// this condition variable.
    #[inline]
    pub unsafe fn destroy(&self) -> c_int {
        libc::pthread_cond_destroy(self.inner.get())
    }
}

/// Converts a wall-clock deadline into the absolute `timespec` that
/// `pthread_cond_timedwait` expects.
///
/// Returns `None` if the deadline is not in the future or its seconds do not
/// fit in `time_t`.
pub fn abstime(deadline: SystemTime) -> Option<libc::timespec> {
    match deadline.duration_since(SystemTime::now()) {
        Ok(left) if left > Duration::ZERO => {}
        _ => return None,
    }
    let since_epoch = deadline.duration_since(UNIX_EPOCH).ok()?;
    Some(libc::timespec {
        tv_sec: libc::time_t::try_from(since_epoch.as_secs()).ok()?,
        tv_nsec: since_epoch.subsec_nanos() as _,
    })
}
