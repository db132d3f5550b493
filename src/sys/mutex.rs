use std::cell::UnsafeCell;

use libc::c_int;

use super::attr::MutexAttr;

/// An OS-based mutual exclusion lock.
///
/// This is the thinnest wrapper around `pthread_mutex_t`. Every call hands
/// back the raw status so the safe layer can choose between asserting on it
/// and reporting it. All usage of this mutex is unsafe and it is recommended
/// to instead use the wrapper at the top level of the crate.
pub struct Mutex { inner: UnsafeCell<libc::pthread_mutex_t> }

unsafe impl Send for Mutex {}
unsafe impl Sync for Mutex {}

#[inline]
pub fn raw(m: &Mutex) -> *mut libc::pthread_mutex_t {
    m.inner.get()
}

impl Mutex {
    /// Creates a mutex holding the static initializer.
    ///
    /// `init` must be called once the mutex has reached its final address,
    /// before any other method.
    pub const fn new() -> Mutex {
        Mutex { inner: UnsafeCell::new(libc::PTHREAD_MUTEX_INITIALIZER) }
    }

    /// Initializes the mutex from `attr`.
    ///
    /// Behavior is undefined if the mutex is moved after this call.
    #[inline]
    pub unsafe fn init(&mut self, attr: &MutexAttr<'_>) -> c_int {
        libc::pthread_mutex_init(self.inner.get(), attr.as_ptr())
    }

    /// Locks the mutex blocking the current thread until it is available.
    #[inline]
    pub unsafe fn lock(&self) -> c_int {
        libc::pthread_mutex_lock(self.inner.get())
    }

    /// Attempts to lock the mutex without blocking. `EBUSY` means it is held.
    #[inline]
    pub unsafe fn try_lock(&self) -> c_int {
        libc::pthread_mutex_trylock(self.inner.get())
    }

    /// Unlocks the mutex.
    ///
    /// Behavior is undefined if the current thread does not actually hold the
    /// mutex, unless it was initialized as error-checking or recursive.
    #[inline]
    pub unsafe fn unlock(&self) -> c_int {
        libc::pthread_mutex_unlock(self.inner.get())
    }

    /// Deallocates all resources associated with this mutex.
    ///
    /// Behavior is undefined if there are current or will be future users of
    /// this mutex.
    #[inline]
    pub unsafe fn destroy(&self) -> c_int {
        libc::pthread_mutex_destroy(self.inner.get())
    }
}
