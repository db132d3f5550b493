use std::cell::UnsafeCell;

use libc::c_int;

use super::attr::RwLockAttr;

/// An OS-based reader-writer lock over `pthread_rwlock_t`.
///
/// The same handle is released with `unlock` regardless of whether it was
/// acquired for reading or writing.
pub struct RwLock { inner: UnsafeCell<libc::pthread_rwlock_t> }

unsafe impl Send for RwLock {}
unsafe impl Sync for RwLock {}

impl RwLock {
    pub const fn new() -> RwLock {
        RwLock { inner: UnsafeCell::new(libc::PTHREAD_RWLOCK_INITIALIZER) }
    }

    /// Behavior is undefined if the lock is moved after this call.
    #[inline]
    pub unsafe fn init(&mut self, attr: &RwLockAttr<'_>) -> c_int {
        libc::pthread_rwlock_init(self.inner.get(), attr.as_ptr())
    }
    #[inline]
    pub unsafe fn read(&self) -> c_int {
        libc::pthread_rwlock_rdlock(self.inner.get())
    }
    #[inline]
    pub unsafe fn try_read(&self) -> c_int {
        libc::pthread_rwlock_tryrdlock(self.inner.get())
    }
    #[inline]
    pub unsafe fn write(&self) -> c_int {
        libc::pthread_rwlock_wrlock(self.inner.get())
    }
    #[inline]
    pub unsafe fn try_write(&self) -> c_int {
        libc::pthread_rwlock_trywrlock(self.inner.get())
    }
    #[inline]
    pub unsafe fn unlock(&self) -> c_int {
        libc::pthread_rwlock_unlock(self.inner.get())
    }
    #[inline]
    pub unsafe fn destroy(&self) -> c_int {
        libc::pthread_rwlock_destroy(self.inner.get())
    }
}
