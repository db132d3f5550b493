//! Capability traits shared by every backend.
//!
//! Code that only needs mutual exclusion should be written against these
//! traits, usually as `&dyn Lock` or `impl ReadWriteLock`, so the backend can
//! be swapped without touching call sites.

/// A lock that can be acquired and released.
pub trait BasicLock: Send + Sync {
    /// Creates the lock with its default configuration.
    fn new() -> Self
    where
        Self: Sized;

    /// Blocks the current thread until the lock is acquired.
    fn lock(&self);

    /// Releases the lock.
    ///
    /// # Safety
    ///
    /// The lock must be held. Backends differ in whether it has to be held by
    /// the calling thread; releasing a lock that is not held is undefined
    /// behavior unless the backend documents otherwise.
    unsafe fn unlock(&self);

    /// Runs `f` with the lock held, releasing it however `f` exits.
    fn with_locked<T, F>(&self, f: F) -> T
    where
        F: FnOnce() -> T,
        Self: Sized,
    {
        self.lock();
        let _release = Release(|| unsafe { self.unlock() });
        f()
    }
}

/// A `BasicLock` that can also be probed without blocking.
pub trait Lock: BasicLock {
    /// Acquires the lock if it is free, without blocking.
    fn try_lock(&self) -> bool;
}

/// A lock with separate shared (read) and exclusive (write) acquisition.
pub trait BasicReadWriteLock: Send + Sync {
    /// Creates the lock with its default configuration.
    fn new() -> Self
    where
        Self: Sized;

    /// Blocks until the lock is acquired for shared access.
    fn read_lock(&self);

    /// Blocks until the lock is acquired for exclusive access.
    fn write_lock(&self);

    /// Releases one read or write hold.
    ///
    /// # Safety
    ///
    /// The calling thread must hold the lock, and every successful
    /// acquisition is matched by exactly one call.
    unsafe fn unlock(&self);

    /// Runs `f` while holding the lock for reading.
    fn with_read_locked<T, F>(&self, f: F) -> T
    where
        F: FnOnce() -> T,
        Self: Sized,
    {
        self.read_lock();
        let _release = Release(|| unsafe { self.unlock() });
        f()
    }

    /// Runs `f` while holding the lock for writing.
    fn with_write_locked<T, F>(&self, f: F) -> T
    where
        F: FnOnce() -> T,
        Self: Sized,
    {
        self.write_lock();
        let _release = Release(|| unsafe { self.unlock() });
        f()
    }
}

/// A `BasicReadWriteLock` with non-blocking probes.
pub trait ReadWriteLock: BasicReadWriteLock {
    fn try_read_lock(&self) -> bool;
    fn try_write_lock(&self) -> bool;
}

/// Runs its closure on drop, including during unwinding.
struct Release<F: FnMut()>(F);

impl<F: FnMut()> Drop for Release<F> {
    fn drop(&mut self) {
        (self.0)()
    }
}
