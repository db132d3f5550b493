use std::cell::UnsafeCell;
use std::fmt;
use std::time::SystemTime;

use crate::condvar::Condvar;
use crate::lock::{BasicLock, Lock};
use crate::mutex::Mutex;

/// A counting semaphore built from a [`Mutex`] and a [`Condvar`].
///
/// `wait` takes a permit, blocking while none are left; `signal` returns one
/// and wakes a single waiter.
pub struct Semaphore {
    lock: Mutex,
    cvar: Condvar,
    // Only accessed with `lock` held.
    permits: UnsafeCell<usize>,
}

unsafe impl Sync for Semaphore {}

impl Semaphore {
    pub fn new(permits: usize) -> Semaphore {
        Semaphore {
            lock: Mutex::new(),
            cvar: Condvar::new(),
            permits: UnsafeCell::new(permits),
        }
    }

    /// Blocks until a permit is available and takes it.
    pub fn wait(&self) {
        self.lock.with_locked(|| {
            // Guard against spurious wakeups.
            while unsafe { *self.permits.get() } == 0 {
                unsafe { self.cvar.wait(&self.lock) };
            }
            unsafe { *self.permits.get() -= 1 };
        })
    }

    /// Takes a permit if one is available, without blocking.
    pub fn try_wait(&self) -> bool {
        self.lock.with_locked(|| self.try_take())
    }

    /// Like `wait`, but gives up once the wall clock reaches `deadline`.
    /// Returns whether a permit was taken.
    pub fn wait_until(&self, deadline: SystemTime) -> bool {
        self.lock.with_locked(|| loop {
            if self.try_take() {
                return true;
            }
            if !unsafe { self.cvar.wait_until(deadline, &self.lock) } {
                return self.try_take();
            }
        })
    }

    /// Returns a permit, waking one blocked `wait` if there is one.
    pub fn signal(&self) {
        self.lock.with_locked(|| {
            unsafe { *self.permits.get() += 1 };
            self.cvar.signal();
        })
    }

    /// Permits currently available. Stale as soon as it returns.
    pub fn available(&self) -> usize {
        self.lock.with_locked(|| unsafe { *self.permits.get() })
    }

    // Callers hold `lock`.
    fn try_take(&self) -> bool {
        let permits = unsafe { &mut *self.permits.get() };
        if *permits == 0 {
            return false;
        }
        *permits -= 1;
        true
    }
}

impl fmt::Debug for Semaphore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Semaphore")
            .field("available", &self.available())
            .finish()
    }
}

/// A lock backed by a [`Semaphore`] with a single permit.
///
/// Unlike [`Mutex`], it has no owning thread: any thread may release a hold
/// taken by another.
#[derive(Debug)]
pub struct BinarySemaphore {
    sem: Semaphore,
}

impl BinarySemaphore {
    pub fn new() -> BinarySemaphore {
        BinarySemaphore { sem: Semaphore::new(1) }
    }
}

impl Default for BinarySemaphore {
    fn default() -> BinarySemaphore {
        BinarySemaphore::new()
    }
}

impl BasicLock for BinarySemaphore {
    fn new() -> BinarySemaphore {
        BinarySemaphore::new()
    }

    fn lock(&self) {
        self.sem.wait()
    }

    /// # Safety
    ///
    /// The semaphore must be held, by any thread. Releasing it while free
    /// would add a second permit and break mutual exclusion.
    unsafe fn unlock(&self) {
        self.sem.signal()
    }
}

impl Lock for BinarySemaphore {
    fn try_lock(&self) -> bool {
        self.sem.try_wait()
    }
}
