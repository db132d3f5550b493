use std::fmt;
use std::mem::MaybeUninit;
use std::time::SystemTime;

use crate::config::Configurable;
use crate::error::{cvt, Error, Result};
use crate::mutex::Mutex;
use crate::sys::{self, attr::forward, condvar::abstime};

/// Options for constructing a `Condvar`. Unset fields keep the platform
/// default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CondvarConfig {
    pub process_shared: Option<bool>,
}

impl CondvarConfig {
    pub fn new() -> CondvarConfig {
        CondvarConfig::default()
    }

    pub fn process_shared(mut self, shared: bool) -> CondvarConfig {
        self.process_shared = Some(shared);
        self
    }
}

/// A condition variable backed by `pthread_cond_t`.
///
/// The condition variable does not own a mutex; the [`Mutex`] to release
/// while blocked is passed to every wait. Wake-ups may be spurious, so waits
/// belong in a loop that re-checks the predicate:
///
/// ```rust
/// use std::sync::atomic::{AtomicBool, Ordering};
/// use std::thread;
/// use native_sync::{Condvar, Mutex};
///
/// let m = Mutex::new();
/// let cv = Condvar::new();
/// let ready = AtomicBool::new(false);
///
/// thread::scope(|s| {
///     s.spawn(|| {
///         m.lock();
///         ready.store(true, Ordering::Relaxed);
///         cv.signal();
///         unsafe { m.unlock() };
///     });
///
///     m.lock();
///     while !ready.load(Ordering::Relaxed) {
///         unsafe { cv.wait(&m) };
///     }
///     unsafe { m.unlock() };
/// });
/// ```
pub struct Condvar {
    inner: Box<sys::Condvar>,
}

impl Condvar {
    /// Creates a condition variable with the platform's default attributes.
    pub fn new() -> Condvar {
        Condvar::with_config(CondvarConfig::default())
    }

    /// Creates a condition variable from `config`.
    ///
    /// # Panics
    ///
    /// Panics if the platform cannot initialize the attribute block or the
    /// condition variable itself.
    pub fn with_config(config: CondvarConfig) -> Condvar {
        let mut inner = Box::new(sys::Condvar::new());
        let mut storage = MaybeUninit::uninit();
        let mut attr = sys::CondAttr::init(&mut storage)
            .unwrap_or_else(|code| sys::setup_failed("pthread_condattr_init", code));
        if let Some(shared) = config.process_shared {
            forward("condvar", "pshared", attr.set_pshared(shared));
        }
        match unsafe { inner.init(&attr) } {
            0 => {}
            code => sys::setup_failed("pthread_cond_init", code),
        }
        drop(attr);
        tracing::trace!(?config, "initialized condvar");
        Condvar { inner }
    }

    /// Atomically releases `mutex` and blocks until this condition variable
    /// is signaled, then re-acquires `mutex` before returning.
    ///
    /// A signal sent by a thread that acquired `mutex` after this thread
    /// released it is never lost. The wait may also end spuriously.
    ///
    /// # Safety
    ///
    /// The calling thread must hold `mutex`, and every thread waiting on this
    /// condition variable at the same time must use that same mutex.
    #[inline]
    pub unsafe fn wait(&self, mutex: &Mutex) {
        let r = self.inner.wait(mutex.raw());
        debug_assert_eq!(r, 0);
    }

    /// Like `wait`, but gives up once the wall clock reaches `deadline`.
    ///
    /// Returns `false` if the deadline passed before a wake-up, including
    /// when it had already passed at the time of the call (the platform wait
    /// is not entered in that case). `mutex` is held again on return either
    /// way.
    ///
    /// # Safety
    ///
    /// Same as [`wait`](Condvar::wait).
    pub unsafe fn wait_until(&self, deadline: SystemTime, mutex: &Mutex) -> bool {
        let Some(ts) = abstime(deadline) else {
            return false;
        };
        let r = self.inner.wait_until(mutex.raw(), &ts);
        debug_assert!(r == 0 || r == libc::ETIMEDOUT, "pthread_cond_timedwait: {r}");
        r == 0
    }

    /// Wakes at least one thread blocked on this condition variable. Does
    /// nothing if none are.
    #[inline]
    pub fn signal(&self) {
        let r = unsafe { self.inner.signal() };
        debug_assert_eq!(r, 0);
    }

    /// Wakes every thread currently blocked on this condition variable.
    #[inline]
    pub fn broadcast(&self) {
        let r = unsafe { self.inner.broadcast() };
        debug_assert_eq!(r, 0);
    }

    /// Like `wait`, but reports any failure from the platform.
    ///
    /// # Safety
    ///
    /// Same as [`wait`](Condvar::wait). An error-checking mutex that is not
    /// held makes the platform report `EPERM` rather than misbehave.
    #[inline]
    pub unsafe fn wait_checked(&self, mutex: &Mutex) -> Result<()> {
        cvt(self.inner.wait(mutex.raw()))
    }

    /// Like `wait_until`, but reports why the wait ended early.
    ///
    /// A deadline that already passed, or that the platform cannot express,
    /// fails with [`Error::InvalidDeadline`] before anything blocks. A
    /// deadline that passes while waiting fails with `ETIMEDOUT` (see
    /// [`Error::is_timeout`]); `mutex` is held again in that case.
    ///
    /// # Safety
    ///
    /// Same as [`wait`](Condvar::wait).
    pub unsafe fn wait_until_checked(&self, deadline: SystemTime, mutex: &Mutex) -> Result<()> {
        let ts = abstime(deadline).ok_or(Error::InvalidDeadline)?;
        cvt(self.inner.wait_until(mutex.raw(), &ts))
    }

    #[inline]
    pub fn signal_checked(&self) -> Result<()> {
        cvt(unsafe { self.inner.signal() })
    }

    #[inline]
    pub fn broadcast_checked(&self) -> Result<()> {
        cvt(unsafe { self.inner.broadcast() })
    }
}

impl Default for Condvar {
    fn default() -> Condvar {
        Condvar::new()
    }
}

impl fmt::Debug for Condvar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Condvar").finish_non_exhaustive()
    }
}

impl Drop for Condvar {
    fn drop(&mut self) {
        let r = unsafe { self.inner.destroy() };
        debug_assert_eq!(r, 0);
        tracing::trace!("destroyed condvar");
    }
}

impl Configurable for Condvar {
    type Config = CondvarConfig;

    fn with_config(config: CondvarConfig) -> Condvar {
        Condvar::with_config(config)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::thread;
    use std::time::{Duration, Instant, SystemTime};

    use super::{Condvar, CondvarConfig};
    use crate::test_util::{trace_init, STEP, TOLERANCE};
    use crate::{Configurable, Error, Mutex, MutexConfig, MutexKind};

    #[test]
    fn smoke() {
        let _trace = trace_init();
        let c = Condvar::new();
        c.signal();
        c.broadcast();
        c.signal_checked().unwrap();
        c.broadcast_checked().unwrap();
    }

    #[test]
    fn configured() {
        let _trace = trace_init();
        let c = Condvar::configure(|c| c.process_shared = Some(false));
        c.signal();
        let c = Condvar::with_config(CondvarConfig::new().process_shared(true));
        c.broadcast();
    }

    fn wakes_waiter(broadcast: bool) {
        let _trace = trace_init();
        let m = Mutex::new();
        let c = Condvar::new();
        let ready = AtomicBool::new(false);

        let start = Instant::now();
        thread::scope(|s| {
            s.spawn(|| {
                thread::sleep(STEP);
                m.lock();
                ready.store(true, Ordering::Relaxed);
                if broadcast {
                    c.broadcast();
                } else {
                    c.signal();
                }
                unsafe { m.unlock() };
            });

            m.lock();
            while !ready.load(Ordering::Relaxed) {
                unsafe { c.wait(&m) };
            }
            unsafe { m.unlock() };
        });
        let waited = start.elapsed();
        assert!(waited >= STEP - TOLERANCE, "woke after {waited:?}");
        assert!(waited <= STEP + TOLERANCE, "woke after {waited:?}");
    }

    #[test]
    fn signal() {
        wakes_waiter(false);
    }

    #[test]
    fn broadcast() {
        wakes_waiter(true);
    }

    #[test]
    fn broadcast_wakes_everyone() {
        const N: usize = 4;

        let _trace = trace_init();
        let m = Mutex::new();
        let c = Condvar::new();
        let go = AtomicBool::new(false);
        let waiting = AtomicUsize::new(0);

        thread::scope(|s| {
            for _ in 0..N {
                s.spawn(|| {
                    m.lock();
                    waiting.fetch_add(1, Ordering::SeqCst);
                    while !go.load(Ordering::Relaxed) {
                        unsafe { c.wait_checked(&m).unwrap() };
                    }
                    unsafe { m.unlock() };
                });
            }
            while waiting.load(Ordering::SeqCst) < N {
                thread::yield_now();
            }
            m.lock();
            go.store(true, Ordering::Relaxed);
            c.broadcast_checked().unwrap();
            unsafe { m.unlock() };
        });
    }

    #[test]
    fn wait_until_times_out() {
        let _trace = trace_init();
        let m = Mutex::new();
        let c = Condvar::new();
        let limit = Duration::from_millis(300);

        m.lock();
        let start = Instant::now();
        assert!(!unsafe { c.wait_until(SystemTime::now() + limit, &m) });
        let waited = start.elapsed();
        assert!(waited >= limit - TOLERANCE, "gave up after {waited:?}");
        assert!(waited <= limit + TOLERANCE, "gave up after {waited:?}");

        // still ours
        assert!(!m.try_lock());
        thread::scope(|s| {
            s.spawn(|| assert!(!m.try_lock()));
        });
        unsafe { m.unlock() };
    }

    #[test]
    fn wait_until_checked_times_out() {
        let _trace = trace_init();
        let m = Mutex::with_config(MutexConfig::new().kind(MutexKind::ErrorCheck));
        let c = Condvar::new();

        m.lock();
        let err = unsafe { c.wait_until_checked(SystemTime::now() + Duration::from_millis(50), &m) }
            .unwrap_err();
        assert!(err.is_timeout(), "{err}");
        // the error-checking mutex knows we hold it again
        assert!(m.lock_checked().unwrap_err().is_deadlock());
        unsafe { m.unlock_checked().unwrap() };
    }

    #[test]
    fn wait_until_signaled() {
        let _trace = trace_init();
        let m = Mutex::new();
        let c = Condvar::new();
        let ready = AtomicBool::new(false);

        thread::scope(|s| {
            m.lock();
            s.spawn(|| {
                m.lock();
                ready.store(true, Ordering::Relaxed);
                c.signal();
                unsafe { m.unlock() };
            });
            let deadline = SystemTime::now() + Duration::from_secs(60 * 60 * 24);
            while !ready.load(Ordering::Relaxed) {
                assert!(unsafe { c.wait_until(deadline, &m) } || ready.load(Ordering::Relaxed));
            }
            unsafe { m.unlock() };
        });
    }

    #[test]
    fn past_deadline_never_blocks() {
        let _trace = trace_init();
        let m = Mutex::new();
        let c = Condvar::new();
        let past = SystemTime::now() - Duration::from_secs(1);

        m.lock();
        let start = Instant::now();
        assert!(!unsafe { c.wait_until(past, &m) });
        assert_eq!(unsafe { c.wait_until_checked(past, &m) }, Err(Error::InvalidDeadline));
        assert!(start.elapsed() < TOLERANCE);
        unsafe { m.unlock() };
    }
}
