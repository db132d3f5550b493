//! Attribute blocks.
//!
//! An attribute block only lives for the duration of a constructor: it is
//! initialized, has options written into it, is consumed by the matching
//! `pthread_*_init` call and is destroyed when the guard drops. The guards
//! borrow their storage so the block never moves once initialized.

use std::mem::MaybeUninit;

use libc::c_int;

use super::ffi;

macro_rules! attr_block {
    ($(#[$meta:meta])* $name:ident, $raw:ty, $init:path, $destroy:path) => {
        $(#[$meta])*
        pub struct $name<'a>(&'a mut MaybeUninit<$raw>);

        impl<'a> $name<'a> {
            /// Initializes the block in `storage`, returning the failing
            /// status if the platform refuses.
            pub fn init(storage: &'a mut MaybeUninit<$raw>) -> Result<$name<'a>, c_int> {
                match unsafe { $init(storage.as_mut_ptr()) } {
                    0 => Ok($name(storage)),
                    code => Err(code),
                }
            }

            #[inline]
            pub fn as_ptr(&self) -> *const $raw {
                self.0.as_ptr()
            }

            #[inline]
            fn as_mut_ptr(&mut self) -> *mut $raw {
                self.0.as_mut_ptr()
            }
        }

        impl Drop for $name<'_> {
            fn drop(&mut self) {
                let r = unsafe { $destroy(self.as_mut_ptr()) };
                debug_assert_eq!(r, 0);
            }
        }
    };
}

attr_block!(
    /// A `pthread_mutexattr_t` scoped to a mutex constructor.
    MutexAttr,
    libc::pthread_mutexattr_t,
    libc::pthread_mutexattr_init,
    libc::pthread_mutexattr_destroy
);

attr_block!(
    /// A `pthread_condattr_t` scoped to a condition variable constructor.
    CondAttr,
    libc::pthread_condattr_t,
    libc::pthread_condattr_init,
    libc::pthread_condattr_destroy
);

attr_block!(
    /// A `pthread_rwlockattr_t` scoped to a rwlock constructor.
    RwLockAttr,
    libc::pthread_rwlockattr_t,
    libc::pthread_rwlockattr_init,
    libc::pthread_rwlockattr_destroy
);

/// Value written for the process-shared attribute.
fn pshared(shared: bool) -> c_int {
    if shared {
        libc::PTHREAD_PROCESS_SHARED
    } else {
        libc::PTHREAD_PROCESS_PRIVATE
    }
}

impl MutexAttr<'_> {
    pub fn set_type(&mut self, kind: c_int) -> c_int {
        unsafe { libc::pthread_mutexattr_settype(self.as_mut_ptr(), kind) }
    }

    pub fn set_pshared(&mut self, shared: bool) -> c_int {
        unsafe { libc::pthread_mutexattr_setpshared(self.as_mut_ptr(), pshared(shared)) }
    }

    /// Returns `ENOTSUP` where the platform has no fairness policy knob.
    pub fn set_fair(&mut self, fair: bool) -> c_int {
        #[cfg(target_vendor = "apple")]
        {
            let policy = if fair {
                ffi::PTHREAD_MUTEX_POLICY_FAIRSHARE_NP
            } else {
                ffi::PTHREAD_MUTEX_POLICY_FIRSTFIT_NP
            };
            unsafe { ffi::pthread_mutexattr_setpolicy_np(self.as_mut_ptr(), policy) }
        }
        #[cfg(not(target_vendor = "apple"))]
        {
            let _ = fair;
            libc::ENOTSUP
        }
    }

    #[cfg(any(all(target_os = "linux", target_env = "gnu"),
              target_vendor = "apple",
              target_os = "freebsd"))]
    pub fn set_protocol(&mut self, protocol: c_int) -> c_int {
        unsafe { ffi::pthread_mutexattr_setprotocol(self.as_mut_ptr(), protocol) }
    }

    #[cfg(not(any(all(target_os = "linux", target_env = "gnu"),
                  target_vendor = "apple",
                  target_os = "freebsd")))]
    pub fn set_protocol(&mut self, _protocol: c_int) -> c_int {
        libc::ENOTSUP
    }

    #[cfg(any(all(target_os = "linux", target_env = "gnu"),
              target_vendor = "apple",
              target_os = "freebsd"))]
    pub fn set_prioceiling(&mut self, ceiling: c_int) -> c_int {
        unsafe { ffi::pthread_mutexattr_setprioceiling(self.as_mut_ptr(), ceiling) }
    }

    #[cfg(not(any(all(target_os = "linux", target_env = "gnu"),
                  target_vendor = "apple",
                  target_os = "freebsd")))]
    pub fn set_prioceiling(&mut self, _ceiling: c_int) -> c_int {
        libc::ENOTSUP
    }
}

impl CondAttr<'_> {
    pub fn set_pshared(&mut self, shared: bool) -> c_int {
        unsafe { libc::pthread_condattr_setpshared(self.as_mut_ptr(), pshared(shared)) }
    }
}

impl RwLockAttr<'_> {
    pub fn set_pshared(&mut self, shared: bool) -> c_int {
        unsafe { ffi::pthread_rwlockattr_setpshared(self.as_mut_ptr(), pshared(shared)) }
    }

    /// Selects writer preference. Platforms other than glibc are already
    /// writer-preferring and only accept `true`.
    pub fn set_prefer_writer(&mut self, prefer: bool) -> c_int {
        #[cfg(all(target_os = "linux", target_env = "gnu"))]
        {
            let kind = if prefer {
                ffi::PTHREAD_RWLOCK_PREFER_WRITER_NONRECURSIVE_NP
            } else {
                ffi::PTHREAD_RWLOCK_PREFER_READER_NP
            };
            unsafe { ffi::pthread_rwlockattr_setkind_np(self.as_mut_ptr(), kind) }
        }
        #[cfg(not(all(target_os = "linux", target_env = "gnu")))]
        {
            if prefer { 0 } else { libc::ENOTSUP }
        }
    }
}

/// Reports an attribute the platform would not accept. The block keeps its
/// default for that attribute and construction carries on.
pub(crate) fn forward(primitive: &'static str, attribute: &'static str, status: c_int) {
    if status != 0 {
        tracing::warn!(
            primitive,
            attribute,
            code = status,
            error = %std::io::Error::from_raw_os_error(status),
            "attribute rejected by the platform; keeping its default",
        );
    }
}
