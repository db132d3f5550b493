//! Declarations for the pthread extensions that `libc` does not expose on
//! every target we build for.

#![allow(non_camel_case_types)]

use libc::{c_int, pthread_mutexattr_t, pthread_rwlockattr_t};

pub const PTHREAD_PRIO_NONE: c_int = 0;
pub const PTHREAD_PRIO_INHERIT: c_int = 1;
pub const PTHREAD_PRIO_PROTECT: c_int = 2;

#[cfg(target_vendor = "apple")]
pub const PTHREAD_MUTEX_POLICY_FAIRSHARE_NP: c_int = 1;
#[cfg(target_vendor = "apple")]
pub const PTHREAD_MUTEX_POLICY_FIRSTFIT_NP: c_int = 3;

#[cfg(all(target_os = "linux", target_env = "gnu"))]
pub const PTHREAD_RWLOCK_PREFER_READER_NP: c_int = 0;
#[cfg(all(target_os = "linux", target_env = "gnu"))]
pub const PTHREAD_RWLOCK_PREFER_WRITER_NONRECURSIVE_NP: c_int = 2;

extern "C" {
    pub fn pthread_rwlockattr_setpshared(attr: *mut pthread_rwlockattr_t,
                                         pshared: c_int) -> c_int;
}

#[cfg(any(all(target_os = "linux", target_env = "gnu"),
          target_vendor = "apple",
          target_os = "freebsd"))]
extern "C" {
    pub fn pthread_mutexattr_setprotocol(attr: *mut pthread_mutexattr_t,
                                         protocol: c_int) -> c_int;
    pub fn pthread_mutexattr_setprioceiling(attr: *mut pthread_mutexattr_t,
                                            prioceiling: c_int) -> c_int;
}

#[cfg(target_vendor = "apple")]
extern "C" {
    pub fn pthread_mutexattr_setpolicy_np(attr: *mut pthread_mutexattr_t,
                                          policy: c_int) -> c_int;
}

#[cfg(all(target_os = "linux", target_env = "gnu"))]
extern "C" {
    pub fn pthread_rwlockattr_setkind_np(attr: *mut pthread_rwlockattr_t,
                                         pref: c_int) -> c_int;
}
