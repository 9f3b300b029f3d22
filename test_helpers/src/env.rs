//! RAII environment-variable guards for tests.
//!
//! The process environment is global, so every mutation goes through one
//! `parking_lot` mutex and returns a guard that restores the prior value on
//! drop (removing the variable if it was previously absent). Tests touching
//! several variables, or reading variables another test might set, should
//! hold [`lock`] for their whole body.

use std::env;
use std::ffi::OsString;
use std::sync::LazyLock;

use parking_lot::{ReentrantMutex, ReentrantMutexGuard};

static ENV_MUTEX: LazyLock<ReentrantMutex<()>> = LazyLock::new(ReentrantMutex::default);

/// Guard restoring an environment variable to its prior value on drop.
#[must_use = "dropping restores the prior value"]
pub struct EnvVarGuard {
    key: String,
    original: Option<OsString>,
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        let _held = ENV_MUTEX.lock();
        match self.original.take() {
            // SAFETY: the mutation happens while `ENV_MUTEX` is held.
            Some(value) => unsafe { env::set_var(&self.key, value) },
            // SAFETY: as above.
            None => unsafe { env::remove_var(&self.key) },
        }
    }
}

/// Guard that serialises environment access for its lifetime.
#[must_use = "dropping releases the environment lock"]
pub struct EnvLock {
    _held: ReentrantMutexGuard<'static, ()>,
}

/// Acquires the global environment lock for the lifetime of the guard.
pub fn lock() -> EnvLock {
    EnvLock {
        _held: ENV_MUTEX.lock(),
    }
}

/// Sets an environment variable, returning a guard that restores the prior
/// value on drop.
pub fn set_var(key: &str, value: &str) -> EnvVarGuard {
    let _held = ENV_MUTEX.lock();
    let original = env::var_os(key);
    // SAFETY: the mutation happens while `ENV_MUTEX` is held.
    unsafe { env::set_var(key, value) };
    EnvVarGuard {
        key: key.to_owned(),
        original,
    }
}

/// Removes an environment variable, returning a guard that restores the
/// prior value on drop.
pub fn remove_var(key: &str) -> EnvVarGuard {
    let _held = ENV_MUTEX.lock();
    let original = env::var_os(key);
    // SAFETY: the mutation happens while `ENV_MUTEX` is held.
    unsafe { env::remove_var(key) };
    EnvVarGuard {
        key: key.to_owned(),
        original,
    }
}
