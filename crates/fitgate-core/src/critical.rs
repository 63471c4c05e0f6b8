//! Pluggable mutual exclusion for session mutations.
//!
//! The controller never picks a locking mechanism itself; the embedding
//! platform does.  On a bare-metal target the section is typically
//! "mask interrupts", on a test host it can be a spinlock, and on a
//! single-threaded target it is nothing at all.  The controller only
//! guarantees that every mutating operation runs bracketed in
//! [`CriticalSection::with`].

use std::sync::atomic::{AtomicBool, Ordering};

/// A mutual-exclusion bracket around one mutating operation.
///
/// Implementations must make `with` mutually exclusive against itself
/// across whatever contexts can reach the same controller.
pub trait CriticalSection {
    /// Run `f` inside the section and hand back its result.
    fn with<R>(&self, f: impl FnOnce() -> R) -> R;
}

/// No exclusion at all.
///
/// Correct when all guarded call sites and activation callers share one
/// thread, or when the platform masks interrupts around FIT use by other
/// means.  This is the default; multi-threaded embedders must supply a
/// real section instead.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopSection;

impl CriticalSection for NoopSection {
    fn with<R>(&self, f: impl FnOnce() -> R) -> R {
        f()
    }
}

/// Busy-wait test-and-set section for multi-threaded hosts.
///
/// Sections in this system are a handful of field writes, so spinning is
/// cheaper than parking.  Not re-entrant: a fault body must not call back
/// into a mutating controller operation through the same section.
#[derive(Debug, Default)]
pub struct SpinSection {
    locked: AtomicBool,
}

impl SpinSection {
    pub const fn new() -> Self {
        Self {
            locked: AtomicBool::new(false),
        }
    }
}

impl CriticalSection for SpinSection {
    fn with<R>(&self, f: impl FnOnce() -> R) -> R {
        while self
            .locked
            .compare_exchange_weak(false, true, Ordering::Acquire, Ordering::Relaxed)
            .is_err()
        {
            std::hint::spin_loop();
        }
        let out = f();
        self.locked.store(false, Ordering::Release);
        out
    }
}
