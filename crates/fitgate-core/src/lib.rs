//! Core fault-injection test (FIT) state machine for embedded software.
//!
//! This crate decides *whether* and *at which step* a fault's body should
//! run on a given invocation — never what the fault does.  Test code arms
//! exactly one named fault at a time, with four opaque parameters and a
//! repeat budget; every guarded call site then asks the controller whether
//! its fault is active and, if so, drives one invocation of the
//! activation/stepping state machine.
//!
//! Three pieces:
//!
//! 1. **[`session`]** — the [`FaultSession`] record: active/cached codes,
//!    parameters, repeat bookkeeping, and the step countdown
//! 2. **[`controller`]** — [`FaultController`]: activate, deactivate,
//!    status queries, and per-invocation step/repeat processing
//! 3. **[`critical`] / [`placement`]** — the two pluggable platform
//!    policies: mutual exclusion around mutations and the startup
//!    placement check
//!
//! # Architecture
//!
//! ```text
//! test harness            guarded call site           FaultController
//! ────────────            ─────────────────           ───────────────
//! activate(code, args, n) ─────────────────────────→ arm session
//!                         is_active(code)? ────────→ equality check
//!                         process_one_invocation() ─→ step + repeat
//!                         body(args, step)            bookkeeping,
//!                                                     auto-deactivate
//! ```
//!
//! The higher-level guarded-site builder and the fault-code registry live
//! in `fitgate-sdk`; this crate is complete on its own for harnesses that
//! want to drive the protocol directly.
//!
//! # The process-wide session
//!
//! The core API works on explicitly owned controllers so tests can run
//! isolated sessions side by side.  For embeddings that want the classic
//! single process-wide record, [`global`] offers one behind a `Mutex`.

pub mod controller;
pub mod critical;
pub mod placement;
pub mod session;

pub use controller::{FaultController, FitError, SessionSnapshot};
pub use critical::{CriticalSection, NoopSection, SpinSection};
pub use placement::{AcceptAll, FixedAddressValidator, PlacementValidator};
pub use session::{
    FaultArgs, FaultCode, FaultSession, StepAdvance, REPEAT_FOREVER, STEP_INIT, STEP_RESET,
};

use std::sync::{Mutex, OnceLock};

static GLOBAL: OnceLock<Mutex<FaultController>> = OnceLock::new();

/// The process-wide default controller.
///
/// Compatibility surface for embeddings built around one shared session;
/// the `Mutex` is the critical section, so the controller inside uses
/// [`NoopSection`].  Prefer owning a [`FaultController`] directly — it
/// keeps tests independent and queries lock-free.
///
/// # Example
///
/// ```
/// use fitgate_core::{global, FaultArgs, FaultCode};
///
/// let mut ctl = global().lock().unwrap();
/// if ctl.activate(FaultCode(0x4004), FaultArgs::zeroed(), 1).is_ok() {
///     ctl.process_one_invocation();
/// }
/// ctl.deactivate();
/// ```
pub fn global() -> &'static Mutex<FaultController> {
    GLOBAL.get_or_init(|| Mutex::new(FaultController::new()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn global_is_one_shared_controller() {
        let first = global() as *const _;
        let second = global() as *const _;
        assert_eq!(first, second);
    }

    #[test]
    fn global_controller_runs_the_protocol() {
        let mut ctl = global().lock().unwrap();
        ctl.deactivate(); // other tests may share the process

        ctl.activate(FaultCode(0x9009), FaultArgs::zeroed(), 1)
            .unwrap();
        ctl.process_one_invocation();
        assert!(ctl.has_just_completed(FaultCode(0x9009)));
    }
}
