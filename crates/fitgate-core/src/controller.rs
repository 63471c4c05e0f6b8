//! The FIT controller — activation, stepping, and repeat bookkeeping.
//!
//! [`FaultController`] owns a [`FaultSession`] and drives every transition
//! it ever undergoes: arming via [`activate`](FaultController::activate),
//! per-invocation processing via
//! [`process_one_invocation`](FaultController::process_one_invocation), and
//! disarming via [`deactivate`](FaultController::deactivate) or the repeat
//! budget running out.
//!
//! # Invocation protocol
//!
//! ```text
//! test harness          guarded call site              controller
//! ────────────          ─────────────────              ──────────
//! activate(code) ──────────────────────────────────→ arm session
//!                       is_active(code)? ──────────→ yes
//!                       declare_steps(k) ──────────→ init countdown
//!                       process_one_invocation() ──→ normalize, latch
//!                                                    step, count cycle,
//!                                                    maybe deactivate,
//!                                                    advance countdown
//!                       run fault body (args, step)
//! ```
//!
//! Mutating operations run inside the controller's
//! [`CriticalSection`](crate::critical::CriticalSection); read-only queries
//! do not take the section and are safe in the single-writer/many-reader
//! pattern, but any decision built on them must be re-validated by the next
//! mutating call.

use crate::critical::{CriticalSection, NoopSection};
use crate::session::{
    FaultArgs, FaultCode, FaultSession, StepAdvance, REPEAT_FOREVER, STEP_INIT, STEP_RESET,
};
use log::{debug, trace};
use serde::Serialize;
use thiserror::Error;

/// Errors from the FIT core.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FitError {
    /// Another activation (possibly of the same code) is in progress.
    #[error("fault {active} is already active")]
    AlreadyActive {
        /// The fault currently holding the session.
        active: FaultCode,
    },

    /// The reserved sentinel cannot be armed.
    #[error("cannot activate the reserved INVALID fault code")]
    InvalidCode,

    /// The session record is not where the embedding platform expects it.
    #[error("fault session failed the platform placement check")]
    Placement,
}

/// Owner and single write path of the fault session.
///
/// Generic over the mutual-exclusion policy `C`; the default
/// [`NoopSection`] is correct for single-threaded and interrupt-masked
/// targets, while multi-threaded embedders supply their own (see
/// [`SpinSection`](crate::critical::SpinSection)).
///
/// # Example
///
/// ```
/// use fitgate_core::{FaultArgs, FaultCode, FaultController};
///
/// let mut ctl = FaultController::new();
/// ctl.activate(FaultCode(0x1001), FaultArgs::new(7, 0, 0, 0), 3).unwrap();
///
/// for _ in 0..3 {
///     assert!(ctl.is_active(FaultCode(0x1001)));
///     ctl.process_one_invocation();
/// }
/// assert!(!ctl.is_active(FaultCode(0x1001)));
/// assert!(ctl.has_just_completed(FaultCode(0x1001)));
/// ```
#[derive(Debug)]
pub struct FaultController<C: CriticalSection = NoopSection> {
    session: FaultSession,
    section: C,
}

impl FaultController<NoopSection> {
    /// A controller with a fresh session and no-op mutual exclusion.
    pub fn new() -> Self {
        Self::with_section(NoopSection)
    }
}

impl Default for FaultController<NoopSection> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: CriticalSection> FaultController<C> {
    /// A controller bracketing mutations in the given critical section.
    pub fn with_section(section: C) -> Self {
        Self {
            session: FaultSession::new(),
            section,
        }
    }

    // ── Activation ──────────────────────────────────────────────

    /// Arm `code` with the given parameters and repeat budget.
    ///
    /// `repeat` counts full step cycles (or single invocations when no
    /// steps are declared); [`REPEAT_FOREVER`] disables auto-deactivation.
    ///
    /// Fails with [`FitError::AlreadyActive`] if any fault — this one
    /// included — currently holds the session, leaving the running
    /// activation untouched.  Only one fault is ever active at a time.
    pub fn activate(&mut self, code: FaultCode, args: FaultArgs, repeat: u32) -> Result<(), FitError> {
        if !code.is_valid() {
            return Err(FitError::InvalidCode);
        }

        let Self { session, section } = self;
        section.with(|| {
            if session.active.is_valid() {
                trace!("fit: activate {code} rejected, {} is running", session.active);
                return Err(FitError::AlreadyActive {
                    active: session.active,
                });
            }

            session.args = args;
            session.repeat_target = repeat;
            // Invalidating the cache forces first-call initialization at
            // the next processed invocation.
            session.cached = FaultCode::INVALID;
            session.active = code;
            session.step_max = 0;
            session.step_index = 0;
            session.advance = StepAdvance::Manual;
            session.inv_countdown = STEP_INIT;

            debug!("fit: activated {code} repeat={repeat}");
            Ok(())
        })
    }

    /// Disarm whatever is active.
    ///
    /// Unconditional; also reachable from within a fault body to
    /// self-terminate early or switch targets.  The cache is left alone so
    /// [`has_just_completed`](Self::has_just_completed) stays observable.
    pub fn deactivate(&mut self) {
        let Self { session, section } = self;
        section.with(|| {
            if session.active.is_valid() {
                debug!("fit: deactivated {}", session.active);
            }
            session.active = FaultCode::INVALID;
        });
    }

    // ── Queries (lock-free reads) ───────────────────────────────

    /// Whether `code` is the currently armed fault.
    pub fn is_active(&self, code: FaultCode) -> bool {
        self.session.active == code
    }

    /// Whether any fault at all is armed.
    pub fn is_any_active(&self) -> bool {
        self.session.active.is_valid()
    }

    /// Whether `code` has already run its first-call initialization.
    pub fn is_initialized(&self, code: FaultCode) -> bool {
        self.session.cached == code
    }

    /// Whether `code` is armed but has not been processed yet.
    pub fn has_just_started(&self, code: FaultCode) -> bool {
        self.is_active(code) && !self.is_initialized(code)
    }

    /// Whether `code` ran and was since deactivated, with no new fault
    /// having disturbed the cache.
    pub fn has_just_completed(&self, code: FaultCode) -> bool {
        !self.is_any_active() && self.is_initialized(code)
    }

    // ── Per-invocation state ────────────────────────────────────

    /// Parameters of the current activation.
    pub fn args(&self) -> FaultArgs {
        self.session.args
    }

    /// Zero-based step index latched for this invocation.
    pub fn step(&self) -> u32 {
        self.session.step_index
    }

    /// Declared step count for this activation (0 = no sequence).
    pub fn step_max(&self) -> u32 {
        self.session.step_max
    }

    /// Full completions observed so far for the current activation.
    pub fn repeat_count(&self) -> u32 {
        self.session.repeat_count
    }

    // ── Step declaration and manual moves ───────────────────────

    /// Declare a step sequence of `step_max` sub-states for this
    /// activation, with the given advance mode.
    ///
    /// Performed by the guarded call site before each processed
    /// invocation.  On the first call since activation the countdown is
    /// seeded to `step_max`; later calls leave it alone so the cycle
    /// continues where it left off.
    pub fn declare_steps(&mut self, step_max: u32, advance: StepAdvance) {
        let Self { session, section } = self;
        section.with(|| {
            session.step_max = step_max;
            if session.cached != session.active {
                session.inv_countdown = step_max;
            }
            session.advance = advance;
        });
    }

    /// Move the countdown one step forward (next index).
    pub fn next_step(&mut self) {
        self.bump_countdown(StepAdvance::Forward.delta());
    }

    /// Move the countdown one step backward (previous index).
    pub fn prev_step(&mut self) {
        self.bump_countdown(StepAdvance::Reverse.delta());
    }

    /// Jump directly to step `index` for the next invocation.
    pub fn set_step(&mut self, index: u32) {
        let Self { session, section } = self;
        section.with(|| {
            session.inv_countdown = session.step_max.saturating_sub(index);
        });
    }

    fn bump_countdown(&mut self, delta: i32) {
        let Self { session, section } = self;
        section.with(|| {
            session.inv_countdown = session.inv_countdown.wrapping_add_signed(delta);
        });
    }

    // ── Per-invocation processing ───────────────────────────────

    /// Advance the session by one guarded-site execution.
    ///
    /// Call exactly once per execution of a guarded call site, after
    /// confirming [`is_active`](Self::is_active).  In order:
    ///
    /// 1. first-call initialization (`repeat_count = 0`) if this fault has
    ///    not been processed since activation;
    /// 2. step normalization: the countdown is forced into
    ///    `[1, step_max]`, then the observed step index is latched as
    ///    `step_max - countdown`;
    /// 3. the cache is marked, so later calls see the fault initialized;
    /// 4. a full completion is counted when the countdown sits on the
    ///    no-steps or reset sentinel — once per whole cycle, not per step;
    /// 5. the repeat budget is checked and the fault auto-deactivated when
    ///    spent ([`REPEAT_FOREVER`] never deactivates);
    /// 6. the countdown is advanced per the declared [`StepAdvance`].
    ///
    /// A call with nothing armed is a no-op.
    pub fn process_one_invocation(&mut self) {
        let Self { session, section } = self;
        section.with(|| {
            if !session.active.is_valid() {
                return;
            }

            if session.cached != session.active {
                session.repeat_count = 0;
            }

            if session.step_max > 0 {
                if session.inv_countdown < STEP_RESET {
                    session.inv_countdown = session.step_max;
                } else if session.inv_countdown > session.step_max {
                    session.inv_countdown = STEP_RESET;
                }
                session.step_index = session.step_max - session.inv_countdown;
            } else {
                session.step_index = 0;
            }

            session.cached = session.active;

            if session.inv_countdown == STEP_INIT || session.inv_countdown == STEP_RESET {
                session.repeat_count += 1;
            }

            let spent = session.repeat_target != REPEAT_FOREVER
                && session.repeat_count >= session.repeat_target;
            if spent {
                debug!(
                    "fit: {} completed after {} repeat(s)",
                    session.active, session.repeat_count
                );
                session.active = FaultCode::INVALID;
            }

            session.inv_countdown = session
                .inv_countdown
                .wrapping_add_signed(session.advance.delta());
        });
    }

    // ── Inspection ──────────────────────────────────────────────

    /// Borrow the session record, for placement validation and debugging.
    pub fn session(&self) -> &FaultSession {
        &self.session
    }

    /// Snapshot the session for host-side inspection dumps.
    pub fn snapshot(&self) -> SessionSnapshot {
        let s = &self.session;
        SessionSnapshot {
            active: s.active,
            cached: s.cached,
            args: s.args,
            repeat_target: s.repeat_target,
            repeat_count: s.repeat_count,
            step_index: s.step_index,
            step_max: s.step_max,
            advance: s.advance,
            inv_countdown: s.inv_countdown,
        }
    }
}

/// Serializable view of the session, mirroring what the fixed-address
/// record exposed to external debug tooling on the original targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSnapshot {
    pub active: FaultCode,
    pub cached: FaultCode,
    pub args: FaultArgs,
    pub repeat_target: u32,
    pub repeat_count: u32,
    pub step_index: u32,
    pub step_max: u32,
    pub advance: StepAdvance,
    pub inv_countdown: u32,
}
