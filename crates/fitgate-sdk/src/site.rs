//! Guarded call sites — embedding fault checks into production code.
//!
//! A [`GuardedSite`] is the one place where production code and the FIT
//! core meet: it names a fault, optionally declares a step sequence, and
//! carries the fault body as a closure.  On every execution it asks the
//! controller whether its fault is active; if not, the body costs one
//! equality comparison and nothing else.  If it is, the site drives one
//! invocation of the stepping state machine and runs the body with a
//! [`FaultBody`] context exposing the activation parameters and the step
//! latched for this invocation.
//!
//! # Example
//!
//! ```
//! use fitgate_core::{FaultArgs, FaultCode, FaultController};
//! use fitgate_sdk::site::GuardedSite;
//!
//! const FIT_DELAY_TX: FaultCode = FaultCode(0x1001);
//!
//! let mut ctl = FaultController::new();
//! ctl.activate(FIT_DELAY_TX, FaultArgs::new(250, 0, 0, 0), 2).unwrap();
//!
//! // Inside the transmit path:
//! let fired = GuardedSite::new(FIT_DELAY_TX).run(&mut ctl, |fit| {
//!     let _delay_ms = fit.args().p1; // 250
//! });
//! assert!(fired);
//! ```

use fitgate_core::{CriticalSection, FaultArgs, FaultCode, FaultController, FitError, StepAdvance};
use log::trace;

/// A guarded location in production code, bound to one fault code.
///
/// Sites are cheap value types meant to be built inline at the call site;
/// the step declaration, if any, is re-applied on every execution, so the
/// declared shape always belongs to the site, not to stale session state.
#[derive(Debug, Clone, Copy)]
pub struct GuardedSite {
    code: FaultCode,
    steps: Option<(u32, StepAdvance)>,
}

impl GuardedSite {
    /// A site guarding `code`, with no step sequence.
    pub fn new(code: FaultCode) -> Self {
        Self { code, steps: None }
    }

    /// Declare `step_max` sub-states with default forward advance: the
    /// body observes indices `0, 1, …, step_max-1`, one per execution,
    /// and the repeat budget counts full cycles.
    pub fn steps(mut self, step_max: u32) -> Self {
        self.steps = Some((step_max, StepAdvance::Forward));
        self
    }

    /// Declare `step_max` sub-states stepped in reverse order.
    pub fn steps_reverse(mut self, step_max: u32) -> Self {
        self.steps = Some((step_max, StepAdvance::Reverse));
        self
    }

    /// Declare `step_max` sub-states the body moves through itself via
    /// [`FaultBody::next_step`] and friends.
    pub fn steps_manual(mut self, step_max: u32) -> Self {
        self.steps = Some((step_max, StepAdvance::Manual));
        self
    }

    /// Execute this site once.
    ///
    /// Returns `false` without touching anything if the site's fault is
    /// not the active one.  Otherwise declares the site's steps, drives
    /// one invocation of the controller, runs `body`, and returns `true`.
    ///
    /// The controller may auto-deactivate during this invocation (repeat
    /// budget spent); the body still runs this one last time, exactly as
    /// its guarded production path would.
    pub fn run<C, F>(&self, ctl: &mut FaultController<C>, body: F) -> bool
    where
        C: CriticalSection,
        F: FnOnce(&mut FaultBody<'_, C>),
    {
        if !ctl.is_active(self.code) {
            return false;
        }

        let first_call = !ctl.is_initialized(self.code);
        if let Some((step_max, advance)) = self.steps {
            ctl.declare_steps(step_max, advance);
        }
        ctl.process_one_invocation();
        trace!(
            "fit: site {} fired, step {}/{}",
            self.code,
            ctl.step(),
            ctl.step_max()
        );

        let mut fit = FaultBody { ctl, first_call };
        body(&mut fit);
        true
    }
}

/// Context handed to a fault body for the duration of one invocation.
///
/// Read access to the activation parameters and the latched step, plus
/// the handles a body may use to steer its own lifecycle: manual step
/// moves, early self-termination, and switching the session to a
/// different fault (mind the parameters and repeat budget when doing so).
pub struct FaultBody<'a, C: CriticalSection> {
    ctl: &'a mut FaultController<C>,
    first_call: bool,
}

impl<C: CriticalSection> FaultBody<'_, C> {
    /// The four parameters supplied at activation.
    pub fn args(&self) -> FaultArgs {
        self.ctl.args()
    }

    /// The zero-based step index for this invocation (0 without steps).
    pub fn step(&self) -> u32 {
        self.ctl.step()
    }

    /// The declared step count (0 without steps).
    pub fn step_max(&self) -> u32 {
        self.ctl.step_max()
    }

    /// Whether this is the first invocation since activation.
    pub fn is_first_call(&self) -> bool {
        self.first_call
    }

    /// Move to the next step for the following invocation.
    pub fn next_step(&mut self) {
        self.ctl.next_step();
    }

    /// Move back to the previous step for the following invocation.
    pub fn prev_step(&mut self) {
        self.ctl.prev_step();
    }

    /// Jump to step `index` for the following invocation.
    pub fn set_step(&mut self, index: u32) {
        self.ctl.set_step(index);
    }

    /// Terminate this fault early, before its repeat budget is spent.
    pub fn deactivate(&mut self) {
        self.ctl.deactivate();
    }

    /// Arm a different fault from within this body.
    ///
    /// Fails while the current fault is still active; deactivate first.
    pub fn activate(
        &mut self,
        code: FaultCode,
        args: FaultArgs,
        repeat: u32,
    ) -> Result<(), FitError> {
        self.ctl.activate(code, args, repeat)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fitgate_core::REPEAT_FOREVER;

    const FIT_A: FaultCode = FaultCode(0xA);
    const FIT_B: FaultCode = FaultCode(0xB);

    #[test]
    fn inactive_site_does_not_fire() {
        let mut ctl = FaultController::new();
        let fired = GuardedSite::new(FIT_A).run(&mut ctl, |_| {
            panic!("body must not run");
        });
        assert!(!fired);
    }

    #[test]
    fn wrong_code_does_not_fire() {
        let mut ctl = FaultController::new();
        ctl.activate(FIT_B, FaultArgs::zeroed(), 1).unwrap();
        assert!(!GuardedSite::new(FIT_A).run(&mut ctl, |_| {}));
        assert!(ctl.is_active(FIT_B));
    }

    #[test]
    fn body_sees_args_and_first_call() {
        let mut ctl = FaultController::new();
        ctl.activate(FIT_A, FaultArgs::new(1, 2, 3, 4), REPEAT_FOREVER)
            .unwrap();

        let site = GuardedSite::new(FIT_A);
        site.run(&mut ctl, |fit| {
            assert_eq!(fit.args(), FaultArgs::new(1, 2, 3, 4));
            assert!(fit.is_first_call());
            assert_eq!(fit.step(), 0);
            assert_eq!(fit.step_max(), 0);
        });
        site.run(&mut ctl, |fit| {
            assert!(!fit.is_first_call());
        });
    }

    #[test]
    fn forward_steps_observed_through_site() {
        let mut ctl = FaultController::new();
        ctl.activate(FIT_A, FaultArgs::zeroed(), 2).unwrap();

        let site = GuardedSite::new(FIT_A).steps(3);
        let mut observed = Vec::new();
        while site.run(&mut ctl, |fit| observed.push(fit.step())) {}

        // Two full cycles, then the site stops firing.
        assert_eq!(observed, [0, 1, 2, 0, 1, 2]);
        assert!(ctl.has_just_completed(FIT_A));
    }

    #[test]
    fn budget_spent_runs_body_one_last_time() {
        let mut ctl = FaultController::new();
        ctl.activate(FIT_A, FaultArgs::zeroed(), 1).unwrap();

        let mut ran = false;
        GuardedSite::new(FIT_A).run(&mut ctl, |_| ran = true);
        assert!(ran);
        assert!(!ctl.is_any_active());
    }

    #[test]
    fn manual_steps_move_only_on_request() {
        let mut ctl = FaultController::new();
        ctl.activate(FIT_A, FaultArgs::zeroed(), REPEAT_FOREVER)
            .unwrap();

        let site = GuardedSite::new(FIT_A).steps_manual(4);
        site.run(&mut ctl, |fit| assert_eq!(fit.step(), 0));
        site.run(&mut ctl, |fit| {
            assert_eq!(fit.step(), 0);
            fit.next_step();
        });
        site.run(&mut ctl, |fit| {
            assert_eq!(fit.step(), 1);
            fit.set_step(3);
        });
        site.run(&mut ctl, |fit| assert_eq!(fit.step(), 3));
    }

    #[test]
    fn reverse_steps_observed_through_site() {
        let mut ctl = FaultController::new();
        ctl.activate(FIT_A, FaultArgs::zeroed(), REPEAT_FOREVER)
            .unwrap();

        let site = GuardedSite::new(FIT_A).steps_reverse(3);
        let mut observed = Vec::new();
        for _ in 0..7 {
            site.run(&mut ctl, |fit| observed.push(fit.step()));
        }
        assert_eq!(observed, [0, 2, 1, 0, 2, 1, 0]);
    }

    #[test]
    fn body_can_switch_to_another_fault() {
        let mut ctl = FaultController::new();
        ctl.activate(FIT_A, FaultArgs::zeroed(), REPEAT_FOREVER)
            .unwrap();

        GuardedSite::new(FIT_A).run(&mut ctl, |fit| {
            assert!(fit.activate(FIT_B, FaultArgs::zeroed(), 1).is_err());
            fit.deactivate();
            fit.activate(FIT_B, FaultArgs::new(5, 0, 0, 0), 1).unwrap();
        });

        assert!(ctl.is_active(FIT_B));
        assert!(!GuardedSite::new(FIT_A).run(&mut ctl, |_| {}));
        assert!(GuardedSite::new(FIT_B).run(&mut ctl, |fit| {
            assert_eq!(fit.args().p1, 5);
        }));
    }
}
