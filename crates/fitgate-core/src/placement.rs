//! Startup placement check for the session record.
//!
//! On the original embedded targets the session lived at a fixed memory
//! location so external debug tooling could find and read it; startup
//! verified the linker actually put it there.  Here the check is a
//! pluggable hook: the embedding platform supplies a
//! [`PlacementValidator`] and calls [`FaultController::init`] once before
//! any fault is armed.  A failed check is a fatal configuration error —
//! if the inspection tooling cannot locate the record, there is no safe
//! way to proceed with fault injection.

use crate::controller::{FaultController, FitError};
use crate::critical::CriticalSection;
use crate::session::FaultSession;
use log::{debug, warn};

/// Platform hook validating where the session record lives.
pub trait PlacementValidator {
    /// Whether the given session is at an acceptable location.
    fn validate(&self, session: &FaultSession) -> bool;
}

/// Accepts any placement.
///
/// For hosts with no inspection tooling to satisfy, e.g. unit tests.
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptAll;

impl PlacementValidator for AcceptAll {
    fn validate(&self, _session: &FaultSession) -> bool {
        true
    }
}

/// Requires the session record to sit at one exact address.
///
/// The closest analogue of the original fixed-location check.  Useful
/// when a platform pins the controller in a static and debug tooling is
/// configured with that address out of band.
#[derive(Debug, Clone, Copy)]
pub struct FixedAddressValidator {
    expected: usize,
}

impl FixedAddressValidator {
    pub fn new(expected: usize) -> Self {
        Self { expected }
    }

    /// Validator expecting the session exactly where it currently is.
    pub fn of(session: &FaultSession) -> Self {
        Self::new(session as *const FaultSession as usize)
    }
}

impl PlacementValidator for FixedAddressValidator {
    fn validate(&self, session: &FaultSession) -> bool {
        session as *const FaultSession as usize == self.expected
    }
}

impl<C: CriticalSection> FaultController<C> {
    /// One-time startup check.
    ///
    /// Runs the platform's placement validator against the session record
    /// and, on success, resets the session to the disarmed state.  Call
    /// once before arming any fault; treat [`FitError::Placement`] as
    /// fatal.
    pub fn init(&mut self, validator: &dyn PlacementValidator) -> Result<(), FitError> {
        if !validator.validate(self.session()) {
            warn!("fit: session record failed the placement check");
            return Err(FitError::Placement);
        }

        self.deactivate();
        debug!("fit: initialized, session at {:p}", self.session());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::{FaultArgs, FaultCode};

    #[test]
    fn accept_all_initializes() {
        let mut ctl = FaultController::new();
        assert!(ctl.init(&AcceptAll).is_ok());
        assert!(!ctl.is_any_active());
    }

    #[test]
    fn matching_fixed_address_passes() {
        let mut ctl = FaultController::new();
        let validator = FixedAddressValidator::of(ctl.session());
        assert!(ctl.init(&validator).is_ok());
    }

    #[test]
    fn mismatched_fixed_address_is_fatal() {
        let mut ctl = FaultController::new();
        let elsewhere = FaultSession::new();
        let validator = FixedAddressValidator::of(&elsewhere);
        assert_eq!(ctl.init(&validator), Err(FitError::Placement));
    }

    #[test]
    fn init_disarms_a_stale_session() {
        let mut ctl = FaultController::new();
        ctl.activate(FaultCode(0x3003), FaultArgs::zeroed(), 1)
            .unwrap();

        ctl.init(&AcceptAll).unwrap();
        assert!(!ctl.is_any_active());
    }
}
