//! The FIT session record — data model for one fault-injection activation.
//!
//! A [`FaultSession`] is the single record describing the currently armed
//! fault: its code, its four opaque parameters, its repeat budget, and the
//! internal step countdown from which the externally visible step index is
//! derived.  At most one fault is armed at any time; everything here is a
//! fixed-size value type, suitable for interrupt context, with no
//! allocation anywhere.
//!
//! The session is pure data.  All transitions live in
//! [`FaultController`](crate::controller::FaultController).

use serde::{Deserialize, Serialize};
use std::fmt;

// ═══════════════════════════════════════════════════════════════════════
//  Sentinels
// ═══════════════════════════════════════════════════════════════════════

/// Repeat budget meaning "repeat forever — never auto-deactivate".
pub const REPEAT_FOREVER: u32 = 0;

/// Step countdown value meaning "no step sequence initialized yet".
pub const STEP_INIT: u32 = 0;

/// Step countdown value meaning "about to reset to `step_max` next round".
pub const STEP_RESET: u32 = 1;

// ═══════════════════════════════════════════════════════════════════════
//  Fault code
// ═══════════════════════════════════════════════════════════════════════

/// An opaque 32-bit fault identifier.
///
/// Codes are agreed out of band between the arming caller and the fault
/// bodies; the core only compares them for equality.  The all-ones value
/// is reserved as [`FaultCode::INVALID`], meaning "no fault armed".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FaultCode(pub u32);

impl FaultCode {
    /// Reserved sentinel: no fault armed.
    pub const INVALID: FaultCode = FaultCode(0xFFFF_FFFF);

    /// Whether this code may be armed (anything but the sentinel).
    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

impl fmt::Display for FaultCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}

impl From<u32> for FaultCode {
    fn from(raw: u32) -> Self {
        FaultCode(raw)
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Fault arguments
// ═══════════════════════════════════════════════════════════════════════

/// The four opaque 32-bit parameters supplied at activation.
///
/// Their meaning belongs entirely to the fault body (a delay in
/// milliseconds, a byte to corrupt with, an error code to force, …); the
/// core stores and hands them back, nothing more.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaultArgs {
    pub p1: u32,
    pub p2: u32,
    pub p3: u32,
    pub p4: u32,
}

impl FaultArgs {
    /// Build an argument record from the four parameters.
    pub const fn new(p1: u32, p2: u32, p3: u32, p4: u32) -> Self {
        Self { p1, p2, p3, p4 }
    }

    /// All-zero arguments, for faults that take none.
    pub const fn zeroed() -> Self {
        Self::new(0, 0, 0, 0)
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Step advance mode
// ═══════════════════════════════════════════════════════════════════════

/// Direction applied to the internal step countdown after each invocation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepAdvance {
    /// No auto-advance; the fault body moves the step itself.
    #[default]
    Manual,
    /// Default stepping: the countdown decreases, the observed index rises.
    Forward,
    /// The countdown increases, the observed index falls.
    Reverse,
}

impl StepAdvance {
    /// Signed delta applied to the countdown after each invocation.
    pub fn delta(self) -> i32 {
        match self {
            StepAdvance::Manual => 0,
            StepAdvance::Forward => -1,
            StepAdvance::Reverse => 1,
        }
    }
}

// ═══════════════════════════════════════════════════════════════════════
//  Session record
// ═══════════════════════════════════════════════════════════════════════

/// The one fault-session record.
///
/// Exactly one fault is representable at a time: [`active`](Self::active)
/// is either a real code or [`FaultCode::INVALID`].  `cached` remembers the
/// last fault that was processed at least once, which is how the controller
/// tells a first call since activation from a subsequent one, and how
/// "just completed" remains observable after auto-deactivation.
///
/// `step_index` is derived, not free: `step_index = step_max - inv_countdown`
/// once the countdown has been normalized into `[1, step_max]`.
#[derive(Debug, Clone)]
pub struct FaultSession {
    /// Currently armed fault, or [`FaultCode::INVALID`].
    pub(crate) active: FaultCode,
    /// Last fault processed at least once; invalidated on every new arm.
    pub(crate) cached: FaultCode,
    /// Parameters supplied at activation, read-only to the fault body.
    pub(crate) args: FaultArgs,
    /// Requested full completions before auto-deactivation;
    /// [`REPEAT_FOREVER`] disables the budget.
    pub(crate) repeat_target: u32,
    /// Full completions observed so far; increments regardless of the target.
    pub(crate) repeat_count: u32,
    /// Zero-based step exposed to the fault body for this invocation.
    pub(crate) step_index: u32,
    /// Declared step count for this activation; 0 if no sequence.
    pub(crate) step_max: u32,
    /// Countdown direction applied after each invocation.
    pub(crate) advance: StepAdvance,
    /// Internal countdown the step index is derived from.
    pub(crate) inv_countdown: u32,
}

impl FaultSession {
    /// A fresh session with nothing armed.
    pub const fn new() -> Self {
        Self {
            active: FaultCode::INVALID,
            cached: FaultCode::INVALID,
            args: FaultArgs::zeroed(),
            repeat_target: REPEAT_FOREVER,
            repeat_count: 0,
            step_index: 0,
            step_max: 0,
            advance: StepAdvance::Manual,
            inv_countdown: STEP_INIT,
        }
    }
}

impl Default for FaultSession {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_code_is_reserved() {
        assert!(!FaultCode::INVALID.is_valid());
        assert!(FaultCode(0).is_valid());
        assert!(FaultCode(0x1001).is_valid());
    }

    #[test]
    fn code_displays_as_hex() {
        assert_eq!(FaultCode(0x1001).to_string(), "0x00001001");
        assert_eq!(FaultCode::INVALID.to_string(), "0xffffffff");
    }

    #[test]
    fn fresh_session_is_inactive() {
        let session = FaultSession::new();
        assert_eq!(session.active, FaultCode::INVALID);
        assert_eq!(session.cached, FaultCode::INVALID);
        assert_eq!(session.inv_countdown, STEP_INIT);
        assert_eq!(session.advance, StepAdvance::Manual);
    }

    #[test]
    fn advance_deltas() {
        assert_eq!(StepAdvance::Manual.delta(), 0);
        assert_eq!(StepAdvance::Forward.delta(), -1);
        assert_eq!(StepAdvance::Reverse.delta(), 1);
    }

    #[test]
    fn args_round_trip_fields() {
        let args = FaultArgs::new(7, 8, 9, 10);
        assert_eq!((args.p1, args.p2, args.p3, args.p4), (7, 8, 9, 10));
        assert_eq!(FaultArgs::zeroed(), FaultArgs::default());
    }
}
