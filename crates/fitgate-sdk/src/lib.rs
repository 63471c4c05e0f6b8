//! Call-site layer for the fitgate fault-injection framework.
//!
//! `fitgate-core` decides whether a fault fires; this crate is how that
//! decision reaches production code.  It provides:
//!
//! 1. **[`site`]** — [`GuardedSite`](site::GuardedSite): bind a fault
//!    code and an optional step declaration to a closure, and execute it
//!    only while that fault is armed
//! 2. **[`registry`]** — [`CodeRegistry`](registry::CodeRegistry): the
//!    project's fault-ID table, with duplicate-definition rejection
//! 3. **[`prelude`]** — convenience re-exports
//!
//! # Quick start
//!
//! ```
//! use fitgate_sdk::prelude::*;
//!
//! const FIT_DROP_FRAME: FaultCode = FaultCode(0x2001);
//!
//! // Test harness side: arm the fault for two frames.
//! let mut ctl = FaultController::new();
//! ctl.activate(FIT_DROP_FRAME, FaultArgs::zeroed(), 2).unwrap();
//!
//! // Production side: the guarded transmit path.
//! let mut sent = 0;
//! for _frame in 0..5 {
//!     let dropped = GuardedSite::new(FIT_DROP_FRAME).run(&mut ctl, |_fit| {
//!         // injected behavior: skip this frame
//!     });
//!     if !dropped {
//!         sent += 1;
//!     }
//! }
//! assert_eq!(sent, 3);
//! ```

pub mod prelude;
pub mod registry;
pub mod site;
