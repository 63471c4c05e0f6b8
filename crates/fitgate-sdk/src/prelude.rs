//! One-stop imports for test harnesses and guarded production code.
//!
//! ```
//! use fitgate_sdk::prelude::*;
//!
//! let mut ctl = FaultController::new();
//! ctl.activate(FaultCode(0x1001), FaultArgs::zeroed(), 1).unwrap();
//! GuardedSite::new(FaultCode(0x1001)).run(&mut ctl, |_fit| {});
//! ```

pub use crate::registry::{CodeRegistry, RegistryError};
pub use crate::site::{FaultBody, GuardedSite};
pub use fitgate_core::{
    FaultArgs, FaultCode, FaultController, FitError, StepAdvance, REPEAT_FOREVER,
};
