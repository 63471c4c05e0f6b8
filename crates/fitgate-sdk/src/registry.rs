//! Fault-code registry — the project's table of named fault IDs.
//!
//! Fault codes are agreed out of band between the arming harness and the
//! fault bodies; this registry is where a project writes that agreement
//! down.  Defining the table at startup (or in a build-time generated
//! function) gives the same protection the original linker-level helpers
//! enforced: a name or a code accidentally used twice is rejected on the
//! spot instead of silently aliasing two faults.
//!
//! # Example
//!
//! ```
//! use fitgate_core::FaultCode;
//! use fitgate_sdk::registry::CodeRegistry;
//!
//! let mut registry = CodeRegistry::new();
//! registry.define("DELAY_TX", FaultCode(0x1001)).unwrap();
//! registry.define("CORRUPT_CRC", FaultCode(0x1002)).unwrap();
//!
//! assert_eq!(registry.code("DELAY_TX"), Some(FaultCode(0x1001)));
//! assert_eq!(registry.name(FaultCode(0x1002)), Some("CORRUPT_CRC"));
//! ```

use fitgate_core::FaultCode;
use log::debug;
use std::collections::HashMap;
use thiserror::Error;

/// Errors from fault-code definition.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// The INVALID sentinel can never name a real fault.
    #[error("the reserved INVALID code cannot be defined")]
    ReservedCode,

    /// This name already maps to a code.
    #[error("fault name {0:?} is already defined")]
    DuplicateName(String),

    /// This code already carries a name.
    #[error("fault code {code} is already defined as {existing:?}")]
    DuplicateCode {
        code: FaultCode,
        existing: String,
    },
}

/// Bidirectional name ↔ code table with duplicate rejection.
#[derive(Debug, Default)]
pub struct CodeRegistry {
    by_name: HashMap<String, FaultCode>,
    by_code: HashMap<FaultCode, String>,
}

impl CodeRegistry {
    /// An empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Define `name` as `code`.
    ///
    /// Rejects the reserved sentinel and any name or code that is
    /// already taken.  Returns the code for inline use at definition
    /// sites.
    pub fn define(&mut self, name: &str, code: FaultCode) -> Result<FaultCode, RegistryError> {
        if !code.is_valid() {
            return Err(RegistryError::ReservedCode);
        }
        if self.by_name.contains_key(name) {
            return Err(RegistryError::DuplicateName(name.to_owned()));
        }
        if let Some(existing) = self.by_code.get(&code) {
            return Err(RegistryError::DuplicateCode {
                code,
                existing: existing.clone(),
            });
        }

        self.by_name.insert(name.to_owned(), code);
        self.by_code.insert(code, name.to_owned());
        debug!("fit: defined {name} = {code}");
        Ok(code)
    }

    /// Look up the code for `name`.
    pub fn code(&self, name: &str) -> Option<FaultCode> {
        self.by_name.get(name).copied()
    }

    /// Look up the name carried by `code`.
    pub fn name(&self, code: FaultCode) -> Option<&str> {
        self.by_code.get(&code).map(String::as_str)
    }

    /// Number of defined faults.
    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }

    /// Iterate over all defined (name, code) pairs, in no fixed order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, FaultCode)> {
        self.by_name.iter().map(|(name, code)| (name.as_str(), *code))
    }
}
