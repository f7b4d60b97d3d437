//! Rulewright Gatekeeper
//!
//! Accepts or rejects candidate decision-table documents before they leave
//! the compiler.
//!
//! The Gatekeeper runs its checks in a fixed order and reports the first
//! category that fails:
//! - Structure (the candidate parses and carries every required field)
//! - Unresolved slots (no `{{marker}}` survives)
//! - Static fragments (template scaffolding is reproduced unchanged)
//! - Arity (rows, cells and columns line up)
//! - Types (data types, cell values, names and operators)
//!
//! # Examples
//!
//! ```no_run
//! use rulewright_gatekeeper::{Gatekeeper, ValidationConfig};
//! use rulewright_template::SchemaTemplate;
//!
//! let template = SchemaTemplate::decision_table_v1().unwrap();
//! let gatekeeper = Gatekeeper::new(ValidationConfig::default());
//!
//! match gatekeeper.validate("{}", &template) {
//!     Ok(document) => println!("{}", document),
//!     Err(rejection) => println!("rejected: {}", rejection),
//! }
//! ```

#![warn(missing_docs)]

mod config;
mod error;
mod validator;

pub use config::ValidationConfig;
pub use error::{ValidationCategory, ValidationError};
pub use validator::{Gatekeeper, RejectionReason};
