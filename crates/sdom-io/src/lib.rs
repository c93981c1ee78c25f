//! # sdom-io: Case-directory input loading
//!
//! Resolves the fixed set of input tables inside a case directory (file-name
//! matching is case-insensitive and separator-insensitive), parses them, and
//! assembles a validated [`sdom_core::InputBundle`].
//!
//! ```rust,no_run
//! use sdom_io::load_case;
//!
//! fn main() -> sdom_core::SdomResult<()> {
//!     let bundle = load_case(std::path::Path::new("cases/base"), 8760)?;
//!     println!("{} storage technologies", bundle.storage.len());
//!     Ok(())
//! }
//! ```
//!
//! Plant rows with missing capacity-factor or cost data are dropped with a
//! logged warning; every other schema or invariant problem fails fast with a
//! [`sdom_core::SdomError`] before any model is built.

pub mod discover;
mod loader;
pub mod tables;

pub use loader::load_case;
