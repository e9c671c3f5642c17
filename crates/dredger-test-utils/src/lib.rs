//! Shared test utilities for the dredger workspace.
//!
//! A dev-dependency only, never published.
//!
//! # Modules
//!
//! - [`root`]: [`TestRoot`], a scratch layout with a config root and a
//!   record directory
//! - [`records`]: builders for `Configuration` records

pub mod records;
pub mod root;

pub use records::{configuration, spec};
pub use root::TestRoot;
