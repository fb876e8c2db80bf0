//! # bibsave Testkit
//!
//! Test utilities for bibsave.
//!
//! This crate provides:
//! - Sample databases and scratch destinations
//! - Property-based generators using proptest
//! - Golden file helpers for exact output checks
//! - An atomicity harness that fails saves part way through
//! - Fuzz targets for the formatter and the writer
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bibsave_testkit::prelude::*;
//!
//! #[test]
//! fn writes_crossref_target_first() {
//!     let text = render(&scenarios::crossref(), &SavePreferences::default());
//!     assert!(text.find("@Book{c").unwrap() < text.find("@InBook{b").unwrap());
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod atomicity;
pub mod fixtures;
pub mod fuzz;
pub mod generators;
pub mod golden;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::atomicity::*;
    pub use crate::fixtures::*;
    pub use crate::fuzz::*;
    pub use crate::generators::*;
    pub use bibsave_core::{
        Database, DatabaseContext, DatabaseWriter, Record, RecordId, SavePreferences, Selection,
        StringMacro,
    };
}

pub use atomicity::*;
pub use fixtures::*;
pub use fuzz::*;
pub use generators::*;
pub use golden::*;
