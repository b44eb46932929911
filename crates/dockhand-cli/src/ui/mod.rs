//! Console output.
//!
//! Live progress goes through the [`actor`] thread; one-shot views such as
//! `plan` and `probe` render [`table`]s directly.

pub mod actor;
pub mod reporter;
pub mod table;
pub mod theme;

pub use reporter::ConsoleReporter;
