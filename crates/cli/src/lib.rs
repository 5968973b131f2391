//! Helpers shared by the `newslens` binary.
pub mod narrow;
pub mod output;
