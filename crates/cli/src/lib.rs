//! r2sync CLI library
//!
//! The `r2sync` binary and the tests both build on these modules.

pub mod commands;
pub mod exit_code;
pub mod output;
