//! Command-line interface
//!
//! Argument definitions and command handlers for the `interrogation`
//! binary.

pub mod args;
pub mod commands;
