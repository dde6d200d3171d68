//! Interrogation Core - shared catalog schema and configuration errors
//!
//! This crate provides the content catalog types and error types shared
//! between the `interrogation` library (registry and CLI) and anything
//! else that needs to read or author a game catalog.

pub mod config;
pub mod error;
