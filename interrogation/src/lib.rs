//! `interrogation` - Session registry for a two-player robot interrogation game
//!
//! An interviewer questions a suspect who may secretly be a robot. This
//! library keeps every live interview in a concurrent registry keyed by a
//! short human-typable code, drives each one through a fixed phase graph,
//! and hands out the random game material (penalties, suspect roles,
//! backgrounds, interference patterns) drawn from a YAML catalog.

pub mod allocation;
pub mod cli;
pub mod config;
pub mod error;
pub mod ids;
pub mod interference;
pub mod observability;
pub mod phase;
pub mod session;
