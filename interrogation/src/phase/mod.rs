//! Interview phases
//!
//! An interview moves through a fixed, mostly linear sequence of phases
//! from pairing two connections to a final verdict.
//!
//! # Architecture
//!
//! - [`InterviewPhase`] - the authoritative phase enumeration
//! - [`Outcome`] - the verdict recorded when an interview finishes
//! - [`transition`] - the structural transition table

pub mod state;
pub mod transition;

pub use state::{InterviewPhase, Outcome};
