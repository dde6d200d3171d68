//! Error types for the interrogation game
//!
//! One error enum per domain (catalog configuration, session protocol,
//! random allocation) aggregated by [`InterrogationError`], which maps each
//! failure to a process exit code for the CLI.

use thiserror::Error;

use crate::phase::InterviewPhase;

pub use interrogation_core::error::{ConfigError, Severity, ValidationIssue};

// ============================================================================
// Exit Codes
// ============================================================================

/// Exit codes for CLI operations.
///
/// These codes follow Unix conventions.
pub struct ExitCode;

impl ExitCode {
    /// Successful execution
    pub const SUCCESS: i32 = 0;

    /// General error
    pub const ERROR: i32 = 1;

    /// Catalog error (invalid YAML, validation failure)
    pub const CONFIG_ERROR: i32 = 2;

    /// I/O error (file not found, permission denied)
    pub const IO_ERROR: i32 = 3;

    /// Session protocol error (unknown code, out-of-order action)
    pub const SESSION_ERROR: i32 = 5;

    /// Allocation error (sample larger than the catalog can satisfy)
    pub const ALLOCATION_ERROR: i32 = 10;

    /// Usage error (invalid arguments, missing required options)
    pub const USAGE_ERROR: i32 = 64;

    /// Interrupted by SIGINT (Ctrl+C)
    pub const INTERRUPTED: i32 = 130;

    /// Terminated by SIGTERM
    pub const TERMINATED: i32 = 143;
}

// ============================================================================
// Top-Level Error
// ============================================================================

/// Top-level error type for interrogation operations.
#[derive(Debug, Error)]
pub enum InterrogationError {
    /// Catalog loading or validation error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Session registry error
    #[error(transparent)]
    Session(#[from] SessionError),

    /// Random allocation error
    #[error(transparent)]
    Allocation(#[from] AllocationError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl InterrogationError {
    /// Returns the appropriate exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Json(_) | Self::Yaml(_) => ExitCode::CONFIG_ERROR,
            Self::Session(SessionError::Allocation(_)) | Self::Allocation(_) => {
                ExitCode::ALLOCATION_ERROR
            }
            Self::Session(_) => ExitCode::SESSION_ERROR,
            Self::Io(_) => ExitCode::IO_ERROR,
        }
    }
}

// ============================================================================
// Session Errors
// ============================================================================

/// Message shown to players when their client has drifted out of the
/// expected turn order.
pub const PLAYER_RESTART_MESSAGE: &str = "Something went wrong. Please restart the interview.";

/// Errors raised by session registry operations.
///
/// `UnexpectedPhase` and `IllegalAction` indicate the two clients have
/// diverged from the expected turn order; they are never corrected
/// silently.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The code does not name a live interview
    #[error("invalid interview ID: {0}")]
    InvalidReference(String),

    /// The interview is not in a phase that permits the operation
    #[error("interview {code} is in phase {actual}, expected {}", format_phases(expected))]
    UnexpectedPhase {
        /// Interview code
        code: String,
        /// Phases the operation accepts
        expected: Vec<InterviewPhase>,
        /// Phase the interview was actually in
        actual: InterviewPhase,
    },

    /// The request is invalid given the interview's current data
    #[error("illegal action on interview {code}: {reason}")]
    IllegalAction {
        /// Interview code
        code: String,
        /// Why the action was refused
        reason: String,
    },

    /// The catalog cannot satisfy a random allocation
    #[error(transparent)]
    Allocation(#[from] AllocationError),
}

impl SessionError {
    /// Creates an [`SessionError::IllegalAction`].
    pub fn illegal(code: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::IllegalAction {
            code: code.into(),
            reason: reason.into(),
        }
    }

    /// Returns `true` for errors caused by a client acting out of turn.
    #[must_use]
    pub const fn is_protocol_violation(&self) -> bool {
        matches!(
            self,
            Self::UnexpectedPhase { .. } | Self::IllegalAction { .. }
        )
    }

    /// Short label used for metrics and structured logs.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::InvalidReference(_) => "invalid_reference",
            Self::UnexpectedPhase { .. } => "unexpected_phase",
            Self::IllegalAction { .. } => "illegal_action",
            Self::Allocation(_) => "allocation",
        }
    }

    /// Text suitable for showing to a player.
    ///
    /// Protocol and configuration failures are not meant to occur with a
    /// correct client, so players only ever see a generic restart prompt.
    #[must_use]
    pub const fn player_message(&self) -> &'static str {
        match self {
            Self::InvalidReference(_) => "This interview no longer exists.",
            _ => PLAYER_RESTART_MESSAGE,
        }
    }
}

fn format_phases(phases: &[InterviewPhase]) -> String {
    match phases {
        [single] => single.to_string(),
        _ => {
            let names: Vec<String> = phases.iter().map(ToString::to_string).collect();
            format!("one of [{}]", names.join(", "))
        }
    }
}

// ============================================================================
// Allocation Errors
// ============================================================================

/// Random allocation failures.
///
/// Both variants point at a malformed catalog rather than bad luck.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AllocationError {
    /// More distinct values were requested than the source holds
    #[error("cannot draw {requested} distinct values from a source with only {available}")]
    Unsatisfiable {
        /// Number of values requested
        requested: usize,
        /// Number of distinct values available
        available: usize,
    },

    /// Every generated session code collided with a live session
    #[error("no free session code found after {attempts} attempts")]
    CodeSpaceExhausted {
        /// Number of candidates tried
        attempts: usize,
    },
}

// ============================================================================
// Result Type Alias
// ============================================================================

/// Result type alias for interrogation operations.
pub type Result<T> = std::result::Result<T, InterrogationError>;

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_exit_codes() {
        assert_eq!(ExitCode::SUCCESS, 0);
        assert_eq!(ExitCode::ERROR, 1);
        assert_eq!(ExitCode::CONFIG_ERROR, 2);
        assert_eq!(ExitCode::IO_ERROR, 3);
        assert_eq!(ExitCode::SESSION_ERROR, 5);
        assert_eq!(ExitCode::ALLOCATION_ERROR, 10);
        assert_eq!(ExitCode::USAGE_ERROR, 64);
        assert_eq!(ExitCode::INTERRUPTED, 130);
        assert_eq!(ExitCode::TERMINATED, 143);
    }

    #[test]
    fn test_exit_code_mapping() {
        let cases: Vec<(InterrogationError, i32)> = vec![
            (
                ConfigError::MissingFile {
                    path: PathBuf::from("/x"),
                }
                .into(),
                ExitCode::CONFIG_ERROR,
            ),
            (
                SessionError::InvalidReference("redfox".into()).into(),
                ExitCode::SESSION_ERROR,
            ),
            (
                SessionError::illegal("redfox", "nope").into(),
                ExitCode::SESSION_ERROR,
            ),
            (
                SessionError::Allocation(AllocationError::Unsatisfiable {
                    requested: 3,
                    available: 2,
                })
                .into(),
                ExitCode::ALLOCATION_ERROR,
            ),
            (
                AllocationError::CodeSpaceExhausted { attempts: 10 }.into(),
                ExitCode::ALLOCATION_ERROR,
            ),
            (
                std::io::Error::new(std::io::ErrorKind::NotFound, "x").into(),
                ExitCode::IO_ERROR,
            ),
        ];

        for (err, expected) in cases {
            assert_eq!(err.exit_code(), expected, "Wrong exit code for {err}");
        }
    }

    #[test]
    fn test_unexpected_phase_display_single() {
        let err = SessionError::UnexpectedPhase {
            code: "redfox".to_string(),
            expected: vec![InterviewPhase::InProgress],
            actual: InterviewPhase::SelectingPacket,
        };
        assert_eq!(
            err.to_string(),
            "interview redfox is in phase selecting_packet, expected in_progress"
        );
    }

    #[test]
    fn test_unexpected_phase_display_many() {
        let err = SessionError::UnexpectedPhase {
            code: "redfox".to_string(),
            expected: vec![
                InterviewPhase::SolvingInducer,
                InterviewPhase::SelectingSuspectBackground,
            ],
            actual: InterviewPhase::Finished,
        };
        assert!(
            err.to_string()
                .contains("one of [solving_inducer, selecting_suspect_background]")
        );
    }

    #[test]
    fn test_protocol_violation_classification() {
        assert!(SessionError::illegal("a", "b").is_protocol_violation());
        assert!(
            SessionError::UnexpectedPhase {
                code: "a".into(),
                expected: vec![InterviewPhase::Finished],
                actual: InterviewPhase::InProgress,
            }
            .is_protocol_violation()
        );
        assert!(!SessionError::InvalidReference("a".into()).is_protocol_violation());
    }

    #[test]
    fn test_player_message_is_generic() {
        let err = SessionError::illegal("redfox", "suspect is not a violent robot");
        assert_eq!(err.player_message(), PLAYER_RESTART_MESSAGE);
        assert!(!err.player_message().contains("violent"));
    }

    #[test]
    fn test_allocation_error_display() {
        let err = AllocationError::Unsatisfiable {
            requested: 3,
            available: 2,
        };
        assert!(err.to_string().contains('3'));
        assert!(err.to_string().contains("only 2"));
    }
}
