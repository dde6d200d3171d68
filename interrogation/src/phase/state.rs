//! Phase and outcome enumerations.

use serde::{Deserialize, Serialize};

/// The step an interview is currently at.
///
/// Variants are declared in play order; `Ord` follows that order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewPhase {
    /// Waiting for the second participant to connect
    WaitingForConnections,
    /// Participants choose who interviews and who is the suspect
    SelectingPositions,
    /// The interviewer chooses among the offered penalties
    SelectingPenaltyInterviewer,
    /// The suspect chooses among the offered penalties
    SelectingPenaltySuspect,
    /// Both participants calibrate the chosen penalty
    CalibratingPenalty,
    /// The interviewer picks a packet
    SelectingPacket,
    /// The interviewer asks the inducer question
    PromptingInducer,
    /// The suspect decodes the interference pattern
    SolvingInducer,
    /// The suspect picks a background
    SelectingSuspectBackground,
    /// Setup complete, waiting for the interviewer to start the clock
    ReadyToStart,
    /// The interview clock is running
    InProgress,
    /// A verdict has been reached
    Finished,
}

impl InterviewPhase {
    /// Every phase, in play order.
    pub const ALL: [Self; 12] = [
        Self::WaitingForConnections,
        Self::SelectingPositions,
        Self::SelectingPenaltyInterviewer,
        Self::SelectingPenaltySuspect,
        Self::CalibratingPenalty,
        Self::SelectingPacket,
        Self::PromptingInducer,
        Self::SolvingInducer,
        Self::SelectingSuspectBackground,
        Self::ReadyToStart,
        Self::InProgress,
        Self::Finished,
    ];

    /// Returns `true` once no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Finished)
    }

    /// Returns the `snake_case` name used in logs and serialized output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::WaitingForConnections => "waiting_for_connections",
            Self::SelectingPositions => "selecting_positions",
            Self::SelectingPenaltyInterviewer => "selecting_penalty_interviewer",
            Self::SelectingPenaltySuspect => "selecting_penalty_suspect",
            Self::CalibratingPenalty => "calibrating_penalty",
            Self::SelectingPacket => "selecting_packet",
            Self::PromptingInducer => "prompting_inducer",
            Self::SolvingInducer => "solving_inducer",
            Self::SelectingSuspectBackground => "selecting_suspect_background",
            Self::ReadyToStart => "ready_to_start",
            Self::InProgress => "in_progress",
            Self::Finished => "finished",
        }
    }
}

impl std::fmt::Display for InterviewPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Verdict recorded when an interview reaches [`InterviewPhase::Finished`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// Interviewer said robot, suspect was a robot
    CorrectlyGuessedRobot,
    /// Interviewer said robot, suspect was human
    WronglyGuessedRobot,
    /// Interviewer said human, suspect was human
    CorrectlyGuessedHuman,
    /// Interviewer said human, suspect was a robot
    WronglyGuessedHuman,
    /// A violent robot killed the interviewer
    KilledInterviewer,
}

impl Outcome {
    /// Every outcome.
    pub const ALL: [Self; 5] = [
        Self::CorrectlyGuessedRobot,
        Self::WronglyGuessedRobot,
        Self::CorrectlyGuessedHuman,
        Self::WronglyGuessedHuman,
        Self::KilledInterviewer,
    ];

    /// Maps the interviewer's guess and the suspect's true nature to a verdict.
    #[must_use]
    pub const fn from_guess(guessed_is_robot: bool, actually_human: bool) -> Self {
        match (guessed_is_robot, actually_human) {
            (true, true) => Self::WronglyGuessedRobot,
            (true, false) => Self::CorrectlyGuessedRobot,
            (false, true) => Self::CorrectlyGuessedHuman,
            (false, false) => Self::WronglyGuessedHuman,
        }
    }

    /// Returns `true` when the interviewer identified the suspect correctly.
    #[must_use]
    pub const fn interviewer_won(self) -> bool {
        matches!(
            self,
            Self::CorrectlyGuessedRobot | Self::CorrectlyGuessedHuman
        )
    }

    /// Returns the `snake_case` name used in logs and metrics labels.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::CorrectlyGuessedRobot => "correctly_guessed_robot",
            Self::WronglyGuessedRobot => "wrongly_guessed_robot",
            Self::CorrectlyGuessedHuman => "correctly_guessed_human",
            Self::WronglyGuessedHuman => "wrongly_guessed_human",
            Self::KilledInterviewer => "killed_interviewer",
        }
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
