//! Structural phase transition table.
//!
//! Lists which phase may follow which through a generic advance. Entering
//! [`InterviewPhase::Finished`] is absent here: only a verdict
//! (guess or kill) ends an interview, and reset is the only way out.

use super::state::InterviewPhase;

impl InterviewPhase {
    /// Phases reachable from `self` through a generic advance.
    #[must_use]
    pub const fn successors(self) -> &'static [Self] {
        match self {
            Self::WaitingForConnections => &[Self::SelectingPositions],
            Self::SelectingPositions => {
                &[Self::SelectingPenaltyInterviewer, Self::SelectingPenaltySuspect]
            }
            Self::SelectingPenaltyInterviewer => {
                &[Self::SelectingPenaltySuspect, Self::CalibratingPenalty]
            }
            Self::SelectingPenaltySuspect => {
                &[Self::SelectingPenaltyInterviewer, Self::CalibratingPenalty]
            }
            Self::CalibratingPenalty => &[Self::SelectingPacket],
            Self::SelectingPacket => &[Self::PromptingInducer],
            Self::PromptingInducer => &[Self::SolvingInducer],
            Self::SolvingInducer => &[Self::SelectingSuspectBackground],
            Self::SelectingSuspectBackground => &[Self::ReadyToStart],
            Self::ReadyToStart => &[Self::InProgress],
            Self::InProgress | Self::Finished => &[],
        }
    }

    /// Returns `true` if a generic advance from `self` to `next` is allowed.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.successors().contains(&next)
    }
}
