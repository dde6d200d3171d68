//! The interview aggregate.
//!
//! An [`Interview`] holds everything one game session accumulates, from the
//! two connection slots through to the verdict. Fields are only written by
//! the registry while it holds the session lock; everything outside the
//! crate sees snapshots through the read accessors.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use serde::{Deserialize, Serialize};

use interrogation_core::config::{Packet, SuspectRole};

use crate::interference::InterferencePattern;
use crate::observability::events::AuditRecord;
use crate::phase::{InterviewPhase, Outcome};

/// A question asked by the interviewer and the suspect's answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    /// What the interviewer asked
    pub challenge: String,
    /// What the suspect answered
    pub answer: String,
}

impl Question {
    /// Creates a question record.
    pub fn new(challenge: impl Into<String>, answer: impl Into<String>) -> Self {
        Self {
            challenge: challenge.into(),
            answer: answer.into(),
        }
    }
}

/// Which list a question belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    /// Questions from the packet's main list
    Primary,
    /// Follow-up questions
    Secondary,
}

/// State of one game session.
#[derive(Debug, Clone, Serialize)]
pub struct Interview {
    pub(crate) phase: InterviewPhase,
    pub(crate) outcome: Option<Outcome>,
    pub(crate) started_at: Option<DateTime<Utc>>,
    pub(crate) interviewer_connection_id: Option<String>,
    pub(crate) suspect_connection_id: Option<String>,
    pub(crate) penalties: Vec<String>,
    pub(crate) suspect_backgrounds: Vec<String>,
    pub(crate) packet: Option<Packet>,
    pub(crate) role: Option<SuspectRole>,
    pub(crate) interference_pattern: Option<InterferencePattern>,
    pub(crate) prompt: Option<String>,
    pub(crate) primary_questions: Vec<Question>,
    pub(crate) secondary_questions: Vec<Question>,
}

impl Default for Interview {
    fn default() -> Self {
        Self::new()
    }
}

impl Interview {
    /// Creates an empty interview waiting for its two players.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            phase: InterviewPhase::WaitingForConnections,
            outcome: None,
            started_at: None,
            interviewer_connection_id: None,
            suspect_connection_id: None,
            penalties: Vec::new(),
            suspect_backgrounds: Vec::new(),
            packet: None,
            role: None,
            interference_pattern: None,
            prompt: None,
            primary_questions: Vec::new(),
            secondary_questions: Vec::new(),
        }
    }

    /// Current phase.
    #[must_use]
    pub const fn phase(&self) -> InterviewPhase {
        self.phase
    }

    /// Verdict, set only once the interview is finished.
    #[must_use]
    pub const fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    /// When the interview clock started.
    #[must_use]
    pub const fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    /// Connection holding the interviewer slot.
    #[must_use]
    pub fn interviewer_connection_id(&self) -> Option<&str> {
        self.interviewer_connection_id.as_deref()
    }

    /// Connection holding the suspect slot.
    #[must_use]
    pub fn suspect_connection_id(&self) -> Option<&str> {
        self.suspect_connection_id.as_deref()
    }

    /// Penalties offered, in draw order.
    #[must_use]
    pub fn penalties(&self) -> &[String] {
        &self.penalties
    }

    /// Suspect backgrounds offered, in draw order.
    #[must_use]
    pub fn suspect_backgrounds(&self) -> &[String] {
        &self.suspect_backgrounds
    }

    /// Selected packet.
    #[must_use]
    pub const fn packet(&self) -> Option<&Packet> {
        self.packet.as_ref()
    }

    /// The suspect's hidden role.
    #[must_use]
    pub const fn role(&self) -> Option<&SuspectRole> {
        self.role.as_ref()
    }

    /// Puzzle generated alongside the packet.
    #[must_use]
    pub const fn interference_pattern(&self) -> Option<&InterferencePattern> {
        self.interference_pattern.as_ref()
    }

    /// The interviewer's inducer prompt.
    #[must_use]
    pub fn prompt(&self) -> Option<&str> {
        self.prompt.as_deref()
    }

    /// Questions recorded under `kind`.
    #[must_use]
    pub fn questions(&self, kind: QuestionKind) -> &[Question] {
        match kind {
            QuestionKind::Primary => &self.primary_questions,
            QuestionKind::Secondary => &self.secondary_questions,
        }
    }

    /// Returns `true` once both connection slots are taken.
    #[must_use]
    pub const fn is_full(&self) -> bool {
        self.interviewer_connection_id.is_some() && self.suspect_connection_id.is_some()
    }

    /// Puts `connection_id` in the first free slot.
    ///
    /// Returns `false` without touching anything if the interview has
    /// moved past admission or both slots are already taken.
    pub(crate) fn try_admit(&mut self, connection_id: &str) -> bool {
        if self.phase != InterviewPhase::WaitingForConnections {
            return false;
        }

        if self.interviewer_connection_id.is_none() {
            self.interviewer_connection_id = Some(connection_id.to_owned());
            true
        } else if self.suspect_connection_id.is_none() {
            self.suspect_connection_id = Some(connection_id.to_owned());
            true
        } else {
            false
        }
    }

    /// Records the verdict and ends the interview.
    pub(crate) fn finish(&mut self, outcome: Outcome) {
        self.phase = InterviewPhase::Finished;
        self.outcome = Some(outcome);
    }

    /// Builds the interview that replaces this one on a rematch.
    ///
    /// Both players keep their slots; every game field starts over and
    /// the new interview skips admission.
    #[must_use]
    pub fn rematch(&self) -> Self {
        Self {
            phase: InterviewPhase::SelectingPositions,
            interviewer_connection_id: self.interviewer_connection_id.clone(),
            suspect_connection_id: self.suspect_connection_id.clone(),
            ..Self::new()
        }
    }

    /// Time on the interview clock at `now`; zero if it never started.
    #[must_use]
    pub fn elapsed(&self, now: DateTime<Utc>) -> Duration {
        self.started_at
            .and_then(|started| (now - started).to_std().ok())
            .unwrap_or_default()
    }

    /// Returns `true` if the clock started and `duration` has run out.
    #[must_use]
    pub fn deadline_elapsed(&self, duration: Duration, now: DateTime<Utc>) -> bool {
        let Some(started) = self.started_at else {
            return false;
        };
        TimeDelta::from_std(duration)
            .ok()
            .and_then(|limit| started.checked_add_signed(limit))
            .is_some_and(|deadline| now >= deadline)
    }

    /// Snapshot of the interview for the audit log.
    #[must_use]
    pub fn audit_record(&self, now: DateTime<Utc>) -> AuditRecord {
        let duration_ms = u64::try_from(self.elapsed(now).as_millis()).unwrap_or(u64::MAX);

        AuditRecord {
            phase: self.phase,
            outcome: self.outcome,
            duration_ms,
            packet: self.packet.as_ref().map(|p| p.name.clone()),
            interference_pattern: self.interference_pattern.as_ref().map(ToString::to_string),
            interference_solution: self
                .interference_pattern
                .as_ref()
                .map(InterferencePattern::solution),
            suspect_background: self.suspect_backgrounds.first().cloned(),
            suspect_type: self.role.as_ref().map(|r| r.role_type),
            suspect_fault: self.role.as_ref().map(|r| r.fault.clone()),
            suspect_traits: self
                .role
                .as_ref()
                .map(|r| r.traits.clone())
                .unwrap_or_default(),
        }
    }
}
