//! Concurrent session registry.
//!
//! The registry maps normalized session codes to interviews. The map shard
//! lock is only held long enough to clone a session's `Arc`; every game
//! operation then runs under that session's own mutex, so players in
//! different interviews never wait on each other.
//!
//! Audit events are emitted after the session lock is released.
//!
//! Removal marks the slot under its lock before the map entry goes away,
//! so a caller that fetched the slot just before removal sees an unknown
//! code instead of mutating a session nobody can reach anymore.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::Utc;
use dashmap::DashMap;
use rand::Rng;
use dashmap::mapref::entry::Entry;
use interrogation_core::config::{CatalogConfig, Packet, SuspectRole, SuspectRoleType};

use crate::allocation;
use crate::error::{AllocationError, SessionError};
use crate::ids::{IdGenerator, normalize_code};
use crate::interference::{InterferenceGenerator, LetterChainGenerator};
use crate::observability::events::{Event, EventEmitter};
use crate::observability::metrics;
use crate::phase::{InterviewPhase, Outcome};
use crate::session::interview::{Interview, Question, QuestionKind};

/// Number of colliding candidates tolerated before code generation gives up.
pub const MAX_CODE_ATTEMPTS: usize = 10_000;

const PENALTY_PHASES: [InterviewPhase; 3] = [
    InterviewPhase::SelectingPositions,
    InterviewPhase::SelectingPenaltyInterviewer,
    InterviewPhase::SelectingPenaltySuspect,
];

const ROLE_PHASES: [InterviewPhase; 2] = [
    InterviewPhase::SelectingPacket,
    InterviewPhase::PromptingInducer,
];

const BACKGROUND_PHASES: [InterviewPhase; 2] = [
    InterviewPhase::SolvingInducer,
    InterviewPhase::SelectingSuspectBackground,
];

/// A stored interview and its removal mark.
#[derive(Debug)]
struct SessionSlot {
    interview: Interview,
    removed: bool,
}

impl SessionSlot {
    const fn new() -> Self {
        Self {
            interview: Interview::new(),
            removed: false,
        }
    }
}

type Slot = Arc<Mutex<SessionSlot>>;

/// In-memory store of live interviews.
///
/// Construct one per process (or per test) and share it behind an `Arc`.
pub struct InterviewRegistry {
    interviews: DashMap<String, Slot>,
    catalog: Arc<CatalogConfig>,
    ids: IdGenerator,
    interference: Arc<dyn InterferenceGenerator>,
    events: Arc<EventEmitter>,
}

impl std::fmt::Debug for InterviewRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InterviewRegistry")
            .field("sessions", &self.interviews.len())
            .field("ids", &self.ids)
            .finish_non_exhaustive()
    }
}

impl InterviewRegistry {
    /// Creates a registry using the default letter-chain puzzle generator.
    #[must_use]
    pub fn new(catalog: Arc<CatalogConfig>, events: Arc<EventEmitter>) -> Self {
        let interference = Arc::new(LetterChainGenerator::new(
            catalog.game.interference_length,
        ));
        Self::with_interference(catalog, events, interference)
    }

    /// Creates a registry with a custom puzzle generator.
    #[must_use]
    pub fn with_interference(
        catalog: Arc<CatalogConfig>,
        events: Arc<EventEmitter>,
        interference: Arc<dyn InterferenceGenerator>,
    ) -> Self {
        Self {
            interviews: DashMap::new(),
            ids: IdGenerator::new(&catalog.ids),
            catalog,
            interference,
            events,
        }
    }

    // ------------------------------------------------------------------
    // Catalog accessors
    // ------------------------------------------------------------------

    /// The catalog the registry deals content from.
    #[must_use]
    pub fn catalog(&self) -> &CatalogConfig {
        &self.catalog
    }

    /// Packets on offer, in catalog order.
    #[must_use]
    pub fn packets(&self) -> &[Packet] {
        &self.catalog.game.packets
    }

    /// Packet at `index`, if any.
    #[must_use]
    pub fn packet(&self, index: usize) -> Option<&Packet> {
        self.catalog.game.packets.get(index)
    }

    /// Number of live interviews.
    #[must_use]
    pub fn len(&self) -> usize {
        self.interviews.len()
    }

    /// Returns `true` if no interview is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.interviews.is_empty()
    }

    /// Normalized codes of all live interviews, in no particular order.
    #[must_use]
    pub fn codes(&self) -> Vec<String> {
        self.interviews.iter().map(|e| e.key().clone()).collect()
    }

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Reserves a fresh code and stores an empty interview under it.
    ///
    /// # Errors
    ///
    /// Returns [`AllocationError::Unsatisfiable`] if the word list is too
    /// short, or [`AllocationError::CodeSpaceExhausted`] if no free code
    /// turned up within [`MAX_CODE_ATTEMPTS`] candidates.
    pub fn create_session(&self) -> Result<String, AllocationError> {
        let mut rng = rand::rng();

        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = self.ids.generate(&mut rng)?;

            let reserved = match self.interviews.entry(normalize_code(&code)) {
                Entry::Occupied(_) => false,
                Entry::Vacant(vacant) => {
                    vacant.insert(Arc::new(Mutex::new(SessionSlot::new())));
                    true
                }
            };

            if reserved {
                tracing::info!(code = %code, "interview created");
                metrics::record_session_created();
                metrics::set_sessions_active(self.interviews.len());
                return Ok(code);
            }

            tracing::trace!(code = %code, "session code collision, retrying");
        }

        let err = AllocationError::CodeSpaceExhausted {
            attempts: MAX_CODE_ATTEMPTS,
        };
        tracing::error!(error = %err, live = self.interviews.len(), "cannot create interview");
        Err(err)
    }

    /// Seats `connection_id` in the first free slot of an interview.
    ///
    /// Returns `Ok(false)` if the interview is full or already underway.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidReference`] for an unknown code.
    pub fn admit(&self, code: &str, connection_id: &str) -> Result<bool, SessionError> {
        self.with_session(code, |interview| {
            let admitted = interview.try_admit(connection_id);
            if admitted {
                tracing::debug!(code, connection_id, "connection admitted");
            } else {
                tracing::debug!(code, connection_id, "connection turned away");
            }
            Ok(admitted)
        })
    }

    /// Snapshot of an interview, or `None` for an unknown code.
    #[must_use]
    pub fn lookup(&self, code: &str) -> Option<Interview> {
        let slot = self.slot(code).ok()?;
        let guard = lock(&slot);
        (!guard.removed).then(|| guard.interview.clone())
    }

    /// Snapshot of an interview.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidReference`] for an unknown code.
    pub fn require_session(&self, code: &str) -> Result<Interview, SessionError> {
        self.with_session(code, |interview| Ok(interview.clone()))
    }

    /// Snapshot of an interview that must be in `phase`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidReference`] for an unknown code, or
    /// [`SessionError::UnexpectedPhase`] if the interview is elsewhere.
    pub fn require_phase(
        &self,
        code: &str,
        phase: InterviewPhase,
    ) -> Result<Interview, SessionError> {
        self.with_session(code, |interview| {
            expect_phase(code, interview, &[phase])?;
            Ok(interview.clone())
        })
    }

    /// Returns `true` once the interview clock has run out.
    ///
    /// Always `false` before the interview starts. Nothing happens to the
    /// interview when the deadline passes; callers poll this.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::InvalidReference`] for an unknown code.
    pub fn has_deadline_elapsed(&self, code: &str) -> Result<bool, SessionError> {
        let limit = self.catalog.game.interview_duration();
        self.with_session(code, |interview| {
            Ok(interview.deadline_elapsed(limit, Utc::now()))
        })
    }

    /// Replaces a finished interview with a rematch for the same players.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::IllegalAction`] unless the interview is
    /// finished.
    pub fn reset_session(&self, code: &str) -> Result<Interview, SessionError> {
        self.with_session(code, |interview| {
            if interview.phase != InterviewPhase::Finished {
                return Err(SessionError::illegal(
                    code,
                    format!("cannot reset an interview in phase {}", interview.phase),
                ));
            }
            *interview = interview.rematch();
            tracing::info!(code, "interview reset for a rematch");
            Ok(interview.clone())
        })
    }

    /// Deletes an interview.
    ///
    /// An interview removed while its clock is running is audited as
    /// abandoned. Returns `false` if the code was unknown or another
    /// caller removed it first.
    pub fn remove_session(&self, code: &str) -> bool {
        let key = normalize_code(code);
        let Ok(slot) = self.slot(code) else {
            return false;
        };

        let abandoned = {
            let mut guard = lock(&slot);
            if guard.removed {
                return false;
            }
            guard.removed = true;
            self.interviews
                .remove_if(&key, |_, stored| Arc::ptr_eq(stored, &slot));

            let interview = &guard.interview;
            (interview.phase == InterviewPhase::InProgress)
                .then(|| interview.audit_record(Utc::now()))
        };

        if let Some(record) = abandoned {
            tracing::info!(code = %key, "interview abandoned while in progress");
            self.emit(Event::InterviewAbandoned {
                timestamp: Utc::now(),
                code: key.clone(),
                record,
            });
        }

        tracing::debug!(code = %key, "interview removed");
        metrics::set_sessions_active(self.interviews.len());
        true
    }

    // ------------------------------------------------------------------
    // Phase progression
    // ------------------------------------------------------------------

    /// Moves an interview from `from` to `to`.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::UnexpectedPhase`] if the interview is not
    /// in `from`, or [`SessionError::IllegalAction`] if the move is not in
    /// the transition table or the interview lacks what `to` needs.
    pub fn advance(
        &self,
        code: &str,
        from: InterviewPhase,
        to: InterviewPhase,
    ) -> Result<(), SessionError> {
        self.with_session(code, |interview| {
            expect_phase(code, interview, &[from])?;

            if !from.can_transition_to(to) {
                return Err(SessionError::illegal(
                    code,
                    format!("cannot move from {from} to {to}"),
                ));
            }
            if let Some(missing) = missing_for_transition(interview, from, to) {
                return Err(SessionError::illegal(
                    code,
                    format!("cannot move from {from} to {to}: {missing}"),
                ));
            }

            if to == InterviewPhase::InProgress && interview.started_at.is_none() {
                interview.started_at = Some(Utc::now());
            }
            interview.phase = to;

            tracing::info!(code, from = %from, to = %to, "phase transition");
            metrics::record_phase_transition(from, to);
            Ok(())
        })
    }

    /// Swaps which player interviews and which is the suspect.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::UnexpectedPhase`] outside position selection.
    pub fn swap_positions(&self, code: &str) -> Result<(), SessionError> {
        self.with_session(code, |interview| {
            expect_phase(code, interview, &[InterviewPhase::SelectingPositions])?;
            std::mem::swap(
                &mut interview.interviewer_connection_id,
                &mut interview.suspect_connection_id,
            );
            Ok(())
        })
    }

    // ------------------------------------------------------------------
    // Content allocation
    // ------------------------------------------------------------------

    /// Draws the penalties offered to the players.
    ///
    /// Each call replaces the previous draw.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::UnexpectedPhase`] outside position or
    /// penalty selection, or [`SessionError::Allocation`] if the catalog
    /// holds too few distinct penalties.
    pub fn allocate_penalties(&self, code: &str) -> Result<Vec<String>, SessionError> {
        let game = &self.catalog.game;
        self.with_session(code, |interview| {
            expect_phase(code, interview, &PENALTY_PHASES)?;
            allocation::sample_into(
                &game.penalties,
                &mut interview.penalties,
                game.penalty_count,
                &mut rand::rng(),
            )?;
            Ok(interview.penalties.clone())
        })
    }

    /// Deals the suspect's hidden role.
    ///
    /// The pool holds each of the packet's robot roles once, plus the human
    /// role once per robot role, so the suspect is human half of the time
    /// however many robot roles the packet defines.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::UnexpectedPhase`] outside packet selection
    /// or prompting, or [`SessionError::IllegalAction`] if no packet is
    /// selected yet, the packet has no roles, or a role was already dealt.
    pub fn allocate_role(&self, code: &str) -> Result<SuspectRole, SessionError> {
        let human = &self.catalog.game.human_role;
        self.with_session(code, |interview| {
            expect_phase(code, interview, &ROLE_PHASES)?;
            if interview.role.is_some() {
                return Err(SessionError::illegal(code, "role already allocated"));
            }
            let Some(packet) = interview.packet.as_ref() else {
                return Err(SessionError::illegal(
                    code,
                    "a packet must be selected before the role is allocated",
                ));
            };
            if packet.roles.is_empty() {
                return Err(SessionError::illegal(
                    code,
                    format!("packet '{}' has no roles", packet.name),
                ));
            }

            let mut pool = packet.roles.clone();
            pool.extend(std::iter::repeat_n(human.clone(), packet.roles.len()));
            let role = pool.swap_remove(rand::rng().random_range(0..pool.len()));

            tracing::debug!(code, role = %role.role_type, "role allocated");
            interview.role = Some(role.clone());
            Ok(role)
        })
    }

    /// Selects the packet and generates the interference pattern with it.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::UnexpectedPhase`] outside packet selection,
    /// or [`SessionError::IllegalAction`] for an out-of-range index or a
    /// packet that was already chosen.
    pub fn set_packet_and_interference(
        &self,
        code: &str,
        packet_index: usize,
    ) -> Result<Packet, SessionError> {
        self.with_session(code, |interview| {
            expect_phase(code, interview, &[InterviewPhase::SelectingPacket])?;
            if interview.packet.is_some() {
                return Err(SessionError::illegal(code, "packet already selected"));
            }
            let Some(packet) = self.packet(packet_index) else {
                return Err(SessionError::illegal(
                    code,
                    format!(
                        "packet index {packet_index} out of range ({} packets)",
                        self.packets().len()
                    ),
                ));
            };

            let pattern = self.interference.generate(&mut rand::rng());
            tracing::debug!(code, packet = %packet.name, pattern = %pattern, "packet selected");

            interview.packet = Some(packet.clone());
            interview.interference_pattern = Some(pattern);
            Ok(packet.clone())
        })
    }

    /// Draws `n` suspect backgrounds to choose from.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::UnexpectedPhase`] outside inducer solving or
    /// background selection, or [`SessionError::Allocation`] if the catalog
    /// holds fewer than `n` distinct backgrounds.
    pub fn allocate_backgrounds(&self, code: &str, n: usize) -> Result<Vec<String>, SessionError> {
        let backgrounds = &self.catalog.game.suspect_backgrounds;
        self.with_session(code, |interview| {
            expect_phase(code, interview, &BACKGROUND_PHASES)?;
            allocation::sample_into(
                backgrounds,
                &mut interview.suspect_backgrounds,
                n,
                &mut rand::rng(),
            )?;
            Ok(interview.suspect_backgrounds.clone())
        })
    }

    /// Stores the interviewer's inducer prompt.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::UnexpectedPhase`] outside prompting.
    pub fn set_prompt(&self, code: &str, prompt: impl Into<String>) -> Result<(), SessionError> {
        let prompt = prompt.into();
        self.with_session(code, |interview| {
            expect_phase(code, interview, &[InterviewPhase::PromptingInducer])?;
            interview.prompt = Some(prompt);
            Ok(())
        })
    }

    /// Appends a question to the interview record.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::UnexpectedPhase`] unless the interview is
    /// in progress.
    pub fn record_question(
        &self,
        code: &str,
        kind: QuestionKind,
        question: Question,
    ) -> Result<(), SessionError> {
        self.with_session(code, |interview| {
            expect_phase(code, interview, &[InterviewPhase::InProgress])?;
            match kind {
                QuestionKind::Primary => interview.primary_questions.push(question),
                QuestionKind::Secondary => interview.secondary_questions.push(question),
            }
            Ok(())
        })
    }

    // ------------------------------------------------------------------
    // Verdicts
    // ------------------------------------------------------------------

    /// Scores the interviewer's guess and ends the interview.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::UnexpectedPhase`] unless the interview is
    /// in progress.
    pub fn resolve_guess(&self, code: &str, guessed_is_robot: bool) -> Result<Outcome, SessionError> {
        self.conclude(code, |interview| {
            let Some(role) = interview.role.as_ref() else {
                return Err(SessionError::illegal(code, "no role has been allocated"));
            };
            Ok(Outcome::from_guess(
                guessed_is_robot,
                role.role_type == SuspectRoleType::Human,
            ))
        })
    }

    /// Ends the interview with the suspect killing the interviewer.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::UnexpectedPhase`] unless the interview is
    /// in progress, or [`SessionError::IllegalAction`] unless the suspect
    /// is a violent robot. The interview is left untouched on error.
    pub fn kill_interviewer(&self, code: &str) -> Result<(), SessionError> {
        self.conclude(code, |interview| {
            match interview.role.as_ref().map(|r| r.role_type) {
                Some(SuspectRoleType::ViolentRobot) => Ok(Outcome::KilledInterviewer),
                _ => Err(SessionError::illegal(
                    code,
                    "suspect is not a violent robot, so cannot kill the interviewer",
                )),
            }
        })
        .map(|_| ())
    }

    /// Finishes an in-progress interview with the outcome `verdict` picks,
    /// then audits it once the lock is released.
    fn conclude<F>(&self, code: &str, verdict: F) -> Result<Outcome, SessionError>
    where
        F: FnOnce(&Interview) -> Result<Outcome, SessionError>,
    {
        let (outcome, record) = self.with_session(code, |interview| {
            expect_phase(code, interview, &[InterviewPhase::InProgress])?;
            let outcome = verdict(interview)?;
            interview.finish(outcome);
            Ok((outcome, interview.audit_record(Utc::now())))
        })?;

        tracing::info!(code, outcome = %outcome, "interview finished");
        metrics::record_outcome(outcome);
        self.emit(Event::InterviewFinished {
            timestamp: Utc::now(),
            code: normalize_code(code),
            record,
        });
        Ok(outcome)
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn slot(&self, code: &str) -> Result<Slot, SessionError> {
        self.interviews
            .get(&normalize_code(code))
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| SessionError::InvalidReference(code.to_owned()))
    }

    /// Runs `f` on the interview under its lock, reporting any failure.
    fn with_session<T, F>(&self, code: &str, f: F) -> Result<T, SessionError>
    where
        F: FnOnce(&mut Interview) -> Result<T, SessionError>,
    {
        let result = self
            .slot(code)
            .and_then(|slot| Self::run_locked(code, &slot, f));

        if let Err(err) = &result {
            report(code, err);
        }
        result
    }

    /// Runs `f` under the slot lock unless the slot has been removed.
    fn run_locked<T, F>(code: &str, slot: &Mutex<SessionSlot>, f: F) -> Result<T, SessionError>
    where
        F: FnOnce(&mut Interview) -> Result<T, SessionError>,
    {
        let mut guard = lock(slot);
        if guard.removed {
            return Err(SessionError::InvalidReference(code.to_owned()));
        }
        f(&mut guard.interview)
    }

    fn emit(&self, event: Event) {
        metrics::record_audit(event.kind());
        self.events.emit(event);
    }
}

/// Locks a session, recovering the data if a previous holder panicked.
fn lock(slot: &Mutex<SessionSlot>) -> MutexGuard<'_, SessionSlot> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

fn expect_phase(
    code: &str,
    interview: &Interview,
    expected: &[InterviewPhase],
) -> Result<(), SessionError> {
    if expected.contains(&interview.phase) {
        Ok(())
    } else {
        Err(SessionError::UnexpectedPhase {
            code: code.to_owned(),
            expected: expected.to_vec(),
            actual: interview.phase,
        })
    }
}

/// Describes what the interview still lacks for `from -> to`, if anything.
fn missing_for_transition(
    interview: &Interview,
    from: InterviewPhase,
    to: InterviewPhase,
) -> Option<&'static str> {
    use InterviewPhase::{
        CalibratingPenalty, SelectingPacket, SelectingSuspectBackground, SolvingInducer,
        WaitingForConnections,
    };

    if from == WaitingForConnections && !interview.is_full() {
        return Some("both players must be connected");
    }
    if to == CalibratingPenalty && interview.penalties.is_empty() {
        return Some("no penalties have been allocated");
    }
    if from == SelectingPacket
        && (interview.packet.is_none() || interview.interference_pattern.is_none())
    {
        return Some("no packet has been selected");
    }
    if to == SolvingInducer && interview.role.is_none() {
        return Some("no role has been allocated");
    }
    if from == SelectingSuspectBackground && interview.suspect_backgrounds.is_empty() {
        return Some("no suspect backgrounds have been allocated");
    }
    None
}

fn report(code: &str, err: &SessionError) {
    match err {
        SessionError::InvalidReference(_) => {
            tracing::debug!(code, error = %err, "unknown interview code");
        }
        SessionError::UnexpectedPhase { .. } | SessionError::IllegalAction { .. } => {
            tracing::warn!(code, kind = err.kind(), error = %err, "protocol violation");
        }
        SessionError::Allocation(_) => {
            tracing::error!(code, error = %err, "catalog cannot satisfy allocation");
        }
    }
    if let Some(kind) = protocol_error_kind(err) {
        metrics::record_protocol_error(kind);
    }
}

/// Metric label for errors caused by a client acting out of turn.
const fn protocol_error_kind(err: &SessionError) -> Option<&'static str> {
    if err.is_protocol_violation() {
        Some(err.kind())
    } else {
        None
    }
}
