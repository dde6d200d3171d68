//! `simulate` command
//!
//! Plays interviews end to end against one shared registry, one tokio task
//! per pair of simulated players. Every phase is driven through the public
//! registry operations, so a run exercises code reservation, per-session
//! locking and audit emission under real concurrency.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use rand::Rng;
use serde::Serialize;
use uuid::Uuid;

use crate::cli::args::{OutputFormat, SimulateArgs};
use crate::config::{ConfigLoader, SuspectRoleType};
use crate::error::{InterrogationError, SessionError};
use crate::observability::{EventEmitter, init_metrics};
use crate::phase::{InterviewPhase, Outcome};
use crate::session::{InterviewRegistry, Question, QuestionKind};

const PROMPTS: [&str; 3] = [
    "Describe the last thing you ate.",
    "What is the capital of your home town?",
    "Repeat the sequence backwards.",
];

/// Aggregate result of a simulation run.
#[derive(Debug, Default, Serialize)]
pub struct SimulationSummary {
    /// Interviews played to a verdict
    pub interviews: usize,
    /// Verdict counts keyed by outcome name
    pub outcomes: BTreeMap<&'static str, usize>,
    /// Verdicts where the interviewer was right
    pub interviewer_wins: usize,
    /// Audit records written
    pub audit_records: u64,
    /// Wall-clock duration of the run
    pub elapsed_ms: u128,
}

impl SimulationSummary {
    fn record(&mut self, outcome: Outcome) {
        self.interviews += 1;
        *self.outcomes.entry(outcome.as_str()).or_default() += 1;
        if outcome.interviewer_won() {
            self.interviewer_wins += 1;
        }
    }
}

/// Run the simulation.
///
/// # Errors
///
/// Returns an error if the catalog cannot be loaded, the events file
/// cannot be created, or any interview fails a registry operation.
pub async fn run(args: &SimulateArgs) -> Result<(), InterrogationError> {
    let loaded = ConfigLoader::with_defaults().load(&args.config)?;
    for warning in &loaded.warnings {
        tracing::warn!(
            location = warning.location.as_deref().unwrap_or("<unknown>"),
            "{}",
            warning.message
        );
    }

    let metrics = if args.metrics {
        Some(init_metrics()?)
    } else {
        None
    };

    let events = Arc::new(match &args.events_file {
        Some(path) => EventEmitter::from_file(path)?,
        None => EventEmitter::stderr(),
    });

    let registry = Arc::new(InterviewRegistry::new(loaded.config, Arc::clone(&events)));
    let started = Instant::now();

    let mut handles = Vec::with_capacity(args.sessions as usize);
    for player in 0..args.sessions {
        let registry = Arc::clone(&registry);
        handles.push(tokio::spawn(async move {
            play_interview(&registry, player).await
        }));
    }

    let mut summary = SimulationSummary::default();
    for handle in handles {
        let outcome = handle
            .await
            .map_err(|e| InterrogationError::Io(std::io::Error::other(e.to_string())))??;
        summary.record(outcome);
    }
    summary.audit_records = events.event_count();
    summary.elapsed_ms = started.elapsed().as_millis();

    tracing::info!(
        interviews = summary.interviews,
        live = registry.len(),
        "simulation complete"
    );

    match args.format {
        OutputFormat::Human => print_human(&summary),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
    }

    if let Some(handle) = metrics {
        print!("{}", handle.render());
    }
    Ok(())
}

/// Plays one interview from admission to removal.
async fn play_interview(
    registry: &InterviewRegistry,
    player: u32,
) -> Result<Outcome, SessionError> {
    use InterviewPhase::{
        CalibratingPenalty, InProgress, PromptingInducer, ReadyToStart, SelectingPacket,
        SelectingPenaltyInterviewer, SelectingPenaltySuspect, SelectingPositions,
        SelectingSuspectBackground, SolvingInducer, WaitingForConnections,
    };

    let code = registry.create_session()?;
    tracing::debug!(code = %code, player, "simulated pair joining");

    for _ in 0..2 {
        let connection = Uuid::new_v4().to_string();
        if !registry.admit(&code, &connection)? {
            return Err(SessionError::illegal(&code, "fresh interview refused a player"));
        }
        tokio::task::yield_now().await;
    }
    registry.advance(&code, WaitingForConnections, SelectingPositions)?;

    if coin_flip() {
        registry.swap_positions(&code)?;
    }
    registry.allocate_penalties(&code)?;

    let (first, second) = if coin_flip() {
        (SelectingPenaltyInterviewer, SelectingPenaltySuspect)
    } else {
        (SelectingPenaltySuspect, SelectingPenaltyInterviewer)
    };
    registry.advance(&code, SelectingPositions, first)?;
    registry.allocate_penalties(&code)?;
    registry.advance(&code, first, second)?;
    registry.allocate_penalties(&code)?;
    registry.advance(&code, second, CalibratingPenalty)?;
    tokio::task::yield_now().await;

    registry.advance(&code, CalibratingPenalty, SelectingPacket)?;
    let packet_index = rand::rng().random_range(0..registry.packets().len());
    registry.set_packet_and_interference(&code, packet_index)?;
    let role = registry.allocate_role(&code)?;
    registry.advance(&code, SelectingPacket, PromptingInducer)?;

    let prompt = PROMPTS[rand::rng().random_range(0..PROMPTS.len())];
    registry.set_prompt(&code, prompt)?;
    registry.advance(&code, PromptingInducer, SolvingInducer)?;
    tokio::task::yield_now().await;

    let options = registry.catalog().game.background_options;
    registry.allocate_backgrounds(&code, options)?;
    registry.advance(&code, SolvingInducer, SelectingSuspectBackground)?;
    registry.advance(&code, SelectingSuspectBackground, ReadyToStart)?;
    registry.advance(&code, ReadyToStart, InProgress)?;

    let interview = registry.require_phase(&code, InProgress)?;
    let solution = interview
        .interference_pattern()
        .map(|p| p.solution())
        .unwrap_or_default();
    registry.record_question(
        &code,
        QuestionKind::Primary,
        Question::new(prompt, solution),
    )?;
    registry.record_question(
        &code,
        QuestionKind::Secondary,
        Question::new("Are you sure?", "Yes."),
    )?;
    tokio::task::yield_now().await;

    if registry.has_deadline_elapsed(&code)? {
        tracing::debug!(code = %code, "interview ran out of time");
    }

    let outcome = if role.role_type == SuspectRoleType::ViolentRobot && coin_flip() {
        registry.kill_interviewer(&code)?;
        Outcome::KilledInterviewer
    } else {
        registry.resolve_guess(&code, coin_flip())?
    };

    registry.remove_session(&code);
    Ok(outcome)
}

fn coin_flip() -> bool {
    rand::rng().random_bool(0.5)
}

fn print_human(summary: &SimulationSummary) {
    println!(
        "{} interviews in {} ms, {} audit records",
        summary.interviews, summary.elapsed_ms, summary.audit_records
    );
    for (outcome, count) in &summary.outcomes {
        println!("  {outcome:<24} {count}");
    }
    println!("  interviewer won {} of {}", summary.interviewer_wins, summary.interviews);
}
