//! Metrics collection for the interview registry.
//!
//! All recording goes through the `metrics` facade, which is a no-op until
//! a recorder is installed. [`init_metrics`] installs a Prometheus recorder
//! whose handle can render the current snapshot in text exposition format.
//!
//! Every label value comes from a closed enum, so label cardinality is
//! bounded by construction.

use std::sync::OnceLock;

use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::error::InterrogationError;
use crate::phase::{InterviewPhase, Outcome};

/// Handle of the installed recorder, set at most once per process.
static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Installs the global Prometheus recorder and returns its handle.
///
/// Calling this again returns the handle installed by the first call.
///
/// # Errors
///
/// Returns `InterrogationError::Io` if another recorder is already
/// installed.
pub fn init_metrics() -> Result<PrometheusHandle, InterrogationError> {
    if let Some(handle) = HANDLE.get() {
        tracing::debug!("metrics already initialized, skipping");
        return Ok(handle.clone());
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .map_err(|e| InterrogationError::Io(std::io::Error::other(e.to_string())))?;
    describe_metrics();

    Ok(HANDLE.get_or_init(|| handle).clone())
}

/// Registers metric descriptions with the global recorder.
pub fn describe_metrics() {
    describe_counter!(
        "interrogation_sessions_created_total",
        "Total number of interviews created"
    );
    describe_gauge!(
        "interrogation_sessions_active",
        "Number of interviews currently held by the registry"
    );
    describe_counter!(
        "interrogation_outcomes_total",
        "Verdicts reached, by outcome"
    );
    describe_counter!(
        "interrogation_protocol_errors_total",
        "Out-of-turn registry operations, by error kind"
    );
    describe_counter!(
        "interrogation_phase_transitions_total",
        "Total number of phase transitions"
    );
    describe_counter!(
        "interrogation_audit_records_total",
        "Audit records emitted, by kind"
    );
}

/// Records a newly created interview.
pub fn record_session_created() {
    counter!("interrogation_sessions_created_total").increment(1);
}

/// Sets the number of live interviews.
#[allow(clippy::cast_precision_loss)]
pub fn set_sessions_active(count: usize) {
    gauge!("interrogation_sessions_active").set(count as f64);
}

/// Records a verdict.
pub fn record_outcome(outcome: Outcome) {
    counter!("interrogation_outcomes_total", "outcome" => outcome.as_str()).increment(1);
}

/// Records a registry operation rejected as out of turn.
pub fn record_protocol_error(kind: &'static str) {
    counter!("interrogation_protocol_errors_total", "kind" => kind).increment(1);
}

/// Records a phase transition.
pub fn record_phase_transition(from: InterviewPhase, to: InterviewPhase) {
    counter!(
        "interrogation_phase_transitions_total",
        "from" => from.as_str(),
        "to" => to.as_str()
    )
    .increment(1);
}

/// Records an emitted audit record.
pub fn record_audit(kind: &'static str) {
    counter!("interrogation_audit_records_total", "kind" => kind).increment(1);
}
