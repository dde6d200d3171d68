//! Shared integration-test helpers for running the `interrogation` binary
//! and building registries from fixture catalogs.

#![allow(dead_code)]

use std::path::PathBuf;
use std::process::{Command, Output};
use std::sync::Arc;

use interrogation::config::{CatalogConfig, ConfigLoader};
use interrogation::observability::EventEmitter;
use interrogation::session::InterviewRegistry;

/// Returns the absolute path of a file under `tests/fixtures/`.
pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

/// Runs the binary to completion with the given arguments.
#[allow(clippy::missing_panics_doc)]
pub fn run_cli(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_interrogation"))
        .args(args)
        .env_remove("INTERROGATION_LOG_LEVEL")
        .env_remove("INTERROGATION_CONFIG")
        .env_remove("INTERROGATION_EVENTS_FILE")
        .output()
        .expect("failed to run interrogation")
}

/// Loads a fixture catalog, panicking on any error.
#[allow(clippy::missing_panics_doc)]
pub fn load_fixture(name: &str) -> Arc<CatalogConfig> {
    ConfigLoader::with_defaults()
        .load(&fixture_path(name))
        .expect("fixture should load")
        .config
}

/// Builds a registry over `game.yaml` writing audit records to `events`.
pub fn registry_with(events: Arc<EventEmitter>) -> InterviewRegistry {
    InterviewRegistry::new(load_fixture("game.yaml"), events)
}
