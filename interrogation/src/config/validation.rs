//! Catalog validation
//!
//! Checks a deserialized [`CatalogConfig`] for everything that would make
//! the registry fail at play time: allocations the catalog cannot satisfy,
//! role types in the wrong place, and degenerate timing or code settings.
//!
//! Validation collects ALL issues rather than stopping at the first one.

use std::collections::HashSet;

use crate::allocation::distinct_count;
use crate::config::loader::ConfigLimits;
use crate::config::schema::{CatalogConfig, GameConfiguration, IdGeneration, SuspectRoleType};
use crate::error::{Severity, ValidationIssue};
use crate::interference::{MAX_PATTERN_LENGTH, MIN_PATTERN_LENGTH};

/// Normalized Damerau-Levenshtein similarity at which two entries are
/// reported as near-duplicates.
pub const NEAR_DUPLICATE_THRESHOLD: f64 = 0.9;

// ============================================================================
// Public API
// ============================================================================

/// Result of catalog validation.
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Validation errors (prevent loading).
    pub errors: Vec<ValidationIssue>,

    /// Validation warnings (informational).
    pub warnings: Vec<ValidationIssue>,
}

impl ValidationResult {
    /// Returns `true` if there are any errors.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Returns `true` if validation passed (no errors).
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Catalog validator.
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<ValidationIssue>,
    warnings: Vec<ValidationIssue>,
}

impl Validator {
    /// Creates a new validator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates a catalog and returns every issue found.
    pub fn validate(&mut self, config: &CatalogConfig, limits: &ConfigLimits) -> ValidationResult {
        self.errors.clear();
        self.warnings.clear();

        self.validate_timing(&config.game);
        self.validate_human_role(&config.game);
        self.validate_packets(&config.game, limits);
        self.validate_pools(&config.game);
        self.validate_ids(&config.ids);

        ValidationResult {
            errors: std::mem::take(&mut self.errors),
            warnings: std::mem::take(&mut self.warnings),
        }
    }

    // ========================================================================
    // Game rules
    // ========================================================================

    fn validate_timing(&mut self, game: &GameConfiguration) {
        if game.duration == 0 {
            self.add_error("game.duration", "Interview duration must be at least 1 second");
        }

        if !(MIN_PATTERN_LENGTH..=MAX_PATTERN_LENGTH).contains(&game.interference_length) {
            self.add_error(
                "game.interference_length",
                &format!(
                    "Interference length {} is outside {MIN_PATTERN_LENGTH}..={MAX_PATTERN_LENGTH}",
                    game.interference_length
                ),
            );
        }
    }

    fn validate_human_role(&mut self, game: &GameConfiguration) {
        if game.human_role.role_type != SuspectRoleType::Human {
            self.add_error(
                "game.human_role.type",
                &format!(
                    "The shared human role must have type 'human', got '{}'",
                    game.human_role.role_type
                ),
            );
        }
    }

    fn validate_packets(&mut self, game: &GameConfiguration, limits: &ConfigLimits) {
        if game.packets.is_empty() {
            self.add_error("game.packets", "Catalog must define at least one packet");
            return;
        }

        if game.packets.len() > limits.max_packets {
            self.add_error(
                "game.packets",
                &format!(
                    "Too many packets ({}, limit {})",
                    game.packets.len(),
                    limits.max_packets
                ),
            );
        }

        let mut seen_names = HashSet::new();
        for (i, packet) in game.packets.iter().enumerate() {
            let path = format!("game.packets[{i}]");

            if packet.name.trim().is_empty() {
                self.add_error(&format!("{path}.name"), "Packet name cannot be empty");
            } else if !seen_names.insert(packet.name.as_str()) {
                self.add_warning(
                    &format!("{path}.name"),
                    &format!("Duplicate packet name '{}'", packet.name),
                );
            }

            if packet.roles.is_empty() {
                self.add_error(
                    &format!("{path}.roles"),
                    "Packet must define at least one robot role",
                );
            }
            if packet.roles.len() > limits.max_roles_per_packet {
                self.add_error(
                    &format!("{path}.roles"),
                    &format!(
                        "Too many roles ({}, limit {})",
                        packet.roles.len(),
                        limits.max_roles_per_packet
                    ),
                );
            }

            for (j, role) in packet.roles.iter().enumerate() {
                if role.role_type == SuspectRoleType::Human {
                    self.add_error(
                        &format!("{path}.roles[{j}].type"),
                        "Packets list robot roles only; the human role is shared",
                    );
                }
            }
        }
    }

    fn validate_pools(&mut self, game: &GameConfiguration) {
        self.validate_pool("game.penalties", "penalties", &game.penalties, game.penalty_count);
        self.validate_pool(
            "game.suspect_backgrounds",
            "suspect backgrounds",
            &game.suspect_backgrounds,
            game.background_options,
        );
    }

    /// Checks that `entries` can supply `needed` distinct values.
    fn validate_pool(&mut self, path: &str, label: &str, entries: &[String], needed: usize) {
        let available = distinct_count(entries);
        if available < needed {
            self.add_error(
                path,
                &format!("{needed} distinct {label} are drawn per interview, only {available} defined"),
            );
        }
        self.check_duplicates(path, entries);
    }

    // ========================================================================
    // Session codes
    // ========================================================================

    fn validate_ids(&mut self, ids: &IdGeneration) {
        if ids.word_count == 0 {
            self.add_error("ids.word_count", "Session codes need at least one word");
        }

        // Codes are looked up case-insensitively, so `Red` and `red` count once.
        let folded: Vec<String> = ids.words.iter().map(|w| w.to_lowercase()).collect();
        let available = distinct_count(&folded);
        if available < ids.word_count {
            self.add_error(
                "ids.words",
                &format!(
                    "Codes use {} distinct words, only {available} defined",
                    ids.word_count
                ),
            );
        }

        for (i, word) in ids.words.iter().enumerate() {
            if word.trim().is_empty() {
                self.add_error(&format!("ids.words[{i}]"), "Code words cannot be empty");
            }
            if let Some(first) = ids.words[..i]
                .iter()
                .find(|earlier| *earlier != word && earlier.to_lowercase() == folded[i])
            {
                self.add_warning(
                    &format!("ids.words[{i}]"),
                    &format!("'{word}' differs from '{first}' only by case"),
                );
            }
        }

        self.check_duplicates("ids.words", &ids.words);
    }

    // ========================================================================
    // Helper Methods
    // ========================================================================

    /// Warns on exact and near-duplicate entries in a list.
    fn check_duplicates(&mut self, path: &str, entries: &[String]) {
        for (i, entry) in entries.iter().enumerate() {
            let earlier = &entries[..i];
            if earlier.contains(entry) {
                self.add_warning(
                    &format!("{path}[{i}]"),
                    &format!("Duplicate entry '{entry}'"),
                );
            } else if let Some(similar) = earlier.iter().find(|e| near_duplicate(e, entry)) {
                self.add_warning(
                    &format!("{path}[{i}]"),
                    &format!("'{entry}' is nearly identical to '{similar}'"),
                );
            }
        }
    }

    /// Adds an error to the collection.
    fn add_error(&mut self, path: &str, message: &str) {
        self.errors.push(ValidationIssue {
            path: path.to_string(),
            message: message.to_string(),
            severity: Severity::Error,
        });
    }

    /// Adds a warning to the collection.
    fn add_warning(&mut self, path: &str, message: &str) {
        self.warnings.push(ValidationIssue {
            path: path.to_string(),
            message: message.to_string(),
            severity: Severity::Warning,
        });
    }
}

/// Returns `true` for distinct, case-sensitive-unequal strings that are
/// close enough to be a likely typo of one another.
fn near_duplicate(a: &str, b: &str) -> bool {
    a != b
        && a.to_lowercase() != b.to_lowercase()
        && strsim::normalized_damerau_levenshtein(a, b) >= NEAR_DUPLICATE_THRESHOLD
}

// ============================================================================
// Tests
// ============================================================================
