//! Catalog loader
//!
//! Loading runs in stages:
//! 1. Size check and UTF-8 BOM strip
//! 2. Environment variable expansion (pre-parse, on raw text)
//! 3. YAML parsing and empty-file rejection
//! 4. Deserialization to [`CatalogConfig`]
//! 5. Validation
//! 6. Freeze with `Arc`

use std::path::Path;
use std::sync::Arc;

use serde_yaml::Value;

use crate::config::schema::CatalogConfig;
use crate::config::validation::Validator;
use crate::error::ConfigError;

// ============================================================================
// Public API
// ============================================================================

/// Options for the catalog loader.
#[derive(Debug, Clone, Default)]
pub struct LoaderOptions {
    /// Limits for catalog size.
    pub config_limits: ConfigLimits,
}

/// Limits on catalog size.
///
/// Each limit can be raised through its environment variable.
#[derive(Debug, Clone)]
pub struct ConfigLimits {
    /// Maximum catalog file size in bytes.
    pub max_config_size: usize,

    /// Maximum number of packets.
    pub max_packets: usize,

    /// Maximum number of roles in one packet.
    pub max_roles_per_packet: usize,
}

impl Default for ConfigLimits {
    fn default() -> Self {
        Self {
            max_config_size: env_or("INTERROGATION_MAX_CONFIG_SIZE", 1024 * 1024),
            max_packets: env_or("INTERROGATION_MAX_PACKETS", 500),
            max_roles_per_packet: env_or("INTERROGATION_MAX_ROLES_PER_PACKET", 100),
        }
    }
}

/// Result of loading a catalog file.
#[derive(Debug)]
pub struct LoadResult {
    /// The loaded and validated catalog.
    pub config: Arc<CatalogConfig>,

    /// Warnings encountered during loading.
    pub warnings: Vec<LoadWarning>,
}

/// Warning during catalog loading.
#[derive(Debug, Clone)]
pub struct LoadWarning {
    /// Warning message.
    pub message: String,

    /// Location where the warning occurred.
    pub location: Option<String>,
}

impl std::fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{} at {location}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

/// Catalog loader.
#[derive(Debug, Default)]
pub struct ConfigLoader {
    options: LoaderOptions,
}

impl ConfigLoader {
    /// Creates a loader with the given options.
    #[must_use]
    pub const fn new(options: LoaderOptions) -> Self {
        Self { options }
    }

    /// Creates a loader with default options.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(LoaderOptions::default())
    }

    /// Loads a catalog file and returns the frozen catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read or exceeds the size limit
    /// - A required environment variable is unset
    /// - YAML parsing or deserialization fails
    /// - Validation reports errors
    pub fn load(&self, path: &Path) -> Result<LoadResult, ConfigError> {
        let limit = self.options.config_limits.max_config_size;

        let metadata = std::fs::metadata(path).map_err(|_| ConfigError::MissingFile {
            path: path.to_path_buf(),
        })?;
        let file_size = usize::try_from(metadata.len()).unwrap_or(usize::MAX);
        if file_size > limit {
            return Err(ConfigError::InvalidValue {
                field: "file_size".to_string(),
                value: format!("{file_size} bytes"),
                expected: format!("at most {limit} bytes"),
            });
        }

        let raw_content = std::fs::read_to_string(path).map_err(|_| ConfigError::MissingFile {
            path: path.to_path_buf(),
        })?;

        self.load_str(&raw_content, path)
    }

    /// Loads a catalog from YAML text; `path` is only used in messages.
    ///
    /// # Errors
    ///
    /// Same as [`load`](Self::load), minus the file access errors.
    pub fn load_str(&self, raw_content: &str, path: &Path) -> Result<LoadResult, ConfigError> {
        let mut warnings = Vec::new();

        let raw_content = raw_content.strip_prefix('\u{feff}').unwrap_or(raw_content);

        let mut env_sub = EnvSubstitution::new();
        let substituted = env_sub
            .substitute(raw_content, path)
            .map_err(|err| with_path(err, path))?;
        warnings.extend(env_sub.warnings);

        let root: Value = serde_yaml::from_str(&substituted).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            line: e.location().map(|l| l.line()),
            message: e.to_string(),
        })?;

        if root.is_null() {
            return Err(ConfigError::ParseError {
                path: path.to_path_buf(),
                line: None,
                message: "Catalog file is empty".to_string(),
            });
        }

        let config: CatalogConfig =
            serde_yaml::from_value(root).map_err(|e| ConfigError::ParseError {
                path: path.to_path_buf(),
                line: None,
                message: format!("Failed to deserialize catalog: {e}"),
            })?;

        let mut validator = Validator::new();
        let validation = validator.validate(&config, &self.options.config_limits);

        if validation.has_errors() {
            return Err(ConfigError::ValidationError {
                path: path.display().to_string(),
                errors: validation.errors,
            });
        }

        warnings.extend(validation.warnings.into_iter().map(|issue| LoadWarning {
            message: issue.message,
            location: Some(issue.path),
        }));

        tracing::debug!(
            path = %path.display(),
            packets = config.game.packets.len(),
            warnings = warnings.len(),
            "catalog loaded"
        );

        Ok(LoadResult {
            config: Arc::new(config),
            warnings,
        })
    }
}

/// Fills in the file path on parse errors raised before it was known.
fn with_path(err: ConfigError, path: &Path) -> ConfigError {
    match err {
        ConfigError::ParseError {
            path: empty,
            line,
            message,
        } if empty.as_os_str().is_empty() => ConfigError::ParseError {
            path: path.to_path_buf(),
            line,
            message,
        },
        other => other,
    }
}

// ============================================================================
// Environment Variable Substitution
// ============================================================================

/// Pre-parse environment variable substitution.
///
/// Runs on raw YAML text before parsing so substituted numbers keep their
/// YAML type.
struct EnvSubstitution {
    warnings: Vec<LoadWarning>,
}

type Chars<'a> = std::iter::Peekable<std::str::Chars<'a>>;

impl EnvSubstitution {
    const fn new() -> Self {
        Self {
            warnings: Vec::new(),
        }
    }

    /// Substitutes environment variables in raw YAML text.
    ///
    /// Supports:
    /// - `${VAR}` - expand to value (empty string if unset, with warning)
    /// - `${VAR:-default}` - expand to default if unset
    /// - `${VAR:?message}` - fail if unset
    /// - `$$` - literal `$`
    fn substitute(&mut self, raw_yaml: &str, source_path: &Path) -> Result<String, ConfigError> {
        let mut result = String::with_capacity(raw_yaml.len());
        let mut chars = raw_yaml.chars().peekable();

        while let Some(c) = chars.next() {
            if c != '$' {
                result.push(c);
                continue;
            }

            match chars.peek() {
                Some('$') => {
                    chars.next();
                    result.push('$');
                }
                Some('{') => {
                    chars.next();
                    let spec = Self::parse_var_spec(&mut chars)?;

                    match std::env::var(&spec.name) {
                        Ok(value) => result.push_str(&value),
                        Err(_) => match spec.fallback {
                            Fallback::Default(default) => result.push_str(&default),
                            Fallback::Required(message) => {
                                return Err(ConfigError::EnvVarNotSet {
                                    var: spec.name,
                                    location: message,
                                });
                            }
                            Fallback::Empty => self.warnings.push(LoadWarning {
                                message: format!(
                                    "Environment variable '{}' is not set, using empty string",
                                    spec.name
                                ),
                                location: Some(source_path.display().to_string()),
                            }),
                        },
                    }
                }
                _ => result.push(c),
            }
        }

        Ok(result)
    }

    /// Parses the inside of `${...}`, consuming the closing brace.
    fn parse_var_spec(chars: &mut Chars<'_>) -> Result<VarSpec, ConfigError> {
        let mut name = String::new();

        while let Some(c) = chars.next() {
            match c {
                '}' => {
                    return Ok(VarSpec {
                        name,
                        fallback: Fallback::Empty,
                    });
                }
                ':' if chars.peek() == Some(&'-') => {
                    chars.next();
                    let default = Self::read_until_close(chars)?;
                    return Ok(VarSpec {
                        name,
                        fallback: Fallback::Default(default),
                    });
                }
                ':' if chars.peek() == Some(&'?') => {
                    chars.next();
                    let message = Self::read_until_close(chars)?;
                    return Ok(VarSpec {
                        name,
                        fallback: Fallback::Required(message),
                    });
                }
                _ => name.push(c),
            }
        }

        Err(unclosed(&name))
    }

    /// Reads until the matching `}`, keeping nested braces.
    fn read_until_close(chars: &mut Chars<'_>) -> Result<String, ConfigError> {
        let mut value = String::new();
        let mut depth = 1;

        for c in chars.by_ref() {
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(value);
                    }
                }
                _ => {}
            }
            value.push(c);
        }

        Err(unclosed(&value))
    }
}

struct VarSpec {
    name: String,
    fallback: Fallback,
}

enum Fallback {
    Empty,
    Default(String),
    Required(String),
}

fn unclosed(fragment: &str) -> ConfigError {
    ConfigError::ParseError {
        path: std::path::PathBuf::new(),
        line: None,
        message: format!("Unclosed environment variable reference: ${{{fragment}"),
    }
}

/// Reads an environment variable and parses it, falling back to `default`.
fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CATALOG: &str = r"
game:
  duration: 300
  human_role:
    type: human
    fault: None
  penalties: [Sing, Dance, Hop]
  suspect_backgrounds: [Baker, Pilot, Nurse]
  packets:
    - name: Factory
      roles:
        - type: robot
          fault: Cannot lie
          traits: [Polite]
ids:
  words: [Red, Fox, Jump, Blue]
  word_count: 2
";

    fn load(text: &str) -> Result<LoadResult, ConfigError> {
        ConfigLoader::with_defaults().load_str(text, Path::new("catalog.yaml"))
    }

    #[test]
    fn test_load_valid_catalog() {
        let result = load(CATALOG).unwrap();
        assert_eq!(result.config.game.packets.len(), 1);
        assert_eq!(result.config.game.penalty_count, 3);
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_load_strips_bom() {
        let text = format!("\u{feff}{CATALOG}");
        assert!(load(&text).is_ok());
    }

    #[test]
    fn test_empty_catalog_rejected() {
        match load("") {
            Err(ConfigError::ParseError { message, .. }) => assert!(message.contains("empty")),
            other => panic!("expected ParseError, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_role_type_is_parse_error() {
        let text = CATALOG.replace("type: robot", "type: android");
        assert!(matches!(load(&text), Err(ConfigError::ParseError { .. })));
    }

    #[test]
    fn test_validation_errors_reported_together() {
        let text = CATALOG
            .replace("word_count: 2", "word_count: 0")
            .replace("duration: 300", "duration: 0");
        match load(&text) {
            Err(ConfigError::ValidationError { errors, .. }) => {
                assert!(errors.iter().any(|e| e.path == "ids.word_count"));
                assert!(errors.iter().any(|e| e.path == "game.duration"));
            }
            other => panic!("expected ValidationError, got {other:?}"),
        }
    }

    #[test]
    fn test_validation_warnings_surface() {
        let text = CATALOG.replace("[Sing, Dance, Hop]", "[Sing, Dance, Hop, Sing]");
        let result = load(&text).unwrap();
        assert!(
            result
                .warnings
                .iter()
                .any(|w| w.location.as_deref() == Some("game.penalties[3]"))
        );
    }

    #[test]
    fn test_env_default_keeps_number_type() {
        let text = CATALOG.replace(
            "duration: 300",
            "duration: ${INTERROGATION_TEST_UNSET_DURATION_Q7:-120}",
        );
        let result = load(&text).unwrap();
        assert_eq!(result.config.game.duration, 120);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CATALOG.as_bytes()).unwrap();
        let result = ConfigLoader::with_defaults().load(file.path()).unwrap();
        assert_eq!(result.config.ids.word_count, 2);
    }

    #[test]
    fn test_missing_file() {
        let err = ConfigLoader::with_defaults()
            .load(Path::new("/definitely/not/here.yaml"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingFile { .. }));
    }

    #[test]
    fn test_size_limit() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CATALOG.as_bytes()).unwrap();
        let loader = ConfigLoader::new(LoaderOptions {
            config_limits: ConfigLimits {
                max_config_size: 16,
                ..ConfigLimits::default()
            },
        });
        assert!(matches!(
            loader.load(file.path()),
            Err(ConfigError::InvalidValue { field, .. }) if field == "file_size"
        ));
    }

    #[test]
    fn test_env_substitution_default() {
        let mut sub = EnvSubstitution::new();
        let result = sub
            .substitute(
                "value: ${INTERROGATION_TEST_NONEXISTENT_VAR_XYZ123:-fallback}",
                Path::new("test.yaml"),
            )
            .unwrap();
        assert_eq!(result, "value: fallback");
    }

    #[test]
    fn test_env_substitution_nested_braces_in_default() {
        let mut sub = EnvSubstitution::new();
        let result = sub
            .substitute(
                "value: ${INTERROGATION_TEST_NONEXISTENT_VAR_XYZ124:-{a}}",
                Path::new("test.yaml"),
            )
            .unwrap();
        assert_eq!(result, "value: {a}");
    }

    #[test]
    fn test_env_substitution_set_variable() {
        let mut sub = EnvSubstitution::new();
        let result = sub
            .substitute("path: ${PATH}", Path::new("test.yaml"))
            .unwrap();
        assert!(!result.contains("${PATH}"));
        assert!(result.len() > "path: ".len());
    }

    #[test]
    fn test_env_substitution_required_missing() {
        let mut sub = EnvSubstitution::new();
        match sub.substitute(
            "value: ${INTERROGATION_TEST_REQUIRED_XYZ123:?must be set}",
            Path::new("test.yaml"),
        ) {
            Err(ConfigError::EnvVarNotSet { var, location }) => {
                assert_eq!(var, "INTERROGATION_TEST_REQUIRED_XYZ123");
                assert_eq!(location, "must be set");
            }
            other => panic!("expected EnvVarNotSet, got {other:?}"),
        }
    }

    #[test]
    fn test_env_substitution_escaped_dollar() {
        let mut sub = EnvSubstitution::new();
        let result = sub
            .substitute("price: $$100 and $5", Path::new("test.yaml"))
            .unwrap();
        assert_eq!(result, "price: $100 and $5");
    }

    #[test]
    fn test_env_substitution_missing_warning() {
        let mut sub = EnvSubstitution::new();
        let result = sub
            .substitute(
                "value: ${INTERROGATION_TEST_WARN_XYZ123}",
                Path::new("test.yaml"),
            )
            .unwrap();
        assert_eq!(result, "value: ");
        assert_eq!(sub.warnings.len(), 1);
        assert!(sub.warnings[0].message.contains("INTERROGATION_TEST_WARN_XYZ123"));
    }

    #[test]
    fn test_unclosed_reference_reports_path() {
        match load("value: ${OOPS") {
            Err(ConfigError::ParseError { path, message, .. }) => {
                assert_eq!(path, Path::new("catalog.yaml"));
                assert!(message.contains("Unclosed"));
            }
            other => panic!("expected ParseError, got {other:?}"),
        }
    }

    #[test]
    fn test_load_warning_display() {
        let warning = LoadWarning {
            message: "duplicate word".to_string(),
            location: Some("ids.words[2]".to_string()),
        };
        assert_eq!(warning.to_string(), "duplicate word at ids.words[2]");
    }
}
