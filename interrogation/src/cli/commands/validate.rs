//! `validate` command
//!
//! Loads each catalog file through the full loading pipeline and reports
//! every error and warning found.

use std::path::Path;

use serde::Serialize;

use crate::cli::args::{OutputFormat, ValidateArgs};
use crate::config::ConfigLoader;
use crate::error::{ConfigError, InterrogationError};

/// Outcome of validating one file.
#[derive(Debug, Serialize)]
struct FileReport {
    file: String,
    valid: bool,
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl FileReport {
    fn passed(&self, strict: bool) -> bool {
        self.valid && !(strict && !self.warnings.is_empty())
    }
}

/// Validate catalog files.
///
/// # Errors
///
/// Returns `ConfigError::ValidationFailed` if any file has errors, or
/// warnings under `--strict`.
pub fn run(args: &ValidateArgs) -> Result<(), InterrogationError> {
    let loader = ConfigLoader::with_defaults();
    let reports: Vec<FileReport> = args
        .files
        .iter()
        .map(|path| check_file(&loader, path))
        .collect();

    match args.format {
        OutputFormat::Human => print_human(&reports, args.strict),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&reports)?),
    }

    let failed = reports.iter().filter(|r| !r.passed(args.strict)).count();
    if failed > 0 {
        return Err(ConfigError::ValidationFailed { count: failed }.into());
    }
    Ok(())
}

fn check_file(loader: &ConfigLoader, path: &Path) -> FileReport {
    tracing::info!(file = %path.display(), "validating catalog");
    let file = path.display().to_string();

    match loader.load(path) {
        Ok(result) => FileReport {
            file,
            valid: true,
            errors: Vec::new(),
            warnings: result.warnings.iter().map(ToString::to_string).collect(),
        },
        Err(ConfigError::ValidationError { errors, .. }) => FileReport {
            file,
            valid: false,
            errors: errors.iter().map(ToString::to_string).collect(),
            warnings: Vec::new(),
        },
        Err(other) => FileReport {
            file,
            valid: false,
            errors: vec![other.to_string()],
            warnings: Vec::new(),
        },
    }
}

fn print_human(reports: &[FileReport], strict: bool) {
    for report in reports {
        let status = if report.passed(strict) { "ok" } else { "FAILED" };
        println!("{}: {status}", report.file);
        for error in &report.errors {
            println!("  {error}");
        }
        for warning in &report.warnings {
            println!("  warning: {warning}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report(valid: bool, warnings: usize) -> FileReport {
        FileReport {
            file: "catalog.yaml".to_string(),
            valid,
            errors: Vec::new(),
            warnings: vec!["duplicate".to_string(); warnings],
        }
    }

    #[test]
    fn test_strict_fails_on_warnings() {
        assert!(report(true, 1).passed(false));
        assert!(!report(true, 1).passed(true));
        assert!(report(true, 0).passed(true));
        assert!(!report(false, 0).passed(false));
    }

    #[test]
    fn test_missing_file_reported() {
        let report = check_file(
            &ConfigLoader::with_defaults(),
            Path::new("/no/such/catalog.yaml"),
        );
        assert!(!report.valid);
        assert!(report.errors[0].contains("file not found"));
    }
}
