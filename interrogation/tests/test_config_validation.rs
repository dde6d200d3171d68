mod common;

use std::io::Write;

use interrogation::config::{ConfigLoader, ConfigLimits, LoaderOptions};
use interrogation::error::ConfigError;

use common::{fixture_path, load_fixture};

#[test]
fn fixture_catalog_loads_with_defaults_applied() {
    let catalog = load_fixture("game.yaml");
    assert_eq!(catalog.game.duration, 300);
    assert_eq!(catalog.game.packets.len(), 2);
    assert_eq!(catalog.game.packets[1].description, None);
    assert!(catalog.game.packets[1].roles[0].traits.is_empty());
    assert_eq!(catalog.ids.words.len(), 8);
}

#[test]
fn warnings_do_not_block_loading() {
    let result = ConfigLoader::with_defaults()
        .load(&fixture_path("warnings.yaml"))
        .unwrap();

    let messages: Vec<String> = result.warnings.iter().map(ToString::to_string).collect();
    assert!(
        messages.iter().any(|m| m.contains("Duplicate entry")),
        "{messages:?}"
    );
    assert!(
        messages.iter().any(|m| m.contains("only by case")),
        "{messages:?}"
    );
}

#[test]
fn invalid_catalog_reports_every_error() {
    let err = ConfigLoader::with_defaults()
        .load(&fixture_path("invalid.yaml"))
        .unwrap_err();

    let ConfigError::ValidationError { errors, .. } = err else {
        panic!("expected ValidationError, got {err:?}");
    };
    let paths: Vec<&str> = errors.iter().map(|e| e.path.as_str()).collect();
    for expected in [
        "game.duration",
        "game.interference_length",
        "game.human_role.type",
        "game.packets",
        "game.penalties",
        "ids.words",
    ] {
        assert!(paths.contains(&expected), "missing {expected} in {paths:?}");
    }
}

#[test]
fn missing_required_field_is_a_parse_error() {
    let err = ConfigLoader::with_defaults()
        .load(&fixture_path("missing_field.yaml"))
        .unwrap_err();
    match err {
        ConfigError::ParseError { path, .. } => {
            assert!(path.ends_with("missing_field.yaml"));
        }
        other => panic!("expected ParseError, got {other:?}"),
    }
}

#[test]
fn oversized_catalog_is_rejected_before_parsing() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&std::fs::read(fixture_path("game.yaml")).unwrap())
        .unwrap();

    let loader = ConfigLoader::new(LoaderOptions {
        config_limits: ConfigLimits {
            max_config_size: 64,
            ..ConfigLimits::default()
        },
    });
    assert!(loader.load(file.path()).is_err());
}

#[test]
fn packet_limit_is_enforced() {
    let loader = ConfigLoader::new(LoaderOptions {
        config_limits: ConfigLimits {
            max_packets: 1,
            ..ConfigLimits::default()
        },
    });
    let err = loader.load(&fixture_path("game.yaml")).unwrap_err();
    assert!(matches!(err, ConfigError::ValidationError { .. }));
}
