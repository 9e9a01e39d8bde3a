//! Integration tests for configuration files
//!
//! These tests go from TOML on disk to running pipes:
//! - Save and load round trips
//! - Building junctions from a loaded file
//! - Error reporting for bad files

mod common;

use common::builders::{MessageBuilder, PipeConfigBuilder};
use common::recorders::Recorder;
use pipeworks::config::{FittingConfig, PipeworksConfig};
use pipeworks::pipeline::{
    FilterControl, FilterMode, PipelineBuilder, PipelineError, QueueControl, QueueMode,
};
use pipeworks::scripting::builtins;
use serde_json::json;
use tempfile::TempDir;

const TOPOLOGY: &str = r#"
[logging]
level = "warn"

[[pipes]]
name = "to-logger"
endpoints = [
    { module = "shell", direction = "output" },
    { module = "logger", direction = "input" },
]

[[pipes.chain]]
kind = "filter"
name = "gate"
script = "priority <= params.min_priority"
params = { min_priority = 5 }

[[pipes.chain]]
kind = "queue"
mode = "sort"

[[pipes]]
name = "to-shell"
endpoints = [
    { module = "logger", direction = "output" },
    { module = "shell", direction = "input" },
]
"#;

#[test]
fn test_save_and_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("pipeworks.toml");

    let config = PipeworksConfig {
        pipes: vec![PipeConfigBuilder::new("events", "a", "b")
            .fitting(FittingConfig::Filter {
                name: "promote".to_string(),
                script: Some(builtins::PROMOTE_URGENT.trim().to_string()),
                params: None,
                mode: FilterMode::Bypass,
            })
            .fitting(FittingConfig::Queue {
                mode: QueueMode::Fifo,
            })
            .fitting(FittingConfig::Split)
            .build()],
        ..Default::default()
    };

    config.save(&path).unwrap();
    assert!(path.exists());
    let loaded = PipeworksConfig::load(&path).unwrap();
    assert_eq!(loaded, config);
}

#[test]
fn test_loaded_file_drives_modules() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("topology.toml");
    std::fs::write(&path, TOPOLOGY).unwrap();

    let config = PipeworksConfig::load(&path).unwrap();
    assert_eq!(config.logging.level, "warn");

    let built = PipelineBuilder::new().build(&config).unwrap();
    let shell = built.junction("shell").unwrap();
    let logger = built.junction("logger").unwrap();

    let logged = Recorder::new();
    logger.add_pipe_listener("to-logger", logged.listener()).unwrap();
    let answered = Recorder::new();
    shell.add_pipe_listener("to-shell", answered.listener()).unwrap();

    shell
        .send_message("to-logger", MessageBuilder::new().priority(5).build())
        .unwrap();
    let err = shell
        .send_message("to-logger", MessageBuilder::new().priority(10).build())
        .unwrap_err();
    assert_eq!(
        err,
        PipelineError::Rejected {
            filter: "gate".to_string()
        }
    );
    shell
        .send_message("to-logger", MessageBuilder::new().priority(1).build())
        .unwrap();

    // Loosen the gate in-band, then let everything through
    shell
        .send_message(
            "to-logger",
            FilterControl::set_params("gate", json!({"min_priority": 10})),
        )
        .unwrap();
    shell
        .send_message("to-logger", MessageBuilder::new().priority(10).build())
        .unwrap();

    assert!(logged.is_empty());
    shell.send_message("to-logger", QueueControl::flush()).unwrap();
    assert_eq!(logged.priorities(), vec![1, 5, 10]);

    logger
        .send_message("to-shell", MessageBuilder::new().build())
        .unwrap();
    assert_eq!(answered.len(), 1);
}

#[test]
fn test_missing_file_is_an_error() {
    let dir = TempDir::new().unwrap();
    let err = PipeworksConfig::load(dir.path().join("absent.toml")).unwrap_err();
    assert!(err.to_string().contains("Failed to read config file"));

    let fallback = PipeworksConfig::load_or_default(dir.path().join("absent.toml"));
    assert_eq!(fallback, PipeworksConfig::default());
}

#[test]
fn test_unknown_fitting_kind_is_an_error() {
    let err = PipeworksConfig::from_toml_str(
        r#"
[[pipes]]
name = "x"
[[pipes.chain]]
kind = "valve"
"#,
    )
    .unwrap_err();
    assert!(err.to_string().contains("Failed to parse configuration"));
}
