// tests/config_resolution.rs

use std::fs;
use std::path::PathBuf;

use autobuild::cli::CliArgs;
use autobuild::config::{resolve_settings, DEFAULT_CONFIG_FILE};
use autobuild::errors::AutobuildError;
use autobuild::fs::RealFileSystem;
use autobuild::types::DebouncePolicy;
use autobuild::watch::register_tree;
use autobuild_test_utils::FakeRegistry;

type TestResult = Result<(), Box<dyn std::error::Error>>;

fn args_with_run(run: &str) -> CliArgs {
    CliArgs {
        run: Some(run.to_string()),
        ..CliArgs::default()
    }
}

#[test]
fn defaults_resolve_against_the_working_directory() -> TestResult {
    let dir = tempfile::tempdir()?;

    let settings = resolve_settings(&args_with_run("./app"), &RealFileSystem, dir.path())?;

    assert_eq!(settings.watch.root.path(), dir.path().canonicalize()?);
    assert_eq!(settings.build.to_string(), "go install -v");
    assert_eq!(settings.run.to_string(), "./app");
    assert_eq!(settings.watch.debounce.delay.as_millis(), 700);
    assert_eq!(settings.watch.debounce.policy, DebouncePolicy::Restart);
    Ok(())
}

#[test]
fn config_file_in_working_directory_is_used() -> TestResult {
    let dir = tempfile::tempdir()?;
    fs::create_dir(dir.path().join("src"))?;
    fs::write(
        dir.path().join(DEFAULT_CONFIG_FILE),
        r#"
[watch]
dir = "src"
include = '\.rs$'
debounce_ms = 250
debounce_policy = "fixed"

[commands]
build = "cargo build"
run = ["target/debug/app", "--listen", "127.0.0.1:3000"]
"#,
    )?;

    let settings = resolve_settings(&CliArgs::default(), &RealFileSystem, dir.path())?;

    assert_eq!(settings.watch.root.path(), dir.path().join("src").canonicalize()?);
    assert_eq!(settings.watch.matcher.include_pattern(), Some(r"\.rs$"));
    assert_eq!(settings.watch.debounce.delay.as_millis(), 250);
    assert_eq!(settings.watch.debounce.policy, DebouncePolicy::Fixed);
    assert_eq!(settings.build.program(), "cargo");
    assert_eq!(
        settings.run.args(),
        ["--listen".to_string(), "127.0.0.1:3000".to_string()]
    );
    Ok(())
}

#[test]
fn missing_run_command_is_fatal() -> TestResult {
    let dir = tempfile::tempdir()?;

    let err = resolve_settings(&CliArgs::default(), &RealFileSystem, dir.path()).unwrap_err();

    assert!(matches!(err, AutobuildError::MissingCommand("run")));
    assert_eq!(err.to_string(), "run is a required argument");
    Ok(())
}

#[test]
fn watch_dir_must_be_an_existing_directory() -> TestResult {
    let dir = tempfile::tempdir()?;
    fs::write(dir.path().join("file.go"), "package main")?;

    let mut args = args_with_run("./app");
    args.watch = Some("nope".to_string());
    let err = resolve_settings(&args, &RealFileSystem, dir.path()).unwrap_err();
    assert!(matches!(
        err,
        AutobuildError::InvalidWatchDir { ref reason, .. } if reason == "no such directory"
    ));

    args.watch = Some("file.go".to_string());
    let err = resolve_settings(&args, &RealFileSystem, dir.path()).unwrap_err();
    assert!(matches!(
        err,
        AutobuildError::InvalidWatchDir { ref reason, .. } if reason == "not a directory"
    ));
    Ok(())
}

#[test]
fn invalid_regex_and_zero_debounce_are_rejected() -> TestResult {
    let dir = tempfile::tempdir()?;

    let mut args = args_with_run("./app");
    args.exclude = Some("(unclosed".to_string());
    let err = resolve_settings(&args, &RealFileSystem, dir.path()).unwrap_err();
    assert!(matches!(err, AutobuildError::InvalidPattern { name: "exclude", .. }));

    let mut args = args_with_run("./app");
    args.debounce_ms = Some(0);
    let err = resolve_settings(&args, &RealFileSystem, dir.path()).unwrap_err();
    assert!(matches!(err, AutobuildError::ConfigError(_)));
    Ok(())
}

#[test]
fn malformed_config_file_is_fatal() -> TestResult {
    let dir = tempfile::tempdir()?;
    fs::write(dir.path().join("custom.toml"), "[commands\nrun = ")?;

    let mut args = args_with_run("./app");
    args.config = Some("custom.toml".to_string());
    let err = resolve_settings(&args, &RealFileSystem, dir.path()).unwrap_err();

    assert!(matches!(err, AutobuildError::TomlError(_)));
    Ok(())
}

#[test]
fn real_tree_walk_skips_excluded_directories() -> TestResult {
    let dir = tempfile::tempdir()?;
    for sub in ["src/pkg", ".git/objects", "vendor/dep", "docs"] {
        fs::create_dir_all(dir.path().join(sub))?;
    }
    fs::write(dir.path().join("src/main.go"), "package main")?;

    let settings = resolve_settings(&args_with_run("./app"), &RealFileSystem, dir.path())?;
    let mut registry = FakeRegistry::new();
    let summary = register_tree(
        &RealFileSystem,
        &mut registry,
        settings.watch.root.path(),
        &settings.watch.matcher,
    )?;

    let root = dir.path().canonicalize()?;
    let expected: Vec<PathBuf> = vec![
        root.clone(),
        root.join("docs"),
        root.join("src"),
        root.join("src/pkg"),
    ];
    assert_eq!(registry.registered(), expected);
    assert_eq!(summary.registered, 4);
    assert_eq!(summary.excluded, 2);
    Ok(())
}
