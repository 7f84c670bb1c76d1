//! Line-cli boundary scenarios: a single-step run end to end, and the
//! workflow-failed policy.

use antkeeper::app::App;
use antkeeper::cli::execute_run;
use antkeeper::runner::Runner;
use antkeeper::state::State;
use serde_json::json;
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

fn echo_app(dir: &Path) -> App {
    let mut app = App::new(dir.join("logs"), dir.join("state"), dir.join("worktrees"));
    app.register("echo", |_runner: &Runner, mut state: State| {
        let prompt = state.get("prompt").cloned().unwrap_or_default();
        state.insert("echoed".into(), prompt);
        Ok(state)
    })
    .unwrap();
    app.register("doomed", |runner: &Runner, _state: State| {
        Err(runner.fail("boom"))
    })
    .unwrap();
    app
}

#[test]
fn run_echo_from_prompt_file() {
    let dir = TempDir::new().unwrap();
    let prompt_file = dir.path().join("prompt.txt");
    std::fs::write(&prompt_file, "hi").unwrap();
    let app = Arc::new(echo_app(dir.path()));

    let state = execute_run(app, "echo", &[prompt_file], &[], None).unwrap();

    assert_eq!(state["prompt"], "hi");
    assert_eq!(state["echoed"], "hi");
    assert_eq!(state["workflow_name"], "echo");
    let run_id = state["run_id"].as_str().unwrap();
    assert_eq!(run_id.len(), 8);

    // Exactly one .log and one .json artifact, paired by stem.
    let names = |subdir: &str| -> Vec<String> {
        std::fs::read_dir(dir.path().join(subdir))
            .unwrap()
            .map(|entry| entry.unwrap().file_name().into_string().unwrap())
            .collect()
    };
    let logs = names("logs");
    let states = names("state");
    assert_eq!(logs.len(), 1);
    assert_eq!(states.len(), 1);
    assert_eq!(
        logs[0].trim_end_matches(".log"),
        states[0].trim_end_matches(".json")
    );

    let on_disk = antkeeper::state::read_snapshot(&dir.path().join("state").join(&states[0])).unwrap();
    assert_eq!(on_disk, state);
}

#[test]
fn initial_state_pairs_and_model_flow_through() {
    let dir = TempDir::new().unwrap();
    let prompt_file = dir.path().join("prompt.txt");
    std::fs::write(&prompt_file, "hi").unwrap();
    let app = Arc::new(echo_app(dir.path()));

    let pairs = vec!["env=prod".to_string()];
    let state = execute_run(app, "echo", &[prompt_file], &pairs, Some("opus")).unwrap();
    assert_eq!(state["env"], "prod");
    assert_eq!(state["model"], "opus");
}

#[test]
fn workflow_failure_surfaces_the_bare_message() {
    let dir = TempDir::new().unwrap();
    let prompt_file = dir.path().join("prompt.txt");
    std::fs::write(&prompt_file, "hi").unwrap();
    let app = Arc::new(echo_app(dir.path()));

    let error = execute_run(app, "doomed", &[prompt_file], &[], None).unwrap_err();
    assert!(error.is_expected());
    assert_eq!(error.to_string(), "boom");
}

#[test]
fn unknown_workflow_is_expected_failure() {
    let dir = TempDir::new().unwrap();
    let prompt_file = dir.path().join("prompt.txt");
    std::fs::write(&prompt_file, "hi").unwrap();
    let app = Arc::new(echo_app(dir.path()));

    let error = execute_run(app, "missing", &[prompt_file], &[], None).unwrap_err();
    assert!(error.is_expected());
    assert_eq!(error.to_string(), "Unknown workflow: missing");
}

#[test]
fn composed_workflow_snapshots_every_step() {
    let dir = TempDir::new().unwrap();
    let prompt_file = dir.path().join("prompt.txt");
    std::fs::write(&prompt_file, "hi").unwrap();

    let mut app = echo_app(dir.path());
    app.register("stamp", |_runner: &Runner, mut state: State| {
        state.insert("stamped".into(), json!(true));
        Ok(state)
    })
    .unwrap();
    app.register("pipeline", |runner: &Runner, state: State| {
        antkeeper::run_workflow(runner, state, &["echo", "stamp"])
    })
    .unwrap();

    let state = execute_run(Arc::new(app), "pipeline", &[prompt_file], &[], None).unwrap();
    assert_eq!(state["echoed"], "hi");
    assert_eq!(state["stamped"], true);
}
