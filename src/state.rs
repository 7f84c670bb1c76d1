//! Workflow state and snapshot persistence.
//!
//! State is a string-keyed, insertion-ordered JSON mapping, the unit of
//! data flow through handlers. Handlers take the incoming state by value and
//! return a new one; the framework never mutates a state it handed out.
//! Snapshots are whole-file JSON writes with atomic replace semantics so a
//! reader mid-run sees either the previous snapshot or the new one.

use crate::error::WorkflowError;
use serde_json::Value;
use std::fs::{self, File};
use std::io::{BufReader, Write};
use std::path::Path;

/// Workflow data: string keys to arbitrary JSON values.
///
/// There is no schema; callers agree on keys out of band. The runner
/// reserves `run_id` and `workflow_name` and overrides them on every run.
pub type State = serde_json::Map<String, Value>;

/// Key injected by the runner: the 8-hex run identifier.
pub const RUN_ID_KEY: &str = "run_id";

/// Key injected by the runner: the name of the workflow being executed.
pub const WORKFLOW_NAME_KEY: &str = "workflow_name";

/// Write a state snapshot: two-space-indented JSON, written to a temp file
/// and atomically renamed over the target so readers never see a partial
/// write.
pub fn write_snapshot(path: &Path, state: &State) -> Result<(), WorkflowError> {
    let encoded = serde_json::to_vec_pretty(state)?;

    let tmp_path = path.with_extension("json.tmp");
    {
        let mut file = File::create(&tmp_path)?;
        file.write_all(&encoded)?;
        file.sync_all()?;
    }
    fs::rename(&tmp_path, path)?;
    Ok(())
}

/// Read a state snapshot back from disk.
pub fn read_snapshot(path: &Path) -> Result<State, WorkflowError> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    Ok(serde_json::from_reader(reader)?)
}
