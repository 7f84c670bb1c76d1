//! Antkeeper: a workflow execution engine.
//!
//! Given a named handler and an initial state, Antkeeper runs the handler
//! under a uniquely-identified execution context, durably records progress,
//! and surfaces per-step output to one of three I/O boundaries: the command
//! line, an HTTP webhook, or a Slack thread fed by a debounced event
//! stream.
//!
//! The moving parts:
//!
//! - [`App`]: the registry mapping workflow names to handlers, plus the
//!   artifact directories.
//! - [`Runner`]: one per invocation; owns the run id, the per-run log
//!   file, and the state snapshot file.
//! - [`run_workflow`]: folds state through a sequence of registered
//!   handlers, snapshotting between steps.
//! - [`Channel`]: the boundary abstraction; progress and errors flow
//!   through it, formatted per boundary.
//! - `server`: the axum endpoints, including the Slack event coalescer
//!   that turns a bursty mention-edit-reply stream into one dispatch.

pub mod app;
pub mod channels;
pub mod cli;
pub mod config;
pub mod error;
pub mod git;
pub mod run_log;
pub mod runner;
pub mod server;
pub mod slack;
pub mod state;
pub mod workflow;

pub use app::{App, Handler};
pub use channels::{ApiChannel, Channel, CliChannel, SlackChannel};
pub use error::WorkflowError;
pub use runner::Runner;
pub use state::State;
pub use workflow::run_workflow;
