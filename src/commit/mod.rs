//! Commit pipeline: diff summaries, message synthesis, and batch orchestration.

pub mod diff_lines;
pub mod message;
pub mod orchestrator;

pub use diff_lines::{DiffLine, render, summarize_diff};
pub use message::{ChangeReport, CommitMessageBuilder, DateFormat, ListChanges};
pub use orchestrator::{BatchOutcome, CommitOrchestrator};
