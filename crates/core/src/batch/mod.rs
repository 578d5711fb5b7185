//! Batch analysis and episode pre-assignment.

pub mod analyzer;
pub mod assignment;
mod types;

pub use analyzer::analyze;
pub use assignment::{assign, episode_file_name, episode_relative_path};
pub use types::{BatchAnalysis, DiscJob, EpisodeAssignment, EpisodeSlot, WaitingDisc};
