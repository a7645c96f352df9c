//! # capbot-pipeline
//!
//! Entry point of the topic workflow core. One call,
//! [`Orchestrator::submit_for_review`], drives a submission from
//! candidate drafting through duplicate checking and bounded automatic
//! revision to an approved, indexed version, and always terminates in
//! exactly one of Committed, Escalated, or Failed.

pub mod orchestrator;
pub mod outcome;

pub use orchestrator::Orchestrator;
pub use outcome::{FailureCause, PipelineOutcome, SubmitOptions, SubmitRequest};
