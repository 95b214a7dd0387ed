//! assessor-core: Adaptive timed-assessment engine.
//!
//! This crate defines the question and answer model, per-type answer
//! evaluation, score aggregation, recommendations, the session clock and the
//! session state machine that the rest of the assessor workspace builds on.

pub mod answer;
pub mod clock;
pub mod error;
pub mod evaluator;
pub mod events;
pub mod model;
pub mod parser;
pub mod recommendations;
pub mod report;
pub mod results;
pub mod scoring;
pub mod selector;
pub mod session;
pub mod traits;
