//! # examplan
//!
//! An AI-assisted study plan generator. Given exam deadlines, a daily
//! study budget, and a preferred time of day, examplan produces a
//! normalized schedule of study sessions, either computed deterministically
//! or drafted by an OpenAI-compatible chat-completions gateway and then
//! hardened against the schedule contract.
//!
//! ## Architecture
//!
//! - **validator**: turns an untrusted wire request into a typed plan request
//! - **allocator**: deterministic urgency-weighted session scheduling
//! - **proposers**: strategy trait over deterministic and gateway proposers
//! - **normalizer**: coerces or drops proposer output against the contract
//! - **gate**: per-caller daily usage metering
//! - **server**: axum HTTP boundary exposing the planning endpoint

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod gate;
pub mod planner;
pub mod proposers;
pub mod server;
pub mod types;

pub use config::Config;
pub use error::{ExamplanError, Result};
pub use planner::Planner;
pub use types::{
    Deadline, PlanRequest, PlanRequestBody, PreferredWindow, Priority, SessionCandidate,
    StudyMethod, StudySession,
};
