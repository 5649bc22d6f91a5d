//! Session proposer strategies
//!
//! A proposer turns a validated plan request into raw session candidates.
//! The deterministic proposer computes the schedule locally; the gateway
//! proposer asks an OpenAI-compatible chat-completions service to draft
//! one. Both produce candidates in the same loose shape, which the
//! normalizer then hardens. Callers pick a strategy by name through
//! [`create_proposer`].

pub mod deterministic;
pub mod gateway;

use crate::config::ProposerConfig;
use crate::error::{ExamplanError, Result};
use crate::types::{PlanRequest, SessionCandidate};
use async_trait::async_trait;

pub use deterministic::DeterministicProposer;
pub use gateway::GatewayProposer;

/// Which family of proposer produced a candidate set
///
/// The normalizer marks sessions from a generative proposer so clients can
/// distinguish drafted plans from computed ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProposerKind {
    /// Locally computed, reproducible schedule
    Deterministic,
    /// Drafted by a generative gateway
    Generative,
}

/// Strategy for proposing study sessions
#[async_trait]
pub trait SessionProposer: Send + Sync {
    /// The proposer family, used to mark generated sessions
    fn kind(&self) -> ProposerKind;

    /// Propose raw session candidates for a validated request
    ///
    /// # Errors
    ///
    /// Gateway-backed proposers surface rate limiting, payment gating, and
    /// upstream failures as typed errors; the deterministic proposer only
    /// fails on internal invariant violations.
    async fn propose(&self, request: &PlanRequest) -> Result<Vec<SessionCandidate>>;
}

/// Create a proposer from configuration
///
/// # Arguments
///
/// * `config` - Proposer section of the application config
///
/// # Errors
///
/// Returns a configuration error for an unknown proposer type.
pub fn create_proposer(config: &ProposerConfig) -> Result<Box<dyn SessionProposer>> {
    match config.proposer_type.as_str() {
        "deterministic" => Ok(Box::new(DeterministicProposer::new(
            config.scheduler.clone(),
        ))),
        "gateway" => Ok(Box::new(GatewayProposer::new(config.gateway.clone())?)),
        other => Err(ExamplanError::Config(format!(
            "Unknown proposer type: {}. Use 'deterministic' or 'gateway'.",
            other
        ))
        .into()),
    }
}
