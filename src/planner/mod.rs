//! Study plan generation pipeline
//!
//! The planner wires the stages together: validate the raw request, check
//! the usage gate, run the configured proposer, and normalize the result.
//! Stages are strictly ordered; a request rejected by validation or the
//! gate never reaches a proposer.

pub mod allocator;
pub mod normalizer;
pub mod validator;

use crate::error::{ExamplanError, Result};
use crate::gate::UsageGate;
use crate::proposers::{ProposerKind, SessionProposer};
use crate::types::{PlanRequestBody, StudySession};
use std::sync::Arc;

/// End-to-end study plan generator
///
/// Holds the configured proposer strategy and usage gate. One planner is
/// shared across all server requests; it carries no per-request state.
pub struct Planner {
    gate: Arc<dyn UsageGate>,
    proposer: Box<dyn SessionProposer>,
}

impl Planner {
    /// Create a planner from its collaborators
    pub fn new(gate: Arc<dyn UsageGate>, proposer: Box<dyn SessionProposer>) -> Self {
        Self { gate, proposer }
    }

    /// Generate a normalized study plan for a caller
    ///
    /// # Arguments
    ///
    /// * `caller` - Opaque caller identity for usage gating
    /// * `body` - Raw request as received on the wire
    ///
    /// # Returns
    ///
    /// Returns the normalized sessions in schedule order. An empty plan is
    /// a valid outcome when every deadline falls outside the range.
    ///
    /// # Errors
    ///
    /// Returns [`ExamplanError::Validation`] for a malformed request,
    /// [`ExamplanError::FeatureGated`] when the gate denies the caller, and
    /// propagates proposer errors unchanged.
    pub async fn generate(&self, caller: &str, body: &PlanRequestBody) -> Result<Vec<StudySession>> {
        let request = validator::validate(body)?;

        let decision = self.gate.authorize(caller).await?;
        if !decision.authorized {
            let reason = decision.reason.unwrap_or_else(|| {
                "Plan generation limit reached. Upgrade to premium for unlimited plans."
                    .to_string()
            });
            tracing::info!("Denied plan generation for caller {}", caller);
            return Err(ExamplanError::FeatureGated(reason).into());
        }

        tracing::info!(
            "Generating plan for caller {} with {} deadlines",
            caller,
            request.deadlines.len()
        );
        let candidates = self.proposer.propose(&request).await?;
        let generated = self.proposer.kind() == ProposerKind::Generative;
        Ok(normalizer::normalize(candidates, &request, generated))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SchedulerConfig;
    use crate::gate::{GateDecision, UnlimitedGate};
    use crate::proposers::DeterministicProposer;
    use crate::types::{DeadlineBody, SessionCandidate};
    use async_trait::async_trait;
    use serde_json::json;

    struct DenyingGate;

    #[async_trait]
    impl UsageGate for DenyingGate {
        async fn authorize(&self, _caller: &str) -> Result<GateDecision> {
            Ok(GateDecision::deny(
                "Daily limit of 3 AI-generated plans reached. Upgrade to premium for unlimited plans.",
            ))
        }
    }

    struct CountingProposer;

    #[async_trait]
    impl SessionProposer for CountingProposer {
        fn kind(&self) -> ProposerKind {
            ProposerKind::Generative
        }

        async fn propose(&self, _request: &crate::types::PlanRequest) -> Result<Vec<SessionCandidate>> {
            panic!("proposer must not run for a gated caller");
        }
    }

    fn body() -> PlanRequestBody {
        PlanRequestBody {
            deadlines: vec![DeadlineBody {
                subject: json!("Math"),
                title: json!("Math final"),
                exam_date: json!("2024-02-01"),
                priority: json!("high"),
            }],
            daily_study_hours: Some(3.0),
            preferred_study_time: Some("afternoon".to_string()),
            start_date: Some("2024-01-25".to_string()),
            end_date: Some("2024-01-31".to_string()),
        }
    }

    fn deterministic_planner() -> Planner {
        Planner::new(
            Arc::new(UnlimitedGate),
            Box::new(DeterministicProposer::new(SchedulerConfig::default())),
        )
    }

    #[tokio::test]
    async fn test_generate_produces_normalized_plan() {
        let sessions = deterministic_planner()
            .generate("student", &body())
            .await
            .unwrap();
        assert!(!sessions.is_empty());
        for session in &sessions {
            assert_eq!(session.subject, "Math");
            assert!(!session.generated);
            assert!(session.end_time > session.start_time);
        }
    }

    #[tokio::test]
    async fn test_generate_is_deterministic() {
        let planner = deterministic_planner();
        let first = planner.generate("student", &body()).await.unwrap();
        let second = planner.generate("student", &body()).await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_validation_failure_reported_before_gating() {
        let planner = Planner::new(Arc::new(DenyingGate), Box::new(CountingProposer));
        let mut invalid = body();
        invalid.deadlines.clear();
        let err = planner.generate("student", &invalid).await.unwrap_err();
        assert!(err.to_string().contains("At least one exam deadline"));
    }

    #[tokio::test]
    async fn test_gate_denial_blocks_proposer() {
        let planner = Planner::new(Arc::new(DenyingGate), Box::new(CountingProposer));
        let err = planner.generate("student", &body()).await.unwrap_err();
        assert!(err.to_string().contains("Upgrade to premium"));
    }

    #[tokio::test]
    async fn test_expired_deadlines_yield_empty_plan() {
        let mut stale = body();
        stale.deadlines[0].exam_date = json!("2024-01-10");
        let sessions = deterministic_planner()
            .generate("student", &stale)
            .await
            .unwrap();
        assert!(sessions.is_empty());
    }
}
