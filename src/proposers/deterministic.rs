//! Deterministic session proposer

use crate::config::SchedulerConfig;
use crate::error::Result;
use crate::planner::allocator;
use crate::proposers::{ProposerKind, SessionProposer};
use crate::types::{PlanRequest, SessionCandidate};
use async_trait::async_trait;

/// Proposer that computes the schedule locally
///
/// Wraps the allocation policy behind the proposer strategy so it is
/// interchangeable with the gateway proposer. Identical requests always
/// yield identical candidates.
pub struct DeterministicProposer {
    tuning: SchedulerConfig,
}

impl DeterministicProposer {
    /// Create a proposer with the given scheduler tuning
    pub fn new(tuning: SchedulerConfig) -> Self {
        Self { tuning }
    }
}

#[async_trait]
impl SessionProposer for DeterministicProposer {
    fn kind(&self) -> ProposerKind {
        ProposerKind::Deterministic
    }

    async fn propose(&self, request: &PlanRequest) -> Result<Vec<SessionCandidate>> {
        let sessions = allocator::allocate(request, &self.tuning)?;
        Ok(sessions.into_iter().map(SessionCandidate::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{parse_instant, Deadline, PreferredWindow, Priority};
    use chrono::NaiveDate;

    fn request() -> PlanRequest {
        PlanRequest {
            deadlines: vec![Deadline {
                subject: "Math".to_string(),
                title: "Math final".to_string(),
                exam_date: parse_instant("2024-02-01").unwrap(),
                priority: Priority::High,
            }],
            daily_study_hours: 3.0,
            preferred_window: PreferredWindow::Afternoon,
            range_start: NaiveDate::from_ymd_opt(2024, 1, 25).unwrap(),
            range_end: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_proposes_candidates_with_string_timestamps() {
        let proposer = DeterministicProposer::new(SchedulerConfig::default());
        let candidates = proposer.propose(&request()).await.unwrap();
        assert!(!candidates.is_empty());
        for candidate in &candidates {
            assert!(candidate.start_time.is_string());
            assert!(candidate.end_time.is_string());
            assert_eq!(candidate.subject.as_str(), Some("Math"));
        }
    }

    #[tokio::test]
    async fn test_candidates_are_reproducible() {
        let proposer = DeterministicProposer::new(SchedulerConfig::default());
        let first = proposer.propose(&request()).await.unwrap();
        let second = proposer.propose(&request()).await.unwrap();
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }
}
