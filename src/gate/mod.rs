//! Usage gating for plan generation
//!
//! Plan generation is a metered feature: free callers get a small daily
//! allowance while premium callers are unlimited. The planner consults the
//! gate exactly once per request, before any proposer work happens, so a
//! denied caller never costs gateway traffic.

use crate::config::GateConfig;
use crate::error::Result;
use async_trait::async_trait;
use chrono::{NaiveDate, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

/// Outcome of a gate check
#[derive(Debug, Clone, PartialEq)]
pub struct GateDecision {
    /// Whether the caller may generate a plan right now
    pub authorized: bool,
    /// Human-readable reason when denied
    pub reason: Option<String>,
}

impl GateDecision {
    /// An unconditional allow
    pub fn allow() -> Self {
        Self {
            authorized: true,
            reason: None,
        }
    }

    /// A denial with a caller-facing reason
    pub fn deny(reason: impl Into<String>) -> Self {
        Self {
            authorized: false,
            reason: Some(reason.into()),
        }
    }
}

/// Authorization check for plan generation
///
/// Implementations must be safe to call concurrently; the server shares one
/// gate across all requests.
#[async_trait]
pub trait UsageGate: Send + Sync {
    /// Decide whether a caller may generate a plan, recording the attempt
    ///
    /// # Arguments
    ///
    /// * `caller` - Opaque caller identity (header value or CLI flag)
    async fn authorize(&self, caller: &str) -> Result<GateDecision>;
}

/// Gate that allows every caller
///
/// Used by the CLI default and in tests where metering is irrelevant.
pub struct UnlimitedGate;

#[async_trait]
impl UsageGate for UnlimitedGate {
    async fn authorize(&self, _caller: &str) -> Result<GateDecision> {
        Ok(GateDecision::allow())
    }
}

/// In-memory metered gate with a per-caller daily allowance
///
/// Counters reset at UTC midnight. Premium callers bypass metering
/// entirely. State lives in process memory only; a restart forgets all
/// counters, which is acceptable for a daily allowance.
pub struct InMemoryUsageGate {
    free_daily_limit: u32,
    premium_callers: HashSet<String>,
    counters: Mutex<HashMap<String, (NaiveDate, u32)>>,
}

impl InMemoryUsageGate {
    /// Create a gate from configuration
    pub fn new(config: &GateConfig) -> Self {
        Self {
            free_daily_limit: config.free_daily_limit,
            premium_callers: config.premium_callers.iter().cloned().collect(),
            counters: Mutex::new(HashMap::new()),
        }
    }

    fn is_premium(&self, caller: &str) -> bool {
        self.premium_callers.contains(caller)
    }
}

#[async_trait]
impl UsageGate for InMemoryUsageGate {
    async fn authorize(&self, caller: &str) -> Result<GateDecision> {
        if self.is_premium(caller) {
            return Ok(GateDecision::allow());
        }

        let today = Utc::now().date_naive();
        let mut counters = self
            .counters
            .lock()
            .map_err(|_| anyhow::anyhow!("usage gate counters poisoned"))?;
        let entry = counters
            .entry(caller.to_string())
            .or_insert((today, 0));
        if entry.0 != today {
            *entry = (today, 0);
        }

        if entry.1 >= self.free_daily_limit {
            tracing::info!(
                "Caller {} exhausted the free daily allowance of {}",
                caller,
                self.free_daily_limit
            );
            return Ok(GateDecision::deny(format!(
                "Daily limit of {} AI-generated plans reached. Upgrade to premium for unlimited plans.",
                self.free_daily_limit
            )));
        }

        entry.1 += 1;
        Ok(GateDecision::allow())
    }
}

/// Build a gate from configuration
///
/// # Errors
///
/// Returns a configuration error for an unknown gate mode.
pub fn create_gate(config: &GateConfig) -> Result<std::sync::Arc<dyn UsageGate>> {
    match config.mode.as_str() {
        "unlimited" => Ok(std::sync::Arc::new(UnlimitedGate)),
        "metered" => Ok(std::sync::Arc::new(InMemoryUsageGate::new(config))),
        other => Err(crate::error::ExamplanError::Config(format!(
            "Unknown gate mode: {}. Use 'unlimited' or 'metered'.",
            other
        ))
        .into()),
    }
}
