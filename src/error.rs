//! Error types for Examplan
//!
//! This module defines all error types used throughout the crate,
//! using `thiserror` for ergonomic error handling. Each variant maps to
//! one class of the failure taxonomy: caller mistakes (validation),
//! authorization denials, transient upstream failures, malformed upstream
//! output, and internal invariant violations.

use thiserror::Error;

/// Main error type for Examplan operations
///
/// This enum encompasses all possible errors that can occur during plan
/// request validation, usage gating, session proposal (deterministic or
/// gateway-backed), and normalization.
#[derive(Error, Debug)]
pub enum ExamplanError {
    /// Caller supplied a malformed or out-of-range plan request
    #[error("{0}")]
    Validation(String),

    /// The usage gate denied this caller (quota exhausted / not premium)
    #[error("{0}")]
    FeatureGated(String),

    /// The upstream generator rejected the request due to rate limiting
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// The upstream generator is unreachable or returned a failure status
    #[error("Plan generator unavailable: {0}")]
    UpstreamUnavailable(String),

    /// The upstream generator produced output that is not a session array
    #[error("Malformed generator output: {0}")]
    MalformedUpstream(String),

    /// Internal allocation logic produced an impossible schedule
    #[error("Scheduling invariant violated: {0}")]
    Invariant(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// HTTP request errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for Examplan operations
///
/// This is a convenience alias that uses `anyhow::Error` as the error type,
/// allowing for rich error context and easy error propagation.
pub type Result<T> = anyhow::Result<T>;
