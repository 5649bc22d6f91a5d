//! Session candidate normalization
//!
//! Proposer output, especially from a generative gateway, is untrusted:
//! fields may be missing, mistyped, or describe sessions that violate the
//! schedule contract. This module coerces loose fields to safe defaults
//! and drops any candidate that cannot be repaired without guessing at
//! times. Dropping is always logged; a normalized plan never contains a
//! session outside the requested window, past its subject's exam, or
//! overlapping an earlier session for the same subject.

use crate::types::{
    parse_instant, PlanRequest, SessionCandidate, StudyMethod, StudySession,
    DEFAULT_BREAK_INTERVAL_MINUTES,
};
use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;

/// Normalize raw session candidates against the originating request
///
/// # Arguments
///
/// * `candidates` - Raw proposer output, in proposal order
/// * `request` - The validated request the proposal answers
/// * `generated` - Whether a generative proposer produced these candidates
///
/// # Returns
///
/// Returns the surviving sessions in input order. Coercible defects are
/// repaired (missing subject, title, method, or break interval); defects in
/// the timestamps themselves cause the candidate to be dropped with a
/// warning rather than silently adjusted.
pub fn normalize(
    candidates: Vec<SessionCandidate>,
    request: &PlanRequest,
    generated: bool,
) -> Vec<StudySession> {
    let total = candidates.len();
    let mut kept: Vec<StudySession> = Vec::with_capacity(total);

    for (index, candidate) in candidates.into_iter().enumerate() {
        match normalize_one(candidate, request, generated, &kept) {
            Ok(session) => kept.push(session),
            Err(reason) => {
                tracing::warn!("Dropping session candidate {}: {}", index, reason);
            }
        }
    }

    if kept.len() < total {
        tracing::warn!(
            "Normalization kept {} of {} proposed sessions",
            kept.len(),
            total
        );
    }
    kept
}

/// Normalize a single candidate, or explain why it must be dropped
fn normalize_one(
    candidate: SessionCandidate,
    request: &PlanRequest,
    generated: bool,
    kept: &[StudySession],
) -> std::result::Result<StudySession, String> {
    let start_time = required_instant(&candidate.start_time, "start time")?;
    let end_time = required_instant(&candidate.end_time, "end time")?;
    if end_time <= start_time {
        return Err(format!(
            "end time {} is not after start time {}",
            end_time, start_time
        ));
    }

    let slot = request.slot();
    let window = slot
        .containing_window(start_time)
        .ok_or_else(|| format!("start time {} is outside the preferred window", start_time))?;
    if end_time > window.1 {
        return Err(format!(
            "end time {} runs past the preferred window",
            end_time
        ));
    }

    let subject = coerce_string(&candidate.subject).unwrap_or_else(|| "General".to_string());
    if let Some(exam) = matching_exam(request, &subject) {
        if start_time > exam {
            return Err(format!(
                "start time {} is after the {} exam at {}",
                start_time, subject, exam
            ));
        }
    }

    for earlier in kept.iter().filter(|s| s.subject.eq_ignore_ascii_case(&subject)) {
        if start_time < earlier.end_time && earlier.start_time < end_time {
            return Err(format!(
                "overlaps an earlier {} session at {}",
                subject, earlier.start_time
            ));
        }
    }

    let title = coerce_string(&candidate.title).unwrap_or_else(|| "Study Session".to_string());
    let study_method = coerce_method(&candidate.study_method);
    let break_interval_minutes = coerce_break_interval(&candidate.break_interval_minutes);

    Ok(StudySession {
        subject,
        title,
        start_time,
        end_time,
        study_method,
        break_interval_minutes,
        generated,
    })
}

/// Parse a required timestamp field, or explain the defect
fn required_instant(
    value: &JsonValue,
    field: &str,
) -> std::result::Result<DateTime<Utc>, String> {
    let text = value
        .as_str()
        .ok_or_else(|| format!("{} is missing or not a string", field))?;
    parse_instant(text).ok_or_else(|| format!("{} {:?} is not a valid timestamp", field, text))
}

/// Exam instant for the first deadline matching a subject, if any
///
/// Matching is case-insensitive on the subject name; the first match in
/// request order wins. A subject with no matching deadline has no exam
/// cutoff.
fn matching_exam(request: &PlanRequest, subject: &str) -> Option<DateTime<Utc>> {
    request
        .deadlines
        .iter()
        .find(|deadline| deadline.subject.eq_ignore_ascii_case(subject))
        .map(|deadline| deadline.exam_date)
}

/// Coerce a JSON value into a non-empty string
fn coerce_string(value: &JsonValue) -> Option<String> {
    value
        .as_str()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Coerce a JSON value into a known study method, defaulting to review
fn coerce_method(value: &JsonValue) -> StudyMethod {
    value
        .as_str()
        .and_then(StudyMethod::parse)
        .unwrap_or(StudyMethod::Review)
}

/// Coerce a JSON value into a positive break interval, defaulting to 25
fn coerce_break_interval(value: &JsonValue) -> u32 {
    match value.as_u64() {
        Some(minutes) if minutes > 0 && minutes <= u32::MAX as u64 => minutes as u32,
        _ => DEFAULT_BREAK_INTERVAL_MINUTES,
    }
}
