//! Plan request validation
//!
//! Turns a raw wire-level [`PlanRequestBody`] into a validated
//! [`PlanRequest`] or rejects it with a specific, human-actionable
//! message. Validation is a pure function with no side effects; the first
//! failing check is reported, structural checks before semantic ones.

use crate::error::{ExamplanError, Result};
use crate::types::{
    parse_day, parse_instant, Deadline, DeadlineBody, PlanRequest, PlanRequestBody,
    PreferredWindow, Priority, MAX_DEADLINES,
};
use serde_json::Value as JsonValue;

/// Validate a raw plan request
///
/// # Arguments
///
/// * `body` - Raw request as received on the wire
///
/// # Returns
///
/// Returns a fully validated [`PlanRequest`]; no partially validated state
/// ever escapes this function.
///
/// # Errors
///
/// Returns [`ExamplanError::Validation`] describing the first violated
/// constraint: deadline count (1 to 50), per-deadline field shapes and
/// bounds, daily hours in [1, 16], the recognized study time labels, and a
/// parseable, ordered date range.
pub fn validate(body: &PlanRequestBody) -> Result<PlanRequest> {
    if body.deadlines.is_empty() {
        return Err(ExamplanError::Validation(
            "At least one exam deadline is required to generate a plan".to_string(),
        )
        .into());
    }
    if body.deadlines.len() > MAX_DEADLINES {
        return Err(ExamplanError::Validation(format!(
            "A plan can include at most {} exam deadlines",
            MAX_DEADLINES
        ))
        .into());
    }

    let mut deadlines = Vec::with_capacity(body.deadlines.len());
    for (index, entry) in body.deadlines.iter().enumerate() {
        deadlines.push(validate_deadline(index + 1, entry)?);
    }

    let daily_study_hours = match body.daily_study_hours {
        Some(hours) if hours.is_finite() && (1.0..=16.0).contains(&hours) => hours,
        _ => {
            return Err(ExamplanError::Validation(
                "Daily study hours must be between 1 and 16".to_string(),
            )
            .into())
        }
    };

    let preferred_window = body
        .preferred_study_time
        .as_deref()
        .and_then(PreferredWindow::parse)
        .ok_or_else(|| {
            ExamplanError::Validation(
                "Preferred study time must be one of morning, afternoon, evening, or night"
                    .to_string(),
            )
        })?;

    let range_start = body
        .start_date
        .as_deref()
        .and_then(parse_day)
        .ok_or_else(|| {
            ExamplanError::Validation("Start date is not a valid date".to_string())
        })?;
    let range_end = body
        .end_date
        .as_deref()
        .and_then(parse_day)
        .ok_or_else(|| ExamplanError::Validation("End date is not a valid date".to_string()))?;

    if range_start > range_end {
        return Err(
            ExamplanError::Validation("Start date must be before end date".to_string()).into(),
        );
    }

    Ok(PlanRequest {
        deadlines,
        daily_study_hours,
        preferred_window,
        range_start,
        range_end,
    })
}

/// Validate one raw deadline entry
fn validate_deadline(position: usize, entry: &DeadlineBody) -> Result<Deadline> {
    let subject = string_in_bounds(&entry.subject, 100).ok_or_else(|| {
        ExamplanError::Validation(format!(
            "Deadline {}: subject must be a string of 1 to 100 characters",
            position
        ))
    })?;

    let title = string_in_bounds(&entry.title, 200).ok_or_else(|| {
        ExamplanError::Validation(format!(
            "Deadline {}: title must be a string of 1 to 200 characters",
            position
        ))
    })?;

    let exam_date = entry
        .exam_date
        .as_str()
        .and_then(parse_instant)
        .ok_or_else(|| {
            ExamplanError::Validation(format!(
                "Deadline {}: exam date is not a valid date",
                position
            ))
        })?;

    // Absent priority defaults to medium; a present but unrecognized value
    // is a caller mistake.
    let priority = match &entry.priority {
        JsonValue::Null => Priority::Medium,
        JsonValue::String(label) => Priority::parse(label).ok_or_else(|| {
            ExamplanError::Validation(format!(
                "Deadline {}: priority must be one of low, medium, or high",
                position
            ))
        })?,
        _ => {
            return Err(ExamplanError::Validation(format!(
                "Deadline {}: priority must be one of low, medium, or high",
                position
            ))
            .into())
        }
    };

    Ok(Deadline {
        subject,
        title,
        exam_date,
        priority,
    })
}

/// Extract a non-empty string within a character bound, if the value is one
fn string_in_bounds(value: &JsonValue, max_chars: usize) -> Option<String> {
    let text = value.as_str()?;
    let length = text.chars().count();
    if (1..=max_chars).contains(&length) {
        Some(text.to_string())
    } else {
        None
    }
}
