//! Shared helpers for integration tests

use serde_json::{json, Value as JsonValue};

/// A well-formed plan request body with a single high-priority Math exam
pub fn math_request() -> JsonValue {
    json!({
        "deadlines": [
            {
                "subject": "Math",
                "title": "Math final",
                "exam_date": "2024-02-01",
                "priority": "high"
            }
        ],
        "dailyStudyHours": 3.0,
        "preferredStudyTime": "afternoon",
        "startDate": "2024-01-25",
        "endDate": "2024-01-31"
    })
}
