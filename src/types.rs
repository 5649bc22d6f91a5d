//! Core domain types for Examplan
//!
//! This module defines the plan request model (deadlines, study windows,
//! date ranges), the generated session model, and the loosely-typed
//! candidate records exchanged with session proposers. Wire-facing
//! structures carry the exact field names of the HTTP contract:
//! camelCase request fields and snake_case session fields.

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Maximum number of deadlines accepted in a single plan request
pub const MAX_DEADLINES: usize = 50;

/// Priority tier attached to an exam deadline
///
/// Drives allocation weighting: higher tiers receive a larger share of the
/// daily study budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    /// Parse a wire-level priority label
    ///
    /// Returns `None` for unrecognized labels; absence is handled by the
    /// caller (it defaults to `Medium` when the field is missing entirely).
    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "low" => Some(Self::Low),
            "medium" => Some(Self::Medium),
            "high" => Some(Self::High),
            _ => None,
        }
    }

    /// Multiplier applied to the urgency weight for this tier
    pub fn weight_factor(self) -> f64 {
        match self {
            Self::Low => 1.0,
            Self::Medium => 2.0,
            Self::High => 3.0,
        }
    }

    /// Numeric rank used for tie-breaking (higher is more urgent)
    pub fn rank(self) -> u8 {
        match self {
            Self::Low => 0,
            Self::Medium => 1,
            Self::High => 2,
        }
    }

    /// Wire-level label for this tier
    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// Coarse time-of-day preference for study sessions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PreferredWindow {
    Morning,
    Afternoon,
    Evening,
    Night,
}

impl PreferredWindow {
    /// Parse a wire-level study time label
    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "morning" => Some(Self::Morning),
            "afternoon" => Some(Self::Afternoon),
            "evening" => Some(Self::Evening),
            "night" => Some(Self::Night),
            _ => None,
        }
    }

    /// Wire-level label for this preference
    pub fn label(self) -> &'static str {
        match self {
            Self::Morning => "morning",
            Self::Afternoon => "afternoon",
            Self::Evening => "evening",
            Self::Night => "night",
        }
    }

    /// Derive the daily clock-time window for this preference
    pub fn slot(self) -> TimeSlot {
        match self {
            Self::Morning => TimeSlot::new(hm(8, 0), hm(12, 0)),
            Self::Afternoon => TimeSlot::new(hm(13, 0), hm(17, 0)),
            Self::Evening => TimeSlot::new(hm(18, 0), hm(22, 0)),
            Self::Night => TimeSlot::new(hm(21, 0), hm(1, 0)),
        }
    }
}

fn hm(hours: u32, minutes: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hours, minutes, 0).expect("literal clock time")
}

/// Daily clock-time window within which sessions may be placed
///
/// Derived deterministically from a [`PreferredWindow`]; holds no state.
/// The night window (21:00 to 01:00) crosses midnight, so the span is
/// computed modulo 24 hours.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeSlot {
    /// Clock time at which the window opens
    pub start_clock: NaiveTime,
    /// Clock time at which the window closes (may be on the next day)
    pub end_clock: NaiveTime,
}

impl TimeSlot {
    /// Create a slot from explicit clock bounds
    pub fn new(start_clock: NaiveTime, end_clock: NaiveTime) -> Self {
        Self {
            start_clock,
            end_clock,
        }
    }

    /// String-level slot lookup with the documented fallback
    ///
    /// Unrecognized labels fall back to 09:00 to 13:00. Validated requests
    /// never reach the fallback because [`PreferredWindow`] is a closed
    /// enum, but the lookup is kept for callers working with raw labels.
    pub fn for_label(label: &str) -> Self {
        match PreferredWindow::parse(label) {
            Some(window) => window.slot(),
            None => Self::new(hm(9, 0), hm(13, 0)),
        }
    }

    /// Whether the window closes after midnight
    pub fn crosses_midnight(&self) -> bool {
        self.end_clock <= self.start_clock
    }

    /// Length of the window in minutes, computed modulo 24 hours
    pub fn span_minutes(&self) -> i64 {
        let raw = (self.end_clock - self.start_clock).num_minutes();
        if raw <= 0 {
            raw + 24 * 60
        } else {
            raw
        }
    }

    /// Concrete UTC window for the slot on a given day
    ///
    /// The returned pair is (open, close); for a midnight-crossing slot the
    /// close instant is on the following day.
    pub fn window_for(&self, day: NaiveDate) -> (DateTime<Utc>, DateTime<Utc>) {
        let open = Utc.from_utc_datetime(&NaiveDateTime::new(day, self.start_clock));
        let close = open + Duration::minutes(self.span_minutes());
        (open, close)
    }

    /// Find the daily window containing the given instant, if any
    ///
    /// Checks the window anchored on the instant's own date and, for
    /// midnight-crossing slots, the window anchored on the previous day.
    pub fn containing_window(
        &self,
        instant: DateTime<Utc>,
    ) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let day = instant.date_naive();
        let same_day = self.window_for(day);
        if instant >= same_day.0 && instant <= same_day.1 {
            return Some(same_day);
        }
        if self.crosses_midnight() {
            let previous = self.window_for(day - Duration::days(1));
            if instant >= previous.0 && instant <= previous.1 {
                return Some(previous);
            }
        }
        None
    }
}

/// An exam deadline accepted into a planning request
///
/// Immutable once validated. The exam instant drives urgency ordering and
/// the scheduling cutoff; the priority tier drives weighting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Deadline {
    /// Subject the exam covers (1 to 100 characters)
    pub subject: String,
    /// Human-readable exam title (1 to 200 characters)
    pub title: String,
    /// Instant of the exam; no session may start after it
    pub exam_date: DateTime<Utc>,
    /// Priority tier for allocation weighting
    pub priority: Priority,
}

/// A validated plan generation request
///
/// Constructed once per generation call by the validator and never mutated;
/// regeneration builds a fresh request.
#[derive(Debug, Clone, PartialEq)]
pub struct PlanRequest {
    /// Validated deadlines in original input order
    pub deadlines: Vec<Deadline>,
    /// Daily study budget in hours, within [1, 16]
    pub daily_study_hours: f64,
    /// Time-of-day preference for session placement
    pub preferred_window: PreferredWindow,
    /// First day of the plan range (inclusive)
    pub range_start: NaiveDate,
    /// Last day of the plan range (inclusive)
    pub range_end: NaiveDate,
}

impl PlanRequest {
    /// The daily clock window derived from the preference
    pub fn slot(&self) -> TimeSlot {
        self.preferred_window.slot()
    }
}

/// How a study session approaches its material
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StudyMethod {
    Review,
    Practice,
    NewMaterial,
}

impl StudyMethod {
    /// Parse a wire-level study method label
    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "review" => Some(Self::Review),
            "practice" => Some(Self::Practice),
            "new_material" => Some(Self::NewMaterial),
            _ => None,
        }
    }

    /// Progression stage: methods never regress for a subject over time
    ///
    /// Ordering is new material, then review, then practice.
    pub fn stage(self) -> u8 {
        match self {
            Self::NewMaterial => 0,
            Self::Review => 1,
            Self::Practice => 2,
        }
    }

    /// Method for a given progression stage
    pub fn from_stage(stage: u8) -> Self {
        match stage {
            0 => Self::NewMaterial,
            1 => Self::Review,
            _ => Self::Practice,
        }
    }
}

impl std::fmt::Display for StudyMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Review => write!(f, "review"),
            Self::Practice => write!(f, "practice"),
            Self::NewMaterial => write!(f, "new_material"),
        }
    }
}

/// Default Pomodoro work interval in minutes
pub const DEFAULT_BREAK_INTERVAL_MINUTES: u32 = 25;

/// A single time-boxed study block produced by plan generation
///
/// Serialized with the persisted snake_case schema; the `generated` flag is
/// emitted as `is_ai_generated`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudySession {
    /// Subject this block covers
    pub subject: String,
    /// Short description of what to study
    pub title: String,
    /// Block start instant
    pub start_time: DateTime<Utc>,
    /// Block end instant, strictly after the start
    pub end_time: DateTime<Utc>,
    /// How the block approaches its material
    pub study_method: StudyMethod,
    /// Pomodoro work interval hint in minutes
    pub break_interval_minutes: u32,
    /// Whether the block came from the generative path
    #[serde(rename = "is_ai_generated")]
    pub generated: bool,
}

impl StudySession {
    /// Block length in minutes
    pub fn duration_minutes(&self) -> i64 {
        (self.end_time - self.start_time).num_minutes()
    }
}

/// A loosely-typed candidate session record awaiting normalization
///
/// Candidates come either from the deterministic allocator (well-formed by
/// construction) or from an external generative step (untrusted). Every
/// field is a raw JSON value so that malformed upstream output can be
/// coerced or dropped per record instead of failing the whole batch.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionCandidate {
    #[serde(default)]
    pub subject: JsonValue,
    #[serde(default)]
    pub title: JsonValue,
    #[serde(default)]
    pub start_time: JsonValue,
    #[serde(default)]
    pub end_time: JsonValue,
    #[serde(default)]
    pub study_method: JsonValue,
    #[serde(default)]
    pub break_interval_minutes: JsonValue,
}

impl From<StudySession> for SessionCandidate {
    fn from(session: StudySession) -> Self {
        Self {
            subject: JsonValue::String(session.subject),
            title: JsonValue::String(session.title),
            start_time: JsonValue::String(session.start_time.to_rfc3339()),
            end_time: JsonValue::String(session.end_time.to_rfc3339()),
            study_method: JsonValue::String(session.study_method.to_string()),
            break_interval_minutes: JsonValue::from(session.break_interval_minutes),
        }
    }
}

/// Raw plan request as received on the wire
///
/// Field names follow the external contract: camelCase for the scalar
/// fields, snake_case inside each deadline entry. All fields are optional
/// or loosely typed so the validator can produce specific rejection
/// messages instead of opaque deserialization failures.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanRequestBody {
    /// Exam deadlines to plan around
    #[serde(default)]
    pub deadlines: Vec<DeadlineBody>,

    /// Daily study budget in hours
    #[serde(rename = "dailyStudyHours", default)]
    pub daily_study_hours: Option<f64>,

    /// Time-of-day preference label
    #[serde(rename = "preferredStudyTime", default)]
    pub preferred_study_time: Option<String>,

    /// First day of the plan range, ISO-8601
    #[serde(rename = "startDate", default)]
    pub start_date: Option<String>,

    /// Last day of the plan range, ISO-8601
    #[serde(rename = "endDate", default)]
    pub end_date: Option<String>,
}

/// Raw deadline entry as received on the wire
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeadlineBody {
    #[serde(default)]
    pub subject: JsonValue,
    #[serde(default)]
    pub title: JsonValue,
    #[serde(default)]
    pub exam_date: JsonValue,
    #[serde(default)]
    pub priority: JsonValue,
}

/// Parse an instant from RFC 3339, naive date-time, or bare date input
///
/// Bare dates resolve to midnight UTC; naive date-times are treated as UTC.
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(raw) {
        return Some(instant.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    if let Ok(day) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(Utc.from_utc_datetime(&day.and_time(NaiveTime::MIN)));
    }
    None
}

/// Parse a calendar day from a bare date or any instant format
pub fn parse_day(raw: &str) -> Option<NaiveDate> {
    if let Ok(day) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(day);
    }
    parse_instant(raw).map(|instant| instant.date_naive())
}
