//! Deterministic schedule allocation
//!
//! This module is the default session proposer policy: given a validated
//! [`PlanRequest`], it walks every day of the range and splits the daily
//! study budget across active deadlines by urgency weight, chunks each
//! share into Pomodoro-sized blocks, and places them inside the day's
//! derived clock window without overlap.
//!
//! The policy is fully deterministic: identical requests produce
//! byte-identical session sets. Internal arithmetic that produces an
//! impossible schedule is a defect and fails loudly with
//! [`ExamplanError::Invariant`] instead of silently correcting itself.

use crate::config::SchedulerConfig;
use crate::error::{ExamplanError, Result};
use crate::types::{Deadline, PlanRequest, StudyMethod, StudySession};
use chrono::{Duration, NaiveDate};

/// Allocate study sessions for the full request range
///
/// # Arguments
///
/// * `request` - Validated plan request
/// * `tuning` - Scheduler tuning knobs (block sizes, gaps, break interval)
///
/// # Returns
///
/// Returns the generated sessions in chronological order. A request whose
/// deadlines all expire before the range starts yields an empty set, which
/// is a valid outcome.
///
/// # Errors
///
/// Returns [`ExamplanError::Invariant`] if allotment math produces an
/// impossible share or block; such a failure is a programming defect, not
/// a caller mistake.
pub fn allocate(request: &PlanRequest, tuning: &SchedulerConfig) -> Result<Vec<StudySession>> {
    let slot = request.slot();
    let budget = ((request.daily_study_hours * 60.0).round() as i64).min(slot.span_minutes());
    if budget <= 0 {
        return Err(
            ExamplanError::Invariant(format!("daily budget resolved to {} minutes", budget)).into(),
        );
    }

    let mut sessions = Vec::new();
    let mut day = request.range_start;
    while day <= request.range_end {
        let active = active_deadlines(request, day, tuning);
        if !active.is_empty() {
            sessions.extend(allocate_day(request, &active, day, budget, tuning)?);
        }
        day += Duration::days(1);
    }

    tracing::debug!(
        "Allocated {} sessions across {} deadlines",
        sessions.len(),
        request.deadlines.len()
    );
    Ok(sessions)
}

/// Deadlines that can still fit at least a minimal block on the given day
///
/// Ordered by urgency: earlier exam first, then higher priority, then
/// stable input order.
fn active_deadlines<'a>(
    request: &'a PlanRequest,
    day: NaiveDate,
    tuning: &SchedulerConfig,
) -> Vec<&'a Deadline> {
    let (open, _) = request.slot().window_for(day);
    let minimal_end = open + Duration::minutes(tuning.session_min_minutes);

    let mut active: Vec<&Deadline> = request
        .deadlines
        .iter()
        .filter(|deadline| minimal_end <= deadline.exam_date)
        .collect();

    // Stable sort keeps input order for full ties.
    active.sort_by(|a, b| {
        a.exam_date
            .cmp(&b.exam_date)
            .then(b.priority.rank().cmp(&a.priority.rank()))
    });
    active
}

/// Allocate and place one day's worth of sessions
fn allocate_day(
    request: &PlanRequest,
    active: &[&Deadline],
    day: NaiveDate,
    budget: i64,
    tuning: &SchedulerConfig,
) -> Result<Vec<StudySession>> {
    let slot = request.slot();
    let (open, close) = slot.window_for(day);
    let span = (close - open).num_minutes();

    // The gaps between blocks consume window time too. Shrink the working
    // budget until blocks plus gaps fit the span, so placement never runs
    // out of window mid-way and strands a covered subject.
    let mut day_budget = budget.min(span);
    let assignments = loop {
        let assignments = assign_blocks(active, day, day_budget, tuning)?;
        let block_count: i64 = assignments
            .iter()
            .map(|(_, blocks)| blocks.len() as i64)
            .sum();
        let block_minutes: i64 = assignments
            .iter()
            .flat_map(|(_, blocks)| blocks.iter())
            .sum();
        let needed = block_minutes + tuning.block_gap_minutes * (block_count - 1).max(0);
        if needed <= span || day_budget <= tuning.session_min_minutes {
            break assignments;
        }
        day_budget -= needed - span;
    };

    let mut cursor = open;
    let mut placed = Vec::new();

    'subjects: for (deadline, blocks) in assignments {
        let method = study_method_for(deadline, request, day);
        for block in blocks {
            if block <= 0 {
                return Err(ExamplanError::Invariant(format!(
                    "chunking produced a {}-minute block for {}",
                    block, deadline.subject
                ))
                .into());
            }
            let start = cursor;
            let end = start + Duration::minutes(block);
            if end > close {
                // Slot exhausted: overflow is dropped for this day and
                // implicitly deferred, never extended past the boundary.
                break 'subjects;
            }
            if end > deadline.exam_date {
                // Block would run past the exam; skip it without consuming
                // slot space so later subjects can use it.
                continue;
            }
            debug_assert!(start >= open && end <= close);
            placed.push(StudySession {
                subject: deadline.subject.clone(),
                title: session_title(&deadline.subject, method),
                start_time: start,
                end_time: end,
                study_method: method,
                break_interval_minutes: tuning.break_interval_minutes,
                generated: false,
            });
            cursor = end + Duration::minutes(tuning.block_gap_minutes);
        }
    }

    Ok(placed)
}

/// Pick the covered subjects for a day and chunk their shares into blocks
fn assign_blocks<'a>(
    active: &[&'a Deadline],
    day: NaiveDate,
    budget: i64,
    tuning: &SchedulerConfig,
) -> Result<Vec<(&'a Deadline, Vec<i64>)>> {
    let floor = tuning.session_min_minutes;

    // When the budget cannot give every active subject a minimal block,
    // only the most urgent subjects are covered today; the rest defer.
    let covered: &[&Deadline] = if budget < active.len() as i64 * floor {
        let count = (budget / floor).max(0) as usize;
        &active[..count.min(active.len())]
    } else {
        active
    };
    if covered.is_empty() {
        return Ok(Vec::new());
    }

    let shares = distribute_budget(covered, day, budget, floor)?;
    Ok(covered
        .iter()
        .zip(shares)
        .map(|(deadline, share)| {
            (
                *deadline,
                chunk_blocks(share, floor, tuning.session_max_minutes),
            )
        })
        .collect())
}

/// Split the daily budget across covered deadlines by urgency weight
///
/// Uses largest-remainder rounding with leftover minutes granted in urgency
/// order, then raises sub-floor shares to the minimal block size by pulling
/// minutes from the largest shares. Callers guarantee the budget covers
/// `covered.len()` floors.
fn distribute_budget(
    covered: &[&Deadline],
    day: NaiveDate,
    budget: i64,
    floor: i64,
) -> Result<Vec<i64>> {
    let weights: Vec<f64> = covered
        .iter()
        .map(|deadline| urgency_weight(deadline, day))
        .collect();
    let total: f64 = weights.iter().sum();
    if !total.is_finite() || total <= 0.0 {
        return Err(
            ExamplanError::Invariant(format!("urgency weights summed to {}", total)).into(),
        );
    }

    let mut shares: Vec<i64> = weights
        .iter()
        .map(|weight| ((budget as f64) * weight / total).floor() as i64)
        .collect();

    let mut leftover = budget - shares.iter().sum::<i64>();
    let count = shares.len();
    let mut index = 0;
    while leftover > 0 {
        shares[index % count] += 1;
        leftover -= 1;
        index += 1;
    }

    // Floor pass: every covered subject gets at least one minimal block.
    while let Some(deficit) = shares.iter().position(|&share| share < floor) {
        let donor = shares
            .iter()
            .enumerate()
            .filter(|(_, &share)| share > floor)
            .max_by_key(|(_, &share)| share)
            .map(|(i, _)| i);
        match donor {
            Some(donor) => {
                shares[donor] -= 1;
                shares[deficit] += 1;
            }
            None => break,
        }
    }

    if shares.iter().any(|&share| share < 0) || shares.iter().sum::<i64>() != budget {
        return Err(ExamplanError::Invariant(format!(
            "share distribution {:?} does not partition budget {}",
            shares, budget
        ))
        .into());
    }

    Ok(shares)
}

/// Urgency weight for a deadline on a given day
///
/// High priority and closer exams dominate: the priority tier multiplies a
/// hyperbolic urgency term that grows as the exam approaches.
fn urgency_weight(deadline: &Deadline, day: NaiveDate) -> f64 {
    let days_left = (deadline.exam_date.date_naive() - day).num_days().max(0) as f64;
    deadline.priority.weight_factor() * (1.0 + 7.0 / (days_left + 1.0))
}

/// Chunk a subject's allotted minutes into block lengths
///
/// Blocks stay within `[floor, ceiling]`; a tail between one and two block
/// sizes is split near-evenly so both halves stay in range. A leading
/// remainder below the floor is dropped (deferred to later days).
fn chunk_blocks(minutes: i64, floor: i64, ceiling: i64) -> Vec<i64> {
    let mut blocks = Vec::new();
    let mut remaining = minutes;
    while remaining >= floor {
        if remaining <= ceiling {
            blocks.push(remaining);
            break;
        }
        if remaining < ceiling + floor {
            let half = remaining / 2;
            blocks.push(remaining - half);
            remaining = half;
        } else {
            blocks.push(ceiling);
            remaining -= ceiling;
        }
    }
    blocks
}

/// Study method for a subject on a given day
///
/// Monotonic over the range: new material early, review past the midpoint,
/// practice near the end or within a day of the exam. The method never
/// regresses for a subject on later days.
fn study_method_for(deadline: &Deadline, request: &PlanRequest, day: NaiveDate) -> StudyMethod {
    let exam_day = deadline.exam_date.date_naive();
    let last = request.range_end.min(exam_day);
    let horizon = (last - request.range_start).num_days().max(1) as f64;
    let progress = (day - request.range_start).num_days() as f64 / horizon;

    let progress_stage = if progress < 0.5 {
        0
    } else if progress < 0.8 {
        1
    } else {
        2
    };
    let proximity_stage = if (exam_day - day).num_days() <= 1 { 2 } else { 0 };

    StudyMethod::from_stage(progress_stage.max(proximity_stage))
}

/// Session title describing what to study
fn session_title(subject: &str, method: StudyMethod) -> String {
    match method {
        StudyMethod::NewMaterial => format!("{}: cover new material", subject),
        StudyMethod::Review => format!("{}: review and consolidate", subject),
        StudyMethod::Practice => format!("{}: practice problems", subject),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{parse_instant, PreferredWindow, Priority};

    fn deadline(subject: &str, exam: &str, priority: Priority) -> Deadline {
        Deadline {
            subject: subject.to_string(),
            title: format!("{} exam", subject),
            exam_date: parse_instant(exam).unwrap(),
            priority,
        }
    }

    fn request(deadlines: Vec<Deadline>, hours: f64, window: PreferredWindow) -> PlanRequest {
        PlanRequest {
            deadlines,
            daily_study_hours: hours,
            preferred_window: window,
            range_start: NaiveDate::from_ymd_opt(2024, 1, 25).unwrap(),
            range_end: NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        }
    }

    fn tuning() -> SchedulerConfig {
        SchedulerConfig::default()
    }

    #[test]
    fn test_single_subject_afternoon_plan() {
        let request = request(
            vec![deadline("Math", "2024-02-01", Priority::High)],
            3.0,
            PreferredWindow::Afternoon,
        );
        let sessions = allocate(&request, &tuning()).unwrap();

        assert!(!sessions.is_empty());
        let exam = parse_instant("2024-02-01").unwrap();
        for session in &sessions {
            assert_eq!(session.subject, "Math");
            assert!(session.end_time > session.start_time);
            assert!(session.end_time <= exam);
            assert!(!session.generated);
            let slot = request.slot();
            let (open, close) = slot.window_for(session.start_time.date_naive());
            assert!(session.start_time >= open);
            assert!(session.end_time <= close);
            let minutes = session.duration_minutes();
            assert!((45..=90).contains(&minutes), "block of {} minutes", minutes);
            assert_eq!(session.break_interval_minutes, 25);
        }
    }

    #[test]
    fn test_all_exams_before_range_yields_empty_set() {
        let request = request(
            vec![deadline("History", "2024-01-10", Priority::High)],
            3.0,
            PreferredWindow::Morning,
        );
        let sessions = allocate(&request, &tuning()).unwrap();
        assert!(sessions.is_empty());
    }

    #[test]
    fn test_higher_priority_gets_greater_or_equal_share_daily() {
        let request = request(
            vec![
                deadline("Chemistry", "2024-02-05", Priority::Low),
                deadline("Physics", "2024-02-05", Priority::High),
            ],
            4.0,
            PreferredWindow::Afternoon,
        );
        let sessions = allocate(&request, &tuning()).unwrap();

        let mut day = request.range_start;
        while day <= request.range_end {
            let minutes_for = |subject: &str| -> i64 {
                sessions
                    .iter()
                    .filter(|s| s.subject == subject && s.start_time.date_naive() == day)
                    .map(|s| s.duration_minutes())
                    .sum()
            };
            let physics = minutes_for("Physics");
            let chemistry = minutes_for("Chemistry");
            assert!(
                physics >= chemistry,
                "day {}: physics {} < chemistry {}",
                day,
                physics,
                chemistry
            );
            day += Duration::days(1);
        }
    }

    #[test]
    fn test_sessions_never_overlap_for_same_subject() {
        let request = request(
            vec![
                deadline("Math", "2024-02-02", Priority::High),
                deadline("Biology", "2024-02-03", Priority::Medium),
            ],
            6.0,
            PreferredWindow::Evening,
        );
        let sessions = allocate(&request, &tuning()).unwrap();
        assert!(!sessions.is_empty());

        for (i, a) in sessions.iter().enumerate() {
            for b in sessions.iter().skip(i + 1) {
                if a.subject == b.subject {
                    let disjoint = a.end_time <= b.start_time || b.end_time <= a.start_time;
                    assert!(disjoint, "{:?} overlaps {:?}", a, b);
                }
            }
        }
    }

    #[test]
    fn test_earlier_exam_scheduled_first_in_slot() {
        let request = request(
            vec![
                deadline("Late", "2024-02-20", Priority::High),
                deadline("Soon", "2024-01-29", Priority::Low),
            ],
            4.0,
            PreferredWindow::Morning,
        );
        let sessions = allocate(&request, &tuning()).unwrap();
        let first_day: Vec<_> = sessions
            .iter()
            .filter(|s| s.start_time.date_naive() == request.range_start)
            .collect();
        assert!(!first_day.is_empty());
        assert_eq!(first_day[0].subject, "Soon");
    }

    #[test]
    fn test_study_method_is_monotonic_per_subject() {
        let request = request(
            vec![deadline("Math", "2024-02-01", Priority::Medium)],
            2.0,
            PreferredWindow::Morning,
        );
        let sessions = allocate(&request, &tuning()).unwrap();

        let mut last_stage = 0u8;
        for session in &sessions {
            let stage = session.study_method.stage();
            assert!(
                stage >= last_stage,
                "method regressed from stage {} to {}",
                last_stage,
                stage
            );
            last_stage = stage;
        }
        assert_eq!(sessions.first().unwrap().study_method, StudyMethod::NewMaterial);
        assert_eq!(sessions.last().unwrap().study_method, StudyMethod::Practice);
    }

    #[test]
    fn test_allocation_is_deterministic() {
        let request = request(
            vec![
                deadline("Math", "2024-02-01", Priority::High),
                deadline("History", "2024-02-10", Priority::Low),
            ],
            5.0,
            PreferredWindow::Afternoon,
        );
        let first = allocate(&request, &tuning()).unwrap();
        let second = allocate(&request, &tuning()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_night_slot_sessions_may_cross_midnight() {
        let request = request(
            vec![deadline("Astronomy", "2024-02-10", Priority::High)],
            4.0,
            PreferredWindow::Night,
        );
        let sessions = allocate(&request, &tuning()).unwrap();
        assert!(!sessions.is_empty());

        for session in &sessions {
            // Anchor day is where the window opened, which may be the day
            // before the session's own end date.
            let slot = request.slot();
            assert!(slot.containing_window(session.start_time).is_some());
            assert!(session.end_time > session.start_time);
        }
    }

    #[test]
    fn test_no_session_on_exam_day_slot_after_exam_instant() {
        // Exam at midnight on Feb 1: the Feb 1 afternoon slot opens after
        // the exam, so nothing may be scheduled there.
        let mut request = request(
            vec![deadline("Math", "2024-02-01", Priority::High)],
            3.0,
            PreferredWindow::Afternoon,
        );
        request.range_end = NaiveDate::from_ymd_opt(2024, 2, 3).unwrap();
        let sessions = allocate(&request, &tuning()).unwrap();
        let exam = parse_instant("2024-02-01").unwrap();
        assert!(!sessions.is_empty());
        for session in &sessions {
            assert!(session.start_time <= exam);
            assert!(session.end_time <= exam);
        }
    }

    #[test]
    fn test_many_subjects_low_budget_covers_most_urgent_only() {
        // One hour a day cannot give five subjects a 45-minute floor; only
        // the most urgent subject is covered each day.
        let deadlines = vec![
            deadline("A", "2024-01-28", Priority::High),
            deadline("B", "2024-02-02", Priority::Medium),
            deadline("C", "2024-02-03", Priority::Medium),
            deadline("D", "2024-02-04", Priority::Low),
            deadline("E", "2024-02-05", Priority::Low),
        ];
        let request = request(deadlines, 1.0, PreferredWindow::Morning);
        let sessions = allocate(&request, &tuning()).unwrap();
        assert!(!sessions.is_empty());

        let first_day: Vec<_> = sessions
            .iter()
            .filter(|s| s.start_time.date_naive() == request.range_start)
            .collect();
        assert_eq!(first_day.len(), 1);
        assert_eq!(first_day[0].subject, "A");
    }

    #[test]
    fn test_chunk_blocks_ranges() {
        assert_eq!(chunk_blocks(60, 45, 90), vec![60]);
        assert_eq!(chunk_blocks(90, 45, 90), vec![90]);
        assert_eq!(chunk_blocks(180, 45, 90), vec![90, 90]);
        assert_eq!(chunk_blocks(100, 45, 90), vec![50, 50]);
        assert_eq!(chunk_blocks(40, 45, 90), Vec::<i64>::new());
        for minutes in 45..=600 {
            for block in chunk_blocks(minutes, 45, 90) {
                assert!((45..=90).contains(&block), "{} -> {}", minutes, block);
            }
        }
    }

    #[test]
    fn test_distribute_budget_partitions_exactly() {
        let a = deadline("A", "2024-02-01", Priority::High);
        let b = deadline("B", "2024-02-01", Priority::Low);
        let day = NaiveDate::from_ymd_opt(2024, 1, 25).unwrap();
        let shares = distribute_budget(&[&a, &b], day, 180, 45).unwrap();
        assert_eq!(shares.iter().sum::<i64>(), 180);
        assert!(shares[0] >= shares[1]);
        assert!(shares.iter().all(|&s| s >= 45));
    }

    #[test]
    fn test_every_covered_subject_scheduled_daily_despite_gaps() {
        // Shares that fill the whole window leave no room for the gaps
        // between blocks; the working budget must shrink so the last
        // subject still gets its floor block instead of being pushed past
        // the window edge every single day.
        let request = request(
            vec![
                deadline("Physics", "2024-02-05", Priority::High),
                deadline("Chemistry", "2024-02-05", Priority::Low),
            ],
            4.0,
            PreferredWindow::Afternoon,
        );
        let tuning = tuning();
        let sessions = allocate(&request, &tuning).unwrap();

        let mut day = request.range_start;
        while day <= request.range_end {
            let minutes_for = |subject: &str| -> i64 {
                sessions
                    .iter()
                    .filter(|s| s.subject == subject && s.start_time.date_naive() == day)
                    .map(|s| s.duration_minutes())
                    .sum()
            };
            assert!(
                minutes_for("Chemistry") >= tuning.session_min_minutes,
                "day {}: Chemistry got {} minutes",
                day,
                minutes_for("Chemistry")
            );
            assert!(minutes_for("Physics") >= minutes_for("Chemistry"));
            day += Duration::days(1);
        }
    }

    #[test]
    fn test_distribute_budget_grants_leftover_minutes_in_urgency_order() {
        // Three equal weights flooring 100 minutes leaves one leftover
        // minute, which goes to the most urgent subject.
        let a = deadline("A", "2024-02-01", Priority::Medium);
        let b = deadline("B", "2024-02-01", Priority::Medium);
        let c = deadline("C", "2024-02-01", Priority::Medium);
        let day = NaiveDate::from_ymd_opt(2024, 1, 25).unwrap();
        let shares = distribute_budget(&[&a, &b, &c], day, 100, 1).unwrap();
        assert_eq!(shares, vec![34, 33, 33]);
    }

    #[test]
    fn test_distribute_budget_floor_raises_small_shares() {
        let a = deadline("A", "2024-01-26", Priority::High);
        let b = deadline("B", "2024-03-01", Priority::Low);
        let day = NaiveDate::from_ymd_opt(2024, 1, 25).unwrap();
        // A's urgency dwarfs B's, but the floor still guarantees B a block.
        let shares = distribute_budget(&[&a, &b], day, 120, 45).unwrap();
        assert_eq!(shares.iter().sum::<i64>(), 120);
        assert!(shares.iter().all(|&s| s >= 45));
    }

    #[test]
    fn test_urgency_weight_prefers_close_high_priority() {
        let day = NaiveDate::from_ymd_opt(2024, 1, 25).unwrap();
        let close_high = deadline("A", "2024-01-27", Priority::High);
        let far_low = deadline("B", "2024-03-01", Priority::Low);
        assert!(urgency_weight(&close_high, day) > urgency_weight(&far_low, day));

        let close_low = deadline("C", "2024-01-27", Priority::Low);
        assert!(urgency_weight(&close_high, day) > urgency_weight(&close_low, day));
    }
}
