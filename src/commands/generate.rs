//! Generate a study plan from a request file

use crate::config::Config;
use crate::error::Result;
use crate::gate::create_gate;
use crate::planner::Planner;
use crate::proposers::create_proposer;
use crate::types::{PlanRequestBody, StudySession};
use colored::Colorize;
use std::path::Path;

/// Execute the generate command
///
/// # Arguments
///
/// * `config` - Loaded application configuration
/// * `input` - Path to a JSON plan request
/// * `caller` - Caller identity for usage gating
/// * `proposer_override` - Optional proposer strategy override
/// * `json` - Emit JSON instead of a table
pub async fn execute(
    mut config: Config,
    input: &Path,
    caller: &str,
    proposer_override: Option<String>,
    json: bool,
) -> Result<()> {
    if let Some(proposer_type) = proposer_override {
        config.proposer.proposer_type = proposer_type;
        config.validate()?;
    }

    let contents = std::fs::read_to_string(input)?;
    let body: PlanRequestBody = serde_json::from_str(&contents)?;

    let gate = create_gate(&config.gate)?;
    let proposer = create_proposer(&config.proposer)?;
    let planner = Planner::new(gate, proposer);

    let sessions = planner.generate(caller, &body).await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&sessions)?);
        return Ok(());
    }

    if sessions.is_empty() {
        println!(
            "{}",
            "No sessions to schedule; every exam falls outside the requested range.".yellow()
        );
        return Ok(());
    }

    print_table(&sessions);
    println!(
        "\n{} {} sessions planned",
        "✓".green().bold(),
        sessions.len()
    );
    Ok(())
}

fn print_table(sessions: &[StudySession]) {
    println!(
        "{:<12} {:<13} {:<20} {:<14} {}",
        "DATE".bold(),
        "TIME".bold(),
        "SUBJECT".bold(),
        "METHOD".bold(),
        "TITLE".bold()
    );
    for session in sessions {
        println!(
            "{:<12} {:<13} {:<20} {:<14} {}",
            session.start_time.format("%Y-%m-%d"),
            format!(
                "{}-{}",
                session.start_time.format("%H:%M"),
                session.end_time.format("%H:%M")
            ),
            session.subject,
            session.study_method.to_string(),
            session.title
        );
    }
}
