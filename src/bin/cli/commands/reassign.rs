//! Bulk reassignment handlers for the Enrollment CLI

use enrollment_core::bulk::{OutcomeStatus, ProgressMode};
use enrollment_core::models::StudentId;
use enrollment_core::{CancellationToken, ClientConfig, ReassignmentReport};
use tracing::warn;

use crate::cli::{load_workspace, print_json};
use crate::{Commands, OutputFormat};

pub async fn handle_reassign_command(
    cmd: Commands,
    config: &ClientConfig,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let workspace = load_workspace(config).await?;

    let report = match cmd {
        Commands::ReassignBatch {
            target,
            student_ids,
        } => {
            workspace.select_students(student_ids.into_iter().map(StudentId::from));
            if format == OutputFormat::Table {
                println!(
                    "Moving {} students into batch {}...",
                    workspace.selected_ids().len(),
                    target
                );
            }
            workspace.reassign_selected_batch(&target).await?
        }
        Commands::ReassignCompetency {
            from,
            to,
            mode,
            student_ids,
        } => {
            let mode: ProgressMode = mode.parse().map_err(anyhow::Error::msg)?;
            workspace.select_students(student_ids.into_iter().map(StudentId::from));

            // Ctrl-C stops after the student currently being written
            let cancellation = CancellationToken::new();
            let on_interrupt = cancellation.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    warn!("Interrupt received; finishing current student and skipping the rest");
                    on_interrupt.cancel();
                }
            });

            if format == OutputFormat::Table {
                println!(
                    "Reassigning {} students from {} to {} ({})...",
                    workspace.selected_ids().len(),
                    from,
                    to,
                    mode
                );
            }
            workspace
                .reassign_selected_competency(from, to, mode, &cancellation)
                .await?
        }
        other => anyhow::bail!("Not a reassignment command: {other:?}"),
    };

    if workspace.is_stale() {
        warn!("Roster refresh after reassignment failed; views may predate the change");
    }

    if print_json(format, &report)? {
        return Ok(());
    }
    print_report(&report);
    Ok(())
}

fn print_report(report: &ReassignmentReport) {
    for outcome in &report.outcomes {
        match &outcome.status {
            OutcomeStatus::Succeeded => println!("  ✓ {}", outcome.student_id),
            OutcomeStatus::Failed(reason) => println!("  ✗ {}: {}", outcome.student_id, reason),
            OutcomeStatus::Skipped => println!("  - {} (skipped)", outcome.student_id),
        }
    }
    println!(
        "\n{}: {} succeeded, {} failed, {} skipped",
        report.outcome(),
        report.succeeded(),
        report.failed(),
        report.skipped()
    );
}
