//! Read-only roster view handlers for the Enrollment CLI

use enrollment_core::models::StudentId;
use enrollment_core::{ClientConfig, StudentFilters};
use serde_json::json;

use crate::cli::{load_workspace, print_json};
use crate::{Commands, OutputFormat};

pub async fn handle_roster_command(
    cmd: Commands,
    config: &ClientConfig,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let workspace = load_workspace(config).await?;

    match cmd {
        Commands::Batches => {
            let batches = workspace.unique_batches();
            let summaries = workspace.batch_summaries();
            if print_json(format, &json!({ "batches": batches, "summaries": summaries }))? {
                return Ok(());
            }

            println!("Known batches ({}):", batches.len());
            for batch in &batches {
                println!("  • {}", batch);
            }
            println!();
            println!("{:<24} {:>8}  COMPETENCIES", "BATCH", "STUDENTS");
            for summary in summaries {
                println!(
                    "{:<24} {:>8}  {}",
                    summary.batch, summary.student_count, summary.summary
                );
            }
        }
        Commands::Students {
            name,
            course,
            batch,
            status,
            competency,
            group,
        } => {
            workspace.set_filters(StudentFilters {
                name,
                course,
                batch,
                status,
                competency,
            });

            if group {
                let groups = workspace.students_by_batch();
                if format == OutputFormat::Json {
                    let value: serde_json::Map<String, serde_json::Value> = groups
                        .iter()
                        .map(|(key, students)| {
                            Ok::<_, anyhow::Error>((key.to_string(), serde_json::to_value(students)?))
                        })
                        .collect::<anyhow::Result<_>>()?;
                    println!("{}", serde_json::to_string_pretty(&value)?);
                    return Ok(());
                }
                for (key, students) in groups {
                    println!("{} ({} students)", key, students.len());
                    for student in students {
                        println!(
                            "  {:<10} {:<28} {}",
                            student.id,
                            student.name,
                            workspace.student_summary(&student.id)
                        );
                    }
                }
                return Ok(());
            }

            let students = workspace.filtered_students();
            if print_json(format, &students)? {
                return Ok(());
            }
            println!("{:<10} {:<28} {:<12} BATCHES", "ID", "NAME", "STATUS");
            for student in &students {
                let batches: Vec<&str> = student.batch_identifiers().into_iter().collect();
                println!(
                    "{:<10} {:<28} {:<12} {}",
                    student.id,
                    student.name,
                    student.status,
                    batches.join(", ")
                );
            }
            println!("\n{} students", students.len());
        }
        Commands::AvailableBatches { student_ids } => {
            workspace.select_students(student_ids.into_iter().map(StudentId::from));
            let available = workspace.available_batches_for_selection();
            if print_json(format, &available)? {
                return Ok(());
            }
            if available.is_empty() {
                println!("No batches available for the selected students");
            }
            for batch in available {
                println!("  • {}", batch);
            }
        }
        Commands::Competencies { student_ids } => {
            let selected = student_ids.len();
            workspace.select_students(student_ids.into_iter().map(StudentId::from));
            let tallies = workspace.enrolled_competencies_for_selection();
            if print_json(format, &tallies)? {
                return Ok(());
            }
            println!("{:<12} {:<32} {:<16} STUDENTS", "ID", "NAME", "TYPE");
            for tally in tallies {
                println!(
                    "{:<12} {:<32} {:<16} {}/{}",
                    tally.competency_id,
                    tally.name,
                    tally.competency_type,
                    tally.student_count,
                    selected
                );
            }
        }
        other => anyhow::bail!("Not a roster command: {other:?}"),
    }

    Ok(())
}
