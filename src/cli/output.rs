//! CLI output formatting

use crate::{
    core::ExecutionStatus,
    execution::ExecutionEvent,
    index::IndexSummary,
};
use chrono::{DateTime, Local, Utc};
use console::Emoji;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;
use std::time::Duration;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static SPINNER: Emoji<'_, '_> = Emoji("⏳ ", "~ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "!");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");
pub static CHART: Emoji<'_, '_> = Emoji("📊 ", "# ");
pub static BROOM: Emoji<'_, '_> = Emoji("🧹 ", "- ");

/// Lines of stage output shown before truncating
const OUTPUT_PREVIEW_LINES: usize = 20;

/// Create a spinner shown while a started service settles
pub fn create_spinner(message: String) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} [{elapsed}] {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message(message);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// A horizontal rule spanning the terminal width
pub fn separator(ch: char) -> String {
    let width = term_size::dimensions_stdout().map(|(w, _)| w).unwrap_or(80);
    ch.to_string().repeat(width.min(100))
}

/// A centered title between two rules
pub fn banner(title: &str) -> String {
    let rule = separator('═');
    let width = rule.chars().count();
    format!(
        "{}\n{}\n{}",
        style(&rule).magenta().bold(),
        style(format!("{:^width$}", title, width = width)).magenta().bold(),
        style(&rule).magenta().bold()
    )
}

/// Format an execution status for display
pub fn format_status(status: ExecutionStatus) -> String {
    match status {
        ExecutionStatus::Pending => style("PENDING").dim().to_string(),
        ExecutionStatus::Running => style("RUNNING").yellow().to_string(),
        ExecutionStatus::Completed => style("COMPLETED").green().to_string(),
        ExecutionStatus::Failed => style("FAILED").red().to_string(),
        ExecutionStatus::Interrupted => style("INTERRUPTED").yellow().to_string(),
    }
}

/// Whole minutes and seconds, e.g. `2m 5s`
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    format!("{}m {}s", secs / 60, secs % 60)
}

/// Local wall-clock time for banners
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Document count and numbered sample
pub fn format_summary(summary: &IndexSummary) -> String {
    let mut out = format!(
        "{} Total documents in index: {}",
        CHART,
        style(summary.document_count).cyan().bold()
    );
    if summary.sample_documents.is_empty() {
        out.push_str(&format!("\n  {}", style("(no sample documents)").dim()));
    }
    for (i, doc) in summary.sample_documents.iter().enumerate() {
        out.push_str(&format!(
            "\n  {}. {} {}",
            i + 1,
            doc.title,
            style(format!("({})", doc.category)).dim()
        ));
    }
    out
}

/// Format an execution event for display
pub fn format_execution_event(event: &ExecutionEvent) -> String {
    match event {
        ExecutionEvent::PipelineStarted {
            execution_id,
            title,
            working_dir,
            started_at,
            ..
        } => {
            let dir = working_dir
                .clone()
                .or_else(|| std::env::current_dir().ok())
                .map(|d| d.display().to_string())
                .unwrap_or_else(|| ".".to_string());
            format!(
                "{}\n{} Started at: {} ({})\n{} Working directory: {}",
                banner(title),
                INFO,
                format_timestamp(*started_at),
                style(&execution_id.to_string()[..8]).dim(),
                INFO,
                dir
            )
        }
        ExecutionEvent::PrerequisiteChecked {
            requirement,
            passed: true,
            detail,
        } => match detail {
            Some(detail) => format!("{} {} {}", CHECK, requirement, style(detail).dim()),
            None => format!("{} {}", CHECK, requirement),
        },
        ExecutionEvent::PrerequisiteChecked {
            requirement,
            detail,
            ..
        } => format!(
            "{} {}: {}",
            CROSS,
            style(requirement).red(),
            style(detail.as_deref().unwrap_or("not available")).dim()
        ),
        ExecutionEvent::StageStarted {
            ordinal,
            total,
            description,
            command,
            ..
        } => format!(
            "\n[{}/{}] {} {}\n{}\n{}",
            style(ordinal).cyan(),
            style(total).dim(),
            ROCKET,
            style(description).bold(),
            style(format!("Command: {}", command)).cyan(),
            style(separator('─')).cyan()
        ),
        ExecutionEvent::StageCompleted {
            description,
            output,
            ..
        } => {
            if output.trim().is_empty() {
                format!("{} {}", CHECK, style(description).green())
            } else {
                format!(
                    "{} {}\n{}",
                    CHECK,
                    style(description).green(),
                    format_output(output.trim_end(), OUTPUT_PREVIEW_LINES)
                )
            }
        }
        ExecutionEvent::StageFailed {
            description,
            exit_code,
            diagnostics,
            ..
        } => {
            let reason = match exit_code {
                Some(code) => format!("failed with exit code {}", code),
                None => "could not be started".to_string(),
            };
            let mut out = format!("{} {} {}", CROSS, style(description).red(), reason);
            if !diagnostics.is_empty() {
                out.push('\n');
                out.push_str(&style(format_output(diagnostics, OUTPUT_PREVIEW_LINES)).dim().to_string());
            }
            out
        }
        ExecutionEvent::StageSettling { name, duration } => format!(
            "{} Waiting {}s for {} to be ready...",
            SPINNER,
            duration.as_secs(),
            style(name).cyan()
        ),
        ExecutionEvent::Interrupted { phase } => {
            format!("\n{} Pipeline interrupted during {}", WARN, style(phase).yellow())
        }
        ExecutionEvent::SummaryReported { summary } => format_summary(summary),
        ExecutionEvent::ReportingFailed { error } => {
            format!("{} Could not check indexed data: {}", WARN, style(error).dim())
        }
        ExecutionEvent::CleanupStarted { services } => {
            if services.is_empty() {
                format!("\n{} Nothing to clean up", BROOM)
            } else {
                format!("\n{} Stopping {}", BROOM, style(services.join(", ")).cyan())
            }
        }
        ExecutionEvent::CleanupFinished { error: None } => {
            format!("{} Cleanup finished", CHECK)
        }
        ExecutionEvent::CleanupFinished { error: Some(error) } => {
            format!("{} Cleanup failed: {}", WARN, style(error).dim())
        }
        ExecutionEvent::PipelineCompleted {
            execution_id,
            status,
            elapsed,
        } => format!(
            "{} Pipeline ({}) {} in {}",
            INFO,
            style(&execution_id.to_string()[..8]).dim(),
            format_status(*status),
            format_duration(*elapsed)
        ),
    }
}

/// Format step output with truncation
pub fn format_output(output: &str, max_lines: usize) -> String {
    let lines: Vec<&str> = output.lines().collect();

    if lines.len() <= max_lines {
        output.to_string()
    } else {
        let truncated = lines[..max_lines].join("\n");
        format!(
            "{}\n{}... ({} more lines)",
            truncated,
            style("[truncated]").dim(),
            lines.len() - max_lines
        )
    }
}

/// Prints execution events to the terminal
///
/// A spinner runs while a started service settles and is cleared by the
/// next event.
#[derive(Default)]
pub struct ConsoleReporter {
    spinner: Mutex<Option<ProgressBar>>,
}

impl ConsoleReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn handle(&self, event: &ExecutionEvent) {
        let Ok(mut spinner) = self.spinner.lock() else {
            println!("{}", format_execution_event(event));
            return;
        };

        if let Some(active) = spinner.take() {
            active.finish_and_clear();
        }

        match event {
            ExecutionEvent::StageSettling { .. } => {
                *spinner = Some(create_spinner(format_execution_event(event)));
            }
            _ => println!("{}", format_execution_event(event)),
        }
    }
}
