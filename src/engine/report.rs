//! Console output for the mutation phase and the final tally

use colored::Colorize;
use reconcile::{MutationOutcome, ProgressCallback, RunReport, RunSummary, Target};
use std::io::{self, Write};

/// Prints `[i/n] id... ✓` as each target is applied
#[derive(Debug, Default)]
pub struct ConsoleProgress;

impl ProgressCallback for ConsoleProgress {
    fn on_start(&mut self, index: usize, total: usize, target: &dyn Target) {
        print!(
            "  {} {}... ",
            format!("[{index}/{total}]").blue().bold(),
            target.id()
        );
        let _ = io::stdout().flush();
    }

    fn on_complete(&mut self, _id: &str, outcome: &MutationOutcome) {
        println!("{}", outcome_marker(outcome));
    }
}

/// Inline marker for an outcome
pub fn outcome_marker(outcome: &MutationOutcome) -> String {
    match outcome {
        MutationOutcome::Created => "✓".green().to_string(),
        MutationOutcome::AlreadyExists => format!("{} (already exists)", "⊘".yellow()),
        MutationOutcome::Failed { reason } => format!("{} {}", "✗".red(), reason.dimmed()),
    }
}

/// Print the terminal state of a run
///
/// `noun` names the targets ("repositories", "access items"); `follow_up`
/// lines are printed after a run that applied changes.
pub fn print_report(report: &RunReport, noun: &str, follow_up: &[String]) {
    match report {
        RunReport::NothingToDo { compliant } => {
            println!();
            println!(
                "  {} All {compliant} {noun} are already compliant. Nothing to do.",
                "✓".green().bold()
            );
        }
        RunReport::Declined { pending, .. } => {
            println!();
            println!(
                "  {} No changes made ({pending} {noun} left as they are)",
                "⊘".yellow()
            );
        }
        RunReport::Applied { summary, .. } => {
            print_summary(summary, noun);
            print_follow_up(follow_up);
        }
    }
}

/// Print the tally, failures and the compliance line
pub fn print_summary(summary: &RunSummary, noun: &str) {
    println!();
    if summary.is_success() {
        println!("  {} Reconciliation complete", "✓".green().bold());
    } else {
        println!("  {} Reconciliation finished with errors", "⚠".yellow().bold());
    }

    if summary.created > 0 {
        println!("    • {} created", summary.created);
    }
    if summary.already_exists > 0 {
        println!("    • {} already existed", summary.already_exists);
    }
    if summary.compliant > 0 {
        println!("    • {} were already compliant", summary.compliant);
    }
    if summary.failed > 0 {
        println!("    • {} {}", summary.failed, "failed".red());
        for (id, reason) in &summary.failures {
            println!("      {} {id}: {}", "✗".red(), reason.dimmed());
        }
    }

    println!();
    println!(
        "  {}",
        compliance_line(summary.now_compliant(), summary.total(), noun).bold()
    );
}

/// "All N … are now compliant", or the partial count when something failed
pub fn compliance_line(now_compliant: usize, total: usize, noun: &str) -> String {
    if now_compliant == total {
        format!("All {total} {noun} are now compliant")
    } else {
        format!("{now_compliant} of {total} {noun} are now compliant")
    }
}

fn print_follow_up(lines: &[String]) {
    if lines.is_empty() {
        return;
    }
    println!();
    println!("{}", "Next steps".cyan().bold());
    for line in lines {
        println!("  {line}");
    }
}
