//! Interactive confirmation before mutating anything

use anyhow::Result;
use colored::Colorize;
use dialoguer::Confirm;
use reconcile::{ConfirmCallback, Plan};
use std::io::{self, IsTerminal};

/// Shows the pending set and the desired configuration, then asks once
pub struct InteractiveGate {
    /// What the targets are, e.g. "repositories"
    noun: String,
    /// Desired-configuration lines shown above the prompt
    details: Vec<String>,
}

impl InteractiveGate {
    pub fn new(noun: impl Into<String>, details: Vec<String>) -> Self {
        Self {
            noun: noun.into(),
            details,
        }
    }

    /// Print the plan without asking anything
    pub fn render(&self, plan: &Plan) {
        println!();
        println!(
            "  {} {} {} need changes ({} already compliant)",
            "→".cyan(),
            plan.pending.len().to_string().bold(),
            self.noun,
            plan.compliant.len()
        );
        for target in &plan.pending {
            println!("    {} {}", "+".green(), target.description());
        }

        if !self.details.is_empty() {
            println!();
            for line in &self.details {
                println!("    {}", line.dimmed());
            }
        }

        println!();
        println!(
            "  {} Only missing items are created. Nothing existing is modified or removed.",
            "ℹ".blue()
        );
    }
}

impl ConfirmCallback for InteractiveGate {
    fn confirm(&mut self, plan: &Plan) -> Result<bool> {
        self.render(plan);

        if !io::stdin().is_terminal() {
            log::warn!("stdin is not a terminal; treating as a decline");
            return Ok(false);
        }

        let answer = Confirm::new()
            .with_prompt(format!("Apply changes to {} {}?", plan.pending.len(), self.noun))
            .default(false)
            .interact();

        match answer {
            Ok(confirmed) => Ok(confirmed),
            Err(e) => {
                log::warn!("Prompt failed, treating as a decline: {e}");
                Ok(false)
            }
        }
    }
}
