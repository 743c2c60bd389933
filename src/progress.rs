//! Terminal progress rendering for provisioning runs.
//!
//! Implements the engine's [`ProgressCallback`] with an indicatif bar so
//! long waits (certificate validation, distribution rollout) stay visible.

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use provision::{NodeKind, Outcome, ProgressCallback};
use std::time::Duration;

/// Progress bar over the nodes of one apply or destroy run.
pub struct RunProgress {
    bar: Option<ProgressBar>,
    quiet: bool,
}

impl RunProgress {
    pub fn new(quiet: bool) -> Self {
        Self { bar: None, quiet }
    }

    fn println(&self, line: &str) {
        match &self.bar {
            Some(bar) => bar.println(line),
            None => {
                if !self.quiet {
                    println!("{line}");
                }
            }
        }
    }
}

impl ProgressCallback for RunProgress {
    fn on_run_start(&mut self, count: usize, teardown: bool) {
        if self.quiet {
            return;
        }
        let bar = ProgressBar::new(count as u64);
        bar.set_style(
            ProgressStyle::with_template("{spinner:.cyan} [{pos}/{len}] {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar()),
        );
        bar.enable_steady_tick(Duration::from_millis(120));
        bar.set_message(if teardown { "tearing down" } else { "applying" });
        self.bar = Some(bar);
    }

    fn on_node_start(&mut self, id: &str, kind: NodeKind) {
        if let Some(bar) = &self.bar {
            bar.set_message(format!("{kind} {id}"));
        }
    }

    fn on_node_retry(&mut self, id: &str, attempt: u32, max_attempts: u32, delay: Duration) {
        self.println(&format!(
            "{} {id}: attempt {attempt}/{max_attempts} failed, retrying in {:.1}s",
            "⚠".yellow(),
            delay.as_secs_f64()
        ));
    }

    fn on_node_complete(&mut self, id: &str, outcome: &Outcome) {
        let line = match outcome {
            Outcome::Created => format!("{} {id} created", "✓".green()),
            Outcome::Reused => format!("{} {id} up to date", "✓".green()),
            Outcome::Destroyed => format!("{} {id} removed", "✓".green()),
            Outcome::AlreadyAbsent => format!("{} {id} already absent", "✓".green()),
            Outcome::Skipped { reason } => format!("{} {id} skipped: {reason}", "-".dimmed()),
            Outcome::Failed { error } => format!("{} {id} failed: {error}", "✗".red()),
        };
        self.println(&line);
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
    }

    fn on_run_complete(&mut self) {
        if let Some(bar) = self.bar.take() {
            bar.finish_and_clear();
        }
    }
}
