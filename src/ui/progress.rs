use console::style;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::path::Path;
use std::time::Duration;

use crate::orchestrator::{RunOutcome, RunReport, WorkerName};
use crate::ui::icons::{CHECK, CROSS, FOLDER, RECOVERY, RUNNING, SPARKLE, STOP, WARN};

/// Terminal UI for an orchestration run.
///
/// Two bars are stacked vertically:
/// - Step bar: steps used out of the step ceiling
/// - Worker spinner: the worker currently running and why it was chosen
pub struct RunUI {
    multi: MultiProgress,
    step_bar: ProgressBar,
    worker_bar: ProgressBar,
    verbose: bool,
}

impl RunUI {
    pub fn new(max_steps: u32, verbose: bool) -> Self {
        Self::with_target(max_steps, verbose, ProgressDrawTarget::stderr())
    }

    /// A UI that renders nothing, for non-interactive use.
    pub fn hidden(max_steps: u32) -> Self {
        Self::with_target(max_steps, false, ProgressDrawTarget::hidden())
    }

    fn with_target(max_steps: u32, verbose: bool, target: ProgressDrawTarget) -> Self {
        let multi = MultiProgress::with_draw_target(target);

        let step_style = ProgressStyle::default_bar()
            .template("{prefix:.bold.dim} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .expect("progress bar template is a valid static string")
            .progress_chars("█▓▒░");
        let step_bar = multi.add(ProgressBar::new(u64::from(max_steps)));
        step_bar.set_style(step_style);
        step_bar.set_prefix(" Steps");

        let worker_style = ProgressStyle::default_spinner()
            .template("{prefix:.bold.dim} {spinner} {msg}")
            .expect("progress bar template is a valid static string");
        let worker_bar = multi.add(ProgressBar::new_spinner());
        worker_bar.set_style(worker_style);
        worker_bar.set_prefix("Worker");

        Self {
            multi,
            step_bar,
            worker_bar,
            verbose,
        }
    }

    fn print_line(&self, msg: impl AsRef<str>) {
        if self.multi.println(msg.as_ref()).is_err() {
            eprintln!("{}", msg.as_ref());
        }
    }

    pub fn show_project(&self, name: &str, path: &Path) {
        self.print_line(format!(
            "{} {} {}",
            FOLDER,
            style(name).bold(),
            style(path.display()).dim()
        ));
    }

    /// Start the spinner for a scheduled worker.
    pub fn start_step(&self, step: u32, worker: WorkerName, reasoning: &str) {
        self.step_bar.set_position(u64::from(step));
        self.step_bar.set_message(style(worker).yellow().to_string());
        self.worker_bar.set_message(format!(
            "{}{} {}",
            RUNNING,
            style(worker).cyan(),
            style(format!("({})", reasoning)).dim()
        ));
        self.worker_bar.enable_steady_tick(Duration::from_millis(100));
    }

    pub fn step_succeeded(&self, step: u32, worker: WorkerName, elapsed: Duration) {
        self.print_line(format!(
            "  {}Step {}: {} {}",
            CHECK,
            step,
            style(worker).green(),
            style(format!("({:.1}s)", elapsed.as_secs_f64())).dim()
        ));
    }

    pub fn step_failed(&self, step: u32, worker: WorkerName, error: &str, failures: u32) {
        self.print_line(format!(
            "  {}Step {}: {} failed {} {}",
            CROSS,
            step,
            style(worker).red(),
            style(format!("[strike {}]", failures)).red().bold(),
            style(error).dim()
        ));
    }

    /// Announce an out-of-band recovery invocation.
    pub fn recovery(&self, worker: WorkerName, task: &str) {
        self.worker_bar.set_message(format!("{}{}", RECOVERY, style(worker).magenta()));
        if self.verbose {
            self.print_line(format!("    {} {}", style("→").dim(), style(task).dim()));
        } else {
            self.print_line(format!("  {}Recovering with {}", RECOVERY, style(worker).magenta()));
        }
    }

    /// Stop the bars and print the outcome banner.
    pub fn finish(&self, report: &RunReport) {
        self.worker_bar.finish_and_clear();
        self.step_bar.finish_and_clear();

        let banner = match &report.outcome {
            RunOutcome::Finished => format!(
                "{}{} in {} steps",
                SPARKLE,
                style("Project complete").green().bold(),
                report.steps
            ),
            RunOutcome::Exhausted { steps } => format!(
                "{}{} after {} steps",
                WARN,
                style("Step limit reached").yellow().bold(),
                steps
            ),
            RunOutcome::Aborted { last_error } => format!(
                "{}{}: {}",
                STOP,
                style("Aborted after repeated failures").red().bold(),
                last_error
            ),
        };
        self.print_line("");
        self.print_line(banner);

        if !report.completed_steps.is_empty() {
            let completed: Vec<_> = report.completed_steps.iter().map(|w| w.as_str()).collect();
            self.print_line(format!(
                "   {} {}",
                style("Completed:").dim(),
                completed.join(" → ")
            ));
        }
    }
}
