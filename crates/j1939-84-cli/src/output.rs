//! Console rendering for runs, registries and step lists

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use colored::Colorize;
use j1939_84::{RunReport, StepIdentity, StepOutcome};
use j1939_core::{ModuleInfo, Outcome, ResultsListener, Severity};
use j1939_packets::address_name;
use parking_lot::Mutex;
use serde::Serialize;
use tabled::{Table, Tabled};

/// Output format options
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Result lines as they happen, then a summary (default)
    #[default]
    Text,
    /// One JSON document once the run finishes
    Json,
}

/// Listener printing result lines as they arrive and keeping the outcomes
/// for the final summary
pub struct ConsoleListener {
    format: OutputFormat,
    quiet: bool,
    outcomes: Mutex<Vec<Outcome>>,
}

impl ConsoleListener {
    pub fn new(format: OutputFormat, no_color: bool, quiet: bool) -> Self {
        if no_color {
            colored::control::set_override(false);
        }
        Self {
            format,
            quiet,
            outcomes: Mutex::new(Vec::new()),
        }
    }

    pub fn outcomes(&self) -> Vec<Outcome> {
        self.outcomes.lock().clone()
    }

    pub fn has_failures(&self) -> bool {
        self.outcomes.lock().iter().any(|o| o.severity == Severity::Fail)
    }

    /// Print the end-of-run summary in the configured format
    pub fn print_summary(&self, report: &RunReport) {
        let outcomes = self.outcomes();
        match self.format {
            OutputFormat::Text => {
                let count = |severity: Severity| outcomes.iter().filter(|o| o.severity == severity).count();
                println!();
                println!(
                    "{} steps completed in {:.1}s: {} {}, {} {}, {} {}",
                    report.completed(),
                    (report.finished_at - report.started_at).num_milliseconds() as f64 / 1000.0,
                    count(Severity::Fail),
                    "FAIL".red(),
                    count(Severity::Warn),
                    "WARN".yellow(),
                    count(Severity::Info),
                    "INFO".cyan(),
                );
                if let Some(aborted) = report.aborted() {
                    println!("{} {}", "Run aborted at".red().bold(), aborted.identity);
                }
                if report.cancelled {
                    println!("{}", "Run cancelled".yellow());
                }
            }
            OutputFormat::Json => {
                let summary = RunSummary::new(report, outcomes);
                println!(
                    "{}",
                    serde_json::to_string_pretty(&summary).unwrap_or_else(|_| "{}".to_string())
                );
            }
        }
    }
}

impl ResultsListener for ConsoleListener {
    fn add_outcome(&self, part: u8, step: u8, severity: Severity, message: &str) {
        self.outcomes.lock().push(Outcome::new(part, step, severity, message));
    }

    fn on_result(&self, line: &str) {
        if self.format != OutputFormat::Text {
            return;
        }
        if line.starts_with("FAIL:") || line.starts_with("ABORTED:") {
            println!("{}", line.red());
        } else if line.starts_with("WARN:") {
            println!("{}", line.yellow());
        } else if !self.quiet {
            println!("{}", line);
        }
    }

    fn on_progress(&self, step_index: usize, total_steps: usize, note: &str) {
        if self.format == OutputFormat::Text && !self.quiet {
            eprintln!("{} {}", format!("[{}/{}]", step_index, total_steps).dimmed(), note);
        }
    }
}

#[derive(Serialize)]
struct StepSummary {
    part: u8,
    step: u8,
    completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    aborted: Option<String>,
}

#[derive(Serialize)]
struct RunSummary {
    started_at: DateTime<Utc>,
    finished_at: DateTime<Utc>,
    cancelled: bool,
    steps: Vec<StepSummary>,
    outcomes: Vec<Outcome>,
}

impl RunSummary {
    fn new(report: &RunReport, outcomes: Vec<Outcome>) -> Self {
        let steps = report
            .steps
            .iter()
            .map(|s| StepSummary {
                part: s.identity.part,
                step: s.identity.step,
                completed: s.outcome == StepOutcome::Completed,
                aborted: match &s.outcome {
                    StepOutcome::Aborted(reason) => Some(reason.clone()),
                    StepOutcome::Completed => None,
                },
            })
            .collect();
        Self {
            started_at: report.started_at,
            finished_at: report.finished_at,
            cancelled: report.cancelled,
            steps,
            outcomes,
        }
    }
}

#[derive(Tabled, Serialize)]
struct ModuleRow {
    #[tabled(rename = "Address")]
    address: u8,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Function")]
    function: u8,
    #[tabled(rename = "OBD")]
    obd: bool,
    #[tabled(rename = "Ignition cycles")]
    ignition_cycles: String,
    #[tabled(rename = "Engine hours (raw)")]
    engine_hours: String,
    #[tabled(rename = "Idle hours (raw)")]
    idle_hours: String,
}

fn counter(value: Option<u32>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string())
}

/// Print the discovered modules
pub fn print_modules<'a>(format: OutputFormat, modules: impl Iterator<Item = &'a ModuleInfo>) {
    let rows: Vec<ModuleRow> = modules
        .map(|m| ModuleRow {
            address: m.address,
            name: address_name(m.address),
            function: m.function,
            obd: m.obd,
            ignition_cycles: counter(m.baselines.ignition_cycles),
            engine_hours: counter(m.baselines.engine_hours_raw),
            idle_hours: counter(m.baselines.idle_hours_raw),
        })
        .collect();

    match format {
        OutputFormat::Text if rows.is_empty() => println!("No modules responded"),
        OutputFormat::Text => println!("{}", Table::new(&rows)),
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&rows).unwrap_or_else(|_| "[]".to_string())
        ),
    }
}

/// Print the steps a run would execute
pub fn print_steps(format: OutputFormat, steps: &[StepIdentity]) {
    match format {
        OutputFormat::Text => {
            for step in steps {
                println!("{}.{}  {}", step.part, step.step, step.display_name());
            }
        }
        OutputFormat::Json => {
            let ids: Vec<String> = steps.iter().map(|s| format!("{}.{}", s.part, s.step)).collect();
            println!(
                "{}",
                serde_json::to_string_pretty(&ids).unwrap_or_else(|_| "[]".to_string())
            );
        }
    }
}
