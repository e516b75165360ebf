use crate::cli::error::AppError;
use crate::cli::output::{CommandData, CommandOutput, CommandStatus, ErrorJson};
use crate::migration::Direction;
use crate::transition::Outcome;

use std::fmt::Write;
use std::io::{self, IsTerminal};


pub fn setup_logging(verbose: u8, quiet: bool, json: bool) -> Result<(), AppError> {
    if json {
        // stdout only carries the JSON document
        tracing::subscriber::set_global_default(tracing::subscriber::NoSubscriber::default())?;
        return Ok(());
    }

    let level = if quiet {
        tracing::Level::ERROR
    } else { match verbose {
        0 => tracing::Level::INFO,
        1 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    }};

    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}


const RESET: &str = "\x1b[0m";
const RED: &str = "\x1b[31m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const BLUE: &str = "\x1b[34m";
const BOLD: &str = "\x1b[1m";

/// ANSI colouring, enabled only for a terminal without `NO_COLOR`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    enabled: bool,
}

impl Palette {
    pub fn detect() -> Self {
        let no_color = std::env::var_os("NO_COLOR").is_some_and(|v| !v.is_empty());
        Palette { enabled: io::stdout().is_terminal() && !no_color }
    }

    pub fn plain() -> Self {
        Palette { enabled: false }
    }

    fn paint(&self, codes: &[&str], text: &str) -> String {
        if self.enabled {
            format!("{}{}{}", codes.concat(), text, RESET)
        } else {
            text.to_string()
        }
    }

    pub fn success(&self, msg: &str) -> String {
        self.paint(&[GREEN, BOLD], &format!("OK {msg}"))
    }

    pub fn warning(&self, msg: &str) -> String {
        self.paint(&[YELLOW], &format!("! {msg}"))
    }

    pub fn error(&self, msg: &str) -> String {
        self.paint(&[RED], &format!("ERROR: {msg}"))
    }

    pub fn info(&self, msg: &str) -> String {
        self.paint(&[BLUE], &format!("* {msg}"))
    }
}


/// Print a command's outcome for humans; errors go to stderr.
pub fn render_human_output(output: &CommandOutput, palette: &Palette) {
    let text = human_output(output, palette);
    match output.status {
        CommandStatus::Error => eprint!("{text}"),
        _ => print!("{text}"),
    }
}

pub fn human_output(output: &CommandOutput, palette: &Palette) -> String {
    let mut out = String::new();

    if let Some(error) = &output.error {
        render_error(&mut out, error, palette);
    }
    if let Some(data) = &output.data {
        render_data(&mut out, data, palette);
    }

    out
}

// fmt::Write into a String is infallible.
fn render_error(out: &mut String, error: &ErrorJson, palette: &Palette) {
    let _ = writeln!(out, "{}", palette.error(&error.message));
    for detail in &error.details {
        let _ = writeln!(out, "  ✗ {detail}");
    }
    if let Some(version) = error.dirty_version {
        let _ = writeln!(out, "\nA previous migration failed mid-execution.");
        let _ = writeln!(out, "Inspect the database, then fix with: migrate-tool force {version}");
    }
}

fn render_data(out: &mut String, data: &CommandData, palette: &Palette) {
    match data {
        CommandData::Status(view) => {
            let status = &view.status;
            let _ = writeln!(out, "Environment: {}", view.environment);
            if status.version > 0 {
                let _ = writeln!(out, "Current Version: {}", status.version);
            } else {
                let _ = writeln!(out, "Current Version: none (no migrations applied)");
            }
            let _ = writeln!(out, "Dirty: {}", status.dirty);
            let _ = writeln!(out, "Applied: {} / {}", status.applied, status.total);
            let _ = writeln!(out, "Pending: {}", status.pending);

            if status.dirty {
                let _ = writeln!(out, "\n{}", palette.warning("Database is in dirty state."));
                let _ = writeln!(out, "This usually means a migration failed mid-execution.");
                let _ = writeln!(out, "Fix with: migrate-tool force {} --env={}", status.version, view.environment);
            }
        }
        CommandData::History(view) => {
            let _ = writeln!(out, "Migration History (env: {})", view.environment);
            let _ = writeln!(out, "----------------------------------------");
            if view.entries.is_empty() && view.remaining == 0 {
                let _ = writeln!(out, "  No migrations found");
            }
            for entry in &view.entries {
                let marker = if entry.applied { "[x]" } else { "[ ]" };
                let _ = writeln!(out, "  {} {:06} - {}", marker, entry.version, entry.name);
            }
            if view.remaining > 0 {
                let _ = writeln!(out, "\n  ... and {} more (use --limit to show more)", view.remaining);
            }
        }
        CommandData::Transition(view) => match &view.outcome {
            Outcome::Completed(report) => {
                let line = match (report.operation, report.direction) {
                    ("force version", _) => format!("Version forced to {}", report.version),
                    ("goto", direction) => format!(
                        "{} to version {} complete ({} migration(s))",
                        direction.noun(),
                        report.version,
                        report.count
                    ),
                    (_, Direction::Down) => format!("Rolled back {} migration(s)", report.count),
                    _ => format!("Applied {} migration(s) successfully", report.count),
                };
                let _ = writeln!(out, "{}", palette.success(&line));
                let _ = writeln!(out, "Current version: {}", report.version);
            }
            Outcome::NoChange { message } => {
                let _ = writeln!(out, "{}", palette.info(message));
            }
            Outcome::Cancelled => {
                let _ = writeln!(out, "{}", palette.warning("Cancelled"));
            }
        },
        CommandData::Validate(view) => {
            for check in &view.environments {
                let _ = writeln!(out, "{}: {} migration(s)", check.name, check.report.count);
            }
            let _ = writeln!(out, "─────────────────────────────");
            if view.warnings.is_empty() {
                let _ = writeln!(out, "✓ All validations passed");
            } else {
                let _ = writeln!(out, "WARNINGS:");
                for warning in &view.warnings {
                    let _ = writeln!(out, "  {}", palette.warning(warning));
                }
            }
        }
        CommandData::Created(view) => {
            let _ = writeln!(out, "{}", palette.success(&format!("Created {}", view.path.display())));
        }
        CommandData::Config(view) => {
            let _ = writeln!(out, "Config file: {}\n", view.path.display());
            let _ = writeln!(out, "Environments:");
            for (name, env) in &view.environments {
                let _ = writeln!(out, "  {name}:");
                let _ = writeln!(out, "    database_url: {}", env.database_url);
                let _ = writeln!(out, "    migrations_path: {}", env.migrations_path.display());
                let _ = writeln!(out, "    require_confirmation: {}", env.require_confirmation);
            }

            let defaults = &view.defaults;
            if defaults.migrations_path.is_some() || defaults.require_confirmation {
                let _ = writeln!(out, "\nDefaults:");
                if let Some(path) = &defaults.migrations_path {
                    let _ = writeln!(out, "  migrations_path: {path}");
                }
                let _ = writeln!(out, "  require_confirmation: {}", defaults.require_confirmation);
            }
        }
    }
}
