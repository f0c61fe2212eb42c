//! sitecpm CLI - Construction Activity Sequencing Engine
//!
//! Validates activity networks, ranks the activities ready on a simulated
//! day and maintains the completion ledger between runs.

mod diagnostics;
mod input;
mod report;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use sitecpm_core::{
    CompletionLedger, Day, DiagnosticEmitter, EquipmentMode, LedgerStore, MemoryLedgerStore, Overrides,
    ScheduleError, Scheduler, ToggleOutcome,
};
use sitecpm_solver::SiteScheduler;
use tracing::{debug, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::diagnostics::{DiagnosticConfig, ExitCode, JsonEmitter, TerminalEmitter};
use crate::input::JsonFileLedgerStore;

#[derive(Parser)]
#[command(name = "sitecpm")]
#[command(author, version, about = "Construction activity sequencing engine", long_about = None)]
struct Cli {
    /// Verbose output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

#[derive(clap::Args)]
struct DiagnosticArgs {
    /// Treat warnings as errors
    #[arg(long)]
    strict: bool,

    /// Only show errors
    #[arg(short, long)]
    quiet: bool,

    /// Drop dependencies on unknown activities instead of failing
    #[arg(long)]
    lenient: bool,

    /// Scheduler configuration file (TOML)
    #[arg(long, env = "SITECPM_CONFIG", value_name = "PATH")]
    config: Option<PathBuf>,
}

impl DiagnosticArgs {
    fn diagnostic_config(&self) -> DiagnosticConfig {
        DiagnosticConfig {
            strict: self.strict,
            quiet: self.quiet,
        }
    }

    fn scheduler(&self) -> Result<SiteScheduler> {
        let mut config = input::load_config(self.config.as_deref())?;
        if self.lenient {
            config.strict_references = false;
        }
        debug!(?config, "scheduler configuration");
        Ok(SiteScheduler::with_config(config))
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Validate an activity file
    Check {
        /// Activity file (.json or .toml)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        #[command(flatten)]
        diagnostics: DiagnosticArgs,
    },

    /// Rank the activities ready on a given day
    Schedule {
        /// Activity file (.json or .toml)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Simulated current day
        #[arg(short, long, default_value_t = 1, value_parser = clap::value_parser!(i64).range(1..))]
        day: Day,

        /// Completion ledger file; created on first write
        #[arg(short, long, value_name = "PATH")]
        ledger: Option<PathBuf>,

        /// Overrides file (.json or .toml)
        #[arg(long, value_name = "PATH")]
        overrides: Option<PathBuf>,

        /// Toggle completion of an activity on the current day
        #[arg(long, value_name = "ID")]
        toggle: Vec<String>,

        /// Idle workers for an activity
        #[arg(long, value_name = "ID=N", value_parser = input::parse_assignment)]
        idle: Vec<(String, String)>,

        /// Material availability in percent
        #[arg(long, value_name = "ID=PCT", value_parser = input::parse_assignment)]
        material: Vec<(String, String)>,

        /// Equipment mode (rented, owned, none)
        #[arg(long, value_name = "ID=MODE", value_parser = input::parse_assignment)]
        equipment: Vec<(String, String)>,

        /// Drop ledger entries recorded after the current day before scheduling
        #[arg(long)]
        rollback: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Output file (stdout if not specified)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Include the day-wise cost table in text output
        #[arg(long)]
        daywise: bool,

        #[command(flatten)]
        diagnostics: DiagnosticArgs,
    },

    /// Inspect or edit a completion ledger
    Ledger {
        /// Ledger file
        #[arg(short, long, value_name = "PATH")]
        ledger: PathBuf,

        #[command(subcommand)]
        action: LedgerAction,
    },
}

#[derive(Subcommand)]
enum LedgerAction {
    /// List recorded completions
    Show,
    /// Record an activity as completed on a day
    Complete {
        id: String,
        #[arg(short, long, value_parser = clap::value_parser!(i64).range(1..))]
        day: Day,
    },
    /// Remove an activity's completion record
    Uncomplete { id: String },
    /// Flip an activity's completion state on a day
    Toggle {
        id: String,
        #[arg(short, long, value_parser = clap::value_parser!(i64).range(1..))]
        day: Day,
    },
    /// Drop completions recorded after a day
    Rollback {
        #[arg(short, long, value_parser = clap::value_parser!(i64).range(0..))]
        day: Day,
    },
    /// Remove every completion record
    Reset,
}

fn main() -> Result<process::ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let code = match cli.command {
        Commands::Check { file, diagnostics } => cmd_check(&file, &diagnostics)?,
        Commands::Schedule {
            file,
            day,
            ledger,
            overrides,
            toggle,
            idle,
            material,
            equipment,
            rollback,
            format,
            output,
            daywise,
            diagnostics,
        } => {
            let mut overrides = match overrides {
                Some(path) => input::load_overrides(&path)?,
                None => Overrides::new(),
            };
            apply_cli_overrides(&mut overrides, toggle, idle, material, equipment)?;
            let request = ScheduleRequest {
                file,
                day,
                ledger,
                overrides,
                rollback,
                format,
                output,
                daywise,
            };
            cmd_schedule(&request, &diagnostics)?
        }
        Commands::Ledger { ledger, action } => cmd_ledger(&ledger, action)?,
    };

    Ok(code.into())
}

/// `RUST_LOG` wins over `-v`
fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

fn apply_cli_overrides(
    overrides: &mut Overrides,
    toggles: Vec<String>,
    idle: Vec<(String, String)>,
    material: Vec<(String, String)>,
    equipment: Vec<(String, String)>,
) -> Result<()> {
    overrides.completion_toggles.extend(toggles);
    for (id, value) in idle {
        let count: u32 = value
            .parse()
            .with_context(|| format!("invalid idle count '{}' for '{}'", value, id))?;
        overrides.activities.entry(id).or_default().idle_manpower = Some(count);
    }
    for (id, value) in material {
        let percent: f64 = value
            .trim_end_matches('%')
            .parse()
            .with_context(|| format!("invalid material percent '{}' for '{}'", value, id))?;
        overrides.activities.entry(id).or_default().material_percent = Some(percent);
    }
    for (id, value) in equipment {
        let mode: EquipmentMode = value.parse().map_err(anyhow::Error::msg)?;
        overrides.activities.entry(id).or_default().equipment = Some(mode);
    }
    Ok(())
}

// ============================================================================
// check
// ============================================================================

fn cmd_check(file: &Path, args: &DiagnosticArgs) -> Result<ExitCode> {
    let activities = input::load_activities(file)?;
    let scheduler = args.scheduler()?;
    let mut emitter = TerminalEmitter::new(io::stderr(), args.diagnostic_config());

    match scheduler.validate(&activities) {
        Ok(diagnostics) => {
            for diagnostic in diagnostics {
                emitter.emit(diagnostic);
            }
        }
        Err(ScheduleError::Config(errors)) => {
            for error in &errors {
                emitter.emit(error.to_diagnostic());
            }
        }
        Err(e) => return Err(e.into()),
    }

    let code = emitter.exit_code();
    if code.is_success() && !args.quiet {
        println!(
            "{}: {} activities OK ({} warnings)",
            file.display(),
            activities.len(),
            emitter.warning_count()
        );
    }
    Ok(code)
}

// ============================================================================
// schedule
// ============================================================================

struct ScheduleRequest {
    file: PathBuf,
    day: Day,
    ledger: Option<PathBuf>,
    overrides: Overrides,
    rollback: bool,
    format: OutputFormat,
    output: Option<PathBuf>,
    daywise: bool,
}

fn cmd_schedule(request: &ScheduleRequest, args: &DiagnosticArgs) -> Result<ExitCode> {
    let activities = input::load_activities(&request.file)?;
    let scheduler = args.scheduler()?;

    let mut store: Box<dyn LedgerStore> = match &request.ledger {
        Some(path) => Box::new(JsonFileLedgerStore::new(path)),
        None => Box::new(MemoryLedgerStore::default()),
    };
    let mut ledger = store.load().context("failed to load completion ledger")?;
    let before = ledger.clone();

    if request.rollback {
        let dropped = ledger.rollback_to(request.day);
        if !dropped.is_empty() {
            info!(day = request.day, dropped = ?dropped, "ledger rolled back");
        }
    }

    let result = match scheduler.run(&activities, &mut ledger, request.day, &request.overrides) {
        Ok(result) => result,
        Err(ScheduleError::Config(errors)) => {
            let config = args.diagnostic_config();
            return Ok(match request.format {
                OutputFormat::Text => {
                    let mut emitter = TerminalEmitter::new(io::stderr(), config);
                    for error in &errors {
                        emitter.emit(error.to_diagnostic());
                    }
                    emitter.exit_code()
                }
                OutputFormat::Json => {
                    let mut emitter = JsonEmitter::new(config);
                    for error in &errors {
                        emitter.emit(error.to_diagnostic());
                    }
                    let code = emitter.exit_code();
                    let doc = serde_json::json!({
                        "exit_code": code.code(),
                        "diagnostics": emitter.to_json_value(),
                    });
                    write_output(request.output.as_deref(), &serde_json::to_string_pretty(&doc)?)?;
                    code
                }
            });
        }
        Err(e) => return Err(e.into()),
    };

    if ledger != before {
        store.save(&ledger).context("failed to save completion ledger")?;
        debug!(entries = ledger.len(), "ledger saved");
    }

    let config = args.diagnostic_config();
    match request.format {
        OutputFormat::Text => {
            let mut emitter = TerminalEmitter::new(io::stderr(), config);
            for diagnostic in &result.diagnostics {
                emitter.emit(diagnostic.clone());
            }
            write_output(request.output.as_deref(), &report::render_text(&result, request.daywise))?;
            Ok(emitter.exit_code())
        }
        OutputFormat::Json => {
            let mut emitter = JsonEmitter::new(config);
            for diagnostic in &result.diagnostics {
                emitter.emit(diagnostic.clone());
            }
            let code = emitter.exit_code();
            let doc = serde_json::json!({
                "exit_code": code.code(),
                "diagnostics": emitter.to_json_value(),
                "result": result,
            });
            write_output(request.output.as_deref(), &serde_json::to_string_pretty(&doc)?)?;
            Ok(code)
        }
    }
}

fn write_output(output: Option<&Path>, text: &str) -> Result<()> {
    match output {
        Some(path) => {
            fs::write(path, text).with_context(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), "report written");
        }
        None => println!("{}", text.trim_end()),
    }
    Ok(())
}

// ============================================================================
// ledger
// ============================================================================

fn cmd_ledger(path: &Path, action: LedgerAction) -> Result<ExitCode> {
    let mut store = JsonFileLedgerStore::new(path);
    let mut ledger = store.load().context("failed to load completion ledger")?;

    match action {
        LedgerAction::Show => {
            if ledger.is_empty() {
                println!("No completions recorded");
            }
            for (id, day) in ledger.iter() {
                println!("{:<12} day {}", id, day);
            }
            return Ok(ExitCode::Success);
        }
        LedgerAction::Complete { id, day } => {
            ledger.record(id.as_str(), day);
            println!("{} completed on day {}", id, day);
        }
        LedgerAction::Uncomplete { id } => match ledger.remove(&id) {
            Some(day) => println!("{} no longer completed (was day {})", id, day),
            None => println!("{} was not completed", id),
        },
        LedgerAction::Toggle { id, day } => match ledger.toggle(&id, day) {
            ToggleOutcome::Recorded => println!("{} completed on day {}", id, day),
            ToggleOutcome::Cleared => println!("{} no longer completed", id),
            ToggleOutcome::Unchanged => println!(
                "{} was completed on day {}; unchanged",
                id,
                ledger.completion_day(&id).unwrap_or(day)
            ),
        },
        LedgerAction::Rollback { day } => {
            let dropped = ledger.rollback_to(day);
            println!("Dropped {} completion(s) after day {}", dropped.len(), day);
        }
        LedgerAction::Reset => ledger = CompletionLedger::new(),
    }

    store.save(&ledger).context("failed to save completion ledger")?;
    Ok(ExitCode::Success)
}
