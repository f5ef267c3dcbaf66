// intake CLI - client file intake and reconciliation

mod exit_codes;

use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand, ValueEnum};
use intake_config::{ConfigError, EmptyInboxPolicy, Layout, Settings};
use intake_recon::{
    bootstrap, organized_outputs, pending_files, reconcile, submit, DriverError, FileOutcome,
    Journal, Readiness, RunReport, SubmitOutcome,
};

use exit_codes::{
    EXIT_BOOTSTRAP, EXIT_CONFIG, EXIT_EMPTY_INBOX, EXIT_ERROR, EXIT_REJECTED, EXIT_SUCCESS,
    EXIT_USAGE,
};

#[derive(Parser)]
#[command(name = "intake")]
#[command(about = "Validate, clean and report on client contract files")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct LayoutArgs {
    /// Root directory holding arquivos/ and relatorios/
    #[arg(long, default_value = ".", env = "INTAKE_ROOT")]
    root: PathBuf,

    /// Settings file (default: <root>/intake.toml when present)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum EmptyInboxArg {
    Warn,
    Abort,
}

impl From<EmptyInboxArg> for EmptyInboxPolicy {
    fn from(arg: EmptyInboxArg) -> Self {
        match arg {
            EmptyInboxArg::Warn => EmptyInboxPolicy::Warn,
            EmptyInboxArg::Abort => EmptyInboxPolicy::Abort,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Process every new file in the raw inbox
    #[command(after_help = "\
Examples:
  intake run
  intake run --root /srv/carteira --empty-inbox abort
  intake run --json > run.json

Exit codes:
  0  run completed (per-file failures are listed, not fatal)
  3  directories were created; add files and run again
  4  inbox empty with --empty-inbox abort")]
    Run {
        #[command(flatten)]
        layout: LayoutArgs,

        /// What to do when the inbox has no files
        #[arg(long, value_enum)]
        empty_inbox: Option<EmptyInboxArg>,

        /// Print the run report as JSON
        #[arg(long)]
        json: bool,
    },

    /// List raw files that the next run would process
    Pending {
        #[command(flatten)]
        layout: LayoutArgs,
    },

    /// Check files and copy them into the raw inbox
    #[command(after_help = "\
Examples:
  intake submit clientes_marco.xlsx
  intake submit lote1.csv lote2.json --root /srv/carteira

A file whose name already exists in the inbox is left untouched.")]
    Submit {
        /// Files to submit (.xlsx, .csv, .json)
        #[arg(required = true)]
        files: Vec<PathBuf>,

        #[command(flatten)]
        layout: LayoutArgs,
    },

    /// Load a file and report missing required columns
    Validate {
        file: PathBuf,

        /// Print the result as JSON
        #[arg(long)]
        json: bool,
    },

    /// List organized outputs
    List {
        #[command(flatten)]
        layout: LayoutArgs,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_target(false)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run { layout, empty_inbox, json } => cmd_run(&layout, empty_inbox, json),
        Commands::Pending { layout } => cmd_pending(&layout),
        Commands::Submit { files, layout } => cmd_submit(&files, &layout),
        Commands::Validate { file, json } => cmd_validate(&file, json),
        Commands::List { layout } => cmd_list(&layout),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(CliError { code, message, hint }) => {
            if !message.is_empty() {
                eprintln!("error: {}", message);
            }
            if let Some(hint) = hint {
                eprintln!("hint:  {}", hint);
            }
            ExitCode::from(code)
        }
    }
}

#[derive(Debug)]
pub struct CliError {
    pub code: u8,
    pub message: String,
    pub hint: Option<String>,
}

impl CliError {
    pub fn new(code: u8, msg: impl Into<String>) -> Self {
        Self { code, message: msg.into(), hint: None }
    }

    pub fn args(msg: impl Into<String>) -> Self {
        Self::new(EXIT_USAGE, msg)
    }

    pub fn io(msg: impl Into<String>) -> Self {
        Self::new(EXIT_ERROR, msg)
    }

    pub fn config(err: ConfigError) -> Self {
        Self::new(EXIT_CONFIG, err.to_string())
            .with_hint("check the [layout] and [run] tables in intake.toml")
    }

    pub fn driver(err: DriverError) -> Self {
        match err {
            DriverError::EmptyInbox(_) => Self::new(EXIT_EMPTY_INBOX, err.to_string())
                .with_hint("submit files with `intake submit` or use --empty-inbox warn"),
            DriverError::Io { .. } => Self::io(err.to_string())
                .with_hint("run `intake run` once to create the directory layout"),
        }
    }

    /// Add a hint to an existing error.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

// ============================================================================
// shared
// ============================================================================

fn load_layout(args: &LayoutArgs) -> Result<(Settings, Layout), CliError> {
    let settings = match &args.config {
        Some(path) => Settings::load_from(path),
        None => Settings::load(&args.root),
    }
    .map_err(CliError::config)?;
    let layout = settings.layout(&args.root);
    Ok((settings, layout))
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn print_lines<I: IntoIterator<Item = String>>(lines: I) -> Result<(), CliError> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    for line in lines {
        writeln!(handle, "{}", line).map_err(|e| CliError::io(e.to_string()))?;
    }
    Ok(())
}

// ============================================================================
// run
// ============================================================================

fn cmd_run(args: &LayoutArgs, empty_inbox: Option<EmptyInboxArg>, json: bool) -> Result<(), CliError> {
    let (settings, layout) = load_layout(args)?;

    let readiness = bootstrap(&layout)
        .map_err(|e| CliError::io(format!("cannot create directories: {}", e)))?;

    let mut journal = Journal::open(&layout.log_file)
        .map_err(|e| CliError::io(format!("{}: {}", layout.log_file.display(), e)))?;

    if let Readiness::Created(dirs) = readiness {
        let list = dirs
            .iter()
            .map(|d| d.display().to_string())
            .collect::<Vec<_>>()
            .join(", ");
        journal.error(format!(
            "Required directories were missing and have been created ({list}); run stopped"
        ));
        let mut message = format!("created missing directories: {list}");
        if let Err(e) = journal.finish() {
            log::error!("cannot flush {}: {}", layout.log_file.display(), e);
            message.push_str(&format!("; processing log not saved: {e}"));
        }
        return Err(CliError::new(EXIT_BOOTSTRAP, message)
            .with_hint(format!(
                "place files in {} and run again",
                layout.inbox.display()
            )));
    }

    let policy = empty_inbox.map(EmptyInboxPolicy::from).unwrap_or(settings.run.empty_inbox);
    let outcome = reconcile(&layout, policy, &mut journal);
    journal
        .finish()
        .map_err(|e| CliError::io(format!("{}: {}", layout.log_file.display(), e)))?;
    let report = outcome.map_err(CliError::driver)?;

    if json {
        let out = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::io(format!("cannot serialize run report: {}", e)))?;
        print_lines([out])
    } else {
        print_lines(summary_lines(&report))
    }
}

fn summary_lines(report: &RunReport) -> Vec<String> {
    let width = report.files.iter().map(|f| f.file.chars().count()).max().unwrap_or(0);

    let mut lines: Vec<String> = report
        .files
        .iter()
        .map(|f| {
            let (status, detail) = match &f.outcome {
                FileOutcome::Processed { segment, report } => (
                    "processed",
                    format!(
                        "{segment}, {} active, {} CPF highlighted",
                        report.active_rows, report.highlighted
                    ),
                ),
                FileOutcome::Skipped { reason, detail } => (
                    "skipped",
                    match detail {
                        Some(d) => format!("{reason}: {d}"),
                        None => reason.to_string(),
                    },
                ),
                FileOutcome::Failed { stage, message } => ("failed", format!("{stage}: {message}")),
            };
            format!("{status:<10} {:<width$}  {detail}", f.file)
        })
        .collect();

    let counts = report.counts();
    lines.push(format!(
        "{} files: {} processed, {} skipped, {} failed",
        report.files.len(),
        counts.processed,
        counts.skipped,
        counts.failed
    ));
    lines
}

// ============================================================================
// pending / list
// ============================================================================

fn cmd_pending(args: &LayoutArgs) -> Result<(), CliError> {
    let (_, layout) = load_layout(args)?;
    let files = pending_files(&layout).map_err(CliError::driver)?;
    print_lines(files.iter().map(|p| file_name(p)))
}

fn cmd_list(args: &LayoutArgs) -> Result<(), CliError> {
    let (_, layout) = load_layout(args)?;
    let files = organized_outputs(&layout).map_err(CliError::driver)?;
    print_lines(files.iter().map(|p| file_name(p)))
}

// ============================================================================
// submit
// ============================================================================

fn cmd_submit(files: &[PathBuf], args: &LayoutArgs) -> Result<(), CliError> {
    let (_, layout) = load_layout(args)?;
    if !layout.inbox.is_dir() {
        return Err(CliError::io(format!("inbox {} does not exist", layout.inbox.display()))
            .with_hint("run `intake run` once to create the directory layout"));
    }

    let mut lines = Vec::new();
    let mut rejected = 0;
    for file in files {
        let name = file_name(file);
        if !file.is_file() {
            return Err(CliError::args(format!("file not found: {}", file.display())));
        }
        match submit(file, &layout) {
            Ok(SubmitOutcome::Accepted(_)) => {
                log::info!("{name} submitted");
                lines.push(format!("accepted  {name}"));
            }
            Ok(SubmitOutcome::Duplicate(_)) => {
                log::warn!("{name} already exists in the inbox; ignored");
                lines.push(format!("duplicate {name}"));
            }
            Err(e) => {
                log::error!("{name} rejected: {e}");
                lines.push(format!("rejected  {name}: {e}"));
                rejected += 1;
            }
        }
    }
    print_lines(lines)?;

    if rejected > 0 {
        return Err(CliError::new(
            EXIT_REJECTED,
            format!("{rejected} of {} files rejected", files.len()),
        ));
    }
    Ok(())
}

// ============================================================================
// validate
// ============================================================================

#[derive(serde::Serialize)]
struct ValidationOutput {
    file: String,
    rows: usize,
    columns: Vec<String>,
    missing: Vec<&'static str>,
    valid: bool,
}

fn cmd_validate(file: &Path, json: bool) -> Result<(), CliError> {
    if !file.is_file() {
        return Err(CliError::args(format!("file not found: {}", file.display())));
    }
    let batch = intake_io::load(file).map_err(|e| {
        CliError::new(EXIT_REJECTED, format!("{}: {}", file.display(), e))
    })?;
    let missing = intake_recon::schema::missing_columns(&batch);

    let output = ValidationOutput {
        file: file_name(file),
        rows: batch.len(),
        columns: batch.columns().to_vec(),
        valid: missing.is_empty(),
        missing,
    };

    if json {
        let out = serde_json::to_string_pretty(&output)
            .map_err(|e| CliError::io(e.to_string()))?;
        print_lines([out])?;
    } else if output.valid {
        print_lines([format!(
            "ok: {} has every required column ({} rows)",
            output.file, output.rows
        )])?;
    }

    if output.valid {
        Ok(())
    } else {
        Err(CliError::new(
            EXIT_REJECTED,
            format!("{}: missing columns: {}", output.file, output.missing.join(", ")),
        )
        .with_hint(format!(
            "required columns: {}",
            intake_core::REQUIRED_COLUMNS.join(", ")
        )))
    }
}
