// crates/clinical-gate-cli/src/main.rs
// ============================================================================
// Module: Clinical Gate CLI Entry Point
// Description: Command dispatcher for rule evaluation, audits, and governance.
// Purpose: Provide a safe offline CLI over the gate, the auditor, and the store.
// Dependencies: clap, clinical-gate-*, serde_json, thiserror, tokio, tracing
// ============================================================================

//! ## Overview
//! The clinical gate CLI evaluates proposed actions against rule sets, lints
//! rule logic, runs integrity audits of proposed notes, and inspects the
//! governance trail. Command results go to stdout as JSON; logs go to stderr.
//! Security posture: every input file is untrusted and read under a size cap.

// ============================================================================
// SECTION: Modules
// ============================================================================


// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::ArgAction;
use clap::Args;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use clinical_gate_auditor::AuditOrchestrator;
use clinical_gate_auditor::PersistenceReceipt;
use clinical_gate_auditor::build_model_client;
use clinical_gate_cli::logging::init_logging;
use clinical_gate_config::ClinicalGateConfig;
use clinical_gate_config::config_toml_example;
use clinical_gate_core::EvaluationContext;
use clinical_gate_core::GovernanceStore;
use clinical_gate_core::PatientHash;
use clinical_gate_core::RuleGate;
use clinical_gate_core::RuleRecord;
use clinical_gate_core::SessionRef;
use clinical_gate_core::StaticSessionDirectory;
use clinical_gate_core::UpstreamSession;
use clinical_gate_core::lint_rules;
use clinical_gate_store_sqlite::SqliteGovernanceStore;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::json;
use thiserror::Error;
use tracing::info;
use tracing::warn;

// ============================================================================
// SECTION: Limits
// ============================================================================

/// Maximum size of a rules JSON input.
const MAX_RULES_BYTES: usize = 4 * 1024 * 1024;
/// Maximum size of an evaluation context JSON input.
const MAX_CONTEXT_BYTES: usize = 4 * 1024 * 1024;
/// Maximum size of a transcript or note input.
const MAX_TEXT_BYTES: usize = 1024 * 1024;
/// Maximum session reference length.
const MAX_SESSION_REF_LENGTH: usize = 256;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "clinical-gate", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Config file path (defaults to `CLINICAL_GATE_CONFIG` or ./clinical-gate.toml).
    #[arg(long, value_name = "PATH", global = true)]
    config: Option<PathBuf>,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Evaluate a proposed action against a rule set.
    Evaluate(EvaluateCommand),
    /// Rule set utilities.
    Rules {
        /// Selected rules subcommand.
        #[command(subcommand)]
        command: RulesCommand,
    },
    /// Audit a proposed note against its transcript.
    Audit(AuditCommand),
    /// Governance trail inspection.
    Governance {
        /// Selected governance subcommand.
        #[command(subcommand)]
        command: GovernanceCommand,
    },
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

/// Arguments for rule evaluation.
#[derive(Args, Debug)]
struct EvaluateCommand {
    /// Path to the evaluation context JSON file.
    #[arg(long, value_name = "PATH")]
    context: PathBuf,
    /// Path to a rules JSON array; replaces the context's rules when given.
    #[arg(long, value_name = "PATH")]
    rules: Option<PathBuf>,
}

/// Rules subcommands.
#[derive(Subcommand, Debug)]
enum RulesCommand {
    /// Lint rule logic documents.
    Lint(RulesLintCommand),
}

/// Arguments for rule linting.
#[derive(Args, Debug)]
struct RulesLintCommand {
    /// Path to the rules JSON array.
    #[arg(long, value_name = "PATH")]
    rules: PathBuf,
}

/// Arguments for note audits.
#[derive(Args, Debug)]
struct AuditCommand {
    /// Upstream session reference.
    #[arg(long, value_name = "REF")]
    session: String,
    /// Path to the consultation transcript text.
    #[arg(long, value_name = "PATH")]
    transcript: PathBuf,
    /// Path to the proposed clinical note text.
    #[arg(long, value_name = "PATH")]
    note: PathBuf,
    /// Raw patient identifier; hashed before use. Required to create a
    /// governance session for a reference the store has not seen.
    #[arg(long, value_name = "ID")]
    patient_id: Option<String>,
    /// Clinician identifier recorded on a new governance session.
    #[arg(long, value_name = "ID")]
    clinician: Option<String>,
}

/// Governance subcommands.
#[derive(Subcommand, Debug)]
enum GovernanceCommand {
    /// List governance logs and events for a session.
    Logs(GovernanceLogsCommand),
}

/// Arguments for governance log listing.
#[derive(Args, Debug)]
struct GovernanceLogsCommand {
    /// Upstream session reference.
    #[arg(long, value_name = "REF")]
    session: String,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate the resolved configuration file.
    Validate,
    /// Print a canonical example configuration.
    Example,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper carrying a user-facing message.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`].
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();

    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(&format!("clinical-gate {version}"))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = cli.command else {
        show_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    let config = ClinicalGateConfig::load(cli.config.as_deref())
        .map_err(|err| CliError::new(format!("failed to load config: {err}")))?;
    init_logging(&config.logging).map_err(|err| CliError::new(err.to_string()))?;

    match command {
        Commands::Evaluate(command) => command_evaluate(&config, &command),
        Commands::Rules {
            command,
        } => command_rules(command),
        Commands::Audit(command) => command_audit(&config, &command).await,
        Commands::Governance {
            command,
        } => command_governance(&config, command),
        Commands::Config {
            command,
        } => command_config(&config, &command),
    }
}

/// Emits the top-level help message for the CLI.
fn show_help() -> CliResult<()> {
    let mut command = Cli::command();
    command.print_help().map_err(|err| CliError::new(output_error("stdout", &err)))?;
    write_stdout_line("").map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(())
}

// ============================================================================
// SECTION: Evaluate Command
// ============================================================================

/// Executes the `evaluate` command.
fn command_evaluate(config: &ClinicalGateConfig, command: &EvaluateCommand) -> CliResult<ExitCode> {
    let mut context: EvaluationContext =
        read_json(&command.context, MAX_CONTEXT_BYTES, "evaluation context")?;
    if let Some(rules_path) = &command.rules {
        context.rules = read_json::<Vec<RuleRecord>>(rules_path, MAX_RULES_BYTES, "rules")?;
    }
    let gate = RuleGate::new(config.gate.policy());
    let decision = gate.evaluate(&context);
    info!(
        color = decision.color.as_str(),
        signals = decision.signals.len(),
        rules = context.rules.len(),
        "evaluation complete"
    );
    write_json(&decision)?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Rules Commands
// ============================================================================

/// Dispatches rules subcommands.
fn command_rules(command: RulesCommand) -> CliResult<ExitCode> {
    match command {
        RulesCommand::Lint(command) => command_rules_lint(&command),
    }
}

/// Executes the rules lint command; exits non-zero when findings exist.
fn command_rules_lint(command: &RulesLintCommand) -> CliResult<ExitCode> {
    let rules: Vec<RuleRecord> = read_json(&command.rules, MAX_RULES_BYTES, "rules")?;
    let findings = lint_rules(&rules);
    write_json(&json!({
        "rules": rules.len(),
        "findings": findings,
    }))?;
    if findings.is_empty() { Ok(ExitCode::SUCCESS) } else { Ok(ExitCode::FAILURE) }
}

// ============================================================================
// SECTION: Audit Command
// ============================================================================

/// Executes the `audit` command.
async fn command_audit(config: &ClinicalGateConfig, command: &AuditCommand) -> CliResult<ExitCode> {
    let session_ref = parse_session_ref(&command.session)?;
    let transcript = read_text(&command.transcript, "transcript")?;
    let note = read_text(&command.note, "note")?;

    let model = build_model_client(&config.auditor.model_settings(), |key| {
        std::env::var(key).ok()
    })
    .map_err(|err| CliError::new(format!("failed to build model client: {err}")))?;
    let mut orchestrator = AuditOrchestrator::new(model);

    if let Some(store) = open_store(config)? {
        let mut directory = StaticSessionDirectory::new();
        if let Some(patient_id) = command.patient_id.as_deref() {
            directory = directory.with_session(UpstreamSession {
                session_ref: session_ref.clone(),
                patient_hash: PatientHash::from_identifier(patient_id),
                clinician_id: command.clinician.clone(),
            });
        }
        orchestrator = orchestrator.with_persistence(Arc::new(store), Arc::new(directory));
    }

    let report = orchestrator.audit_session_detailed(&session_ref, &transcript, &note).await;
    match &report.persistence {
        Ok(PersistenceReceipt::Recorded {
            log_id, ..
        }) => info!(log_id = log_id.get(), "verdict recorded"),
        Ok(PersistenceReceipt::Skipped(reason)) => {
            info!(reason = reason.as_str(), "verdict not recorded");
        }
        Err(err) => warn!(error = %err, "verdict persistence failed"),
    }
    write_json(&report.verdict)?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Governance Commands
// ============================================================================

/// Dispatches governance subcommands.
fn command_governance(
    config: &ClinicalGateConfig,
    command: GovernanceCommand,
) -> CliResult<ExitCode> {
    match command {
        GovernanceCommand::Logs(command) => command_governance_logs(config, &command),
    }
}

/// Lists the governance trail for one session.
fn command_governance_logs(
    config: &ClinicalGateConfig,
    command: &GovernanceLogsCommand,
) -> CliResult<ExitCode> {
    let session_ref = parse_session_ref(&command.session)?;
    let Some(store) = open_store(config)? else {
        return Err(CliError::new("governance store is not configured (set store.path)".to_string()));
    };
    let session = store.find_session(&session_ref).map_err(store_error)?;
    let logs = store.list_logs(&session_ref).map_err(store_error)?;
    let events = store.list_events(&session_ref).map_err(store_error)?;
    write_json(&json!({
        "session": session,
        "logs": logs,
        "events": events,
    }))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Dispatches config subcommands.
fn command_config(config: &ClinicalGateConfig, command: &ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate => {
            let source = config.source_path.as_ref().map_or_else(
                || "built-in defaults".to_string(),
                |path| path.display().to_string(),
            );
            write_stdout_line(&format!("config ok ({source})"))
                .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        }
        ConfigCommand::Example => {
            write_stdout_bytes(config_toml_example().as_bytes())
                .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        }
    }
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Store Helpers
// ============================================================================

/// Opens the configured `SQLite` store, if any.
fn open_store(config: &ClinicalGateConfig) -> CliResult<Option<SqliteGovernanceStore>> {
    let Some(sqlite) = config.store.sqlite_config() else {
        return Ok(None);
    };
    SqliteGovernanceStore::new(sqlite)
        .map(Some)
        .map_err(|err| CliError::new(format!("failed to open governance store: {err}")))
}

/// Formats a persistence error.
fn store_error(err: clinical_gate_core::PersistenceError) -> CliError {
    CliError::new(format!("governance store error: {err}"))
}

/// Validates a session reference argument.
fn parse_session_ref(raw: &str) -> CliResult<SessionRef> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed.len() > MAX_SESSION_REF_LENGTH {
        return Err(CliError::new(format!(
            "session reference must be 1..={MAX_SESSION_REF_LENGTH} characters"
        )));
    }
    Ok(SessionRef::new(trimmed))
}

// ============================================================================
// SECTION: Input Helpers
// ============================================================================

/// Errors returned by bounded file reads.
#[derive(Debug)]
enum ReadLimitError {
    /// File I/O failure.
    Io(std::io::Error),
    /// File size exceeds the configured limit.
    TooLarge {
        /// Actual size in bytes.
        size: u64,
        /// Allowed limit in bytes.
        limit: usize,
    },
}

/// Reads a file from disk while enforcing a hard size limit.
fn read_bytes_with_limit(path: &Path, max_bytes: usize) -> Result<Vec<u8>, ReadLimitError> {
    let file = File::open(path).map_err(ReadLimitError::Io)?;
    let size = file.metadata().map_err(ReadLimitError::Io)?.len();
    let limit = u64::try_from(max_bytes).map_err(|_| ReadLimitError::TooLarge {
        size,
        limit: max_bytes,
    })?;
    if size > limit {
        return Err(ReadLimitError::TooLarge {
            size,
            limit: max_bytes,
        });
    }
    let mut limited = file.take(limit.saturating_add(1));
    let mut bytes = Vec::new();
    limited.read_to_end(&mut bytes).map_err(ReadLimitError::Io)?;
    if bytes.len() > max_bytes {
        return Err(ReadLimitError::TooLarge {
            size: u64::try_from(bytes.len()).unwrap_or(u64::MAX),
            limit: max_bytes,
        });
    }
    Ok(bytes)
}

/// Formats a bounded read failure.
fn read_error(kind: &str, path: &Path, err: &ReadLimitError) -> CliError {
    match err {
        ReadLimitError::Io(error) => {
            CliError::new(format!("failed to read {kind} {}: {error}", path.display()))
        }
        ReadLimitError::TooLarge {
            size,
            limit,
        } => CliError::new(format!(
            "{kind} {} exceeds size limit ({size} > {limit} bytes)",
            path.display()
        )),
    }
}

/// Reads and decodes a JSON input file.
fn read_json<T: DeserializeOwned>(path: &Path, max_bytes: usize, kind: &str) -> CliResult<T> {
    let bytes = read_bytes_with_limit(path, max_bytes).map_err(|err| read_error(kind, path, &err))?;
    serde_json::from_slice(&bytes)
        .map_err(|err| CliError::new(format!("invalid {kind} json in {}: {err}", path.display())))
}

/// Reads a UTF-8 text input file.
fn read_text(path: &Path, kind: &str) -> CliResult<String> {
    let bytes =
        read_bytes_with_limit(path, MAX_TEXT_BYTES).map_err(|err| read_error(kind, path, &err))?;
    String::from_utf8(bytes)
        .map_err(|_| CliError::new(format!("{kind} {} must be utf-8", path.display())))
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes raw bytes to stdout without adding a newline.
fn write_stdout_bytes(bytes: &[u8]) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    stdout.write_all(bytes)
}

/// Writes a value to stdout as pretty JSON.
fn write_json<T: Serialize>(value: &T) -> CliResult<()> {
    let mut bytes = serde_json::to_vec_pretty(value)
        .map_err(|err| CliError::new(format!("failed to serialize output: {err}")))?;
    bytes.push(b'\n');
    write_stdout_bytes(&bytes).map_err(|err| CliError::new(output_error("stdout", &err)))
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output error message.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    format!("failed to write to {stream}: {error}")
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
