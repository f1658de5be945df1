//! Stable embedded DecisionJournal command surface for host runtimes.
//!
//! Host projects should embed journal behavior through:
//! - [`run_cli`] for full parsed CLI execution.
//! - [`run_command_with_db`] for direct `Command` execution against a DB path.
//! - [`run_command`] for execution against an existing [`SqliteDecisionStore`].

use std::path::PathBuf;

use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use decision_journal_core::{
    best_emotional_state, format_rfc3339, now_utc, parse_rfc3339_utc, CorrelationReport,
    DecisionInput, DecisionStatus, EmotionalPattern, InsightsSummary, Outcome, UserId,
};
use decision_journal_store_sqlite::{parse_user_id, SqliteDecisionStore};
use ulid::Ulid;

#[derive(Debug, Parser)]
#[command(name = "dj")]
#[command(about = "Decision Journal insights CLI")]
pub struct Cli {
    #[arg(long, default_value = "./decision_journal.sqlite3")]
    db: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    Decision {
        #[command(subcommand)]
        command: Box<DecisionCommand>,
    },
    Report {
        #[command(subcommand)]
        command: Box<ReportCommand>,
    },
    Seed {
        #[command(subcommand)]
        command: Box<SeedCommand>,
    },
}

#[derive(Debug, Subcommand)]
pub enum DecisionCommand {
    Log(LogArgs),
    List(ListArgs),
}

#[derive(Debug, Subcommand)]
pub enum ReportCommand {
    Correlation(ReportArgs),
    Summary(ReportArgs),
    Emotions(ReportArgs),
}

#[derive(Debug, Subcommand)]
pub enum SeedCommand {
    Canonical(SeedArgs),
}

#[derive(Debug, Args)]
pub struct LogArgs {
    #[arg(long)]
    pub user_id: String,
    #[arg(long)]
    pub title: String,
    #[arg(long)]
    pub confidence: u8,
    #[arg(long)]
    pub outcome: OutcomeArg,
    #[arg(long, default_value = "reviewed")]
    pub status: StatusArg,
    #[arg(long)]
    pub emotional_state: Option<String>,
    #[arg(long)]
    pub recorded_at: Option<String>,
}

#[derive(Debug, Args)]
pub struct ListArgs {
    #[arg(long)]
    pub user_id: String,
    #[arg(long)]
    pub limit: Option<usize>,
}

#[derive(Debug, Args)]
pub struct ReportArgs {
    #[arg(long)]
    pub user_id: String,
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Args)]
pub struct SeedArgs {
    /// Seeds a fresh user when omitted.
    #[arg(long)]
    pub user_id: Option<String>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutcomeArg {
    Better,
    Same,
    Worse,
    Unknown,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum StatusArg {
    Draft,
    Deliberating,
    Decided,
    Reviewed,
}

/// Executes the parsed top-level CLI command graph.
///
/// # Errors
/// Returns an error when store open/migrate or command execution fails.
pub fn run_cli(cli: Cli) -> Result<()> {
    run_command_with_db(&cli.db, cli.command)
}

/// Executes a parsed command using the provided `SQLite` DB path.
///
/// # Errors
/// Returns an error when store open/migrate fails or the requested command fails.
pub fn run_command_with_db(db_path: &std::path::Path, command: Command) -> Result<()> {
    let mut store = SqliteDecisionStore::open(db_path)?;
    store.migrate()?;
    run_command(command, &mut store)
}

/// Executes a parsed command against an existing store handle.
///
/// # Errors
/// Returns an error when command validation, persistence, or report
/// computation fails.
pub fn run_command(command: Command, store: &mut SqliteDecisionStore) -> Result<()> {
    match command {
        Command::Decision { command } => run_decision(*command, store),
        Command::Report { command } => run_report(*command, store),
        Command::Seed { command } => run_seed(*command, store),
    }
}

fn run_decision(command: DecisionCommand, store: &mut SqliteDecisionStore) -> Result<()> {
    match command {
        DecisionCommand::Log(args) => {
            let input = DecisionInput {
                decision_id: None,
                user_id: parse_user_id(&args.user_id)?,
                title: args.title,
                confidence_level: args.confidence,
                outcome: map_outcome(args.outcome),
                status: map_status(args.status),
                emotional_state: args.emotional_state,
                recorded_at: parse_optional_utc(args.recorded_at.as_deref())?,
            };

            let decision = store.insert_decision(&input)?;
            println!("{}", serde_json::to_string_pretty(&decision)?);
            Ok(())
        }
        DecisionCommand::List(args) => {
            let user_id = parse_user_id(&args.user_id)?;
            let decisions = store.list_decisions_for_user(user_id, args.limit)?;
            println!("{}", serde_json::to_string_pretty(&decisions)?);
            Ok(())
        }
    }
}

fn run_report(command: ReportCommand, store: &SqliteDecisionStore) -> Result<()> {
    match command {
        ReportCommand::Correlation(args) => {
            let user_id = parse_user_id(&args.user_id)?;
            let report = store.correlation_report(user_id)?;

            if args.json {
                let payload = build_correlation_json_payload(user_id, now_utc(), report)?;
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                print_correlation_table(user_id, &report);
            }
            Ok(())
        }
        ReportCommand::Summary(args) => {
            let user_id = parse_user_id(&args.user_id)?;
            let summary = store.insights_summary(user_id)?;

            if args.json {
                let payload = build_summary_json_payload(user_id, now_utc(), summary)?;
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                print_summary(user_id, &summary);
            }
            Ok(())
        }
        ReportCommand::Emotions(args) => {
            let user_id = parse_user_id(&args.user_id)?;
            let patterns = store.emotional_patterns(user_id)?;
            let best = best_emotional_state(&patterns).cloned();

            if args.json {
                let payload =
                    build_emotions_json_payload(user_id, now_utc(), patterns, best)?;
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                print_emotional_patterns(user_id, &patterns, best.as_ref());
            }
            Ok(())
        }
    }
}

fn run_seed(command: SeedCommand, store: &mut SqliteDecisionStore) -> Result<()> {
    match command {
        SeedCommand::Canonical(args) => {
            let user_id = match args.user_id {
                Some(raw) => parse_user_id(&raw)?,
                None => UserId(Ulid::new()),
            };

            let report = store.seed_canonical_decisions(user_id)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(())
        }
    }
}

fn map_outcome(value: OutcomeArg) -> Outcome {
    match value {
        OutcomeArg::Better => Outcome::Better,
        OutcomeArg::Same => Outcome::Same,
        OutcomeArg::Worse => Outcome::Worse,
        OutcomeArg::Unknown => Outcome::Unknown,
    }
}

fn map_status(value: StatusArg) -> DecisionStatus {
    match value {
        StatusArg::Draft => DecisionStatus::Draft,
        StatusArg::Deliberating => DecisionStatus::Deliberating,
        StatusArg::Decided => DecisionStatus::Decided,
        StatusArg::Reviewed => DecisionStatus::Reviewed,
    }
}

fn parse_optional_utc(raw: Option<&str>) -> Result<time::OffsetDateTime> {
    match raw {
        Some(value) => parse_rfc3339_utc(value).map_err(|err| anyhow!("invalid timestamp: {err}")),
        None => Ok(now_utc()),
    }
}

fn print_correlation_table(user_id: UserId, report: &CorrelationReport) {
    println!("user: {user_id}");
    println!(
        "direction: {}  sample_size: {}",
        report.direction.as_str(),
        report.sample_size
    );
    println!("{:<8} {:<7} {:<10} success_rate", "tier", "total", "successes");
    println!("{}", "-".repeat(42));

    for tier in &report.tiers {
        println!(
            "{:<8} {:<7} {:<10} {}",
            tier.label.as_str(),
            tier.total,
            tier.successes,
            tier.success_rate
                .map_or_else(|| "n/a".to_string(), |rate| format!("{rate:.3}"))
        );
    }
}

fn print_summary(user_id: UserId, summary: &InsightsSummary) {
    println!("user: {user_id}");
    println!(
        "total={} reviewed={} better={} worse={} same={} unknown={}",
        summary.total_decisions,
        summary.reviewed_decisions,
        summary.better,
        summary.worse,
        summary.same,
        summary.unknown
    );
}

fn print_emotional_patterns(
    user_id: UserId,
    patterns: &[EmotionalPattern],
    best: Option<&EmotionalPattern>,
) {
    println!("user: {user_id}");
    println!(
        "{:<14} {:<7} {:<7} {:<6} {:<8} success_rate",
        "state", "better", "worse", "same", "unknown"
    );
    println!("{}", "-".repeat(60));

    for pattern in patterns {
        println!(
            "{:<14} {:<7} {:<7} {:<6} {:<8} {}",
            pattern.emotional_state,
            pattern.better,
            pattern.worse,
            pattern.same,
            pattern.unknown,
            pattern
                .success_rate
                .map_or_else(|| "n/a".to_string(), |rate| format!("{rate:.3}"))
        );
    }

    if let Some(winner) = best {
        println!("best={}", winner.emotional_state);
    }
}

#[derive(Debug, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct CorrelationJsonPayload {
    contract_version: String,
    user_id: UserId,
    generated_at: String,
    report: CorrelationReport,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct SummaryJsonPayload {
    contract_version: String,
    user_id: UserId,
    generated_at: String,
    summary: InsightsSummary,
}

#[derive(Debug, serde::Serialize, serde::Deserialize, PartialEq)]
pub struct EmotionsJsonPayload {
    contract_version: String,
    user_id: UserId,
    generated_at: String,
    patterns: Vec<EmotionalPattern>,
    best: Option<EmotionalPattern>,
}

/// Builds the stable `correlation_report.v1` JSON payload.
///
/// # Errors
/// Returns an error when the timestamp cannot be formatted.
pub fn build_correlation_json_payload(
    user_id: UserId,
    generated_at: time::OffsetDateTime,
    report: CorrelationReport,
) -> Result<CorrelationJsonPayload> {
    Ok(CorrelationJsonPayload {
        contract_version: "correlation_report.v1".to_string(),
        user_id,
        generated_at: format_rfc3339(generated_at).map_err(|err| anyhow!(err.to_string()))?,
        report,
    })
}

/// Builds the stable `insights_summary.v1` JSON payload.
///
/// # Errors
/// Returns an error when the timestamp cannot be formatted.
pub fn build_summary_json_payload(
    user_id: UserId,
    generated_at: time::OffsetDateTime,
    summary: InsightsSummary,
) -> Result<SummaryJsonPayload> {
    Ok(SummaryJsonPayload {
        contract_version: "insights_summary.v1".to_string(),
        user_id,
        generated_at: format_rfc3339(generated_at).map_err(|err| anyhow!(err.to_string()))?,
        summary,
    })
}

/// Builds the stable `emotional_patterns.v1` JSON payload.
///
/// # Errors
/// Returns an error when the timestamp cannot be formatted.
pub fn build_emotions_json_payload(
    user_id: UserId,
    generated_at: time::OffsetDateTime,
    patterns: Vec<EmotionalPattern>,
    best: Option<EmotionalPattern>,
) -> Result<EmotionsJsonPayload> {
    Ok(EmotionsJsonPayload {
        contract_version: "emotional_patterns.v1".to_string(),
        user_id,
        generated_at: format_rfc3339(generated_at).map_err(|err| anyhow!(err.to_string()))?,
        patterns,
        best,
    })
}
