//! `relist run` — one full sync pass.
//!
//! Pipeline: read ledger, fetch observation, normalize, reconcile,
//! filter, persist the new ledger, then (apply mode only) execute the
//! approved price actions and persist the outcomes.
//!
//! The ledger write happens BEFORE any mutation: a crash mid-execution
//! leaves a ledger that already knows about every addition and removal,
//! and un-executed price actions simply reappear on the next run.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

use chrono::Utc;
use clap::Args;
use serde::Serialize;

use relist_engine::execute::{execute, ExecutorOptions};
use relist_engine::model::{ExecutionResult, MutationPlan, RecordIssue};
use relist_engine::plan::{plan, ApprovedPlan, Filters, Mode};
use relist_engine::reconcile::{apply_outcomes, apply_plan, reconcile, ReconcileOptions};
use relist_engine::snapshot::normalize;

use relist_io::{read_ledger, write_and_verify};

use crate::bridge::BridgeClient;
use crate::config::{self, Settings};
use crate::worklist::write_worklist;
use crate::CliError;

#[derive(Args)]
pub struct RunArgs {
    /// Config file (default: ./relist.toml if present)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Ledger CSV path (overrides config)
    #[arg(long, value_name = "PATH")]
    pub ledger: Option<PathBuf>,

    /// Profile whose listings are scanned (overrides config)
    #[arg(long, env = "RELIST_PROFILE")]
    pub profile: Option<String>,

    /// Bridge base URL (overrides config)
    #[arg(long, env = "RELIST_BRIDGE_URL", value_name = "URL")]
    pub bridge_url: Option<String>,

    /// Percent applied to rows without a per-item override (overrides config)
    #[arg(long, value_name = "PCT", allow_hyphen_values = true)]
    pub percent: Option<f64>,

    /// Execute the approved price actions against the marketplace
    #[arg(long, conflicts_with = "manual")]
    pub apply: bool,

    /// Plan and export a clickable worklist; never mutate
    #[arg(long)]
    pub manual: bool,

    /// Worklist destination for --manual
    #[arg(long, value_name = "PATH", default_value = "worklist.html")]
    pub worklist: PathBuf,

    /// Restrict price actions to these item ids (comma-separated; repeatable)
    #[arg(long = "only-ids", value_name = "IDS", value_delimiter = ',')]
    pub only_ids: Vec<String>,

    /// Restrict price actions to titles containing this text (case-insensitive)
    #[arg(long = "title-contains", value_name = "TEXT")]
    pub title_contains: Option<String>,

    /// Cap the number of price actions (applied after the other filters)
    #[arg(long, value_name = "N")]
    pub limit: Option<usize>,

    /// Print the machine-readable run report to stdout
    #[arg(long)]
    pub json: bool,
}

// ── Run report (JSON surface) ───────────────────────────────────────

#[derive(Serialize)]
struct RunReport<'a> {
    version: &'static str,
    run_at: String,
    mode: Mode,
    profile: &'a str,
    ledger: String,
    scan_complete: bool,
    summary: RunSummary,
    plan: &'a MutationPlan,
    approved: &'a [relist_engine::model::PriceAction],
    results: &'a [ExecutionResult],
    skipped: &'a [RecordIssue],
}

#[derive(Serialize)]
struct RunSummary {
    observed: usize,
    tracked: usize,
    additions: usize,
    removals: usize,
    reactivations: usize,
    unchanged: usize,
    price_actions_planned: usize,
    approved: usize,
    filtered_out: usize,
    skipped_records: usize,
    executed: usize,
    succeeded: usize,
    failed: usize,
}

// ── Pipeline ────────────────────────────────────────────────────────

pub fn cmd_run(args: RunArgs) -> Result<(), CliError> {
    let settings = resolve_settings(&args)?;
    let ledger_path = args.ledger.clone().unwrap_or_else(|| settings.ledger.clone());

    if settings.profile.is_empty() {
        return Err(CliError::args(
            "no profile given (use --profile, RELIST_PROFILE, or relist.toml)",
        ));
    }

    let mode = if args.apply {
        Mode::Apply
    } else if args.manual {
        Mode::Manual
    } else {
        Mode::DryRun
    };

    // 1. Persisted state.
    let ledger_read = read_ledger(&ledger_path).map_err(CliError::ledger)?;

    // 2. Observation. Run-fatal on failure; without it there is nothing
    //    to reconcile against.
    let bridge = BridgeClient::new(&settings.bridge_url);
    let observation = bridge.fetch_listings(&settings.profile)?;

    // 3. Normalize and reconcile.
    let snapshot = normalize(observation.listings, ledger_read.rows);
    let now = Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();
    let mutation_plan = reconcile(
        &snapshot,
        &ReconcileOptions {
            default_percent: settings.default_percent,
            scan_complete: observation.scan_complete,
            now: now.clone(),
        },
    );

    for warning in &mutation_plan.warnings {
        eprintln!("warning: {}", warning);
    }

    let mut skipped: Vec<RecordIssue> = ledger_read.skipped;
    skipped.extend(snapshot.skipped.iter().cloned());
    for issue in &skipped {
        match &issue.item_id {
            Some(id) => eprintln!("warning: skipped record {}: {}", id, issue.detail),
            None => eprintln!("warning: skipped record: {}", issue.detail),
        }
    }

    // 4. Filter down to the approved actions.
    let filters = Filters {
        only_ids: if args.only_ids.is_empty() {
            None
        } else {
            Some(args.only_ids.iter().cloned().collect::<BTreeSet<_>>())
        },
        title_contains: args.title_contains.clone(),
        limit: args.limit,
    };
    let approved = plan(&mutation_plan, &filters, mode);

    // 5. Persist structural changes before any mutation.
    let mut rows = apply_plan(&snapshot, &mutation_plan, &now);
    write_and_verify(&ledger_path, &rows).map_err(CliError::ledger)?;

    // 6. Execute (apply mode only).
    let results = match mode {
        Mode::Apply => {
            let mut mutator = bridge;
            let opts = ExecutorOptions {
                pacing: Duration::from_millis(settings.pacing_ms),
                max_retries: settings.max_retries,
                backoff_base: Duration::from_millis(settings.backoff_ms),
            };
            let results = execute(&approved.actions, &mut mutator, &opts);
            if !results.is_empty() {
                apply_outcomes(&mut rows, &results, &now);
                write_and_verify(&ledger_path, &rows).map_err(CliError::ledger)?;
            }
            results
        }
        Mode::Manual => {
            write_worklist(&args.worklist, &approved.actions, &settings.profile, &now)?;
            eprintln!("wrote worklist: {}", args.worklist.display());
            Vec::new()
        }
        Mode::DryRun => Vec::new(),
    };

    for result in results.iter().filter(|r| !r.succeeded) {
        eprintln!(
            "warning: item {} not updated after {} attempt(s): {}",
            result.item_id,
            result.attempts,
            result.error.as_deref().unwrap_or("unknown error"),
        );
    }

    // 7. Report.
    let summary = RunSummary {
        observed: snapshot.observed.len(),
        tracked: rows.len(),
        additions: mutation_plan.additions.len(),
        removals: mutation_plan.removals.len(),
        reactivations: mutation_plan.reactivations.len(),
        unchanged: mutation_plan.unchanged,
        price_actions_planned: mutation_plan.price_actions.len(),
        approved: approved.actions.len(),
        filtered_out: approved.filtered_out,
        skipped_records: skipped.len(),
        executed: results.len(),
        succeeded: results.iter().filter(|r| r.succeeded).count(),
        failed: results.iter().filter(|r| !r.succeeded).count(),
    };

    print_summary(mode, &summary, &mutation_plan, &approved);

    if args.json {
        let report = RunReport {
            version: env!("CARGO_PKG_VERSION"),
            run_at: Utc::now().to_rfc3339(),
            mode,
            profile: &settings.profile,
            ledger: ledger_path.display().to_string(),
            scan_complete: observation.scan_complete,
            summary,
            plan: &mutation_plan,
            approved: &approved.actions,
            results: &results,
            skipped: &skipped,
        };
        let output = serde_json::to_string_pretty(&report)
            .map_err(|e| CliError::io(format!("cannot serialize run report: {}", e)))?;
        println!("{}", output);
    }

    // Per-item mutation failures are reported, not fatal: the run
    // itself completed and the ledger is consistent.
    Ok(())
}

fn resolve_settings(args: &RunArgs) -> Result<Settings, CliError> {
    let mut settings = config::load(args.config.as_deref())?;
    if let Some(url) = &args.bridge_url {
        settings.bridge_url = url.clone();
    }
    if let Some(profile) = &args.profile {
        settings.profile = profile.clone();
    }
    if let Some(percent) = args.percent {
        settings.default_percent = percent;
    }
    Ok(settings)
}

fn print_summary(mode: Mode, summary: &RunSummary, plan: &MutationPlan, approved: &ApprovedPlan) {
    eprintln!();
    eprintln!(
        "{}: {} observed, {} tracked",
        mode, summary.observed, summary.tracked,
    );
    eprintln!(
        "  +{} added, -{} removed, {} reactivated, {} unchanged",
        summary.additions, summary.removals, summary.reactivations, summary.unchanged,
    );
    if plan.removals_suppressed {
        eprintln!("  removals suppressed (incomplete scan)");
    }
    if summary.filtered_out > 0 {
        eprintln!(
            "  {} price action(s) approved ({} filtered out)",
            summary.approved, summary.filtered_out,
        );
    } else {
        eprintln!("  {} price action(s) approved", summary.approved);
    }
    for action in &approved.actions {
        eprintln!(
            "    {} {} {} -> {} ({:+}%){}",
            action.item_id,
            action.title,
            relist_engine::money::format_minor(action.current_minor),
            relist_engine::money::format_minor(action.target_minor),
            action.change_percent,
            if action.floored { " [floor]" } else { "" },
        );
    }
    if summary.executed > 0 {
        eprintln!(
            "  executed {}: {} ok, {} failed",
            summary.executed, summary.succeeded, summary.failed,
        );
    }
    if summary.skipped_records > 0 {
        eprintln!("  {} record(s) skipped as malformed", summary.skipped_records);
    }
}
