use crate::config::Config;
use crate::support::{
    load_batch_or_exit, load_blocks_or_exit, print_json, version_store_or_exit, yes_no,
};
use compendium_kernel::OperationOutcome;
use compendium_store::{CommitOptions, CommitOutcome, VersionStore};
use serde_json::json;

pub struct Args {
    pub batch: String,
    pub blocks: Option<String>,
    pub versions: Option<String>,
    pub dry_run: bool,
    pub json: bool,
}

pub fn run(config: &Config, args: Args) {
    let blocks_path = config.blocks_path(args.blocks.as_deref());
    let versions_dir = config.versions_dir(args.versions.as_deref());
    tracing::debug!(
        blocks = %blocks_path.display(),
        versions = %versions_dir.display(),
        "resolved store paths"
    );

    let source = load_blocks_or_exit(&blocks_path);
    let operations = load_batch_or_exit(&args.batch);
    let store = version_store_or_exit(&versions_dir);

    let options = CommitOptions {
        title: config.title().map(str::to_string),
        dry_run: args.dry_run,
    };
    let outcome = store
        .apply(&operations, &source, &options)
        .unwrap_or_else(|e| {
            eprintln!("error: {e}");
            std::process::exit(1);
        });

    if args.json {
        print_json(&payload(&store, &args, &outcome));
    } else {
        print_human(&store, &args, &outcome);
    }
}

fn payload(store: &VersionStore, args: &Args, outcome: &CommitOutcome) -> serde_json::Value {
    let report = &outcome.report;
    json!({
        "action": "apply",
        "batch": args.batch,
        "versionsDir": store.root().display().to_string(),
        "dryRun": args.dry_run,
        "baseVersion": outcome.base_version,
        "committed": outcome.record.is_some(),
        "version": outcome.record.as_ref().map(|r| r.version),
        "digest": outcome.record.as_ref().map(|r| r.digest.clone()),
        "requested": report.requested,
        "inserted": report.inserted,
        "skippedDuplicates": report.skipped_duplicates(),
        "skippedUnknown": report.skipped_unknown(),
        "fallbacks": report.fallbacks(),
        "rejected": report.rejected(),
        "outcomes": report.outcomes,
    })
}

fn print_human(store: &VersionStore, args: &Args, outcome: &CommitOutcome) {
    let report = &outcome.report;
    println!("compendium apply {}", args.batch);
    println!();
    println!("  versions: {}", store.root().display());
    match outcome.base_version {
        Some(version) => println!("  base version: {version}"),
        None => println!("  base version: (none)"),
    }
    println!("  inserted: {}/{}", report.inserted, report.requested);
    println!("  dry run: {}", yes_no(args.dry_run));
    match &outcome.record {
        Some(record) => println!("  committed: v{} ({})", record.version, record.digest),
        None => println!("  committed: no"),
    }

    if report.outcomes.is_empty() {
        return;
    }
    println!();
    println!("  Operations:");
    for row in &report.outcomes {
        let detail = match &row.outcome {
            OperationOutcome::Inserted { line, .. } => format!("line {line}"),
            OperationOutcome::FallbackApplied {
                line,
                missing_anchor,
                fallback,
                ..
            } => format!("line {line}, anchor #{missing_anchor} missing, {fallback:?}"),
            OperationOutcome::RejectedSection { reason }
            | OperationOutcome::RejectedIdentifier { reason } => reason.clone(),
            OperationOutcome::SkippedDuplicate | OperationOutcome::SkippedUnknown => String::new(),
        };
        if detail.is_empty() {
            println!(
                "    [{}] {} -> {}: {}",
                row.index,
                row.block_identifier,
                row.section_name,
                row.outcome.as_str()
            );
        } else {
            println!(
                "    [{}] {} -> {}: {} ({detail})",
                row.index,
                row.block_identifier,
                row.section_name,
                row.outcome.as_str()
            );
        }
    }
}
