use crate::config::Config;
use crate::support::{print_json, version_store_or_exit};
use serde_json::json;

/// Leading characters of a digest for the table view.
fn short_digest(digest: &str) -> String {
    digest.chars().take(12).collect()
}

pub fn run(config: &Config, versions: Option<String>, json: bool) {
    let dir = config.versions_dir(versions.as_deref());
    let store = version_store_or_exit(&dir);
    let manifest = store.manifest().unwrap_or_else(|e| {
        eprintln!("error: {e}");
        std::process::exit(1);
    });
    let on_disk = store.versions().unwrap_or_else(|e| {
        eprintln!("error: {e}");
        std::process::exit(1);
    });

    if json {
        print_json(&json!({
            "action": "versions",
            "versionsDir": dir.display().to_string(),
            "latest": on_disk.last(),
            "count": on_disk.len(),
            "versions": manifest,
        }));
        return;
    }

    println!("compendium versions {}", dir.display());
    println!();
    if manifest.is_empty() {
        println!("  (no versions)");
        return;
    }
    for record in &manifest {
        println!(
            "  v{:<4} {}  +{}/{}  {}  {}",
            record.version,
            record.created_at.format("%Y-%m-%d %H:%M:%S"),
            record.inserted,
            record.requested,
            short_digest(&record.digest),
            record.file
        );
    }
}
