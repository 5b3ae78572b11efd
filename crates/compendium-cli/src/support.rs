use crate::config::Config;
use compendium_kernel::InsertionOperation;
use compendium_store::{BlockStore, VersionStore, read_operations_from_path};
use serde::Serialize;
use std::path::Path;
use std::process;

pub fn load_config_or_exit(path: &str) -> Config {
    Config::load(path).unwrap_or_else(|e| {
        eprintln!("error: {e}");
        process::exit(1);
    })
}

pub fn load_blocks_or_exit(path: &Path) -> BlockStore {
    if !path.exists() {
        eprintln!("error: block source not found: {}", path.display());
        process::exit(1);
    }
    BlockStore::load_jsonl(path).unwrap_or_else(|e| {
        eprintln!("error: failed to load {}: {e}", path.display());
        process::exit(1);
    })
}

pub fn load_batch_or_exit(path: &str) -> Vec<InsertionOperation> {
    read_operations_from_path(path).unwrap_or_else(|e| {
        eprintln!("error: failed to load batch {path}: {e}");
        process::exit(1);
    })
}

pub fn version_store_or_exit(dir: &Path) -> VersionStore {
    if dir.exists() && !dir.is_dir() {
        eprintln!("error: versions path is not a directory: {}", dir.display());
        process::exit(1);
    }
    VersionStore::new(dir)
}

pub fn print_json<T: Serialize>(payload: &T) {
    let rendered = serde_json::to_string_pretty(payload).unwrap_or_else(|e| {
        eprintln!("error: failed to render json output: {e}");
        process::exit(1);
    });
    println!("{rendered}");
}

pub fn yes_no(ok: bool) -> &'static str {
    if ok { "yes" } else { "no" }
}
