use crate::config::{DEFAULT_DIR, default_config_toml};
use crate::support::{print_json, yes_no};
use compendium_store::BlockStore;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct InitOutcome {
    pub root: PathBuf,
    pub compendium_dir: PathBuf,
    pub config_path: PathBuf,
    pub blocks_path: PathBuf,
    pub versions_dir: PathBuf,
    pub created_root: bool,
    pub created_config: bool,
    pub created_blocks_file: bool,
    pub created_versions_dir: bool,
}

fn ensure_dir(path: &Path, what: &str) -> Result<bool, String> {
    let mut created = false;
    if !path.exists() {
        fs::create_dir_all(path)
            .map_err(|e| format!("failed to create {what} {}: {e}", path.display()))?;
        created = true;
    }
    if !path.is_dir() {
        return Err(format!("{what} is not a directory: {}", path.display()));
    }
    Ok(created)
}

fn check_file_slot(path: &Path, what: &str) -> Result<(), String> {
    if path.exists() && !path.is_file() {
        return Err(format!(
            "{what} exists but is not a file: {}",
            path.display()
        ));
    }
    Ok(())
}

/// Create the `.compendium` layout under `path`; existing files are kept.
pub fn init_layout(path: impl AsRef<Path>) -> Result<InitOutcome, String> {
    let root = path.as_ref().to_path_buf();
    let created_root = ensure_dir(&root, "init path")?;

    let compendium_dir = root.join(DEFAULT_DIR);
    ensure_dir(&compendium_dir, "compendium directory")?;

    let config_path = compendium_dir.join("config.toml");
    check_file_slot(&config_path, "config path")?;
    let mut created_config = false;
    if !config_path.exists() {
        fs::write(&config_path, default_config_toml())
            .map_err(|e| format!("failed to write {}: {e}", config_path.display()))?;
        created_config = true;
    }

    let blocks_path = compendium_dir.join("blocks.jsonl");
    check_file_slot(&blocks_path, "blocks path")?;
    let mut created_blocks_file = false;
    if !blocks_path.exists() {
        BlockStore::default()
            .save_jsonl(&blocks_path)
            .map_err(|e| format!("failed to initialize {}: {e}", blocks_path.display()))?;
        created_blocks_file = true;
    }

    let versions_dir = compendium_dir.join("versions");
    let created_versions_dir = ensure_dir(&versions_dir, "versions directory")?;

    Ok(InitOutcome {
        root,
        compendium_dir,
        config_path,
        blocks_path,
        versions_dir,
        created_root,
        created_config,
        created_blocks_file,
        created_versions_dir,
    })
}

pub fn run(path: String, json: bool) {
    let outcome = init_layout(&path).unwrap_or_else(|e| {
        eprintln!("error: {e}");
        std::process::exit(1);
    });

    if json {
        print_json(&json!({
            "action": "init",
            "root": outcome.root.display().to_string(),
            "compendiumDir": outcome.compendium_dir.display().to_string(),
            "configPath": outcome.config_path.display().to_string(),
            "blocksPath": outcome.blocks_path.display().to_string(),
            "versionsDir": outcome.versions_dir.display().to_string(),
            "created": {
                "root": outcome.created_root,
                "config": outcome.created_config,
                "blocksFile": outcome.created_blocks_file,
                "versionsDir": outcome.created_versions_dir,
            },
        }));
        return;
    }

    println!("compendium init {path}");
    println!();
    println!("  root: {}", outcome.root.display());
    println!("  config: {}", outcome.config_path.display());
    println!("  blocks: {}", outcome.blocks_path.display());
    println!("  versions: {}", outcome.versions_dir.display());
    println!("  created root: {}", yes_no(outcome.created_root));
    println!("  created config: {}", yes_no(outcome.created_config));
    println!(
        "  created blocks file: {}",
        yes_no(outcome.created_blocks_file)
    );
    println!(
        "  created versions dir: {}",
        yes_no(outcome.created_versions_dir)
    );
}
