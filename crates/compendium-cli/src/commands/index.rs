use crate::config::Config;
use crate::support::{print_json, version_store_or_exit};
use compendium_kernel::{Document, DocumentIndex};
use compendium_store::read_text_from_path;
use serde_json::json;
use std::process;

pub fn run(config: &Config, document: Option<String>, versions: Option<String>, json: bool) {
    let (label, version, text) = match document {
        Some(path) => {
            let text = read_text_from_path(&path).unwrap_or_else(|e| {
                eprintln!("error: failed to read {path}: {e}");
                process::exit(1);
            });
            (path, None, text)
        }
        None => {
            let dir = config.versions_dir(versions.as_deref());
            let store = version_store_or_exit(&dir);
            let latest = store.latest().unwrap_or_else(|e| {
                eprintln!("error: {e}");
                process::exit(1);
            });
            let Some(snapshot) = latest else {
                eprintln!("error: no versions committed in {}", dir.display());
                process::exit(1);
            };
            (
                snapshot.path.display().to_string(),
                Some(snapshot.version),
                snapshot.text,
            )
        }
    };

    let index = Document::parse(&text)
        .and_then(|doc| DocumentIndex::build(&doc))
        .unwrap_or_else(|e| {
            eprintln!("error: {label}: {e}");
            process::exit(1);
        });

    let sections: Vec<_> = index
        .sections()
        .into_iter()
        .map(|(name, line)| json!({ "name": name, "line": line }))
        .collect();

    if json {
        print_json(&json!({
            "action": "index",
            "document": label,
            "version": version,
            "sectionCount": index.section_count(),
            "anchorCount": index.anchor_count(),
            "sections": sections,
            "anchors": index.anchors(),
        }));
        return;
    }

    println!("compendium index {label}");
    println!();
    if let Some(version) = version {
        println!("  version: {version}");
    }
    println!("  sections: {}", index.section_count());
    println!("  anchors: {}", index.anchor_count());
    for (name, line) in index.sections() {
        println!("    {line:>5}  ## {name}");
    }
}
