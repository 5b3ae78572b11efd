use crate::support::print_json;
use compendium_kernel::render_entries;
use compendium_store::{read_entries_from_path, write_rendered_entries_to_path};
use serde_json::json;
use std::process;

pub fn run(entries: String, out: Option<String>, json: bool) {
    let input = read_entries_from_path(&entries).unwrap_or_else(|e| {
        eprintln!("error: failed to load entries {entries}: {e}");
        process::exit(1);
    });
    let summary = render_entries(&input);

    if let Some(out) = &out {
        write_rendered_entries_to_path(out, &summary.entries).unwrap_or_else(|e| {
            eprintln!("error: failed to write {out}: {e}");
            process::exit(1);
        });
    }

    if json {
        print_json(&json!({
            "action": "render",
            "entriesPath": entries,
            "out": out,
            "entryCount": summary.entries.len(),
            "citationCount": summary.citations,
            "defectCount": summary.defects.len(),
            "entries": summary.entries,
            "defects": summary.defects,
        }));
        return;
    }

    println!("compendium render {entries}");
    println!();
    println!("  entries: {}", summary.entries.len());
    println!("  citations: {}", summary.citations);
    println!("  defects: {}", summary.defects.len());
    if let Some(out) = &out {
        println!("  written: {out}");
    }
    for defect in &summary.defects {
        println!("    entry {}: {:?}", defect.entry, defect.defect);
    }
}
