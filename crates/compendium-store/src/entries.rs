//! Entry files: JSONL of entries in, JSONL of rendered entries out.

use crate::jsonl::{JsonlError, read_records_from_path, write_records_to_path};
use compendium_kernel::{Entry, RenderedEntry};
use std::path::Path;

pub fn read_entries_from_path(path: impl AsRef<Path>) -> Result<Vec<Entry>, JsonlError> {
    read_records_from_path(path)
}

pub fn write_rendered_entries_to_path(
    path: impl AsRef<Path>,
    entries: &[RenderedEntry],
) -> Result<(), JsonlError> {
    write_records_to_path(path, entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jsonl::read_text_from_path;
    use crate::jsonl::tests::temp_path;
    use compendium_kernel::render_entries;
    use std::fs;

    #[test]
    fn renders_entry_file_to_jsonl() {
        let input = temp_path("entries-in", "jsonl");
        let output = temp_path("entries-out", "jsonl");
        fs::write(
            &input,
            concat!(
                r#"{"id":"1","category":"Food","text":"Ramen is cheap here.","citations":[{"atChar":5,"sources":[{"identifier":"42"}]}]}"#,
                "\n",
                r#"{"id":"2","category":"Food","text":"No sources."}"#,
                "\n"
            ),
        )
        .expect("fixture should write");

        let entries = read_entries_from_path(&input).expect("entries parse");
        let summary = render_entries(&entries);
        write_rendered_entries_to_path(&output, &summary.entries).expect("write output");

        let written = read_text_from_path(&output).expect("output readable");
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            r#"{"identifier":"1","category":"Food","text":"Ramen is cheap here.[1]","footnotes":{"1":["42"]}}"#
        );

        let _ = fs::remove_file(input);
        let _ = fs::remove_file(output);
    }
}
