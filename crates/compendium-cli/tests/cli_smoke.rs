use serde_json::Value;
use sha2::{Digest, Sha256};
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

struct TempDirGuard {
    path: PathBuf,
}

impl TempDirGuard {
    fn new(prefix: &str) -> Self {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock should be after unix epoch")
            .as_nanos();
        let path = std::env::temp_dir().join(format!(
            "compendium-cli-{prefix}-{}-{unique}",
            std::process::id()
        ));
        fs::create_dir_all(&path).expect("temp dir should be created");
        Self { path }
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for TempDirGuard {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

fn run_compendium<I, S>(cwd: &Path, args: I) -> Output
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let bin = env!("CARGO_BIN_EXE_compendium");
    Command::new(bin)
        .current_dir(cwd)
        .env_remove("RUST_LOG")
        .args(args)
        .output()
        .expect("compendium command should execute")
}

fn assert_success(output: &Output) {
    if !output.status.success() {
        panic!(
            "command failed with status {:?}\nstdout:\n{}\nstderr:\n{}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
    }
}

fn assert_failure(output: &Output) {
    if output.status.success() {
        panic!(
            "command unexpectedly succeeded\nstdout:\n{}\nstderr:\n{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
    }
}

fn stdout_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn stderr_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}

fn parse_json_stdout(output: &Output) -> Value {
    serde_json::from_slice::<Value>(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "expected valid JSON stdout, got error: {e}\nstdout:\n{}",
            String::from_utf8_lossy(&output.stdout)
        )
    })
}

/// Initialized workspace with three chat blocks and a titled config.
fn seeded_workspace(prefix: &str) -> TempDirGuard {
    let tmp = TempDirGuard::new(prefix);
    assert_success(&run_compendium(tmp.path(), ["init"]));

    let lines = [
        r#"{"id":"100","text":"Where should we eat tonight?","author":"ana","timestamp":"2024-05-01T18:02:00Z"}"#,
        r#"{"id":"101","text":"Ramen place by the station.","author":"bo","replyTo":"100"}"#,
        r#"{"id":"102","text":"Get a day pass.","author":"cy"}"#,
    ];
    fs::write(
        tmp.path().join(".compendium/blocks.jsonl"),
        format!("{}\n", lines.join("\n")),
    )
    .expect("blocks should be written");
    fs::write(
        tmp.path().join(".compendium/config.toml"),
        "versions_dir = \".compendium/versions\"\n\
         blocks_path = \".compendium/blocks.jsonl\"\n\
         title = \"Trip notes\"\n",
    )
    .expect("config should be written");
    tmp
}

fn write_batch(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, body).expect("batch should be written");
    path
}

const FIRST_BATCH: &str = r#"[
    {"blockIdentifier":"100","sectionName":"Food"},
    {"blockIdentifier":"101","sectionName":"Food","position":{"afterId":"100"}},
    {"blockIdentifier":"999","sectionName":"Food"},
    {"blockIdentifier":"102","sectionName":"Transport","position":{"beforeId":"nope"}}
]"#;

#[test]
fn init_text_smoke() {
    let tmp = TempDirGuard::new("init");
    let root = tmp.path().join("workspace");

    let output = run_compendium(tmp.path(), [OsStr::new("init"), root.as_os_str()]);
    assert_success(&output);

    let stdout = stdout_text(&output);
    assert!(stdout.contains("compendium init"));
    assert!(stdout.contains("created config: yes"));
    assert!(root.join(".compendium/config.toml").is_file());
    assert!(root.join(".compendium/blocks.jsonl").is_file());
    assert!(root.join(".compendium/versions").is_dir());
}

#[test]
fn init_json_smoke() {
    let tmp = TempDirGuard::new("init-json");
    let root = tmp.path().join("workspace");

    let output = run_compendium(
        tmp.path(),
        [OsStr::new("init"), root.as_os_str(), OsStr::new("--json")],
    );
    assert_success(&output);

    let payload = parse_json_stdout(&output);
    assert_eq!(payload["action"], "init");
    assert_eq!(
        payload["blocksPath"],
        serde_json::json!(root.join(".compendium").join("blocks.jsonl").display().to_string())
    );
    assert_eq!(payload["created"]["root"], true);
    assert_eq!(payload["created"]["blocksFile"], true);

    let again = run_compendium(
        tmp.path(),
        [OsStr::new("init"), root.as_os_str(), OsStr::new("--json")],
    );
    assert_success(&again);
    assert_eq!(parse_json_stdout(&again)["created"]["config"], false);
}

#[test]
fn apply_json_commits_first_version() {
    let tmp = seeded_workspace("apply");
    let batch = write_batch(tmp.path(), "batch.json", FIRST_BATCH);

    let output = run_compendium(
        tmp.path(),
        [
            OsStr::new("apply"),
            OsStr::new("--batch"),
            batch.as_os_str(),
            OsStr::new("--json"),
        ],
    );
    assert_success(&output);

    let payload = parse_json_stdout(&output);
    assert_eq!(payload["action"], "apply");
    assert_eq!(payload["committed"], true);
    assert_eq!(payload["baseVersion"], Value::Null);
    assert_eq!(payload["version"], 1);
    assert_eq!(payload["requested"], 4);
    assert_eq!(payload["inserted"], 3);
    assert_eq!(payload["skippedUnknown"], 1);
    assert_eq!(payload["fallbacks"], 1);
    assert_eq!(payload["outcomes"][2]["outcome"]["status"], "skipped_unknown");
    assert_eq!(payload["outcomes"][3]["outcome"]["status"], "fallback_applied");
    assert_eq!(payload["outcomes"][3]["outcome"]["fallback"], "prepend");

    let snapshot = tmp.path().join(".compendium/versions/document.v0001.md");
    let text = fs::read_to_string(&snapshot).expect("snapshot should exist");
    assert_eq!(
        text,
        concat!(
            "# Trip notes\n",
            "\n",
            "## Food\n",
            "\n",
            "2024-05-01 18:02 **ana**: Where should we eat tonight? [#100]\n",
            "> ↳ re #100, ana: \"Where should we eat tonight?\"\n",
            "**bo**: Ramen place by the station. [#101]\n",
            "\n",
            "## Transport\n",
            "\n",
            "**cy**: Get a day pass. [#102]\n",
        )
    );
    let digest = format!("{:x}", Sha256::digest(text.as_bytes()));
    assert_eq!(payload["digest"], serde_json::json!(digest));
    assert!(!tmp.path().join(".compendium/versions/.lock").exists());
}

#[test]
fn apply_text_lists_each_operation() {
    let tmp = seeded_workspace("apply-text");
    let batch = write_batch(tmp.path(), "batch.json", FIRST_BATCH);

    let output = run_compendium(
        tmp.path(),
        [OsStr::new("apply"), OsStr::new("--batch"), batch.as_os_str()],
    );
    assert_success(&output);

    let stdout = stdout_text(&output);
    assert!(stdout.contains("inserted: 3/4"));
    assert!(stdout.contains("committed: v1"));
    assert!(stdout.contains("[2] 999 -> Food: skipped_unknown"));
    assert!(stdout.contains("anchor #nope missing"));
}

#[test]
fn reapplying_a_batch_commits_nothing() {
    let tmp = seeded_workspace("reapply");
    let batch = write_batch(tmp.path(), "batch.json", FIRST_BATCH);
    let args = [
        OsStr::new("apply"),
        OsStr::new("--batch"),
        batch.as_os_str(),
        OsStr::new("--json"),
    ];
    assert_success(&run_compendium(tmp.path(), args));

    let output = run_compendium(tmp.path(), args);
    assert_success(&output);
    let payload = parse_json_stdout(&output);
    assert_eq!(payload["baseVersion"], 1);
    assert_eq!(payload["committed"], false);
    assert_eq!(payload["inserted"], 0);
    assert_eq!(payload["skippedDuplicates"], 3);
    assert!(
        !tmp.path()
            .join(".compendium/versions/document.v0002.md")
            .exists()
    );
}

#[test]
fn dry_run_reports_without_committing() {
    let tmp = seeded_workspace("dry-run");
    let batch = write_batch(tmp.path(), "batch.json", FIRST_BATCH);

    let output = run_compendium(
        tmp.path(),
        [
            OsStr::new("apply"),
            OsStr::new("--batch"),
            batch.as_os_str(),
            OsStr::new("--dry-run"),
            OsStr::new("--json"),
        ],
    );
    assert_success(&output);
    let payload = parse_json_stdout(&output);
    assert_eq!(payload["dryRun"], true);
    assert_eq!(payload["inserted"], 3);
    assert_eq!(payload["committed"], false);
    assert!(
        !tmp.path()
            .join(".compendium/versions/document.v0001.md")
            .exists()
    );
}

#[test]
fn second_batch_builds_on_latest_version() {
    let tmp = seeded_workspace("second");
    let first = write_batch(
        tmp.path(),
        "first.jsonl",
        "{\"blockIdentifier\":\"100\",\"sectionName\":\"Food\"}\n",
    );
    let second = write_batch(
        tmp.path(),
        "second.jsonl",
        "{\"blockIdentifier\":\"102\",\"sectionName\":\"Food\",\"position\":\"prepend\"}\n",
    );
    for batch in [&first, &second] {
        assert_success(&run_compendium(
            tmp.path(),
            [OsStr::new("apply"), OsStr::new("--batch"), batch.as_os_str()],
        ));
    }

    let output = run_compendium(tmp.path(), ["versions", "--json"]);
    assert_success(&output);
    let payload = parse_json_stdout(&output);
    assert_eq!(payload["action"], "versions");
    assert_eq!(payload["latest"], 2);
    assert_eq!(payload["count"], 2);
    assert_eq!(payload["versions"][0]["version"], 1);
    assert_eq!(payload["versions"][1]["file"], "document.v0002.md");
    assert_eq!(payload["versions"][1]["inserted"], 1);

    let v1 = fs::read_to_string(tmp.path().join(".compendium/versions/document.v0001.md"))
        .expect("v1 kept");
    assert!(!v1.contains("[#102]"));
    let v2 = fs::read_to_string(tmp.path().join(".compendium/versions/document.v0002.md"))
        .expect("v2 written");
    let prepended = v2.find("[#102]").expect("102 anchored");
    let appended = v2.find("[#100]").expect("100 anchored");
    assert!(prepended < appended);
}

#[test]
fn index_json_reads_latest_version() {
    let tmp = seeded_workspace("index");
    let batch = write_batch(tmp.path(), "batch.json", FIRST_BATCH);
    assert_success(&run_compendium(
        tmp.path(),
        [OsStr::new("apply"), OsStr::new("--batch"), batch.as_os_str()],
    ));

    let output = run_compendium(tmp.path(), ["index", "--json"]);
    assert_success(&output);
    let payload = parse_json_stdout(&output);
    assert_eq!(payload["version"], 1);
    assert_eq!(payload["sectionCount"], 2);
    assert_eq!(payload["anchorCount"], 3);
    assert_eq!(payload["sections"][0]["name"], "Food");
    assert_eq!(payload["sections"][0]["line"], 2);
    assert_eq!(payload["sections"][1]["name"], "Transport");
    assert_eq!(payload["anchors"]["100"], 4);
    assert_eq!(payload["anchors"]["101"], 6);
    assert_eq!(payload["anchors"]["102"], 10);
}

#[test]
fn index_rejects_corrupt_document() {
    let tmp = TempDirGuard::new("index-corrupt");
    let document = tmp.path().join("doc.md");
    fs::write(&document, "## Food\nx [#1]\n\n## Food\n").expect("document written");

    let output = run_compendium(
        tmp.path(),
        [OsStr::new("index"), OsStr::new("--document"), document.as_os_str()],
    );
    assert_failure(&output);
    assert!(stderr_text(&output).contains("error:"));
}

#[test]
fn index_without_versions_fails() {
    let tmp = TempDirGuard::new("index-empty");
    let output = run_compendium(tmp.path(), ["index"]);
    assert_failure(&output);
    assert!(stderr_text(&output).contains("no versions committed"));
}

#[test]
fn render_json_writes_entries_and_counts_defects() {
    let tmp = TempDirGuard::new("render");
    let entries = tmp.path().join("entries.jsonl");
    let out = tmp.path().join("rendered.jsonl");
    fs::write(
        &entries,
        concat!(
            r#"{"id":"1","category":"Food","text":"Ramen is cheap here.","citations":[{"atChar":4,"sources":[{"identifier":"1"}]},{"atChar":6,"sources":[{"identifier":"2"}]}]}"#,
            "\n",
            r#"{"id":"2","category":"Transport","text":"Trains.","citations":[{"atChar":99,"sources":[{"identifier":"3"}]},{"atChar":"x","sources":[{"identifier":"4"}]}]}"#,
            "\n",
        ),
    )
    .expect("entries written");

    let output = run_compendium(
        tmp.path(),
        [
            OsStr::new("render"),
            OsStr::new("--entries"),
            entries.as_os_str(),
            OsStr::new("--out"),
            out.as_os_str(),
            OsStr::new("--json"),
        ],
    );
    assert_success(&output);
    let payload = parse_json_stdout(&output);
    assert_eq!(payload["entryCount"], 2);
    assert_eq!(payload["citationCount"], 2);
    assert_eq!(payload["defectCount"], 2);
    assert_eq!(payload["entries"][0]["text"], "Ramen is cheap here.[1][2]");
    assert_eq!(payload["entries"][1]["text"], "Trains.");
    assert_eq!(payload["defects"][0]["defect"]["kind"], "offset_out_of_bounds");
    assert_eq!(payload["defects"][1]["defect"]["kind"], "malformed_offset");

    let written = fs::read_to_string(&out).expect("rendered output written");
    assert_eq!(written.lines().count(), 2);
}

#[test]
fn malformed_config_is_fatal() {
    let tmp = TempDirGuard::new("bad-config");
    let config = tmp.path().join("broken.toml");
    fs::write(&config, "versions_dir = [\n").expect("config written");

    let output = run_compendium(
        tmp.path(),
        [OsStr::new("--config"), config.as_os_str(), OsStr::new("versions")],
    );
    assert_failure(&output);
    assert!(stderr_text(&output).contains("failed to parse"));
}

#[test]
fn missing_batch_is_fatal_and_leaves_store_untouched() {
    let tmp = seeded_workspace("missing-batch");
    let output = run_compendium(tmp.path(), ["apply", "--batch", "nope.json"]);
    assert_failure(&output);
    assert!(stderr_text(&output).contains("error: failed to load batch"));
    let entries = fs::read_dir(tmp.path().join(".compendium/versions"))
        .expect("versions dir readable")
        .count();
    assert_eq!(entries, 0);
}
