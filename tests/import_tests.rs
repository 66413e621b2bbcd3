// Integration tests for Phase 2: IMPORT.
//
// Unit-level coverage (cycle detection, path normalisation) lives inline in
// `src/import/mod.rs`'s own test module. These tests exercise IMPORT through
// the public `compile_source_with_reader` entry point with an in-memory
// `FileReader`, which is closer to how the CLI and WASM embedders use it.

use std::collections::HashMap;

use urd_compiler::compile_source_with_reader;
use urd_compiler::import::FileReader;

/// An in-memory file set keyed by path, standing in for a real filesystem.
struct MapReader(HashMap<&'static str, &'static str>);

impl FileReader for MapReader {
    fn read(&self, path: &str) -> Option<String> {
        self.0.get(path).map(|s| s.to_string())
    }
}

#[test]
fn missing_import_is_recoverable_not_fatal_to_entry_parse() {
    let reader = MapReader(HashMap::new());
    let source = "---\nimport: world.urd.md\n---\n# Start\n\nYou arrive.\n";
    let result = compile_source_with_reader("main.urd.md", source, &reader);

    assert!(!result.success, "missing import should fail compilation");
    let has_import_error = result
        .diagnostics
        .all()
        .iter()
        .any(|d| d.code.starts_with("URD2"));
    assert!(has_import_error, "expected a URD2xx IMPORT diagnostic");
}

#[test]
fn two_file_import_merges_symbols() {
    let mut files = HashMap::new();
    files.insert(
        "world.urd.md",
        "---\ntypes:\n  Key [portable]:\n    name: string\n---\n",
    );
    let reader = MapReader(files);

    let main_source =
        "---\nimport: world.urd.md\nworld:\n  start: cell\n---\n# Cell\n\nA dim stone cell.\n";
    let result = compile_source_with_reader("main.urd.md", main_source, &reader);

    assert!(
        result.success,
        "two-file import should succeed. Diagnostics: {:?}",
        result.diagnostics.all().iter().map(|d| &d.code).collect::<Vec<_>>()
    );
    let json: serde_json::Value =
        serde_json::from_str(&result.world.expect("world JSON")).expect("valid JSON");
    assert!(
        json["types"].as_object().unwrap().contains_key("Key"),
        "Key type from the imported file should appear in the merged world"
    );
}

#[test]
fn single_file_mode_refuses_imports() {
    // compile_source() (no reader) routes through StubFileReader, so any
    // `import:` declaration must fail to resolve.
    let source = "---\nimport: anything.urd.md\n---\n";
    let result = urd_compiler::compile_source("test.urd.md", source);
    assert!(!result.success);
    assert!(result.diagnostics.all().iter().any(|d| d.code == "URD201"));
}
