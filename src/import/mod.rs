/// Phase 2: IMPORT — entry file AST to dependency graph.
///
/// Input:  the entry file's path, its already-parsed `FileAst`, and a
///         `FileReader` to resolve further `import:` paths against.
/// Output: a `CompilationUnit` (`DependencyGraph` + topologically sorted
///         file list). Always returned, even if every import fails — the
///         entry file alone is a valid single-file compilation unit.
///
/// Key guarantee: acyclic, depth-limited, file-count-limited, paths
/// normalised and canonicalised relative to the importing file.
///
/// Diagnostic code range: URD200–URD299

use std::collections::HashMap;

use crate::ast::{FileAst, FrontmatterValue};
use crate::diagnostics::DiagnosticCollector;
use crate::graph::{DependencyGraph, FileNode, MAX_FILE_COUNT, MAX_IMPORT_DEPTH};
use crate::parse;
use crate::span::{FilePath, Span};

/// Abstracts file reading so IMPORT can run against a real filesystem,
/// an in-memory fixture set, or a single-file stub with no import access.
pub trait FileReader {
    /// Read the contents of `path`, relative to the compilation root.
    /// Returns `None` if the file does not exist or cannot be read.
    fn read(&self, path: &str) -> Option<String>;
}

/// Reads files from the local filesystem. Used by the CLI and the
/// `compile()` convenience entry point.
pub struct OsFileReader;

impl FileReader for OsFileReader {
    fn read(&self, path: &str) -> Option<String> {
        std::fs::read_to_string(path).ok()
    }
}

/// Refuses every import. Used by `compile_source()` (single-file mode)
/// and by WASM embedders with no filesystem access of their own.
pub struct StubFileReader;

impl FileReader for StubFileReader {
    fn read(&self, _path: &str) -> Option<String> {
        None
    }
}

/// Three-color DFS marking for cycle detection.
#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    White,
    Gray,
    Black,
}

/// Resolve all imports starting from the entry file AST.
///
/// Discovers imported files recursively via `reader`, parses each via
/// PARSE, builds the dependency graph, detects cycles, and produces a
/// topologically sorted file list.
pub fn resolve_imports_with_reader(
    entry_ast: FileAst,
    entry_dir: &str,
    diagnostics: &mut DiagnosticCollector,
    reader: &dyn FileReader,
) -> crate::graph::CompilationUnit {
    let entry_path = normalize_path(entry_dir, &entry_ast.path);

    let mut graph = DependencyGraph::new();
    graph.entry_path = Some(entry_path.clone());

    let mut marks: HashMap<FilePath, Mark> = HashMap::new();
    let mut stack: Vec<FilePath> = Vec::new();

    discover(
        entry_path.clone(),
        entry_ast,
        0,
        &mut graph,
        &mut marks,
        &mut stack,
        diagnostics,
        reader,
    );

    let ordered_asts: Vec<FilePath> = graph
        .topological_order()
        .into_iter()
        .cloned()
        .collect();

    crate::graph::CompilationUnit { graph, ordered_asts }
}

/// Recursively discover, parse, and register one file and its imports.
#[allow(clippy::too_many_arguments)]
fn discover(
    path: FilePath,
    ast: FileAst,
    depth: usize,
    graph: &mut DependencyGraph,
    marks: &mut HashMap<FilePath, Mark>,
    stack: &mut Vec<FilePath>,
    diagnostics: &mut DiagnosticCollector,
    reader: &dyn FileReader,
) {
    marks.insert(path.clone(), Mark::Gray);
    stack.push(path.clone());

    let import_decls = collect_import_decls(&ast);
    let mut imports = Vec::with_capacity(import_decls.len());

    for (raw_path, span) in import_decls {
        let file_dir = dir_of(&path);
        let imported_path = normalize_path(&file_dir, &raw_path);
        imports.push(imported_path.clone());

        if graph.nodes.contains_key(&imported_path) {
            // Already discovered (shared dependency); check for a cycle only.
            check_cycle(&imported_path, marks, stack, diagnostics, &span);
            continue;
        }

        match marks.get(&imported_path) {
            Some(Mark::Gray) => {
                emit_cycle(stack, &imported_path, diagnostics, &span);
                continue;
            }
            Some(Mark::Black) => continue,
            _ => {}
        }

        if depth + 1 >= MAX_IMPORT_DEPTH {
            diagnostics.error(
                "URD204",
                format!(
                    "Import chain exceeds the maximum depth of {} levels at '{}'.",
                    MAX_IMPORT_DEPTH, imported_path
                ),
                span.clone(),
            );
            continue;
        }

        if graph.nodes.len() + 1 >= MAX_FILE_COUNT {
            diagnostics.error(
                "URD205",
                format!(
                    "Compilation unit exceeds the maximum of {} files.",
                    MAX_FILE_COUNT
                ),
                span.clone(),
            );
            continue;
        }

        let source = match reader.read(&imported_path) {
            Some(s) => s,
            None => {
                diagnostics.error(
                    "URD201",
                    format!("Cannot find imported file '{}'.", imported_path),
                    span.clone(),
                );
                continue;
            }
        };

        let imported_ast = match parse::parse(&imported_path, &source, diagnostics) {
            Some(a) => a,
            None => continue,
        };

        discover(
            imported_path,
            imported_ast,
            depth + 1,
            graph,
            marks,
            stack,
            diagnostics,
            reader,
        );
    }

    graph.nodes.insert(
        path.clone(),
        FileNode {
            path: path.clone(),
            ast,
            imports,
        },
    );

    marks.insert(path.clone(), Mark::Black);
    stack.pop();
}

/// Collect `import:` declarations from a file's frontmatter, in source order.
fn collect_import_decls(ast: &FileAst) -> Vec<(String, Span)> {
    let mut out = Vec::new();
    if let Some(fm) = &ast.frontmatter {
        for entry in &fm.entries {
            if let FrontmatterValue::ImportDecl(decl) = &entry.value {
                out.push((decl.path.clone(), decl.span.clone()));
            }
        }
    }
    out
}

/// If `target` is currently on the DFS stack, it's a back edge: a cycle.
fn check_cycle(
    target: &FilePath,
    marks: &HashMap<FilePath, Mark>,
    stack: &[FilePath],
    diagnostics: &mut DiagnosticCollector,
    span: &Span,
) {
    if marks.get(target) == Some(&Mark::Gray) {
        emit_cycle(stack, target, diagnostics, span);
    }
}

fn emit_cycle(stack: &[FilePath], target: &FilePath, diagnostics: &mut DiagnosticCollector, span: &Span) {
    let start = stack.iter().position(|p| p == target).unwrap_or(0);
    let mut cycle: Vec<&str> = stack[start..].iter().map(|s| s.as_str()).collect();
    cycle.push(target.as_str());
    diagnostics.error(
        "URD200",
        format!("Import cycle detected: {}.", cycle.join(" -> ")),
        span.clone(),
    );
}

/// Directory component of a normalised path, including trailing slash.
fn dir_of(path: &str) -> String {
    match path.rfind('/') {
        Some(pos) => path[..pos + 1].to_string(),
        None => String::new(),
    }
}

/// Resolve `raw_path` relative to `base_dir`, normalise separators, and
/// collapse `.`/`..` segments.
fn normalize_path(base_dir: &str, raw_path: &str) -> FilePath {
    let raw_path = raw_path.replace('\\', "/");
    let joined = if raw_path.starts_with('/') {
        raw_path
    } else {
        format!("{}{}", base_dir.replace('\\', "/"), raw_path)
    };

    let mut segments: Vec<&str> = Vec::new();
    for seg in joined.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }
    segments.join("/")
}
