/// Urd compiler CLI — compile, diff, and snapshot `.urd.md` files.
///
/// Diagnostics are printed to stderr as `FILE:LINE:COL: [URDxxx] message`.
/// Exit code 0 on success (or no changes for `diff`), 1 on errors (or changes
/// detected by diff), 2 on a malformed invocation.

use clap::{Parser, Subcommand, ValueEnum};
use tracing::{debug, info};

use urd_compiler::diff::{DiffError, DiffSnapshot};
use urd_compiler::import::OsFileReader;

#[derive(Parser)]
#[command(name = "urd", bin_name = "urd")]
#[command(about = "Compiler for Urd Schema Markdown (.urd.md -> .urd.json)")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// .urd.md file to compile (shorthand for omitting a subcommand)
    file: Option<String>,
}

#[derive(Subcommand)]
enum Command {
    /// Compare two compiled artifacts (.urd.md or .urd.snapshot.json)
    Diff {
        file_a: String,
        file_b: String,

        #[arg(long, value_enum, default_value_t = DiffFormat::Json)]
        format: DiffFormat,
    },
    /// Create a .urd.snapshot.json from a compiled file
    Snapshot {
        file: String,

        #[arg(short = 'o', long = "output")]
        output: Option<String>,
    },
}

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
enum DiffFormat {
    #[default]
    Json,
    Summary,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Some(Command::Diff { file_a, file_b, format }) => run_diff(&file_a, &file_b, format),
        Some(Command::Snapshot { file, output }) => run_snapshot(&file, output),
        None => match cli.file {
            Some(path) => run_compile(&path),
            None => {
                eprintln!("Usage: urd <file.urd.md> | urd diff <a> <b> | urd snapshot <file>");
                std::process::exit(2);
            }
        },
    }
}

// ── Compile (default command) ──

fn run_compile(path: &str) {
    info!(path, "compiling");
    let source = std::fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Cannot read '{}': {}", path, e);
        std::process::exit(1);
    });

    let result = urd_compiler::compile_source_with_reader(path, &source, &OsFileReader);
    debug!(diagnostic_count = result.diagnostics.len(), "compile finished");
    print_diagnostics(&result);

    if let Some(json) = result.world {
        println!("{}", json);
    } else {
        std::process::exit(1);
    }
}

// ── Diff command ──

fn run_diff(path_a: &str, path_b: &str, format: DiffFormat) {
    info!(path_a, path_b, "diffing");
    let snap_a = load_snapshot(path_a);
    let snap_b = load_snapshot(path_b);
    let report = urd_compiler::diff::diff(&snap_a, &snap_b);

    match format {
        DiffFormat::Summary => println!("{}", report.summary()),
        DiffFormat::Json => {
            let json = serde_json::to_string_pretty(&report.to_json()).unwrap();
            println!("{}", json);
        }
    }

    if report.changes.is_empty() {
        std::process::exit(0);
    } else {
        std::process::exit(1);
    }
}

// ── Snapshot command ──

fn run_snapshot(path: &str, output: Option<String>) {
    info!(path, "snapshotting");
    let output = output.unwrap_or_else(|| {
        let stem = path.strip_suffix(".urd.md").unwrap_or(path);
        format!("{}.urd.snapshot.json", stem)
    });

    let source = std::fs::read_to_string(path).unwrap_or_else(|e| {
        eprintln!("Cannot read '{}': {}", path, e);
        std::process::exit(1);
    });

    let result = urd_compiler::compile_source_with_reader(path, &source, &OsFileReader);
    print_diagnostics(&result);

    if result.diagnostics.has_errors() && result.fact_set.is_none() {
        eprintln!("Compilation failed; cannot create snapshot.");
        std::process::exit(1);
    }

    // Extract world name from compiled JSON.
    let world_name = result
        .world
        .as_deref()
        .and_then(|w| serde_json::from_str::<serde_json::Value>(w).ok())
        .and_then(|v| v.get("world")?.get("name")?.as_str().map(|s| s.to_string()))
        .unwrap_or_default();

    let snapshot = DiffSnapshot::from_compilation(&result);
    let json = serde_json::to_string_pretty(&snapshot.to_json(&world_name)).unwrap();

    std::fs::write(&output, format!("{}\n", json)).unwrap_or_else(|e| {
        eprintln!("Cannot write '{}': {}", output, e);
        std::process::exit(1);
    });

    eprintln!("Snapshot written to {}", output);
}

// ── Helpers ──

/// Load a DiffSnapshot from either a .urd.md source or a .urd.snapshot.json file.
fn load_snapshot(path: &str) -> DiffSnapshot {
    if path.ends_with(".urd.snapshot.json") {
        let content = std::fs::read_to_string(path).unwrap_or_else(|e| {
            eprintln!("Cannot read '{}': {}", path, e);
            std::process::exit(1);
        });
        match DiffSnapshot::from_json(&content) {
            Ok(snap) => snap,
            Err(DiffError::UnsupportedSnapshotVersion) => {
                eprintln!("Unsupported snapshot version in '{}'. Regenerate with current compiler.", path);
                std::process::exit(1);
            }
            Err(DiffError::ParseError(msg)) => {
                eprintln!("Failed to parse snapshot '{}': {}", path, msg);
                std::process::exit(1);
            }
        }
    } else {
        let source = std::fs::read_to_string(path).unwrap_or_else(|e| {
            eprintln!("Cannot read '{}': {}", path, e);
            std::process::exit(1);
        });
        let result = urd_compiler::compile_source_with_reader(path, &source, &OsFileReader);
        print_diagnostics(&result);
        DiffSnapshot::from_compilation(&result)
    }
}

fn print_diagnostics(result: &urd_compiler::CompilationResult) {
    for d in result.diagnostics.sorted() {
        eprintln!("{}: [{}] {}", d.span, d.code, d.message);
    }
}
