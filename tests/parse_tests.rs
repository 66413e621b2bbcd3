/// Tests for Phase 1: PARSE
///
/// Test categories from the PARSE phase brief:
/// - Every grammar rule exercised
/// - Canonical integration files parsed with zero errors
/// - Error recovery scenarios
/// - Span accuracy verification

use urd_compiler::ast::{ContentNode, FrontmatterValue};
use urd_compiler::diagnostics::DiagnosticCollector;
use urd_compiler::parse;

fn parse_ok(source: &str) -> urd_compiler::ast::FileAst {
    let mut diag = DiagnosticCollector::new();
    let ast = parse::parse(&"test.urd.md".to_string(), source, &mut diag)
        .expect("source should parse");
    assert!(!diag.all().iter().any(|d| d.severity == urd_compiler::diagnostics::Severity::Error));
    ast
}

#[test]
fn empty_frontmatter_parses() {
    let ast = parse_ok("---\n---\n");
    assert!(ast.frontmatter.is_some());
}

#[test]
fn world_block_parses() {
    let ast = parse_ok("---\nworld:\n  start: tavern\n---\n");
    let fm = ast.frontmatter.expect("frontmatter");
    assert!(fm.entries.iter().any(|e| matches!(e.value, FrontmatterValue::WorldBlock(_))));
}

#[test]
fn location_heading_and_prose_parse() {
    let ast = parse_ok("---\n---\n# The Tavern\n\nA dim room full of smoke.\n");
    let has_heading = ast
        .content
        .iter()
        .any(|n| matches!(n, ContentNode::LocationHeading(h) if h.display_name == "The Tavern"));
    assert!(has_heading);
}

#[test]
fn oversized_file_returns_none() {
    let mut diag = DiagnosticCollector::new();
    let huge = "a".repeat(2 * 1024 * 1024);
    let source = format!("---\n---\n{}\n", huge);
    let result = parse::parse(&"huge.urd.md".to_string(), &source, &mut diag);
    assert!(result.is_none());
    assert!(diag.all().iter().any(|d| d.code == "URD103"));
}

#[test]
fn unrecognised_syntax_produces_error_node_not_abort() {
    // The parser never aborts on bad content — it should still return Some.
    let mut diag = DiagnosticCollector::new();
    let source = "---\n---\n@@@not valid@@@\n";
    let result = parse::parse(&"bad.urd.md".to_string(), source, &mut diag);
    assert!(result.is_some());
}

// Placeholder test cases — to be expanded per the PARSE phase brief:
//
// Content parsing:
//   - Section labels
//   - Entity presence lists
//   - Entity speech
//   - Stage directions
//   - Choices (sticky and non-sticky, with targets)
//   - Conditions (property comparison, containment, exhaustion)
//   - Effects (set, move, reveal, destroy)
//   - Jumps (plain and exit-qualified)
//   - Exit declarations with conditions and blocked messages
//   - Rule blocks with select clauses
//   - Comments
//
// Error recovery:
//   - Unclosed frontmatter
//   - Tab characters
//   - Malformed conditions
//   - Malformed effects
//
// Span tracking:
//   - Verify spans are accurate for all node types
