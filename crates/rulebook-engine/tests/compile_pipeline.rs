//! End-to-end compile scenarios

use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rulebook_engine::compiler::errors::{ErrorKind, ParseError, RenderError};
use rulebook_engine::{
    compile, render_json, validate, CompileRequest, CompileStatus, EngineError, ManifestSource,
    OutputFormat, RuleSource,
};
use rulebook_types::DocumentMeta;

const MANIFEST: &str = "# Sections\n\
\n\
## 1. Eliminating Waterfalls (async)\n\
\n\
**Impact:** CRITICAL\n\
**Description:** Waterfalls are the top performance killer.\n\
**Rules:** async-parallel, async-defer\n\
\n\
## 2. Rendering (rendering)\n\
\n\
**Impact:** MEDIUM\n\
**Description:** Keep renders cheap.\n";

fn rule(path: &str, title: &str, impact: &str, body: &str) -> RuleSource {
    RuleSource::new(
        path,
        format!("---\ntitle: {}\nimpact: {}\n---\n\n{}", title, impact, body),
    )
}

fn valid_rules() -> Vec<RuleSource> {
    vec![
        rule(
            "rules/rendering-memo.md",
            "Memoize Expensive Components",
            "MEDIUM",
            "See [parallel](#promise-all-for-independent-operations).\n",
        ),
        rule(
            "rules/async-defer.md",
            "Defer Await Until Needed",
            "HIGH",
            "Move the await.\n",
        ),
        rule(
            "rules/async-parallel.md",
            "Promise.all() for Independent Operations",
            "CRITICAL",
            "**Incorrect:**\n\n```ts\nawait a(); await b();\n```\n\n**Correct:**\n\n```ts\nawait Promise.all([a(), b()]);\n```\n",
        ),
    ]
}

fn request(rules: Vec<RuleSource>, manifest: &str) -> CompileRequest {
    CompileRequest {
        rules,
        unreadable: Vec::new(),
        manifest: ManifestSource::new("rules/_sections.md", manifest),
        meta: DocumentMeta {
            title: "Performance Guide".to_string(),
            ..DocumentMeta::default()
        },
        format: OutputFormat::Markdown,
    }
}

fn codes(response: &rulebook_engine::CompileResponse) -> Vec<&str> {
    response.errors.iter().map(|d| d.code.as_str()).collect()
}

#[test]
fn test_valid_input_compiles() {
    let response = compile(&request(valid_rules(), MANIFEST)).unwrap();
    assert_eq!(response.status, CompileStatus::Success);
    assert!(response.errors.is_empty());
    assert!(response.warnings.is_empty());

    let doc = response.document.unwrap();
    let numbered: Vec<(&str, &str)> = doc
        .toc()
        .iter()
        .map(|e| (e.number.as_str(), e.label.as_str()))
        .collect();
    assert_eq!(
        numbered,
        vec![
            ("1", "Eliminating Waterfalls"),
            ("1.1", "Promise.all() for Independent Operations"),
            ("1.2", "Defer Await Until Needed"),
            ("2", "Rendering"),
            ("2.1", "Memoize Expensive Components"),
        ]
    );

    let output = response.output.unwrap();
    assert!(output.starts_with("# Performance Guide\n"));
    assert!(output.contains("### 1.1 Promise.all() for Independent Operations\n"));
    assert!(output.contains("<a id=\"memoize-expensive-components\"></a>"));
}

#[test]
fn test_duplicate_title_names_both_files() {
    let rules = vec![
        rule("rules/async-one.md", "Use X", "HIGH", "One.\n"),
        rule("rules/async-two.md", "Use X", "HIGH", "Two.\n"),
    ];
    let manifest = "## Async (async)\n\n**Impact:** HIGH\n";
    let response = compile(&request(rules, manifest)).unwrap();

    assert_eq!(response.status, CompileStatus::Error);
    assert_eq!(codes(&response), vec!["duplicate_rule_title"]);
    assert_eq!(
        response.errors[0].files,
        vec!["rules/async-one.md", "rules/async-two.md"]
    );
    assert!(response.output.is_none());
}

#[test]
fn test_unknown_impact_literal_is_reported() {
    let mut rules = valid_rules();
    rules.push(rule("rules/async-bad.md", "Bad", "SUPER-HIGH", "Body.\n"));
    let response = compile(&request(rules, MANIFEST)).unwrap();

    assert_eq!(response.status, CompileStatus::Error);
    assert_eq!(codes(&response), vec!["unknown_impact_level"]);
    assert!(response.errors[0].message.contains("SUPER-HIGH"));
    assert_eq!(response.errors[0].line, Some(3));
}

#[test]
fn test_colliding_titles_get_suffix_in_encounter_order() {
    let rules = vec![
        rule("rules/s-first.md", "A B", "LOW", "First.\n"),
        rule("rules/s-second.md", "A-B", "LOW", "Second.\n"),
    ];
    let manifest = "## Section (s)\n\n**Impact:** LOW\n**Rules:** s-first, s-second\n";
    let response = compile(&request(rules, manifest)).unwrap();
    assert!(response.is_success());

    let doc = response.document.unwrap();
    let anchors: Vec<&str> = doc.rules().map(|r| r.anchor.as_str()).collect();
    assert_eq!(anchors, vec!["a-b", "a-b-2"]);
}

#[test]
fn test_dangling_reference_aborts_without_output() {
    let manifest = MANIFEST.replace("async-defer", "async-missing, async-defer");
    let response = compile(&request(valid_rules(), &manifest)).unwrap();

    assert_eq!(response.status, CompileStatus::Error);
    assert_eq!(codes(&response), vec!["dangling_rule_reference"]);
    assert_eq!(response.errors[0].files, vec!["rules/_sections.md"]);
    assert!(response.output.is_none());
    assert!(response.document.is_none());
}

#[test]
fn test_broken_cross_reference_is_a_warning() {
    let mut rules = valid_rules();
    rules[1] = rule(
        "rules/async-defer.md",
        "Defer Await Until Needed",
        "HIGH",
        "Compare with [missing](#no-such-rule).\n",
    );
    let response = compile(&request(rules, MANIFEST)).unwrap();

    assert_eq!(response.status, CompileStatus::Success);
    assert!(response.output.is_some());
    assert_eq!(response.warnings.len(), 1);
    assert_eq!(response.warnings[0].code, "broken_cross_reference");
    assert_eq!(response.warnings[0].files, vec!["rules/async-defer.md"]);
}

#[test]
fn test_compile_is_idempotent() {
    let first = compile(&request(valid_rules(), MANIFEST)).unwrap();
    let second = compile(&request(valid_rules(), MANIFEST)).unwrap();
    assert_eq!(first.output, second.output);
}

#[test]
fn test_output_ignores_file_enumeration_order() {
    let mut reversed = valid_rules();
    reversed.reverse();
    let forward = compile(&request(valid_rules(), MANIFEST)).unwrap();
    let backward = compile(&request(reversed, MANIFEST)).unwrap();
    assert_eq!(forward.output, backward.output);
}

#[test]
fn test_independent_fatal_errors_are_all_reported() {
    let rules = vec![
        rule("rules/async-parallel.md", "Same", "HIGH", "a\n"),
        rule("rules/async-defer.md", "Same", "HIGH", "b\n"),
        rule("rules/stray.md", "Stray", "LOW", "c\n"),
        rule("rules/rendering-bad.md", "Bad", "EXTREME", "d\n"),
    ];
    let manifest = MANIFEST.replace("async-defer", "async-defer, async-ghost");
    let response = compile(&request(rules, &manifest)).unwrap();

    let mut found = codes(&response);
    found.sort();
    assert_eq!(
        found,
        vec![
            "dangling_rule_reference",
            "duplicate_rule_title",
            "unassigned_rule",
            "unknown_impact_level",
        ]
    );
}

#[test]
fn test_validate_reports_without_rendering() {
    let response = validate(&request(valid_rules(), MANIFEST));
    assert!(response.is_success());
    assert!(response.output.is_none());
    assert_eq!(response.document.map(|d| d.rule_count()), Some(3));
}

#[test]
fn test_manifest_errors_are_reported_alone() {
    let response = compile(&request(valid_rules(), "# nothing here\n")).unwrap();
    assert_eq!(codes(&response), vec!["empty_manifest"]);
}

#[test]
fn test_json_output_renders_to_same_markdown() {
    let mut json_request = request(valid_rules(), MANIFEST);
    json_request.format = OutputFormat::Json;
    let json = compile(&json_request).unwrap().output.unwrap();
    let markdown = compile(&request(valid_rules(), MANIFEST)).unwrap().output;

    assert_eq!(Some(render_json(&json, OutputFormat::Markdown).unwrap()), markdown);
}

#[test]
fn test_unknown_block_kind_is_unrenderable() {
    let mut json_request = request(valid_rules(), MANIFEST);
    json_request.format = OutputFormat::Json;
    let json = compile(&json_request).unwrap().output.unwrap();
    let tampered = json.replacen("\"kind\": \"prose\"", "\"kind\": \"diagram\"", 1);
    assert_ne!(tampered, json);

    let err = render_json(&tampered, OutputFormat::Markdown).unwrap_err();
    assert!(matches!(
        err,
        EngineError::Render(RenderError::UnrenderableBlock { .. })
    ));
}

#[test]
fn test_unreadable_file_is_reported_with_other_errors() {
    let mut rules = valid_rules();
    rules.push(rule("rules/async-bad.md", "Bad", "SUPER-HIGH", "Body.\n"));
    let manifest = MANIFEST.replace("async-defer", "async-defer, async-latin1");
    let mut req = request(rules, &manifest);
    req.unreadable
        .push(ParseError::new("rules/async-latin1.md", ErrorKind::InvalidEncoding));
    let response = compile(&req).unwrap();

    assert_eq!(response.status, CompileStatus::Error);
    assert_eq!(codes(&response), vec!["invalid_encoding", "unknown_impact_level"]);
    assert_eq!(response.errors[0].files, vec!["rules/async-latin1.md"]);
    assert!(response.output.is_none());
}

#[test]
fn test_mismatched_lead_heading_is_dropped_with_warning() {
    let mut rules = valid_rules();
    rules[1] = rule(
        "rules/async-defer.md",
        "Defer Await Until Needed",
        "HIGH",
        "## Defer Await.\n\n**Impact: HIGH**\n\nMove the await.\n",
    );
    let response = compile(&request(rules, MANIFEST)).unwrap();

    assert_eq!(response.status, CompileStatus::Success);
    let warnings: Vec<&str> = response.warnings.iter().map(|d| d.code.as_str()).collect();
    assert_eq!(warnings, vec!["lead_heading_mismatch"]);
    assert_eq!(response.warnings[0].files, vec!["rules/async-defer.md"]);

    let output = response.output.unwrap();
    assert!(!output.contains("## Defer Await.\n"));
    assert!(output.contains("Move the await.\n"));
}

#[test]
fn test_link_in_inline_code_is_not_checked() {
    let mut rules = valid_rules();
    rules[1] = rule(
        "rules/async-defer.md",
        "Defer Await Until Needed",
        "HIGH",
        "Write `[x](#target)` to link a rule.\n",
    );
    let response = compile(&request(rules, MANIFEST)).unwrap();
    assert!(response.warnings.is_empty());
}

fn body_line() -> impl Strategy<Value = String> {
    prop_oneof![
        Just(String::new()),
        Just("**Incorrect (slow):**".to_string()),
        Just("**Correct:**".to_string()),
        Just("```ts".to_string()),
        Just("```".to_string()),
        Just("Reference: [docs](https://example.com)".to_string()),
        "[a-z ]{1,30}",
        "    [a-z(){};]{1,20}",
    ]
}

proptest! {
    /// Rule bodies come out of the pipeline byte-for-byte
    #[test]
    fn body_survives_compile(lines in proptest::collection::vec(body_line(), 0..30), trailing in any::<bool>()) {
        let mut body = String::from("Intro.\n");
        body.push_str(&lines.join("\n"));
        if trailing {
            body.push('\n');
        }

        let rules = vec![RuleSource::new(
            "rules/s-only.md",
            format!("---\ntitle: Only\nimpact: LOW\n---\n{}", body),
        )];
        let manifest = "## Section (s)\n\n**Impact:** LOW\n";
        let response = compile(&request(rules, manifest)).unwrap();

        let doc = response.document.unwrap();
        let record = &doc.sections()[0].rules[0].record;
        prop_assert_eq!(record.body.to_text(), body.clone());
        prop_assert!(response.output.unwrap().contains(&body));
    }
}
