use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::config::RenderSettings;
use crate::error::CliError;
use crate::input::{self, Document, Format, Output};

const CASE_EXTENSION: &str = "test";

#[derive(Debug, Deserialize)]
pub struct TestCase {
    /// Human-readable test description.
    #[serde(default)]
    pub description: Option<String>,

    /// Body format: "json" (default) or "markdown".
    #[serde(default = "default_format")]
    pub format: String,

    /// Render settings, same keys as the `[render]` config table.
    #[serde(flatten)]
    pub render: RenderSettings,

    /// Expected HTML (trimmed comparison).
    #[serde(default)]
    pub expect_html: Option<String>,

    /// Substrings the HTML must contain.
    #[serde(default)]
    pub expect_contains: Vec<String>,

    /// The error's Display string must contain this substring.
    #[serde(default)]
    pub expect_error: Option<String>,

    /// Exact list of issue paths, in reporting order.
    #[serde(default)]
    pub expect_issues: Option<Vec<String>>,

    /// If true, loading the body is expected to fail.
    #[serde(default)]
    pub expect_parse_error: bool,

    /// Number of loader warnings expected, when set.
    #[serde(default)]
    pub expect_warnings: Option<usize>,
}

fn default_format() -> String {
    "json".to_string()
}

impl TestCase {
    fn expects_failure(&self) -> bool {
        self.expect_error.is_some() || self.expect_issues.is_some()
    }
}

/// Split a `.test` file into its TOML frontmatter and body.
fn parse_test_file(content: &str) -> Result<(TestCase, &str), String> {
    let content = content.trim_start_matches('\u{feff}');

    let after_open = content
        .strip_prefix("---")
        .ok_or("missing opening --- frontmatter delimiter")?;
    let after_open = after_open
        .strip_prefix('\n')
        .or_else(|| after_open.strip_prefix("\r\n"))
        .unwrap_or(after_open);

    let (frontmatter, rest) = match after_open.strip_prefix("---") {
        Some(rest) => ("", rest),
        None => {
            let close_pos = after_open
                .find("\n---")
                .ok_or("missing closing --- frontmatter delimiter")?;
            (
                after_open[..close_pos].trim_end_matches('\r'),
                &after_open[close_pos + 4..],
            )
        }
    };
    let body = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))
        .unwrap_or(rest);

    let case: TestCase =
        toml::from_str(frontmatter).map_err(|e| format!("TOML parse error: {}", e))?;
    Ok((case, body))
}

pub enum TestOutcome {
    Pass,
    Fail(String),
}

pub struct TestResult {
    pub path: PathBuf,
    pub description: Option<String>,
    pub outcome: TestOutcome,
}

impl TestResult {
    fn label(&self) -> &str {
        self.description.as_deref().unwrap_or_else(|| {
            self.path
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("?")
        })
    }
}

fn run_single_test(path: &Path) -> TestResult {
    let (description, outcome) = match std::fs::read_to_string(path) {
        Ok(content) => match parse_test_file(&content) {
            Ok((case, body)) => (case.description.clone(), run_case(&case, body)),
            Err(e) => (None, TestOutcome::Fail(format!("frontmatter error: {}", e))),
        },
        Err(e) => (None, TestOutcome::Fail(format!("cannot read file: {}", e))),
    };
    TestResult {
        path: path.to_path_buf(),
        description,
        outcome,
    }
}

fn run_case(case: &TestCase, body: &str) -> TestOutcome {
    let Some(format) = Format::from_name(&case.format) else {
        return TestOutcome::Fail(format!("unknown format \"{}\"", case.format));
    };

    let loaded = input::parse(body, format, 0);
    if case.expect_parse_error {
        return match loaded {
            Err(CliError::Parse(_) | CliError::Json { .. }) => TestOutcome::Pass,
            Err(other) => TestOutcome::Fail(format!("expected parse error, got: {}", other)),
            Ok(_) => TestOutcome::Fail("expected parse error, but loading succeeded".into()),
        };
    }
    let document = match loaded {
        Ok(document) => document,
        Err(e) => return TestOutcome::Fail(format!("unexpected load error: {}", describe(&e))),
    };

    if let Some(reason) = check_warnings(case, &document) {
        return TestOutcome::Fail(reason);
    }

    match (case.expects_failure(), input::render(&document, &case.render, Output::Html)) {
        (true, Err(error)) => check_error(case, &error),
        (true, Ok(html)) => TestOutcome::Fail(format!(
            "expected an error, but rendering succeeded:\n  {}",
            html.trim()
        )),
        (false, Err(error)) => {
            TestOutcome::Fail(format!("unexpected error: {}", describe(&error)))
        }
        (false, Ok(html)) => check_html(case, &html),
    }
}

fn check_warnings(case: &TestCase, document: &Document) -> Option<String> {
    let expected = case.expect_warnings?;
    if document.warnings.len() == expected {
        return None;
    }
    let actual: Vec<String> = document
        .warnings
        .iter()
        .map(|w| format!("  - {}", w))
        .collect();
    Some(format!(
        "expected {} warning(s), got {}\n{}",
        expected,
        document.warnings.len(),
        actual.join("\n")
    ))
}

fn check_error(case: &TestCase, error: &CliError) -> TestOutcome {
    if let Some(expected) = &case.expect_error {
        let message = error.to_string();
        if !message.contains(expected.as_str()) {
            return TestOutcome::Fail(format!(
                "expected error containing \"{}\", got: {}",
                expected, message
            ));
        }
    }
    if let Some(expected) = &case.expect_issues {
        let CliError::Validation(validation) = error else {
            return TestOutcome::Fail(format!("expected validation issues, got: {}", error));
        };
        let actual: Vec<String> = validation
            .issues
            .iter()
            .map(|issue| issue.path.to_string())
            .collect();
        if &actual != expected {
            return TestOutcome::Fail(format!(
                "issue paths mismatch\n  expected: {:?}\n  actual:   {:?}",
                expected, actual
            ));
        }
    }
    TestOutcome::Pass
}

fn check_html(case: &TestCase, html: &str) -> TestOutcome {
    let actual = html.trim();
    if let Some(expected) = &case.expect_html {
        let expected = expected.trim();
        if actual != expected {
            return TestOutcome::Fail(format!(
                "output mismatch\n  expected: {}\n  actual:   {}",
                expected, actual
            ));
        }
    }
    for needle in &case.expect_contains {
        if !actual.contains(needle.as_str()) {
            return TestOutcome::Fail(format!(
                "expected output containing \"{}\"\n  actual: {}",
                needle, actual
            ));
        }
    }
    TestOutcome::Pass
}

/// Validation errors list every issue on its own line.
fn describe(error: &CliError) -> String {
    match error {
        CliError::Validation(validation) => validation
            .issues
            .iter()
            .map(|issue| issue.to_string())
            .collect::<Vec<_>>()
            .join("\n"),
        CliError::Parse(errors) => errors
            .iter()
            .map(|e| e.message.clone())
            .collect::<Vec<_>>()
            .join("; "),
        other => other.to_string(),
    }
}

/// Discover `.test` files grouped by category (subfolder relative to root).
/// Files directly in `root` get category "".
fn discover_categorized(root: &Path) -> BTreeMap<String, Vec<PathBuf>> {
    let mut categories: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    collect_tests(root, root, &mut categories);
    for files in categories.values_mut() {
        files.sort();
    }
    categories
}

fn collect_tests(dir: &Path, root: &Path, out: &mut BTreeMap<String, Vec<PathBuf>>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        log::warn!("cannot read directory {}", dir.display());
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_tests(&path, root, out);
        } else if path.extension().and_then(|e| e.to_str()) == Some(CASE_EXTENSION) {
            let category = path
                .parent()
                .and_then(|p| p.strip_prefix(root).ok())
                .map(|p| p.to_string_lossy().replace('\\', "/"))
                .unwrap_or_default();
            out.entry(category).or_default().push(path);
        }
    }
}

fn category_label(category: &str) -> &str {
    if category.is_empty() { "(root)" } else { category }
}

/// List available categories for the given test path.
pub fn list_categories(path: &Path) {
    if path.is_file() {
        eprintln!("(single file, no categories)");
        return;
    }

    let categories = discover_categorized(path);
    if categories.is_empty() {
        eprintln!("no .test files found in {}", path.display());
        return;
    }

    eprintln!("available categories:");
    for (category, files) in &categories {
        eprintln!("  {} ({} tests)", category_label(category), files.len());
    }
}

/// Keep the categories named in `requested`, including their subfolders.
fn select_categories<'a>(
    all: &'a BTreeMap<String, Vec<PathBuf>>,
    requested: &[String],
) -> BTreeMap<&'a str, &'a Vec<PathBuf>> {
    if requested.is_empty() {
        return all.iter().map(|(k, v)| (k.as_str(), v)).collect();
    }
    let mut selected = BTreeMap::new();
    for name in requested {
        let name = name.trim_matches('/');
        let prefix = format!("{}/", name);
        let before = selected.len();
        for (category, files) in all {
            if category == name || category.starts_with(&prefix) {
                selected.insert(category.as_str(), files);
            }
        }
        if selected.len() == before {
            eprintln!(
                "warning: category '{}' not found (available: {})",
                name,
                all.keys()
                    .map(|k| category_label(k))
                    .collect::<Vec<_>>()
                    .join(", ")
            );
        }
    }
    selected
}

struct Palette {
    color: bool,
}

impl Palette {
    fn paint(&self, text: &str, code: &str) -> String {
        if self.color {
            format!("\x1b[{}m{}\x1b[0m", code, text)
        } else {
            text.to_string()
        }
    }

    fn pass(&self) -> String {
        self.paint("PASS", "32")
    }

    fn fail(&self) -> String {
        self.paint("FAIL", "31")
    }

    fn bold(&self, text: &str) -> String {
        self.paint(text, "1")
    }
}

/// Run every `.test` file under `path` (or a single file). If `categories`
/// is non-empty, only those categories run. Returns the process exit code.
pub fn run_tests(path: &Path, no_color: bool, categories: &[String]) -> i32 {
    let palette = Palette { color: !no_color };

    let groups: Vec<(String, Vec<PathBuf>)> = if path.is_file() {
        vec![(String::new(), vec![path.to_path_buf()])]
    } else {
        let all = discover_categorized(path);
        if all.is_empty() {
            eprintln!("no .test files found in {}", path.display());
            return 1;
        }
        let selected = select_categories(&all, categories);
        if selected.is_empty() {
            eprintln!("no matching categories found");
            return 1;
        }
        selected
            .into_iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    };

    let single = path.is_file();
    let mut passed = 0usize;
    let mut failures: Vec<TestResult> = Vec::new();

    for (category, files) in &groups {
        if !single {
            eprintln!();
            eprintln!("{}", palette.bold(category_label(category)));
        }
        for file in files {
            let result = run_single_test(file);
            match result.outcome {
                TestOutcome::Pass => {
                    passed += 1;
                    eprintln!("  {}  {}", palette.pass(), result.label());
                }
                TestOutcome::Fail(_) => {
                    eprintln!("  {}  {}", palette.fail(), result.label());
                    failures.push(result);
                }
            }
        }
    }

    if !failures.is_empty() {
        eprintln!();
        eprintln!("failures:");
        for failure in &failures {
            eprintln!();
            eprintln!("  --- {} ---", failure.path.display());
            if let TestOutcome::Fail(reason) = &failure.outcome {
                for line in reason.lines() {
                    eprintln!("  {}", line);
                }
            }
        }
    }

    eprintln!();
    if failures.is_empty() {
        eprintln!("test result: {}. {} passed, 0 failed", palette.paint("ok", "32"), passed);
        0
    } else {
        let failed = failures.len();
        eprintln!(
            "test result: {}. {} passed, {} failed (of {})",
            palette.paint("FAILED", "31"),
            passed,
            failed,
            passed + failed
        );
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_case(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(&path, content).unwrap();
        path
    }

    fn outcome(content: &str) -> TestOutcome {
        let dir = tempfile::tempdir().unwrap();
        let path = write_case(dir.path(), "case.test", content);
        run_single_test(&path).outcome
    }

    fn assert_pass(content: &str) {
        if let TestOutcome::Fail(reason) = outcome(content) {
            panic!("expected pass, failed with: {}", reason);
        }
    }

    fn assert_fail(content: &str) {
        assert!(matches!(outcome(content), TestOutcome::Fail(_)));
    }

    #[test]
    fn splits_frontmatter_and_body() {
        let (case, body) =
            parse_test_file("---\ndescription = \"d\"\nmain = true\n---\n{\"title\": []}\n").unwrap();
        assert_eq!(case.description.as_deref(), Some("d"));
        assert!(case.render.main);
        assert_eq!(case.format, "json");
        assert_eq!(body, "{\"title\": []}\n");
    }

    #[test]
    fn missing_delimiters_are_reported() {
        assert!(parse_test_file("{}").is_err());
        assert!(parse_test_file("---\nmain = true\n").is_err());
    }

    #[test]
    fn html_expectation() {
        assert_pass(
            "---\nmain = true\nexpect_html = \"<main><h1>Hi</h1></main>\"\n---\n{\"title\": [\"Hi\"]}\n",
        );
        assert_fail("---\nexpect_html = \"<main></main>\"\n---\n{\"title\": [\"Hi\"]}\n");
    }

    #[test]
    fn contains_expectation() {
        assert_pass(
            "---\nclass_name = \"doc\"\nexpect_contains = [\"class=\\\"doc\\\"\", \"<h2>\"]\n---\n{\"title\": [\"Hi\"]}\n",
        );
    }

    #[test]
    fn issue_expectation() {
        assert_pass(
            "---\nexpect_issues = [\"level\", \"title\"]\n---\n{\"title\": 1, \"level\": 0}\n",
        );
        assert_fail("---\nexpect_issues = [\"title\"]\n---\n{\"title\": []}\n");
    }

    #[test]
    fn markdown_body_with_warnings() {
        assert_pass(
            "---\nformat = \"markdown\"\nexpect_warnings = 1\nexpect_contains = [\"<h2>A</h2>\"]\n---\nstray\n\n# A\n",
        );
    }

    #[test]
    fn parse_error_expectation() {
        assert_pass("---\nexpect_parse_error = true\n---\n{\"title\": [\n");
        assert_pass("---\nformat = \"markdown\"\nexpect_parse_error = true\n---\nno headings\n");
        assert_fail("---\nexpect_parse_error = true\n---\n{\"title\": []}\n");
    }

    #[test]
    fn unknown_format_fails() {
        assert_fail("---\nformat = \"yaml\"\n---\ntitle: x\n");
    }

    #[test]
    fn discovers_cases_by_category() {
        let dir = tempfile::tempdir().unwrap();
        let case = "---\n---\n{\"title\": []}\n";
        write_case(dir.path(), "top.test", case);
        write_case(dir.path(), "blocks/a.test", case);
        write_case(dir.path(), "blocks/lists/b.test", case);
        write_case(dir.path(), "blocks/notes.md", "ignored");

        let all = discover_categorized(dir.path());
        let names: Vec<&str> = all.keys().map(String::as_str).collect();
        assert_eq!(names, vec!["", "blocks", "blocks/lists"]);

        let selected = select_categories(&all, &["blocks".to_string()]);
        assert_eq!(selected.len(), 2);
        assert_eq!(run_tests(dir.path(), true, &[]), 0);
    }
}
