//! Shape checks for section props arriving as untyped JSON.
//!
//! Validation never stops at the first problem: every failing field is
//! collected into one [`ValidationError`]. Sections nest through
//! `validate_section` and `validate_section_sequence` calling each other, so
//! there is no depth limit beyond the call stack.

mod block;
pub mod error;
mod inline;
mod section;

pub use error::{Issue, IssueKind, Path, Segment, ValidationError, describe};

use serde_json::{Map, Value};

use crate::section::{Section, SectionComponentProps, SectionSequence, TopLevelConfiguration};

/// Entry point for all schema checks.
///
/// The default validator ignores fields it does not know. A strict
/// validator reports each of them as an issue.
#[derive(Debug, Clone, Copy, Default)]
pub struct Validator {
    strict: bool,
}

impl Validator {
    pub fn new() -> Self {
        Validator::default()
    }

    pub fn strict() -> Self {
        Validator { strict: true }
    }

    pub fn with_strict(strict: bool) -> Self {
        Validator { strict }
    }

    pub fn is_strict(&self) -> bool {
        self.strict
    }

    pub fn validate_section(&self, value: &Value) -> Result<Section, ValidationError> {
        self.run("section", |cx| cx.section(value, &Path::root()))
    }

    pub fn validate_section_sequence(
        &self,
        value: &Value,
    ) -> Result<SectionSequence, ValidationError> {
        self.run("section sequence", |cx| {
            cx.section_sequence(value, &Path::root())
        })
    }

    pub fn validate_top_level_configuration(
        &self,
        value: &Value,
    ) -> Result<TopLevelConfiguration, ValidationError> {
        self.run("configuration", |cx| {
            cx.top_level_configuration(value, &Path::root())
        })
    }

    /// Validate configuration and section content of one object in a
    /// single pass.
    pub fn validate_section_component_props(
        &self,
        value: &Value,
    ) -> Result<SectionComponentProps, ValidationError> {
        self.validate_section_component_props_with(value, &Map::new())
    }

    /// Like [`Validator::validate_section_component_props`], with
    /// configuration fields in `overrides` taking precedence over the ones
    /// in `value`. Overrides are checked against the same rules.
    pub fn validate_section_component_props_with(
        &self,
        value: &Value,
        overrides: &Map<String, Value>,
    ) -> Result<SectionComponentProps, ValidationError> {
        self.run("section props", |cx| {
            cx.component_props(value, overrides, &Path::root())
        })
    }

    fn run<T>(
        &self,
        what: &str,
        check: impl FnOnce(&mut Context) -> Option<T>,
    ) -> Result<T, ValidationError> {
        let mut cx = Context::new(self.strict);
        let checked = check(&mut cx);
        log::debug!(
            "validated {} ({} issue(s), strict = {})",
            what,
            cx.issues.len(),
            self.strict
        );
        match checked {
            Some(value) if cx.issues.is_empty() => Ok(value),
            _ => Err(ValidationError { issues: cx.issues }),
        }
    }
}

pub fn validate_section(value: &Value) -> Result<Section, ValidationError> {
    Validator::new().validate_section(value)
}

pub fn validate_section_sequence(value: &Value) -> Result<SectionSequence, ValidationError> {
    Validator::new().validate_section_sequence(value)
}

pub fn validate_top_level_configuration(
    value: &Value,
) -> Result<TopLevelConfiguration, ValidationError> {
    Validator::new().validate_top_level_configuration(value)
}

pub fn validate_section_component_props(
    value: &Value,
) -> Result<SectionComponentProps, ValidationError> {
    Validator::new().validate_section_component_props(value)
}

// ---------------------------------------------------------------------------
// Validation context
// ---------------------------------------------------------------------------

/// Issue accumulator threaded through every check.
///
/// Checks return `None` when the value at their path is unusable; the issue
/// explaining why has already been recorded. Callers evaluate all sibling
/// fields before combining results so no issue is skipped.
pub(crate) struct Context {
    strict: bool,
    issues: Vec<Issue>,
}

impl Context {
    fn new(strict: bool) -> Self {
        Context {
            strict,
            issues: Vec::new(),
        }
    }

    fn report(&mut self, path: &Path, kind: IssueKind) {
        self.issues.push(Issue {
            path: path.clone(),
            kind,
        });
    }

    fn mismatch(&mut self, path: &Path, expected: &str, found: &Value) {
        self.report(
            path,
            IssueKind::Mismatch {
                expected: expected.to_string(),
                found: describe(found),
            },
        );
    }

    fn missing(&mut self, path: &Path, expected: &str) {
        self.report(
            path,
            IssueKind::Missing {
                expected: expected.to_string(),
            },
        );
    }

    fn object<'v>(
        &mut self,
        value: &'v Value,
        path: &Path,
        expected: &str,
    ) -> Option<&'v Map<String, Value>> {
        match value {
            Value::Object(object) => Some(object),
            other => {
                self.mismatch(path, expected, other);
                None
            }
        }
    }

    /// Flag (strict) or skip (default) fields outside `known`.
    fn check_fields(&mut self, object: &Map<String, Value>, known: &[&str], path: &Path) {
        for name in object.keys() {
            if known.contains(&name.as_str()) {
                continue;
            }
            if self.strict {
                self.report(&path.field(name), IssueKind::Unknown);
            } else {
                log::trace!("ignoring unknown field `{}`", path.field(name));
            }
        }
    }

    fn sequence<T>(
        &mut self,
        value: &Value,
        path: &Path,
        expected: &str,
        mut item: impl FnMut(&mut Self, &Value, &Path) -> Option<T>,
    ) -> Option<Vec<T>> {
        let Value::Array(values) = value else {
            self.mismatch(path, expected, value);
            return None;
        };
        let mut items = Vec::with_capacity(values.len());
        let mut valid = true;
        for (i, value) in values.iter().enumerate() {
            match item(self, value, &path.index(i)) {
                Some(checked) => items.push(checked),
                None => valid = false,
            }
        }
        valid.then_some(items)
    }

    /// `Some(None)` when absent, `Some(Some(_))` when valid, `None` when
    /// present but invalid.
    fn optional<T>(
        &mut self,
        object: &Map<String, Value>,
        field: &str,
        path: &Path,
        check: impl FnOnce(&mut Self, &Value, &Path) -> Option<T>,
    ) -> Option<Option<T>> {
        match object.get(field) {
            None => Some(None),
            Some(value) => check(self, value, &path.field(field)).map(Some),
        }
    }

    fn required<T>(
        &mut self,
        object: &Map<String, Value>,
        field: &str,
        expected: &str,
        path: &Path,
        check: impl FnOnce(&mut Self, &Value, &Path) -> Option<T>,
    ) -> Option<T> {
        match object.get(field) {
            None => {
                self.missing(&path.field(field), expected);
                None
            }
            Some(value) => check(self, value, &path.field(field)),
        }
    }

    fn string(&mut self, value: &Value, path: &Path) -> Option<String> {
        match value {
            Value::String(s) => Some(s.clone()),
            other => {
                self.mismatch(path, "string", other);
                None
            }
        }
    }

    fn boolean(&mut self, value: &Value, path: &Path) -> Option<bool> {
        match value {
            Value::Bool(b) => Some(*b),
            other => {
                self.mismatch(path, "boolean", other);
                None
            }
        }
    }

    /// A whole number within `min..=max`. Integral floats such as `2.0` are
    /// accepted.
    fn integer(&mut self, value: &Value, path: &Path, min: u64, max: u64) -> Option<u64> {
        let Value::Number(number) = value else {
            self.mismatch(path, "number", value);
            return None;
        };
        let whole = number.as_u64().or_else(|| {
            number
                .as_f64()
                .filter(|n| n.fract() == 0.0 && *n >= 0.0 && *n <= u64::MAX as f64)
                .map(|n| n as u64)
        });
        match whole {
            Some(n) if (min..=max).contains(&n) => Some(n),
            _ => {
                let expected = if max == u64::MAX {
                    format!("integer >= {}", min)
                } else {
                    format!("integer in {}..={}", min, max)
                };
                self.mismatch(path, &expected, value);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::document::{Block, InlineNode};

    #[test]
    fn title_only_section_is_valid() {
        let section = validate_section(&json!({"title": [{"text": "Intro"}]})).unwrap();
        assert_eq!(section.title, vec![InlineNode::text("Intro")]);
        assert!(section.r#abstract.is_empty());
        assert!(section.blocks.is_empty());
        assert!(section.sections.is_empty());
    }

    #[test]
    fn empty_title_is_valid() {
        let section = validate_section(&json!({"title": []})).unwrap();
        assert!(section.title.is_empty());
    }

    #[test]
    fn non_sequence_title_fails() {
        for title in [json!("Intro"), json!(5), json!(null), json!({"text": "x"})] {
            let err = validate_section(&json!({ "title": title })).unwrap_err();
            assert_eq!(err.issues.len(), 1, "title = {}", title);
            assert_eq!(err.issues[0].path.to_string(), "title");
        }
    }

    #[test]
    fn missing_title_fails() {
        let err = validate_section(&json!({"blocks": []})).unwrap_err();
        assert_eq!(
            err.issues[0].kind,
            IssueKind::Missing {
                expected: "inline sequence".to_string()
            }
        );
    }

    #[test]
    fn non_object_section_fails() {
        let err = validate_section(&json!([1, 2])).unwrap_err();
        assert_eq!(err.issues.len(), 1);
        assert!(err.issues[0].path.is_root());
    }

    #[test]
    fn issues_are_aggregated_across_fields() {
        let value = json!({
            "title": "not a sequence",
            "abstract": 12,
            "blocks": [{"type": "paragraph"}, {"type": "nope"}],
            "sections": [{"title": [{"text": "ok"}]}, {"title": [7]}],
        });
        let err = validate_section(&value).unwrap_err();
        let paths: Vec<String> = err.issues.iter().map(|i| i.path.to_string()).collect();
        assert_eq!(
            paths,
            vec![
                "title",
                "abstract",
                "blocks[0].content",
                "blocks[1].type",
                "sections[1].title[0]",
            ]
        );
    }

    fn nested(depth: usize, leaf: Value) -> Value {
        let mut value = leaf;
        for level in (0..depth).rev() {
            value = json!({
                "title": [{"text": format!("level {}", level)}],
                "sections": [value],
            });
        }
        value
    }

    #[test]
    fn deep_nesting_validates() {
        let value = nested(64, json!({"title": [{"text": "leaf"}]}));
        let section = validate_section(&value).unwrap();
        assert_eq!(section.depth(), 65);
    }

    #[test]
    fn invalid_leaf_fails_at_any_depth() {
        for depth in [1, 5, 20] {
            let value = nested(depth, json!({"title": [{"type": "link"}]}));
            let err = validate_section(&value).unwrap_err();
            let expected_prefix = "sections[0].".repeat(depth);
            assert_eq!(err.issues.len(), 2, "depth {}", depth);
            assert!(
                err.issues
                    .iter()
                    .all(|issue| issue.path.to_string().starts_with(&expected_prefix))
            );
        }
    }

    #[test]
    fn section_sequence_checks_every_element() {
        let err = validate_section_sequence(&json!([
            {"title": []},
            {"title": 1},
            "oops",
        ]))
        .unwrap_err();
        let paths: Vec<String> = err.issues.iter().map(|i| i.path.to_string()).collect();
        assert_eq!(paths, vec!["[1].title", "[2]"]);
    }

    #[test]
    fn section_sequence_must_be_array() {
        let err = validate_section_sequence(&json!({"title": []})).unwrap_err();
        assert!(err.issues[0].path.is_root());
    }

    #[test]
    fn configuration_defaults_apply() {
        let config = validate_top_level_configuration(&json!({})).unwrap();
        assert_eq!(config, TopLevelConfiguration::default());
    }

    #[test]
    fn configuration_rejects_mismatched_types() {
        let err = validate_top_level_configuration(&json!({
            "level": "2",
            "as": 3,
            "className": false,
        }))
        .unwrap_err();
        assert_eq!(err.issues.len(), 3);
    }

    #[test]
    fn level_zero_is_rejected() {
        let err = validate_top_level_configuration(&json!({"level": 0})).unwrap_err();
        assert_eq!(err.issues_at("level").len(), 1);
        let err = validate_top_level_configuration(&json!({"level": 1.5})).unwrap_err();
        assert_eq!(err.issues_at("level").len(), 1);
    }

    #[test]
    fn integral_float_level_is_accepted() {
        let config = validate_top_level_configuration(&json!({"level": 3.0})).unwrap();
        assert_eq!(config.level, 3);
    }

    #[test]
    fn element_must_be_a_tag_name() {
        for bad in ["", "1h", "div class", "<main>"] {
            let err = validate_top_level_configuration(&json!({ "as": bad })).unwrap_err();
            assert_eq!(err.issues_at("as").len(), 1, "as = {:?}", bad);
        }
        let config = validate_top_level_configuration(&json!({"as": "article"})).unwrap();
        assert_eq!(config.element, "article");
    }

    #[test]
    fn component_props_merge_both_schemas() {
        let props = validate_section_component_props(&json!({
            "title": [{"text": "Intro"}],
            "className": "lead",
            "level": 3,
            "blocks": [{"type": "paragraph", "text": "Hello"}],
        }))
        .unwrap();
        assert_eq!(props.config.class_name.as_deref(), Some("lead"));
        assert_eq!(props.config.level, 3);
        assert_eq!(props.config.element, "section");
        assert_eq!(
            props.section.blocks,
            vec![Block::Paragraph {
                content: vec![InlineNode::text("Hello")]
            }]
        );
    }

    #[test]
    fn component_props_report_both_schemas_at_once() {
        let err = validate_section_component_props(&json!({
            "title": 1,
            "level": "deep",
        }))
        .unwrap_err();
        assert_eq!(err.issues.len(), 2);
    }

    #[test]
    fn overrides_take_precedence() {
        let mut overrides = Map::new();
        overrides.insert("as".to_string(), json!("main"));
        overrides.insert("level".to_string(), json!(1));
        let props = Validator::new()
            .validate_section_component_props_with(
                &json!({"title": [], "as": "aside", "level": 4}),
                &overrides,
            )
            .unwrap();
        assert_eq!(props.config.element, "main");
        assert_eq!(props.config.level, 1);
    }

    #[test]
    fn overrides_are_validated() {
        let mut overrides = Map::new();
        overrides.insert("level".to_string(), json!(0));
        let err = Validator::new()
            .validate_section_component_props_with(&json!({"title": []}), &overrides)
            .unwrap_err();
        assert_eq!(err.issues_at("level").len(), 1);
    }

    #[test]
    fn unknown_fields_pass_by_default() {
        let value = json!({"title": [], "id": "x", "sections": [{"title": [], "extra": 1}]});
        assert!(validate_section(&value).is_ok());
    }

    #[test]
    fn strict_mode_reports_unknown_fields() {
        let value = json!({"title": [], "id": "x", "sections": [{"title": [], "extra": 1}]});
        let err = Validator::strict().validate_section(&value).unwrap_err();
        let paths: Vec<String> = err.issues.iter().map(|i| i.path.to_string()).collect();
        assert_eq!(paths, vec!["id", "sections[0].extra"]);
        assert!(err.issues.iter().all(|i| i.kind == IssueKind::Unknown));
    }

    #[test]
    fn strict_component_props_accept_configuration_fields() {
        let value = json!({"title": [], "className": "c", "level": 2, "as": "div"});
        assert!(
            Validator::strict()
                .validate_section_component_props(&value)
                .is_ok()
        );
        let err = Validator::strict().validate_section(&value).unwrap_err();
        assert_eq!(err.issues.len(), 3);
    }

    #[test]
    fn null_optional_field_is_rejected() {
        let err = validate_section(&json!({"title": [], "abstract": null})).unwrap_err();
        assert_eq!(err.issues_at("abstract").len(), 1);
    }
}
