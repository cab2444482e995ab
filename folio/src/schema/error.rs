use std::fmt;

use codespan_reporting::diagnostic::Diagnostic;
use serde_json::Value;

/// Location of a value inside the input, e.g. `sections[1].blocks[0].text`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Path {
    segments: Vec<Segment>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Field(String),
    Index(usize),
}

impl Path {
    pub fn root() -> Self {
        Path::default()
    }

    pub fn field(&self, name: &str) -> Path {
        let mut segments = self.segments.clone();
        segments.push(Segment::Field(name.to_string()));
        Path { segments }
    }

    pub fn index(&self, index: usize) -> Path {
        let mut segments = self.segments.clone();
        segments.push(Segment::Index(index));
        Path { segments }
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_root() {
            return write!(f, "(root)");
        }
        for (i, segment) in self.segments.iter().enumerate() {
            match segment {
                Segment::Field(name) if i == 0 => write!(f, "{}", name)?,
                Segment::Field(name) => write!(f, ".{}", name)?,
                Segment::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IssueKind {
    /// The value is present but has the wrong shape.
    Mismatch { expected: String, found: String },
    /// A required field is absent.
    Missing { expected: String },
    /// A field the schema does not know about (strict mode only).
    Unknown,
}

/// One field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub path: Path,
    pub kind: IssueKind,
}

impl Issue {
    pub fn message(&self) -> String {
        match &self.kind {
            IssueKind::Mismatch { expected, found } => {
                format!("expected {}, found {}", expected, found)
            }
            IssueKind::Missing { expected } => format!("expected {}, found missing", expected),
            IssueKind::Unknown => "unknown field".to_string(),
        }
    }

    pub fn to_diagnostic(&self) -> Diagnostic<usize> {
        Diagnostic::error()
            .with_message(self.message())
            .with_notes(vec![format!("at `{}`", self.path)])
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message())
    }
}

/// Every issue found in one validation pass.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid section props ({} issue(s)): {}", .issues.len(), join_issues(.issues))]
pub struct ValidationError {
    pub issues: Vec<Issue>,
}

impl ValidationError {
    pub fn to_diagnostics(&self) -> Vec<Diagnostic<usize>> {
        self.issues.iter().map(Issue::to_diagnostic).collect()
    }

    /// Issues whose path is exactly `path` (as displayed).
    pub fn issues_at(&self, path: &str) -> Vec<&Issue> {
        self.issues
            .iter()
            .filter(|issue| issue.path.to_string() == path)
            .collect()
    }
}

fn join_issues(issues: &[Issue]) -> String {
    issues
        .iter()
        .map(|issue| issue.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

const MAX_STRING_PREVIEW: usize = 32;

/// Short human description of a JSON value for issue messages.
pub fn describe(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => format!("boolean {}", b),
        Value::Number(n) => format!("number {}", n),
        Value::String(s) => {
            if s.chars().count() > MAX_STRING_PREVIEW {
                let head: String = s.chars().take(MAX_STRING_PREVIEW).collect();
                format!("string {:?}...", head)
            } else {
                format!("string {:?}", s)
            }
        }
        Value::Array(items) => format!("array of {}", items.len()),
        Value::Object(_) => "object".to_string(),
    }
}
