use std::ops::Range;

use codespan_reporting::diagnostic::{Diagnostic, Label};
use folio::ValidationError;
use folio::parser::ParseError;

#[derive(Debug, thiserror::Error)]
pub enum CliError {
    #[error("cannot read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid JSON: {source}")]
    Json {
        file_id: usize,
        span: Range<usize>,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid config '{path}': {source}")]
    Config {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("{} markdown error(s)", .0.len())]
    Parse(Vec<ParseError>),

    #[error(transparent)]
    Validation(#[from] ValidationError),
}

impl CliError {
    pub fn to_diagnostics(&self) -> Vec<Diagnostic<usize>> {
        match self {
            CliError::Parse(errors) => errors.iter().map(ParseError::to_diagnostic).collect(),
            CliError::Validation(error) => error.to_diagnostics(),
            CliError::Json {
                file_id,
                span,
                source,
            } => vec![
                Diagnostic::error()
                    .with_message("invalid JSON")
                    .with_labels(vec![
                        Label::primary(*file_id, span.clone()).with_message(source.to_string()),
                    ]),
            ],
            CliError::Io { .. } | CliError::Config { .. } => {
                vec![Diagnostic::error().with_message(self.to_string())]
            }
        }
    }
}

/// Byte offset of a 1-based line and column, clamped to the source.
pub fn offset_of(source: &str, line: usize, column: usize) -> usize {
    let line_start: usize = source
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(str::len)
        .sum();
    (line_start + column.saturating_sub(1)).min(source.len())
}
