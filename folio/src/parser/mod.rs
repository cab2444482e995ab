pub mod error;
mod structural;

pub use error::ParseError;

use crate::section::SectionSequence;

/// Sections loaded from one Markdown source.
#[derive(Debug, Clone)]
pub struct Outline {
    /// Top-level sections, one per heading of the shallowest level used.
    pub sections: SectionSequence,
    /// Non-fatal problems, e.g. content that sits before the first heading.
    pub warnings: Vec<ParseError>,
    /// The source file ID (for error reporting with codespan-reporting).
    pub source_id: usize,
}

/// Builds a section tree from Markdown headings and the content under them.
pub struct Parser {
    source: String,
    file_id: usize,
}

impl Parser {
    pub fn new(source: String, file_id: usize) -> Self {
        Parser { source, file_id }
    }

    pub fn parse(&self) -> Result<Outline, Vec<ParseError>> {
        let (sections, warnings) = structural::parse_sections(&self.source, self.file_id)?;
        log::debug!(
            "loaded {} top-level section(s) from markdown ({} warning(s))",
            sections.len(),
            warnings.len()
        );
        Ok(Outline {
            sections,
            warnings,
            source_id: self.file_id,
        })
    }
}
