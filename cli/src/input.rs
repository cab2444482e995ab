use std::path::Path;

use codespan_reporting::files::SimpleFiles;
use folio::document::plain_text;
use folio::parser::{ParseError, Parser};
use folio::{Key, Section, Validator};
use folio_render::{SectionRenderer, to_html};
use serde::Deserialize;
use serde_json::Value;

use crate::config::RenderSettings;
use crate::error::{CliError, offset_of};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Json,
    Markdown,
}

impl Format {
    /// `.md` and `.markdown` files are Markdown; everything else is JSON.
    pub fn from_path(path: &Path) -> Format {
        match path.extension().and_then(|e| e.to_str()) {
            Some("md" | "markdown") => Format::Markdown,
            _ => Format::Json,
        }
    }

    pub fn from_name(name: &str) -> Option<Format> {
        match name.to_ascii_lowercase().as_str() {
            "json" => Some(Format::Json),
            "md" | "markdown" => Some(Format::Markdown),
            _ => None,
        }
    }
}

/// Section props read from one input, not yet validated.
#[derive(Debug)]
pub struct Document {
    /// One entry per root section.
    pub roots: Vec<Value>,
    pub warnings: Vec<ParseError>,
}

/// Read `path` into `files` and parse it according to its extension.
pub fn load(path: &str, files: &mut SimpleFiles<String, String>) -> Result<Document, CliError> {
    let source = std::fs::read_to_string(path).map_err(|source| CliError::Io {
        path: path.to_string(),
        source,
    })?;
    let file_id = files.add(path.to_string(), source.clone());
    parse(&source, Format::from_path(Path::new(path)), file_id)
}

/// A JSON object is one root section and a JSON array holds several. A
/// Markdown source has one root per top-level heading.
pub fn parse(source: &str, format: Format, file_id: usize) -> Result<Document, CliError> {
    match format {
        Format::Json => {
            let value = read_json(source).map_err(|source_error| {
                let offset = offset_of(source, source_error.line(), source_error.column());
                CliError::Json {
                    file_id,
                    span: offset..offset,
                    source: source_error,
                }
            })?;
            let roots = match value {
                Value::Array(items) => items,
                other => vec![other],
            };
            Ok(Document {
                roots,
                warnings: Vec::new(),
            })
        }
        Format::Markdown => {
            let outline = Parser::new(source.to_string(), file_id)
                .parse()
                .map_err(CliError::Parse)?;
            let roots = outline
                .sections
                .iter()
                .map(serde_json::to_value)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|source| CliError::Json {
                    file_id,
                    span: 0..0,
                    source,
                })?;
            Ok(Document {
                roots,
                warnings: outline.warnings,
            })
        }
    }
}

/// Section nesting has no depth limit, so neither does the reader. Depth is
/// bounded by the stack of the thread doing the parsing.
fn read_json(source: &str) -> serde_json::Result<Value> {
    let mut deserializer = serde_json::Deserializer::from_str(source);
    deserializer.disable_recursion_limit();
    let value = Value::deserialize(&mut deserializer)?;
    deserializer.end()?;
    Ok(value)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Output {
    #[default]
    Html,
    /// Indented presentation node outline, keys included.
    Tree,
    /// The validated sections written back as Markdown.
    Markdown,
}

/// Validate and render every root.
pub fn render(
    document: &Document,
    settings: &RenderSettings,
    output: Output,
) -> Result<String, CliError> {
    let validator = Validator::with_strict(settings.strict);
    let overrides = settings.overrides();
    let mut out = String::new();
    for root in &document.roots {
        if output == Output::Markdown {
            let props = validator.validate_section_component_props_with(root, &overrides)?;
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(&props.section.to_markdown(props.config.level));
            continue;
        }
        let node = SectionRenderer::new()
            .with_validator(validator)
            .render_with_overrides(root, &overrides)?;
        match output {
            Output::Tree => out.push_str(&node.to_string()),
            _ => {
                out.push_str(&to_html(&node));
                out.push('\n');
            }
        }
    }
    Ok(out)
}

/// Validate every root without rendering. Stops at the first root with
/// issues; that root's issues are all reported.
pub fn check(document: &Document, settings: &RenderSettings) -> Result<usize, CliError> {
    let validator = Validator::with_strict(settings.strict);
    let overrides = settings.overrides();
    for root in &document.roots {
        validator.validate_section_component_props_with(root, &overrides)?;
    }
    Ok(document.roots.len())
}

/// Titles of every section as an indented outline with their keys.
pub fn outline(document: &Document) -> Result<String, CliError> {
    let validator = Validator::new();
    let mut out = String::new();
    for root in &document.roots {
        let section = validator.validate_section(root)?;
        write_outline(&mut out, &section, 1);
    }
    Ok(out)
}

fn write_outline(out: &mut String, section: &Section, depth: usize) {
    let title = plain_text(&section.title);
    let title = if title.is_empty() { "(untitled)" } else { title.as_str() };
    out.push_str(&format!(
        "{}{} {} [{}]\n",
        "  ".repeat(depth - 1),
        "#".repeat(depth),
        title,
        Key::derive(section)
    ));
    for child in &section.sections {
        write_outline(out, child, depth + 1);
    }
}
