use serde_json::{Map, Value};

use super::{Context, IssueKind, Path};
use crate::document::{Block, ColumnAlignment, InlineNode};

const BLOCK_TYPES: &str = "one of paragraph, heading, code, blockquote, list, table, rule";

impl Context {
    pub(crate) fn block_sequence(&mut self, value: &Value, path: &Path) -> Option<Vec<Block>> {
        self.sequence(value, path, "array of blocks", Self::block)
    }

    fn block(&mut self, value: &Value, path: &Path) -> Option<Block> {
        let object = self.object(value, path, "block object")?;
        let tag = match object.get("type") {
            Some(Value::String(tag)) => tag.as_str(),
            Some(other) => {
                self.mismatch(&path.field("type"), BLOCK_TYPES, other);
                return None;
            }
            None => {
                self.missing(&path.field("type"), BLOCK_TYPES);
                return None;
            }
        };

        match tag {
            "paragraph" => {
                self.check_fields(object, &["type", "content", "text"], path);
                let content = self.inline_body(object, path)?;
                Some(Block::Paragraph { content })
            }
            "heading" => {
                self.check_fields(object, &["type", "level", "content", "text"], path);
                let level = self.required(object, "level", "integer in 1..=6", path, |cx, v, p| {
                    cx.integer(v, p, 1, 6)
                });
                let content = self.inline_body(object, path);
                Some(Block::Heading {
                    level: level? as u8,
                    content: content?,
                })
            }
            "code" => {
                self.check_fields(object, &["type", "code", "language"], path);
                let code = self.required(object, "code", "string", path, Self::string);
                let language = self.optional(object, "language", path, Self::string);
                Some(Block::CodeBlock {
                    language: language?,
                    code: code?,
                })
            }
            "blockquote" => {
                self.check_fields(object, &["type", "blocks"], path);
                let blocks =
                    self.required(object, "blocks", "array of blocks", path, Self::block_sequence)?;
                Some(Block::Blockquote { blocks })
            }
            "list" => {
                self.check_fields(object, &["type", "items", "ordered", "start"], path);
                let items = self.required(
                    object,
                    "items",
                    "array of block arrays",
                    path,
                    |cx, v, p| cx.sequence(v, p, "array of block arrays", Self::block_sequence),
                );
                let ordered = self.optional(object, "ordered", path, Self::boolean);
                let start = self.optional(object, "start", path, |cx, v, p| {
                    cx.integer(v, p, 0, u64::MAX)
                });
                Some(Block::List {
                    ordered: ordered?.unwrap_or(false),
                    start: start?.unwrap_or(1),
                    items: items?,
                })
            }
            "table" => {
                self.check_fields(object, &["type", "headers", "rows", "align"], path);
                let headers = self.required(
                    object,
                    "headers",
                    "array of inline sequences",
                    path,
                    Self::inline_row,
                );
                let rows = self.required(object, "rows", "array of rows", path, |cx, v, p| {
                    cx.sequence(v, p, "array of rows", Self::inline_row)
                });
                let align = self.optional(object, "align", path, |cx, v, p| {
                    cx.sequence(v, p, "array of alignments", Self::alignment)
                });
                Some(Block::Table {
                    align: align?.unwrap_or_default(),
                    headers: headers?,
                    rows: rows?,
                })
            }
            "rule" => {
                self.check_fields(object, &["type"], path);
                Some(Block::Rule)
            }
            _ => {
                self.mismatch(
                    &path.field("type"),
                    BLOCK_TYPES,
                    &Value::String(tag.to_string()),
                );
                None
            }
        }
    }

    /// `content` as an inline sequence, or `text` as a plain-string
    /// shorthand. Exactly one of the two must be present.
    fn inline_body(&mut self, object: &Map<String, Value>, path: &Path) -> Option<Vec<InlineNode>> {
        match (object.get("content"), object.get("text")) {
            (Some(content), None) => self.inline_sequence(content, &path.field("content")),
            (None, Some(text)) => self
                .string(text, &path.field("text"))
                .map(|text| vec![InlineNode::Text { text }]),
            (Some(_), Some(text)) => {
                self.report(
                    &path.field("text"),
                    IssueKind::Mismatch {
                        expected: "no `text` alongside `content`".to_string(),
                        found: super::describe(text),
                    },
                );
                None
            }
            (None, None) => {
                self.missing(&path.field("content"), "inline sequence");
                None
            }
        }
    }

    fn inline_row(&mut self, value: &Value, path: &Path) -> Option<Vec<Vec<InlineNode>>> {
        self.sequence(value, path, "array of inline sequences", Self::inline_sequence)
    }

    fn alignment(&mut self, value: &Value, path: &Path) -> Option<ColumnAlignment> {
        match value.as_str() {
            Some("none") => Some(ColumnAlignment::None),
            Some("left") => Some(ColumnAlignment::Left),
            Some("center") => Some(ColumnAlignment::Center),
            Some("right") => Some(ColumnAlignment::Right),
            _ => {
                self.mismatch(path, "one of none, left, center, right", value);
                None
            }
        }
    }
}
