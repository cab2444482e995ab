use std::fmt::{self, Write};

use serde::Serialize;

use crate::document::{Block, InlineNode, Inlines};

/// Heading depth used when neither the caller nor the props name one.
pub const DEFAULT_LEVEL: u32 = 2;
/// Container element used when neither the caller nor the props name one.
pub const DEFAULT_ELEMENT: &str = "section";

/// A recursively nestable document unit.
///
/// Optional sequences are normalized to empty vectors, so a section given
/// `"blocks": []` and one without `blocks` compare (and hash) equal.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Section {
    pub title: Vec<InlineNode>,
    /// Introductory prose rendered right after the heading.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub r#abstract: Vec<InlineNode>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub blocks: Vec<Block>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sections: SectionSequence,
}

pub type SectionSequence = Vec<Section>;

impl Section {
    pub fn titled(title: Vec<InlineNode>) -> Self {
        Section {
            title,
            ..Section::default()
        }
    }

    /// Number of levels below this section, counting itself as one.
    pub fn depth(&self) -> usize {
        1 + self.sections.iter().map(Section::depth).max().unwrap_or(0)
    }

    /// Write the section back out as Markdown with its heading at `level`.
    /// Untitled sections get no heading line.
    pub fn to_markdown(&self, level: u32) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail.
        let _ = self.write_markdown(&mut out, level);
        out
    }

    fn write_markdown<W: Write>(&self, out: &mut W, level: u32) -> fmt::Result {
        let mut parts = Vec::new();
        if !self.title.is_empty() {
            let hashes = "#".repeat(level.clamp(1, 6) as usize);
            parts.push(format!("{} {}\n", hashes, Inlines(&self.title)));
        }
        if !self.r#abstract.is_empty() {
            parts.push(format!("{}\n", Inlines(&self.r#abstract)));
        }
        parts.extend(self.blocks.iter().map(Block::to_string));
        parts.extend(
            self.sections
                .iter()
                .map(|child| child.to_markdown(level.saturating_add(1))),
        );
        for (i, part) in parts.iter().enumerate() {
            if i > 0 {
                out.write_char('\n')?;
            }
            out.write_str(part)?;
        }
        Ok(())
    }
}

/// Rendering-only settings that sit next to a section's content.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopLevelConfiguration {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class_name: Option<String>,
    pub level: u32,
    /// Element kind of the rendered container (`as` on the wire).
    #[serde(rename = "as")]
    pub element: String,
}

impl Default for TopLevelConfiguration {
    fn default() -> Self {
        TopLevelConfiguration {
            class_name: None,
            level: DEFAULT_LEVEL,
            element: DEFAULT_ELEMENT.to_string(),
        }
    }
}

/// The field-wise union of [`TopLevelConfiguration`] and [`Section`]:
/// everything a single render call needs.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SectionComponentProps {
    #[serde(flatten)]
    pub config: TopLevelConfiguration,
    #[serde(flatten)]
    pub section: Section,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn markdown_nests_heading_levels() {
        let section = Section {
            title: vec![InlineNode::text("Guide")],
            r#abstract: vec![InlineNode::text("Short.")],
            blocks: vec![Block::Rule],
            sections: vec![Section::titled(vec![InlineNode::text("Install")])],
        };
        assert_eq!(
            section.to_markdown(1),
            "# Guide\n\nShort.\n\n---\n\n## Install\n"
        );
    }

    #[test]
    fn markdown_reparses_to_the_same_sections() {
        let source = concat!(
            "# Guide\n",
            "\n",
            "Some *emphasis*, **strong** and `code`.\\\n",
            "A literal \\*star\\*, 1\\. not a list, [a link](/docs \"Docs\").\n",
            "\n",
            "- one\n",
            "  - nested\n",
            "- two\n",
            "\n",
            "  second paragraph\n",
            "\n",
            "3. three\n",
            "4. four\n",
            "\n",
            "> quoted\n",
            ">\n",
            "> - in quote\n",
            "\n",
            "| Left | Center | Right | Plain |\n",
            "|:--|:-:|--:|---|\n",
            "| a | b & c | ~~d~~ | ![img](/i.png) |\n",
            "\n",
            "```rust\n",
            "fn main() {}\n",
            "```\n",
            "\n",
            "---\n",
            "\n",
            "## Child\n",
            "\n",
            "Text.\n",
        );
        let parse = |text: &str| {
            crate::parser::Parser::new(text.to_string(), 0)
                .parse()
                .expect("parse failed")
                .sections
        };
        let first = parse(source);
        assert_eq!(first.len(), 1);
        let written = first[0].to_markdown(1);
        let second = parse(&written);
        assert_eq!(first, second, "rewritten markdown:\n{}", written);
    }

    #[test]
    fn markdown_skips_missing_title() {
        let section = Section {
            blocks: vec![Block::Rule],
            ..Section::default()
        };
        assert_eq!(section.to_markdown(2), "---\n");
    }

    #[test]
    fn configuration_defaults() {
        let config = TopLevelConfiguration::default();
        assert_eq!(config.level, 2);
        assert_eq!(config.element, "section");
        assert!(config.class_name.is_none());
    }

    #[test]
    fn depth_counts_deepest_branch() {
        let leaf = Section::titled(vec![InlineNode::text("leaf")]);
        let mid = Section {
            sections: vec![leaf],
            ..Section::titled(vec![InlineNode::text("mid")])
        };
        let root = Section {
            sections: vec![mid, Section::default()],
            ..Section::default()
        };
        assert_eq!(root.depth(), 3);
    }

    #[test]
    fn serialized_section_omits_empty_fields() {
        let section = Section::titled(vec![InlineNode::text("Intro")]);
        let value = serde_json::to_value(&section).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"title": [{"type": "text", "text": "Intro"}]})
        );
    }
}
