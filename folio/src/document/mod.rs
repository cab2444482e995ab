use std::fmt::{self, Write};

use serde::Serialize;

/// A block-level content unit inside a section body.
///
/// Serializes to the same tagged JSON shape the schema accepts, so a
/// normalized block can be fed back through validation or hashed into a key.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Block {
    Paragraph {
        content: Vec<InlineNode>,
    },
    Heading {
        level: u8,
        content: Vec<InlineNode>,
    },
    #[serde(rename = "code")]
    CodeBlock {
        #[serde(skip_serializing_if = "Option::is_none")]
        language: Option<String>,
        code: String,
    },
    Blockquote {
        blocks: Vec<Block>,
    },
    List {
        ordered: bool,
        start: u64,
        items: Vec<Vec<Block>>,
    },
    Table {
        #[serde(skip_serializing_if = "Vec::is_empty")]
        align: Vec<ColumnAlignment>,
        headers: Vec<Vec<InlineNode>>,
        rows: Vec<Vec<Vec<InlineNode>>>,
    },
    Rule,
}

/// Inline elements that appear within a line of text.
/// Inline types nest freely within one another.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum InlineNode {
    Text {
        text: String,
    },
    Strong {
        content: Vec<InlineNode>,
    },
    Emphasis {
        content: Vec<InlineNode>,
    },
    Strikethrough {
        content: Vec<InlineNode>,
    },
    #[serde(rename = "code")]
    CodeSpan {
        text: String,
    },
    Link {
        href: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        content: Vec<InlineNode>,
    },
    Image {
        src: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        alt: Vec<InlineNode>,
    },
    SoftBreak,
    HardBreak,
}

impl InlineNode {
    pub fn text(text: impl Into<String>) -> Self {
        InlineNode::Text { text: text.into() }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnAlignment {
    None,
    Left,
    Center,
    Right,
}

impl ColumnAlignment {
    pub fn as_str(&self) -> &'static str {
        match self {
            ColumnAlignment::None => "none",
            ColumnAlignment::Left => "left",
            ColumnAlignment::Center => "center",
            ColumnAlignment::Right => "right",
        }
    }
}

/// Concatenated text of an inline run with all markup dropped.
pub fn plain_text(inlines: &[InlineNode]) -> String {
    let mut out = String::new();
    push_plain_text(&mut out, inlines);
    out
}

fn push_plain_text(out: &mut String, inlines: &[InlineNode]) {
    for inline in inlines {
        match inline {
            InlineNode::Text { text } | InlineNode::CodeSpan { text } => out.push_str(text),
            InlineNode::Strong { content }
            | InlineNode::Emphasis { content }
            | InlineNode::Strikethrough { content }
            | InlineNode::Link { content, .. } => push_plain_text(out, content),
            InlineNode::Image { alt, .. } => push_plain_text(out, alt),
            InlineNode::SoftBreak | InlineNode::HardBreak => out.push(' '),
        }
    }
}

/// Writes an inline run back out as Markdown.
pub struct Inlines<'a>(pub &'a [InlineNode]);

impl fmt::Display for Inlines<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for inline in self.0 {
            write!(f, "{}", inline)?;
        }
        Ok(())
    }
}

impl fmt::Display for Block {
    /// Markdown for one block, every line newline-terminated.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Block::Paragraph { content } => writeln!(f, "{}", Inlines(content)),
            Block::Heading { level, content } => {
                let hashes = "#".repeat((*level).clamp(1, 6) as usize);
                writeln!(f, "{} {}", hashes, Inlines(content))
            }
            Block::CodeBlock { language, code } => {
                let fence = "`".repeat(longest_run(code, '`').max(2) + 1);
                writeln!(f, "{}{}", fence, language.as_deref().unwrap_or(""))?;
                f.write_str(code)?;
                if !code.is_empty() && !code.ends_with('\n') {
                    writeln!(f)?;
                }
                writeln!(f, "{}", fence)
            }
            Block::Blockquote { blocks } => {
                f.write_str(&prefix_lines(&join_blocks(blocks), "> ", "> "))
            }
            Block::List {
                ordered,
                start,
                items,
            } => {
                for (i, item) in items.iter().enumerate() {
                    let marker = if *ordered {
                        format!("{}. ", start.saturating_add(i as u64))
                    } else {
                        "- ".to_string()
                    };
                    let indent = " ".repeat(marker.len());
                    f.write_str(&prefix_lines(&join_blocks(item), &marker, &indent))?;
                }
                Ok(())
            }
            Block::Table {
                align,
                headers,
                rows,
            } => {
                write_row(f, headers)?;
                write!(f, "|")?;
                for col in 0..headers.len() {
                    let rule = match align.get(col) {
                        Some(ColumnAlignment::Left) => ":--",
                        Some(ColumnAlignment::Center) => ":-:",
                        Some(ColumnAlignment::Right) => "--:",
                        Some(ColumnAlignment::None) | None => "---",
                    };
                    write!(f, " {} |", rule)?;
                }
                writeln!(f)?;
                for row in rows {
                    write_row(f, row)?;
                }
                Ok(())
            }
            Block::Rule => writeln!(f, "---"),
        }
    }
}

fn write_row(f: &mut fmt::Formatter<'_>, cells: &[Vec<InlineNode>]) -> fmt::Result {
    write!(f, "|")?;
    for cell in cells {
        write!(f, " {} |", Inlines(cell))?;
    }
    writeln!(f)
}

/// Blocks separated by blank lines.
fn join_blocks(blocks: &[Block]) -> String {
    blocks
        .iter()
        .map(Block::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}

/// Prefix the first line with `first` and every later line with `rest`.
/// Blank lines only get the prefix's non-space part.
fn prefix_lines(text: &str, first: &str, rest: &str) -> String {
    let mut out = String::new();
    for (i, line) in text.lines().enumerate() {
        let prefix = if i == 0 { first } else { rest };
        if line.is_empty() {
            out.push_str(prefix.trim_end());
        } else {
            out.push_str(prefix);
            out.push_str(line);
        }
        out.push('\n');
    }
    if out.is_empty() {
        out.push_str(first.trim_end());
        out.push('\n');
    }
    out
}

fn longest_run(text: &str, c: char) -> usize {
    let mut longest = 0;
    let mut current = 0;
    for ch in text.chars() {
        if ch == c {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }
    longest
}

/// Characters that can open or close inline markup anywhere in a line.
const INLINE_SPECIALS: &[char] = &[
    '\\', '`', '*', '_', '[', ']', '<', '>', '!', '|', '~', '&', '#',
];

/// Backslash-escape `text` so it reads back as the same literal text.
fn write_escaped(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    // A run can land at the start of a line, where `-`, `+`, `=` and
    // `1.` / `1)` would open a block.
    let digits = text.chars().take_while(char::is_ascii_digit).count();
    for (i, c) in text.chars().enumerate() {
        let line_start = i == 0 && matches!(c, '-' | '+' | '=');
        let ordinal = i == digits && digits > 0 && matches!(c, '.' | ')');
        if INLINE_SPECIALS.contains(&c) || line_start || ordinal {
            f.write_char('\\')?;
        }
        f.write_char(c)?;
    }
    Ok(())
}

fn write_code_span(f: &mut fmt::Formatter<'_>, text: &str) -> fmt::Result {
    let fence = "`".repeat(longest_run(text, '`') + 1);
    let pad = text.starts_with('`')
        || text.ends_with('`')
        || (text.starts_with(' ') && text.ends_with(' ') && !text.trim().is_empty());
    let space = if pad { " " } else { "" };
    write!(f, "{fence}{space}{text}{space}{fence}")
}

/// `(dest "title")` part of a link or image.
fn write_destination(f: &mut fmt::Formatter<'_>, dest: &str, title: Option<&str>) -> fmt::Result {
    f.write_char('(')?;
    if dest.is_empty() || dest.contains([' ', '(', ')', '<', '>']) {
        write!(f, "<{}>", dest.replace('<', "\\<").replace('>', "\\>"))?;
    } else {
        f.write_str(dest)?;
    }
    if let Some(title) = title {
        write!(f, " \"{}\"", title.replace('\\', "\\\\").replace('"', "\\\""))?;
    }
    f.write_char(')')
}

impl fmt::Display for InlineNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InlineNode::Text { text } => write_escaped(f, text),
            InlineNode::Strong { content } => write!(f, "**{}**", Inlines(content)),
            InlineNode::Emphasis { content } => write!(f, "*{}*", Inlines(content)),
            InlineNode::Strikethrough { content } => write!(f, "~~{}~~", Inlines(content)),
            InlineNode::CodeSpan { text } => write_code_span(f, text),
            InlineNode::Link {
                href,
                title,
                content,
            } => {
                write!(f, "[{}]", Inlines(content))?;
                write_destination(f, href, title.as_deref())
            }
            InlineNode::Image { src, title, alt } => {
                write!(f, "![{}]", Inlines(alt))?;
                write_destination(f, src, title.as_deref())
            }
            InlineNode::SoftBreak => writeln!(f),
            InlineNode::HardBreak => writeln!(f, "\\"),
        }
    }
}
