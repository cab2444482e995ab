use std::ops::Range;

use pulldown_cmark::{
    Alignment, CodeBlockKind, Event, HeadingLevel, Options, Parser as CmarkParser, Tag, TagEnd,
};

use crate::document::{Block, ColumnAlignment, InlineNode};
use crate::parser::error::ParseError;
use crate::section::{Section, SectionSequence};

type Events<'a> = [(Event<'a>, Range<usize>)];

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Parse Markdown source text into top-level sections plus warnings.
pub fn parse_sections(
    source: &str,
    file_id: usize,
) -> Result<(SectionSequence, Vec<ParseError>), Vec<ParseError>> {
    let options = Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TABLES;
    let parser = CmarkParser::new_ext(source, options);
    let events: Vec<(Event<'_>, Range<usize>)> = parser.into_offset_iter().collect();

    let mut state = ParseState::new(source, file_id);
    state.process_events(&events);
    state.finalize()
}

// ---------------------------------------------------------------------------
// Parse state
// ---------------------------------------------------------------------------

struct ParseState<'a> {
    source: &'a str,
    file_id: usize,
    /// Sections being built. Innermost = current scope.
    section_stack: Vec<SectionBuilder>,
    /// Completed top-level sections.
    top_sections: SectionSequence,
    /// Span of body content seen before any heading.
    stray: Option<Range<usize>>,
}

struct SectionBuilder {
    title: Vec<InlineNode>,
    level: u8,
    blocks: Vec<Block>,
    children: SectionSequence,
}

impl SectionBuilder {
    fn into_section(self) -> Section {
        Section {
            title: self.title,
            r#abstract: Vec::new(),
            blocks: self.blocks,
            sections: self.children,
        }
    }
}

impl<'a> ParseState<'a> {
    fn new(source: &'a str, file_id: usize) -> Self {
        ParseState {
            source,
            file_id,
            section_stack: Vec::new(),
            top_sections: Vec::new(),
            stray: None,
        }
    }

    fn process_events(&mut self, events: &Events<'_>) {
        let mut i = 0;

        while i < events.len() {
            let (ref ev, ref range) = events[i];

            if let Event::Start(Tag::Heading { level, .. }) = ev {
                let level = heading_level_to_u8(level);
                i += 1;
                let title = collect_inlines(events, &mut i, &|e| matches!(e, TagEnd::Heading(_)));

                self.close_sections_to_level(level);
                self.section_stack.push(SectionBuilder {
                    title,
                    level,
                    blocks: Vec::new(),
                    children: Vec::new(),
                });
                continue;
            }

            let start = range.start;
            if let Some(block) = collect_block(events, &mut i) {
                match self.section_stack.last_mut() {
                    Some(builder) => builder.blocks.push(block),
                    None => {
                        let end = events[i - 1].1.end.max(range.end);
                        self.stray = Some(match self.stray.take() {
                            Some(stray) => stray.start..end,
                            None => start..end,
                        });
                    }
                }
            }
        }
    }

    /// Close sections from the stack down to the given heading level.
    fn close_sections_to_level(&mut self, new_level: u8) {
        while self
            .section_stack
            .last()
            .is_some_and(|top| top.level >= new_level)
        {
            let Some(builder) = self.section_stack.pop() else {
                break;
            };
            self.attach(builder.into_section());
        }
    }

    fn attach(&mut self, section: Section) {
        match self.section_stack.last_mut() {
            Some(parent) => parent.children.push(section),
            None => self.top_sections.push(section),
        }
    }

    fn finalize(mut self) -> Result<(SectionSequence, Vec<ParseError>), Vec<ParseError>> {
        while let Some(builder) = self.section_stack.pop() {
            self.attach(builder.into_section());
        }

        if self.top_sections.is_empty() {
            return Err(vec![
                ParseError::error("document has no headings", 0..self.source.len(), self.file_id)
                    .with_note("each heading opens a section; content needs one to live in"),
            ]);
        }

        let warnings = self
            .stray
            .map(|span| {
                ParseError::warning(
                    "content before the first heading is not part of any section",
                    span,
                    self.file_id,
                )
                .with_note("move it under a heading to have it rendered")
            })
            .into_iter()
            .collect();

        Ok((self.top_sections, warnings))
    }
}

// ---------------------------------------------------------------------------
// Blocks
// ---------------------------------------------------------------------------

/// Collect the block starting at `events[*i]`, leaving `*i` just past it.
/// Returns `None` (after advancing) for events that do not start a block.
fn collect_block(events: &Events<'_>, i: &mut usize) -> Option<Block> {
    let (ref ev, _) = events[*i];

    match ev {
        Event::Start(Tag::Paragraph) => {
            *i += 1;
            let content = collect_inlines(events, i, &|e| matches!(e, TagEnd::Paragraph));
            Some(Block::Paragraph { content })
        }

        Event::Start(Tag::Heading { level, .. }) => {
            let level = heading_level_to_u8(level);
            *i += 1;
            let content = collect_inlines(events, i, &|e| matches!(e, TagEnd::Heading(_)));
            Some(Block::Heading { level, content })
        }

        Event::Start(Tag::CodeBlock(kind)) => {
            let language = match kind {
                CodeBlockKind::Fenced(lang) => {
                    let lang = lang.to_string();
                    if lang.is_empty() { None } else { Some(lang) }
                }
                CodeBlockKind::Indented => None,
            };
            *i += 1;
            let code = collect_text_until(events, i, |e| matches!(e, TagEnd::CodeBlock));
            Some(Block::CodeBlock { language, code })
        }

        Event::Start(Tag::Table(alignments)) => {
            let align = alignments
                .iter()
                .map(|a| match a {
                    Alignment::None => ColumnAlignment::None,
                    Alignment::Left => ColumnAlignment::Left,
                    Alignment::Center => ColumnAlignment::Center,
                    Alignment::Right => ColumnAlignment::Right,
                })
                .collect();
            *i += 1;
            let (headers, rows) = collect_table(events, i);
            Some(Block::Table {
                align,
                headers,
                rows,
            })
        }

        Event::Start(Tag::BlockQuote(_)) => {
            *i += 1;
            let blocks = collect_blocks_until(events, i, |e| matches!(e, TagEnd::BlockQuote(_)));
            Some(Block::Blockquote { blocks })
        }

        Event::Start(Tag::List(start)) => {
            let start = *start;
            *i += 1;
            Some(collect_list(events, i, start))
        }

        Event::Rule => {
            *i += 1;
            Some(Block::Rule)
        }

        // Tight list items carry their text without a paragraph wrapper.
        ev if is_inline_event(ev) => {
            let mut content = Vec::new();
            while *i < events.len() && is_inline_event(&events[*i].0) {
                if let Some(inline) = collect_inline(events, i) {
                    push_inline(&mut content, inline);
                }
            }
            Some(Block::Paragraph { content })
        }

        Event::Start(_) => {
            skip_element(events, i);
            None
        }

        _ => {
            *i += 1;
            None
        }
    }
}

fn collect_blocks_until(
    events: &Events<'_>,
    i: &mut usize,
    is_end: impl Fn(&TagEnd) -> bool,
) -> Vec<Block> {
    let mut blocks = Vec::new();
    while *i < events.len() {
        if let Event::End(tag_end) = &events[*i].0 {
            if is_end(tag_end) {
                *i += 1;
                break;
            }
        }
        if let Some(block) = collect_block(events, i) {
            blocks.push(block);
        }
    }
    blocks
}

fn collect_list(events: &Events<'_>, i: &mut usize, start: Option<u64>) -> Block {
    let mut items = Vec::new();

    while *i < events.len() {
        let (ref ev, _) = events[*i];
        match ev {
            Event::End(TagEnd::List(_)) => {
                *i += 1;
                break;
            }
            Event::Start(Tag::Item) => {
                *i += 1;
                items.push(collect_blocks_until(events, i, |e| matches!(e, TagEnd::Item)));
            }
            _ => {
                *i += 1;
            }
        }
    }

    Block::List {
        ordered: start.is_some(),
        start: start.unwrap_or(1),
        items,
    }
}

/// Collect table headers and rows.
fn collect_table(
    events: &Events<'_>,
    i: &mut usize,
) -> (Vec<Vec<InlineNode>>, Vec<Vec<Vec<InlineNode>>>) {
    let mut headers: Vec<Vec<InlineNode>> = Vec::new();
    let mut rows: Vec<Vec<Vec<InlineNode>>> = Vec::new();
    let mut in_head = false;
    let mut current_row: Vec<Vec<InlineNode>> = Vec::new();

    while *i < events.len() {
        let (ref ev, _) = events[*i];
        match ev {
            Event::End(TagEnd::Table) => {
                *i += 1;
                break;
            }
            Event::Start(Tag::TableHead) => {
                in_head = true;
                *i += 1;
            }
            Event::End(TagEnd::TableHead) => {
                in_head = false;
                headers = std::mem::take(&mut current_row);
                *i += 1;
            }
            Event::Start(Tag::TableRow) => {
                current_row = Vec::new();
                *i += 1;
            }
            Event::End(TagEnd::TableRow) => {
                if !in_head {
                    rows.push(std::mem::take(&mut current_row));
                }
                *i += 1;
            }
            Event::Start(Tag::TableCell) => {
                *i += 1;
                let cell = collect_inlines(events, i, &|e| matches!(e, TagEnd::TableCell));
                current_row.push(cell);
            }
            _ => {
                *i += 1;
            }
        }
    }

    (headers, rows)
}

/// Step over an element this loader has no block for (HTML blocks,
/// footnote definitions, ...), including everything nested in it.
fn skip_element(events: &Events<'_>, i: &mut usize) {
    let mut depth = 0usize;
    while *i < events.len() {
        match events[*i].0 {
            Event::Start(_) => depth += 1,
            Event::End(_) => depth = depth.saturating_sub(1),
            _ => {}
        }
        *i += 1;
        if depth == 0 {
            break;
        }
    }
}

// ---------------------------------------------------------------------------
// Inlines
// ---------------------------------------------------------------------------

fn is_inline_event(ev: &Event<'_>) -> bool {
    matches!(
        ev,
        Event::Text(_)
            | Event::Code(_)
            | Event::SoftBreak
            | Event::HardBreak
            | Event::Start(
                Tag::Strong
                    | Tag::Emphasis
                    | Tag::Strikethrough
                    | Tag::Link { .. }
                    | Tag::Image { .. }
            )
    )
}

/// Collect inline nodes until a matching End tag.
fn collect_inlines(
    events: &Events<'_>,
    i: &mut usize,
    is_end: &dyn Fn(&TagEnd) -> bool,
) -> Vec<InlineNode> {
    let mut inlines = Vec::new();

    while *i < events.len() {
        if let Event::End(tag_end) = &events[*i].0 {
            if is_end(tag_end) {
                *i += 1;
                break;
            }
        }
        if let Some(inline) = collect_inline(events, i) {
            push_inline(&mut inlines, inline);
        }
    }

    inlines
}

/// Collect the inline starting at `events[*i]`, always advancing.
fn collect_inline(events: &Events<'_>, i: &mut usize) -> Option<InlineNode> {
    let (ref ev, _) = events[*i];
    *i += 1;

    match ev {
        Event::Text(s) => Some(InlineNode::text(s.to_string())),
        Event::Code(s) => Some(InlineNode::CodeSpan {
            text: s.to_string(),
        }),
        Event::SoftBreak => Some(InlineNode::SoftBreak),
        Event::HardBreak => Some(InlineNode::HardBreak),
        Event::Start(Tag::Strong) => Some(InlineNode::Strong {
            content: collect_inlines(events, i, &|e| matches!(e, TagEnd::Strong)),
        }),
        Event::Start(Tag::Emphasis) => Some(InlineNode::Emphasis {
            content: collect_inlines(events, i, &|e| matches!(e, TagEnd::Emphasis)),
        }),
        Event::Start(Tag::Strikethrough) => Some(InlineNode::Strikethrough {
            content: collect_inlines(events, i, &|e| matches!(e, TagEnd::Strikethrough)),
        }),
        Event::Start(Tag::Link {
            dest_url, title, ..
        }) => Some(InlineNode::Link {
            href: dest_url.to_string(),
            title: non_empty(title),
            content: collect_inlines(events, i, &|e| matches!(e, TagEnd::Link)),
        }),
        Event::Start(Tag::Image {
            dest_url, title, ..
        }) => Some(InlineNode::Image {
            src: dest_url.to_string(),
            title: non_empty(title),
            alt: collect_inlines(events, i, &|e| matches!(e, TagEnd::Image)),
        }),
        _ => None,
    }
}

/// pulldown-cmark splits text around special characters; keep one run.
fn push_inline(inlines: &mut Vec<InlineNode>, inline: InlineNode) {
    if let (Some(InlineNode::Text { text: last }), InlineNode::Text { text }) =
        (inlines.last_mut(), &inline)
    {
        last.push_str(text);
        return;
    }
    inlines.push(inline);
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn heading_level_to_u8(level: &HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn non_empty(s: &str) -> Option<String> {
    if s.is_empty() { None } else { Some(s.to_string()) }
}

/// Collect all text content until a matching End tag.
fn collect_text_until(
    events: &Events<'_>,
    i: &mut usize,
    is_end: impl Fn(&TagEnd) -> bool,
) -> String {
    let mut text = String::new();
    while *i < events.len() {
        let (ref ev, _) = events[*i];
        match ev {
            Event::End(tag_end) if is_end(tag_end) => {
                *i += 1;
                break;
            }
            Event::Text(s) => {
                text.push_str(s);
                *i += 1;
            }
            _ => {
                *i += 1;
            }
        }
    }
    text
}
