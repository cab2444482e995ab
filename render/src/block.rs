use std::collections::HashSet;

use folio::{Block, ColumnAlignment, InlineNode, Key};

use crate::host::TreeBuilder;
use crate::inline::render_inlines;
use crate::node::Attributes;

/// Render a sequence of sibling blocks, each keyed by its content.
pub fn render_blocks<B: TreeBuilder>(builder: &mut B, blocks: &[Block]) -> Vec<B::Node> {
    let keys = sibling_keys(blocks.iter().map(Key::derive), "block");
    blocks
        .iter()
        .zip(keys)
        .map(|(block, key)| render_block(builder, block, Some(key)))
        .collect()
}

pub fn render_block<B: TreeBuilder>(builder: &mut B, block: &Block, key: Option<Key>) -> B::Node {
    let attributes = Attributes::new().with_key(key);

    match block {
        Block::Paragraph { content } => {
            let children = render_inlines(builder, content);
            builder.element("p", attributes, children)
        }
        Block::Heading { level, content } => {
            let children = render_inlines(builder, content);
            builder.element(&format!("h{}", (*level).clamp(1, 6)), attributes, children)
        }
        Block::CodeBlock { language, code } => {
            let class_name = language.as_ref().map(|lang| format!("language-{}", lang));
            let text = vec![builder.text(code)];
            let code = builder.element("code", Attributes::new().with_class(class_name), text);
            builder.element("pre", attributes, vec![code])
        }
        Block::Blockquote { blocks } => {
            let children = render_blocks(builder, blocks);
            builder.element("blockquote", attributes, children)
        }
        Block::List {
            ordered,
            start,
            items,
        } => {
            let (kind, attributes) = if *ordered {
                let attributes = if *start == 1 {
                    attributes
                } else {
                    attributes.with_prop("start", start.to_string())
                };
                ("ol", attributes)
            } else {
                ("ul", attributes)
            };
            let keys = sibling_keys(items.iter().map(Key::derive), "list item");
            let children = items
                .iter()
                .zip(keys)
                .map(|(item, key)| {
                    let blocks = render_blocks(builder, item);
                    builder.element("li", Attributes::new().with_key(Some(key)), blocks)
                })
                .collect();
            builder.element(kind, attributes, children)
        }
        Block::Table {
            align,
            headers,
            rows,
        } => {
            let header_cells = render_row(builder, "th", headers, align);
            let header_row = builder.element("tr", Attributes::new(), header_cells);
            let head = builder.element("thead", Attributes::new(), vec![header_row]);

            let body_rows = rows
                .iter()
                .map(|row| {
                    let cells = render_row(builder, "td", row, align);
                    builder.element("tr", Attributes::new(), cells)
                })
                .collect();
            let body = builder.element("tbody", Attributes::new(), body_rows);

            builder.element("table", attributes, vec![head, body])
        }
        Block::Rule => builder.element("hr", attributes, Vec::new()),
    }
}

fn render_row<B: TreeBuilder>(
    builder: &mut B,
    kind: &str,
    cells: &[Vec<InlineNode>],
    align: &[ColumnAlignment],
) -> Vec<B::Node> {
    cells
        .iter()
        .enumerate()
        .map(|(col, cell)| {
            let attributes = match align.get(col) {
                Some(ColumnAlignment::None) | None => Attributes::new(),
                Some(alignment) => Attributes::new().with_prop("align", alignment.as_str()),
            };
            let children = render_inlines(builder, cell);
            builder.element(kind, attributes, children)
        })
        .collect()
}

/// Pass keys through, logging any that repeat among siblings: a reconciler
/// would treat such children as the same node.
pub(crate) fn sibling_keys(keys: impl Iterator<Item = Key>, what: &str) -> Vec<Key> {
    let keys: Vec<Key> = keys.collect();
    let mut seen = HashSet::with_capacity(keys.len());
    for key in &keys {
        if !seen.insert(key) {
            log::warn!("duplicate {} key {} among siblings", what, key);
        }
    }
    keys
}
