use folio::InlineNode;
use folio::document::plain_text;

use crate::host::TreeBuilder;
use crate::node::Attributes;

/// Render an inline run into a fragment (a list of sibling nodes).
pub fn render_inlines<B: TreeBuilder>(builder: &mut B, inlines: &[InlineNode]) -> Vec<B::Node> {
    inlines
        .iter()
        .map(|inline| render_inline(builder, inline))
        .collect()
}

fn render_inline<B: TreeBuilder>(builder: &mut B, inline: &InlineNode) -> B::Node {
    match inline {
        InlineNode::Text { text } => builder.text(text),
        InlineNode::Strong { content } => wrap(builder, "strong", content),
        InlineNode::Emphasis { content } => wrap(builder, "em", content),
        InlineNode::Strikethrough { content } => wrap(builder, "del", content),
        InlineNode::CodeSpan { text } => {
            let children = vec![builder.text(text)];
            builder.element("code", Attributes::new(), children)
        }
        InlineNode::Link {
            href,
            title,
            content,
        } => {
            let mut attributes = Attributes::new().with_prop("href", href.as_str());
            if let Some(title) = title.as_deref().filter(|t| !t.is_empty()) {
                attributes = attributes.with_prop("title", title);
            }
            let children = render_inlines(builder, content);
            builder.element("a", attributes, children)
        }
        InlineNode::Image { src, title, alt } => {
            let mut attributes = Attributes::new()
                .with_prop("src", src.as_str())
                .with_prop("alt", plain_text(alt));
            if let Some(title) = title.as_deref().filter(|t| !t.is_empty()) {
                attributes = attributes.with_prop("title", title);
            }
            builder.element("img", attributes, Vec::new())
        }
        InlineNode::SoftBreak => builder.text("\n"),
        InlineNode::HardBreak => builder.element("br", Attributes::new(), Vec::new()),
    }
}

fn wrap<B: TreeBuilder>(builder: &mut B, kind: &str, content: &[InlineNode]) -> B::Node {
    let children = render_inlines(builder, content);
    builder.element(kind, Attributes::new(), children)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::NodeBuilder;
    use crate::node::Node;

    #[test]
    fn marks_map_to_elements() {
        let inlines = vec![
            InlineNode::text("a"),
            InlineNode::Strong {
                content: vec![InlineNode::text("b")],
            },
            InlineNode::Strikethrough {
                content: vec![InlineNode::text("c")],
            },
            InlineNode::HardBreak,
        ];
        let nodes = render_inlines(&mut NodeBuilder, &inlines);
        let kinds: Vec<Option<&str>> = nodes.iter().map(Node::kind).collect();
        assert_eq!(kinds, vec![None, Some("strong"), Some("del"), Some("br")]);
    }

    #[test]
    fn image_alt_is_plain_text() {
        let nodes = render_inlines(
            &mut NodeBuilder,
            &[InlineNode::Image {
                src: "/cat.png".to_string(),
                title: None,
                alt: vec![InlineNode::Emphasis {
                    content: vec![InlineNode::text("a cat")],
                }],
            }],
        );
        let img = nodes[0].as_element().unwrap();
        assert_eq!(img.attributes.get("alt"), Some("a cat"));
        assert_eq!(img.attributes.get("title"), None);
        assert!(img.children.is_empty());
    }

    #[test]
    fn link_title_only_when_present() {
        let nodes = render_inlines(
            &mut NodeBuilder,
            &[InlineNode::Link {
                href: "/x".to_string(),
                title: Some("X".to_string()),
                content: vec![InlineNode::text("x")],
            }],
        );
        let a = nodes[0].as_element().unwrap();
        assert_eq!(a.attributes.get("href"), Some("/x"));
        assert_eq!(a.attributes.get("title"), Some("X"));
        assert_eq!(nodes[0].text_content(), "x");
    }
}
