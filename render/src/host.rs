use crate::node::{Attributes, Element, Node};

/// Materializes presentation nodes for the renderers.
///
/// The renderers decide structure and order; the builder decides what a
/// node is. [`NodeBuilder`] produces this crate's own [`Node`] tree.
pub trait TreeBuilder {
    type Node;

    fn element(&mut self, kind: &str, attributes: Attributes, children: Vec<Self::Node>)
    -> Self::Node;

    fn text(&mut self, content: &str) -> Self::Node;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NodeBuilder;

impl TreeBuilder for NodeBuilder {
    type Node = Node;

    fn element(&mut self, kind: &str, attributes: Attributes, children: Vec<Node>) -> Node {
        Node::Element(Element {
            kind: kind.to_string(),
            attributes,
            children,
        })
    }

    fn text(&mut self, content: &str) -> Node {
        Node::Text(content.to_string())
    }
}
