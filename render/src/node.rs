use std::fmt;

use folio::Key;

/// A node of the presentation tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Tag name, e.g. `section`, `h2`, `p`.
    pub kind: String,
    pub attributes: Attributes,
    pub children: Vec<Node>,
}

/// Everything attached to an element besides its children.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Attributes {
    pub class_name: Option<String>,
    /// Reconciliation key; never serialized.
    pub key: Option<Key>,
    /// Other attributes in insertion order.
    pub props: Vec<(String, String)>,
}

impl Attributes {
    pub fn new() -> Self {
        Attributes::default()
    }

    pub fn with_class(mut self, class_name: Option<String>) -> Self {
        self.class_name = class_name;
        self
    }

    pub fn with_key(mut self, key: Option<Key>) -> Self {
        self.key = key;
        self
    }

    pub fn with_prop(mut self, name: &str, value: impl Into<String>) -> Self {
        self.props.push((name.to_string(), value.into()));
        self
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.props
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }
}

impl Node {
    pub fn as_element(&self) -> Option<&Element> {
        match self {
            Node::Element(element) => Some(element),
            Node::Text(_) => None,
        }
    }

    pub fn kind(&self) -> Option<&str> {
        self.as_element().map(|e| e.kind.as_str())
    }

    pub fn key(&self) -> Option<&Key> {
        self.as_element().and_then(|e| e.attributes.key.as_ref())
    }

    pub fn children(&self) -> &[Node] {
        match self {
            Node::Element(element) => &element.children,
            Node::Text(_) => &[],
        }
    }

    /// All text below this node, concatenated.
    pub fn text_content(&self) -> String {
        let mut out = String::new();
        self.push_text(&mut out);
        out
    }

    fn push_text(&self, out: &mut String) {
        match self {
            Node::Text(text) => out.push_str(text),
            Node::Element(element) => {
                for child in &element.children {
                    child.push_text(out);
                }
            }
        }
    }
}

impl Element {
    /// `Some(n)` for `h1` through `h6`.
    pub fn heading_level(&self) -> Option<u8> {
        let digits = self.kind.strip_prefix('h')?;
        match digits.parse::<u8>() {
            Ok(n @ 1..=6) => Some(n),
            _ => None,
        }
    }
}

impl fmt::Display for Node {
    /// Indented outline: one line per node.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_outline(f, self, 0)
    }
}

fn write_outline(f: &mut fmt::Formatter<'_>, node: &Node, depth: usize) -> fmt::Result {
    let pad = "  ".repeat(depth);
    match node {
        Node::Text(text) => writeln!(f, "{}{:?}", pad, text),
        Node::Element(element) => {
            write!(f, "{}<{}", pad, element.kind)?;
            if let Some(class_name) = &element.attributes.class_name {
                write!(f, " .{}", class_name)?;
            }
            if let Some(key) = &element.attributes.key {
                write!(f, " #{}", key)?;
            }
            for (name, value) in &element.attributes.props {
                write!(f, " {}={:?}", name, value)?;
            }
            writeln!(f, ">")?;
            for child in &element.children {
                write_outline(f, child, depth + 1)?;
            }
            Ok(())
        }
    }
}
