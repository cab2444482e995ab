use std::fmt::{self, Write};

use crate::node::Node;

/// Elements that never have children or a closing tag.
const VOID_ELEMENTS: &[&str] = &["br", "hr", "img"];

/// Serialize a presentation tree as compact HTML.
///
/// Keys stay in the tree; they are not markup.
pub fn to_html(node: &Node) -> String {
    let mut out = String::new();
    // Writing into a String cannot fail.
    let _ = write_html(&mut out, node);
    out
}

pub fn write_html<W: Write>(out: &mut W, node: &Node) -> fmt::Result {
    match node {
        Node::Text(text) => write_escaped(out, text, false),
        Node::Element(element) => {
            write!(out, "<{}", element.kind)?;
            if let Some(class_name) = &element.attributes.class_name {
                write_attribute(out, "class", class_name)?;
            }
            for (name, value) in &element.attributes.props {
                write_attribute(out, name, value)?;
            }
            out.write_char('>')?;

            if VOID_ELEMENTS.contains(&element.kind.as_str()) {
                return Ok(());
            }
            for child in &element.children {
                write_html(out, child)?;
            }
            write!(out, "</{}>", element.kind)
        }
    }
}

fn write_attribute<W: Write>(out: &mut W, name: &str, value: &str) -> fmt::Result {
    write!(out, " {}=\"", name)?;
    write_escaped(out, value, true)?;
    out.write_char('"')
}

fn write_escaped<W: Write>(out: &mut W, text: &str, in_attribute: bool) -> fmt::Result {
    for c in text.chars() {
        match c {
            '&' => out.write_str("&amp;")?,
            '<' => out.write_str("&lt;")?,
            '>' => out.write_str("&gt;")?,
            '"' if in_attribute => out.write_str("&quot;")?,
            c => out.write_char(c)?,
        }
    }
    Ok(())
}
