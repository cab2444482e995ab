pub mod block;
pub mod host;
pub mod html;
pub mod inline;
pub mod node;
pub mod section;

pub use host::{NodeBuilder, TreeBuilder};
pub use html::to_html;
pub use node::{Attributes, Element, Node};
pub use section::{SectionRenderer, render_main_section, render_section};
