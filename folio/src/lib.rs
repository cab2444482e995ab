//! Content model and schema for nested document sections.
//!
//! A [`Section`] holds a title, an optional abstract, body [`Block`]s and
//! child sections. Untyped JSON props are turned into sections by the
//! [`schema`] validators; Markdown sources by the [`parser`].

pub mod document;
pub mod key;
pub mod parser;
pub mod schema;
pub mod section;

pub use document::{Block, ColumnAlignment, InlineNode};
pub use key::{Key, Keyed};
pub use schema::{ValidationError, Validator};
pub use section::{Section, SectionComponentProps, SectionSequence, TopLevelConfiguration};
