use folio::schema::Validator;
use folio::{Key, Section, SectionComponentProps, ValidationError};
use serde_json::{Map, Value};

use crate::block::{render_blocks, sibling_keys};
use crate::host::{NodeBuilder, TreeBuilder};
use crate::inline::render_inlines;
use crate::node::{Attributes, Node};

/// Container kind forced by [`SectionRenderer::render_main_section`].
pub const MAIN_ELEMENT: &str = "main";
/// Heading depth forced by [`SectionRenderer::render_main_section`].
pub const MAIN_LEVEL: u32 = 1;

/// Validates section props and turns them into presentation nodes.
///
/// Rendering is a pure depth-first transform: the only state is the
/// builder, and the same props always produce an equivalent tree.
pub struct SectionRenderer<B: TreeBuilder = NodeBuilder> {
    builder: B,
    validator: Validator,
}

impl SectionRenderer<NodeBuilder> {
    pub fn new() -> Self {
        SectionRenderer::with_builder(NodeBuilder)
    }
}

impl Default for SectionRenderer<NodeBuilder> {
    fn default() -> Self {
        SectionRenderer::new()
    }
}

impl<B: TreeBuilder> SectionRenderer<B> {
    pub fn with_builder(builder: B) -> Self {
        SectionRenderer {
            builder,
            validator: Validator::new(),
        }
    }

    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = validator;
        self
    }

    pub fn builder(&self) -> &B {
        &self.builder
    }

    pub fn into_builder(self) -> B {
        self.builder
    }

    /// Validate `props` and render them.
    ///
    /// `inherited_as` and `inherited_level` are the values a parent passes
    /// down; when given they win over the ones carried in `props`. When
    /// neither names them, the container is a `section` with depth 2.
    pub fn render_section(
        &mut self,
        props: &Value,
        inherited_as: Option<&str>,
        inherited_level: Option<u32>,
    ) -> Result<B::Node, ValidationError> {
        let mut overrides = Map::new();
        if let Some(element) = inherited_as {
            overrides.insert("as".to_string(), Value::from(element));
        }
        if let Some(level) = inherited_level {
            overrides.insert("level".to_string(), Value::from(level));
        }
        self.render_with_overrides(props, &overrides)
    }

    /// Render as the document's main landmark: container `main`, root
    /// heading depth 1, whatever `props` say.
    pub fn render_main_section(&mut self, props: &Value) -> Result<B::Node, ValidationError> {
        self.render_section(props, Some(MAIN_ELEMENT), Some(MAIN_LEVEL))
    }

    /// Validate `props` with configuration fields in `overrides` taking
    /// precedence, then render. Any issue anywhere in the tree aborts the
    /// whole render.
    pub fn render_with_overrides(
        &mut self,
        props: &Value,
        overrides: &Map<String, Value>,
    ) -> Result<B::Node, ValidationError> {
        let props = self
            .validator
            .validate_section_component_props_with(props, overrides)?;
        log::debug!(
            "rendering <{}> at level {} ({} level(s) deep)",
            props.config.element,
            props.config.level,
            props.section.depth()
        );
        Ok(self.render(&props))
    }

    /// Render already-validated props.
    pub fn render(&mut self, props: &SectionComponentProps) -> B::Node {
        let attributes = Attributes::new().with_class(props.config.class_name.clone());
        self.render_container(
            &props.section,
            &props.config.element,
            props.config.level,
            attributes,
        )
    }

    fn render_container(
        &mut self,
        section: &Section,
        element: &str,
        level: u32,
        attributes: Attributes,
    ) -> B::Node {
        log::trace!(
            "section <{}> level {}: {} block(s), {} subsection(s)",
            element,
            level,
            section.blocks.len(),
            section.sections.len()
        );
        let mut children = Vec::new();

        if !section.title.is_empty() {
            let title = render_inlines(&mut self.builder, &section.title);
            let kind = heading_kind(level);
            children.push(self.builder.element(&kind, Attributes::new(), title));
        }

        if !section.r#abstract.is_empty() {
            let text = render_inlines(&mut self.builder, &section.r#abstract);
            children.push(self.builder.element("p", Attributes::new(), text));
        }

        children.extend(render_blocks(&mut self.builder, &section.blocks));

        // Nested sections keep the parent's container kind and drop its class.
        let keys = sibling_keys(section.sections.iter().map(Key::derive), "section");
        for (child, key) in section.sections.iter().zip(keys) {
            let attributes = Attributes::new().with_key(Some(key));
            let node = self.render_container(child, element, level.saturating_add(1), attributes);
            children.push(node);
        }

        self.builder.element(element, attributes, children)
    }
}

/// `h1`..`h6`; HTML has no deeper heading, so depths past 6 share `h6`.
fn heading_kind(level: u32) -> String {
    format!("h{}", level.clamp(1, 6))
}

/// Validate and render `props` with no inherited context.
pub fn render_section(props: &Value) -> Result<Node, ValidationError> {
    SectionRenderer::new().render_section(props, None, None)
}

/// Validate and render `props` as the document's `main` section.
pub fn render_main_section(props: &Value) -> Result<Node, ValidationError> {
    SectionRenderer::new().render_main_section(props)
}
