use serde_json::{Map, Value};

use super::{Context, Path};
use crate::section::{
    DEFAULT_ELEMENT, DEFAULT_LEVEL, Section, SectionComponentProps, SectionSequence,
    TopLevelConfiguration,
};

const SECTION_FIELDS: &[&str] = &["title", "abstract", "blocks", "sections"];
const CONFIG_FIELDS: &[&str] = &["className", "level", "as"];

impl Context {
    pub(crate) fn section(&mut self, value: &Value, path: &Path) -> Option<Section> {
        let object = self.object(value, path, "section object")?;
        self.check_fields(object, SECTION_FIELDS, path);
        self.section_fields(object, path)
    }

    pub(crate) fn section_sequence(&mut self, value: &Value, path: &Path) -> Option<SectionSequence> {
        self.sequence(value, path, "array of sections", Self::section)
    }

    fn section_fields(&mut self, object: &Map<String, Value>, path: &Path) -> Option<Section> {
        let title = self.required(object, "title", "inline sequence", path, Self::inline_sequence);
        let r#abstract = self.optional(object, "abstract", path, Self::inline_sequence);
        let blocks = self.optional(object, "blocks", path, Self::block_sequence);
        let sections = self.optional(object, "sections", path, Self::section_sequence);

        Some(Section {
            title: title?,
            r#abstract: r#abstract?.unwrap_or_default(),
            blocks: blocks?.unwrap_or_default(),
            sections: sections?.unwrap_or_default(),
        })
    }

    pub(crate) fn top_level_configuration(
        &mut self,
        value: &Value,
        path: &Path,
    ) -> Option<TopLevelConfiguration> {
        let object = self.object(value, path, "configuration object")?;
        self.check_fields(object, CONFIG_FIELDS, path);
        self.configuration_fields(object, &Map::new(), path)
    }

    pub(crate) fn component_props(
        &mut self,
        value: &Value,
        overrides: &Map<String, Value>,
        path: &Path,
    ) -> Option<SectionComponentProps> {
        let object = self.object(value, path, "section object")?;
        let known: Vec<&str> = CONFIG_FIELDS.iter().chain(SECTION_FIELDS).copied().collect();
        self.check_fields(object, &known, path);

        let config = self.configuration_fields(object, overrides, path);
        let section = self.section_fields(object, path);
        Some(SectionComponentProps {
            config: config?,
            section: section?,
        })
    }

    fn configuration_fields(
        &mut self,
        object: &Map<String, Value>,
        overrides: &Map<String, Value>,
        path: &Path,
    ) -> Option<TopLevelConfiguration> {
        let source = |field: &str| {
            if overrides.contains_key(field) {
                overrides
            } else {
                object
            }
        };
        let class_name = self.optional(source("className"), "className", path, Self::string);
        let level = self.optional(source("level"), "level", path, Self::level);
        let element = self.optional(source("as"), "as", path, Self::tag_name);

        Some(TopLevelConfiguration {
            class_name: class_name?,
            level: level?.unwrap_or(DEFAULT_LEVEL),
            element: element?.unwrap_or_else(|| DEFAULT_ELEMENT.to_string()),
        })
    }

    /// Heading depth of a section; zero is not a depth.
    fn level(&mut self, value: &Value, path: &Path) -> Option<u32> {
        self.integer(value, path, 1, u32::MAX as u64)
            .map(|n| n as u32)
    }

    /// Element kind for the container: `[A-Za-z][A-Za-z0-9-]*`.
    fn tag_name(&mut self, value: &Value, path: &Path) -> Option<String> {
        let name = self.string(value, path)?;
        let mut chars = name.chars();
        let valid = chars.next().is_some_and(|c| c.is_ascii_alphabetic())
            && chars.all(|c| c.is_ascii_alphanumeric() || c == '-');
        if valid {
            Some(name)
        } else {
            self.mismatch(path, "element name", value);
            None
        }
    }
}
