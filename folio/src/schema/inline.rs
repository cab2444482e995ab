use serde_json::{Map, Value};

use super::{Context, Path};
use crate::document::InlineNode;

const INLINE_TYPES: &str =
    "one of text, emphasis, strong, strikethrough, code, link, image, softBreak, hardBreak";

impl Context {
    pub(crate) fn inline_sequence(&mut self, value: &Value, path: &Path) -> Option<Vec<InlineNode>> {
        self.sequence(value, path, "inline sequence", Self::inline)
    }

    fn inline(&mut self, value: &Value, path: &Path) -> Option<InlineNode> {
        match value {
            Value::String(text) => Some(InlineNode::text(text.as_str())),
            Value::Object(object) => match object.get("type") {
                // `{"text": "..."}` is the untagged form of a text run.
                None => {
                    self.check_fields(object, &["text"], path);
                    let text = self.required(object, "text", "string", path, Self::string)?;
                    Some(InlineNode::Text { text })
                }
                Some(Value::String(tag)) => self.tagged_inline(tag, object, path),
                Some(other) => {
                    self.mismatch(&path.field("type"), INLINE_TYPES, other);
                    None
                }
            },
            other => {
                self.mismatch(path, "inline (string or object)", other);
                None
            }
        }
    }

    fn tagged_inline(
        &mut self,
        tag: &str,
        object: &Map<String, Value>,
        path: &Path,
    ) -> Option<InlineNode> {
        match tag {
            "text" => {
                self.check_fields(object, &["type", "text"], path);
                let text = self.required(object, "text", "string", path, Self::string)?;
                Some(InlineNode::Text { text })
            }
            "emphasis" | "strong" | "strikethrough" => {
                self.check_fields(object, &["type", "content"], path);
                let content = self.required(
                    object,
                    "content",
                    "inline sequence",
                    path,
                    Self::inline_sequence,
                )?;
                Some(match tag {
                    "emphasis" => InlineNode::Emphasis { content },
                    "strong" => InlineNode::Strong { content },
                    _ => InlineNode::Strikethrough { content },
                })
            }
            "code" => {
                self.check_fields(object, &["type", "text"], path);
                let text = self.required(object, "text", "string", path, Self::string)?;
                Some(InlineNode::CodeSpan { text })
            }
            "link" => {
                self.check_fields(object, &["type", "href", "title", "content"], path);
                let href = self.required(object, "href", "string", path, Self::string);
                let title = self.optional(object, "title", path, Self::string);
                let content = self.required(
                    object,
                    "content",
                    "inline sequence",
                    path,
                    Self::inline_sequence,
                );
                Some(InlineNode::Link {
                    href: href?,
                    title: title?,
                    content: content?,
                })
            }
            "image" => {
                self.check_fields(object, &["type", "src", "title", "alt"], path);
                let src = self.required(object, "src", "string", path, Self::string);
                let title = self.optional(object, "title", path, Self::string);
                let alt = self.optional(object, "alt", path, Self::inline_sequence);
                Some(InlineNode::Image {
                    src: src?,
                    title: title?,
                    alt: alt?.unwrap_or_default(),
                })
            }
            "softBreak" => {
                self.check_fields(object, &["type"], path);
                Some(InlineNode::SoftBreak)
            }
            "hardBreak" => {
                self.check_fields(object, &["type"], path);
                Some(InlineNode::HardBreak)
            }
            _ => {
                self.mismatch(
                    &path.field("type"),
                    INLINE_TYPES,
                    &Value::String(tag.to_string()),
                );
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::document::InlineNode;
    use crate::schema::{Validator, validate_section};

    fn title(value: serde_json::Value) -> Vec<InlineNode> {
        validate_section(&json!({ "title": value })).unwrap().title
    }

    #[test]
    fn text_forms_are_equivalent() {
        let expected = vec![InlineNode::text("a")];
        assert_eq!(title(json!(["a"])), expected);
        assert_eq!(title(json!([{"text": "a"}])), expected);
        assert_eq!(title(json!([{"type": "text", "text": "a"}])), expected);
    }

    #[test]
    fn nested_marks() {
        let inlines = title(json!([
            {"type": "strong", "content": [{"type": "emphasis", "content": ["x"]}]},
            {"type": "code", "text": "y"},
            {"type": "hardBreak"},
        ]));
        assert_eq!(
            inlines,
            vec![
                InlineNode::Strong {
                    content: vec![InlineNode::Emphasis {
                        content: vec![InlineNode::text("x")]
                    }]
                },
                InlineNode::CodeSpan {
                    text: "y".to_string()
                },
                InlineNode::HardBreak,
            ]
        );
    }

    #[test]
    fn link_and_image() {
        let inlines = title(json!([
            {"type": "link", "href": "/a", "title": "A", "content": ["go"]},
            {"type": "image", "src": "/i.png", "alt": ["pic"]},
        ]));
        assert_eq!(
            inlines[0],
            InlineNode::Link {
                href: "/a".to_string(),
                title: Some("A".to_string()),
                content: vec![InlineNode::text("go")],
            }
        );
        assert_eq!(
            inlines[1],
            InlineNode::Image {
                src: "/i.png".to_string(),
                title: None,
                alt: vec![InlineNode::text("pic")],
            }
        );
    }

    #[test]
    fn unknown_inline_type_is_reported_at_type() {
        let err = validate_section(&json!({"title": [{"type": "blink"}]})).unwrap_err();
        assert_eq!(err.issues_at("title[0].type").len(), 1);
    }

    #[test]
    fn bad_nested_inline_reports_deep_path() {
        let err = validate_section(&json!({
            "title": [{"type": "emphasis", "content": [{"type": "link", "href": 3, "content": []}]}]
        }))
        .unwrap_err();
        assert_eq!(err.issues_at("title[0].content[0].href").len(), 1);
    }

    #[test]
    fn strict_mode_flags_unknown_inline_fields() {
        let value = json!({"title": [{"text": "a", "bold": true}]});
        assert!(validate_section(&value).is_ok());
        let err = Validator::strict().validate_section(&value).unwrap_err();
        assert_eq!(err.issues_at("title[0].bold").len(), 1);
    }
}
