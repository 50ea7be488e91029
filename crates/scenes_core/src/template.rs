use serde_json::{Map, Value};
use thiserror::Error;

pub const DEFAULT_ITEM_TEMPLATE: &str =
    r#"<div class="view {{img_class}}"><label>{{instructions}}</label></div>"#;

/// Attribute names a scene serializes to.
pub const SCENE_FIELDS: [&str; 5] = ["id", "instructions", "img_class", "scene_number", "order"];

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TemplateError {
    #[error("unterminated placeholder starting at byte {offset}")]
    Unterminated { offset: usize },
    #[error("empty placeholder at byte {offset}")]
    EmptyPlaceholder { offset: usize },
    #[error("unknown placeholder '{name}'")]
    UnknownField { name: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Field(String),
}

/// Compiled item template with `{{field}}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemTemplate {
    segments: Vec<Segment>,
}

impl ItemTemplate {
    pub fn compile(source: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut rest = source;
        let mut consumed = 0;

        while let Some(start) = rest.find("{{") {
            if start > 0 {
                segments.push(Segment::Literal(rest[..start].to_string()));
            }
            let offset = consumed + start;
            let after_open = &rest[start + 2..];
            let Some(end) = after_open.find("}}") else {
                return Err(TemplateError::Unterminated { offset });
            };
            let name = after_open[..end].trim();
            if name.is_empty() {
                return Err(TemplateError::EmptyPlaceholder { offset });
            }
            if !SCENE_FIELDS.contains(&name) {
                return Err(TemplateError::UnknownField {
                    name: name.to_string(),
                });
            }
            segments.push(Segment::Field(name.to_string()));

            let advanced = start + 2 + end + 2;
            consumed += advanced;
            rest = &rest[advanced..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }

        Ok(Self { segments })
    }

    pub fn render(&self, attributes: &Map<String, Value>) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Field(name) => {
                    if let Some(value) = attributes.get(name) {
                        escape_html_into(&value_text(value), &mut out);
                    }
                }
            }
        }
        out
    }
}

impl Default for ItemTemplate {
    fn default() -> Self {
        Self {
            segments: vec![
                Segment::Literal(r#"<div class="view "#.to_string()),
                Segment::Field("img_class".to_string()),
                Segment::Literal(r#""><label>"#.to_string()),
                Segment::Field("instructions".to_string()),
                Segment::Literal("</label></div>".to_string()),
            ],
        }
    }
}

fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn escape_html_into(text: &str, out: &mut String) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            '`' => out.push_str("&#x60;"),
            _ => out.push(ch),
        }
    }
}

#[cfg(test)]
#[path = "tests/template_tests.rs"]
mod tests;
