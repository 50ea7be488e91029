use super::*;
use serde_json::json;

fn attributes(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        _ => panic!("expected an object"),
    }
}

#[test]
fn default_template_matches_compiled_default_source() {
    let compiled = ItemTemplate::compile(DEFAULT_ITEM_TEMPLATE).expect("compile");
    assert_eq!(compiled, ItemTemplate::default());
}

#[test]
fn renders_scene_attributes() {
    let template = ItemTemplate::default();
    let html = template.render(&attributes(json!({
        "instructions": "Welcome to Git Neat!",
        "img_class": "img0",
        "scene_number": 0,
        "order": 1,
    })));
    assert_eq!(
        html,
        r#"<div class="view img0"><label>Welcome to Git Neat!</label></div>"#
    );
}

#[test]
fn null_values_render_as_empty_text() {
    let template = ItemTemplate::default();
    let html = template.render(&attributes(json!({
        "instructions": null,
        "img_class": "img3",
    })));
    assert_eq!(html, r#"<div class="view img3"><label></label></div>"#);
}

#[test]
fn numbers_and_whitespace_in_placeholders() {
    let template = ItemTemplate::compile("#{{ scene_number }}/{{order}}").expect("compile");
    let html = template.render(&attributes(json!({ "scene_number": 4, "order": 9 })));
    assert_eq!(html, "#4/9");
}

#[test]
fn escapes_markup_in_values() {
    let template = ItemTemplate::compile("<b>{{instructions}}</b>").expect("compile");
    let html = template.render(&attributes(json!({ "instructions": "<i>\"hi\" & 'bye'</i>" })));
    assert_eq!(
        html,
        "<b>&lt;i&gt;&quot;hi&quot; &amp; &#x27;bye&#x27;&lt;/i&gt;</b>"
    );
}

#[test]
fn rejects_malformed_templates() {
    assert_eq!(
        ItemTemplate::compile("<li>{{instructions</li>"),
        Err(TemplateError::Unterminated { offset: 4 })
    );
    assert_eq!(
        ItemTemplate::compile("ab{{  }}"),
        Err(TemplateError::EmptyPlaceholder { offset: 2 })
    );
    assert_eq!(
        ItemTemplate::compile("{{title}}"),
        Err(TemplateError::UnknownField {
            name: "title".to_string()
        })
    );
}
