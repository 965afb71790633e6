//! Handlebars templates registered by id from the menu file.

use std::collections::HashMap;

use anyhow::{bail, Context, Result};
use handlebars::Handlebars;
use nav_core::TemplateRenderer;
use serde_json::Value;

pub struct HandlebarsTemplates {
    registry: Handlebars<'static>,
}

impl HandlebarsTemplates {
    pub fn new(templates: &HashMap<String, String>) -> Result<Self> {
        let mut registry = Handlebars::new();
        for (template_id, source) in templates {
            registry
                .register_template_string(template_id, source)
                .with_context(|| format!("invalid template `{template_id}`"))?;
        }
        Ok(Self { registry })
    }
}

impl TemplateRenderer for HandlebarsTemplates {
    fn render(&self, template_id: &str, data: &Value) -> Result<String> {
        if !self.registry.has_template(template_id) {
            bail!("unknown template `{template_id}`");
        }
        self.registry
            .render(template_id, data)
            .with_context(|| format!("failed to render template `{template_id}`"))
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn templates(id: &str, body: &str) -> HandlebarsTemplates {
        HandlebarsTemplates::new(&HashMap::from([(id.to_string(), body.to_string())]))
            .expect("register")
    }

    #[test]
    fn renders_nested_fields_and_loops() {
        let renderer = templates(
            "t",
            "<p>{{user.name}}</p><ul>{{#each items}}<li>{{this}}</li>{{/each}}</ul>",
        );
        let html = renderer
            .render("t", &json!({"user": {"name": "Ann"}, "items": ["a", "b"]}))
            .expect("render");
        assert_eq!(html, "<p>Ann</p><ul><li>a</li><li>b</li></ul>");
    }

    #[test]
    fn escapes_substituted_text() {
        let renderer = templates("t", "<h1>{{title}}</h1>{{missing}}");
        let html = renderer
            .render("t", &json!({"title": "Fish & <Chips>"}))
            .expect("render");
        assert_eq!(html, "<h1>Fish &amp; &lt;Chips&gt;</h1>");
    }

    #[test]
    fn malformed_template_is_rejected_at_registration() {
        let result = HandlebarsTemplates::new(&HashMap::from([(
            "broken".to_string(),
            "{{#each items}}".to_string(),
        )]));
        let err = result.err().expect("must fail");
        assert!(err.to_string().contains("broken"));
    }

    #[test]
    fn unknown_template_fails() {
        let renderer = templates("t", "");
        let err = renderer.render("other", &json!({})).expect_err("must fail");
        assert!(err.to_string().contains("other"));
    }
}
