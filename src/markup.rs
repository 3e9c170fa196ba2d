//! Alert markup rendering with minijinja.
//!
//! The template receives already-sanitized values and is rendered without
//! auto-escaping:
//!
//! - `class`: severity class (`danger` for errors)
//! - `severity`: severity name
//! - `stamp`: sanitized stamp, empty when none
//! - `text`: sanitized message; the `nl2br` filter turns newlines into `<br />`

use minijinja::{Environment, UndefinedBehavior, context};

use crate::error::TemplateError;

/// Built-in alert markup.
pub const DEFAULT_ALERT_TEMPLATE: &str = concat!(
    r#"<div class="alert alert-{{ class }}" data-alert-stamp="{{ stamp }}">"#,
    r#"<button type="button" class="close" data-dismiss="alert">&times;</button>"#,
    r#"{{ text | nl2br }}</div>"#
);

/// Values substituted into the alert template.
#[derive(Debug, Clone, Copy)]
pub struct MarkupFields<'a> {
    pub class: &'a str,
    pub severity: &'a str,
    pub stamp: &'a str,
    pub text: &'a str,
}

/// Pre-built environment plus the template source.
pub struct MarkupTemplate {
    env: Environment<'static>,
    source: String,
}

fn nl2br(value: String) -> String {
    value.replace('\n', "<br />")
}

impl MarkupTemplate {
    pub fn new(source: impl Into<String>) -> Self {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Lenient);
        env.add_filter("nl2br", nl2br);
        Self {
            env,
            source: source.into(),
        }
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn render(&self, fields: MarkupFields<'_>) -> Result<String, TemplateError> {
        self.env
            .render_str(
                &self.source,
                context! {
                    class => fields.class,
                    severity => fields.severity,
                    stamp => fields.stamp,
                    text => fields.text,
                },
            )
            .map_err(|e| {
                tracing::warn!(error = %e, "Alert markup render failed");
                TemplateError::RenderFailed {
                    message: e.to_string(),
                }
            })
    }
}

impl Default for MarkupTemplate {
    fn default() -> Self {
        Self::new(DEFAULT_ALERT_TEMPLATE)
    }
}

impl std::fmt::Debug for MarkupTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MarkupTemplate")
            .field("source", &self.source)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields<'a>(class: &'a str, stamp: &'a str, text: &'a str) -> MarkupFields<'a> {
        MarkupFields {
            class,
            severity: class,
            stamp,
            text,
        }
    }

    #[test]
    fn default_template_renders_alert_div() {
        let markup = MarkupTemplate::default()
            .render(fields("danger", "save", "Disk full"))
            .unwrap();
        assert_eq!(
            markup,
            "<div class=\"alert alert-danger\" data-alert-stamp=\"save\">\
             <button type=\"button\" class=\"close\" data-dismiss=\"alert\">&times;</button>\
             Disk full</div>"
        );
    }

    #[test]
    fn newlines_become_line_breaks() {
        let markup = MarkupTemplate::new("{{ text | nl2br }}")
            .render(fields("info", "", "one\ntwo"))
            .unwrap();
        assert_eq!(markup, "one<br />two");
    }

    #[test]
    fn sanitized_text_is_not_escaped_again() {
        let markup = MarkupTemplate::new("{{ text }}")
            .render(fields("info", "", "&lt;b&gt;"))
            .unwrap();
        assert_eq!(markup, "&lt;b&gt;");
    }

    #[test]
    fn custom_template_can_use_severity() {
        let markup = MarkupTemplate::new("<p data-sev=\"{{ severity }}\">{{ text }}</p>")
            .render(fields("warning", "", "Low battery"))
            .unwrap();
        assert_eq!(markup, "<p data-sev=\"warning\">Low battery</p>");
    }

    #[test]
    fn unknown_filter_is_a_render_error() {
        let result = MarkupTemplate::new("{{ text | shout }}").render(fields("info", "", "x"));
        assert!(matches!(result, Err(TemplateError::RenderFailed { .. })));
    }
}
