//! Template and severity name validation utilities.

use minijinja::Environment;
use regex::Regex;
use std::sync::LazyLock;

use crate::markup::{MarkupFields, MarkupTemplate};

/// Validates Jinja template syntax, then performs a test render with
/// sample values to catch runtime errors like unknown filters.
pub(crate) fn validate_jinja_template(source: &str) -> Result<(), String> {
    let mut env = Environment::new();
    env.add_template("_validate", source)
        .map_err(|e| e.to_string())?;

    MarkupTemplate::new(source)
        .render(MarkupFields {
            class: "info",
            severity: "info",
            stamp: "",
            text: "validation",
        })
        .map_err(|e| e.to_string())?;

    Ok(())
}

/// Validates a custom severity name: lowercase ASCII identifier that does
/// not shadow a built-in severity.
pub(crate) fn validate_severity_name(name: &str) -> Result<(), String> {
    static SEVERITY_NAME_REGEX: LazyLock<Regex> =
        LazyLock::new(|| Regex::new(r"^[a-z][a-z0-9_-]*$").expect("valid regex"));

    if matches!(name, "error" | "info" | "success") {
        return Err("shadows a built-in severity".to_string());
    }
    if SEVERITY_NAME_REGEX.is_match(name) {
        Ok(())
    } else {
        Err("must match ^[a-z][a-z0-9_-]*$ (e.g., warning, low-disk)".to_string())
    }
}
