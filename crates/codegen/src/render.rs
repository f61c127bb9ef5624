//! Embedded handlebars templates and name shaping for generated code.

use handlebars::Handlebars;
use once_cell::sync::Lazy;

use crate::error::Result;

// Registered once; the generator renders the same handful of templates for
// every package. Escaping is disabled because the output is Rust, TOML and
// Markdown rather than HTML.
static REGISTRY: Lazy<Handlebars<'static>> = Lazy::new(|| {
    let mut registry = Handlebars::new();
    registry.register_escape_fn(handlebars::no_escape);
    for (name, template) in [
        ("Cargo.toml", include_str!("../templates/Cargo.toml.hbs")),
        ("main.rs", include_str!("../templates/main.rs.hbs")),
        (
            "handlers_mod.rs",
            include_str!("../templates/handlers_mod.rs.hbs"),
        ),
        ("handler.rs", include_str!("../templates/handler.rs.hbs")),
        ("README.md", include_str!("../templates/README.md.hbs")),
    ] {
        registry
            .register_template_string(name, template)
            .expect("embedded template must parse");
    }
    registry
});

/// Render the embedded template `name` with `data`.
pub(crate) fn render(name: &str, data: &serde_json::Value) -> Result<String> {
    Ok(REGISTRY.render(name, data)?)
}

/// `geocode_address` to `GeocodeAddress`, for generated struct names.
pub(crate) fn pascal_case(name: &str) -> String {
    name.split(['_', '-'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect()
}
