//! Embedded tera templates and the custom filters they use.

use rust_embed::RustEmbed;
use serde_json::Value;
use std::collections::HashMap;
use tera::{Context, Tera};
use tracing::debug;

use crate::web::flash::FlashMessage;
use crate::web::models::Identity;

#[derive(RustEmbed)]
#[folder = "templates/"]
struct TemplateAssets;

/// Loads every embedded template and registers the custom filters.
pub fn load_templates() -> tera::Result<Tera> {
    let mut tera = Tera::default();
    tera.autoescape_on(vec![".html"]);
    tera.register_filter("pluralize", pluralize);
    tera.register_filter("slice_string", slice_string);
    tera.register_filter("linebreaksbr", linebreaksbr);

    let mut sources = Vec::new();
    for name in TemplateAssets::iter() {
        let Some(file) = TemplateAssets::get(&name) else {
            continue;
        };
        let source = String::from_utf8(file.data.into_owned())
            .map_err(|e| tera::Error::msg(format!("Template {name} is not UTF-8: {e}")))?;
        sources.push((name.to_string(), source));
    }
    debug!(count = sources.len(), "Loading templates.");
    tera.add_raw_templates(sources)?;
    Ok(tera)
}

/// Context every page starts from: who is logged in and pending flashes.
pub fn base_context(identity: &Identity, flashes: &[FlashMessage]) -> Context {
    let mut context = Context::new();
    context.insert("is_authenticated", &identity.is_authenticated());
    context.insert("current_user", &identity.user());
    context.insert("flashes", flashes);
    context
}

/// `{{ count | pluralize }}` gives `"s"` unless the count is one.
/// `{{ count | pluralize(singular="y", plural="ies") }}` picks custom suffixes.
fn pluralize(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    let count = match value {
        Value::Number(n) => n.as_f64().unwrap_or_default(),
        Value::Array(items) => items.len() as f64,
        other => return Err(tera::Error::msg(format!("pluralize expects a number, got {other}"))),
    };
    let singular = args.get("singular").and_then(Value::as_str).unwrap_or("");
    let plural = args.get("plural").and_then(Value::as_str).unwrap_or("s");
    let suffix = if count == 1.0 { singular } else { plural };
    Ok(Value::String(suffix.to_string()))
}

/// `{{ text | slice_string(length=150) }}` truncates on a character boundary
/// and appends `...` when something was cut.
fn slice_string(value: &Value, args: &HashMap<String, Value>) -> tera::Result<Value> {
    let text = value.as_str().unwrap_or_default();
    let length = args
        .get("length")
        .and_then(Value::as_u64)
        .ok_or_else(|| tera::Error::msg("slice_string requires a `length` argument"))?
        as usize;
    if text.chars().count() <= length {
        return Ok(Value::String(text.to_string()));
    }
    let mut sliced: String = text.chars().take(length).collect();
    sliced.push_str("...");
    Ok(Value::String(sliced))
}

/// Escapes the text, then turns newlines into `<br>`. Use with `| safe`.
fn linebreaksbr(value: &Value, _: &HashMap<String, Value>) -> tera::Result<Value> {
    let text = value.as_str().unwrap_or_default();
    let escaped = tera::escape_html(&text.replace("\r\n", "\n"));
    Ok(Value::String(escaped.replace('\n', "<br>")))
}
