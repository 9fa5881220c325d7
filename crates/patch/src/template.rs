//! Template expansion seam for templated inline scripts.
//!
//! Templating itself belongs to the host. The core only needs a way to turn a
//! template path plus a model into text when a `JsScript` is rendered.
//! [`TemplateRegistry`] is a small placeholder engine for hosts that have
//! nothing better, and for tests.

use crate::error::PatchError;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::fmt;

pub type TemplateModel = Map<String, Value>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateError {
    pub path: String,
    pub message: String,
}

impl TemplateError {
    pub fn new(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "template {}: {}", self.path, self.message)
    }
}

impl std::error::Error for TemplateError {}

pub trait TemplateEngine {
    fn render_template(&self, path: &str, model: &TemplateModel) -> Result<String, TemplateError>;
}

/// Everything rendering needs from the host.
#[derive(Clone, Copy, Default)]
pub struct RenderContext<'a> {
    engine: Option<&'a dyn TemplateEngine>,
}

impl<'a> RenderContext<'a> {
    pub fn new() -> Self {
        Self { engine: None }
    }

    pub fn with_engine(engine: &'a dyn TemplateEngine) -> Self {
        Self {
            engine: Some(engine),
        }
    }

    pub fn render_template(&self, path: &str, model: &TemplateModel) -> Result<String, PatchError> {
        let Some(engine) = self.engine else {
            return Err(PatchError::Template(TemplateError::new(
                path,
                "no template engine configured",
            )));
        };
        engine
            .render_template(path, model)
            .map_err(PatchError::Template)
    }
}

impl fmt::Debug for RenderContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderContext")
            .field("engine", &self.engine.is_some())
            .finish()
    }
}

/// Templates held in memory by path, expanded with `$name` / `${name}`
/// placeholders.
///
/// String values are inserted as-is, every other value as JSON. Unknown
/// placeholders are left untouched.
#[derive(Debug, Default, Clone)]
pub struct TemplateRegistry {
    templates: HashMap<String, String>,
}

impl TemplateRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, path: impl Into<String>, source: impl Into<String>) {
        self.templates.insert(path.into(), source.into());
    }

    pub fn with_template(mut self, path: impl Into<String>, source: impl Into<String>) -> Self {
        self.insert(path, source);
        self
    }

    pub fn contains(&self, path: &str) -> bool {
        self.templates.contains_key(path)
    }
}

impl TemplateEngine for TemplateRegistry {
    fn render_template(&self, path: &str, model: &TemplateModel) -> Result<String, TemplateError> {
        let source = self
            .templates
            .get(path)
            .ok_or_else(|| TemplateError::new(path, "template not found"))?;
        Ok(expand_placeholders(source, model))
    }
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

pub fn expand_placeholders(source: &str, model: &TemplateModel) -> String {
    let bytes = source.as_bytes();
    let mut out = String::with_capacity(source.len());
    let mut last = 0;
    let mut i = 0;
    while let Some(rel) = memchr::memchr(b'$', &bytes[i..]) {
        let start = i + rel;
        let (name_start, name_end, end) = if bytes.get(start + 1) == Some(&b'{') {
            let Some(close) = memchr::memchr(b'}', &bytes[start + 2..]) else {
                break;
            };
            (start + 2, start + 2 + close, start + 3 + close)
        } else {
            let mut end = start + 1;
            while end < bytes.len() && is_name_byte(bytes[end]) {
                end += 1;
            }
            (start + 1, end, end)
        };
        i = start + 1;
        if name_start == name_end {
            continue;
        }
        let name = &source[name_start..name_end];
        let Some(value) = model.get(name) else {
            continue;
        };
        out.push_str(&source[last..start]);
        match value {
            Value::String(s) => out.push_str(s),
            other => out.push_str(&other.to_string()),
        }
        last = end;
        i = end;
    }
    out.push_str(&source[last..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn model(value: Value) -> TemplateModel {
        match value {
            Value::Object(map) => map,
            _ => unreachable!("test models are objects"),
        }
    }

    #[test]
    fn placeholders_expand_strings_raw_and_values_as_json() {
        let m = model(json!({"name": "tree", "delay": 250, "opts": {"a": true}}));
        let out = expand_placeholders("init('$name', ${delay}, $opts);", &m);
        assert_eq!(out, "init('tree', 250, {\"a\":true});");
    }

    #[test]
    fn unknown_and_bare_dollars_are_left_alone() {
        let m = model(json!({"a": "x"}));
        assert_eq!(expand_placeholders("$ $b ${c} $a", &m), "$ $b ${c} x");
        assert_eq!(expand_placeholders("${unterminated", &m), "${unterminated");
    }

    #[test]
    fn missing_engine_is_a_template_error() {
        let ctx = RenderContext::new();
        let err = ctx.render_template("/t.js", &TemplateModel::new()).unwrap_err();
        assert!(matches!(err, PatchError::Template(_)));
    }

    #[test]
    fn registry_reports_missing_templates() {
        let registry = TemplateRegistry::new().with_template("/a.js", "a");
        let ctx = RenderContext::with_engine(&registry);
        assert_eq!(ctx.render_template("/a.js", &TemplateModel::new()).unwrap(), "a");
        assert!(ctx.render_template("/b.js", &TemplateModel::new()).is_err());
    }
}
