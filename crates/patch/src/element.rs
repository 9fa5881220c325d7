//! Head elements: script and style resources a component needs in the page
//! head.
//!
//! Identity rules:
//! - Imports are identified by their URL.
//! - Inline scripts and styles are identified by their id, when they have one.
//! - An inline resource without id has no identity and is never equal to
//!   anything, so it is never deduplicated.

use crate::error::PatchError;
use crate::markup::MarkupBuffer;
use crate::template::{RenderContext, TemplateModel};
use core_types::ResourceKind;

const DOM_READY_OPEN: &str = "jQuery(document).ready(function(){\n";
const DOM_READY_CLOSE: &str = "\n});";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct JsImport {
    pub src: String,
    pub attributes: Vec<(String, String)>,
}

impl JsImport {
    pub fn new(src: impl Into<String>) -> Self {
        Self {
            src: src.into(),
            attributes: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CssImport {
    pub href: String,
    pub attributes: Vec<(String, String)>,
}

impl CssImport {
    pub fn new(href: impl Into<String>) -> Self {
        Self {
            href: href.into(),
            attributes: Vec::new(),
        }
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct JsScript {
    pub id: Option<String>,
    pub content: Option<String>,
    /// Template path expanded against `model` before `content` is emitted.
    pub template: Option<String>,
    pub model: Option<TemplateModel>,
    /// Wrap the script in a DOM-ready callback.
    pub execute_on_dom_ready: bool,
    /// Protect the body with a commented CDATA section.
    pub character_data: bool,
    /// Whether `id` is written to the client. The id still identifies the
    /// script server-side when this is off.
    pub render_id: bool,
}

impl Default for JsScript {
    fn default() -> Self {
        Self {
            id: None,
            content: None,
            template: None,
            model: None,
            execute_on_dom_ready: false,
            character_data: false,
            render_id: true,
        }
    }
}

impl JsScript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    pub fn templated(template: impl Into<String>, model: TemplateModel) -> Self {
        Self {
            template: Some(template.into()),
            model: Some(model),
            ..Self::default()
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn dom_ready(mut self, on: bool) -> Self {
        self.execute_on_dom_ready = on;
        self
    }

    pub fn render_id(mut self, on: bool) -> Self {
        self.render_id = on;
        self
    }

    /// Template expansion (if any) followed by the literal content.
    pub fn render_body(
        &self,
        out: &mut MarkupBuffer,
        ctx: &RenderContext<'_>,
    ) -> Result<(), PatchError> {
        let body = self.body(ctx)?;
        out.append(&body);
        Ok(())
    }

    fn body(&self, ctx: &RenderContext<'_>) -> Result<String, PatchError> {
        let mut body = String::new();
        if let Some(template) = &self.template {
            let empty = TemplateModel::new();
            let model = self.model.as_ref().unwrap_or(&empty);
            body.push_str(&ctx.render_template(template, model)?);
        }
        if let Some(content) = &self.content {
            body.push_str(content);
        }
        Ok(body)
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CssStyle {
    pub id: Option<String>,
    pub content: Option<String>,
    pub character_data: bool,
}

impl CssStyle {
    pub fn with_content(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            ..Self::default()
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum HeadElement {
    JsImport(JsImport),
    CssImport(CssImport),
    JsScript(JsScript),
    CssStyle(CssStyle),
}

/// Identity of a head element; see the module docs.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ResourceKey {
    pub kind: ResourceKind,
    pub ident: String,
}

impl HeadElement {
    pub fn kind(&self) -> ResourceKind {
        match self {
            HeadElement::JsImport(_) => ResourceKind::JsImport,
            HeadElement::CssImport(_) => ResourceKind::CssImport,
            HeadElement::JsScript(_) => ResourceKind::JsScript,
            HeadElement::CssStyle(_) => ResourceKind::CssStyle,
        }
    }

    pub fn key(&self) -> Option<ResourceKey> {
        let ident = match self {
            HeadElement::JsImport(i) => Some(i.src.as_str()),
            HeadElement::CssImport(i) => Some(i.href.as_str()),
            HeadElement::JsScript(s) => s.id.as_deref(),
            HeadElement::CssStyle(s) => s.id.as_deref(),
        }?;
        Some(ResourceKey {
            kind: self.kind(),
            ident: ident.to_string(),
        })
    }

    /// Identity as the browser sees it. A script whose id is not rendered
    /// cannot be recognised client-side.
    pub fn client_key(&self) -> Option<ResourceKey> {
        match self {
            HeadElement::JsScript(s) if !s.render_id => None,
            _ => self.key(),
        }
    }

    /// Two elements are the same resource when they share a key.
    pub fn same_resource(&self, other: &HeadElement) -> bool {
        match (self.key(), other.key()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        }
    }

    pub fn render(
        &self,
        out: &mut MarkupBuffer,
        ctx: &RenderContext<'_>,
    ) -> Result<(), PatchError> {
        match self {
            HeadElement::JsImport(import) => {
                out.element_start("script");
                out.append_attribute("type", Some("text/javascript"));
                out.append_attribute("src", Some(&import.src));
                for (name, value) in &import.attributes {
                    out.append_attribute(name, Some(value));
                }
                out.close_tag();
                out.element_end("script");
            }
            HeadElement::CssImport(import) => {
                out.element_start("link");
                out.append_attribute("type", Some("text/css"));
                out.append_attribute("rel", Some("stylesheet"));
                out.append_attribute("href", Some(&import.href));
                for (name, value) in &import.attributes {
                    out.append_attribute(name, Some(value));
                }
                out.element_end_empty();
            }
            HeadElement::JsScript(script) => {
                out.element_start("script");
                out.append_attribute("type", Some("text/javascript"));
                if script.render_id {
                    out.append_attribute("id", script.id.as_deref());
                }
                out.close_tag();
                let mut body = script.body(ctx)?;
                if script.execute_on_dom_ready {
                    body = format!("{DOM_READY_OPEN}{body}{DOM_READY_CLOSE}");
                }
                write_block_body(out, &body, script.character_data);
                out.element_end("script");
            }
            HeadElement::CssStyle(style) => {
                out.element_start("style");
                out.append_attribute("type", Some("text/css"));
                out.append_attribute("id", style.id.as_deref());
                out.close_tag();
                write_block_body(out, style.content.as_deref().unwrap_or(""), style.character_data);
                out.element_end("style");
            }
        }
        Ok(())
    }
}

fn write_block_body(out: &mut MarkupBuffer, body: &str, character_data: bool) {
    if !character_data {
        out.append(body);
        return;
    }
    out.append("/*");
    out.begin_cdata();
    out.append("*/\n");
    out.append_cdata_text(body);
    out.append("\n/*");
    out.end_cdata();
    out.append("*/");
}

impl From<JsImport> for HeadElement {
    fn from(value: JsImport) -> Self {
        HeadElement::JsImport(value)
    }
}

impl From<CssImport> for HeadElement {
    fn from(value: CssImport) -> Self {
        HeadElement::CssImport(value)
    }
}

impl From<JsScript> for HeadElement {
    fn from(value: JsScript) -> Self {
        HeadElement::JsScript(value)
    }
}

impl From<CssStyle> for HeadElement {
    fn from(value: CssStyle) -> Self {
        HeadElement::CssStyle(value)
    }
}

/// Ordered head-element list with identity-based lookups.
///
/// `add` and `insert` never deduplicate; callers that want set semantics
/// check first or use the `*_if_absent` variants.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct HeadElements {
    items: Vec<HeadElement>,
}

impl HeadElements {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, HeadElement> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[HeadElement] {
        &self.items
    }

    pub fn into_vec(self) -> Vec<HeadElement> {
        self.items
    }

    pub fn position(&self, element: &HeadElement) -> Option<usize> {
        self.items.iter().position(|e| e.same_resource(element))
    }

    pub fn contains(&self, element: &HeadElement) -> bool {
        self.position(element).is_some()
    }

    pub fn contains_key(&self, key: &ResourceKey) -> bool {
        self.items.iter().any(|e| e.key().as_ref() == Some(key))
    }

    pub fn add(&mut self, element: impl Into<HeadElement>) {
        self.items.push(element.into());
    }

    /// Inserts at `index`, clamped to the current length.
    pub fn insert(&mut self, index: usize, element: impl Into<HeadElement>) {
        let index = index.min(self.items.len());
        self.items.insert(index, element.into());
    }

    pub fn add_if_absent(&mut self, element: impl Into<HeadElement>) -> bool {
        let element = element.into();
        if self.contains(&element) {
            return false;
        }
        self.items.push(element);
        true
    }

    pub fn insert_if_absent(&mut self, index: usize, element: impl Into<HeadElement>) -> bool {
        let element = element.into();
        if self.contains(&element) {
            return false;
        }
        self.insert(index, element);
        true
    }

    /// Removes the first element with the same identity.
    pub fn remove(&mut self, element: &HeadElement) -> Option<HeadElement> {
        let pos = self.position(element)?;
        Some(self.items.remove(pos))
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}

impl<'a> IntoIterator for &'a HeadElements {
    type Item = &'a HeadElement;
    type IntoIter = std::slice::Iter<'a, HeadElement>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

impl IntoIterator for HeadElements {
    type Item = HeadElement;
    type IntoIter = std::vec::IntoIter<HeadElement>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl FromIterator<HeadElement> for HeadElements {
    fn from_iter<I: IntoIterator<Item = HeadElement>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

impl Extend<HeadElement> for HeadElements {
    fn extend<I: IntoIterator<Item = HeadElement>>(&mut self, iter: I) {
        self.items.extend(iter);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::TemplateRegistry;
    use serde_json::json;

    fn render(element: &HeadElement) -> String {
        let mut out = MarkupBuffer::new();
        element.render(&mut out, &RenderContext::new()).unwrap();
        out.into_string()
    }

    #[test]
    fn imports_compare_by_url() {
        let a: HeadElement = JsImport::new("/js/a.js").into();
        let b: HeadElement = JsImport::new("/js/a.js").with_attribute("charset", "UTF-8").into();
        let css: HeadElement = CssImport::new("/js/a.js").into();
        assert!(a.same_resource(&b));
        assert!(!a.same_resource(&css));
    }

    #[test]
    fn anonymous_inline_scripts_never_match() {
        let a: HeadElement = JsScript::with_content("x()").into();
        let b: HeadElement = JsScript::with_content("x()").into();
        assert!(!a.same_resource(&b));
        let mut list = HeadElements::new();
        assert!(list.add_if_absent(a.clone()));
        assert!(list.add_if_absent(b));
        assert_eq!(list.len(), 2);
        assert!(list.remove(&a).is_none());
    }

    #[test]
    fn identified_scripts_are_replaced_by_remove_then_add() {
        let mut list = HeadElements::new();
        list.add(JsScript::with_content("old()").id("setup"));
        let fresh: HeadElement = JsScript::with_content("new()").id("setup").into();
        assert!(list.remove(&fresh).is_some());
        list.add(fresh.clone());
        assert_eq!(list.as_slice(), &[fresh]);
    }

    #[test]
    fn insert_clamps_index() {
        let mut list = HeadElements::new();
        list.insert(5, JsImport::new("/a.js"));
        list.insert(0, JsImport::new("/b.js"));
        let srcs: Vec<_> = list
            .iter()
            .map(|e| e.key().unwrap().ident)
            .collect();
        assert_eq!(srcs, ["/b.js", "/a.js"]);
    }

    #[test]
    fn hidden_id_has_no_client_key() {
        let script: HeadElement = JsScript::with_content("s()").id("setup").render_id(false).into();
        assert!(script.key().is_some());
        assert!(script.client_key().is_none());
        assert_eq!(
            render(&script),
            "<script type=\"text/javascript\">s()</script>"
        );
    }

    #[test]
    fn character_data_wraps_body_in_commented_cdata() {
        let mut style = CssStyle::with_content("a > b { color: red }").id("s1");
        style.character_data = true;
        assert_eq!(
            render(&style.into()),
            "<style type=\"text/css\" id=\"s1\">\
             /*<![CDATA[*/\na > b { color: red }\n/*]]>*/</style>"
        );
    }

    #[test]
    fn dom_ready_scripts_are_wrapped() {
        let script: HeadElement = JsScript::with_content("go();").dom_ready(true).into();
        assert_eq!(
            render(&script),
            "<script type=\"text/javascript\">\
             jQuery(document).ready(function(){\ngo();\n});</script>"
        );
    }

    #[test]
    fn templated_scripts_expand_before_content() {
        let registry = TemplateRegistry::new().with_template("/t.js", "init($n);");
        let ctx = RenderContext::with_engine(&registry);
        let model = match json!({"n": 3}) {
            serde_json::Value::Object(m) => m,
            _ => unreachable!(),
        };
        let mut script = JsScript::templated("/t.js", model);
        script.content = Some("done();".into());
        let mut out = MarkupBuffer::new();
        script.render_body(&mut out, &ctx).unwrap();
        assert_eq!(out.as_str(), "init(3);done();");
    }

    #[test]
    fn imports_render_as_elements() {
        let js: HeadElement = JsImport::new("/a.js").with_attribute("charset", "UTF-8").into();
        let css: HeadElement = CssImport::new("/a.css").into();
        assert_eq!(
            render(&js),
            "<script type=\"text/javascript\" src=\"/a.js\" charset=\"UTF-8\"></script>"
        );
        assert_eq!(
            render(&css),
            "<link type=\"text/css\" rel=\"stylesheet\" href=\"/a.css\"/>"
        );
    }
}
