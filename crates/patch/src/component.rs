//! The minimal component contract the patch layer needs from the host's
//! rendering layer, plus [`Control`], a plain element-backed component.
//!
//! Components are shared (`Rc`) because a stateful host keeps them between
//! requests while commands embed them for rendering. All methods take `&self`;
//! mutable state lives behind `RefCell` in implementations that need it.

use crate::element::{HeadElement, HeadElements};
use crate::markup::MarkupBuffer;
use std::cell::{RefCell, RefMut};
use std::fmt;
use std::rc::Rc;

pub trait Component {
    /// Short type label used in diagnostics (`"link"`, `"form"`, ..).
    fn kind(&self) -> &str;

    fn id(&self) -> Option<String>;

    fn name(&self) -> Option<String>;

    /// Selector addressing this component in the browser page.
    fn css_selector(&self) -> Option<String> {
        selector_for(None, self.id().as_deref(), self.name().as_deref())
    }

    /// Head elements declared by this component alone.
    fn head_elements(&self) -> HeadElements;

    /// Child components; empty for leaves.
    fn children(&self) -> Vec<Rc<dyn Component>> {
        Vec::new()
    }

    fn render(&self, out: &mut MarkupBuffer);
}

impl fmt::Debug for dyn Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Component")
            .field("kind", &self.kind())
            .field("id", &self.id())
            .field("name", &self.name())
            .finish()
    }
}

/// `#id` when an id exists, otherwise `tag[name='..']` (or `[name='..']`).
pub fn selector_for(tag: Option<&str>, id: Option<&str>, name: Option<&str>) -> Option<String> {
    if let Some(id) = id.filter(|s| !s.trim().is_empty()) {
        return Some(format!("#{id}"));
    }
    let name = name.filter(|s| !s.trim().is_empty())?;
    Some(format!("{}[name='{name}']", tag.unwrap_or("")))
}

/// Renders a component into a fresh string.
pub fn render_to_string(component: &dyn Component) -> String {
    let mut out = MarkupBuffer::new();
    component.render(&mut out);
    out.into_string()
}

/// Element-backed component: a tag with attributes, optional text and
/// children.
pub struct Control {
    kind: String,
    tag: String,
    id: Option<String>,
    name: Option<String>,
    attributes: Vec<(String, String)>,
    text: RefCell<Option<String>>,
    head: RefCell<HeadElements>,
    children: RefCell<Vec<Rc<dyn Component>>>,
}

impl Control {
    pub fn new(tag: impl Into<String>) -> Self {
        let tag = tag.into();
        Self {
            kind: tag.clone(),
            tag,
            id: None,
            name: None,
            attributes: Vec::new(),
            text: RefCell::new(None),
            head: RefCell::new(HeadElements::new()),
            children: RefCell::new(Vec::new()),
        }
    }

    pub fn kind_label(mut self, kind: impl Into<String>) -> Self {
        self.kind = kind.into();
        self
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.push((name.into(), value.into()));
        self
    }

    pub fn with_text(self, text: impl Into<String>) -> Self {
        *self.text.borrow_mut() = Some(text.into());
        self
    }

    pub fn with_child(self, child: Rc<dyn Component>) -> Self {
        self.children.borrow_mut().push(child);
        self
    }

    pub fn with_head_element(self, element: impl Into<HeadElement>) -> Self {
        self.head.borrow_mut().add(element);
        self
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn text(&self) -> Option<String> {
        self.text.borrow().clone()
    }

    pub fn set_text(&self, text: impl Into<String>) {
        *self.text.borrow_mut() = Some(text.into());
    }

    pub fn add_child(&self, child: Rc<dyn Component>) {
        self.children.borrow_mut().push(child);
    }

    pub fn head_mut(&self) -> RefMut<'_, HeadElements> {
        self.head.borrow_mut()
    }

    /// Moves the head list out so it can be edited while `self` is borrowed
    /// elsewhere; pair with [`Control::restore_head`].
    pub fn take_head(&self) -> HeadElements {
        std::mem::take(&mut *self.head.borrow_mut())
    }

    pub fn restore_head(&self, head: HeadElements) {
        *self.head.borrow_mut() = head;
    }
}

impl Component for Control {
    fn kind(&self) -> &str {
        &self.kind
    }

    fn id(&self) -> Option<String> {
        self.id.clone()
    }

    fn name(&self) -> Option<String> {
        self.name.clone()
    }

    fn css_selector(&self) -> Option<String> {
        selector_for(Some(&self.tag), self.id.as_deref(), self.name.as_deref())
    }

    fn head_elements(&self) -> HeadElements {
        self.head.borrow().clone()
    }

    fn children(&self) -> Vec<Rc<dyn Component>> {
        self.children.borrow().clone()
    }

    fn render(&self, out: &mut MarkupBuffer) {
        out.element_start(&self.tag);
        out.append_attribute("id", self.id.as_deref());
        out.append_attribute("name", self.name.as_deref());
        for (name, value) in &self.attributes {
            out.append_attribute(name, Some(value));
        }
        out.close_tag();
        if let Some(text) = self.text.borrow().as_deref() {
            out.append_escaped(text);
        }
        for child in self.children.borrow().iter() {
            child.render(out);
        }
        out.element_end(&self.tag);
    }
}

impl fmt::Debug for Control {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Control")
            .field("kind", &self.kind)
            .field("id", &self.id)
            .field("name", &self.name)
            .field("children", &self.children.borrow().len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::JsImport;

    #[test]
    fn selector_prefers_id_then_name() {
        assert_eq!(selector_for(None, Some("a"), Some("b")).as_deref(), Some("#a"));
        assert_eq!(
            selector_for(Some("input"), None, Some("b")).as_deref(),
            Some("input[name='b']")
        );
        assert_eq!(selector_for(None, Some("  "), None), None);
    }

    #[test]
    fn control_renders_text_and_children() {
        let child: Rc<dyn Component> = Rc::new(Control::new("b").with_text("x < y"));
        let span = Control::new("span")
            .with_id("s1")
            .with_attribute("class", "note")
            .with_child(child);
        assert_eq!(
            render_to_string(&span),
            "<span id=\"s1\" class=\"note\"><b>x &lt; y</b></span>"
        );
    }

    #[test]
    fn take_and_restore_head() {
        let control = Control::new("div").with_head_element(JsImport::new("/a.js"));
        let mut head = control.take_head();
        assert!(control.head_elements().is_empty());
        head.add(JsImport::new("/b.js"));
        control.restore_head(head);
        assert_eq!(control.head_elements().len(), 2);
    }
}
