//! Head-resource collection over component subtrees.
//!
//! Contract:
//! - Walk order is depth-first: a component's own head elements, then each
//!   child's subtree in order.
//! - Imports are unique by URL, inline resources by id; inline resources
//!   without id are always kept.
//! - Collection is pure: every call returns a fresh set and callers merge.
//! - Structural resources are stylesheets and styles followed by script
//!   imports; executable resources are inline scripts.

use crate::component::Component;
use crate::element::{HeadElement, HeadElements};
use core_types::ResourceKind;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ResourceSet {
    styles: Vec<HeadElement>,
    script_imports: Vec<HeadElement>,
    scripts: Vec<HeadElement>,
}

impl ResourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn collect(component: &dyn Component) -> Self {
        let mut set = Self::new();
        for element in component.head_elements() {
            set.add(element);
        }
        for child in component.children() {
            set.merge(Self::collect(child.as_ref()));
        }
        set
    }

    fn bucket_mut(&mut self, kind: ResourceKind) -> &mut Vec<HeadElement> {
        match kind {
            ResourceKind::JsImport => &mut self.script_imports,
            kind if kind.is_structural() => &mut self.styles,
            _ => &mut self.scripts,
        }
    }

    /// Adds `element` unless a resource with the same identity is already
    /// present. Returns whether it was added.
    pub fn add(&mut self, element: HeadElement) -> bool {
        let bucket = self.bucket_mut(element.kind());
        if bucket.iter().any(|e| e.same_resource(&element)) {
            return false;
        }
        bucket.push(element);
        true
    }

    pub fn merge(&mut self, other: ResourceSet) {
        let ResourceSet {
            styles,
            script_imports,
            scripts,
        } = other;
        for element in styles.into_iter().chain(script_imports).chain(scripts) {
            self.add(element);
        }
    }

    pub fn contains(&self, element: &HeadElement) -> bool {
        self.iter().any(|e| e.same_resource(element))
    }

    /// Drops everything the browser page already has. DOM-ready scripts are
    /// kept: they must run again for re-rendered markup. Returns how many
    /// resources were dropped.
    pub fn exclude_present(&mut self, known: &HeadElements) -> usize {
        if known.is_empty() {
            return 0;
        }
        let mut dropped = 0;
        for bucket in [&mut self.styles, &mut self.script_imports, &mut self.scripts] {
            bucket.retain(|element| {
                let present = !runs_on_dom_ready(element)
                    && element
                        .client_key()
                        .is_some_and(|key| known.contains_key(&key));
                if present {
                    log::debug!(target: "patch.resources", "already on page: {:?}", element.key());
                    dropped += 1;
                }
                !present
            });
        }
        dropped
    }

    pub fn iter(&self) -> impl Iterator<Item = &HeadElement> {
        self.styles
            .iter()
            .chain(self.script_imports.iter())
            .chain(self.scripts.iter())
    }

    pub fn structural(&self) -> impl Iterator<Item = &HeadElement> {
        self.styles.iter().chain(self.script_imports.iter())
    }

    pub fn executable(&self) -> impl Iterator<Item = &HeadElement> {
        self.scripts.iter()
    }

    pub fn structural_len(&self) -> usize {
        self.styles.len() + self.script_imports.len()
    }

    pub fn executable_len(&self) -> usize {
        self.scripts.len()
    }

    pub fn len(&self) -> usize {
        self.structural_len() + self.executable_len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Splits into `(structural, executable)`.
    pub fn into_parts(self) -> (Vec<HeadElement>, Vec<HeadElement>) {
        let mut structural = self.styles;
        structural.extend(self.script_imports);
        (structural, self.scripts)
    }
}

fn runs_on_dom_ready(element: &HeadElement) -> bool {
    matches!(element, HeadElement::JsScript(script) if script.execute_on_dom_ready)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Control;
    use crate::element::{CssImport, CssStyle, JsImport, JsScript};
    use std::rc::Rc;

    fn idents(elements: &[HeadElement]) -> Vec<String> {
        elements
            .iter()
            .map(|e| e.key().map(|k| k.ident).unwrap_or_else(|| "<anon>".into()))
            .collect()
    }

    #[test]
    fn container_contributes_own_then_descendant_resources() {
        let leaf: Rc<dyn Component> = Rc::new(
            Control::new("span")
                .with_head_element(JsImport::new("/leaf.js"))
                .with_head_element(JsImport::new("/shared.js")),
        );
        let mid: Rc<dyn Component> = Rc::new(
            Control::new("div")
                .with_head_element(CssImport::new("/mid.css"))
                .with_child(leaf),
        );
        let root = Control::new("form")
            .with_head_element(JsImport::new("/shared.js"))
            .with_child(mid);

        let (structural, executable) = ResourceSet::collect(&root).into_parts();
        assert_eq!(idents(&structural), ["/mid.css", "/shared.js", "/leaf.js"]);
        assert!(executable.is_empty());
    }

    #[test]
    fn inline_resources_dedup_by_id_only() {
        let mut set = ResourceSet::new();
        assert!(set.add(JsScript::with_content("a()").id("a").into()));
        assert!(!set.add(JsScript::with_content("other()").id("a").into()));
        assert!(set.add(JsScript::with_content("b()").into()));
        assert!(set.add(JsScript::with_content("b()").into()));
        assert!(set.add(CssStyle::with_content("p{}").id("a").into()));
        assert_eq!(set.executable_len(), 3);
        assert_eq!(set.structural_len(), 1);
    }

    #[test]
    fn presence_check_skips_anonymous_and_hidden_ids() {
        let mut known = HeadElements::new();
        known.add(JsImport::new("/lib.js"));
        known.add(JsScript::with_content("x").id("seen"));
        known.add(JsScript::with_content("y").id("setup"));

        let mut set = ResourceSet::new();
        set.add(JsImport::new("/lib.js").into());
        set.add(JsImport::new("/new.js").into());
        set.add(JsScript::with_content("x").id("seen").into());
        set.add(JsScript::with_content("y2").id("setup").render_id(false).into());
        set.add(JsScript::with_content("anon").into());

        assert_eq!(set.exclude_present(&known), 2);
        let (structural, executable) = set.into_parts();
        assert_eq!(idents(&structural), ["/new.js"]);
        assert_eq!(idents(&executable), ["setup", "<anon>"]);
    }

    #[test]
    fn presence_check_keeps_dom_ready_scripts() {
        let mut known = HeadElements::new();
        known.add(JsScript::with_content("init()").id("init").dom_ready(true));

        let mut set = ResourceSet::new();
        set.add(JsScript::with_content("init()").id("init").dom_ready(true).into());

        assert_eq!(set.exclude_present(&known), 0);
        assert_eq!(set.executable_len(), 1);
    }
}
