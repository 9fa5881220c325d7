//! A single DOM mutation of a patch batch.
//!
//! Wire form: the operation is the element name, `select`, `name`, `value`
//! and `arg1..argN` are attributes, the payload is the element body. Every
//! payload item is followed by a newline. The body is wrapped in CDATA when
//! `raw_block` is set, or for an `eval` with a non-empty payload.

use crate::component::Component;
use crate::element::HeadElement;
use crate::error::PatchError;
use crate::markup::MarkupBuffer;
use crate::template::RenderContext;
use std::rc::Rc;

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Operation {
    Replace,
    ReplaceContent,
    Append,
    Prepend,
    Before,
    After,
    Remove,
    Empty,
    Show,
    Hide,
    AddClass,
    RemoveClass,
    Attr,
    Css,
    Wrap,
    Eval,
    Custom,
    AddHeader,
    /// Any other method understood by the client plugin, by tag name.
    Other(String),
}

impl Operation {
    pub fn tag(&self) -> &str {
        match self {
            Operation::Replace => "replace",
            Operation::ReplaceContent => "replaceContent",
            Operation::Append => "append",
            Operation::Prepend => "prepend",
            Operation::Before => "before",
            Operation::After => "after",
            Operation::Remove => "remove",
            Operation::Empty => "empty",
            Operation::Show => "show",
            Operation::Hide => "hide",
            Operation::AddClass => "addClass",
            Operation::RemoveClass => "removeClass",
            Operation::Attr => "attr",
            Operation::Css => "css",
            Operation::Wrap => "wrap",
            Operation::Eval => "eval",
            Operation::Custom => "custom",
            Operation::AddHeader => "addHeader",
            Operation::Other(tag) => tag,
        }
    }

    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "replace" => Operation::Replace,
            "replaceContent" => Operation::ReplaceContent,
            "append" => Operation::Append,
            "prepend" => Operation::Prepend,
            "before" => Operation::Before,
            "after" => Operation::After,
            "remove" => Operation::Remove,
            "empty" => Operation::Empty,
            "show" => Operation::Show,
            "hide" => Operation::Hide,
            "addClass" => Operation::AddClass,
            "removeClass" => Operation::RemoveClass,
            "attr" => Operation::Attr,
            "css" => Operation::Css,
            "wrap" => Operation::Wrap,
            "eval" => Operation::Eval,
            "custom" => Operation::Custom,
            "addHeader" => Operation::AddHeader,
            other => Operation::Other(other.to_string()),
        }
    }

    /// Eval, custom and addHeader act on the document as a whole.
    pub fn requires_selector(&self) -> bool {
        !matches!(
            self,
            Operation::Eval | Operation::Custom | Operation::AddHeader
        )
    }
}

#[derive(Clone, Debug)]
pub enum PayloadItem {
    Text(String),
    Component(Rc<dyn Component>),
    Resource(HeadElement),
}

#[derive(Clone, Debug)]
pub struct Command {
    operation: Operation,
    selector: Option<String>,
    name: Option<String>,
    value: Option<String>,
    arguments: Vec<String>,
    payload: Vec<PayloadItem>,
    raw_block: bool,
}

impl Command {
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            selector: None,
            name: None,
            value: None,
            arguments: Vec::new(),
            payload: Vec::new(),
            raw_block: false,
        }
    }

    pub fn with_selector(operation: Operation, selector: impl Into<String>) -> Self {
        let mut command = Self::new(operation);
        command.selector = Some(selector.into());
        command
    }

    pub fn with_text(
        operation: Operation,
        selector: impl Into<String>,
        text: impl Into<String>,
    ) -> Self {
        let mut command = Self::with_selector(operation, selector);
        command.payload.push(PayloadItem::Text(text.into()));
        command
    }

    /// Embeds `component`, targeting it by its own selector.
    pub fn for_component(
        operation: Operation,
        component: Rc<dyn Component>,
    ) -> Result<Self, PatchError> {
        let mut command = Self::new(operation);
        command.add_component(component)?;
        Ok(command)
    }

    pub fn with_component(
        operation: Operation,
        selector: impl Into<String>,
        component: Rc<dyn Component>,
    ) -> Self {
        let mut command = Self::with_selector(operation, selector);
        command.payload.push(PayloadItem::Component(component));
        command
    }

    pub fn with_resource(
        operation: Operation,
        selector: Option<String>,
        resource: impl Into<HeadElement>,
    ) -> Self {
        let mut command = Self::new(operation);
        command.selector = selector;
        command.payload.push(PayloadItem::Resource(resource.into()));
        command
    }

    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    pub fn tag(&self) -> &str {
        self.operation.tag()
    }

    pub fn is(&self, operation: &Operation) -> bool {
        &self.operation == operation
    }

    pub fn selector(&self) -> Option<&str> {
        self.selector.as_deref()
    }

    pub fn set_selector(&mut self, selector: impl Into<String>) -> &mut Self {
        self.selector = Some(selector.into());
        self
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn set_name(&mut self, name: impl Into<String>) -> &mut Self {
        self.name = Some(name.into());
        self
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn set_value(&mut self, value: impl Into<String>) -> &mut Self {
        self.value = Some(value.into());
        self
    }

    pub fn raw_block(&self) -> bool {
        self.raw_block
    }

    pub fn set_raw_block(&mut self, raw_block: bool) -> &mut Self {
        self.raw_block = raw_block;
        self
    }

    pub fn arguments(&self) -> &[String] {
        &self.arguments
    }

    pub fn has_arguments(&self) -> bool {
        !self.arguments.is_empty()
    }

    pub fn add_argument(&mut self, value: impl Into<String>) -> &mut Self {
        self.arguments.push(value.into());
        self
    }

    /// Pushes `name` then `value` as two positional arguments.
    pub fn add_named_argument(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> &mut Self {
        self.arguments.push(name.into());
        self.arguments.push(value.into());
        self
    }

    pub fn extend_arguments<I, S>(&mut self, values: I) -> &mut Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.arguments.extend(values.into_iter().map(Into::into));
        self
    }

    /// Removes the first argument equal to `value`.
    pub fn remove_argument(&mut self, value: &str) -> &mut Self {
        if let Some(pos) = self.arguments.iter().position(|a| a == value) {
            self.arguments.remove(pos);
        }
        self
    }

    pub fn payload(&self) -> &[PayloadItem] {
        &self.payload
    }

    pub fn payload_mut(&mut self) -> &mut Vec<PayloadItem> {
        &mut self.payload
    }

    pub fn add_text(&mut self, text: impl Into<String>) -> &mut Self {
        let len = self.payload.len();
        self.insert_text(len, text)
    }

    pub fn add_component(&mut self, component: Rc<dyn Component>) -> Result<&mut Self, PatchError> {
        let len = self.payload.len();
        self.insert_component(len, component)
    }

    pub fn add_resource(&mut self, resource: impl Into<HeadElement>) -> &mut Self {
        let len = self.payload.len();
        self.insert_resource(len, resource)
    }

    pub fn insert_text(&mut self, index: usize, text: impl Into<String>) -> &mut Self {
        let index = index.min(self.payload.len());
        self.payload.insert(index, PayloadItem::Text(text.into()));
        self
    }

    /// Inserts `component`; an unset selector is derived from it.
    pub fn insert_component(
        &mut self,
        index: usize,
        component: Rc<dyn Component>,
    ) -> Result<&mut Self, PatchError> {
        if self.selector.is_none() {
            self.selector = Some(selector_of(component.as_ref())?);
        }
        let index = index.min(self.payload.len());
        self.payload.insert(index, PayloadItem::Component(component));
        Ok(self)
    }

    pub fn insert_resource(&mut self, index: usize, resource: impl Into<HeadElement>) -> &mut Self {
        let index = index.min(self.payload.len());
        self.payload
            .insert(index, PayloadItem::Resource(resource.into()));
        self
    }

    pub fn remove_text(&mut self, text: &str) -> bool {
        self.remove_first(|item| matches!(item, PayloadItem::Text(t) if t == text))
    }

    /// Removes the payload entry holding this very component instance.
    pub fn remove_component(&mut self, component: &Rc<dyn Component>) -> bool {
        self.remove_first(|item| {
            matches!(item, PayloadItem::Component(c) if Rc::ptr_eq(c, component))
        })
    }

    pub fn remove_resource(&mut self, resource: &HeadElement) -> bool {
        self.remove_first(|item| {
            matches!(item, PayloadItem::Resource(r) if r.same_resource(resource))
        })
    }

    fn remove_first(&mut self, pred: impl Fn(&PayloadItem) -> bool) -> bool {
        match self.payload.iter().position(pred) {
            Some(pos) => {
                self.payload.remove(pos);
                true
            }
            None => false,
        }
    }

    pub fn render(
        &self,
        out: &mut MarkupBuffer,
        ctx: &RenderContext<'_>,
    ) -> Result<(), PatchError> {
        let tag = self.tag();
        out.element_start(tag);
        out.append_attribute("select", self.selector.as_deref());
        out.append_attribute("name", self.name.as_deref());
        out.append_attribute("value", self.value.as_deref());
        for (i, arg) in self.arguments.iter().enumerate() {
            out.append_attribute(&format!("arg{}", i + 1), Some(arg));
        }

        if self.payload.is_empty() {
            out.element_end_empty();
            return Ok(());
        }

        out.close_tag();
        self.render_payload(out, ctx)?;
        out.element_end(tag);
        Ok(())
    }

    pub fn render_to_string(&self, ctx: &RenderContext<'_>) -> Result<String, PatchError> {
        let mut out = MarkupBuffer::with_capacity(self.payload.len() * 64 + 50);
        self.render(&mut out, ctx)?;
        Ok(out.into_string())
    }

    fn render_payload(
        &self,
        out: &mut MarkupBuffer,
        ctx: &RenderContext<'_>,
    ) -> Result<(), PatchError> {
        let is_eval = self.operation == Operation::Eval;
        let wrap = self.raw_block || is_eval;
        if !wrap {
            for item in &self.payload {
                match item {
                    PayloadItem::Text(text) => out.append(text),
                    PayloadItem::Component(component) => component.render(out),
                    PayloadItem::Resource(resource) => resource.render(out, ctx)?,
                }
                out.append_char('\n');
            }
            return Ok(());
        }

        // CDATA must open right after the start tag; some clients reject
        // whitespace in between.
        let mut body = MarkupBuffer::new();
        for item in &self.payload {
            match item {
                PayloadItem::Text(text) => body.append(text),
                PayloadItem::Component(component) => component.render(&mut body),
                PayloadItem::Resource(HeadElement::JsScript(script)) if is_eval => {
                    script.render_body(&mut body, ctx)?;
                }
                PayloadItem::Resource(HeadElement::JsScript(script)) => {
                    let mut plain = script.clone();
                    plain.character_data = false;
                    HeadElement::JsScript(plain).render(&mut body, ctx)?;
                }
                PayloadItem::Resource(resource) => resource.render(&mut body, ctx)?,
            }
            body.append_char('\n');
        }
        out.begin_cdata();
        out.append_char(' ');
        out.append_cdata_text(body.as_str());
        out.append_char(' ');
        out.end_cdata();
        Ok(())
    }
}

pub(crate) fn selector_of(component: &dyn Component) -> Result<String, PatchError> {
    component
        .css_selector()
        .ok_or_else(|| PatchError::MissingSelector {
            kind: component.kind().to_string(),
            name: component.name(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Control;
    use crate::element::JsScript;

    fn render(command: &Command) -> String {
        command.render_to_string(&RenderContext::new()).unwrap()
    }

    #[test]
    fn empty_payload_renders_self_closing() {
        let mut command = Command::with_selector(Operation::Remove, "#row-3");
        command.add_argument("slow");
        assert_eq!(render(&command), "<remove select=\"#row-3\" arg1=\"slow\"/>");
    }

    #[test]
    fn arguments_keep_order_and_duplicates() {
        let mut command = Command::with_selector(Operation::Attr, "#a");
        command
            .add_named_argument("title", "x")
            .add_argument("title")
            .extend_arguments(["y", "x"]);
        assert_eq!(command.arguments(), ["title", "x", "title", "y", "x"]);
        command.remove_argument("x");
        assert_eq!(command.arguments(), ["title", "title", "y", "x"]);
    }

    #[test]
    fn text_payload_is_written_verbatim() {
        let command = Command::with_text(Operation::ReplaceContent, "#span1", "<b>Hello</b>");
        assert_eq!(
            render(&command),
            "<replaceContent select=\"#span1\"><b>Hello</b>\n</replaceContent>"
        );
    }

    #[test]
    fn component_payload_derives_selector() {
        let control: Rc<dyn Component> =
            Rc::new(Control::new("div").with_id("box").with_text("hi"));
        let command = Command::for_component(Operation::Replace, control).unwrap();
        assert_eq!(command.selector(), Some("#box"));
        assert_eq!(
            render(&command),
            "<replace select=\"#box\"><div id=\"box\">hi</div>\n</replace>"
        );
    }

    #[test]
    fn component_without_id_or_name_has_no_selector() {
        let control: Rc<dyn Component> = Rc::new(Control::new("div"));
        let err = Command::for_component(Operation::Replace, control).unwrap_err();
        assert!(matches!(err, PatchError::MissingSelector { .. }));
    }

    #[test]
    fn eval_wraps_payload_and_renders_script_bodies_only() {
        let mut command = Command::new(Operation::Eval);
        command.add_text("if (a && b) { go(); }");
        command.add_resource(JsScript::with_content("done();").id("x"));
        assert_eq!(
            render(&command),
            "<eval><![CDATA[ if (a && b) { go(); }\ndone();\n ]]></eval>"
        );
    }

    #[test]
    fn raw_block_protects_markup() {
        let mut command = Command::with_text(Operation::Custom, "ignored", "<x>]]></x>");
        command.set_raw_block(true);
        assert_eq!(
            render(&command),
            "<custom select=\"ignored\"><![CDATA[ <x>]]]]><![CDATA[></x>\n ]]></custom>"
        );
    }

    #[test]
    fn remove_component_uses_instance_identity() {
        let a: Rc<dyn Component> = Rc::new(Control::new("i").with_id("a"));
        let twin: Rc<dyn Component> = Rc::new(Control::new("i").with_id("a"));
        let mut command = Command::for_component(Operation::Append, a.clone()).unwrap();
        assert!(!command.remove_component(&twin));
        assert!(command.remove_component(&a));
        assert!(command.payload().is_empty());
    }

    #[test]
    fn tags_round_trip_through_from_tag() {
        for op in [
            Operation::ReplaceContent,
            Operation::AddHeader,
            Operation::Other("fadeIn".into()),
        ] {
            assert_eq!(Operation::from_tag(op.tag()), op);
        }
        assert!(!Operation::Eval.requires_selector());
        assert!(Operation::Hide.requires_selector());
    }
}
