//! Patch batch: ordered commands plus the finalize pass that gathers head
//! resources and reorders the batch.
//!
//! Zones after [`PatchBatch::finalize`]:
//! 1. leading `custom` commands, untouched
//! 2. one `addHeader` with stylesheets, styles and script imports
//! 3. the remaining commands in their original order
//! 4. one `addHeader` with inline scripts
//! 5. `eval` commands in their original order
//!
//! Empty header commands are omitted. `custom` commands are opaque and never
//! contribute resources; `addHeader` commands added by callers are consumed.

use crate::command::{selector_of, Command, Operation, PayloadItem};
use crate::component::Component;
use crate::element::{CssImport, CssStyle, HeadElement, HeadElements, JsImport, JsScript};
use crate::error::PatchError;
use crate::markup::MarkupBuffer;
use crate::resources::ResourceSet;
use crate::template::RenderContext;
use core_types::PATCH_CONTENT_TYPE;
use std::rc::Rc;

pub const ROOT_TAG: &str = "taconite";

/// Where a command is aimed: a literal selector or a component whose own
/// selector is used.
#[derive(Clone, Debug)]
pub enum Target {
    Selector(String),
    Component(Rc<dyn Component>),
}

impl Target {
    pub fn component<C: Component + 'static>(component: Rc<C>) -> Self {
        Target::Component(component)
    }

    fn resolve(&self) -> Result<String, PatchError> {
        match self {
            Target::Selector(selector) if selector.trim().is_empty() => {
                Err(PatchError::InvalidTarget("selector is blank"))
            }
            Target::Selector(selector) => Ok(selector.clone()),
            Target::Component(component) => selector_of(component.as_ref()),
        }
    }
}

impl From<&str> for Target {
    fn from(value: &str) -> Self {
        Target::Selector(value.to_string())
    }
}

impl From<String> for Target {
    fn from(value: String) -> Self {
        Target::Selector(value)
    }
}

impl From<Rc<dyn Component>> for Target {
    fn from(value: Rc<dyn Component>) -> Self {
        Target::Component(value)
    }
}

impl From<&Rc<dyn Component>> for Target {
    fn from(value: &Rc<dyn Component>) -> Self {
        Target::Component(Rc::clone(value))
    }
}

#[derive(Clone, Debug)]
pub enum Content {
    Text(String),
    Component(Rc<dyn Component>),
    Resource(HeadElement),
}

impl Content {
    pub fn component<C: Component + 'static>(component: Rc<C>) -> Self {
        Content::Component(component)
    }

    fn into_payload(self) -> Result<PayloadItem, PatchError> {
        match self {
            Content::Text(text) if text.trim().is_empty() => {
                Err(PatchError::InvalidContent("content is blank"))
            }
            Content::Text(text) => Ok(PayloadItem::Text(text)),
            Content::Component(component) => Ok(PayloadItem::Component(component)),
            Content::Resource(resource) => Ok(PayloadItem::Resource(resource)),
        }
    }
}

impl From<&str> for Content {
    fn from(value: &str) -> Self {
        Content::Text(value.to_string())
    }
}

impl From<String> for Content {
    fn from(value: String) -> Self {
        Content::Text(value)
    }
}

impl From<Rc<dyn Component>> for Content {
    fn from(value: Rc<dyn Component>) -> Self {
        Content::Component(value)
    }
}

impl From<&Rc<dyn Component>> for Content {
    fn from(value: &Rc<dyn Component>) -> Self {
        Content::Component(Rc::clone(value))
    }
}

impl From<HeadElement> for Content {
    fn from(value: HeadElement) -> Self {
        Content::Resource(value)
    }
}

impl From<JsScript> for Content {
    fn from(value: JsScript) -> Self {
        Content::Resource(value.into())
    }
}

impl From<JsImport> for Content {
    fn from(value: JsImport) -> Self {
        Content::Resource(value.into())
    }
}

impl From<CssStyle> for Content {
    fn from(value: CssStyle) -> Self {
        Content::Resource(value.into())
    }
}

impl From<CssImport> for Content {
    fn from(value: CssImport) -> Self {
        Content::Resource(value.into())
    }
}

#[derive(Debug, Default)]
pub struct PatchBatch {
    commands: Vec<Command>,
    suppress_resource_processing: bool,
    known_resources: HeadElements,
    finalized: bool,
}

impl PatchBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[Command] {
        &self.commands
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    pub fn suppress_resource_processing(&self) -> bool {
        self.suppress_resource_processing
    }

    /// Skips resource collection and reordering in [`PatchBatch::finalize`].
    pub fn set_suppress_resource_processing(&mut self, suppress: bool) {
        self.suppress_resource_processing = suppress;
    }

    pub fn known_resources(&self) -> &HeadElements {
        &self.known_resources
    }

    /// Resources the browser page already has; they are left out of the
    /// synthesized header commands.
    pub fn set_known_resources(&mut self, known: HeadElements) {
        self.known_resources = known;
    }

    pub fn content_type(&self) -> &'static str {
        PATCH_CONTENT_TYPE
    }

    pub fn add(&mut self, command: Command) -> Result<&mut Command, PatchError> {
        let len = self.commands.len();
        self.insert(len, command)
    }

    /// Inserts at `index`, clamped to the current length.
    pub fn insert(&mut self, index: usize, command: Command) -> Result<&mut Command, PatchError> {
        check_selector(&command)?;
        let index = index.min(self.commands.len());
        self.commands.insert(index, command);
        Ok(&mut self.commands[index])
    }

    pub fn remove(&mut self, index: usize) -> Option<Command> {
        (index < self.commands.len()).then(|| self.commands.remove(index))
    }

    fn push(&mut self, command: Command) -> &mut Command {
        let index = self.commands.len();
        self.commands.push(command);
        &mut self.commands[index]
    }

    pub fn create(
        &mut self,
        operation: Operation,
        target: impl Into<Target>,
    ) -> Result<&mut Command, PatchError> {
        let selector = target.into().resolve()?;
        Ok(self.push(Command::with_selector(operation, selector)))
    }

    pub fn create_with_content(
        &mut self,
        operation: Operation,
        target: impl Into<Target>,
        content: impl Into<Content>,
    ) -> Result<&mut Command, PatchError> {
        let selector = target.into().resolve()?;
        let item = content.into().into_payload()?;
        let mut command = Command::with_selector(operation, selector);
        command.payload_mut().push(item);
        Ok(self.push(command))
    }

    fn create_self(
        &mut self,
        operation: Operation,
        component: Rc<dyn Component>,
    ) -> Result<&mut Command, PatchError> {
        let command = Command::for_component(operation, component)?;
        Ok(self.push(command))
    }

    pub fn replace(
        &mut self,
        target: impl Into<Target>,
        content: impl Into<Content>,
    ) -> Result<&mut Command, PatchError> {
        self.create_with_content(Operation::Replace, target, content)
    }

    /// Replaces `component` in the page with its current rendering.
    pub fn replace_self(
        &mut self,
        component: Rc<dyn Component>,
    ) -> Result<&mut Command, PatchError> {
        self.create_self(Operation::Replace, component)
    }

    pub fn replace_content(
        &mut self,
        target: impl Into<Target>,
        content: impl Into<Content>,
    ) -> Result<&mut Command, PatchError> {
        self.create_with_content(Operation::ReplaceContent, target, content)
    }

    pub fn replace_content_self(
        &mut self,
        component: Rc<dyn Component>,
    ) -> Result<&mut Command, PatchError> {
        self.create_self(Operation::ReplaceContent, component)
    }

    pub fn append(
        &mut self,
        target: impl Into<Target>,
        content: impl Into<Content>,
    ) -> Result<&mut Command, PatchError> {
        self.create_with_content(Operation::Append, target, content)
    }

    pub fn prepend(
        &mut self,
        target: impl Into<Target>,
        content: impl Into<Content>,
    ) -> Result<&mut Command, PatchError> {
        self.create_with_content(Operation::Prepend, target, content)
    }

    pub fn before(
        &mut self,
        target: impl Into<Target>,
        content: impl Into<Content>,
    ) -> Result<&mut Command, PatchError> {
        self.create_with_content(Operation::Before, target, content)
    }

    pub fn after(
        &mut self,
        target: impl Into<Target>,
        content: impl Into<Content>,
    ) -> Result<&mut Command, PatchError> {
        self.create_with_content(Operation::After, target, content)
    }

    pub fn wrap(
        &mut self,
        target: impl Into<Target>,
        content: impl Into<Content>,
    ) -> Result<&mut Command, PatchError> {
        self.create_with_content(Operation::Wrap, target, content)
    }

    pub fn remove_target(&mut self, target: impl Into<Target>) -> Result<&mut Command, PatchError> {
        self.create(Operation::Remove, target)
    }

    pub fn empty(&mut self, target: impl Into<Target>) -> Result<&mut Command, PatchError> {
        self.create(Operation::Empty, target)
    }

    pub fn show(&mut self, target: impl Into<Target>) -> Result<&mut Command, PatchError> {
        self.create(Operation::Show, target)
    }

    pub fn hide(&mut self, target: impl Into<Target>) -> Result<&mut Command, PatchError> {
        self.create(Operation::Hide, target)
    }

    pub fn attr(
        &mut self,
        target: impl Into<Target>,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<&mut Command, PatchError> {
        self.named(Operation::Attr, target, name.into(), value.into())
    }

    pub fn css(
        &mut self,
        target: impl Into<Target>,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<&mut Command, PatchError> {
        self.named(Operation::Css, target, name.into(), value.into())
    }

    /// Sets several attributes at once; each pair becomes two arguments.
    pub fn attr_pairs<I, K, V>(
        &mut self,
        target: impl Into<Target>,
        pairs: I,
    ) -> Result<&mut Command, PatchError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.pairs(Operation::Attr, target, pairs)
    }

    pub fn css_pairs<I, K, V>(
        &mut self,
        target: impl Into<Target>,
        pairs: I,
    ) -> Result<&mut Command, PatchError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        self.pairs(Operation::Css, target, pairs)
    }

    pub fn add_class(
        &mut self,
        target: impl Into<Target>,
        class: impl Into<String>,
    ) -> Result<&mut Command, PatchError> {
        self.classes(Operation::AddClass, target, [class.into()])
    }

    pub fn remove_class(
        &mut self,
        target: impl Into<Target>,
        class: impl Into<String>,
    ) -> Result<&mut Command, PatchError> {
        self.classes(Operation::RemoveClass, target, [class.into()])
    }

    pub fn add_classes<I, S>(
        &mut self,
        target: impl Into<Target>,
        classes: I,
    ) -> Result<&mut Command, PatchError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.classes(Operation::AddClass, target, classes)
    }

    pub fn remove_classes<I, S>(
        &mut self,
        target: impl Into<Target>,
        classes: I,
    ) -> Result<&mut Command, PatchError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.classes(Operation::RemoveClass, target, classes)
    }

    fn named(
        &mut self,
        operation: Operation,
        target: impl Into<Target>,
        name: String,
        value: String,
    ) -> Result<&mut Command, PatchError> {
        let command = self.create(operation, target)?;
        command.set_name(name).set_value(value);
        Ok(command)
    }

    fn pairs<I, K, V>(
        &mut self,
        operation: Operation,
        target: impl Into<Target>,
        pairs: I,
    ) -> Result<&mut Command, PatchError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let command = self.create(operation, target)?;
        for (name, value) in pairs {
            command.add_named_argument(name, value);
        }
        Ok(command)
    }

    fn classes<I, S>(
        &mut self,
        operation: Operation,
        target: impl Into<Target>,
        classes: I,
    ) -> Result<&mut Command, PatchError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let command = self.create(operation, target)?;
        command.extend_arguments(classes);
        Ok(command)
    }

    /// Passes `content` through untouched: no resource collection, and a
    /// leading run of custom commands keeps its place at the front.
    pub fn custom(&mut self, content: impl Into<Content>) -> Result<&mut Command, PatchError> {
        let item = content.into().into_payload()?;
        let mut command = Command::new(Operation::Custom);
        command.payload_mut().push(item);
        Ok(self.push(command))
    }

    pub fn eval(&mut self, script: impl Into<String>) -> Result<&mut Command, PatchError> {
        let script = script.into();
        if script.trim().is_empty() {
            return Err(PatchError::InvalidContent("script is blank"));
        }
        let mut command = Command::new(Operation::Eval);
        command.add_text(script);
        Ok(self.push(command))
    }

    /// Evaluates a script element's body, template expansion included.
    pub fn eval_script(&mut self, script: JsScript) -> Result<&mut Command, PatchError> {
        let mut command = Command::new(Operation::Eval);
        command.add_resource(script);
        Ok(self.push(command))
    }

    pub fn add_header<I, E>(&mut self, elements: I) -> Result<&mut Command, PatchError>
    where
        I: IntoIterator<Item = E>,
        E: Into<HeadElement>,
    {
        let mut command = Command::new(Operation::AddHeader);
        for element in elements {
            command.add_resource(element);
        }
        Ok(self.push(command))
    }

    /// Gathers head resources and reorders the batch into its zones. Runs
    /// once; a second call fails with [`PatchError::AlreadyFinalized`].
    pub fn finalize(&mut self) -> Result<(), PatchError> {
        if self.finalized {
            return Err(PatchError::AlreadyFinalized);
        }
        self.finalized = true;
        if self.suppress_resource_processing || self.commands.is_empty() {
            return Ok(());
        }

        let mut resources = ResourceSet::new();
        let mut kept = Vec::with_capacity(self.commands.len() + 2);
        let mut evals = Vec::new();
        for command in std::mem::take(&mut self.commands) {
            if command.is(&Operation::Eval) {
                evals.push(command);
                continue;
            }
            if command.is(&Operation::Custom) {
                kept.push(command);
                continue;
            }
            collect_payload(&command, &mut resources);
            if !command.is(&Operation::AddHeader) {
                kept.push(command);
            }
        }

        let dropped = resources.exclude_present(&self.known_resources);
        let (structural, executable) = resources.into_parts();
        let structural_len = structural.len();
        let executable_len = executable.len();

        let leading = kept
            .iter()
            .take_while(|c| c.is(&Operation::Custom))
            .count();
        if !structural.is_empty() {
            kept.insert(leading, structural_command(structural));
        }
        if !executable.is_empty() {
            kept.push(executable_command(executable));
        }
        let eval_len = evals.len();
        kept.extend(evals);
        self.commands = kept;

        log::debug!(
            target: "patch.batch",
            "finalized: custom={leading} structural={structural_len} \
             executable={executable_len} eval={eval_len} already_present={dropped} total={}",
            self.commands.len()
        );
        Ok(())
    }

    /// `<taconite>` root holding each command on its own line.
    pub fn render(&self, ctx: &RenderContext<'_>) -> Result<String, PatchError> {
        let mut out = MarkupBuffer::with_capacity(self.commands.len() * 64 + 150);
        out.element_start(ROOT_TAG);
        out.close_tag();
        out.append_char('\n');
        for command in &self.commands {
            command.render(&mut out, ctx)?;
            out.append_char('\n');
        }
        out.element_end(ROOT_TAG);
        Ok(out.into_string())
    }

    /// Finalizes (once) and renders.
    pub fn serialize(&mut self, ctx: &RenderContext<'_>) -> Result<String, PatchError> {
        if !self.finalized {
            self.finalize()?;
        }
        self.render(ctx)
    }
}

fn check_selector(command: &Command) -> Result<(), PatchError> {
    if !command.operation().requires_selector() {
        return Ok(());
    }
    match command.selector() {
        Some(selector) if !selector.trim().is_empty() => Ok(()),
        _ => Err(PatchError::InvalidTarget("command requires a selector")),
    }
}

fn collect_payload(command: &Command, resources: &mut ResourceSet) {
    for item in command.payload() {
        match item {
            PayloadItem::Component(component) => {
                resources.merge(ResourceSet::collect(component.as_ref()));
            }
            PayloadItem::Resource(resource) => {
                resources.add(resource.clone());
            }
            PayloadItem::Text(_) => {}
        }
    }
}

fn structural_command(elements: Vec<HeadElement>) -> Command {
    let mut command = Command::new(Operation::AddHeader);
    for mut element in elements {
        if let HeadElement::CssStyle(style) = &mut element {
            style.character_data = true;
        }
        command.add_resource(element);
    }
    command
}

/// Async responses never fire DOM-ready, so such scripts run immediately and
/// lose their id to get past the client's already-included check.
fn executable_command(elements: Vec<HeadElement>) -> Command {
    let mut command = Command::new(Operation::AddHeader);
    for mut element in elements {
        if let HeadElement::JsScript(script) = &mut element {
            script.character_data = true;
            if script.execute_on_dom_ready {
                script.execute_on_dom_ready = false;
                script.id = None;
            }
        }
        command.add_resource(element);
    }
    command
}
