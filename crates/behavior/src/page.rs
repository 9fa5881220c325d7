//! Minimal page host: components with their bindings, a head pass and
//! request dispatch.

use crate::binding::{ActionResult, HeadContext, InteractionBinding};
use crate::config::BehaviorConfig;
use crate::error::BindingError;
use crate::registry::{AddOutcome, BindingSet};
use crate::request::Request;
use core_types::PATCH_CONTENT_TYPE;
use patch::{Component, Control, HeadElements, MarkupBuffer, PatchError, RenderContext};
use std::rc::Rc;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Response {
    pub content_type: String,
    pub body: String,
}

impl Response {
    /// A no-op answer; the client runtime ignores an empty patch body.
    pub fn empty() -> Self {
        Self {
            content_type: PATCH_CONTENT_TYPE.to_string(),
            body: String::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

/// A component of the page and the bindings attached to it.
pub struct Widget {
    control: Rc<Control>,
    bindings: BindingSet,
}

impl Widget {
    pub fn new(control: Control) -> Self {
        Self::shared(Rc::new(control))
    }

    pub fn shared(control: Rc<Control>) -> Self {
        Self {
            control,
            bindings: BindingSet::new(),
        }
    }

    pub fn with_binding(mut self, binding: impl InteractionBinding + 'static) -> Self {
        self.bindings.add(binding);
        self
    }

    pub fn add_binding(&mut self, binding: impl InteractionBinding + 'static) -> AddOutcome {
        self.bindings.add(binding)
    }

    pub fn control(&self) -> &Rc<Control> {
        &self.control
    }

    pub fn bindings(&self) -> &BindingSet {
        &self.bindings
    }

    fn contribute(&self, ctx: &HeadContext<'_>) -> Result<(), BindingError> {
        // Bindings read the control while its head list is edited.
        let mut head = self.control.take_head();
        let result = self.bindings.iter().try_for_each(|binding| {
            binding.collect_head_contributions(&*self.control, &mut head, ctx)?;
            binding.emit_setup_script(&*self.control, &mut head, ctx)
        });
        self.control.restore_head(head);
        result
    }
}

/// Outcome of routing a request to a binding.
pub enum Dispatch<'p> {
    Target {
        widget: &'p Widget,
        binding: &'p dyn InteractionBinding,
    },
    NoTarget,
}

pub struct Page {
    path: String,
    context_path: String,
    stateful: bool,
    widgets: Vec<Widget>,
    head: HeadElements,
}

impl Page {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            context_path: String::new(),
            stateful: false,
            widgets: Vec::new(),
            head: HeadElements::new(),
        }
    }

    pub fn with_context_path(mut self, context_path: impl Into<String>) -> Self {
        self.context_path = context_path.into();
        self
    }

    pub fn with_stateful(mut self, stateful: bool) -> Self {
        self.stateful = stateful;
        self
    }

    pub fn with_widget(mut self, widget: Widget) -> Self {
        self.widgets.push(widget);
        self
    }

    pub fn add_widget(&mut self, widget: Widget) {
        self.widgets.push(widget);
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn widgets(&self) -> &[Widget] {
        &self.widgets
    }

    pub fn widget(&self, id: &str) -> Option<&Widget> {
        self.widgets
            .iter()
            .find(|w| w.control.id().as_deref() == Some(id))
    }

    pub fn head_context<'a>(
        &'a self,
        config: &'a BehaviorConfig,
        language: Option<&'a str>,
    ) -> HeadContext<'a> {
        HeadContext::new(config, &self.path)
            .with_context_path(&self.context_path)
            .with_stateful(self.stateful)
            .with_language(language)
    }

    /// Runs every binding's head pass against its component and records the
    /// page head: each component's elements in page order, without repeats.
    pub fn prepare_head(
        &mut self,
        config: &BehaviorConfig,
        language: Option<&str>,
    ) -> Result<(), BindingError> {
        let head = {
            let ctx = self.head_context(config, language);
            let mut head = HeadElements::new();
            for widget in &self.widgets {
                widget.contribute(&ctx)?;
                for element in widget.control.head_elements() {
                    head.add_if_absent(element);
                }
            }
            head
        };
        self.head = head;
        Ok(())
    }

    /// Elements the browser page has after [`Page::prepare_head`].
    pub fn head_elements(&self) -> &HeadElements {
        &self.head
    }

    pub fn render_head(&self, render: &RenderContext<'_>) -> Result<String, PatchError> {
        let mut out = MarkupBuffer::new();
        for element in &self.head {
            element.render(&mut out, render)?;
            out.append_char('\n');
        }
        Ok(out.into_string())
    }

    /// The widget named by a request parameter, then its first binding the
    /// request targets.
    pub fn route(&self, request: &Request) -> Dispatch<'_> {
        let widget = self
            .widgets
            .iter()
            .find(|w| w.control.id().is_some_and(|id| request.has_param(&id)));
        let Some(widget) = widget else {
            return Dispatch::NoTarget;
        };
        match widget.bindings.find_target(request) {
            Some(binding) => Dispatch::Target { widget, binding },
            None => Dispatch::NoTarget,
        }
    }

    pub fn dispatch(
        &self,
        request: &Request,
        render: &RenderContext<'_>,
    ) -> Result<Response, BindingError> {
        let Dispatch::Target { widget, binding } = self.route(request) else {
            log::debug!(
                target: "behavior.dispatch",
                "no binding targeted by {} (event {:?})",
                request.path(),
                request.event()
            );
            return Ok(Response::empty());
        };

        match binding.on_request(&*widget.control, request)? {
            None => Ok(Response::empty()),
            Some(ActionResult::Content { content_type, body }) => {
                Ok(Response { content_type, body })
            }
            Some(ActionResult::Patch(mut batch)) => {
                if batch.known_resources().is_empty() {
                    batch.set_known_resources(self.head.clone());
                }
                let body = batch.serialize(render)?;
                Ok(Response {
                    content_type: batch.content_type().to_string(),
                    body,
                })
            }
        }
    }
}

impl std::fmt::Debug for Page {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Page")
            .field("path", &self.path)
            .field("stateful", &self.stateful)
            .field("widgets", &self.widgets.len())
            .finish()
    }
}
