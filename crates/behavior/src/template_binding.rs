//! Adds a server-rendered script template to a component's head. The
//! template itself wires up whatever client behavior it needs.

use crate::binding::{
    ActionHandler, ActionResult, HandlerResult, HeadContext, InteractionBinding, add_debug_script,
    add_runtime_imports,
};
use crate::error::BindingError;
use crate::event::AjaxEvent;
use crate::model::{ModelBuilder, path_id, resolve_selector};
use crate::options::DEFAULT_METHOD;
use crate::request::Request;
use patch::{Component, HeadElement, HeadElements, JsScript, TemplateModel};
use serde_json::Value;
use std::fmt;

pub struct TemplateBinding {
    template: String,
    template_id: Option<String>,
    model: TemplateModel,
    method: String,
    url: Option<String>,
    css_selector: Option<String>,
    skip_head_elements: bool,
    handler: Option<Box<dyn ActionHandler>>,
}

impl TemplateBinding {
    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
            template_id: None,
            model: TemplateModel::new(),
            method: DEFAULT_METHOD.to_string(),
            url: None,
            css_selector: None,
            skip_head_elements: false,
            handler: None,
        }
    }

    pub fn template(&self) -> &str {
        &self.template
    }

    /// Script id; derived from the template path when unset.
    pub fn template_id(&self) -> String {
        match &self.template_id {
            Some(id) => id.clone(),
            None => path_id(&self.template),
        }
    }

    pub fn with_template_id(mut self, id: impl Into<String>) -> Self {
        self.template_id = Some(id.into());
        self
    }

    pub fn with_model(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.model.insert(key.into(), value.into());
        self
    }

    pub fn with_method(mut self, method: impl Into<String>) -> Self {
        self.method = method.into();
        self
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_css_selector(mut self, selector: impl Into<String>) -> Self {
        self.css_selector = Some(selector.into());
        self
    }

    pub fn skip_head_elements(mut self, skip: bool) -> Self {
        self.skip_head_elements = skip;
        self
    }

    pub fn with_handler<F>(mut self, handler: F) -> Self
    where
        F: Fn(&dyn Component, &AjaxEvent) -> HandlerResult + 'static,
    {
        self.handler = Some(Box::new(handler));
        self
    }

    fn template_model(
        &self,
        source: &dyn Component,
        ctx: &HeadContext<'_>,
    ) -> Result<TemplateModel, BindingError> {
        let selector = resolve_selector(self.css_selector.as_deref(), source)?;
        let mut model = ModelBuilder::new(self.model.clone(), ctx);
        model.put("path", ctx.page_path);
        model.put("url", self.url.as_deref().unwrap_or(ctx.page_path));
        model.put("context", ctx.context_path);
        model.put("type", self.method.as_str());
        model.put("cssSelector", selector);
        Ok(model.finish())
    }

    fn add_template(
        &self,
        source: &dyn Component,
        head: &mut HeadElements,
        ctx: &HeadContext<'_>,
    ) -> Result<(), BindingError> {
        if self.template.trim().is_empty() {
            return Ok(());
        }
        let id = self.template_id();
        let probe: HeadElement = JsScript::new().id(id.as_str()).into();
        // Stateful pages keep the head list between requests.
        if head.contains(&probe) {
            return Ok(());
        }
        let model = self.template_model(source, ctx)?;
        head.add(JsScript::templated(self.template.as_str(), model).id(id));
        Ok(())
    }
}

impl PartialEq for TemplateBinding {
    fn eq(&self, _other: &Self) -> bool {
        // No event type, so every template binding shares one key.
        true
    }
}

impl Eq for TemplateBinding {}

impl std::hash::Hash for TemplateBinding {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::hash::Hash::hash(&None::<&str>, state);
    }
}

impl fmt::Debug for TemplateBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TemplateBinding")
            .field("template", &self.template)
            .field("template_id", &self.template_id)
            .field("method", &self.method)
            .field("url", &self.url)
            .field("handler", &self.handler.is_some())
            .finish()
    }
}

impl InteractionBinding for TemplateBinding {
    fn event_type(&self) -> Option<&str> {
        None
    }

    fn is_request_target(&self, _request: &Request) -> bool {
        true
    }

    fn on_action(
        &self,
        source: &dyn Component,
        event: &AjaxEvent,
    ) -> Result<Option<ActionResult>, BindingError> {
        match &self.handler {
            Some(handler) => Ok(handler.on_action(source, event)?),
            None => Ok(None),
        }
    }

    fn collect_head_contributions(
        &self,
        source: &dyn Component,
        head: &mut HeadElements,
        ctx: &HeadContext<'_>,
    ) -> Result<(), BindingError> {
        if self.skip_head_elements {
            return Ok(());
        }
        add_runtime_imports(head, ctx.config, false);
        add_debug_script(head, ctx, &[]);
        self.add_template(source, head, ctx)
    }

    /// The template is the setup; nothing else to emit.
    fn emit_setup_script(
        &self,
        _source: &dyn Component,
        _head: &mut HeadElements,
        _ctx: &HeadContext<'_>,
    ) -> Result<(), BindingError> {
        Ok(())
    }
}
