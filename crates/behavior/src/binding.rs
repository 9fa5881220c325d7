//! The interaction-binding contract and the pieces its strategies share.

use crate::config::BehaviorConfig;
use crate::error::BindingError;
use crate::event::AjaxEvent;
use crate::model::{ModelBuilder, ModelSettings, build_template_model, path_id, setup_script_id};
use crate::options::BindingOptions;
use crate::request::Request;
use patch::{
    Component, HeadElement, HeadElements, JsImport, JsScript, PatchBatch, PatchError, TemplateModel,
};
use serde_json::Value;

pub const DEBUG_SCRIPT_ID: &str = "enable_js_debugging";

/// Page-level facts a binding needs while contributing to a component's
/// head.
#[derive(Clone, Copy, Debug)]
pub struct HeadContext<'a> {
    pub config: &'a BehaviorConfig,
    pub page_path: &'a str,
    pub context_path: &'a str,
    /// Stateful pages keep components between requests, so bindings are
    /// expected to meet their own earlier output.
    pub stateful: bool,
    pub language: Option<&'a str>,
}

impl<'a> HeadContext<'a> {
    pub fn new(config: &'a BehaviorConfig, page_path: &'a str) -> Self {
        Self {
            config,
            page_path,
            context_path: "",
            stateful: false,
            language: None,
        }
    }

    pub fn with_context_path(mut self, context_path: &'a str) -> Self {
        self.context_path = context_path;
        self
    }

    pub fn with_stateful(mut self, stateful: bool) -> Self {
        self.stateful = stateful;
        self
    }

    pub fn with_language(mut self, language: Option<&'a str>) -> Self {
        self.language = language;
        self
    }
}

/// Uniqueness key of a binding on one component: its event type.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BindingKey(Option<String>);

impl BindingKey {
    pub fn new(event_type: Option<&str>) -> Self {
        Self(event_type.map(str::to_string))
    }

    pub fn event_type(&self) -> Option<&str> {
        self.0.as_deref()
    }
}

#[derive(Debug)]
pub enum ActionResult {
    Patch(PatchBatch),
    Content { content_type: String, body: String },
}

impl ActionResult {
    pub fn content(content_type: impl Into<String>, body: impl Into<String>) -> Self {
        ActionResult::Content {
            content_type: content_type.into(),
            body: body.into(),
        }
    }
}

impl From<PatchBatch> for ActionResult {
    fn from(batch: PatchBatch) -> Self {
        ActionResult::Patch(batch)
    }
}

pub type HandlerResult = Result<Option<ActionResult>, PatchError>;

/// Application logic run when a binding is the target of a request.
/// `Ok(None)` means success without a response body.
pub trait ActionHandler {
    fn on_action(&self, source: &dyn Component, event: &AjaxEvent) -> HandlerResult;
}

impl<F> ActionHandler for F
where
    F: Fn(&dyn Component, &AjaxEvent) -> HandlerResult,
{
    fn on_action(&self, source: &dyn Component, event: &AjaxEvent) -> HandlerResult {
        self(source, event)
    }
}

pub trait InteractionBinding {
    /// Fixed at construction.
    fn event_type(&self) -> Option<&str>;

    fn key(&self) -> BindingKey {
        BindingKey::new(self.event_type())
    }

    fn is_request_target(&self, request: &Request) -> bool {
        event_matches(request.event(), self.event_type())
    }

    fn on_action(
        &self,
        source: &dyn Component,
        event: &AjaxEvent,
    ) -> Result<Option<ActionResult>, BindingError>;

    /// Entry point for a request this binding is the target of.
    fn on_request(
        &self,
        source: &dyn Component,
        request: &Request,
    ) -> Result<Option<ActionResult>, BindingError> {
        self.on_action(source, &AjaxEvent::new(request.event(), request.which()))
    }

    /// Adds the libraries this binding needs to `head`, skipping any already
    /// present.
    fn collect_head_contributions(
        &self,
        source: &dyn Component,
        head: &mut HeadElements,
        ctx: &HeadContext<'_>,
    ) -> Result<(), BindingError>;

    /// Writes the script wiring the browser event to an async request.
    /// Re-emission replaces the previous script with the same id.
    fn emit_setup_script(
        &self,
        source: &dyn Component,
        head: &mut HeadElements,
        ctx: &HeadContext<'_>,
    ) -> Result<(), BindingError>;
}

/// Case-insensitive; two blank events match.
pub fn event_matches(requested: Option<&str>, own: Option<&str>) -> bool {
    let requested = requested.filter(|s| !s.trim().is_empty());
    let own = own.filter(|s| !s.trim().is_empty());
    match (requested, own) {
        (None, None) => true,
        (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
        _ => false,
    }
}

/// jQuery at 0, the runtime at 1, the busy-indicator library at 2.
pub(crate) fn add_runtime_imports(
    head: &mut HeadElements,
    config: &BehaviorConfig,
    busy_indicator: bool,
) {
    head.insert_if_absent(0, JsImport::new(config.jquery_path.as_str()));
    head.insert_if_absent(1, JsImport::new(config.runtime_path.as_str()));
    if busy_indicator {
        head.insert_if_absent(2, JsImport::new(config.block_ui_path.as_str()));
    }
}

pub(crate) fn add_language_pack(head: &mut HeadElements, ctx: &HeadContext<'_>) {
    let language = ctx.config.resolve_language(ctx.language);
    if language == "en" {
        return;
    }
    let src = format!("{}{language}.js", ctx.config.templates_lang_folder);
    head.add_if_absent(JsImport::new(src).with_attribute("charset", "UTF-8"));
}

/// Turns on client debug output outside production; `extra` lines go inside
/// the jQuery guard.
pub(crate) fn add_debug_script(head: &mut HeadElements, ctx: &HeadContext<'_>, extra: &[&str]) {
    if ctx.config.production {
        return;
    }
    let probe: HeadElement = JsScript::new().id(DEBUG_SCRIPT_ID).into();
    if head.contains(&probe) {
        return;
    }
    let runtime = &ctx.config.runtime_object;
    let mut content = String::with_capacity(200);
    content.push_str("if (typeof jQuery !== 'undefined') {\n");
    content.push_str(
        "  if (typeof jQuery.taconite !== 'undefined') {jQuery.taconite.debug=true}\n",
    );
    content.push_str(&format!(
        "  if (typeof {root} !== 'undefined' && typeof {runtime} !== 'undefined') \
         {{{runtime}.debug = true}}\n",
        root = ctx.config.runtime_root()
    ));
    for line in extra {
        content.push_str("  ");
        content.push_str(line);
        content.push('\n');
    }
    content.push('}');
    head.add(JsScript::with_content(content).id(DEBUG_SCRIPT_ID));
}

/// Remove-then-add, so a changed script with a stable id replaces the old
/// one instead of being skipped or duplicated.
pub(crate) fn replace_script(head: &mut HeadElements, script: JsScript) {
    let element = HeadElement::from(script);
    head.remove(&element);
    head.add(element);
}

/// `jQuery(document).ready(function(){<runtime>.<function>(<args>);});`
pub(crate) fn ready_call(config: &BehaviorConfig, function: &str, args: &[&str]) -> String {
    format!(
        "jQuery(document).ready(function(){{{}.{function}({});}});",
        config.runtime_object,
        args.join(",")
    )
}

pub(crate) fn model_json(model: &TemplateModel) -> String {
    Value::Object(model.clone()).to_string()
}

/// State and behavior shared by the ajax, poll, form and autocomplete
/// strategies.
pub(crate) struct BindingCore {
    pub event_type: Option<String>,
    pub options: BindingOptions,
    pub handler: Option<Box<dyn ActionHandler>>,
}

impl BindingCore {
    pub fn new(event_type: Option<String>) -> Self {
        Self {
            event_type,
            options: BindingOptions::default(),
            handler: None,
        }
    }

    pub fn event_type(&self) -> Option<&str> {
        self.event_type.as_deref()
    }

    pub fn dispatch(
        &self,
        source: &dyn Component,
        event: &AjaxEvent,
    ) -> Result<Option<ActionResult>, BindingError> {
        match &self.handler {
            Some(handler) => Ok(handler.on_action(source, event)?),
            None => Ok(None),
        }
    }

    /// Runtime libraries, the templates library (unless a custom setup
    /// script replaces it) and the language pack.
    pub fn head_contributions(&self, head: &mut HeadElements, ctx: &HeadContext<'_>) {
        add_runtime_imports(head, ctx.config, self.options.show_busy_indicator);
        if self.options.setup_script.is_none() {
            head.add_if_absent(JsImport::new(ctx.config.templates_path.as_str()));
        }
        add_language_pack(head, ctx);
    }

    pub fn emit_setup(
        &self,
        source: &dyn Component,
        head: &mut HeadElements,
        ctx: &HeadContext<'_>,
        settings: ModelSettings,
        extend: impl FnOnce(&mut ModelBuilder<'_, '_>),
        render: impl FnOnce(&TemplateModel) -> String,
    ) -> Result<(), BindingError> {
        if self.options.skip_head_elements || self.options.skip_setup_script {
            return Ok(());
        }
        let base = build_template_model(&self.options, self.event_type(), source, ctx, settings)?;
        let mut builder = ModelBuilder::new(base, ctx);
        extend(&mut builder);
        let mut model = builder.finish();

        if let Some(custom) = &self.options.setup_script {
            let mut script = custom.clone();
            if script.template.is_some() {
                if let Some(own) = &script.model {
                    model.extend(own.iter().map(|(k, v)| (k.clone(), v.clone())));
                }
                script.model = Some(model);
            }
            replace_script(head, script);
            return Ok(());
        }

        let prefix = match &self.options.setup_script_id {
            Some(prefix) => prefix.clone(),
            None => path_id(&ctx.config.templates_path),
        };
        let id = setup_script_id(&prefix, source, self.event_type());
        let script = JsScript::with_content(render(&model)).id(id).render_id(false);
        replace_script(head, script);
        Ok(())
    }
}

/// Options access, handler wiring and event-type equality for a strategy
/// wrapping a [`BindingCore`] in a field named `core`.
macro_rules! binding_common {
    ($ty:ident) => {
        impl $ty {
            pub fn options(&self) -> &$crate::options::BindingOptions {
                &self.core.options
            }

            pub fn options_mut(&mut self) -> &mut $crate::options::BindingOptions {
                &mut self.core.options
            }

            /// Builder-style access to [`BindingOptions`](crate::options::BindingOptions).
            pub fn configure(
                mut self,
                f: impl FnOnce(&mut $crate::options::BindingOptions),
            ) -> Self {
                f(&mut self.core.options);
                self
            }

            pub fn with_handler<F>(mut self, handler: F) -> Self
            where
                F: Fn(
                        &dyn patch::Component,
                        &$crate::event::AjaxEvent,
                    ) -> $crate::binding::HandlerResult
                    + 'static,
            {
                self.core.handler = Some(Box::new(handler));
                self
            }

            pub fn with_action_handler(
                mut self,
                handler: impl $crate::binding::ActionHandler + 'static,
            ) -> Self {
                self.core.handler = Some(Box::new(handler));
                self
            }
        }

        impl PartialEq for $ty {
            fn eq(&self, other: &Self) -> bool {
                self.core.event_type == other.core.event_type
            }
        }

        impl Eq for $ty {}

        impl std::hash::Hash for $ty {
            fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
                std::hash::Hash::hash(&self.core.event_type, state);
            }
        }

        impl std::fmt::Debug for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_struct(stringify!($ty))
                    .field("event_type", &self.core.event_type)
                    .field("options", &self.core.options)
                    .field("handler", &self.core.handler.is_some())
                    .finish()
            }
        }
    };
}

pub(crate) use binding_common;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_matching_ignores_case_and_blank_pairs() {
        assert!(event_matches(Some("CLICK"), Some("click")));
        assert!(event_matches(None, None));
        assert!(event_matches(Some(" "), None));
        assert!(!event_matches(None, Some("click")));
        assert!(!event_matches(Some("change"), Some("click")));
    }

    #[test]
    fn runtime_imports_are_inserted_in_front_once() {
        let config = BehaviorConfig::default();
        let mut head = HeadElements::new();
        head.add(JsImport::new("/app.js"));
        add_runtime_imports(&mut head, &config, true);
        add_runtime_imports(&mut head, &config, true);
        let srcs: Vec<String> = head.iter().filter_map(|e| e.key()).map(|k| k.ident).collect();
        assert_eq!(
            srcs,
            [
                config.jquery_path.as_str(),
                config.runtime_path.as_str(),
                config.block_ui_path.as_str(),
                "/app.js"
            ]
        );
    }

    #[test]
    fn language_pack_only_for_supported_non_english() {
        let config = BehaviorConfig::default();
        let mut head = HeadElements::new();
        add_language_pack(&mut head, &HeadContext::new(&config, "/p").with_language(Some("fr")));
        assert!(head.is_empty());
        add_language_pack(&mut head, &HeadContext::new(&config, "/p").with_language(Some("af")));
        assert_eq!(
            head.iter().next().and_then(|e| e.key()).map(|k| k.ident).as_deref(),
            Some("/patchwork/template/lang/af.js")
        );
    }

    #[test]
    fn debug_script_respects_production_and_runtime_name() {
        let mut config = BehaviorConfig::default();
        let mut head = HeadElements::new();
        add_debug_script(&mut head, &HeadContext::new(&config, "/p"), &[]);
        add_debug_script(&mut head, &HeadContext::new(&config, "/p"), &[]);
        assert_eq!(head.len(), 1);
        match head.iter().next() {
            Some(HeadElement::JsScript(script)) => {
                let content = script.content.as_deref().unwrap_or_default();
                assert!(content.contains("typeof Patchwork !== 'undefined'"));
                assert!(content.contains("{Patchwork.jq.debug = true}"));
            }
            other => panic!("unexpected head element {other:?}"),
        }
        config.production = true;
        let mut head = HeadElements::new();
        add_debug_script(&mut head, &HeadContext::new(&config, "/p"), &[]);
        assert!(head.is_empty());
    }

    #[test]
    fn ready_call_wraps_runtime_function() {
        let config = BehaviorConfig::default();
        assert_eq!(
            ready_call(&config, "ajaxTemplate", &["{}"]),
            "jQuery(document).ready(function(){Patchwork.jq.ajaxTemplate({});});"
        );
    }
}
