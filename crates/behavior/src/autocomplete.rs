//! Suggests completions for a text field while the user types.
//!
//! The autocomplete plugin requests `url?data&q=<text>` on its own, so the
//! setup data carries the routing parameter and the request usually has no
//! event. Suggestions go back as `text/plain`, one per line.

use crate::binding::{
    ActionResult, BindingCore, HeadContext, InteractionBinding, add_debug_script, binding_common,
    event_matches, model_json, ready_call,
};
use crate::error::BindingError;
use crate::event::{AjaxEvent, KEYUP};
use crate::model::ModelSettings;
use crate::request::Request;
use patch::{Component, CssImport, HeadElements, JsImport, TemplateModel};
use serde_json::Value;

/// Text typed so far.
pub const CRITERIA_PARAM: &str = "q";
pub const SUGGESTIONS_CONTENT_TYPE: &str = "text/plain";

const FIELD_KINDS: &[&str] = &["input", "select", "textarea"];

type SuggestionSource = Box<dyn Fn(&str) -> Vec<String>>;

/// Newline-joined suggestions as the plugin expects them.
pub fn suggestions_result<I>(suggestions: I) -> ActionResult
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut body = String::new();
    for (i, suggestion) in suggestions.into_iter().enumerate() {
        if i > 0 {
            body.push('\n');
        }
        body.push_str(suggestion.as_ref());
    }
    ActionResult::content(SUGGESTIONS_CONTENT_TYPE, body)
}

pub struct AutoCompleteBinding {
    core: BindingCore,
    autocomplete: TemplateModel,
    suggestions: Option<SuggestionSource>,
}

binding_common!(AutoCompleteBinding);

impl AutoCompleteBinding {
    pub fn new() -> Self {
        Self::on(KEYUP)
    }

    pub fn on(event_type: impl Into<String>) -> Self {
        let mut core = BindingCore::new(Some(event_type.into()));
        core.options.show_busy_indicator = false;
        Self {
            core,
            autocomplete: TemplateModel::new(),
            suggestions: None,
        }
    }

    /// Plugin options such as `max`, `width` or `minChars`.
    pub fn autocomplete_options(&self) -> &TemplateModel {
        &self.autocomplete
    }

    pub fn has_autocomplete_options(&self) -> bool {
        !self.autocomplete.is_empty()
    }

    pub fn with_autocomplete_option(
        mut self,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> Self {
        self.autocomplete.insert(key.into(), value.into());
        self
    }

    /// Computes suggestions from the criteria. Takes precedence over an
    /// action handler.
    pub fn with_suggestions<F>(mut self, source: F) -> Self
    where
        F: Fn(&str) -> Vec<String> + 'static,
    {
        self.suggestions = Some(Box::new(source));
        self
    }

    fn check_source(source: &dyn Component) -> Result<(), BindingError> {
        if FIELD_KINDS.contains(&source.kind()) {
            return Ok(());
        }
        Err(BindingError::UnsupportedSource {
            expected: "field",
            found: source.kind().to_string(),
        })
    }
}

impl Default for AutoCompleteBinding {
    fn default() -> Self {
        Self::new()
    }
}

impl InteractionBinding for AutoCompleteBinding {
    fn event_type(&self) -> Option<&str> {
        self.core.event_type()
    }

    /// Plugin requests carry the criteria but no event.
    fn is_request_target(&self, request: &Request) -> bool {
        match request.event() {
            Some(event) => event_matches(Some(event), self.event_type()),
            None => request.has_param(CRITERIA_PARAM),
        }
    }

    fn on_action(
        &self,
        source: &dyn Component,
        event: &AjaxEvent,
    ) -> Result<Option<ActionResult>, BindingError> {
        self.core.dispatch(source, event)
    }

    fn on_request(
        &self,
        source: &dyn Component,
        request: &Request,
    ) -> Result<Option<ActionResult>, BindingError> {
        Self::check_source(source)?;
        let Some(suggest) = &self.suggestions else {
            return self.on_action(source, &AjaxEvent::new(request.event(), request.which()));
        };
        let criteria = request.param(CRITERIA_PARAM).unwrap_or_default();
        let suggestions = suggest(criteria);
        log::debug!(
            target: "behavior.dispatch",
            "{} suggestions for {criteria:?}",
            suggestions.len()
        );
        Ok(Some(suggestions_result(suggestions)))
    }

    fn collect_head_contributions(
        &self,
        source: &dyn Component,
        head: &mut HeadElements,
        ctx: &HeadContext<'_>,
    ) -> Result<(), BindingError> {
        Self::check_source(source)?;
        if self.core.options.skip_head_elements {
            return Ok(());
        }
        self.core.head_contributions(head, ctx);
        head.add_if_absent(JsImport::new(ctx.config.autocomplete_path.as_str()));
        head.add_if_absent(CssImport::new(ctx.config.autocomplete_css_path.as_str()));
        add_debug_script(head, ctx, &[]);
        Ok(())
    }

    fn emit_setup_script(
        &self,
        source: &dyn Component,
        head: &mut HeadElements,
        ctx: &HeadContext<'_>,
    ) -> Result<(), BindingError> {
        Self::check_source(source)?;
        let settings = ModelSettings {
            // The plugin has its own `delay` option.
            delay: false,
            ..ModelSettings::default()
        };
        let route = source.id();
        self.core.emit_setup(
            source,
            head,
            ctx,
            settings,
            |model| {
                if let Some(id) = route.as_deref() {
                    model.prepend_query("data", &[(id, "1")]);
                }
                if self.has_autocomplete_options() {
                    model.put("options", Value::Object(self.autocomplete.clone()));
                }
            },
            |model| ready_call(ctx.config, "autoCompleteTemplate", &[&model_json(model)]),
        )
    }
}
