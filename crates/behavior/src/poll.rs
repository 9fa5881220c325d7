//! Repeated requests started on page load, with a growing wait between
//! polls.

use crate::binding::{
    ActionResult, BindingCore, HeadContext, InteractionBinding, add_debug_script, binding_common,
    model_json, ready_call,
};
use crate::error::BindingError;
use crate::event::{AjaxEvent, DOMREADY};
use crate::model::ModelSettings;
use patch::{Component, HeadElements, JsImport, TemplateModel};
use serde_json::{Value, json};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PollSettings {
    /// Client-side name of the poll; the runtime generates one when unset.
    pub poll_id: Option<String>,
    pub wait_time_ms: u32,
    pub max_wait_time_ms: u32,
    /// Factor applied to the wait after each poll.
    pub wait_multiplier: u32,
    /// 0 polls forever.
    pub max_polls: u32,
    /// 0 never stops on failures.
    pub stop_after_failures: u32,
    pub auto_start: bool,
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            poll_id: None,
            wait_time_ms: 5_000,
            max_wait_time_ms: 30_000,
            wait_multiplier: 2,
            max_polls: 0,
            stop_after_failures: 0,
            auto_start: true,
        }
    }
}

impl PollSettings {
    fn to_model(&self) -> TemplateModel {
        let value = json!({
            "name": self.poll_id.as_deref().unwrap_or(""),
            "min_wait": self.wait_time_ms,
            "max_wait": self.max_wait_time_ms,
            "max_polls": self.max_polls,
            "stop_after_failures": self.stop_after_failures,
            "auto_start": self.auto_start,
        });
        match value {
            Value::Object(map) => map,
            _ => TemplateModel::new(),
        }
    }
}

pub struct PollBinding {
    core: BindingCore,
    poll: PollSettings,
}

binding_common!(PollBinding);

impl PollBinding {
    pub fn new() -> Self {
        Self {
            core: BindingCore::new(Some(DOMREADY.to_string())),
            poll: PollSettings::default(),
        }
    }

    pub fn with_poll_id(mut self, poll_id: impl Into<String>) -> Self {
        self.poll.poll_id = Some(poll_id.into());
        self
    }

    pub fn with_settings(mut self, settings: PollSettings) -> Self {
        self.poll = settings;
        self
    }

    pub fn settings(&self) -> &PollSettings {
        &self.poll
    }

    pub fn settings_mut(&mut self) -> &mut PollSettings {
        &mut self.poll
    }

    /// Polls run on a timer, so a request delay has no meaning.
    pub fn set_delay(&mut self, _delay_ms: u32) -> Result<(), BindingError> {
        Err(BindingError::Unsupported("delay is not supported by poll bindings"))
    }
}

impl Default for PollBinding {
    fn default() -> Self {
        Self::new()
    }
}

impl InteractionBinding for PollBinding {
    fn event_type(&self) -> Option<&str> {
        self.core.event_type()
    }

    fn on_action(
        &self,
        source: &dyn Component,
        event: &AjaxEvent,
    ) -> Result<Option<ActionResult>, BindingError> {
        self.core.dispatch(source, event)
    }

    fn collect_head_contributions(
        &self,
        _source: &dyn Component,
        head: &mut HeadElements,
        ctx: &HeadContext<'_>,
    ) -> Result<(), BindingError> {
        if self.core.options.skip_head_elements {
            return Ok(());
        }
        self.core.head_contributions(head, ctx);
        head.add_if_absent(JsImport::new(ctx.config.poll_path.as_str()));
        add_debug_script(head, ctx, &[]);
        Ok(())
    }

    fn emit_setup_script(
        &self,
        source: &dyn Component,
        head: &mut HeadElements,
        ctx: &HeadContext<'_>,
    ) -> Result<(), BindingError> {
        let settings = ModelSettings {
            delay: false,
            ..ModelSettings::default()
        };
        let poll = model_json(&self.poll.to_model());
        self.core.emit_setup(
            source,
            head,
            ctx,
            settings,
            |_| {},
            |model| ready_call(ctx.config, "pollTemplate", &[&model_json(model), &poll]),
        )
    }
}
