//! Binds a browser event on a component to an async request back to the
//! page.

use crate::binding::{
    ActionResult, BindingCore, HeadContext, InteractionBinding, add_debug_script, binding_common,
    model_json, ready_call,
};
use crate::error::BindingError;
use crate::event::{AjaxEvent, CLICK};
use crate::model::ModelSettings;
use patch::{Component, HeadElements};

pub struct AjaxBinding {
    core: BindingCore,
}

binding_common!(AjaxBinding);

impl AjaxBinding {
    pub fn new(event_type: impl Into<String>) -> Self {
        Self {
            core: BindingCore::new(Some(event_type.into())),
        }
    }

    /// A binding with no event; it answers requests that carry none.
    pub fn unbound() -> Self {
        Self {
            core: BindingCore::new(None),
        }
    }
}

impl Default for AjaxBinding {
    fn default() -> Self {
        Self::new(CLICK)
    }
}

impl InteractionBinding for AjaxBinding {
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
        add_debug_script(head, ctx, &[]);
        Ok(())
    }

    fn emit_setup_script(
        &self,
        source: &dyn Component,
        head: &mut HeadElements,
        ctx: &HeadContext<'_>,
    ) -> Result<(), BindingError> {
        self.core.emit_setup(
            source,
            head,
            ctx,
            ModelSettings::default(),
            |_| {},
            |model| ready_call(ctx.config, "ajaxTemplate", &[&model_json(model)]),
        )
    }
}
