//! Submits a form asynchronously through the form plugin.

use crate::binding::{
    ActionResult, BindingCore, HeadContext, InteractionBinding, add_debug_script, binding_common,
    model_json, ready_call,
};
use crate::error::BindingError;
use crate::event::{AjaxEvent, CLICK};
use crate::model::{DataEncoding, ModelSettings};
use patch::{Component, HeadElements, JsImport};

pub const FORM_KIND: &str = "form";
pub const DEFAULT_DATA_TYPE: &str = "xml";
pub const REQUESTED_WITH_HEADER: &str = "X-Requested-With";

const AJAX_SUBMIT_DEBUG: &str =
    "if (typeof jQuery.fn.ajaxSubmit !== 'undefined') {jQuery.fn.ajaxSubmit.debug=true}";

pub struct FormBinding {
    core: BindingCore,
    reset_form: bool,
    clear_form: bool,
    data_type: String,
}

binding_common!(FormBinding);

impl FormBinding {
    pub fn new() -> Self {
        Self::on(CLICK)
    }

    pub fn on(event_type: impl Into<String>) -> Self {
        let mut core = BindingCore::new(Some(event_type.into()));
        core.options.data(REQUESTED_WITH_HEADER, "XMLHttpRequest");
        Self {
            core,
            reset_form: false,
            clear_form: false,
            data_type: DEFAULT_DATA_TYPE.to_string(),
        }
    }

    /// Reset the form after a successful submit.
    pub fn reset_form(mut self, on: bool) -> Self {
        self.reset_form = on;
        self
    }

    /// Clear all fields after a successful submit.
    pub fn clear_form(mut self, on: bool) -> Self {
        self.clear_form = on;
        self
    }

    /// Expected response type; the runtime assumes `xml`.
    pub fn data_type(mut self, data_type: impl Into<String>) -> Self {
        self.data_type = data_type.into();
        self
    }

    fn check_source(source: &dyn Component) -> Result<(), BindingError> {
        if source.kind() == FORM_KIND {
            return Ok(());
        }
        Err(BindingError::UnsupportedSource {
            expected: FORM_KIND,
            found: source.kind().to_string(),
        })
    }
}

impl Default for FormBinding {
    fn default() -> Self {
        Self::new()
    }
}

impl InteractionBinding for FormBinding {
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
        source: &dyn Component,
        head: &mut HeadElements,
        ctx: &HeadContext<'_>,
    ) -> Result<(), BindingError> {
        Self::check_source(source)?;
        if self.core.options.skip_head_elements {
            return Ok(());
        }
        self.core.head_contributions(head, ctx);
        head.add_if_absent(JsImport::new(ctx.config.form_path.as_str()));
        add_debug_script(head, ctx, &[AJAX_SUBMIT_DEBUG]);
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
            // The form's own action is the default target.
            default_url: false,
            data: DataEncoding::Object,
            delay: true,
        };
        self.core.emit_setup(
            source,
            head,
            ctx,
            settings,
            |model| {
                if self.reset_form {
                    model.put("resetForm", true);
                }
                if self.clear_form {
                    model.put("clearForm", true);
                }
                if self.data_type != DEFAULT_DATA_TYPE {
                    model.put("dataType", self.data_type.as_str());
                }
            },
            |model| ready_call(ctx.config, "ajaxFormTemplate", &[&model_json(model)]),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BehaviorConfig;
    use patch::{Control, HeadElement};

    #[test]
    fn non_form_sources_are_rejected() {
        let config = BehaviorConfig::default();
        let ctx = HeadContext::new(&config, "/p");
        let div = Control::new("div").with_id("d");
        let mut head = HeadElements::new();
        let err = FormBinding::new()
            .emit_setup_script(&div, &mut head, &ctx)
            .unwrap_err();
        assert_eq!(
            err,
            BindingError::UnsupportedSource {
                expected: "form",
                found: "div".to_string()
            }
        );
        assert!(
            FormBinding::new()
                .collect_head_contributions(&div, &mut head, &ctx)
                .is_err()
        );
        assert!(head.is_empty());
    }

    #[test]
    fn form_setup_script_carries_object_data_and_submit_flags() {
        let mut config = BehaviorConfig::default();
        config.production = true;
        let ctx = HeadContext::new(&config, "/p");
        let form = Control::new("form").with_id("signup");
        let binding = FormBinding::new().reset_form(true).data_type("json");

        let mut head = HeadElements::new();
        binding.collect_head_contributions(&form, &mut head, &ctx).unwrap();
        binding.emit_setup_script(&form, &mut head, &ctx).unwrap();

        let idents: Vec<String> = head.iter().filter_map(|e| e.key()).map(|k| k.ident).collect();
        assert!(idents.iter().any(|i| i == "/patchwork/form/jquery.form.js"));
        assert!(!idents.iter().any(|i| i == "enable_js_debugging"));

        let content = head
            .iter()
            .find_map(|e| match e {
                HeadElement::JsScript(s) => s.content.clone(),
                _ => None,
            })
            .expect("setup script");
        assert_eq!(
            content,
            "jQuery(document).ready(function(){Patchwork.jq.ajaxFormTemplate(\
             {\"cssSelector\":\"#signup\",\"data\":{\"X-Requested-With\":\"XMLHttpRequest\"},\
             \"dataType\":\"json\",\"event\":\"click\",\"resetForm\":true});});"
        );
    }

    #[test]
    fn debug_script_enables_ajax_submit_debugging() {
        let config = BehaviorConfig::default();
        let ctx = HeadContext::new(&config, "/p");
        let form = Control::new("form").with_id("signup");
        let mut head = HeadElements::new();
        FormBinding::new().collect_head_contributions(&form, &mut head, &ctx).unwrap();
        let debug = head
            .iter()
            .find_map(|e| match e {
                HeadElement::JsScript(s) if s.id.as_deref() == Some("enable_js_debugging") => {
                    s.content.clone()
                }
                _ => None,
            })
            .expect("debug script");
        assert!(debug.contains("jQuery.fn.ajaxSubmit.debug=true"));
    }
}
