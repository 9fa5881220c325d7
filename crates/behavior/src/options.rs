use indexmap::IndexMap;
use patch::{JsScript, TemplateModel};
use serde_json::Value;

pub const DEFAULT_METHOD: &str = "GET";

/// Request and presentation settings of a binding. Everything here ends up
/// in the setup script's template model.
#[derive(Clone, Debug, PartialEq)]
pub struct BindingOptions {
    /// Overrides the selector derived from the bound component.
    pub css_selector: Option<String>,
    /// Extra request parameters, sent in insertion order.
    pub data: IndexMap<String, Value>,
    /// User model values; reserved keys computed from the other options win.
    pub model: TemplateModel,
    pub method: String,
    /// Request URL; the page path when unset.
    pub url: Option<String>,
    pub delay_ms: u32,
    pub show_busy_indicator: bool,
    pub busy_indicator_options: TemplateModel,
    pub busy_indicator_message: Option<String>,
    pub busy_indicator_target: Option<String>,
    /// Per-binding timeout; `None` keeps the configured default.
    pub timeout_ms: Option<u32>,
    pub timeout_retry_limit: Option<u32>,
    /// Prefix of the setup-script id; derived from the templates path when
    /// unset.
    pub setup_script_id: Option<String>,
    /// Replaces the generated setup script.
    pub setup_script: Option<JsScript>,
    pub skip_setup_script: bool,
    /// Skips head contributions and the setup script.
    pub skip_head_elements: bool,
}

impl Default for BindingOptions {
    fn default() -> Self {
        Self {
            css_selector: None,
            data: IndexMap::new(),
            model: TemplateModel::new(),
            method: DEFAULT_METHOD.to_string(),
            url: None,
            delay_ms: 0,
            show_busy_indicator: true,
            busy_indicator_options: TemplateModel::new(),
            busy_indicator_message: None,
            busy_indicator_target: None,
            timeout_ms: None,
            timeout_retry_limit: None,
            setup_script_id: None,
            setup_script: None,
            skip_setup_script: false,
            skip_head_elements: false,
        }
    }
}

impl BindingOptions {
    pub fn css_selector(&mut self, selector: impl Into<String>) -> &mut Self {
        self.css_selector = Some(selector.into());
        self
    }

    pub fn data(&mut self, name: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.data.insert(name.into(), value.into());
        self
    }

    pub fn remove_data(&mut self, name: &str) -> &mut Self {
        self.data.shift_remove(name);
        self
    }

    pub fn model(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.model.insert(key.into(), value.into());
        self
    }

    pub fn method(&mut self, method: impl Into<String>) -> &mut Self {
        self.method = method.into();
        self
    }

    pub fn url(&mut self, url: impl Into<String>) -> &mut Self {
        self.url = Some(url.into());
        self
    }

    pub fn delay_ms(&mut self, delay: u32) -> &mut Self {
        self.delay_ms = delay;
        self
    }

    pub fn busy_indicator(&mut self, show: bool) -> &mut Self {
        self.show_busy_indicator = show;
        self
    }

    pub fn busy_indicator_option(
        &mut self,
        key: impl Into<String>,
        value: impl Into<Value>,
    ) -> &mut Self {
        self.busy_indicator_options.insert(key.into(), value.into());
        self
    }

    pub fn busy_indicator_message(&mut self, message: impl Into<String>) -> &mut Self {
        self.busy_indicator_message = Some(message.into());
        self
    }

    pub fn busy_indicator_target(&mut self, selector: impl Into<String>) -> &mut Self {
        self.busy_indicator_target = Some(selector.into());
        self
    }

    pub fn timeout_ms(&mut self, timeout: u32) -> &mut Self {
        self.timeout_ms = Some(timeout);
        self
    }

    pub fn timeout_retry_limit(&mut self, limit: u32) -> &mut Self {
        self.timeout_retry_limit = Some(limit);
        self
    }

    pub fn setup_script_id(&mut self, id: impl Into<String>) -> &mut Self {
        self.setup_script_id = Some(id.into());
        self
    }

    pub fn setup_script(&mut self, script: JsScript) -> &mut Self {
        self.setup_script = Some(script);
        self
    }

    pub fn skip_setup_script(&mut self, skip: bool) -> &mut Self {
        self.skip_setup_script = skip;
        self
    }

    pub fn skip_head_elements(&mut self, skip: bool) -> &mut Self {
        self.skip_head_elements = skip;
        self
    }
}
