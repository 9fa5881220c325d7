//! Template models handed to the client runtime by setup scripts.
//!
//! Keys computed from binding options are reserved: they replace user model
//! values of the same name, with a warning on non-stateful pages where the
//! clash cannot come from a previous request.

use crate::binding::HeadContext;
use crate::error::BindingError;
use crate::event::is_bindable_event;
use crate::options::{BindingOptions, DEFAULT_METHOD};
use crate::request::encode_data;
use patch::{Component, TemplateModel};
use serde_json::Value;
use url::form_urlencoded;

pub struct ModelBuilder<'c, 'a> {
    model: TemplateModel,
    ctx: &'c HeadContext<'a>,
}

impl<'c, 'a> ModelBuilder<'c, 'a> {
    pub fn new(base: TemplateModel, ctx: &'c HeadContext<'a>) -> Self {
        Self { model: base, ctx }
    }

    pub fn put(&mut self, key: &str, value: impl Into<Value>) {
        let Some(old) = self.model.insert(key.to_string(), value.into()) else {
            return;
        };
        if !self.ctx.stateful {
            log::warn!(
                target: "behavior.model",
                "{} model contains an object keyed with reserved name \"{key}\"; \
                 {old} was replaced",
                self.ctx.page_path
            );
        }
    }

    /// Puts `pairs` in front of the query string held under `key`.
    pub fn prepend_query(&mut self, key: &str, pairs: &[(&str, &str)]) {
        let mut query = form_urlencoded::Serializer::new(String::new());
        for (name, value) in pairs {
            query.append_pair(name, value);
        }
        let mut encoded = query.finish();
        if let Some(rest) = self.model.get(key).and_then(Value::as_str).filter(|r| !r.is_empty()) {
            encoded.push('&');
            encoded.push_str(rest);
        }
        self.model.insert(key.to_string(), Value::from(encoded));
    }

    pub fn finish(self) -> TemplateModel {
        self.model
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum DataEncoding {
    /// `a=1&b=2`, appended to the request by the runtime.
    Query,
    /// JSON object, merged into the form submission.
    Object,
}

/// What differs between strategies when the shared model is built.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ModelSettings {
    /// Fall back to the page path when no URL is set.
    pub default_url: bool,
    pub data: DataEncoding,
    pub delay: bool,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            default_url: true,
            data: DataEncoding::Query,
            delay: true,
        }
    }
}

pub fn resolve_selector(
    css_selector: Option<&str>,
    source: &dyn Component,
) -> Result<String, BindingError> {
    if let Some(selector) = css_selector {
        return Ok(selector.to_string());
    }
    source.css_selector().ok_or_else(|| BindingError::NoCssSelector {
        kind: source.kind().to_string(),
        name: source.name(),
    })
}

/// `/a/b.js` becomes `a-b-js`.
pub fn path_id(path: &str) -> String {
    path.strip_prefix('/')
        .unwrap_or(path)
        .replace(['/', '.'], "-")
}

/// `<prefix>_<id or name>_<event>`; an unset event is spelled `any`.
pub fn setup_script_id(prefix: &str, source: &dyn Component, event: Option<&str>) -> String {
    let mut id = prefix.to_string();
    if let Some(postfix) = source.id().or_else(|| source.name()) {
        id.push('_');
        id.push_str(&postfix);
    }
    id.push('_');
    id.push_str(event.unwrap_or("any"));
    id
}

pub(crate) fn build_template_model(
    options: &BindingOptions,
    event: Option<&str>,
    source: &dyn Component,
    ctx: &HeadContext<'_>,
    settings: ModelSettings,
) -> Result<TemplateModel, BindingError> {
    let selector = resolve_selector(options.css_selector.as_deref(), source)?;
    let mut model = ModelBuilder::new(options.model.clone(), ctx);

    if let Some(event) = event.filter(|e| is_bindable_event(Some(*e))) {
        model.put("event", event);
    }
    model.put("cssSelector", selector);

    if !options.show_busy_indicator {
        model.put("showBusyIndicator", false);
    }
    let mut busy = options.busy_indicator_options.clone();
    if let Some(message) = &options.busy_indicator_message {
        busy.insert("message".to_string(), Value::from(message.as_str()));
    }
    if !busy.is_empty() {
        model.put("busyIndicatorOptions", Value::Object(busy));
    }
    if let Some(target) = &options.busy_indicator_target {
        model.put("busyIndicatorTarget", target.as_str());
    }

    let url = match &options.url {
        Some(url) => Some(url.as_str()),
        None if settings.default_url => Some(ctx.page_path),
        None => None,
    };
    if let Some(url) = url {
        model.put("url", url);
    }
    if !options.method.eq_ignore_ascii_case(DEFAULT_METHOD) {
        model.put("type", options.method.as_str());
    }
    if settings.delay && options.delay_ms > 0 {
        model.put("delay", options.delay_ms);
    }

    let timeout = options.timeout_ms.unwrap_or(ctx.config.default_timeout_ms);
    if timeout != ctx.config.default_timeout_ms {
        model.put("timeout", timeout);
    }
    let retries = options
        .timeout_retry_limit
        .unwrap_or(ctx.config.default_timeout_retry_limit);
    if retries != ctx.config.default_timeout_retry_limit {
        model.put("timeoutRetryLimit", retries);
    }

    if !options.data.is_empty() {
        match settings.data {
            DataEncoding::Query => model.put("data", encode_data(&options.data)),
            DataEncoding::Object => {
                let data: TemplateModel =
                    options.data.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
                model.put("data", Value::Object(data));
            }
        }
    }
    Ok(model.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BehaviorConfig;
    use patch::Control;
    use serde_json::json;

    fn ctx(config: &BehaviorConfig) -> HeadContext<'_> {
        HeadContext::new(config, "/home.htm")
    }

    #[test]
    fn defaults_produce_a_minimal_model() {
        let config = BehaviorConfig::default();
        let link = Control::new("a").with_id("link");
        let model = build_template_model(
            &BindingOptions::default(),
            Some("click"),
            &link,
            &ctx(&config),
            ModelSettings::default(),
        )
        .unwrap();
        assert_eq!(
            Value::Object(model),
            json!({"event": "click", "cssSelector": "#link", "url": "/home.htm"})
        );
    }

    #[test]
    fn non_default_options_are_emitted() {
        let config = BehaviorConfig::default();
        let field = Control::new("input").with_name("q");
        let mut options = BindingOptions::default();
        options
            .method("post")
            .delay_ms(300)
            .timeout_ms(5_000)
            .timeout_retry_limit(3)
            .busy_indicator(false)
            .busy_indicator_message("Loading")
            .data("page", 2)
            .data("term", "a b")
            .model("cssSelector", "ignored");
        let model = build_template_model(
            &options,
            Some("domready"),
            &field,
            &ctx(&config),
            ModelSettings::default(),
        )
        .unwrap();
        assert_eq!(
            Value::Object(model),
            json!({
                "cssSelector": "input[name='q']",
                "showBusyIndicator": false,
                "busyIndicatorOptions": {"message": "Loading"},
                "url": "/home.htm",
                "type": "post",
                "delay": 300,
                "timeout": 5000,
                "data": "page=2&term=a+b",
            })
        );
    }

    #[test]
    fn missing_selector_is_reported() {
        let config = BehaviorConfig::default();
        let anonymous = Control::new("span");
        let err = build_template_model(
            &BindingOptions::default(),
            None,
            &anonymous,
            &ctx(&config),
            ModelSettings::default(),
        )
        .unwrap_err();
        assert!(matches!(err, BindingError::NoCssSelector { .. }));
    }

    #[test]
    fn setup_ids_combine_path_component_and_event() {
        let prefix = path_id("/patchwork/template/jquery.templates.js");
        assert_eq!(prefix, "patchwork-template-jquery-templates-js");
        let by_name = Control::new("input").with_name("q");
        assert_eq!(setup_script_id("p", &by_name, Some("keyup")), "p_q_keyup");
        assert_eq!(setup_script_id("p", &Control::new("div"), None), "p_any");
    }

    #[test]
    fn prepended_query_pairs_lead_existing_data() {
        let config = BehaviorConfig::default();
        let ctx = ctx(&config);
        let mut model = ModelBuilder::new(TemplateModel::new(), &ctx);
        model.prepend_query("data", &[("country", "1")]);
        model.put("other", "x");
        let mut with_data = ModelBuilder::new(model.finish(), &ctx);
        with_data.prepend_query("other", &[("a b", "&")]);
        let model = with_data.finish();
        assert_eq!(model["data"], "country=1");
        assert_eq!(model["other"], "a+b=%26&x");
    }
}
