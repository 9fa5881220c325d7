//! Asset paths and client defaults shared by every binding on a page.

use crate::error::ConfigError;
use serde::Deserialize;
use std::path::Path;

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BehaviorConfig {
    pub jquery_path: String,
    /// Client runtime that interprets patch batches and setup scripts.
    pub runtime_path: String,
    pub block_ui_path: String,
    pub templates_path: String,
    /// Folder holding `<lang>.js` message packs; ends with `/`.
    pub templates_lang_folder: String,
    pub poll_path: String,
    pub form_path: String,
    pub autocomplete_path: String,
    pub autocomplete_css_path: String,
    /// Global object exposed by the runtime library, e.g. `Patchwork.jq`.
    pub runtime_object: String,
    pub supported_languages: Vec<String>,
    /// Outside production a script enabling client-side debug output is
    /// added to every bound component.
    pub production: bool,
    /// Timeout the client runtime assumes when none is sent.
    pub default_timeout_ms: u32,
    pub default_timeout_retry_limit: u32,
}

impl Default for BehaviorConfig {
    fn default() -> Self {
        Self {
            jquery_path: "/patchwork/jquery-1.4.2.js".to_string(),
            runtime_path: "/patchwork/jquery.patchwork.js".to_string(),
            block_ui_path: "/patchwork/blockui/jquery.blockUI.2.31.js".to_string(),
            templates_path: "/patchwork/template/jquery.templates.js".to_string(),
            templates_lang_folder: "/patchwork/template/lang/".to_string(),
            poll_path: "/patchwork/poll/jquery.poll.js".to_string(),
            form_path: "/patchwork/form/jquery.form.js".to_string(),
            autocomplete_path: "/patchwork/autocomplete/jquery.autocomplete.js".to_string(),
            autocomplete_css_path: "/patchwork/autocomplete/jquery.autocomplete.css".to_string(),
            runtime_object: "Patchwork.jq".to_string(),
            supported_languages: vec!["af".to_string(), "en".to_string()],
            production: false,
            default_timeout_ms: 20_000,
            default_timeout_retry_limit: 3,
        }
    }
}

impl BehaviorConfig {
    /// Unset keys keep their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// `language` when supported, English otherwise.
    pub fn resolve_language<'a>(&'a self, language: Option<&'a str>) -> &'a str {
        match language {
            Some(lang) if self.supported_languages.iter().any(|l| l == lang) => lang,
            _ => "en",
        }
    }

    /// First segment of [`BehaviorConfig::runtime_object`].
    pub fn runtime_root(&self) -> &str {
        self.runtime_object
            .split('.')
            .next()
            .unwrap_or(&self.runtime_object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg = BehaviorConfig::from_toml_str(
            r#"
            production = true
            runtime_object = "App.rt"
            supported_languages = ["en", "fr"]
            "#,
        )
        .unwrap();
        assert!(cfg.production);
        assert_eq!(cfg.runtime_root(), "App");
        assert_eq!(cfg.default_timeout_ms, 20_000);
        assert_eq!(cfg.jquery_path, BehaviorConfig::default().jquery_path);
        assert_eq!(cfg.resolve_language(Some("fr")), "fr");
        assert_eq!(cfg.resolve_language(Some("af")), "en");
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = BehaviorConfig::from_toml_str("production = \"yes\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = BehaviorConfig::load("/definitely/not/here.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }
}
