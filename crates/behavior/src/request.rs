//! Incoming request as the binding layer sees it: a path, ordered query
//! parameters and an optional language.

use indexmap::IndexMap;
use serde_json::Value;
use url::{Url, form_urlencoded};

pub const EVENT_PARAM: &str = "event";
pub const WHICH_PARAM: &str = "which";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Request {
    path: String,
    params: Vec<(String, String)>,
    language: Option<String>,
}

impl Request {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            ..Self::default()
        }
    }

    /// `query` is an `application/x-www-form-urlencoded` string without the
    /// leading `?`.
    pub fn from_query(path: impl Into<String>, query: &str) -> Self {
        let params = form_urlencoded::parse(query.as_bytes()).into_owned().collect();
        Self {
            path: path.into(),
            params,
            language: None,
        }
    }

    pub fn from_url(url: &str) -> Result<Self, url::ParseError> {
        let url = Url::parse(url)?;
        Ok(Self {
            path: url.path().to_string(),
            params: url.query_pairs().into_owned().collect(),
            language: None,
        })
    }

    pub fn with_param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((name.into(), value.into()));
        self
    }

    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = Some(language.into());
        self
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn language(&self) -> Option<&str> {
        self.language.as_deref()
    }

    /// First value of `name`.
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_param(&self, name: &str) -> bool {
        self.params.iter().any(|(n, _)| n == name)
    }

    pub fn params(&self) -> impl Iterator<Item = (&str, &str)> {
        self.params.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn event(&self) -> Option<&str> {
        self.param(EVENT_PARAM)
    }

    pub fn which(&self) -> Option<&str> {
        self.param(WHICH_PARAM)
    }
}

/// Encodes request data as a query string; strings go in raw, other values
/// as JSON text.
pub fn encode_data(data: &IndexMap<String, Value>) -> String {
    let mut out = form_urlencoded::Serializer::new(String::new());
    for (name, value) in data {
        match value {
            Value::String(s) => out.append_pair(name, s),
            other => out.append_pair(name, &other.to_string()),
        };
    }
    out.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn query_parameters_keep_order_and_decode() {
        let req = Request::from_query("/page", "event=CLICK&which=1&q=a+b%26c&which=2");
        assert_eq!(req.event(), Some("CLICK"));
        assert_eq!(req.which(), Some("1"));
        assert_eq!(req.param("q"), Some("a b&c"));
        assert!(!req.has_param("link"));
    }

    #[test]
    fn url_form_takes_path_and_query() {
        let req = Request::from_url("http://host/app/home.htm?link=1&event=click").unwrap();
        assert_eq!(req.path(), "/app/home.htm");
        assert!(req.has_param("link"));
    }

    #[test]
    fn data_is_url_encoded_in_insertion_order() {
        let mut data = IndexMap::new();
        data.insert("name".to_string(), json!("a b"));
        data.insert("page".to_string(), json!(2));
        data.insert("amp".to_string(), json!("x&y"));
        assert_eq!(encode_data(&data), "name=a+b&page=2&amp=x%26y");
    }
}
