/// Content type of a patch batch response.
pub const PATCH_CONTENT_TYPE: &str = "text/xml";

/// Content type used for plain markup or text responses.
pub const HTML_CONTENT_TYPE: &str = "text/html";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// External script, `<script src=..>`.
    JsImport,
    /// External stylesheet, `<link rel=stylesheet href=..>`.
    CssImport,
    /// Inline `<script>` block.
    JsScript,
    /// Inline `<style>` block.
    CssStyle,
}

impl ResourceKind {
    /// Resources that may be inserted into the page head before any DOM
    /// mutation runs.
    pub fn is_structural(self) -> bool {
        !matches!(self, ResourceKind::JsScript)
    }
}
