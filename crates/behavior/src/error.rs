use patch::PatchError;
use std::fmt;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingError {
    /// Neither an override nor the source component gives a selector.
    NoCssSelector { kind: String, name: Option<String> },
    /// The strategy cannot be attached to this kind of component.
    UnsupportedSource { expected: &'static str, found: String },
    Unsupported(&'static str),
    Patch(PatchError),
}

impl fmt::Display for BindingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindingError::NoCssSelector { kind, name } => write!(
                f,
                "component {{{kind}:{}}} has no css selector; \
                 set an id or name, or a css selector on the binding",
                name.as_deref().unwrap_or("")
            ),
            BindingError::UnsupportedSource { expected, found } => {
                write!(f, "binding source must be a {expected}, not a {found}")
            }
            BindingError::Unsupported(what) => write!(f, "unsupported: {what}"),
            BindingError::Patch(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for BindingError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BindingError::Patch(err) => Some(err),
            _ => None,
        }
    }
}

impl From<PatchError> for BindingError {
    fn from(err: PatchError) -> Self {
        BindingError::Patch(err)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, source: std::io::Error },
    Parse(toml::de::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, source } => {
                write!(f, "failed to read {}: {source}", path.display())
            }
            ConfigError::Parse(err) => write!(f, "invalid behavior config: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io { source, .. } => Some(source),
            ConfigError::Parse(err) => Some(err),
        }
    }
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        ConfigError::Parse(err)
    }
}
