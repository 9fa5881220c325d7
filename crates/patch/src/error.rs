use crate::template::TemplateError;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchError {
    /// A mutation helper got no usable target (blank selector, or a command
    /// that needs a selector was added without one).
    InvalidTarget(&'static str),
    /// A component payload or target exposes neither id nor name.
    MissingSelector { kind: String, name: Option<String> },
    /// Blank content handed to a content-bearing helper.
    InvalidContent(&'static str),
    /// `finalize` ran twice on the same batch.
    AlreadyFinalized,
    Template(TemplateError),
}

impl fmt::Display for PatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatchError::InvalidTarget(detail) => write!(f, "invalid target: {detail}"),
            PatchError::MissingSelector { kind, name } => write!(
                f,
                "no selector could be found for the component: {kind}#{}",
                name.as_deref().unwrap_or("")
            ),
            PatchError::InvalidContent(detail) => write!(f, "invalid content: {detail}"),
            PatchError::AlreadyFinalized => f.write_str("patch batch was already finalized"),
            PatchError::Template(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for PatchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            PatchError::Template(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TemplateError> for PatchError {
    fn from(err: TemplateError) -> Self {
        PatchError::Template(err)
    }
}
