pub mod ajax;
pub mod autocomplete;
pub mod binding;
pub mod config;
mod error;
pub mod event;
pub mod form;
pub mod model;
pub mod options;
pub mod page;
pub mod poll;
pub mod registry;
pub mod request;
pub mod template_binding;

pub use ajax::AjaxBinding;
pub use autocomplete::{AutoCompleteBinding, suggestions_result};
pub use binding::{
    ActionHandler, ActionResult, BindingKey, HandlerResult, HeadContext, InteractionBinding,
    event_matches,
};
pub use config::BehaviorConfig;
pub use error::{BindingError, ConfigError};
pub use event::AjaxEvent;
pub use form::FormBinding;
pub use options::BindingOptions;
pub use page::{Dispatch, Page, Response, Widget};
pub use poll::{PollBinding, PollSettings};
pub use registry::{AddOutcome, BindingSet};
pub use request::Request;
pub use template_binding::TemplateBinding;
