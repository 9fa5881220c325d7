pub mod batch;
pub mod command;
pub mod component;
pub mod element;
pub mod markup;
pub mod resources;
pub mod template;

mod error;

pub use batch::{Content, PatchBatch, ROOT_TAG, Target};
pub use command::{Command, Operation, PayloadItem};
pub use component::{Component, Control, render_to_string, selector_for};
pub use element::{CssImport, CssStyle, HeadElement, HeadElements, JsImport, JsScript, ResourceKey};
pub use error::PatchError;
pub use markup::MarkupBuffer;
pub use resources::ResourceSet;
pub use template::{
    RenderContext, TemplateEngine, TemplateError, TemplateModel, TemplateRegistry,
    expand_placeholders,
};
