//! TOML batch cases: components with head resources, the commands that embed
//! them, and the expected command order after finalize.

use patch::{
    Command, Component, Control, CssImport, CssStyle, HeadElement, HeadElements, JsImport, JsScript,
    Operation, PatchBatch, TemplateModel,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

pub const BATCH_CASE_FORMAT_V1: &str = "patch-case-v1";

#[derive(Clone, Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ResourceSpec {
    JsImport {
        url: String,
    },
    CssImport {
        url: String,
    },
    JsScript {
        id: Option<String>,
        content: Option<String>,
        template: Option<String>,
        model: Option<TemplateModel>,
        #[serde(default)]
        dom_ready: bool,
        #[serde(default = "yes")]
        render_id: bool,
    },
    CssStyle {
        id: Option<String>,
        content: Option<String>,
    },
}

fn yes() -> bool {
    true
}

impl ResourceSpec {
    pub fn to_element(&self) -> HeadElement {
        match self {
            ResourceSpec::JsImport { url } => JsImport::new(url.as_str()).into(),
            ResourceSpec::CssImport { url } => CssImport::new(url.as_str()).into(),
            ResourceSpec::JsScript {
                id,
                content,
                template,
                model,
                dom_ready,
                render_id,
            } => JsScript {
                id: id.clone(),
                content: content.clone(),
                template: template.clone(),
                model: model.clone(),
                execute_on_dom_ready: *dom_ready,
                character_data: false,
                render_id: *render_id,
            }
            .into(),
            ResourceSpec::CssStyle { id, content } => CssStyle {
                id: id.clone(),
                content: content.clone(),
                character_data: false,
            }
            .into(),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct ComponentSpec {
    pub key: String,
    #[serde(default = "default_tag")]
    pub tag: String,
    pub id: Option<String>,
    pub name: Option<String>,
    pub text: Option<String>,
    /// Keys of components declared earlier in the file.
    #[serde(default)]
    pub children: Vec<String>,
    #[serde(default)]
    pub head: Vec<ResourceSpec>,
}

fn default_tag() -> String {
    "div".to_string()
}

#[derive(Clone, Debug, Deserialize)]
pub struct CommandSpec {
    pub op: String,
    pub select: Option<String>,
    pub text: Option<String>,
    /// Key of a declared component embedded as payload.
    pub component: Option<String>,
    #[serde(default)]
    pub resources: Vec<ResourceSpec>,
    #[serde(default)]
    pub args: Vec<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct BatchCase {
    pub format: String,
    pub name: String,
    #[serde(default)]
    pub known: Vec<ResourceSpec>,
    #[serde(default)]
    pub components: Vec<ComponentSpec>,
    pub commands: Vec<CommandSpec>,
    pub expected_tags: Vec<String>,
    pub expected: Option<String>,
}

impl BatchCase {
    pub fn build(&self) -> PatchBatch {
        let mut built: HashMap<&str, Rc<dyn Component>> = HashMap::new();
        for spec in &self.components {
            let mut control = Control::new(spec.tag.as_str());
            if let Some(id) = &spec.id {
                control = control.with_id(id.as_str());
            }
            if let Some(name) = &spec.name {
                control = control.with_name(name.as_str());
            }
            if let Some(text) = &spec.text {
                control = control.with_text(text.as_str());
            }
            for resource in &spec.head {
                control = control.with_head_element(resource.to_element());
            }
            for child in &spec.children {
                let child = built
                    .get(child.as_str())
                    .unwrap_or_else(|| {
                        panic!("case {}: unknown child component '{child}'", self.name)
                    });
                control = control.with_child(Rc::clone(child));
            }
            built.insert(spec.key.as_str(), Rc::new(control));
        }

        let mut batch = PatchBatch::new();
        let known: HeadElements = self.known.iter().map(ResourceSpec::to_element).collect();
        batch.set_known_resources(known);
        for spec in &self.commands {
            let mut command = Command::new(Operation::from_tag(&spec.op));
            if let Some(select) = &spec.select {
                command.set_selector(select.as_str());
            }
            if let Some(text) = &spec.text {
                command.add_text(text.as_str());
            }
            if let Some(key) = &spec.component {
                let component = built
                    .get(key.as_str())
                    .unwrap_or_else(|| panic!("case {}: unknown component '{key}'", self.name));
                command
                    .add_component(Rc::clone(component))
                    .unwrap_or_else(|err| panic!("case {}: {err}", self.name));
            }
            for resource in &spec.resources {
                command.add_resource(resource.to_element());
            }
            command.extend_arguments(spec.args.iter().cloned());
            batch
                .add(command)
                .unwrap_or_else(|err| panic!("case {}: {err}", self.name));
        }
        batch
    }
}

pub fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures")
}

pub fn load_case(path: &Path) -> BatchCase {
    let content = fs::read_to_string(path)
        .unwrap_or_else(|err| panic!("failed to read batch case {path:?}: {err}"));
    let case: BatchCase = toml::from_str(&content)
        .unwrap_or_else(|err| panic!("failed to parse batch case {path:?}: {err}"));
    assert_eq!(case.format, BATCH_CASE_FORMAT_V1, "unsupported format in {path:?}");
    case
}

/// Every `*.toml` case under [`fixtures_dir`], sorted by file name.
pub fn load_all_cases() -> Vec<BatchCase> {
    let dir = fixtures_dir();
    let mut paths: Vec<PathBuf> = fs::read_dir(&dir)
        .unwrap_or_else(|err| panic!("failed to list fixtures {dir:?}: {err}"))
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.extension().is_some_and(|ext| ext == "toml"))
        .collect();
    paths.sort();
    paths.iter().map(|path| load_case(path)).collect()
}

/// Model tables in fixtures are plain JSON objects.
pub fn model_from_json(json: &str) -> TemplateModel {
    match serde_json::from_str(json) {
        Ok(serde_json::Value::Object(map)) => map,
        Ok(other) => panic!("template model must be an object, got {other}"),
        Err(err) => panic!("invalid template model JSON: {err}"),
    }
}
