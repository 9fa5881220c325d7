use patch::{
    Command, Component, Content, Control, HeadElement, JsImport, JsScript, Operation, PatchBatch,
    PatchError, PayloadItem, RenderContext, TemplateRegistry,
};
use patch_test_support::fixture::{load_all_cases, model_from_json};
use patch_test_support::{anonymous, assert_markup_eq, widget};
use std::rc::Rc;

fn tags(batch: &PatchBatch) -> Vec<String> {
    batch.commands().iter().map(|c| c.tag().to_string()).collect()
}

fn scripts_in(command: &Command) -> Vec<&JsScript> {
    command
        .payload()
        .iter()
        .filter_map(|item| match item {
            PayloadItem::Resource(HeadElement::JsScript(script)) => Some(script),
            _ => None,
        })
        .collect()
}

#[test]
fn fixture_cases_finalize_into_expected_zones() {
    let cases = load_all_cases();
    assert!(!cases.is_empty(), "no fixture cases found");
    for case in cases {
        let mut batch = case.build();
        let rendered = batch
            .serialize(&RenderContext::new())
            .unwrap_or_else(|err| panic!("case {}: {err}", case.name));
        assert_eq!(tags(&batch), case.expected_tags, "case {}", case.name);
        if let Some(expected) = &case.expected {
            assert_markup_eq(expected, &rendered);
        }
    }
}

#[test]
fn plain_commands_keep_order_after_structural_header() {
    let mut batch = PatchBatch::new();
    batch.replace("#a", widget("a", &["/a.js"])).unwrap();
    batch.hide("#b").unwrap();
    batch.append("#c", "<i>c</i>").unwrap();
    batch.finalize().unwrap();
    assert_eq!(tags(&batch), ["addHeader", "replace", "hide", "append"]);
}

#[test]
fn evals_move_to_the_end_in_order() {
    let mut batch = PatchBatch::new();
    batch.show("#a").unwrap();
    batch.eval("x();").unwrap();
    batch.show("#b").unwrap();
    batch.eval("y();").unwrap();
    batch.finalize().unwrap();
    let order: Vec<String> = batch
        .commands()
        .iter()
        .map(|c| match c.payload().first() {
            Some(PayloadItem::Text(text)) => text.clone(),
            _ => c.selector().unwrap_or_default().to_string(),
        })
        .collect();
    assert_eq!(order, ["#a", "#b", "x();", "y();"]);
}

#[test]
fn leading_custom_commands_stay_in_front() {
    let mut batch = PatchBatch::new();
    batch.custom("<c1/>").unwrap();
    batch.custom("<c2/>").unwrap();
    batch.replace("#t", widget("t", &["/t.js"])).unwrap();
    batch.eval_script(JsScript::with_content("late();")).unwrap();
    batch.finalize().unwrap();
    assert_eq!(tags(&batch), ["custom", "custom", "addHeader", "replace", "eval"]);
    assert!(matches!(
        batch.commands()[0].payload(),
        [PayloadItem::Text(text)] if text == "<c1/>"
    ));
}

#[test]
fn same_import_from_two_components_is_sent_once() {
    let mut batch = PatchBatch::new();
    batch.replace("#a", widget("a", &["/jquery.js", "/a.js"])).unwrap();
    batch.append("#list", widget("b", &["/jquery.js"])).unwrap();
    batch.finalize().unwrap();
    let header = &batch.commands()[0];
    assert!(header.is(&Operation::AddHeader));
    let jquery = header
        .payload()
        .iter()
        .filter(|item| {
            matches!(item, PayloadItem::Resource(HeadElement::JsImport(i)) if i.src == "/jquery.js")
        })
        .count();
    assert_eq!(jquery, 1);
    assert_eq!(header.payload().len(), 2);
}

#[test]
fn anonymous_scripts_are_never_merged() {
    let snippet = || JsScript::with_content("track();");
    let a: Rc<dyn Component> = Rc::new(Control::new("p").with_id("a").with_head_element(snippet()));
    let b: Rc<dyn Component> = Rc::new(Control::new("p").with_id("b").with_head_element(snippet()));
    let mut batch = PatchBatch::new();
    batch.replace_self(a).unwrap();
    batch.replace_self(b).unwrap();
    batch.finalize().unwrap();
    let last = batch.commands().last().unwrap();
    assert!(last.is(&Operation::AddHeader));
    assert_eq!(scripts_in(last).len(), 2);
}

#[test]
fn dom_ready_scripts_lose_flag_and_id() {
    let script = JsScript::with_content("init();").id("foo").dom_ready(true);
    let panel: Rc<dyn Component> =
        Rc::new(Control::new("div").with_id("p").with_head_element(script));
    let mut batch = PatchBatch::new();
    batch.replace_self(panel).unwrap();
    batch.finalize().unwrap();
    let scripts = scripts_in(batch.commands().last().unwrap());
    assert_eq!(scripts.len(), 1);
    assert!(!scripts[0].execute_on_dom_ready);
    assert_eq!(scripts[0].id, None);
    assert!(scripts[0].character_data);
}

#[test]
fn identified_scripts_keep_their_id() {
    let script = JsScript::with_content("keep();").id("keep");
    let mut batch = PatchBatch::new();
    batch.add_header([script]).unwrap();
    batch.finalize().unwrap();
    assert_eq!(tags(&batch), ["addHeader"]);
    assert_eq!(scripts_in(&batch.commands()[0])[0].id.as_deref(), Some("keep"));
}

#[test]
fn component_without_selector_cannot_be_replaced() {
    let mut batch = PatchBatch::new();
    let err = batch.replace_self(anonymous("div")).unwrap_err();
    assert!(matches!(err, PatchError::MissingSelector { .. }));
    let err = batch.replace(anonymous("div"), "x").unwrap_err();
    assert!(matches!(err, PatchError::MissingSelector { .. }));
    assert!(batch.is_empty());
}

#[test]
fn replace_content_round_trip() {
    let mut batch = PatchBatch::new();
    batch.replace_content("#span1", "Hello").unwrap();
    let body = batch.serialize(&RenderContext::new()).unwrap();
    assert!(body.contains("<replaceContent select=\"#span1\">Hello\n</replaceContent>"));
    assert!(!body.contains("addHeader"));
    assert_eq!(batch.content_type(), "text/xml");
}

#[test]
fn finalize_runs_once() {
    let mut batch = PatchBatch::new();
    batch.show("#a").unwrap();
    batch.finalize().unwrap();
    assert_eq!(batch.finalize(), Err(PatchError::AlreadyFinalized));
    // serialize after an explicit finalize only renders
    assert!(batch.serialize(&RenderContext::new()).is_ok());
}

#[test]
fn eval_expands_templated_scripts() {
    let registry = TemplateRegistry::new().with_template("/poll.js", "poll($delay);");
    let model = model_from_json(r#"{"delay": 500}"#);
    let mut script = JsScript::templated("/poll.js", model);
    script.content = Some("ready();".into());
    let mut batch = PatchBatch::new();
    batch.eval_script(script).unwrap();
    let body = batch.serialize(&RenderContext::with_engine(&registry)).unwrap();
    assert_eq!(body, "<taconite>\n<eval><![CDATA[ poll(500);ready();\n ]]></eval>\n</taconite>");
}

#[test]
fn eval_text_with_cdata_terminator_stays_well_formed() {
    let mut batch = PatchBatch::new();
    batch.eval("var s = 'a]]>b';").unwrap();
    let body = batch.serialize(&RenderContext::new()).unwrap();
    assert!(body.contains("var s = 'a]]]]><![CDATA[>b';"));
}

#[test]
fn known_imports_are_not_resent() {
    let mut batch = PatchBatch::new();
    let mut known = patch::HeadElements::new();
    known.add(JsImport::new("/jquery.js"));
    batch.set_known_resources(known);
    batch.replace("#a", Content::from(widget("a", &["/jquery.js"]))).unwrap();
    batch.finalize().unwrap();
    assert_eq!(tags(&batch), ["replace"]);
}

#[test]
fn known_dom_ready_scripts_still_run_for_replaced_markup() {
    let script = JsScript::with_content("initTree();").id("tree-init").dom_ready(true);
    let mut known = patch::HeadElements::new();
    known.add(script.clone());
    let tree: Rc<dyn Component> =
        Rc::new(Control::new("div").with_id("tree").with_head_element(script));

    let mut batch = PatchBatch::new();
    batch.set_known_resources(known);
    batch.replace_self(tree).unwrap();
    batch.finalize().unwrap();

    assert_eq!(tags(&batch), ["replace", "addHeader"]);
    let scripts = scripts_in(batch.commands().last().unwrap());
    assert_eq!(scripts.len(), 1);
    assert_eq!(scripts[0].content.as_deref(), Some("initTree();"));
    assert_eq!(scripts[0].id, None);
    assert!(!scripts[0].execute_on_dom_ready);
}
