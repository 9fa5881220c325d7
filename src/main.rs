use behavior::{
    ActionResult, AjaxBinding, AutoCompleteBinding, BehaviorConfig, FormBinding, Page, PollBinding,
    Request, TemplateBinding, Widget,
};
use clap::Parser;
use patch::{Control, CssImport, JsScript, PatchBatch, RenderContext, TemplateRegistry};
use std::path::PathBuf;
use std::process::ExitCode;
use std::rc::Rc;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

const PAGE_PATH: &str = "/home.htm";
const COUNTRIES: &[&str] = &["Chad", "Chile", "China", "Norway", "Namibia"];

#[derive(Parser, Debug)]
#[command(name = "patchwork")]
#[command(about = "Builds a demo page, runs its head pass and answers one async request")]
struct Cli {
    /// Component id the request targets
    #[arg(long, default_value = "save")]
    target: String,
    /// Browser event of the request
    #[arg(long, default_value = "click")]
    event: String,
    /// Sub-discriminator passed through to the handler
    #[arg(long)]
    which: Option<String>,
    /// Text typed into an autocomplete field
    #[arg(long)]
    criteria: Option<String>,
    /// Request language
    #[arg(long)]
    language: Option<String>,
    /// TOML behavior configuration
    #[arg(long)]
    config: Option<PathBuf>,
    /// Print the page head before the response
    #[arg(long)]
    head: bool,
}

fn demo_page() -> Page {
    let save = AjaxBinding::default()
        .configure(|o| {
            o.busy_indicator_message("Saving...").data("draft", false);
        })
        .with_handler(|source, event| {
            let note = Rc::new(
                Control::new("span")
                    .with_id("note")
                    .with_text("Saved")
                    .with_head_element(CssImport::new("/css/note.css")),
            );
            let mut batch = PatchBatch::new();
            batch.replace_content("#message", note as Rc<dyn patch::Component>)?;
            batch.add_class("#message", "flash")?;
            if event.which.as_deref() == Some("2") {
                batch.hide(source.css_selector().unwrap_or_default())?;
            }
            batch.eval_script(JsScript::templated("/js/saved.js", {
                let mut model = patch::TemplateModel::new();
                model.insert("target".to_string(), "#message".into());
                model
            }))?;
            Ok(Some(batch.into()))
        });

    let status = PollBinding::new()
        .with_poll_id("status")
        .with_handler(|_source, _event| {
            let mut batch = PatchBatch::new();
            batch.replace_content("#status", "idle")?;
            Ok(Some(batch.into()))
        });

    let signup = FormBinding::new()
        .reset_form(true)
        .with_handler(|_source, _event| {
            let thanks = ActionResult::content(core_types::HTML_CONTENT_TYPE, "<p>Thanks</p>");
            Ok(Some(thanks))
        });

    let country = AutoCompleteBinding::new()
        .with_autocomplete_option("max", 6)
        .with_suggestions(|criteria| {
            COUNTRIES
                .iter()
                .filter(|c| c.to_lowercase().starts_with(&criteria.to_lowercase()))
                .map(|c| c.to_string())
                .collect()
        });

    Page::new(PAGE_PATH)
        .with_widget(Widget::new(Control::new("a").with_id("save")).with_binding(save))
        .with_widget(Widget::new(Control::new("span").with_id("status")).with_binding(status))
        .with_widget(Widget::new(Control::new("form").with_id("signup")).with_binding(signup))
        .with_widget(Widget::new(Control::new("input").with_id("country")).with_binding(country))
        .with_widget(
            Widget::new(Control::new("table").with_id("orders"))
                .with_binding(TemplateBinding::new("/js/orders.js").with_model("rows", 20)),
        )
}

fn run(cli: &Cli) -> Result<String, Box<dyn std::error::Error>> {
    let config = match &cli.config {
        Some(path) => BehaviorConfig::load(path)?,
        None => BehaviorConfig::default(),
    };
    let templates = TemplateRegistry::new()
        .with_template("/js/saved.js", "jQuery('${target}').fadeIn();")
        .with_template("/js/orders.js", "jQuery('${cssSelector}').data('rows', ${rows});");
    let render = RenderContext::with_engine(&templates);

    let mut page = demo_page();
    page.prepare_head(&config, cli.language.as_deref())?;
    log::info!(target: "patchwork", "head prepared with {} elements", page.head_elements().len());

    let mut out = String::new();
    if cli.head {
        out.push_str(&page.render_head(&render)?);
        out.push('\n');
    }

    let mut request = Request::new(PAGE_PATH)
        .with_param(cli.target.as_str(), "1")
        .with_param(behavior::request::EVENT_PARAM, cli.event.as_str());
    if let Some(which) = &cli.which {
        request = request.with_param(behavior::request::WHICH_PARAM, which.as_str());
    }
    if let Some(criteria) = &cli.criteria {
        request = request.with_param(behavior::autocomplete::CRITERIA_PARAM, criteria.as_str());
    }
    if let Some(language) = &cli.language {
        request = request.with_language(language.as_str());
    }

    let response = page.dispatch(&request, &render)?;
    if response.is_empty() {
        log::warn!(target: "patchwork", "request targeted no binding");
    }
    out.push_str(&format!("Content-Type: {}\n\n{}", response.content_type, response.body));
    Ok(out)
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(&cli) {
        Ok(out) => {
            println!("{out}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!(target: "patchwork", "{err}");
            ExitCode::FAILURE
        }
    }
}
