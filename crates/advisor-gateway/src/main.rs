use advisor_core::{
    area, prompt, render, Catalog, ChatRequest, ChatResponse, PersistedSelection, SelectionState,
};
use advisor_gateway::{telemetry, Gateway, GatewayConfig};
use advisor_local::{store::default_selection_path, FileSelectionStore, GatewayClient};
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "advisor")]
#[command(about = "Beauty-advisor chat gateway (primary/baseline fallback) and its client", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
#[allow(clippy::large_enum_variant)]
enum Commands {
    /// Run the HTTP gateway (`POST /api/chat`).
    Serve(GatewayConfig),
    /// Send one prompt through a running gateway and print the reply.
    Ask(AskCmd),
    /// Ask for a full routine built from the selected products.
    Routine(RoutineCmd),
    /// Inspect or change the persisted product selection.
    Selection(SelectionCmd),
    /// Replace the selection with a face area's products and print its routine.
    Area(AreaCmd),
    /// List catalog products, optionally filtered (json).
    Catalog(CatalogCmd),
    /// Diagnose configuration (json; no secrets).
    Doctor(DoctorCmd),
    /// Print version info.
    Version(VersionCmd),
}

#[derive(clap::Args, Debug)]
struct ClientArgs {
    /// Gateway origin; `/api/chat` is appended.
    #[arg(
        long,
        env = "ADVISOR_GATEWAY_URL",
        default_value = "http://127.0.0.1:8787"
    )]
    gateway_url: String,
    /// Request timeout (ms).
    #[arg(long, env = "ADVISOR_TIMEOUT_MS", default_value_t = advisor_local::DEFAULT_TIMEOUT_MS)]
    timeout_ms: u64,
    /// Selection file (default: `<data dir>/advisor/selection.json`).
    #[arg(long, env = "ADVISOR_SELECTION_FILE")]
    selection_file: Option<PathBuf>,
    /// Output format: text|json|html
    #[arg(long = "output", alias = "format", default_value = "text")]
    output: String,
}

#[derive(clap::Args, Debug)]
struct AskCmd {
    /// The question. When omitted, `--concern` is turned into a question.
    message: Option<String>,
    #[arg(long)]
    context: Option<String>,
    #[arg(long)]
    focus_area: Option<String>,
    #[arg(long)]
    concern: Option<String>,
    /// Catalog JSON; when given, the persisted selection is sent as product names.
    #[arg(long, env = "ADVISOR_CATALOG")]
    catalog: Option<PathBuf>,
    #[command(flatten)]
    client: ClientArgs,
}

#[derive(clap::Args, Debug)]
struct RoutineCmd {
    #[arg(long, env = "ADVISOR_CATALOG")]
    catalog: PathBuf,
    #[arg(long)]
    focus_area: Option<String>,
    #[arg(long)]
    concern: Option<String>,
    #[command(flatten)]
    client: ClientArgs,
}

#[derive(clap::Args, Debug)]
struct SelectionCmd {
    #[command(subcommand)]
    action: SelectionAction,
    /// Validate ids against this catalog and show product names.
    #[arg(long, env = "ADVISOR_CATALOG", global = true)]
    catalog: Option<PathBuf>,
    #[arg(long, env = "ADVISOR_SELECTION_FILE", global = true)]
    selection_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
enum SelectionAction {
    /// Print the selected ids (and names, with `--catalog`).
    List,
    /// Select the id if unselected, otherwise unselect it.
    Toggle { id: u64 },
    Remove { id: u64 },
    Clear,
}

#[derive(clap::Args, Debug)]
struct AreaCmd {
    /// forehead|eyes|nose|cheeks|lips|chin
    area: String,
    #[arg(long, env = "ADVISOR_CATALOG")]
    catalog: PathBuf,
    #[arg(long, env = "ADVISOR_SELECTION_FILE")]
    selection_file: Option<PathBuf>,
    /// Output format: text|json
    #[arg(long = "output", alias = "format", default_value = "text")]
    output: String,
}

#[derive(clap::Args, Debug)]
struct CatalogCmd {
    #[arg(long, env = "ADVISOR_CATALOG")]
    catalog: PathBuf,
    /// Exact category match.
    #[arg(long)]
    category: Option<String>,
    /// Case-insensitive substring of name, brand or description.
    #[arg(long)]
    search: Option<String>,
}

#[derive(clap::Args, Debug)]
struct DoctorCmd {
    /// Output format: json|text
    #[arg(long = "output", alias = "format", default_value = "json")]
    output: String,
}

#[derive(clap::Args, Debug)]
struct VersionCmd {
    /// Output format: json|text
    #[arg(long = "output", alias = "format", default_value = "json")]
    output: String,
}

/// Opt-in `ADVISOR_ENV_FILE`: `KEY=VALUE` lines, never overriding the process environment.
/// Values are never logged.
fn load_env_file() {
    let Ok(p) = std::env::var("ADVISOR_ENV_FILE") else {
        return;
    };
    let p = p.trim();
    if p.is_empty() {
        return;
    }
    let Ok(txt) = std::fs::read_to_string(p) else {
        return;
    };
    for raw in txt.lines() {
        let s = raw.trim();
        if s.is_empty() || s.starts_with('#') {
            continue;
        }
        let Some((k, v)) = s.split_once('=') else {
            continue;
        };
        let k = k.trim();
        if k.is_empty() {
            continue;
        }
        if std::env::var_os(k).is_none() {
            std::env::set_var(k, v.trim());
        }
    }
}

fn load_catalog(path: &Path) -> Result<Catalog> {
    let txt = std::fs::read_to_string(path)
        .with_context(|| format!("reading catalog {}", path.display()))?;
    Ok(Catalog::from_json(&txt)?)
}

fn selection_store(path: Option<PathBuf>) -> FileSelectionStore {
    FileSelectionStore::new(path.unwrap_or_else(default_selection_path))
}

fn load_selection(store: &FileSelectionStore, catalog: Option<&Catalog>) -> Result<SelectionState> {
    let mut state = SelectionState::load(store)?;
    if let Some(catalog) = catalog {
        state.retain_known(catalog);
    }
    Ok(state)
}

async fn send(args: &ClientArgs, req: &ChatRequest) -> Result<ChatResponse> {
    let client = GatewayClient::new(
        advisor_local::http_client()?,
        &args.gateway_url,
        advisor_local::timeout_from_ms(args.timeout_ms),
    )?;
    tracing::debug!(endpoint = %client.endpoint(), "sending prompt");
    Ok(client.send_prompt(req).await?)
}

fn print_reply(output: &str, resp: &ChatResponse) {
    match output.to_ascii_lowercase().as_str() {
        "json" => println!("{}", resp.to_envelope()),
        "html" => println!("{}", render::reply_to_html(&resp.text)),
        _ => println!("{}", resp.text),
    }
}

fn selection_report(state: &SelectionState, catalog: Option<&Catalog>) -> serde_json::Value {
    let products = catalog.map(|c| {
        c.resolve(state)
            .into_iter()
            .map(|p| serde_json::json!({"id": p.id, "name": p.name}))
            .collect::<Vec<_>>()
    });
    serde_json::json!({
        "kind": "selection",
        "selected": state.ids(),
        "products": products,
    })
}

fn doctor_report() -> serde_json::Value {
    fn has_env(k: &str) -> bool {
        std::env::var(k).ok().is_some_and(|v| !v.trim().is_empty())
    }

    let selection_path = default_selection_path();
    let selection_dir_writable = (|| -> Result<()> {
        let dir = selection_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| PathBuf::from("."));
        std::fs::create_dir_all(&dir)?;
        let check = dir.join(format!("advisor-doctor-{}.tmp", std::process::id()));
        std::fs::write(&check, b"ok")?;
        let _ = std::fs::remove_file(&check);
        Ok(())
    })()
    .is_ok();

    serde_json::json!({
        "schema_version": 1,
        "kind": "doctor",
        "ok": has_env("OPENAI_API_KEY"),
        "name": "advisor",
        "version": env!("CARGO_PKG_VERSION"),
        "configured": {
            "openai_api_key": has_env("OPENAI_API_KEY"),
            "upstream_base_url": has_env("ADVISOR_UPSTREAM_BASE_URL"),
            "gateway_url": has_env("ADVISOR_GATEWAY_URL"),
            "catalog": has_env("ADVISOR_CATALOG"),
            "selection_file": has_env("ADVISOR_SELECTION_FILE"),
            "env_file": has_env("ADVISOR_ENV_FILE"),
        },
        "checks": {
            "selection_dir_writable": selection_dir_writable,
        },
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    load_env_file();
    let cli = Cli::parse();
    match cli.command {
        Commands::Serve(_) => telemetry::init_tracing(),
        _ => telemetry::init_tracing_with_default("warn"),
    }

    match cli.command {
        Commands::Serve(cfg) => {
            let transport = cfg.transport(advisor_local::http_client()?)?;
            tracing::info!(
                primary = %cfg.primary_model,
                baseline = %cfg.baseline_model,
                timeout_ms = cfg.timeout_ms,
                "starting gateway"
            );
            let gateway = Arc::new(Gateway::new(Arc::new(transport), cfg.plan()));
            advisor_gateway::serve(cfg.bind, gateway).await?;
        }
        Commands::Ask(args) => {
            let concern = args.concern.clone();
            let message = match (args.message.as_deref(), concern.as_deref()) {
                (Some(m), _) if !m.trim().is_empty() => m.to_string(),
                (_, Some(c)) if !c.trim().is_empty() => prompt::concern_prompt(c.trim()),
                (m, _) => m.unwrap_or_default().to_string(),
            };
            let mut req = match args.catalog.as_deref() {
                Some(path) => {
                    let catalog = load_catalog(path)?;
                    let store = selection_store(args.client.selection_file.clone());
                    let state = load_selection(&store, Some(&catalog))?;
                    ChatRequest::from_selection(
                        message,
                        &catalog,
                        &state,
                        args.focus_area.clone(),
                        concern,
                    )
                }
                None => ChatRequest {
                    focus_area: args.focus_area.clone(),
                    concern,
                    ..ChatRequest::new(message)
                },
            };
            if let Some(context) = args.context {
                req = req.with_context(context);
            }
            let resp = send(&args.client, &req).await?;
            print_reply(&args.client.output, &resp);
        }
        Commands::Routine(args) => {
            let catalog = load_catalog(&args.catalog)?;
            let store = selection_store(args.client.selection_file.clone());
            let state = load_selection(&store, Some(&catalog))?;
            let message = prompt::routine_prompt(
                &catalog,
                &state,
                args.focus_area.as_deref(),
                args.concern.as_deref(),
            )?;
            let req = ChatRequest::from_selection(
                message,
                &catalog,
                &state,
                args.focus_area,
                args.concern,
            );
            let resp = send(&args.client, &req).await?;
            print_reply(&args.client.output, &resp);
        }
        Commands::Selection(args) => {
            let catalog = args.catalog.as_deref().map(load_catalog).transpose()?;
            let store = selection_store(args.selection_file);
            let mut sel = match catalog.as_ref() {
                Some(c) => PersistedSelection::load_known(store, c)?,
                None => PersistedSelection::load(store)?,
            };
            match args.action {
                SelectionAction::List => {
                    println!("{}", selection_report(sel.state(), catalog.as_ref()));
                }
                SelectionAction::Toggle { id } => {
                    let selected = match catalog.as_ref() {
                        Some(c) => sel.toggle_known(c, id)?,
                        None => sel.toggle(id)?,
                    };
                    println!("{}", serde_json::json!({"id": id, "selected": selected}));
                }
                SelectionAction::Remove { id } => {
                    let removed = sel.remove(id)?;
                    println!("{}", serde_json::json!({"id": id, "removed": removed}));
                }
                SelectionAction::Clear => {
                    sel.clear()?;
                    println!("{}", selection_report(sel.state(), catalog.as_ref()));
                }
            }
        }
        Commands::Area(args) => {
            let catalog = load_catalog(&args.catalog)?;
            let products = catalog.recommended_for_area(&args.area);
            let mut sel = PersistedSelection::load(selection_store(args.selection_file))?;
            sel.replace(products.iter().map(|p| p.id))?;
            tracing::debug!(area = %args.area, count = products.len(), "area selection replaced");
            let routine = area::area_routine(&args.area, products.len());
            match args.output.to_ascii_lowercase().as_str() {
                "json" => {
                    let v = serde_json::json!({
                        "kind": "area",
                        "area": args.area.trim(),
                        "selected": sel.state().ids(),
                        "products": products
                            .iter()
                            .map(|p| serde_json::json!({"id": p.id, "name": p.name}))
                            .collect::<Vec<_>>(),
                        "routine": routine,
                    });
                    println!("{v}");
                }
                _ => {
                    println!("> {}", area::area_request(&args.area));
                    println!();
                    println!("{routine}");
                }
            }
        }
        Commands::Catalog(args) => {
            let catalog = load_catalog(&args.catalog)?;
            let products = catalog.filter(args.category.as_deref(), args.search.as_deref());
            let v = serde_json::json!({
                "kind": "catalog",
                "categories": catalog.categories(),
                "count": products.len(),
                "products": products,
            });
            println!("{v}");
        }
        Commands::Doctor(args) => {
            let v = doctor_report();
            match args.output.to_ascii_lowercase().as_str() {
                "text" => {
                    println!("advisor {}", env!("CARGO_PKG_VERSION"));
                    if let Some(m) = v["configured"].as_object() {
                        for (k, ok) in m {
                            println!("  {k}: {ok}");
                        }
                    }
                    if let Some(m) = v["checks"].as_object() {
                        for (k, ok) in m {
                            println!("  {k}: {ok}");
                        }
                    }
                }
                _ => println!("{v}"),
            }
        }
        Commands::Version(args) => {
            let v = serde_json::json!({
                "schema_version": 1,
                "kind": "version",
                "ok": true,
                "name": "advisor",
                "version": env!("CARGO_PKG_VERSION"),
            });
            match args.output.to_ascii_lowercase().as_str() {
                "text" => println!("advisor {}", env!("CARGO_PKG_VERSION")),
                _ => println!("{v}"),
            }
        }
    }

    Ok(())
}
