//! symnav - symbol-level code navigation and editing for agents.
//!
//! This is the main entry point for the symnav CLI.

mod commands;
mod config;

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use commands::{init_logging, serve::serve, tool_schemas, tool_summary};
use config::Config;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use symnav_lsp::LspClient;
use symnav_symbols::{backend, OutputFormat};
use symnav_tools::{ToolContext, ToolRegistry};
use tokio::io::AsyncReadExt;
use tracing::{debug, info, warn};

#[derive(Parser)]
#[command(name = "symnav")]
#[command(author, version, about = "Symbol-level code navigation and editing backed by language servers", long_about = None)]
struct Cli {
    /// Project root (defaults to the current directory)
    #[arg(short, long, global = true)]
    project: Option<PathBuf>,

    /// Serialization of structured answers
    #[arg(long, global = true, value_enum)]
    format: Option<FormatArg>,

    /// Default answer budget in characters
    #[arg(long, global = true)]
    max_answer_chars: Option<usize>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Log to stderr instead of the log file
    #[arg(long, global = true)]
    log_stderr: bool,

    /// Subcommand
    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum FormatArg {
    Yaml,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Yaml => OutputFormat::Yaml,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

/// A zero-based position in a file.
#[derive(Args)]
struct PositionArgs {
    /// Project-relative file path
    relative_path: String,
    /// Line (0-based)
    line: u32,
    /// Character offset (0-based)
    character: u32,
}

/// A symbol addressed by name path.
#[derive(Args)]
struct SymbolArgs {
    /// Name path of the symbol, e.g. "MyClass/my_method"
    name_path: String,
    /// Project-relative file containing the symbol
    relative_path: String,
}

#[derive(Args)]
struct KindArgs {
    /// LSP symbol kinds to include (comma separated)
    #[arg(long, value_delimiter = ',')]
    include_kinds: Vec<i64>,
    /// LSP symbol kinds to exclude (comma separated)
    #[arg(long, value_delimiter = ',')]
    exclude_kinds: Vec<i64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Top-level symbols of a file
    Overview {
        relative_path: String,
    },
    /// Find symbols by name path pattern
    Find {
        /// Name path pattern, e.g. "Config/load" or "/main"
        pattern: String,
        /// Levels of children to include
        #[arg(short, long, default_value_t = 0)]
        depth: usize,
        /// Restrict the search to a file or directory
        #[arg(long)]
        within: Option<String>,
        /// Include symbol bodies
        #[arg(short, long)]
        body: bool,
        /// Match the last segment as a substring
        #[arg(short, long)]
        substring: bool,
        #[command(flatten)]
        kinds: KindArgs,
    },
    /// Symbols referencing a symbol
    Referencing {
        #[command(flatten)]
        symbol: SymbolArgs,
        #[command(flatten)]
        kinds: KindArgs,
    },
    /// Hover information at a position
    Hover {
        #[command(flatten)]
        position: PositionArgs,
    },
    /// Definition locations of the symbol at a position
    Definition {
        #[command(flatten)]
        position: PositionArgs,
    },
    /// Reference locations of the symbol at a position
    References {
        #[command(flatten)]
        position: PositionArgs,
    },
    /// The symbol defining the code at a position
    Defining {
        #[command(flatten)]
        position: PositionArgs,
        /// Include the symbol body
        #[arg(short, long)]
        body: bool,
    },
    /// Replace a symbol's definition (reads the body from stdin if omitted)
    ReplaceBody {
        #[command(flatten)]
        symbol: SymbolArgs,
        body: Option<String>,
    },
    /// Insert content after a symbol (reads stdin if omitted)
    InsertAfter {
        #[command(flatten)]
        symbol: SymbolArgs,
        body: Option<String>,
    },
    /// Insert content before a symbol (reads stdin if omitted)
    InsertBefore {
        #[command(flatten)]
        symbol: SymbolArgs,
        body: Option<String>,
    },
    /// Rename a symbol across the project
    Rename {
        #[command(flatten)]
        symbol: SymbolArgs,
        new_name: String,
    },
    /// Restart the language servers
    Restart,
    /// Call a tool with JSON arguments
    Call {
        /// Tool id
        tool: String,
        /// Arguments as a JSON object
        #[arg(default_value = "{}")]
        args: String,
    },
    /// List available tools
    Tools {
        /// Print descriptions and parameter schemas as JSON
        #[arg(long)]
        json: bool,
    },
    /// Answer JSON-lines tool requests from stdin
    Serve,
    /// Show configuration
    Config,
}

async fn read_body(body: Option<String>) -> anyhow::Result<String> {
    match body {
        Some(body) => Ok(body),
        None => {
            let mut body = String::new();
            tokio::io::stdin()
                .read_to_string(&mut body)
                .await
                .context("Failed to read body from stdin")?;
            Ok(body)
        }
    }
}

fn symbol_args(symbol: SymbolArgs) -> serde_json::Map<String, Value> {
    let mut args = serde_json::Map::new();
    args.insert("name_path".into(), symbol.name_path.into());
    args.insert("relative_path".into(), symbol.relative_path.into());
    args
}

fn position_args(position: PositionArgs) -> Value {
    json!({
        "relative_path": position.relative_path,
        "line": position.line,
        "character": position.character,
    })
}

/// The tool call a subcommand stands for.
async fn tool_call(command: Commands) -> anyhow::Result<(String, Value)> {
    let call = match command {
        Commands::Overview { relative_path } => (
            "get_symbols_overview",
            json!({ "relative_path": relative_path }),
        ),
        Commands::Find {
            pattern,
            depth,
            within,
            body,
            substring,
            kinds,
        } => (
            "find_symbol",
            json!({
                "name_path_pattern": pattern,
                "depth": depth,
                "relative_path": within.unwrap_or_default(),
                "include_body": body,
                "substring_matching": substring,
                "include_kinds": kinds.include_kinds,
                "exclude_kinds": kinds.exclude_kinds,
            }),
        ),
        Commands::Referencing { symbol, kinds } => {
            let mut args = symbol_args(symbol);
            args.insert("include_kinds".into(), json!(kinds.include_kinds));
            args.insert("exclude_kinds".into(), json!(kinds.exclude_kinds));
            ("find_referencing_symbols", Value::Object(args))
        }
        Commands::Hover { position } => ("get_hover_info", position_args(position)),
        Commands::Definition { position } => ("get_definition_locations", position_args(position)),
        Commands::References { position } => ("get_reference_locations", position_args(position)),
        Commands::Defining { position, body } => {
            let mut args = position_args(position);
            args["include_body"] = json!(body);
            ("get_defining_symbol", args)
        }
        Commands::ReplaceBody { symbol, body } => {
            let mut args = symbol_args(symbol);
            args.insert("body".into(), read_body(body).await?.into());
            ("replace_symbol_body", Value::Object(args))
        }
        Commands::InsertAfter { symbol, body } => {
            let mut args = symbol_args(symbol);
            args.insert("body".into(), read_body(body).await?.into());
            ("insert_after_symbol", Value::Object(args))
        }
        Commands::InsertBefore { symbol, body } => {
            let mut args = symbol_args(symbol);
            args.insert("body".into(), read_body(body).await?.into());
            ("insert_before_symbol", Value::Object(args))
        }
        Commands::Rename { symbol, new_name } => {
            let mut args = symbol_args(symbol);
            args.insert("new_name".into(), new_name.into());
            ("rename_symbol", Value::Object(args))
        }
        Commands::Restart => ("restart_language_server", json!({})),
        Commands::Call { tool, args } => {
            let args: Value = serde_json::from_str(&args).context("Tool arguments must be JSON")?;
            return Ok((tool, args));
        }
        Commands::Tools { .. } | Commands::Serve | Commands::Config => {
            anyhow::bail!("Not a tool command")
        }
    };
    Ok((call.0.to_string(), call.1))
}

fn show_config(config: &Config, sources: &[PathBuf]) -> anyhow::Result<()> {
    if sources.is_empty() {
        println!("// No configuration files found");
    }
    for source in sources {
        println!("// {}", source.display());
    }
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let project = match cli.project {
        Some(p) => p,
        None => std::env::current_dir()?,
    };
    let project = project
        .canonicalize()
        .with_context(|| format!("Project directory {} not found", project.display()))?;

    let (config, sources) = Config::load(Some(&project)).await?;
    let log_file = init_logging(cli.verbose, cli.log_stderr, config.log_level.as_deref());
    if let Some(path) = &log_file {
        debug!(path = %path.display(), "Logging to file");
    }
    info!(project = %project.display(), sources = sources.len(), "Starting symnav");

    if let Commands::Config = cli.command {
        return show_config(&config, &sources);
    }

    let settings = config.operation_settings(cli.format.map(Into::into), cli.max_answer_chars);
    let client = Arc::new(LspClient::with_configs(&project, config.lsp_configs()));
    let ops = backend::operations_for_client(Arc::clone(&client), settings);
    let mut registry = ToolRegistry::with_symbol_tools(ops);
    for id in config.disabled_tools() {
        if registry.unregister(id).is_none() {
            warn!(tool = %id, "Disabled tool is not registered");
        }
    }

    let ctx = ToolContext::new(&project);
    let abort = ctx.abort.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            abort.cancel();
        }
    });

    let result = match cli.command {
        Commands::Tools { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(&tool_schemas(&registry))?);
            } else {
                println!("{}", tool_summary(&registry));
            }
            Ok(())
        }
        Commands::Serve => {
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            serve(&registry, &ctx, ctx.abort.clone(), stdin, tokio::io::stdout())
                .await
                .map(drop)
        }
        command => match tool_call(command).await {
            Ok((tool, args)) => registry
                .execute(&tool, args, &ctx)
                .await
                .map(|out| println!("{}", out.output))
                .map_err(anyhow::Error::from),
            Err(e) => Err(e),
        },
    };

    if let Err(e) = client.close_all().await {
        warn!(error = %e, "Failed to shut down language servers");
    }
    result
}
