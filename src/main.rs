//! sidetree - an incremental filesystem tree for editor side panels.
//!
//! Usage:
//!   sidetree [PATH]             Run the line-driven host on stdin
//!   sidetree tree [PATH]        Print the tree once
//!   sidetree export [PATH]      Export the walked tree to JSON
//!   sidetree --help             Show help
//!
//! The host reads one command per line, `<command_id> [json args]`, for
//! example `open {"path": "/tmp/src"}`, and prints the tree after every
//! committed change. Closing stdin saves the session and exits.

use std::fmt::Write as _;
use std::io::Write as _;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use clap::{Parser, Subcommand};
use color_eyre::eyre::{Context, Result};
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

use sidetree_app::{CommandId, Engine, RenderError, Renderer, Stage, State, rows};
use sidetree_core::Settings;
use sidetree_scan::WalkExecutor;

const DEFAULT_FILTER: &str =
    "sidetree=info,sidetree_core=info,sidetree_scan=info,sidetree_ops=info,sidetree_app=info";

/// How long to wait for the session to be written after stdin closes.
const SAVE_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Parser)]
#[command(
    name = "sidetree",
    version,
    about = "An incremental filesystem tree for editor side panels",
    long_about = "sidetree keeps a directory tree in sync with the disk.\n\n\
                  Run `sidetree [PATH]` and type commands on stdin, or use \
                  subcommands for one-shot output."
)]
struct Cli {
    /// Working directory (defaults to current directory)
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Settings file (defaults to the user config directory)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Print the tree once and exit
    Tree {
        /// Directory to print
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Include dot entries
        #[arg(short = 'a', long)]
        hidden: bool,
    },

    /// Export the walked tree to JSON
    Export {
        /// Directory to walk
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_deref())?;

    match cli.command {
        Some(Command::Tree { path, hidden }) => run_tree(settings, &path, hidden).await,
        Some(Command::Export { path, output }) => run_export(settings, &path, output).await,
        None => run_host(settings, &cli.path).await,
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_settings(path: Option<&Path>) -> Result<Settings> {
    let settings = match path {
        Some(path) => Settings::load_from(path),
        None => Settings::load(),
    };
    settings.wrap_err("Failed to load settings")
}

/// Walk `path` once, without the scheduler.
async fn walk_once(settings: Settings, path: &Path) -> Result<State> {
    let workdir = path.canonicalize().context("Invalid path")?;
    let executor = WalkExecutor::new(settings.walk_threads)?;
    let state = State::initial(settings, workdir, executor)
        .await
        .context("Walk failed")?;
    Ok(state)
}

/// Print the tree as the host would see it on first render.
async fn run_tree(settings: Settings, path: &Path, hidden: bool) -> Result<()> {
    let mut state = walk_once(settings, path).await?;
    if hidden {
        state.show_hidden = true;
    }
    print!("{}", draw(&state, None));
    Ok(())
}

/// Export the walked tree to JSON.
async fn run_export(settings: Settings, path: &Path, output: Option<PathBuf>) -> Result<()> {
    let state = walk_once(settings, path).await?;
    let json = serde_json::to_string_pretty(&*state.root)?;

    match output {
        Some(output_path) => {
            std::fs::write(&output_path, json)?;
            eprintln!("Exported to {}", output_path.display());
        }
        None => {
            println!("{}", json);
        }
    }

    Ok(())
}

/// Drive the engine from stdin until it closes.
async fn run_host(settings: Settings, path: &Path) -> Result<()> {
    let workdir = path.canonicalize().context("Invalid path")?;
    let engine = Engine::new(settings, workdir, Stdout)
        .await
        .context("Failed to start")?;

    let events = engine.sender();
    let shutdown = engine.shutdown_token();
    let mut staged = engine.subscribe();
    let task = tokio::spawn(engine.run());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        match parse_command(line) {
            Ok((command, args)) => events.sync(command, args)?,
            Err(reason) => tracing::warn!(%reason, "ignored input"),
        }
    }

    events.sync(CommandId::SaveSession, Value::Null)?;
    let saved = staged.wait_for(|stage| stage.as_ref().is_some_and(|s| !s.state.host_focus));
    if !matches!(tokio::time::timeout(SAVE_TIMEOUT, saved).await, Ok(Ok(_))) {
        tracing::warn!("session was not saved before exit");
    }

    shutdown.cancel();
    task.await.context("Engine task failed")?;
    Ok(())
}

/// Split `<command_id> [json]` into a command and its arguments.
fn parse_command(line: &str) -> Result<(CommandId, Value), String> {
    let (id, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let command = CommandId::from_str(id).map_err(|_| format!("unknown command `{id}`"))?;
    let rest = rest.trim();
    let args = if rest.is_empty() {
        Value::Null
    } else {
        serde_json::from_str(rest).map_err(|err| format!("bad arguments for {command}: {err}"))?
    };
    Ok((command, args))
}

/// Renders every committed stage to stdout.
struct Stdout;

#[async_trait]
impl Renderer for Stdout {
    async fn render(&self, stage: &Stage) -> Result<(), RenderError> {
        let mut text = draw(&stage.state, stage.focus.as_deref());
        // Bell asks the terminal for attention.
        if stage.grab_focus {
            text.insert_str(0, "\x07");
        }
        let mut out = std::io::stdout().lock();
        out.write_all(text.as_bytes())
            .and_then(|()| out.flush())
            .map_err(|err| match err.kind() {
                std::io::ErrorKind::Interrupted | std::io::ErrorKind::WouldBlock => {
                    RenderError::Unavailable(err.to_string())
                }
                _ => RenderError::Fatal(err.to_string()),
            })
    }
}

/// One frame: a header line, then one line per row clipped to the panel width.
fn draw(state: &State, focus: Option<&Path>) -> String {
    let rows = rows(state);
    let mut frame = String::new();
    let _ = writeln!(frame, "── {} ({} rows)", state.root.path.display(), rows.len());

    for row in &rows {
        let cursor = if focus == Some(row.path.as_path()) { '>' } else { ' ' };
        let mark = if row.selected { '*' } else { ' ' };
        let arrow = match (row.is_dir, row.expanded) {
            (true, true) => "▾ ",
            (true, false) => "▸ ",
            _ => "  ",
        };
        let suffix = if row.is_dir {
            "/"
        } else if row.mode.is_link() {
            "@"
        } else {
            ""
        };

        let line = format!(
            "{cursor}{mark}{}{arrow}{}{suffix}",
            "  ".repeat(row.depth),
            row.name
        );
        let clipped: String = line.chars().take(state.width.max(1)).collect();
        let _ = writeln!(frame, "{}", clipped);
    }
    frame
}
