use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "acervo",
    author,
    version,
    about = "Browse a Tainacan art collection from the terminal",
    arg_required_else_help = false
)]
pub struct Cli {
    #[command(flatten)]
    pub catalog: CatalogArgs,
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Args, Debug, Clone, Default)]
pub struct CatalogArgs {
    /// Configuration file (defaults to `config.toml` in the config directory).
    #[arg(long, global = true, value_name = "FILE", env = "ACERVO_CONFIG")]
    pub config: Option<PathBuf>,

    /// Tainacan REST API base, e.g. `https://host/site/wp-json/tainacan/v2`.
    #[arg(long, global = true, value_name = "URL", env = "ACERVO_BASE_URL")]
    pub base_url: Option<String>,

    /// Numeric collection identifier.
    #[arg(long, global = true, value_name = "ID", env = "ACERVO_COLLECTION")]
    pub collection: Option<u64>,

    /// Items per gallery page.
    #[arg(long, global = true, value_name = "COUNT", value_parser = parse_page_size)]
    pub page_size: Option<u32>,

    /// Per-request timeout (e.g. `10s`, `1500ms`).
    #[arg(long, global = true, value_name = "DURATION", value_parser = parse_timeout)]
    pub timeout: Option<Duration>,

    /// Print machine-readable JSON instead of text.
    #[arg(long, global = true)]
    pub json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Fetch one gallery page and print its image cards.
    Page {
        /// Page number (1-based).
        #[arg(value_name = "PAGE", default_value_t = 1)]
        page: u32,
    },
    /// Navigate the gallery interactively (n, p, g <page>, r, q).
    Browse {
        /// Page to open first.
        #[arg(long, value_name = "PAGE", default_value_t = 1)]
        start: u32,
    },
    /// Estimate how many pages the collection has.
    Pages,
    /// Manage the embedded 3D viewer preference and build.
    Viewer(ViewerCommand),
    /// Print resolved configuration and state locations.
    Where,
}

#[derive(Parser, Debug)]
pub struct ViewerCommand {
    #[command(subcommand)]
    pub action: ViewerAction,
}

#[derive(Subcommand, Debug)]
pub enum ViewerAction {
    /// Show the embedded viewer.
    Show,
    /// Hide the embedded viewer.
    Hide,
    /// Flip the current preference.
    Toggle,
    /// Print whether the viewer is shown.
    Status,
    /// Print the loader configuration handed to the viewer runtime.
    Config,
    /// Check that a local build directory holds every viewer artifact.
    Check {
        #[arg(value_name = "DIR")]
        dir: PathBuf,
    },
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_page_size(value: &str) -> Result<u32, String> {
    let size: u32 = value
        .trim()
        .parse()
        .map_err(|_| format!("invalid page size '{value}'"))?;
    if size == 0 {
        return Err("page size must be greater than zero".into());
    }
    Ok(size)
}

pub fn parse_timeout(value: &str) -> Result<Duration, String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("timeout must not be empty".into());
    }
    let duration = match trimmed.parse::<u64>() {
        Ok(seconds) => Duration::from_secs(seconds),
        Err(_) => humantime::parse_duration(trimmed)
            .map_err(|err| format!("invalid timeout '{trimmed}': {err}"))?,
    };
    if duration.is_zero() {
        return Err("timeout must be greater than zero".into());
    }
    Ok(duration)
}
