mod browse;
mod cli;
mod paths;
mod render;
mod run;
mod state;
mod viewer_cmd;

use anyhow::Result;
use cli::Command;
use paths::AppPaths;

fn main() -> Result<()> {
    let cli = cli::parse();
    run::initialise_tracing();
    let paths = AppPaths::discover()?;

    match cli.command {
        Some(Command::Page { page }) => run::run_page(&cli.catalog, &paths, page),
        Some(Command::Browse { start }) => browse::run_browse(&cli.catalog, &paths, start),
        Some(Command::Pages) => run::run_pages(&cli.catalog, &paths),
        Some(Command::Viewer(viewer)) => {
            viewer_cmd::run_viewer(&cli.catalog, &paths, viewer.action)
        }
        Some(Command::Where) => run::run_where(&cli.catalog, &paths),
        None => run::run_page(&cli.catalog, &paths, 1),
    }
}
