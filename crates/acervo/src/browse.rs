use std::io::{self, BufRead, Write};
use std::sync::Arc;
use std::thread;

use anyhow::{anyhow, Result};
use crossbeam_channel::{never, select, unbounded, Receiver, Sender};
use pagination::{ApplyOutcome, ControllerOptions, GalleryController, LoadPlan, PageLoad};
use tainacan::TainacanClient;
use tracing::{debug, warn};

use crate::cli::CatalogArgs;
use crate::paths::AppPaths;
use crate::render;
use crate::run::{build_client, load_config};
use crate::state::ViewerPreference;

const HELP: &str =
    "commands: n (next), p (previous), g <page>, r (reload), v (toggle viewer), h (help), q (quit)";

enum Event {
    Line(String),
    InputClosed,
    Loaded(PageLoad),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrowseCommand {
    Next,
    Previous,
    Goto(u32),
    Reload,
    ToggleViewer,
    Help,
    Quit,
}

pub fn parse_command(line: &str) -> Result<BrowseCommand, String> {
    let mut parts = line.split_whitespace();
    let Some(head) = parts.next() else {
        return Err("empty command".into());
    };
    let command = match head.to_ascii_lowercase().as_str() {
        "n" | "next" => BrowseCommand::Next,
        "p" | "prev" | "previous" => BrowseCommand::Previous,
        "r" | "reload" | "retry" => BrowseCommand::Reload,
        "v" | "viewer" => BrowseCommand::ToggleViewer,
        "h" | "help" | "?" => BrowseCommand::Help,
        "q" | "quit" | "exit" => BrowseCommand::Quit,
        "g" | "go" | "goto" => {
            let target = parts
                .next()
                .ok_or_else(|| "usage: g <page>".to_string())?;
            let page: u32 = target
                .parse()
                .map_err(|_| format!("'{target}' is not a page number"))?;
            if page == 0 {
                return Err("pages start at 1".into());
            }
            BrowseCommand::Goto(page)
        }
        other => {
            if let Ok(page) = other.parse::<u32>() {
                if page > 0 {
                    return Ok(BrowseCommand::Goto(page));
                }
            }
            return Err(format!("unknown command '{other}'"));
        }
    };
    if parts.next().is_some() {
        return Err(format!("unexpected arguments after '{head}'"));
    }
    Ok(command)
}

pub fn run_browse(args: &CatalogArgs, paths: &AppPaths, start: u32) -> Result<()> {
    let config = load_config(args, paths)?;
    let client = Arc::new(build_client(&config)?);
    let mut controller = GalleryController::new(ControllerOptions::from(&config.discovery));
    let mut viewer = ViewerPreference::load(paths.state_file());

    let (load_tx, load_rx) = unbounded::<PageLoad>();
    let mut lines = spawn_input_reader()?;
    let mut in_flight = 0usize;
    let mut input_closed = false;

    let stdout = io::stdout();
    println!("{HELP}");
    spawn_load(controller.begin(start), &client, &load_tx)?;
    in_flight += 1;

    loop {
        if input_closed && in_flight == 0 {
            break;
        }
        let event = select! {
            recv(lines) -> line => Ok(line.map(Event::Line).unwrap_or(Event::InputClosed)),
            recv(load_rx) -> load => load
                .map(Event::Loaded)
                .map_err(|err| anyhow!("load channel closed: {err}")),
        }?;

        let line = match event {
            Event::InputClosed => {
                debug!("input closed");
                input_closed = true;
                lines = never();
                continue;
            }
            Event::Loaded(load) => {
                in_flight = in_flight.saturating_sub(1);
                if apply_load(&mut controller, load) {
                    let mut out = stdout.lock();
                    render::write_gallery(&mut out, &controller, args.json)?;
                    out.flush()?;
                }
                continue;
            }
            Event::Line(line) => line,
        };
        if line.trim().is_empty() {
            continue;
        }
        let command = match parse_command(&line) {
            Ok(command) => command,
            Err(message) => {
                println!("{message}");
                continue;
            }
        };
        let target = match command {
            BrowseCommand::Quit => break,
            BrowseCommand::Help => {
                println!("{HELP}");
                None
            }
            BrowseCommand::ToggleViewer => {
                let visible = viewer.toggle();
                println!("viewer {}", if visible { "shown" } else { "hidden" });
                None
            }
            BrowseCommand::Reload => Some(controller.state().current_page),
            BrowseCommand::Goto(page) => Some(page),
            BrowseCommand::Next => {
                let next = controller.next_page();
                if next.is_none() {
                    println!("already on the last page");
                }
                next
            }
            BrowseCommand::Previous => {
                let previous = controller.previous_page();
                if previous.is_none() {
                    println!("already on the first page");
                }
                previous
            }
        };
        if let Some(page) = target {
            println!("Loading page {page}...");
            spawn_load(controller.begin(page), &client, &load_tx)?;
            in_flight += 1;
        }
    }
    Ok(())
}

/// Folds a finished load into the controller and reports whether the view
/// changed. A stale load is not shown, but it may still have settled the page
/// count, which changes the footer.
fn apply_load(controller: &mut GalleryController, load: PageLoad) -> bool {
    let before = controller.state();
    match controller.apply(load) {
        ApplyOutcome::Applied => true,
        ApplyOutcome::Stale => controller.state() != before,
    }
}

fn spawn_load(
    plan: LoadPlan,
    client: &Arc<TainacanClient>,
    results: &Sender<PageLoad>,
) -> Result<()> {
    let client = Arc::clone(client);
    let results = results.clone();
    let page = plan.ticket().page();
    thread::Builder::new()
        .name(format!("acervo-load-{page}"))
        .spawn(move || {
            let load = plan.execute(&client);
            if results.send(load).is_err() {
                debug!(page, "browser closed before page load finished");
            }
        })
        .map_err(|err| anyhow!("failed to spawn page loader: {err}"))?;
    Ok(())
}

fn spawn_input_reader() -> Result<Receiver<String>> {
    let (line_tx, line_rx) = unbounded();
    thread::Builder::new()
        .name("acervo-input".into())
        .spawn(move || {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                match line {
                    Ok(line) => {
                        if line_tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(err) => {
                        warn!(error = %err, "failed to read input");
                        break;
                    }
                }
            }
        })
        .map_err(|err| anyhow!("failed to spawn input reader: {err}"))?;
    Ok(line_rx)
}
