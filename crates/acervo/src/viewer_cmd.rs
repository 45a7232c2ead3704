use std::path::Path;

use anyhow::{bail, Result};
use serde_json::json;
use tracing::info;
use viewer::{
    BuildDirectoryLoader, EmbedEvents, EmbedSession, LoaderConfig, MountTarget, ViewerStatus,
};

use crate::cli::{CatalogArgs, ViewerAction};
use crate::paths::AppPaths;
use crate::run::load_config;
use crate::state::ViewerPreference;

pub fn run_viewer(args: &CatalogArgs, paths: &AppPaths, action: ViewerAction) -> Result<()> {
    match action {
        ViewerAction::Show => set_visibility(paths, true, args.json),
        ViewerAction::Hide => set_visibility(paths, false, args.json),
        ViewerAction::Toggle => {
            let mut preference = ViewerPreference::load(paths.state_file());
            let visible = preference.toggle();
            print_visibility(visible, args.json);
            Ok(())
        }
        ViewerAction::Status => {
            let preference = ViewerPreference::load(paths.state_file());
            print_visibility(preference.visible(), args.json);
            Ok(())
        }
        ViewerAction::Config => print_loader_config(args, paths),
        ViewerAction::Check { dir } => check_build(args, paths, &dir),
    }
}

fn set_visibility(paths: &AppPaths, visible: bool, as_json: bool) -> Result<()> {
    let mut preference = ViewerPreference::load(paths.state_file());
    preference.set_visible(visible);
    print_visibility(preference.visible(), as_json);
    Ok(())
}

fn print_visibility(visible: bool, as_json: bool) {
    if as_json {
        println!("{}", json!({ "viewerVisible": visible }));
    } else if visible {
        println!("viewer: shown");
    } else {
        println!("viewer: hidden");
    }
}

fn print_loader_config(args: &CatalogArgs, paths: &AppPaths) -> Result<()> {
    let config = load_config(args, paths)?;
    let target = MountTarget::from_settings(&config.viewer);
    let loader = LoaderConfig::from_settings(&config.viewer, &target);
    let document = json!({
        "loaderUrl": loader.loader_url,
        "target": target,
        "config": loader,
    });
    println!("{}", serde_json::to_string_pretty(&document)?);
    Ok(())
}

struct LoggingEvents;

impl EmbedEvents for LoggingEvents {
    fn on_progress(&mut self, percent: u8) {
        info!(percent, "checking viewer build");
    }
}

fn check_build(args: &CatalogArgs, paths: &AppPaths, dir: &Path) -> Result<()> {
    let config = load_config(args, paths)?;
    let target = MountTarget::from_settings(&config.viewer);
    let loader_config = LoaderConfig::from_settings(&config.viewer, &target);
    let mut loader = BuildDirectoryLoader::new(dir);
    let mut session = EmbedSession::new(target, loader_config);
    session.mount(&mut loader, &mut LoggingEvents);

    match session.status() {
        ViewerStatus::Ready => {
            if args.json {
                println!("{}", json!({ "ok": true, "dir": dir.display().to_string() }));
            } else {
                println!("viewer build at {} is complete", dir.display());
            }
            session.unmount();
            Ok(())
        }
        _ => {
            let message = session
                .status_line()
                .unwrap_or_else(|| "viewer did not start".to_string());
            bail!(message)
        }
    }
}
