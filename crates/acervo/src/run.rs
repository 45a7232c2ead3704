use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use galleryconfig::GalleryConfig;
use pagination::{discover_total_pages, ControllerOptions, DiscoveryOptions, GalleryController};
use tainacan::{CatalogConfig, TainacanClient};
use tracing_subscriber::EnvFilter;

use crate::cli::CatalogArgs;
use crate::paths::AppPaths;
use crate::render;

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Reads the configuration file (explicit `--config`, else the default
/// location if present) and applies command line overrides on top.
pub fn load_config(args: &CatalogArgs, paths: &AppPaths) -> Result<GalleryConfig> {
    let (path, required) = match &args.config {
        Some(path) => (path.clone(), true),
        None => (paths.config_file(), false),
    };

    let mut config = if path.is_file() {
        let contents = fs::read_to_string(&path)
            .with_context(|| format!("failed to read config file at {}", path.display()))?;
        let config = GalleryConfig::from_toml_str(&contents)
            .with_context(|| format!("invalid config file at {}", path.display()))?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        config
    } else if required {
        anyhow::bail!("config file {} does not exist", path.display());
    } else {
        GalleryConfig::default()
    };

    if let Some(base_url) = &args.base_url {
        config.catalog.base_url = base_url.clone();
    }
    if let Some(collection) = args.collection {
        config.catalog.collection_id = collection;
    }
    if let Some(page_size) = args.page_size {
        config.catalog.page_size = page_size;
    }
    if let Some(timeout) = args.timeout {
        config.catalog.timeout = timeout;
    }
    config
        .validate()
        .context("invalid configuration after applying command line overrides")?;
    Ok(config)
}

pub fn build_client(config: &GalleryConfig) -> Result<TainacanClient> {
    let catalog = &config.catalog;
    let client_config = CatalogConfig::new(&catalog.base_url, catalog.collection_id)
        .context("invalid catalog configuration")?
        .with_page_size(catalog.page_size)
        .with_timeout(catalog.timeout)
        .with_attachment_concurrency(catalog.attachment_concurrency);
    TainacanClient::new(client_config).context("failed to construct catalog client")
}

pub fn run_page(args: &CatalogArgs, paths: &AppPaths, page: u32) -> Result<()> {
    let config = load_config(args, paths)?;
    let client = build_client(&config)?;
    tracing::info!(
        base = %config.catalog.base_url,
        collection = config.catalog.collection_id,
        page,
        "loading gallery page"
    );
    let mut controller = GalleryController::new(ControllerOptions::from(&config.discovery));
    controller.navigate(&client, page);
    let mut stdout = std::io::stdout().lock();
    render::write_gallery(&mut stdout, &controller, args.json)?;
    Ok(())
}

pub fn run_pages(args: &CatalogArgs, paths: &AppPaths) -> Result<()> {
    let config = load_config(args, paths)?;
    let client = build_client(&config)?;
    let options = DiscoveryOptions::from(&config.discovery);
    let page_size = config.catalog.page_size;
    let report = discover_total_pages(&options, |page| client.probe(page, page_size));
    let mut stdout = std::io::stdout().lock();
    render::write_discovery(&mut stdout, &report, page_size, args.json)?;
    Ok(())
}

pub fn run_where(args: &CatalogArgs, paths: &AppPaths) -> Result<()> {
    let config_file: PathBuf = args.config.clone().unwrap_or_else(|| paths.config_file());
    println!("Configuration:");
    println!("  config dir: {}", paths.config_dir().display());
    println!(
        "  config:     {}{}",
        config_file.display(),
        if config_file.is_file() { "" } else { " (not present, using defaults)" }
    );
    println!("  state:      {}", paths.state_file().display());
    Ok(())
}
