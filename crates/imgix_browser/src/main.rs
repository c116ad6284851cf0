// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result, anyhow, bail};
use clap::{Parser, Subcommand};
use imgix_browser::upload::{UploadRequest, upload_then_refresh};
use imgix_browser::{Action, AppConfig, Controller, ImgixClient, Session, Snapshot, Source};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

#[derive(Parser)]
#[command(name = "imgix-browser", version, about = "Browse, search and upload imgix source assets")]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Read configuration from this file only
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// API key, overrides configuration and environment
    #[arg(long, global = true)]
    api_key: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the enabled sources of the account.
    Sources,
    /// List the image URLs of one page of a source.
    Browse {
        /// Source id or name
        #[arg(long)]
        source: String,

        /// Zero-based page index
        #[arg(long, default_value_t = 0)]
        page: usize,
    },
    /// Search a source by category, keyword or origin path.
    Search {
        /// Source id or name
        #[arg(long)]
        source: String,

        /// Search term (empty lists everything)
        #[arg(long, default_value = "")]
        term: String,

        /// Zero-based page index
        #[arg(long, default_value_t = 0)]
        page: usize,
    },
    /// Print the URL of one asset, as handed back to the host.
    Pick {
        /// Source id or name
        #[arg(long)]
        source: String,

        /// Position of the asset on the page
        #[arg(long)]
        index: usize,

        /// Zero-based page index
        #[arg(long, default_value_t = 0)]
        page: usize,

        /// Restrict to search results for this term
        #[arg(long)]
        term: Option<String>,
    },
    /// Upload an image to a source, then list the refreshed page.
    Upload {
        /// Source id or name
        #[arg(long)]
        source: String,

        /// Local image file
        #[arg(long)]
        file: PathBuf,

        /// Destination folder inside the source
        #[arg(long)]
        folder: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();

    let mut config = AppConfig::load(cli.config.as_deref()).context("Failed to load configuration")?;
    if let Some(key) = cli.api_key {
        config.api.api_key = Some(key);
    }

    let credentials = config.credentials();
    let client = ImgixClient::new(&credentials, config.base_url()?, config.plugin_origin());
    let mut controller = Controller::new(&credentials, config.debounce());
    controller.mount(&client).await;

    if let Some(error) = controller.state().errors.first() {
        eprintln!("error: {}", error);
        return Ok(ExitCode::FAILURE);
    }

    match cli.command {
        Commands::Sources => handle_commands_sources(&controller),
        Commands::Browse { source, page } => {
            handle_commands_browse(&mut controller, &client, &source, page, None).await
        }
        Commands::Search { source, term, page } => {
            handle_commands_browse(&mut controller, &client, &source, page, Some(term)).await
        }
        Commands::Pick {
            source,
            index,
            page,
            term,
        } => handle_commands_pick(&mut controller, &client, &source, index, page, term).await,
        Commands::Upload {
            source,
            file,
            folder,
        } => handle_commands_upload(controller, client, &source, &file, folder).await,
    }
}

fn handle_commands_sources(controller: &Controller) -> Result<ExitCode> {
    for source in &controller.state().all_sources {
        println!("{}\t{}\t{}", source.id, source.name, source.domain);
    }
    Ok(ExitCode::SUCCESS)
}

fn resolve_source(controller: &Controller, key: &str) -> Result<Source> {
    controller
        .find_source(key)
        .cloned()
        .ok_or_else(|| anyhow!("No enabled source with id or name '{}'", key))
}

/// Selects the source, runs the search (if any), then moves to `page`.
async fn load_page(
    controller: &mut Controller,
    client: &ImgixClient,
    source_key: &str,
    page: usize,
    term: Option<String>,
) -> Result<()> {
    let source = resolve_source(controller, source_key)?;

    let mut actions = vec![Action::SelectSource(source)];
    if let Some(term) = term {
        actions.push(Action::Search(Some(term)));
    } else {
        actions.push(Action::ChangePage(page));
    }
    if let Some(request) = controller.dispatch_all(actions) {
        controller.settle(client, request).await;
    }

    // Searches always start on the first page.
    if controller.state().page.current_index != page {
        if let Some(request) = controller.dispatch(Action::ChangePage(page)) {
            controller.settle(client, request).await;
        }
    }
    Ok(())
}

fn print_page(snapshot: &Snapshot) -> ExitCode {
    for asset in &snapshot.assets {
        println!("{}", asset.src);
    }
    eprintln!(
        "page {} of {}",
        snapshot.page.current_index + 1,
        snapshot.page.total_page_count
    );
    match &snapshot.error {
        Some(error) => {
            eprintln!("error: {}", error);
            ExitCode::FAILURE
        }
        None => ExitCode::SUCCESS,
    }
}

async fn handle_commands_browse(
    controller: &mut Controller,
    client: &ImgixClient,
    source: &str,
    page: usize,
    term: Option<String>,
) -> Result<ExitCode> {
    load_page(controller, client, source, page, term).await?;
    Ok(print_page(&controller.snapshot()))
}

async fn handle_commands_pick(
    controller: &mut Controller,
    client: &ImgixClient,
    source: &str,
    index: usize,
    page: usize,
    term: Option<String>,
) -> Result<ExitCode> {
    load_page(controller, client, source, page, term).await?;
    let url = controller
        .pick(index)
        .ok_or_else(|| anyhow!("No asset at index {} on page {}", index, page))?;
    println!("{}", url);
    Ok(ExitCode::SUCCESS)
}

async fn handle_commands_upload(
    controller: Controller,
    client: ImgixClient,
    source_key: &str,
    file: &std::path::Path,
    folder: Option<String>,
) -> Result<ExitCode> {
    let source = resolve_source(&controller, source_key)?;
    let request = UploadRequest::from_path(&source.id, folder, file).await?;

    let (handle, task) = Session::new(controller, Arc::new(client.clone())).spawn();
    let mut snapshots = handle.snapshots();

    if !handle.send(Action::SelectSource(source)) {
        bail!("Session stopped before the source could be selected");
    }
    snapshots
        .wait_for(|s| s.selected_source.is_some() && !s.loading)
        .await
        .context("Session stopped before the source loaded")?;

    snapshots.borrow_and_update();
    let uploaded = upload_then_refresh(&client, &request, handle.refresher()).await;
    snapshots
        .changed()
        .await
        .context("Session stopped before the refresh")?;
    let snapshot = snapshots
        .wait_for(|s| !s.loading)
        .await
        .context("Session stopped before the refresh completed")?
        .clone();

    drop(handle);
    task.await.context("Session task failed")?;

    let listed = print_page(&snapshot);
    match uploaded {
        Ok(_) => {
            println!("Uploaded {}", request.resource_path());
            Ok(listed)
        }
        Err(e) => {
            eprintln!("error: upload failed: {}", e);
            Ok(ExitCode::FAILURE)
        }
    }
}
