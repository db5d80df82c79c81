mod cli;
mod output;

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use codescope_core::AppBuilder;
use codescope_index::{CodeIndexer, IndexWatcher};
use tokio_util::sync::CancellationToken;

use crate::cli::{Cli, Command, query_text};
use crate::output::{render_report, render_result};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    init_subscriber();

    let cli = Cli::parse();
    let app = AppBuilder::new(&cli.root, cli.config.as_deref()).await?;

    match cli.command {
        Command::Index => {
            let indexer = Arc::new(build_indexer(&app)?);
            let cancel = cancel_on_ctrl_c();
            let report = indexer.index_workspace(app.root(), &cancel).await?;
            print!("{}", render_report(&report));
            if app.config().watch && !report.cancelled {
                watch_until_cancelled(app.root(), indexer, &cancel).await?;
            }
        }
        Command::Search { query, limit, json } => {
            return Ok(search(&app, &query_text(&query), limit, json).await);
        }
        Command::Watch { no_initial } => {
            let indexer = Arc::new(build_indexer(&app)?);
            let cancel = cancel_on_ctrl_c();
            if !no_initial {
                let report = indexer.index_workspace(app.root(), &cancel).await?;
                print!("{}", render_report(&report));
            }
            if !cancel.is_cancelled() {
                watch_until_cancelled(app.root(), indexer, &cancel).await?;
            }
        }
        Command::Update { paths } => {
            let report = build_indexer(&app)?.update_files(app.root(), &paths).await?;
            print!("{}", render_report(&report));
        }
        Command::Remove { paths } => {
            let report = build_indexer(&app)?.remove_files(app.root(), &paths).await?;
            print!("{}", render_report(&report));
        }
        Command::Drop => {
            build_indexer(&app)?.drop_collection().await?;
            println!("dropped collection {}", app.config().collection);
        }
        Command::Config => {
            print!("{}", app.config().to_toml()?);
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn init_subscriber() {
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

fn build_indexer(app: &AppBuilder) -> anyhow::Result<CodeIndexer> {
    let store = app.build_store()?;
    let embedder = app.build_embedder()?;
    app.build_indexer(store, embedder)
}

/// Token cancelled on the first Ctrl-C.
fn cancel_on_ctrl_c() -> CancellationToken {
    let token = CancellationToken::new();
    let trigger = token.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("failed to listen for ctrl-c: {e:#}");
            return;
        }
        tracing::info!("received shutdown signal");
        trigger.cancel();
    });
    token
}

async fn watch_until_cancelled(
    root: &Path,
    indexer: Arc<CodeIndexer>,
    cancel: &CancellationToken,
) -> anyhow::Result<()> {
    let watcher = IndexWatcher::start(root, indexer).context("failed to start file watcher")?;
    println!("watching {} (Ctrl-C to stop)", watcher.root().display());
    cancel.cancelled().await;
    watcher.stop().await;
    Ok(())
}

async fn search(app: &AppBuilder, query: &str, limit: Option<usize>, json: bool) -> ExitCode {
    let results = async {
        let store = app.build_store()?;
        let embedder = app.build_embedder()?;
        let retriever = app.build_retriever(store, embedder);
        let limit = limit.unwrap_or(retriever.config().limit);
        anyhow::Ok(retriever.search_with_limit(query, limit).await?)
    }
    .await;

    let results = match results {
        Ok(results) => results,
        Err(e) => {
            tracing::error!("search failed: {e:#}");
            eprintln!("search failed");
            return ExitCode::FAILURE;
        }
    };

    if json {
        match serde_json::to_string_pretty(&results) {
            Ok(out) => println!("{out}"),
            Err(e) => {
                tracing::error!("failed to serialize results: {e}");
                eprintln!("search failed");
                return ExitCode::FAILURE;
            }
        }
    } else if results.is_empty() {
        println!("No matches");
    } else {
        for result in &results {
            println!("{}", render_result(result));
        }
    }
    ExitCode::SUCCESS
}
