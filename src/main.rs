mod cli;
mod output;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands, FilterArgs};
use filedep::DependencyGraphEngine;
use filedep::export::export_graph;
use filedep::export::model::ExportParams;
use filedep::pipeline::ScanStats;
use filedep::watcher::{run_watch_loop, start_watcher};

fn init_tracing(verbose: bool) {
    let default = if verbose { "filedep=debug" } else { "filedep=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Build an engine for `paths` and apply the command-line filters. Target
/// extensions are applied before the scan; toggles after it, since directory
/// cascades need the scanned directory list.
async fn scanned_engine(
    paths: Vec<PathBuf>,
    filters: &FilterArgs,
) -> Result<(DependencyGraphEngine, ScanStats)> {
    let engine = DependencyGraphEngine::new(paths).context("cannot create engine")?;
    if !filters.extensions.is_empty() {
        engine.set_target_extensions(&filters.extensions);
    }
    let stats = engine.update_dependencies().await;
    apply_toggles(&engine, filters);
    Ok((engine, stats))
}

fn apply_toggles(engine: &DependencyGraphEngine, filters: &FilterArgs) {
    for ext in &filters.disable_ext {
        engine.set_extension_enabled(ext, false);
    }
    for dir in &filters.disable_dir {
        engine.set_directory_enabled(dir, false);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Scan {
            paths,
            reverse,
            summary,
            filters,
            format,
        } => {
            let (engine, stats) = scanned_engine(paths, &filters).await?;
            if summary {
                output::print_summary(&stats, format);
                return Ok(());
            }
            let snapshot = engine.snapshot();
            let view = if reverse {
                engine.get_dependents()
            } else {
                engine.get_dependencies()
            };
            output::print_dependencies(&view, &snapshot.roots, format);
        }

        Commands::Dirs {
            paths,
            filters,
            format,
        } => {
            let (engine, _) = scanned_engine(paths, &filters).await?;
            output::print_directories(&engine.get_directories(), format);
        }

        Commands::Export {
            paths,
            format,
            reverse,
            output,
            filters,
        } => {
            let (engine, _) = scanned_engine(paths, &filters).await?;
            let result = export_graph(&engine, &ExportParams { format, reverse })?;
            match output {
                Some(file) => {
                    std::fs::write(&file, &result.content)
                        .with_context(|| format!("cannot write {}", file.display()))?;
                    tracing::info!(
                        "wrote {} nodes and {} edges to {}",
                        result.node_count,
                        result.edge_count,
                        file.display()
                    );
                }
                None => println!("{}", result.content.trim_end()),
            }
        }

        Commands::Watch {
            paths,
            filters,
            format,
        } => {
            let engine = DependencyGraphEngine::new(paths).context("cannot create engine")?;
            if !filters.extensions.is_empty() {
                engine.set_target_extensions(&filters.extensions);
            }
            let engine = Arc::new(engine);
            let stats = engine.update_dependencies().await;
            apply_toggles(&engine, &filters);
            output::print_summary(&stats, format);

            let (_handle, events) = start_watcher(engine.roots(), &engine.config())?;
            tracing::info!("watching for changes (ctrl-c to stop)");
            tokio::select! {
                _ = run_watch_loop(Arc::clone(&engine), events, |stats| {
                    output::print_summary(stats, format)
                }) => {}
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("stopping watcher");
                }
            }
        }
    }

    Ok(())
}
