mod app;
mod cli;
mod config;
mod logging;
mod render;

use std::path::Path;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use dlwatch_client::{ensure_output_dir, DownloaderApi, ReqwestApi};
use dlwatch_core::{download_path, format_bytes, format_mtime};
use watch_logging::watch_info;

use crate::cli::{Cli, Command};
use crate::config::AppConfig;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    logging::initialize(cli.log, cli.log_level);

    let config = AppConfig::load(&cli.overrides(), cli.config.as_deref())?;
    watch_info!(
        "dlwatch starting against {} (status every {:?}, tasks every {:?})",
        config.api.base_url,
        config.intervals.status,
        config.intervals.tasks
    );
    let api = ReqwestApi::new(config.api.clone())
        .with_context(|| format!("bad server address {:?}", config.api.base_url))?;

    let ok = match cli.command() {
        Command::Watch(args) => app::run_watch(config, Arc::new(api), args).await?,
        Command::Files => {
            list_files(&api).await?;
            true
        }
        Command::Fetch { name, dest } => {
            fetch(&api, &name, &dest).await?;
            true
        }
    };
    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}

async fn list_files(api: &ReqwestApi) -> anyhow::Result<()> {
    let files = api.fetch_files().await.context("listing files")?;
    if files.is_empty() {
        println!("(no files)");
    }
    for file in files {
        println!(
            "{:<40} {:>10}  {}  {}",
            file.name,
            format_bytes(file.size),
            format_mtime(file.mtime),
            download_path(&file.name)
        );
    }
    Ok(())
}

async fn fetch(api: &ReqwestApi, name: &str, dest: &Path) -> anyhow::Result<()> {
    ensure_output_dir(dest)?;
    let saved = api
        .download_artifact(name, dest)
        .await
        .with_context(|| format!("downloading {name:?}"))?;
    println!("saved {}", saved.display());
    Ok(())
}
