//! drive_upload CLI - Upload local files to Google Drive.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use regex::Regex;
use tracing::{debug, error, info};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use drive_upload::walk::{collect_files, FilterChain, FilterStage};
use drive_upload::{split_path, Authenticator, DriveClient, OAuthConfig, ROOT_FOLDER_ID};

/// Pattern the walk uses when --file_pattern is not given.
const DEFAULT_FILE_PATTERN: &str = ".(JPG|jpg)";

/// CLI tool that uploads local files to Google Drive, skipping the ones
/// already present in the destination folder.
#[derive(Parser)]
#[command(name = "drive_upload")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Local file that keeps the authorization token.
    #[arg(long, env = "DRIVE_UPLOAD_CREDENTIALS", default_value = "auth.json")]
    credentials: PathBuf,

    /// Single local file to upload.
    #[arg(long = "local_file")]
    local_file: Option<PathBuf>,

    /// Local directory to scan for files to upload.
    #[arg(long = "local_dir")]
    local_dir: Option<PathBuf>,

    /// Regex applied to the full local path of every file found under
    /// --local_dir. Matches anywhere in the path, not just the extension.
    #[arg(long = "file_pattern", default_value = DEFAULT_FILE_PATTERN)]
    file_pattern: String,

    /// Name for the uploaded file on Drive. Defaults to the local file name.
    #[arg(long = "drive_file")]
    drive_file: Option<String>,

    /// Slash-delimited Drive directory path, created when missing.
    #[arg(long = "drive_dir")]
    drive_dir: Option<String>,

    /// Append log output to this file in addition to the terminal.
    #[arg(long = "log_file")]
    log_file: Option<PathBuf>,

    /// Only scan the top level of --local_dir.
    #[arg(long = "no_recursive")]
    no_recursive: bool,

    /// Log what would be uploaded without uploading anything.
    #[arg(long = "dry_run")]
    dry_run: bool,

    /// How to enumerate the files already present in the destination folder.
    #[arg(long = "list_strategy", value_enum, default_value = "flat")]
    list_strategy: ListStrategy,
}

#[derive(Copy, Clone, PartialEq, Eq, ValueEnum)]
enum ListStrategy {
    /// One paginated query scoped to the destination folder.
    Flat,
    /// List child ids, then fetch metadata one file at a time. Orders of
    /// magnitude slower on large folders; kept for comparison only.
    PerChild,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.log_file.as_deref()).context("Failed to initialize logging")?;

    let pattern = Regex::new(&cli.file_pattern)
        .with_context(|| format!("Invalid file pattern: {}", cli.file_pattern))?;

    let auth = Authenticator::from_cache_or_prompt(OAuthConfig::default(), &cli.credentials)
        .await
        .context("Authorization failed")?;
    let client = DriveClient::new(auth);

    // Resolve the destination folder, creating missing path segments.
    let segments = split_path(cli.drive_dir.as_deref().unwrap_or(""));
    let folder_id = if segments.is_empty() {
        ROOT_FOLDER_ID.to_string()
    } else {
        client
            .find_or_create_path(ROOT_FOLDER_ID, &segments)
            .await
            .with_context(|| {
                format!("Failed to resolve Drive directory: {:?}", cli.drive_dir)
            })?
    };
    info!("destination folder id: {folder_id}");

    if let Some(local_dir) = &cli.local_dir {
        upload_directory(&client, local_dir, &folder_id, pattern, &cli).await
    } else if let Some(local_file) = &cli.local_file {
        upload_single_file(&client, local_file, &folder_id, &cli).await
    } else {
        info!("no --local_file or --local_dir given, nothing to upload");
        Ok(())
    }
}

/// Upload one file, with an optional display-name override. Failure here is
/// fatal for the run.
async fn upload_single_file(
    client: &DriveClient,
    local_file: &Path,
    folder_id: &str,
    cli: &Cli,
) -> Result<()> {
    let name = match &cli.drive_file {
        Some(name) => name.clone(),
        None => local_file
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .with_context(|| {
                format!("Cannot derive a Drive file name from {}", local_file.display())
            })?,
    };

    if cli.dry_run {
        info!("would upload {} as {name}", local_file.display());
        return Ok(());
    }

    client
        .upload_file(local_file, folder_id, &name)
        .await
        .with_context(|| format!("Failed to upload {}", local_file.display()))?;
    Ok(())
}

/// Walk a local directory and upload every file that passes the filter
/// chain. A failed upload is logged and counted; the walk continues and the
/// run fails at the end when anything failed.
async fn upload_directory(
    client: &DriveClient,
    local_dir: &Path,
    folder_id: &str,
    pattern: Regex,
    cli: &Cli,
) -> Result<()> {
    let existing = match cli.list_strategy {
        ListStrategy::Flat => client.list_files(folder_id).await,
        ListStrategy::PerChild => client.list_files_via_children(folder_id).await,
    }
    .context("Failed to list existing files in the destination folder")?;

    let names: HashSet<String> = existing.iter().map(|f| f.name.clone()).collect();
    info!("{} existing entries in the destination folder", names.len());
    debug!(
        "sample of existing names: {:?}",
        names.iter().take(10).collect::<Vec<_>>()
    );

    let chain = FilterChain::new()
        .with_stage(FilterStage::Pattern(pattern))
        .with_stage(FilterStage::SkipExisting(names));
    let candidates = collect_files(local_dir, !cli.no_recursive, &chain)
        .with_context(|| format!("Failed to walk {}", local_dir.display()))?;
    info!("{} files to upload", candidates.len());

    let mut failures = 0usize;
    for path in &candidates {
        let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };

        if cli.dry_run {
            info!("would upload {}", path.display());
            continue;
        }

        if let Err(err) = client.upload_file(path, folder_id, &name).await {
            error!("failed to upload {}: {err}", path.display());
            failures += 1;
        }
    }

    if failures > 0 {
        bail!("{failures} of {} uploads failed", candidates.len());
    }
    info!("uploaded {} files", candidates.len());
    Ok(())
}

/// Install the tracing subscriber: terminal output filtered by RUST_LOG
/// (default info), plus an optional append-mode file sink.
fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter).with(fmt::layer());

    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file: {}", path.display()))?;
            registry
                .with(fmt::layer().with_ansi(false).with_writer(Arc::new(file)))
                .init();
        }
        None => registry.init(),
    }
    Ok(())
}
