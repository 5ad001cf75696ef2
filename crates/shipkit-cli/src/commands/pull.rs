//! Pull command - fetch an upstream and write it to disk

use std::path::{Component, Path, PathBuf};
use std::time::Duration;

use shipkit_core::Upstream;
use shipkit_repo::{FetchOptions, ReleaseClient, ShipkitConfig, UpstreamFetcher};
use tracing::debug;

use crate::display::{UpstreamDisplay, fetch_spinner, stage_message};
use crate::error::{CliError, Result};

/// Arguments of `shipkit pull`
pub struct PullArgs<'a> {
    pub uri: &'a str,
    pub license: Option<&'a Path>,
    pub local_path: Option<&'a Path>,
    pub output: Option<&'a Path>,
    pub deadline_secs: Option<u64>,
}

/// Fetch an upstream and materialize its files
pub async fn run(args: PullArgs<'_>, config: &ShipkitConfig) -> Result<()> {
    let license = args.license.map(super::load_license).transpose()?;

    let options = FetchOptions {
        local_path: args.local_path.map(Path::to_path_buf),
        license,
        deadline: args
            .deadline_secs
            .map(Duration::from_secs)
            .or_else(|| config.fetch_deadline()),
    };

    let client = ReleaseClient::new(config.http_timeout())?;
    let spinner = fetch_spinner(args.uri);
    let progress = spinner.clone();
    let fetcher = UpstreamFetcher::new(client).with_progress(move |stage| {
        progress.set_message(stage_message(stage));
    });

    let fetched = fetcher.fetch_upstream(args.uri, &options).await;
    spinner.finish_and_clear();
    let upstream = fetched?;

    let output = args
        .output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(&upstream.name));
    write_upstream(&upstream, &output)?;

    UpstreamDisplay::stdout().write_upstream(&upstream)?;
    println!();
    println!("Written to {}/", output.display());
    Ok(())
}

/// Write every upstream file below `dest`
fn write_upstream(upstream: &Upstream, dest: &Path) -> Result<()> {
    for file in &upstream.files {
        let relative = safe_relative_path(&file.path)?;
        let target = dest.join(relative);
        if let Some(parent) = target.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&target, &file.content)?;
        debug!(path = %target.display(), "wrote file");
    }
    Ok(())
}

/// Reject paths that would escape the output directory
fn safe_relative_path(path: &str) -> Result<PathBuf> {
    let candidate = Path::new(path);
    let escapes = candidate
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if escapes || path.is_empty() {
        return Err(CliError::input(format!(
            "release contains an unsafe path '{}'",
            path
        )));
    }
    Ok(candidate.to_path_buf())
}
