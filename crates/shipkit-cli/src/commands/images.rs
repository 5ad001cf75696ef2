//! Images command - report which images need licensed registry access

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use shipkit_repo::{ImagePrivacyProber, OciImageRegistry, ShipkitConfig};

use crate::display::UpstreamDisplay;
use crate::error::{CliError, Result};

/// Arguments of `shipkit images`
pub struct ImagesArgs<'a> {
    pub images: &'a [String],
    pub file: Option<&'a Path>,
    pub concurrency: Option<usize>,
    pub deadline_secs: Option<u64>,
    pub private_only: bool,
    pub json: bool,
}

pub async fn run(args: ImagesArgs<'_>, config: &ShipkitConfig) -> Result<()> {
    let mut images = args.images.to_vec();
    if let Some(file) = args.file {
        images.extend(read_image_list(&std::fs::read_to_string(file)?));
    }
    images.sort();
    images.dedup();

    if images.is_empty() {
        return Err(CliError::input_with_help(
            "no images given",
            "pass image references as arguments or with --file",
        ));
    }

    let prober = ImagePrivacyProber::new(Arc::new(OciImageRegistry::default()))
        .with_concurrency(args.concurrency.unwrap_or(config.probe_concurrency))
        .with_deadline(args.deadline_secs.map(Duration::from_secs));

    let mut classified = prober.classify(&images).await?;
    if args.private_only {
        classified.retain(|image| image.is_private());
    }

    if args.json {
        let json = serde_json::to_string_pretty(&classified)
            .map_err(|e| CliError::internal(e.to_string()))?;
        println!("{}", json);
    } else {
        UpstreamDisplay::stdout().write_images(&classified)?;
    }

    Ok(())
}

/// One reference per line; blank lines and `#` comments are skipped
fn read_image_list(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect()
}
