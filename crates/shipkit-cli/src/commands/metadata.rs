//! Metadata command - print the application descriptor for an upstream

use std::io::Write;

use shipkit_repo::{MetadataClient, ShipkitConfig};

use crate::error::{CliError, Result};

pub async fn run(uri: &str, config: &ShipkitConfig) -> Result<()> {
    let client = MetadataClient::new(config.metadata_hosts.clone(), config.http_timeout())?;

    match client.application_metadata(uri).await? {
        Some(body) => {
            let mut stdout = std::io::stdout();
            stdout.write_all(&body)?;
            if !body.ends_with(b"\n") {
                writeln!(stdout)?;
            }
            Ok(())
        }
        None => Err(CliError::input_with_help(
            format!("no application metadata for {}", uri),
            "only replicated:// upstreams publish metadata",
        )),
    }
}
