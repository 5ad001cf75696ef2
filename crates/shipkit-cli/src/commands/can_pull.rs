//! Can-pull command - check whether an upstream is pullable

use std::path::Path;

use console::style;
use shipkit_repo::can_pull_upstream;

use crate::error::Result;

/// Print the answer and return it
///
/// A license path that cannot be loaded is an input error.
pub fn run(uri: &str, license: Option<&Path>) -> Result<bool> {
    if let Some(path) = license {
        super::load_license(path)?;
    }
    let has_license = license.is_some();

    let pullable = can_pull_upstream(uri, has_license)?;
    if pullable {
        println!("{} {} can be pulled", style("✓").green().bold(), uri);
    } else {
        println!(
            "{} {} needs a license to be pulled",
            style("✗").red().bold(),
            uri
        );
    }
    Ok(pullable)
}
