//! Display formatting for CLI output
//!
//! Provides structured display for:
//! - Fetched upstreams (identity and file listing)
//! - Image privacy results
//! - A spinner following the fetch stages

use std::io::{self, Write};
use std::time::Duration;

use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use shipkit_core::{USERDATA_DIR, Upstream};
use shipkit_repo::{FetchStage, ImageClassification, ImagePrivacy};


/// Spinner shown while a fetch runs
///
/// Hidden when stderr is not a terminal.
pub fn fetch_spinner(uri: &str) -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(template) = ProgressStyle::default_spinner().template("{spinner:.cyan} {prefix} {msg:.dim}") {
        spinner.set_style(template);
    }
    spinner.set_prefix(uri.to_string());
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

/// Spinner message for a fetch stage
pub fn stage_message(stage: FetchStage) -> String {
    match stage {
        FetchStage::Done => "done".to_string(),
        stage => format!("{}...", stage),
    }
}

/// Writes upstream summaries
pub struct UpstreamDisplay<W: Write> {
    writer: W,
}

impl UpstreamDisplay<io::Stdout> {
    pub fn stdout() -> Self {
        Self { writer: io::stdout() }
    }
}

impl<W: Write> UpstreamDisplay<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Identity of the upstream followed by its files
    pub fn write_upstream(&mut self, upstream: &Upstream) -> io::Result<()> {
        writeln!(
            self.writer,
            "{} {} ({})",
            style("✓").green().bold(),
            style(&upstream.name).cyan().bold(),
            upstream.upstream_type
        )?;
        writeln!(self.writer, "  {:<16}{}", style("URI:").dim(), upstream.uri)?;
        writeln!(self.writer, "  {:<16}{}", style("Cursor:").dim(), upstream.update_cursor)?;
        if !upstream.version_label.is_empty() {
            writeln!(self.writer, "  {:<16}{}", style("Version:").dim(), upstream.version_label)?;
        }
        writeln!(self.writer)?;

        let total: u64 = upstream.files.iter().map(|f| f.content.len() as u64).sum();
        writeln!(
            self.writer,
            "{} ({} files, {})",
            style("Files").bold(),
            upstream.files.len(),
            file_size(total)
        )?;

        for file in &upstream.files {
            let path = if file.path.starts_with(USERDATA_DIR) {
                style(&file.path).yellow()
            } else {
                style(&file.path)
            };
            writeln!(
                self.writer,
                "  {:<50} {:>10}",
                path,
                file_size(file.content.len() as u64)
            )?;
        }

        Ok(())
    }

    /// Image table, private images highlighted
    pub fn write_images(&mut self, images: &[ImageClassification]) -> io::Result<()> {
        writeln!(self.writer, "{:<60} PRIVACY", "IMAGE")?;
        writeln!(self.writer, "{}", "-".repeat(70))?;

        for image in images {
            let privacy = match image.privacy {
                ImagePrivacy::Public => style("public").green(),
                ImagePrivacy::Private => style("private").yellow().bold(),
            };
            writeln!(self.writer, "{:<60} {}", image.name, privacy)?;
        }

        let private = images.iter().filter(|i| i.is_private()).count();
        writeln!(self.writer)?;
        writeln!(
            self.writer,
            "{} image(s), {} private",
            images.len(),
            private
        )?;
        Ok(())
    }
}

/// Size of release content in binary units
fn file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["KiB", "MiB", "GiB", "TiB"];

    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut size = bytes as f64 / 1024.0;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", size, UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;
    use shipkit_core::{Release, UpstreamType};

    fn plain(bytes: Vec<u8>) -> String {
        console::strip_ansi_codes(&String::from_utf8(bytes).unwrap()).to_string()
    }

    #[test]
    fn test_write_upstream() {
        let mut release = Release::new("12", "1.0.3");
        release.insert("app/web.yaml", b"kind: Deployment\n".to_vec());
        release.insert_userdata("license.yaml", b"kind: License\n".to_vec());
        let upstream = Upstream::from_release("replicated://app", "app", UpstreamType::Replicated, release);

        let mut out = Vec::new();
        UpstreamDisplay::new(&mut out).write_upstream(&upstream).unwrap();
        let text = plain(out);

        assert!(text.contains("app (replicated)"));
        assert!(text.contains("replicated://app"));
        assert!(text.contains("1.0.3"));
        assert!(text.contains("Files (2 files, 31 B)"));
        assert!(text.contains("web.yaml"));
        assert!(text.contains("userdata/license.yaml"));
    }

    #[test]
    fn test_file_size() {
        assert_eq!(file_size(0), "0 B");
        assert_eq!(file_size(1023), "1023 B");
        assert_eq!(file_size(1536), "1.5 KiB");
        assert_eq!(file_size(5 * 1024 * 1024), "5.0 MiB");
        assert_eq!(file_size(1024 * 1024 * 1024), "1.0 GiB");
    }

    #[test]
    fn test_write_images() {
        let images = vec![
            ImageClassification {
                name: "docker.io/library/redis:7".to_string(),
                privacy: ImagePrivacy::Public,
            },
            ImageClassification {
                name: "registry.example.com/app/api:1".to_string(),
                privacy: ImagePrivacy::Private,
            },
        ];

        let mut out = Vec::new();
        UpstreamDisplay::new(&mut out).write_images(&images).unwrap();
        let text = plain(out);

        assert!(text.contains("registry.example.com/app/api:1"));
        assert!(text.contains("private"));
        assert!(text.contains("2 image(s), 1 private"));
    }

    #[test]
    fn test_stage_message() {
        assert_eq!(stage_message(FetchStage::Downloading), "downloading...");
        assert_eq!(stage_message(FetchStage::Done), "done");
    }
}
