//! Upstream retrieval pipeline
//!
//! Resolves a distribution URI, obtains the release (remotely after an access
//! check, or from a local directory), finds the application descriptor and
//! configuration schema, renders config defaults, injects the generated
//! userdata files and normalizes the layout. Stages run strictly in order;
//! the first failure ends the run and no partial upstream is returned.

use std::fmt;
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::Duration;

use shipkit_core::{
    CoreError, DecoderRegistry, DistributionRef, License, PLACEHOLDER_APP_NAME, Release, Upstream,
    UpstreamType, classify, is_distribution_uri, read_local_release,
};
use shipkit_engine::{Engine, create_config_values};
use tokio::time::Instant;
use tracing::{debug, info};
use url::Url;

use crate::client::ReleaseClient;
use crate::error::{RepoError, Result};

/// Generated config values, relative to the userdata directory
pub const CONFIG_VALUES_FILE: &str = "config.yaml";

/// Copy of the license, relative to the userdata directory
pub const LICENSE_FILE: &str = "license.yaml";

/// Position of a fetch in the pipeline
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum FetchStage {
    #[default]
    Idle,
    Resolved,
    Probing,
    Downloading,
    Classifying,
    Defaulting,
    Normalizing,
    Done,
}

impl fmt::Display for FetchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            FetchStage::Idle => "starting",
            FetchStage::Resolved => "resolving",
            FetchStage::Probing => "probing",
            FetchStage::Downloading => "downloading",
            FetchStage::Classifying => "classifying",
            FetchStage::Defaulting => "rendering config defaults",
            FetchStage::Normalizing => "normalizing",
            FetchStage::Done => "done",
        };
        f.write_str(s)
    }
}

/// Caller supplied inputs of a fetch
#[derive(Debug, Clone, Default)]
pub struct FetchOptions {
    /// Read the release from this directory instead of the service
    pub local_path: Option<PathBuf>,

    /// Customer license; required for remote fetches
    pub license: Option<License>,

    /// Deadline for the whole fetch
    pub deadline: Option<Duration>,
}

type ProgressFn = Box<dyn Fn(FetchStage) + Send + Sync>;

struct StageTracker<'a> {
    current: Mutex<FetchStage>,
    deadline: Option<Instant>,
    progress: Option<&'a (dyn Fn(FetchStage) + Send + Sync)>,
}

impl<'a> StageTracker<'a> {
    fn new(deadline: Option<Instant>, progress: Option<&'a (dyn Fn(FetchStage) + Send + Sync)>) -> Self {
        Self {
            current: Mutex::new(FetchStage::Idle),
            deadline,
            progress,
        }
    }

    fn enter(&self, stage: FetchStage) {
        *self.current.lock().unwrap_or_else(|e| e.into_inner()) = stage;
        debug!(%stage, "fetch stage");
        if let Some(progress) = self.progress {
            progress(stage);
        }
    }

    fn current(&self) -> FetchStage {
        *self.current.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn cancelled(&self) -> RepoError {
        RepoError::Cancelled {
            stage: self.current(),
        }
    }

    /// Fail with `Cancelled` once the deadline has passed
    ///
    /// Blocking work cannot be interrupted, so this runs after it returns.
    fn check_deadline(&self) -> Result<()> {
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(self.cancelled()),
            _ => Ok(()),
        }
    }
}

/// Retrieves upstreams from the distribution service or local copies
pub struct UpstreamFetcher {
    client: ReleaseClient,
    decoders: DecoderRegistry,
    engine: Engine,
    progress: Option<ProgressFn>,
}

impl UpstreamFetcher {
    pub fn new(client: ReleaseClient) -> Self {
        Self {
            client,
            decoders: DecoderRegistry::kots(),
            engine: Engine::static_only(),
            progress: None,
        }
    }

    /// Call `progress` each time the fetch enters a stage
    pub fn with_progress(mut self, progress: impl Fn(FetchStage) + Send + Sync + 'static) -> Self {
        self.progress = Some(Box::new(progress));
        self
    }

    /// Fetch and materialize the upstream named by `uri`
    pub async fn fetch_upstream(&self, uri: &str, options: &FetchOptions) -> Result<Upstream> {
        let deadline = options.deadline.map(|d| Instant::now() + d);
        let tracker = StageTracker::new(deadline, self.progress.as_deref());
        let run = self.run(uri, options, &tracker);

        let result = match deadline {
            Some(deadline) => tokio::time::timeout_at(deadline, run)
                .await
                .unwrap_or_else(|_| Err(tracker.cancelled())),
            None => run.await,
        };
        if let Err(RepoError::Cancelled { stage }) = &result {
            info!(%uri, %stage, "fetch deadline exceeded");
        }
        result
    }

    async fn run(&self, uri: &str, options: &FetchOptions, tracker: &StageTracker<'_>) -> Result<Upstream> {
        tracker.enter(FetchStage::Resolved);
        let dist = resolve(uri).map_err(|e| e.at(FetchStage::Resolved))?;

        let mut release = match &options.local_path {
            Some(path) => {
                tracker.enter(FetchStage::Downloading);
                info!(path = %path.display(), "reading release from local path");
                let root = path.clone();
                tokio::task::spawn_blocking(move || read_local_release(&root))
                    .await
                    .map_err(|e| RepoError::Io(std::io::Error::other(e)).at(FetchStage::Downloading))?
                    .map_err(|e| RepoError::from(e).at(FetchStage::Downloading))?
            }
            None => {
                let license = options.license.as_ref().ok_or_else(|| {
                    RepoError::MissingCredential {
                        uri: uri.to_string(),
                    }
                    .at(FetchStage::Resolved)
                })?;
                self.download(&dist, license, tracker).await?
            }
        };
        tracker.check_deadline()?;

        tracker.enter(FetchStage::Classifying);
        let found = classify(&release, &self.decoders);
        if !found.application_found {
            info!("release has no application descriptor, using placeholder");
        }
        let app_name = match found.application.name() {
            "" => PLACEHOLDER_APP_NAME,
            name => name,
        }
        .to_string();

        if let Some(config) = &found.config {
            tracker.enter(FetchStage::Defaulting);
            let values = create_config_values(&app_name, config, &self.engine)
                .map_err(|e| RepoError::from(e).at(FetchStage::Defaulting))?;
            let yaml = values
                .to_yaml()
                .map_err(|e| RepoError::from(e).at(FetchStage::Defaulting))?;
            release.insert_userdata(CONFIG_VALUES_FILE, yaml.into_bytes());
            tracker.check_deadline()?;
        }

        if let Some(license) = &options.license {
            let yaml = license
                .to_yaml()
                .map_err(|e| RepoError::from(e).at(FetchStage::Normalizing))?;
            release.insert_userdata(LICENSE_FILE, yaml.into_bytes());
        }

        tracker.enter(FetchStage::Normalizing);
        let upstream = Upstream::from_release(uri, app_name, UpstreamType::Replicated, release);

        tracker.enter(FetchStage::Done);
        info!(
            name = %upstream.name,
            files = upstream.files.len(),
            version = %upstream.version_label,
            "fetched upstream"
        );
        Ok(upstream)
    }

    async fn download(
        &self,
        dist: &DistributionRef,
        license: &License,
        tracker: &StageTracker<'_>,
    ) -> Result<Release> {
        tracker.enter(FetchStage::Probing);
        self.client
            .probe(dist, license)
            .await
            .map_err(|e| e.at(FetchStage::Probing))?;

        tracker.enter(FetchStage::Downloading);
        self.client
            .download(dist, license)
            .await
            .map_err(|e| e.at(FetchStage::Downloading))
    }
}

fn parse_uri(uri: &str) -> std::result::Result<Url, CoreError> {
    Url::parse(uri).map_err(|e| CoreError::InvalidUri {
        uri: uri.to_string(),
        reason: e.to_string(),
    })
}

fn resolve(uri: &str) -> Result<DistributionRef> {
    let url = parse_uri(uri)?;
    if !is_distribution_uri(&url) {
        return Err(CoreError::InvalidUri {
            uri: uri.to_string(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        }
        .into());
    }
    Ok(DistributionRef::from_url(&url)?)
}

/// Whether an upstream can be pulled with the credentials at hand
///
/// Only the distribution scheme needs a license.
pub fn can_pull_upstream(uri: &str, has_license: bool) -> Result<bool> {
    let url = parse_uri(uri)?;
    Ok(!is_distribution_uri(&url) || has_license)
}
