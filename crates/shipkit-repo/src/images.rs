//! Image privacy probing
//!
//! Every image the application references is opened anonymously. An image
//! that opens is public; one that fails with an authorization error is
//! private and has to be pulled through the licensed registry. Any other
//! failure stops the whole run.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use oci_distribution::Reference;
use oci_distribution::client::{Client, ClientConfig, ClientProtocol};
use oci_distribution::secrets::RegistryAuth;
use serde::Serialize;
use tracing::{debug, warn};

use crate::config::DEFAULT_PROBE_CONCURRENCY;
use crate::error::{RepoError, Result};
use crate::probe::ProbeError;

/// Opens remote images
#[async_trait]
pub trait ImageRegistry: Send + Sync {
    /// Open a minimal handle on an image without credentials
    async fn open_image(&self, reference: &str) -> std::result::Result<(), ProbeError>;
}

/// Registry access through `oci-distribution`, HTTPS only and anonymous
pub struct OciImageRegistry {
    client: Client,
}

impl Default for OciImageRegistry {
    fn default() -> Self {
        let config = ClientConfig {
            protocol: ClientProtocol::Https,
            ..Default::default()
        };
        Self {
            client: Client::new(config),
        }
    }
}

#[async_trait]
impl ImageRegistry for OciImageRegistry {
    async fn open_image(&self, reference: &str) -> std::result::Result<(), ProbeError> {
        let parsed = Reference::try_from(reference).map_err(|e| ProbeError::InvalidReference {
            reference: reference.to_string(),
            reason: e.to_string(),
        })?;

        self.client
            .pull_manifest(&parsed, &RegistryAuth::Anonymous)
            .await
            .map(|_| ())
            .map_err(|e| ProbeError::from(e).wrap(format!("fetching manifest for {}", reference)))
    }
}

/// Whether an image can be pulled without credentials
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ImagePrivacy {
    Public,
    Private,
}

/// Probe result for a single image
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageClassification {
    pub name: String,
    pub privacy: ImagePrivacy,
}

impl ImageClassification {
    pub fn is_private(&self) -> bool {
        self.privacy == ImagePrivacy::Private
    }
}

/// Classifies images as public or private with bounded concurrency
pub struct ImagePrivacyProber {
    registry: Arc<dyn ImageRegistry>,
    concurrency: usize,
    deadline: Option<Duration>,
}

impl ImagePrivacyProber {
    pub fn new(registry: Arc<dyn ImageRegistry>) -> Self {
        Self {
            registry,
            concurrency: DEFAULT_PROBE_CONCURRENCY,
            deadline: None,
        }
    }

    /// Maximum number of probes in flight (at least one)
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Time limit for each probe
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    async fn probe_one(&self, image: String) -> Result<ImageClassification> {
        let opened = match self.deadline {
            Some(deadline) => tokio::time::timeout(deadline, self.registry.open_image(&image))
                .await
                .unwrap_or(Err(ProbeError::Timeout)),
            None => self.registry.open_image(&image).await,
        };

        let privacy = match opened {
            Ok(()) => ImagePrivacy::Public,
            Err(e) if e.is_unauthorized() => ImagePrivacy::Private,
            Err(source) => return Err(RepoError::Probe { image, source }),
        };

        debug!(%image, ?privacy, "probed image");
        Ok(ImageClassification {
            name: image,
            privacy,
        })
    }

    /// Classify every image, sorted by name
    ///
    /// The first non-authorization failure aborts the run; probes still in
    /// flight are dropped.
    pub async fn classify(&self, images: &[String]) -> Result<Vec<ImageClassification>> {
        let mut results = stream::iter(images.iter().cloned())
            .map(|image| self.probe_one(image))
            .buffer_unordered(self.concurrency);

        let mut classified = Vec::with_capacity(images.len());
        while let Some(result) = results.next().await {
            match result {
                Ok(classification) => classified.push(classification),
                Err(e) => {
                    warn!(error = %e, "image probe failed");
                    return Err(e);
                }
            }
        }

        classified.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(classified)
    }

    /// Names of the images that need licensed access, sorted
    pub async fn private_images(&self, images: &[String]) -> Result<Vec<String>> {
        Ok(self
            .classify(images)
            .await?
            .into_iter()
            .filter(ImageClassification::is_private)
            .map(|c| c.name)
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    enum Behavior {
        Public,
        Fail(fn() -> ProbeError),
        Hang,
    }

    struct FakeRegistry {
        images: HashMap<String, Behavior>,
        in_flight: AtomicUsize,
        max_in_flight: AtomicUsize,
    }

    impl FakeRegistry {
        fn new(images: Vec<(&str, Behavior)>) -> Self {
            Self {
                images: images.into_iter().map(|(k, v)| (k.to_string(), v)).collect(),
                in_flight: AtomicUsize::new(0),
                max_in_flight: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl ImageRegistry for FakeRegistry {
        async fn open_image(&self, reference: &str) -> std::result::Result<(), ProbeError> {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(10)).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);

            match self.images.get(reference) {
                Some(Behavior::Public) => Ok(()),
                Some(Behavior::Fail(make)) => Err(make()),
                Some(Behavior::Hang) => {
                    std::future::pending::<()>().await;
                    Ok(())
                }
                None => Err(ProbeError::Other(format!("unknown image {}", reference))),
            }
        }
    }

    fn nested_unauthorized() -> ProbeError {
        ProbeError::Multiple(vec![ProbeError::Registry {
            code: "UNAUTHORIZED".to_string(),
            message: "authentication required".to_string(),
        }])
        .wrap("GET https://registry.example.com/v2/private/manifests/1")
        .wrap("fetching manifest")
        .wrap("opening image")
    }

    fn server_error() -> ProbeError {
        ProbeError::Status {
            status: 500,
            message: "internal error".to_string(),
        }
    }

    fn names(images: &[&str]) -> Vec<String> {
        images.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn test_classify_public_and_private() {
        let registry = Arc::new(FakeRegistry::new(vec![
            ("quay.io/app/web:1", Behavior::Public),
            ("registry.example.com/private/db:2", Behavior::Fail(nested_unauthorized)),
            ("docker.io/library/redis:7", Behavior::Public),
        ]));
        let prober = ImagePrivacyProber::new(registry);

        let result = prober
            .classify(&names(&[
                "registry.example.com/private/db:2",
                "quay.io/app/web:1",
                "docker.io/library/redis:7",
            ]))
            .await
            .unwrap();

        let summary: Vec<_> = result.iter().map(|c| (c.name.as_str(), c.privacy)).collect();
        assert_eq!(
            summary,
            vec![
                ("docker.io/library/redis:7", ImagePrivacy::Public),
                ("quay.io/app/web:1", ImagePrivacy::Public),
                ("registry.example.com/private/db:2", ImagePrivacy::Private),
            ]
        );
    }

    #[tokio::test]
    async fn test_private_images() {
        let registry = Arc::new(FakeRegistry::new(vec![
            ("b/private:1", Behavior::Fail(nested_unauthorized)),
            ("a/public:1", Behavior::Public),
            ("a/private:1", Behavior::Fail(|| ProbeError::Unauthorized { message: "no".into() })),
        ]));
        let prober = ImagePrivacyProber::new(registry);

        let private = prober
            .private_images(&names(&["b/private:1", "a/public:1", "a/private:1"]))
            .await
            .unwrap();
        assert_eq!(private, vec!["a/private:1", "b/private:1"]);
    }

    #[tokio::test]
    async fn test_other_failure_is_fatal() {
        let registry = Arc::new(FakeRegistry::new(vec![
            ("ok/image:1", Behavior::Public),
            ("broken/image:1", Behavior::Fail(server_error)),
        ]));
        let prober = ImagePrivacyProber::new(registry);

        let err = prober
            .classify(&names(&["ok/image:1", "broken/image:1"]))
            .await
            .unwrap_err();

        match err {
            RepoError::Probe { image, source } => {
                assert_eq!(image, "broken/image:1");
                assert!(!source.is_unauthorized());
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_concurrency_is_bounded() {
        let images: Vec<String> = (0..12).map(|i| format!("img/{}:1", i)).collect();
        let registry = Arc::new(FakeRegistry::new(
            images.iter().map(|name| (name.as_str(), Behavior::Public)).collect(),
        ));
        let prober = ImagePrivacyProber::new(registry.clone()).with_concurrency(3);

        let result = prober.classify(&images).await.unwrap();

        assert_eq!(result.len(), 12);
        assert!(registry.max_in_flight.load(Ordering::SeqCst) <= 3);
    }

    #[tokio::test]
    async fn test_deadline_is_fatal() {
        let registry = Arc::new(FakeRegistry::new(vec![("slow/image:1", Behavior::Hang)]));
        let prober = ImagePrivacyProber::new(registry).with_deadline(Some(Duration::from_millis(50)));

        let err = prober.classify(&names(&["slow/image:1"])).await.unwrap_err();
        assert!(matches!(
            err,
            RepoError::Probe {
                source: ProbeError::Timeout,
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_empty_input() {
        let registry = Arc::new(FakeRegistry::new(vec![]));
        let prober = ImagePrivacyProber::new(registry);
        assert!(prober.classify(&[]).await.unwrap().is_empty());
    }
}
