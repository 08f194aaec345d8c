//! The batch orchestrator.
//!
//! A batch runs its stages strictly one after the other:
//!
//! 1. resolve the reference, retrying the whole resolution on network errors;
//! 2. optionally annotate every item;
//! 3. create the scratch directory inside the destination;
//! 4. acquire every item on a worker pool;
//! 5. remove the scratch directory and report.
//!
//! Each stage builds its own [`WorkerPool`] from the configuration, so no
//! pool outlives the stage that created it.

pub mod error;
mod event;

pub use self::event::{BatchEvent, Observer};
use self::error::{ErrorKind, Result};
use crate::services::Services;
use cassette_acquire::{AcquisitionWorker, Job};
use cassette_annotate::Annotator;
use cassette_config::Config;
use cassette_model::{Format, Playlist};
use cassette_pool::WorkerPool;
use cassette_resolve::PlaylistResolver;
use exn::ResultExt;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::instrument;

/// Whether annotation ran, and how it went.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AnnotationStatus {
    NotRequested,
    /// At least one item matched; carries the number of matches.
    Matched(usize),
    /// Not a single item matched: no metadata available for this batch.
    NoMetadata,
}

/// A resolved (and possibly annotated) batch, ready to acquire. The playlist
/// may be edited in between.
#[derive(Clone, Debug)]
pub struct Prepared {
    pub playlist: Playlist,
    pub annotation: AnnotationStatus,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BatchResult {
    pub succeeded: usize,
    /// In playlist order.
    pub failed_titles: Vec<String>,
    pub elapsed: Duration,
    pub annotation: AnnotationStatus,
}

impl BatchResult {
    pub fn is_complete_success(&self) -> bool {
        self.failed_titles.is_empty()
    }
}

pub struct BatchOrchestrator {
    config: Config,
    services: Services,
    observer: Option<Observer>,
}

impl BatchOrchestrator {
    pub fn new(config: Config, services: Services) -> Self {
        Self { config, services, observer: None }
    }

    pub fn with_observer(mut self, observer: Observer) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    fn emit(&self, event: BatchEvent) {
        if let Some(observer) = &self.observer {
            observer(&event);
        }
    }

    fn pool(&self) -> WorkerPool {
        WorkerPool::new(self.config.workers).with_timeout(self.config.item_timeout())
    }

    /// Resolves `reference` into a playlist.
    ///
    /// Network failures re-resolve the whole reference, up to
    /// `resolve_attempts` times in total; after that the batch fails with
    /// [`ErrorKind::ReattemptExhausted`]. Duplicate titles collapse into one
    /// entry (last write wins).
    #[instrument(skip(self))]
    pub async fn resolve(&self, reference: &str) -> Result<Playlist> {
        let resolver = PlaylistResolver::new(self.services.host.clone(), self.pool())
            .with_title_lookup(self.services.titles.clone());
        let attempts = self.config.resolve_attempts.max(1);
        let mut attempt = 0;
        let items = loop {
            attempt += 1;
            self.emit(BatchEvent::ResolveAttempt { attempt, of: attempts });
            match resolver.resolve(reference).await {
                Ok(items) => break items,
                Err(err) if err.is_retryable() && attempt < attempts => {
                    tracing::warn!(attempt, of = attempts, "Network unavailable while resolving; reattempting");
                },
                Err(err) if err.is_retryable() => {
                    tracing::error!(attempts, "Network unavailable while resolving; giving up");
                    return Err(err.raise(ErrorKind::ReattemptExhausted(attempts)));
                },
                Err(err) => return Err(ErrorKind::resolve(err)),
            }
        };

        let raw = items.len();
        let playlist: Playlist = items.into_iter().collect();
        if playlist.len() < raw {
            tracing::info!(duplicates = raw - playlist.len(), "Collapsed duplicate titles");
        }
        self.emit(BatchEvent::Resolved { items: playlist.len() });
        Ok(playlist)
    }

    /// Annotates the playlist in place. Items without a match keep their
    /// default properties.
    pub async fn annotate(&self, playlist: &mut Playlist) -> AnnotationStatus {
        let annotator = Annotator::new(self.services.provider.clone(), self.pool())
            .with_title_lookup(self.services.titles.clone());
        let annotations = annotator.annotate(playlist.items()).await;
        let matched = annotations.matched();
        annotations.apply(playlist);
        self.emit(BatchEvent::Annotated { matched, total: playlist.len() });
        if matched == 0 {
            tracing::info!("No metadata available for any item");
            AnnotationStatus::NoMetadata
        } else {
            AnnotationStatus::Matched(matched)
        }
    }

    /// Resolves, then annotates if the configuration asks for it.
    pub async fn prepare(&self, reference: &str) -> Result<Prepared> {
        let mut playlist = self.resolve(reference).await?;
        if playlist.is_empty() {
            exn::bail!(ErrorKind::NothingResolved);
        }
        let annotation =
            if self.config.annotate { self.annotate(&mut playlist).await } else { AnnotationStatus::NotRequested };
        Ok(Prepared { playlist, annotation })
    }

    /// Runs a whole batch.
    pub async fn run(&self, reference: &str, destination: &Path, format: Format) -> Result<BatchResult> {
        let started = Instant::now();
        let prepared = self.prepare(reference).await?;
        let mut result = self.acquire(&prepared.playlist, destination, format).await?;
        result.annotation = prepared.annotation;
        result.elapsed = started.elapsed();
        Ok(result)
    }

    /// Acquires every item of a playlist into `destination`.
    ///
    /// The scratch directory is created first and removed afterwards, however
    /// the individual items fared.
    #[instrument(skip(self, playlist), fields(items = playlist.len()))]
    pub async fn acquire(&self, playlist: &Playlist, destination: &Path, format: Format) -> Result<BatchResult> {
        if playlist.is_empty() {
            exn::bail!(ErrorKind::NothingResolved);
        }
        let started = Instant::now();
        let scratch = destination.join(&self.config.scratch_dir_name);
        create_scratch(destination, &scratch).await?;

        let jobs: Vec<_> = playlist
            .iter()
            .zip(playlist.file_stems())
            .map(|(entry, stem)| {
                let job = Job {
                    item: entry.item.clone(),
                    properties: entry.properties.clone(),
                    stem,
                    scratch: scratch.clone(),
                    destination: destination.to_path_buf(),
                    format,
                };
                (entry.item.title.clone(), job)
            })
            .collect();
        let worker = AcquisitionWorker::new(
            self.services.host.clone(),
            self.services.transcoder.clone(),
            self.services.artwork.clone(),
            self.services.tags.clone(),
        );
        let outcomes = self
            .pool()
            .map(jobs, move |job, ticket| {
                let worker = worker.clone();
                async move { worker.acquire(job, ticket).await }
            })
            .await;

        remove_scratch(&scratch).await;

        let mut succeeded = 0;
        let mut failed_titles = Vec::new();
        for (title, outcome) in outcomes {
            let ok = match outcome {
                Ok(_) => true,
                Err(failure) if failure.is_timeout() => {
                    tracing::warn!(%title, timeout = ?self.config.item_timeout(), "Item timed out");
                    false
                },
                // Already logged by the worker.
                Err(failure) if failure.error().is_some() => false,
                Err(failure) => {
                    tracing::warn!(%title, %failure, "Item did not finish");
                    false
                },
            };
            self.emit(BatchEvent::ItemFinished { title: title.clone(), ok });
            if ok {
                succeeded += 1;
            } else {
                failed_titles.push(title);
            }
        }
        let result = BatchResult {
            succeeded,
            failed_titles,
            elapsed: started.elapsed(),
            annotation: AnnotationStatus::NotRequested,
        };
        tracing::info!(succeeded, failed = result.failed_titles.len(), elapsed = ?result.elapsed, "Batch complete");
        self.emit(BatchEvent::Complete { succeeded, failed: result.failed_titles.len(), elapsed: result.elapsed });
        Ok(result)
    }
}

/// Creates the scratch directory. An existing one is reused; a missing
/// destination fails the batch before anything is downloaded.
async fn create_scratch(destination: &Path, scratch: &Path) -> Result<()> {
    let setup = |reason: String| ErrorKind::BatchSetup(reason);
    if scratch == destination || !scratch.starts_with(destination) {
        exn::bail!(setup(format!("scratch directory {} must live inside the destination", scratch.display())));
    }
    match tokio::fs::metadata(destination).await {
        Ok(meta) if meta.is_dir() => {},
        Ok(_) => exn::bail!(setup(format!("{} is not a directory", destination.display()))),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            exn::bail!(setup(format!("{} does not exist", destination.display())));
        },
        Err(err) => return Err(err).or_raise(|| setup(format!("cannot access {}", destination.display()))),
    }
    match tokio::fs::create_dir(scratch).await {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists && scratch.is_dir() => {
            tracing::debug!(path = %scratch.display(), "Reusing existing scratch directory");
            Ok(())
        },
        Err(err) => Err(err).or_raise(|| setup(format!("cannot create {}", scratch.display()))),
    }
}

async fn remove_scratch(scratch: &Path) {
    if let Err(err) = tokio::fs::remove_dir_all(scratch).await {
        tracing::warn!(path = %scratch.display(), error = %err, "Could not remove scratch directory");
    }
}
