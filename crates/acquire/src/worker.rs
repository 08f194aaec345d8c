use crate::artwork::ArtworkSource;
use crate::error::{ErrorKind, Result};
use crate::stage::{Progress, Stage};
use crate::tags::TagWriter;
use crate::transcode::Transcoder;
use cassette_host::HostHandle;
use cassette_model::{AnnotatedProperties, Format, ItemDescriptor};
use cassette_pool::Ticket;
use exn::ResultExt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::instrument;

pub type TranscoderHandle = Arc<dyn Transcoder + Send + Sync>;
pub type ArtworkHandle = Arc<dyn ArtworkSource + Send + Sync>;
pub type TagWriterHandle = Arc<dyn TagWriter + Send + Sync>;

/// Everything one item needs, passed by value into its task.
#[derive(Clone, Debug)]
pub struct Job {
    pub item: ItemDescriptor,
    pub properties: AnnotatedProperties,
    /// Filename stem, unique within the batch.
    pub stem: String,
    pub scratch: PathBuf,
    pub destination: PathBuf,
    pub format: Format,
}

impl Job {
    /// Where the finished file ends up.
    pub fn output_path(&self) -> PathBuf {
        self.destination.join(format!("{}.{}", self.stem, self.format.extension()))
    }

    fn raw_path(&self) -> PathBuf {
        self.scratch.join(format!("{}.{}", self.stem, Format::RAW.extension()))
    }

    fn staged_path(&self) -> PathBuf {
        if self.format.needs_transcode() {
            self.scratch.join(format!("{}.{}", self.stem, self.format.extension()))
        } else {
            self.raw_path()
        }
    }
}

/// Turns one [`Job`] into one tagged file in the destination directory.
///
/// Nothing is written to the destination until the file is complete and the
/// item's [`Ticket`] has been committed; until then all work happens on the
/// item's own files in the scratch directory. Those are removed before
/// [`acquire`](Self::acquire) returns, whatever the outcome.
#[derive(Clone)]
pub struct AcquisitionWorker {
    host: HostHandle,
    transcoder: TranscoderHandle,
    artwork: ArtworkHandle,
    tags: TagWriterHandle,
}

impl AcquisitionWorker {
    pub fn new(host: HostHandle, transcoder: TranscoderHandle, artwork: ArtworkHandle, tags: TagWriterHandle) -> Self {
        Self { host, transcoder, artwork, tags }
    }

    /// Returns the published path.
    #[instrument(skip_all, fields(title = %job.item.title, id = %job.item.external_id))]
    pub async fn acquire(&self, job: Job, ticket: Ticket) -> Result<PathBuf> {
        let mut progress = Progress::new(&job.item.title);
        let result = self.run(&job, &ticket, &mut progress).await;
        remove_scratch_files(&[job.raw_path(), job.staged_path()]).await;
        if ticket.is_abandoned() {
            // The batch may already have removed the scratch directory, and a
            // late download can bring it back.
            remove_abandoned_scratch(&job.scratch).await;
        }
        match &result {
            Ok(path) => {
                progress.advance(Stage::Done);
                tracing::info!(path = %path.display(), "Acquired");
            },
            Err(err) => {
                let failed_in = progress.stage();
                progress.advance(Stage::Failed);
                tracing::warn!(stage = %failed_in, error = ?err, "Acquisition failed");
            },
        }
        result
    }

    async fn run(&self, job: &Job, ticket: &Ticket, progress: &mut Progress<'_>) -> Result<PathBuf> {
        ensure_live(ticket)?;
        progress.advance(Stage::Downloading);
        let raw = self
            .host
            .download_audio(&job.item.external_id, &job.scratch, &job.stem)
            .await
            .or_raise(|| ErrorKind::Download)?;

        let staged = job.staged_path();
        if job.format.needs_transcode() {
            ensure_live(ticket)?;
            progress.advance(Stage::Converting);
            self.transcoder.transcode(&raw, &staged).await?;
            remove_scratch_files(&[raw]).await;
        }

        ensure_live(ticket)?;
        progress.advance(Stage::Tagging);
        let artwork =
            if job.properties.has_artwork() { self.artwork.fetch(&job.properties.artwork).await } else { None };
        let tags = self.tags.clone();
        let properties = job.properties.clone();
        let path = staged.clone();
        tokio::task::spawn_blocking(move || tags.write(&path, &properties, artwork.as_ref()))
            .await
            .or_raise(|| ErrorKind::Tag)??;

        if !ticket.commit() {
            exn::bail!(ErrorKind::Abandoned);
        }
        let output = job.output_path();
        tokio::fs::rename(&staged, &output).await.or_raise(|| ErrorKind::Io)?;
        Ok(output)
    }
}

fn ensure_live(ticket: &Ticket) -> Result<()> {
    if ticket.is_abandoned() {
        exn::bail!(ErrorKind::Abandoned);
    }
    Ok(())
}

/// Removes the scratch directory if nothing else is using it.
async fn remove_abandoned_scratch(scratch: &Path) {
    match tokio::fs::remove_dir(scratch).await {
        Ok(()) => tracing::debug!(path = %scratch.display(), "Removed scratch directory after abandonment"),
        Err(err) if matches!(err.kind(), std::io::ErrorKind::NotFound | std::io::ErrorKind::DirectoryNotEmpty) => {},
        Err(err) => tracing::warn!(path = %scratch.display(), error = %err, "Could not remove scratch directory"),
    }
}

async fn remove_scratch_files(paths: &[PathBuf]) {
    for path in paths {
        remove_quietly(path).await;
    }
}

async fn remove_quietly(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => tracing::trace!(path = %path.display(), "Removed scratch file"),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {},
        Err(err) => tracing::warn!(path = %path.display(), error = %err, "Could not remove scratch file"),
    }
}
