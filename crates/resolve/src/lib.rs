//! Playlist resolution.
//!
//! [`PlaylistResolver::resolve`] turns a user supplied reference into the
//! ordered list of items a batch works on. A playlist is listed first, then
//! every member is described concurrently; a single video is described on its
//! own. Items the host refuses or cannot title are dropped. A network failure
//! anywhere fails the whole resolution so the caller can retry it as a unit.

pub mod error;

use crate::error::{ErrorKind, Result};
use cassette_annotate::TitleLookupHandle;
use cassette_host::error::ErrorKind as HostErrorKind;
use cassette_host::{HostHandle, Reference, watch_url};
use cassette_model::ItemDescriptor;
use cassette_pool::{Failure, WorkerPool};
use tracing::instrument;

pub struct PlaylistResolver {
    host: HostHandle,
    pool: WorkerPool,
    titles: Option<TitleLookupHandle>,
}

impl PlaylistResolver {
    pub fn new(host: HostHandle, pool: WorkerPool) -> Self {
        Self { host, pool, titles: None }
    }

    /// Used for a single video the host returns no title for.
    pub fn with_title_lookup(mut self, titles: TitleLookupHandle) -> Self {
        self.titles = Some(titles);
        self
    }

    /// Parses `reference` and resolves it. Durations are raw seconds.
    #[instrument(skip(self))]
    pub async fn resolve(&self, reference: &str) -> Result<Vec<ItemDescriptor>> {
        let reference = Reference::parse(reference).map_err(ErrorKind::host)?;
        self.resolve_reference(&reference).await
    }

    pub async fn resolve_reference(&self, reference: &Reference) -> Result<Vec<ItemDescriptor>> {
        let items = match reference {
            Reference::Playlist(id) => self.members(id).await?,
            Reference::Video(id) => self.single(id).await?,
        };
        tracing::info!(%reference, items = items.len(), host = self.host.name(), "Resolved reference");
        Ok(items)
    }

    /// A video the host refuses is dropped like a refused playlist member,
    /// leaving nothing resolved.
    async fn single(&self, id: &str) -> Result<Vec<ItemDescriptor>> {
        let info = match self.host.video(id).await {
            Ok(info) => info,
            Err(err) if matches!(*err, HostErrorKind::UpstreamRejected(_)) => {
                tracing::warn!(%id, error = %*err, "Dropping item");
                return Ok(Vec::new());
            },
            Err(err) => return Err(ErrorKind::host(err)),
        };
        let title = match usable(info.title) {
            Some(title) => Some(title),
            None => self.lookup_title(id).await,
        };
        Ok(title.map(|title| ItemDescriptor::new(title, id, info.duration_seconds.unwrap_or(0))).into_iter().collect())
    }

    async fn members(&self, playlist_id: &str) -> Result<Vec<ItemDescriptor>> {
        let ids = self.host.playlist(playlist_id).await.map_err(ErrorKind::host)?;
        tracing::debug!(playlist = playlist_id, members = ids.len(), "Listed playlist");

        let host = self.host.clone();
        let outcomes = self
            .pool
            .map(ids.into_iter().map(|id| (id.clone(), id)), move |id, _| {
                let host = host.clone();
                async move { host.video(&id).await }
            })
            .await;

        let mut items = Vec::with_capacity(outcomes.len());
        for (id, outcome) in outcomes {
            match outcome {
                Ok(info) => match usable(info.title) {
                    Some(title) => items.push(ItemDescriptor::new(title, id, info.duration_seconds.unwrap_or(0))),
                    None => tracing::debug!(%id, "Dropping untitled item"),
                },
                // No partial credit: the whole playlist is resolved again.
                Err(Failure::Failed(err))
                    if matches!(*err, HostErrorKind::TransientNetwork | HostErrorKind::ToolNotFound(_)) =>
                {
                    return Err(ErrorKind::host(err));
                },
                Err(Failure::Failed(err)) => tracing::warn!(%id, error = %*err, "Dropping item"),
                Err(failure) if failure.is_timeout() => tracing::warn!(%id, "Dropping item that timed out"),
                Err(failure) => tracing::warn!(%id, %failure, "Dropping item"),
            }
        }
        Ok(items)
    }

    async fn lookup_title(&self, id: &str) -> Option<String> {
        let titles = self.titles.as_ref()?;
        match titles.title(&watch_url(id)).await {
            Ok(title) => usable(title),
            Err(err) => {
                tracing::debug!(%id, error = %*err, "Title lookup failed");
                None
            },
        }
    }
}

fn usable(title: Option<String>) -> Option<String> {
    title.filter(|title| !title.trim().is_empty())
}
