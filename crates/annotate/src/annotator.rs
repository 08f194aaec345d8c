use crate::error::Result;
use crate::{ProviderHandle, TitleLookup, TitleLookupHandle};
use cassette_host::watch_url;
use cassette_model::{AnnotatedProperties, ItemDescriptor, Playlist};
use cassette_pool::{Failure, WorkerPool};
use tracing::instrument;

/// The annotation outcome of one item.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Annotation {
    Annotated(AnnotatedProperties),
    /// No match, or the lookup failed. The item keeps its defaults.
    NotFound,
}

impl Annotation {
    pub fn is_annotated(&self) -> bool {
        matches!(self, Self::Annotated(_))
    }

    pub fn into_properties(self) -> Option<AnnotatedProperties> {
        match self {
            Self::Annotated(properties) => Some(properties),
            Self::NotFound => None,
        }
    }
}

/// Per-title annotations, in the order the items were given.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Annotations {
    entries: Vec<(String, Annotation)>,
}

impl Annotations {
    /// Whether at least one item matched. `false` means the whole batch has
    /// no metadata available.
    pub fn any_matched(&self) -> bool {
        self.entries.iter().any(|(_, annotation)| annotation.is_annotated())
    }

    pub fn matched(&self) -> usize {
        self.entries.iter().filter(|(_, annotation)| annotation.is_annotated()).count()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, title: &str) -> Option<&Annotation> {
        self.entries.iter().find(|(t, _)| t == title).map(|(_, annotation)| annotation)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Annotation)> {
        self.entries.iter().map(|(title, annotation)| (title.as_str(), annotation))
    }

    /// Writes every annotation into the playlist; items without a match are
    /// reset to their defaults.
    pub fn apply(self, playlist: &mut Playlist) {
        for (title, annotation) in self.entries {
            playlist.annotate(&title, annotation.into_properties());
        }
    }
}

impl IntoIterator for Annotations {
    type Item = (String, Annotation);
    type IntoIter = std::vec::IntoIter<(String, Annotation)>;
    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Looks up every item of a batch concurrently.
pub struct Annotator {
    provider: ProviderHandle,
    titles: Option<TitleLookupHandle>,
    pool: WorkerPool,
}

impl Annotator {
    pub fn new(provider: ProviderHandle, pool: WorkerPool) -> Self {
        Self { provider, titles: None, pool }
    }

    /// Used to find a search term for items that have no title.
    pub fn with_title_lookup(mut self, titles: TitleLookupHandle) -> Self {
        self.titles = Some(titles);
        self
    }

    /// Annotates each item by title. Never fails as a whole: every kind of
    /// per-item failure ends up as [`Annotation::NotFound`].
    #[instrument(skip_all, fields(provider = self.provider.name()))]
    pub async fn annotate<'a>(&self, items: impl IntoIterator<Item = &'a ItemDescriptor>) -> Annotations {
        let work = items.into_iter().map(|item| (item.title.clone(), item.clone()));
        let provider = self.provider.clone();
        let titles = self.titles.clone();
        let outcomes = self
            .pool
            .map(work, move |item, _| {
                let provider = provider.clone();
                let titles = titles.clone();
                async move { lookup(&provider, titles.as_deref(), &item).await }
            })
            .await;

        let entries: Vec<_> = outcomes
            .into_iter()
            .map(|(title, outcome)| {
                let annotation = match outcome {
                    Ok(annotation) => annotation,
                    Err(Failure::Failed(err)) => {
                        tracing::warn!(%title, error = %*err, "Metadata lookup failed");
                        Annotation::NotFound
                    },
                    Err(failure) => {
                        tracing::warn!(%title, %failure, "Metadata lookup did not finish");
                        Annotation::NotFound
                    },
                };
                (title, annotation)
            })
            .collect();
        let annotations = Annotations { entries };
        tracing::info!(matched = annotations.matched(), total = annotations.len(), "Annotation finished");
        annotations
    }

    /// Annotates a playlist in place and reports whether anything matched.
    pub async fn annotate_playlist(&self, playlist: &mut Playlist) -> bool {
        let annotations = self.annotate(playlist.items()).await;
        let any_matched = annotations.any_matched();
        annotations.apply(playlist);
        any_matched
    }
}

async fn lookup(
    provider: &ProviderHandle,
    titles: Option<&(dyn TitleLookup + Send + Sync)>,
    item: &ItemDescriptor,
) -> Result<Annotation> {
    let Some(term) = search_term(item, titles).await else {
        return Ok(Annotation::NotFound);
    };
    let fallback = if item.title.trim().is_empty() { &term } else { &item.title };
    Ok(match provider.search(&term).await? {
        Some(track) => Annotation::Annotated(track.to_properties(fallback)),
        None => Annotation::NotFound,
    })
}

/// The title itself, or the title the lookup service knows the item by.
async fn search_term(item: &ItemDescriptor, titles: Option<&(dyn TitleLookup + Send + Sync)>) -> Option<String> {
    if !item.title.trim().is_empty() {
        return Some(item.title.clone());
    }
    match titles?.title(&watch_url(&item.external_id)).await {
        Ok(title) => title,
        Err(err) => {
            tracing::debug!(id = %item.external_id, error = %*err, "Title lookup failed");
            None
        },
    }
}
