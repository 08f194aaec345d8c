//! In-memory metadata services for testing.

use crate::error::{ErrorKind, Result};
use crate::{MetadataProvider, TitleLookup, Track};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Answers searches from a fixed table. Unknown terms have no match.
#[derive(Default)]
pub struct MockProvider {
    tracks: HashMap<String, Track>,
    failures: HashMap<String, ErrorKind>,
    searches: AtomicUsize,
}

impl MockProvider {
    pub fn with_track(mut self, term: impl Into<String>, track: Track) -> Self {
        self.tracks.insert(term.into(), track);
        self
    }

    pub fn with_failure(mut self, term: impl Into<String>, kind: ErrorKind) -> Self {
        self.failures.insert(term.into(), kind);
        self
    }

    pub fn searches(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MetadataProvider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn search(&self, term: &str) -> Result<Option<Track>> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        if let Some(kind) = self.failures.get(term) {
            exn::bail!(kind.clone());
        }
        Ok(self.tracks.get(term).cloned())
    }
}

/// Answers title lookups from a fixed table of URLs.
#[derive(Default)]
pub struct MockTitles {
    titles: HashMap<String, String>,
}

impl MockTitles {
    pub fn with_title(mut self, url: impl Into<String>, title: impl Into<String>) -> Self {
        self.titles.insert(url.into(), title.into());
        self
    }
}

#[async_trait]
impl TitleLookup for MockTitles {
    async fn title(&self, url: &str) -> Result<Option<String>> {
        Ok(self.titles.get(url).cloned())
    }
}
