//! In-memory acquisition collaborators for testing.

use crate::artwork::{Artwork, ArtworkSource};
use crate::error::{ErrorKind, Result};
use crate::tags::TagWriter;
use crate::transcode::Transcoder;
use async_trait::async_trait;
use cassette_model::AnnotatedProperties;
use exn::ResultExt;
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

fn stem_of(path: &Path) -> String {
    path.file_stem().map(|stem| stem.to_string_lossy().into_owned()).unwrap_or_default()
}

/// "Converts" by copying bytes. Fails for configured filename stems.
#[derive(Default)]
pub struct MockTranscoder {
    failing: HashSet<String>,
    conversions: AtomicUsize,
}

impl MockTranscoder {
    pub fn failing_for(mut self, stem: impl Into<String>) -> Self {
        self.failing.insert(stem.into());
        self
    }

    pub fn conversions(&self) -> usize {
        self.conversions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transcoder for MockTranscoder {
    fn name(&self) -> &str {
        "mock"
    }

    async fn transcode(&self, input: &Path, output: &Path) -> Result<()> {
        if self.failing.contains(&stem_of(input)) {
            exn::bail!(ErrorKind::Convert);
        }
        tokio::fs::copy(input, output).await.or_raise(|| ErrorKind::Convert)?;
        self.conversions.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Serves artwork from a fixed table; the bytes still have to pass the
/// image signature check.
#[derive(Default)]
pub struct MockArtwork {
    images: HashMap<String, Vec<u8>>,
}

impl MockArtwork {
    pub fn with_artwork(mut self, reference: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.images.insert(reference.into(), bytes.into());
        self
    }
}

#[async_trait]
impl ArtworkSource for MockArtwork {
    async fn fetch(&self, reference: &str) -> Option<Artwork> {
        self.images.get(reference).cloned().and_then(Artwork::from_bytes)
    }
}

/// One recorded [`TagWriter::write`] call.
#[derive(Clone, Debug)]
pub struct TagWrite {
    pub path: PathBuf,
    pub properties: AnnotatedProperties,
    pub artwork: Option<Artwork>,
}

/// Records tag writes instead of touching the file.
#[derive(Default)]
pub struct MockTags {
    failing: HashSet<String>,
    writes: Mutex<Vec<TagWrite>>,
}

impl MockTags {
    pub fn failing_for(mut self, stem: impl Into<String>) -> Self {
        self.failing.insert(stem.into());
        self
    }

    pub fn writes(&self) -> Vec<TagWrite> {
        self.writes.lock().map(|writes| writes.clone()).unwrap_or_default()
    }
}

impl TagWriter for MockTags {
    fn write(&self, path: &Path, properties: &AnnotatedProperties, artwork: Option<&Artwork>) -> Result<()> {
        if self.failing.contains(&stem_of(path)) {
            exn::bail!(ErrorKind::Tag);
        }
        let write = TagWrite { path: path.to_path_buf(), properties: properties.clone(), artwork: artwork.cloned() };
        if let Ok(mut writes) = self.writes.lock() {
            writes.push(write);
        }
        Ok(())
    }
}
