//! Scripted media host for testing.

use crate::error::{ErrorKind, Result};
use crate::{MediaHost, VideoInfo};
use async_trait::async_trait;
use exn::ResultExt;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

/// Scripted media host for testing.
///
/// Everything is configured up front with the `with_*` builders; after that
/// the host only counts calls. Unknown playlists and videos are rejected the
/// way the real host rejects deleted content.
///
/// ```
/// use cassette_host::{MediaHost, MockHost};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let host = MockHost::default()
///     .with_playlist("PLabc", ["aaaaaaaaaaa"])
///     .with_video("aaaaaaaaaaa", "Some Song", 200);
/// assert_eq!(host.playlist("PLabc").await.unwrap(), ["aaaaaaaaaaa"]);
/// assert_eq!(host.video("aaaaaaaaaaa").await.unwrap().title.as_deref(), Some("Some Song"));
/// # }
/// ```
#[derive(Default)]
pub struct MockHost {
    playlists: HashMap<String, Vec<String>>,
    videos: HashMap<String, std::result::Result<VideoInfo, ErrorKind>>,
    download_failures: HashMap<String, ErrorKind>,
    download_delays: HashMap<String, Duration>,
    content: Vec<u8>,
    outages: AtomicUsize,
    playlist_calls: AtomicUsize,
    video_calls: AtomicUsize,
    download_calls: AtomicUsize,
}

impl MockHost {
    pub fn with_playlist(mut self, id: impl Into<String>, videos: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.playlists.insert(id.into(), videos.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_video(mut self, id: impl Into<String>, title: impl Into<String>, duration_seconds: u64) -> Self {
        let id = id.into();
        let info = VideoInfo { id: id.clone(), title: Some(title.into()), duration_seconds: Some(duration_seconds) };
        self.videos.insert(id, Ok(info));
        self
    }

    /// A video the host lists but has no title for.
    pub fn with_untitled_video(mut self, id: impl Into<String>) -> Self {
        let id = id.into();
        self.videos.insert(id.clone(), Ok(VideoInfo { id, ..VideoInfo::default() }));
        self
    }

    pub fn with_video_error(mut self, id: impl Into<String>, kind: ErrorKind) -> Self {
        self.videos.insert(id.into(), Err(kind));
        self
    }

    /// The next `count` playlist listings fail with a network error.
    pub fn with_outages(self, count: usize) -> Self {
        self.outages.store(count, Ordering::SeqCst);
        self
    }

    pub fn with_download_failure(mut self, id: impl Into<String>, kind: ErrorKind) -> Self {
        self.download_failures.insert(id.into(), kind);
        self
    }

    pub fn with_download_delay(mut self, id: impl Into<String>, delay: Duration) -> Self {
        self.download_delays.insert(id.into(), delay);
        self
    }

    /// Bytes written by every successful download.
    pub fn with_content(mut self, content: impl Into<Vec<u8>>) -> Self {
        self.content = content.into();
        self
    }

    pub fn playlist_calls(&self) -> usize {
        self.playlist_calls.load(Ordering::SeqCst)
    }

    pub fn video_calls(&self) -> usize {
        self.video_calls.load(Ordering::SeqCst)
    }

    pub fn download_calls(&self) -> usize {
        self.download_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MediaHost for MockHost {
    fn name(&self) -> &str {
        "mock"
    }

    async fn playlist(&self, playlist_id: &str) -> Result<Vec<String>> {
        self.playlist_calls.fetch_add(1, Ordering::SeqCst);
        let outage = self.outages.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1)).is_ok();
        if outage {
            exn::bail!(ErrorKind::TransientNetwork);
        }
        match self.playlists.get(playlist_id) {
            Some(videos) => Ok(videos.clone()),
            None => exn::bail!(ErrorKind::UpstreamRejected("The playlist does not exist.".to_string())),
        }
    }

    async fn video(&self, video_id: &str) -> Result<VideoInfo> {
        self.video_calls.fetch_add(1, Ordering::SeqCst);
        match self.videos.get(video_id) {
            Some(Ok(info)) => Ok(info.clone()),
            Some(Err(kind)) => exn::bail!(kind.clone()),
            None => exn::bail!(ErrorKind::UpstreamRejected("Video unavailable".to_string())),
        }
    }

    async fn download_audio(&self, video_id: &str, dir: &Path, stem: &str) -> Result<PathBuf> {
        self.download_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.download_delays.get(video_id) {
            tokio::time::sleep(*delay).await;
        }
        if let Some(kind) = self.download_failures.get(video_id) {
            exn::bail!(kind.clone());
        }
        // Like `yt-dlp`, create the output directory if it went missing.
        tokio::fs::create_dir_all(dir).await.or_raise(|| ErrorKind::Io)?;
        let target = dir.join(format!("{stem}.m4a"));
        tokio::fs::write(&target, &self.content).await.or_raise(|| ErrorKind::Io)?;
        Ok(target)
    }
}
