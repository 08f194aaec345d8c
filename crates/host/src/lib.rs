//! Everything that talks to the media host.
//!
//! [`Reference`] turns user input into something the host understands, and
//! the [`MediaHost`] trait covers the three things the pipeline needs from a
//! host: list a playlist, describe a video, download a video's audio. The
//! production implementation ([`YtDlp`]) drives the `yt-dlp` command-line
//! tool; tests use `MockHost` (behind the `mock` feature).

mod classify;
mod consts;
pub mod error;
#[cfg(any(test, feature = "mock"))]
mod mock;
mod reference;
mod ytdlp;

pub use crate::classify::classify;
use crate::error::Result;
#[cfg(any(test, feature = "mock"))]
pub use crate::mock::MockHost;
pub use crate::reference::{Reference, watch_url};
pub use crate::ytdlp::YtDlp;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub type HostHandle = Arc<dyn MediaHost + Send + Sync>;

/// What the host knows about one video.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VideoInfo {
    pub id: String,
    /// Missing for entries the host lists but won't describe.
    pub title: Option<String>,
    pub duration_seconds: Option<u64>,
}

/// The operations the pipeline needs from a media host.
///
/// Failures are classified through [`ErrorKind`](error::ErrorKind): callers
/// branch on `InvalidReference`, `TransientNetwork` and `UpstreamRejected`.
#[async_trait]
pub trait MediaHost: Send + Sync {
    /// Name of the host implementation, for logging.
    fn name(&self) -> &str;

    /// The video IDs of a playlist, in playlist order.
    async fn playlist(&self, playlist_id: &str) -> Result<Vec<String>>;

    /// Metadata for a single video.
    async fn video(&self, video_id: &str) -> Result<VideoInfo>;

    /// Downloads the audio-only stream of a video into `dir` as
    /// `<stem>.m4a` and returns the written path.
    ///
    /// Implementations only ever write that one path.
    async fn download_audio(&self, video_id: &str, dir: &Path, stem: &str) -> Result<PathBuf>;
}
