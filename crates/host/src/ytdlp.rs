use crate::classify::classify;
use crate::consts::{AUDIO_FORMAT, PLAYLIST_URL};
use crate::error::{ErrorKind, Result};
use crate::{MediaHost, VideoInfo, watch_url};
use async_trait::async_trait;
use exn::ResultExt;
use serde::Deserialize;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::instrument;

/// [`MediaHost`] backed by the `yt-dlp` command-line tool.
#[derive(Clone, Debug)]
pub struct YtDlp {
    binary: PathBuf,
}

#[derive(Deserialize)]
struct PlaylistJson {
    #[serde(default)]
    entries: Vec<Option<EntryJson>>,
}

#[derive(Deserialize)]
struct EntryJson {
    id: Option<String>,
    title: Option<String>,
    duration: Option<f64>,
}

impl YtDlp {
    /// Searches `PATH` for `yt-dlp` (or its ancestor, `youtube-dl`).
    pub fn discover() -> Result<Self> {
        for exe in ["yt-dlp", "youtube-dl"] {
            if let Ok(binary) = which::which(exe) {
                tracing::debug!(binary = %binary.display(), "Discovered media host tool");
                return Ok(Self { binary });
            }
        }
        tracing::info!("yt-dlp executable not found in PATH");
        exn::bail!(ErrorKind::ToolNotFound("yt-dlp"));
    }

    /// Uses an explicitly configured binary, falling back to discovery.
    pub fn new(binary: Option<impl Into<PathBuf>>) -> Result<Self> {
        match binary {
            Some(binary) => Ok(Self { binary: binary.into() }),
            None => Self::discover(),
        }
    }

    async fn run(&self, args: Vec<OsString>) -> Result<Vec<u8>> {
        let output = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .output()
            .await
            .or_raise(|| ErrorKind::ToolNotFound("yt-dlp"))?;
        if output.status.success() {
            return Ok(output.stdout);
        }
        let stderr = String::from_utf8_lossy(&output.stderr);
        tracing::debug!(status = ?output.status.code(), stderr = %stderr.trim(), "yt-dlp failed");
        exn::bail!(classify(&stderr));
    }

    fn base_args() -> Vec<OsString> {
        ["--no-warnings", "--no-progress", "--ignore-config"].map(OsString::from).to_vec()
    }
}

#[async_trait]
impl MediaHost for YtDlp {
    fn name(&self) -> &str {
        "yt-dlp"
    }

    #[instrument(skip(self))]
    async fn playlist(&self, playlist_id: &str) -> Result<Vec<String>> {
        let mut args = Self::base_args();
        args.extend(["--flat-playlist", "--dump-single-json"].map(OsString::from));
        args.push(format!("{PLAYLIST_URL}{playlist_id}").into());
        let stdout = self.run(args).await?;
        let listing: PlaylistJson = serde_json::from_slice(&stdout).or_raise(|| ErrorKind::Parse)?;
        // Unavailable entries come back as `null`; they are dropped here rather
        // than rejected one by one later.
        Ok(listing.entries.into_iter().flatten().filter_map(|entry| entry.id).collect())
    }

    #[instrument(skip(self))]
    async fn video(&self, video_id: &str) -> Result<VideoInfo> {
        let mut args = Self::base_args();
        args.extend(["--dump-single-json", "--no-playlist", "--skip-download"].map(OsString::from));
        args.push(watch_url(video_id).into());
        let stdout = self.run(args).await?;
        let entry: EntryJson = serde_json::from_slice(&stdout).or_raise(|| ErrorKind::Parse)?;
        Ok(VideoInfo {
            id: entry.id.unwrap_or_else(|| video_id.to_string()),
            title: entry.title.filter(|t| !t.trim().is_empty()),
            duration_seconds: entry.duration.filter(|d| d.is_finite() && *d >= 0.0).map(|d| d.round() as u64),
        })
    }

    #[instrument(skip(self, dir))]
    async fn download_audio(&self, video_id: &str, dir: &Path, stem: &str) -> Result<PathBuf> {
        let target = dir.join(format!("{stem}.m4a"));
        // The output argument is a template; literal percent signs must be doubled.
        let template = target.to_string_lossy().replace('%', "%%");
        let mut args = Self::base_args();
        let flags = ["--quiet", "--no-playlist", "--no-part", "--force-overwrites", "-f", AUDIO_FORMAT];
        args.extend(flags.map(OsString::from));
        args.extend([OsString::from("-o"), OsString::from(template), OsString::from(watch_url(video_id))]);
        self.run(args).await?;
        if !tokio::fs::try_exists(&target).await.or_raise(|| ErrorKind::Io)? {
            exn::bail!(ErrorKind::ToolFailed(format!("yt-dlp reported success but wrote no file for {video_id}")));
        }
        Ok(target)
    }
}
