use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use exn::ResultExt;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::instrument;

/// Converts a raw audio stream into the target format.
#[async_trait]
pub trait Transcoder: Send + Sync {
    fn name(&self) -> &str;

    /// Writes `output` from `input`. On failure `output` must not exist.
    async fn transcode(&self, input: &Path, output: &Path) -> Result<()>;
}

/// [`Transcoder`] that shells out to `ffmpeg`.
#[derive(Clone, Debug)]
pub struct Ffmpeg {
    binary: PathBuf,
}

impl Ffmpeg {
    pub fn discover() -> Result<Self> {
        if let Ok(binary) = which::which("ffmpeg") {
            tracing::debug!(binary = %binary.display(), "Discovered transcoder");
            return Ok(Self { binary });
        }
        tracing::info!("ffmpeg executable not found in PATH");
        exn::bail!(ErrorKind::ToolNotFound("ffmpeg"));
    }

    /// Uses an explicitly configured binary, falling back to discovery.
    pub fn new(binary: Option<impl Into<PathBuf>>) -> Result<Self> {
        match binary {
            Some(binary) => Ok(Self { binary: binary.into() }),
            None => Self::discover(),
        }
    }
}

#[async_trait]
impl Transcoder for Ffmpeg {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    #[instrument(skip(self))]
    async fn transcode(&self, input: &Path, output: &Path) -> Result<()> {
        let result = Command::new(&self.binary)
            .args(["-hide_banner", "-nostdin", "-loglevel", "error", "-y", "-i"])
            .arg(input)
            .args(["-vn", "-codec:a", "libmp3lame", "-q:a", "2"])
            .arg(output)
            .stdin(Stdio::null())
            .output()
            .await;
        let failure = match result {
            Ok(finished) if finished.status.success() => return Ok(()),
            Ok(finished) => String::from_utf8_lossy(&finished.stderr).trim().to_string(),
            Err(err) => err.to_string(),
        };
        // ffmpeg happily leaves a truncated file behind.
        if let Err(err) = tokio::fs::remove_file(output).await
            && err.kind() != std::io::ErrorKind::NotFound
        {
            Err(err).or_raise(|| ErrorKind::Io)?;
        }
        tracing::warn!(error = %failure, "ffmpeg failed");
        exn::bail!(ErrorKind::Convert);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_failed_conversion_leaves_no_output() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.m4a");
        let output = dir.path().join("out.mp3");
        std::fs::write(&input, b"not audio").unwrap();
        std::fs::write(&output, b"stale partial output").unwrap();
        let ffmpeg = Ffmpeg { binary: PathBuf::from("/nonexistent/definitely-not-ffmpeg") };
        let err = ffmpeg.transcode(&input, &output).await.unwrap_err();
        assert_eq!(*err, ErrorKind::Convert);
        assert!(!output.exists());
    }
}
