use crate::batch::error::{ErrorKind, Result};
use async_trait::async_trait;
use cassette_acquire::error::{ErrorKind as AcquireErrorKind, Result as AcquireResult};
use cassette_acquire::{ArtworkHandle, Ffmpeg, HttpArtwork, LoftyTags, TagWriterHandle, Transcoder, TranscoderHandle};
use cassette_annotate::{ITunes, OEmbed, ProviderHandle, TitleLookupHandle};
use cassette_config::Config;
use cassette_host::{HostHandle, YtDlp};
use exn::ResultExt;
use std::path::Path;
use std::sync::Arc;

/// Every external collaborator a batch talks to.
#[derive(Clone)]
pub struct Services {
    pub host: HostHandle,
    pub provider: ProviderHandle,
    pub titles: TitleLookupHandle,
    pub transcoder: TranscoderHandle,
    pub artwork: ArtworkHandle,
    pub tags: TagWriterHandle,
}

impl Services {
    /// The real thing: `yt-dlp`, iTunes, oEmbed, `ffmpeg` and `lofty`.
    ///
    /// `ffmpeg` is only required when `transcode` is set.
    pub fn production(config: &Config, transcode: bool) -> Result<Self> {
        let host =
            YtDlp::new(config.tools.yt_dlp.as_deref()).or_raise(|| ErrorKind::Setup("yt-dlp unavailable".into()))?;
        let client = reqwest::Client::builder()
            .user_agent(&config.http.user_agent)
            .timeout(config.http_timeout())
            .build()
            .or_raise(|| ErrorKind::Setup("could not build HTTP client".into()))?;
        let provider = ITunes::new(client.clone())
            .with_base_url(&config.itunes.base_url)
            .or_raise(|| ErrorKind::Setup("invalid iTunes configuration".into()))?
            .with_country(config.itunes.country.clone())
            .with_artwork_size(config.itunes.artwork_size);
        let titles = OEmbed::new(client.clone())
            .with_base_url(&config.oembed.base_url)
            .or_raise(|| ErrorKind::Setup("invalid oEmbed configuration".into()))?;
        let transcoder: TranscoderHandle = if transcode {
            let ffmpeg =
                Ffmpeg::new(config.tools.ffmpeg.as_deref()).or_raise(|| ErrorKind::Setup("ffmpeg unavailable".into()))?;
            Arc::new(ffmpeg)
        } else {
            Arc::new(Unused)
        };
        Ok(Self {
            host: Arc::new(host),
            provider: Arc::new(provider),
            titles: Arc::new(titles),
            transcoder,
            artwork: Arc::new(HttpArtwork::new(client)),
            tags: Arc::new(LoftyTags),
        })
    }
}

/// Stands in for `ffmpeg` when the target format needs no conversion.
struct Unused;

#[async_trait]
impl Transcoder for Unused {
    fn name(&self) -> &str {
        "none"
    }

    async fn transcode(&self, _: &Path, _: &Path) -> AcquireResult<()> {
        exn::bail!(AcquireErrorKind::ToolNotFound("ffmpeg"));
    }
}
