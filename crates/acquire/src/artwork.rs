use crate::error::{ErrorKind, Result};
use async_trait::async_trait;
use derive_more::Display;
use exn::ResultExt;
use tracing::instrument;
use url::Url;

/// Image formats we are willing to embed, detected from their signature.
#[derive(Clone, Copy, Debug, Display, PartialEq, Eq)]
pub enum ImageKind {
    #[display("image/jpeg")]
    Jpeg,
    #[display("image/png")]
    Png,
    #[display("image/gif")]
    Gif,
    #[display("image/webp")]
    Webp,
}

impl ImageKind {
    /// Identifies an image from its leading bytes.
    pub fn sniff(bytes: &[u8]) -> Option<Self> {
        match bytes {
            [0xFF, 0xD8, 0xFF, ..] => Some(Self::Jpeg),
            [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, ..] => Some(Self::Png),
            [b'G', b'I', b'F', b'8', b'7' | b'9', b'a', ..] => Some(Self::Gif),
            [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Some(Self::Webp),
            _ => None,
        }
    }
}

/// Cover art, already known to be an image.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Artwork {
    pub kind: ImageKind,
    pub bytes: Vec<u8>,
}

impl Artwork {
    /// `None` unless `bytes` carries a recognised image signature.
    pub fn from_bytes(bytes: Vec<u8>) -> Option<Self> {
        ImageKind::sniff(&bytes).map(|kind| Self { kind, bytes })
    }
}

/// Fetches cover art by reference.
///
/// Artwork is optional: every failure is reported as `None`.
#[async_trait]
pub trait ArtworkSource: Send + Sync {
    async fn fetch(&self, reference: &str) -> Option<Artwork>;
}

/// [`ArtworkSource`] over HTTP(S).
#[derive(Clone, Debug)]
pub struct HttpArtwork {
    client: reqwest::Client,
}

impl HttpArtwork {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client }
    }

    async fn download(&self, url: Url) -> Result<Artwork> {
        let response = self.client.get(url).send().await.or_raise(|| ErrorKind::Artwork)?;
        let response = response.error_for_status().or_raise(|| ErrorKind::Artwork)?;
        let bytes = response.bytes().await.or_raise(|| ErrorKind::Artwork)?;
        Artwork::from_bytes(bytes.to_vec()).ok_or_else(|| exn::Exn::from(ErrorKind::Artwork))
    }
}

#[async_trait]
impl ArtworkSource for HttpArtwork {
    #[instrument(skip(self))]
    async fn fetch(&self, reference: &str) -> Option<Artwork> {
        let url = parse(reference)?;
        match self.download(url).await {
            Ok(artwork) => Some(artwork),
            Err(err) => {
                tracing::debug!(error = ?err, "No usable artwork");
                None
            },
        }
    }
}

/// Only absolute `http`/`https` references are fetched.
fn parse(reference: &str) -> Option<Url> {
    let url = Url::parse(reference.trim()).ok()?;
    matches!(url.scheme(), "http" | "https").then_some(url)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(&[0xFF, 0xD8, 0xFF, 0xE0, 0x00], Some(ImageKind::Jpeg))]
    #[case(b"\x89PNG\r\n\x1a\n\x00\x00", Some(ImageKind::Png))]
    #[case(b"GIF89a....", Some(ImageKind::Gif))]
    #[case(b"RIFF\x24\x00\x00\x00WEBPVP8 ", Some(ImageKind::Webp))]
    #[case(b"<html>404</html>", None)]
    #[case(&[0xFF, 0xD8], None)]
    #[case(b"", None)]
    fn test_sniff(#[case] bytes: &[u8], #[case] expected: Option<ImageKind>) {
        assert_eq!(ImageKind::sniff(bytes), expected);
    }

    #[rstest]
    #[case("", false)]
    #[case("Unknown", false)]
    #[case("file:///etc/passwd", false)]
    #[case("https://example.com/600x600bb.jpg", true)]
    #[case(" http://example.com/a.png ", true)]
    fn test_only_web_references_are_fetched(#[case] reference: &str, #[case] fetched: bool) {
        assert_eq!(parse(reference).is_some(), fetched);
    }

    #[tokio::test]
    async fn test_unparseable_reference_is_no_artwork() {
        let source = HttpArtwork::new(reqwest::Client::new());
        assert_eq!(source.fetch("not a url").await, None);
    }
}
