use crate::consts::{HOSTS, PLAYLIST_ID_REGEX, PLAYLIST_URL, VIDEO_ID_REGEX, WATCH_URL};
use crate::error::{ErrorKind, Result};
use std::fmt;
use url::Url;

/// What the user pointed us at.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Reference {
    Playlist(String),
    Video(String),
}

impl Reference {
    /// Parses a playlist or single-video URL.
    ///
    /// Accepted shapes (any of the known hosts, `http` or `https`):
    ///
    /// - `/playlist?list=<id>`
    /// - `/watch?v=<id>`; with an additional `list=` it's the playlist
    /// - `youtu.be/<id>`, `/shorts/<id>`, `/embed/<id>`
    ///
    /// ```
    /// use cassette_host::Reference;
    ///
    /// let r = Reference::parse("https://youtu.be/dQw4w9WgXcQ").unwrap();
    /// assert_eq!(r, Reference::Video("dQw4w9WgXcQ".to_string()));
    /// assert!(Reference::parse("not a url").is_err());
    /// ```
    pub fn parse(input: &str) -> Result<Self> {
        let invalid = || ErrorKind::InvalidReference(input.to_string());
        let Ok(url) = Url::parse(input.trim()) else {
            exn::bail!(invalid());
        };
        if !matches!(url.scheme(), "http" | "https") {
            exn::bail!(invalid());
        }
        let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
        if !HOSTS.contains(&host.as_str()) {
            exn::bail!(invalid());
        }

        let query = |key: &str| url.query_pairs().find(|(k, _)| k == key).map(|(_, v)| v.into_owned());
        let segments: Vec<&str> = url
            .path_segments()
            .map(|split| split.filter(|seg| !seg.is_empty()).collect())
            .unwrap_or_default();

        let reference = match (host.as_str(), segments.as_slice()) {
            (_, _) if query("list").is_some() && !matches!(segments.as_slice(), ["shorts" | "embed", ..]) => {
                query("list").map(Self::Playlist)
            },
            ("youtu.be", [id]) => Some(Self::Video(id.to_string())),
            (_, ["watch"]) => query("v").map(Self::Video),
            (_, ["shorts" | "embed" | "live", id]) => Some(Self::Video(id.to_string())),
            _ => None,
        };
        match reference {
            Some(Self::Playlist(id)) if PLAYLIST_ID_REGEX.is_match(&id) => Ok(Self::Playlist(id)),
            Some(Self::Video(id)) if VIDEO_ID_REGEX.is_match(&id) => Ok(Self::Video(id)),
            _ => exn::bail!(invalid()),
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Self::Playlist(id) | Self::Video(id) => id,
        }
    }

    pub fn is_playlist(&self) -> bool {
        matches!(self, Self::Playlist(_))
    }

    /// Canonical URL, as understood by the host and by oEmbed.
    pub fn url(&self) -> String {
        match self {
            Self::Playlist(id) => format!("{PLAYLIST_URL}{id}"),
            Self::Video(id) => watch_url(id),
        }
    }
}

impl fmt::Display for Reference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url())
    }
}

/// The canonical watch URL of a single video.
pub fn watch_url(video_id: &str) -> String {
    format!("{WATCH_URL}{video_id}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(
        "https://www.youtube.com/playlist?list=PLFIhsqj9dojq97bzw4fapbWsmIm37KtO2",
        Reference::Playlist("PLFIhsqj9dojq97bzw4fapbWsmIm37KtO2".into())
    )]
    #[case("https://www.youtube.com/watch?v=fmmty1rXzI8", Reference::Video("fmmty1rXzI8".into()))]
    #[case("http://youtube.com/watch?v=fmmty1rXzI8&t=42", Reference::Video("fmmty1rXzI8".into()))]
    #[case("https://www.youtube.com/watch?v=fmmty1rXzI8&list=PLabc123", Reference::Playlist("PLabc123".into()))]
    #[case("https://music.youtube.com/watch?v=rpupcoOmsSY", Reference::Video("rpupcoOmsSY".into()))]
    #[case("https://youtu.be/rpupcoOmsSY", Reference::Video("rpupcoOmsSY".into()))]
    #[case("https://www.youtube.com/shorts/rpupcoOmsSY", Reference::Video("rpupcoOmsSY".into()))]
    #[case("  https://www.youtube.com/embed/rpupcoOmsSY  ", Reference::Video("rpupcoOmsSY".into()))]
    fn test_parse_valid(#[case] input: &str, #[case] expected: Reference) {
        assert_eq!(Reference::parse(input).unwrap(), expected);
    }

    #[rstest]
    #[case("not a url")]
    #[case("")]
    #[case("ftp://www.youtube.com/watch?v=fmmty1rXzI8")]
    #[case("https://vimeo.com/123456")]
    #[case("https://www.youtube.com/watch")]
    #[case("https://www.youtube.com/watch?v=short")]
    #[case("https://www.youtube.com/playlist")]
    #[case("https://www.youtube.com/channel/UC123")]
    #[case("https://youtu.be/")]
    fn test_parse_invalid(#[case] input: &str) {
        let err = Reference::parse(input).unwrap_err();
        assert!(matches!(&*err, ErrorKind::InvalidReference(_)));
    }

    #[test]
    fn test_canonical_url() {
        assert_eq!(Reference::Video("fmmty1rXzI8".into()).url(), "https://www.youtube.com/watch?v=fmmty1rXzI8");
        assert_eq!(Reference::Playlist("PLabc".into()).url(), "https://www.youtube.com/playlist?list=PLabc");
    }
}
