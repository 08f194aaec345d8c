use crate::consts::{ARTWORK_SIZE_REGEX, DEFAULT_ARTWORK_SIZE, ITUNES_SEARCH_URL, SEARCH_LIMIT};
use crate::error::{ErrorKind, Result, http};
use crate::{MetadataProvider, Track};
use async_trait::async_trait;
use exn::ResultExt;
use serde::Deserialize;
use tracing::instrument;
use url::Url;

/// [`MetadataProvider`] backed by the iTunes Search API.
#[derive(Clone, Debug)]
pub struct ITunes {
    client: reqwest::Client,
    base_url: String,
    country: Option<String>,
    artwork_size: u32,
}

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchResult {
    track_name: Option<String>,
    collection_name: Option<String>,
    artist_name: Option<String>,
    primary_genre_name: Option<String>,
    artwork_url60: Option<String>,
    artwork_url100: Option<String>,
    track_time_millis: Option<u64>,
}

impl ITunes {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            base_url: ITUNES_SEARCH_URL.to_string(),
            country: None,
            artwork_size: DEFAULT_ARTWORK_SIZE,
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Result<Self> {
        Url::parse(base_url).or_raise(|| ErrorKind::InvalidUrl(base_url.to_string()))?;
        self.base_url = base_url.to_string();
        Ok(self)
    }

    /// Two-letter store country; the API defaults to `US`.
    pub fn with_country(mut self, country: Option<String>) -> Self {
        self.country = country.filter(|c| !c.trim().is_empty());
        self
    }

    pub fn with_artwork_size(mut self, size: u32) -> Self {
        self.artwork_size = size.max(1);
        self
    }

    fn normalise(&self, result: SearchResult) -> Track {
        Track {
            name: result.track_name,
            album: result.collection_name,
            artist: result.artist_name,
            genre: result.primary_genre_name,
            artwork_url: result
                .artwork_url100
                .or(result.artwork_url60)
                .map(|url| upscale_artwork(&url, self.artwork_size)),
            length_minutes: result.track_time_millis.map(|ms| (ms as f64 / 60_000.0 * 100.0).round() / 100.0),
        }
    }
}

#[async_trait]
impl MetadataProvider for ITunes {
    fn name(&self) -> &str {
        "itunes"
    }

    #[instrument(skip(self))]
    async fn search(&self, term: &str) -> Result<Option<Track>> {
        let limit = SEARCH_LIMIT.to_string();
        let mut query = vec![("term", term), ("media", "music"), ("entity", "song"), ("limit", limit.as_str())];
        if let Some(country) = &self.country {
            query.push(("country", country.as_str()));
        }
        let response = http(self.client.get(&self.base_url).query(&query).send().await)?;
        let response = http(response.error_for_status())?;
        let body: SearchResponse = http(response.json().await)?;
        let track = body.results.into_iter().next().map(|result| self.normalise(result));
        tracing::debug!(matched = track.is_some(), "iTunes search finished");
        Ok(track)
    }
}

/// Rewrites the `NxN` size token at the end of an artwork URL to request a
/// `size`×`size` rendition. URLs without a token are returned unchanged.
///
/// ```
/// use cassette_annotate::upscale_artwork;
///
/// assert_eq!(
///     upscale_artwork("https://is1-ssl.mzstatic.com/image/thumb/Music/v4/ab/cd/60x60bb.jpg", 600),
///     "https://is1-ssl.mzstatic.com/image/thumb/Music/v4/ab/cd/600x600bb.jpg",
/// );
/// ```
pub fn upscale_artwork(url: &str, size: u32) -> String {
    ARTWORK_SIZE_REGEX.replace(url, format!("{size}x{size}${{1}}${{2}}")).into_owned()
}
