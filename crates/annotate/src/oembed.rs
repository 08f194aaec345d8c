use crate::TitleLookup;
use crate::consts::OEMBED_URL;
use crate::error::{ErrorKind, Result, http};
use async_trait::async_trait;
use exn::ResultExt;
use serde::Deserialize;
use tracing::instrument;
use url::Url;

/// [`TitleLookup`] against an oEmbed endpoint.
#[derive(Clone, Debug)]
pub struct OEmbed {
    client: reqwest::Client,
    base_url: String,
}

#[derive(Deserialize)]
struct OEmbedResponse {
    title: Option<String>,
}

impl OEmbed {
    pub fn new(client: reqwest::Client) -> Self {
        Self { client, base_url: OEMBED_URL.to_string() }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Result<Self> {
        Url::parse(base_url).or_raise(|| ErrorKind::InvalidUrl(base_url.to_string()))?;
        self.base_url = base_url.to_string();
        Ok(self)
    }
}

#[async_trait]
impl TitleLookup for OEmbed {
    #[instrument(skip(self))]
    async fn title(&self, url: &str) -> Result<Option<String>> {
        let request = self.client.get(&self.base_url).query(&[("url", url), ("format", "json")]);
        let response = http(request.send().await)?;
        let response = http(response.error_for_status())?;
        let body: OEmbedResponse = http(response.json().await)?;
        Ok(body.title.map(|title| title.trim().to_string()).filter(|title| !title.is_empty()))
    }
}
