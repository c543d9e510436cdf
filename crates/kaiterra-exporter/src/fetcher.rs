//! Upstream Kaiterra API client.
//!
//! One GET per scrape, no timeout and no retry. Errors are returned to the
//! caller, which logs them and serves the scrape without reading samples.

use reqwest::{Client, StatusCode, Url};
use thiserror::Error;

use kaiterra_common::{DecodeError, Reading, Schema};

use crate::config::Config;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Transport(#[source] reqwest::Error),
    #[error("got non-200 code: {0}")]
    Status(StatusCode),
    #[error("couldn't parse json: {0}")]
    Decode(#[from] DecodeError),
}

// reqwest errors carry the request URL, which embeds the API key.
impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        FetchError::Transport(e.without_url())
    }
}

/// Fetches the latest reading for a single device.
#[derive(Clone)]
pub struct Fetcher {
    client: Client,
    url: Url,
    schema: Schema,
}

impl Fetcher {
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        let client = Client::builder().build()?;
        Ok(Self::with_client(client, config))
    }

    pub fn with_client(client: Client, config: &Config) -> Self {
        Self {
            client,
            url: request_url(&config.api_url, &config.device_uuid, &config.api_key),
            schema: config.schema,
        }
    }

    /// Request URL without the query string, safe to log.
    pub fn endpoint(&self) -> String {
        let mut url = self.url.clone();
        url.set_query(None);
        url.to_string()
    }

    pub async fn fetch(&self) -> Result<Reading, FetchError> {
        let resp = self.client.get(self.url.clone()).send().await?;

        let status = resp.status();
        if status != StatusCode::OK {
            return Err(FetchError::Status(status));
        }

        let body = resp.bytes().await?;
        let reading = self.schema.decode(&body)?;
        tracing::debug!(
            device_id = %reading.device_id,
            ts = %reading.timestamp,
            "fetched reading"
        );
        Ok(reading)
    }
}

/// `<base><device>?key=<api key>`
fn request_url(base: &Url, device: &str, api_key: &str) -> Url {
    let mut url = base.clone();
    let path = format!("{}{}", url.path(), device);
    url.set_path(&path);
    url.query_pairs_mut().clear().append_pair("key", api_key);
    url
}
