use reqwest::Client;

use crate::config::Timeouts;
use crate::error::FetchError;

/// Builds the pooled client shared by search and feed calls.
pub fn http_client(timeouts: Timeouts) -> reqwest::Result<Client> {
    Client::builder()
        .connect_timeout(timeouts.connect)
        .read_timeout(timeouts.read)
        .timeout(timeouts.request)
        .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
        .build()
}

/// Downloads raw calendar feeds.
pub struct CalendarFetcher {
    http: Client,
}

impl CalendarFetcher {
    pub fn new(http: Client) -> Self {
        Self { http }
    }

    /// Fetches the payload behind `url`. Timeouts and non-2xx statuses are errors.
    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let response = self.http.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status));
        }

        Ok(response.bytes().await?.to_vec())
    }
}
