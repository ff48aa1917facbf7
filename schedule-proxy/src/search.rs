use std::collections::HashSet;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::{debug, warn};
use url::Url;

use crate::error::SearchError;

/// One calendar found by the search API.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResultItem {
    #[serde(rename = "iCalLink")]
    pub ical_link: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchPage {
    #[serde(default)]
    data: Vec<SearchResultItem>,
    #[serde(rename = "nextPageToken")]
    next_page_token: Option<String>,
}

/// Client for the paginated calendar search API.
pub struct SearchClient {
    http: Client,
    url: Url,
}

impl SearchClient {
    pub fn new(http: Client, url: Url) -> Self {
        Self { http, url }
    }

    /// Collects the items of every page matching `query`.
    ///
    /// A 404 on the first page means nothing matched and is reported as
    /// [`SearchError::NotFound`]; any other failure on any page is fatal.
    pub async fn search(&self, query: Option<&str>) -> Result<Vec<SearchResultItem>, SearchError> {
        let mut items = Vec::new();
        let mut page_token: Option<String> = None;
        let mut seen_tokens = HashSet::new();

        loop {
            let page = self.fetch_page(query, page_token.as_deref()).await?;
            debug!(items = page.data.len(), "received search page");
            items.extend(page.data);

            match page.next_page_token.filter(|token| !token.is_empty()) {
                Some(token) if !seen_tokens.insert(token.clone()) => {
                    warn!(%token, "search API repeated a page token, stopping pagination");
                    break;
                }
                Some(token) => page_token = Some(token),
                None => break,
            }
        }

        Ok(items)
    }

    async fn fetch_page(
        &self,
        query: Option<&str>,
        page_token: Option<&str>,
    ) -> Result<SearchPage, SearchError> {
        let mut request = self.http.get(self.url.clone());
        if let Some(query) = query {
            request = request.query(&[("match", query)]);
        }
        if let Some(token) = page_token {
            request = request.query(&[("pageToken", token)]);
        }

        let response = request.send().await.map_err(SearchError::Request)?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND && page_token.is_none() {
            return Err(SearchError::NotFound);
        }
        if !status.is_success() {
            return Err(SearchError::Status(status));
        }

        response.json().await.map_err(SearchError::Decode)
    }
}
