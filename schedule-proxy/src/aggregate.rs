use std::collections::BTreeMap;

use futures::stream::{self, StreamExt};
use schedule_parser::{parse_calendar, Event};
use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::{FeedError, ScheduleError, SearchError};
use crate::fetch::{http_client, CalendarFetcher};
use crate::search::SearchClient;

/// Events grouped by calendar name. Key order carries no meaning.
pub type ScheduleResult = BTreeMap<String, Vec<Event>>;

/// What one discovered feed contributed.
#[derive(Debug)]
pub enum FeedOutcome {
    Parsed { name: String, events: Vec<Event> },
    Skipped { link: String, reason: FeedError },
}

pub struct ScheduleAggregator {
    search: SearchClient,
    fetcher: CalendarFetcher,
    concurrency: usize,
}

impl ScheduleAggregator {
    pub fn new(search: SearchClient, fetcher: CalendarFetcher, concurrency: usize) -> Self {
        Self {
            search,
            fetcher,
            concurrency: concurrency.max(1),
        }
    }

    pub fn from_config(config: &Config) -> reqwest::Result<Self> {
        let http = http_client(config.timeouts)?;
        Ok(Self::new(
            SearchClient::new(http.clone(), config.search_url.clone()),
            CalendarFetcher::new(http),
            config.concurrency,
        ))
    }

    /// Searches for calendars matching `query` and collects their events.
    ///
    /// Only an unreachable search index is an error. Feeds that fail to
    /// download or parse are logged and left out.
    pub async fn get_schedule(&self, query: Option<&str>) -> Result<ScheduleResult, ScheduleError> {
        let items = match self.search.search(query).await {
            Ok(items) => items,
            Err(SearchError::NotFound) => {
                info!(?query, "no calendars match");
                return Ok(ScheduleResult::new());
            }
            Err(err) => {
                error!(?query, error = %err, "calendar search failed");
                return Err(ScheduleError::SearchUnavailable(err));
            }
        };

        let links: Vec<String> = items
            .into_iter()
            .filter_map(|item| item.ical_link)
            .filter(|link| !link.is_empty())
            .collect();

        // `buffered` yields in input order, keeping events in search order.
        let outcomes: Vec<FeedOutcome> = stream::iter(links)
            .map(|link| self.load_feed(link))
            .buffered(self.concurrency)
            .collect()
            .await;

        Ok(merge(outcomes))
    }

    async fn load_feed(&self, link: String) -> FeedOutcome {
        match self.try_load_feed(&link).await {
            Ok((name, events)) => FeedOutcome::Parsed { name, events },
            Err(reason) => {
                warn!(%link, %reason, "skipping calendar feed");
                FeedOutcome::Skipped { link, reason }
            }
        }
    }

    async fn try_load_feed(&self, link: &str) -> Result<(String, Vec<Event>), FeedError> {
        let payload = self.fetcher.fetch(link).await?;
        let calendar = parse_calendar(payload)?;
        let name = calendar.name.ok_or(FeedError::MissingCalendarName)?;
        Ok((name, calendar.events))
    }
}

/// Concatenates parsed feeds by calendar name. Skipped feeds and feeds
/// without events add no key.
pub fn merge<I: IntoIterator<Item = FeedOutcome>>(outcomes: I) -> ScheduleResult {
    let mut schedule = ScheduleResult::new();

    for outcome in outcomes {
        let FeedOutcome::Parsed { name, events } = outcome else {
            continue;
        };
        if events.is_empty() {
            continue;
        }
        schedule.entry(name).or_default().extend(events);
    }

    schedule
}
