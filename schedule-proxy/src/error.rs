use reqwest::StatusCode;
use thiserror::Error;

/// Failure talking to the calendar search API.
#[derive(Debug, Error)]
pub enum SearchError {
    /// First page answered 404: nothing matches the query.
    #[error("no calendars match the query")]
    NotFound,

    #[error("search API responded with {0}")]
    Status(StatusCode),

    #[error("search API request failed: {0}")]
    Request(#[source] reqwest::Error),

    #[error("search API returned an unreadable page: {0}")]
    Decode(#[source] reqwest::Error),
}

/// Failure downloading a single calendar feed.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("feed host responded with {0}")]
    Status(StatusCode),
}

/// Why a discovered feed contributed nothing to the schedule.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("parse failed: {0}")]
    Parse(#[from] schedule_parser::ParseError),

    #[error("feed has no X-WR-CALNAME")]
    MissingCalendarName,
}

#[derive(Debug, Error)]
pub enum ScheduleError {
    #[error("schedule search is unavailable: {0}")]
    SearchUnavailable(#[source] SearchError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Options(#[from] getopts::Fail),

    #[error("Provided value for option '{option}' is invalid: {reason}")]
    Invalid { option: &'static str, reason: String },

    #[error("Missing required option '{option}' (or `{var}` environment variable)")]
    Missing {
        option: &'static str,
        var: &'static str,
    },
}
