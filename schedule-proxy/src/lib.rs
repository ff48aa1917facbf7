pub mod aggregate;
pub mod config;
pub mod error;
pub mod fetch;
pub mod search;
pub mod server;

pub use aggregate::{merge, FeedOutcome, ScheduleAggregator, ScheduleResult};
pub use config::{Command, Config, Timeouts};
pub use error::{ConfigError, FeedError, FetchError, ScheduleError, SearchError};
pub use fetch::{http_client, CalendarFetcher};
pub use search::{SearchClient, SearchResultItem};
