use std::fmt::Display;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use getopts::{Matches, Options};
use url::Url;

use crate::error::ConfigError;

pub struct Config {
    pub address: SocketAddr,
    pub search_url: Url,
    /// Maximum number of feeds fetched and parsed at once.
    pub concurrency: usize,
    pub timeouts: Timeouts,
}

/// Per-call HTTP budgets. `request` caps a whole call, which also bounds
/// writing the request and waiting for a pooled connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timeouts {
    pub connect: Duration,
    pub read: Duration,
    pub request: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(30),
            read: Duration::from_secs(60),
            request: Duration::from_secs(120),
        }
    }
}

pub enum Command {
    Run(Config),
    Help(String),
}

fn opts() -> Options {
    let mut opts = Options::new();
    opts.optflag(
        "h",
        "help",
        concat!("Print the help output of ", env!("CARGO_PKG_NAME")),
    );
    opts.optopt(
        "a",
        "address",
        "Socket address (IP and port) to listen on [Env: SCHEDULE_PROXY_ADDR] [Default: 127.0.0.1:8001]",
        "SOCKET_ADDRESS",
    );
    opts.optopt(
        "s",
        "search-url",
        "URL of the calendar search API [Env: SCHEDULE_SEARCH_URL]",
        "URL",
    );
    opts.optopt(
        "j",
        "concurrency",
        "Number of feeds fetched in parallel [Env: SCHEDULE_CONCURRENCY] [Default: 8]",
        "COUNT",
    );
    opts.optopt(
        "",
        "connect-timeout",
        "Connect timeout per HTTP call [Env: SCHEDULE_CONNECT_TIMEOUT] [Default: 30]",
        "SECONDS",
    );
    opts.optopt(
        "",
        "read-timeout",
        "Read timeout per HTTP call [Env: SCHEDULE_READ_TIMEOUT] [Default: 60]",
        "SECONDS",
    );
    opts.optopt(
        "",
        "request-timeout",
        "Total timeout per HTTP call [Env: SCHEDULE_REQUEST_TIMEOUT] [Default: 120]",
        "SECONDS",
    );
    opts
}

/// Reads options from `args`, falling back to `env` lookups for anything not
/// given on the command line.
pub fn parse<I, E>(args: I, env: E) -> Result<Command, ConfigError>
where
    I: IntoIterator<Item = String>,
    E: Fn(&str) -> Option<String>,
{
    let opts = opts();
    let matches = opts.parse(args)?;

    if matches.opt_present("help") {
        return Ok(Command::Help(
            opts.usage(&opts.short_usage(env!("CARGO_PKG_NAME"))),
        ));
    }

    let lookup = Lookup {
        matches: &matches,
        env: &env,
    };

    let address = lookup
        .get("address", "SCHEDULE_PROXY_ADDR")?
        .unwrap_or_else(|| SocketAddr::from(([127, 0, 0, 1], 8001)));

    let search_url = lookup
        .get("search-url", "SCHEDULE_SEARCH_URL")?
        .ok_or(ConfigError::Missing {
            option: "search-url",
            var: "SCHEDULE_SEARCH_URL",
        })?;

    let concurrency = lookup
        .get::<usize>("concurrency", "SCHEDULE_CONCURRENCY")?
        .unwrap_or(8);
    if concurrency == 0 {
        return Err(ConfigError::Invalid {
            option: "concurrency",
            reason: "must be at least 1".into(),
        });
    }

    let defaults = Timeouts::default();
    let timeouts = Timeouts {
        connect: lookup
            .seconds("connect-timeout", "SCHEDULE_CONNECT_TIMEOUT")?
            .unwrap_or(defaults.connect),
        read: lookup
            .seconds("read-timeout", "SCHEDULE_READ_TIMEOUT")?
            .unwrap_or(defaults.read),
        request: lookup
            .seconds("request-timeout", "SCHEDULE_REQUEST_TIMEOUT")?
            .unwrap_or(defaults.request),
    };

    Ok(Command::Run(Config {
        address,
        search_url,
        concurrency,
        timeouts,
    }))
}

struct Lookup<'a, E> {
    matches: &'a Matches,
    env: &'a E,
}

impl<E: Fn(&str) -> Option<String>> Lookup<'_, E> {
    fn get<T>(&self, option: &'static str, var: &str) -> Result<Option<T>, ConfigError>
    where
        T: FromStr,
        T::Err: Display,
    {
        let Some(raw) = self.matches.opt_str(option).or_else(|| (self.env)(var)) else {
            return Ok(None);
        };

        raw.trim()
            .parse()
            .map(Some)
            .map_err(|err: T::Err| ConfigError::Invalid {
                option,
                reason: err.to_string(),
            })
    }

    fn seconds(&self, option: &'static str, var: &str) -> Result<Option<Duration>, ConfigError> {
        Ok(self.get::<u64>(option, var)?.map(Duration::from_secs))
    }
}
