use std::{env, io, process, sync::Arc};

use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use schedule_proxy::{config, server, Command, ScheduleAggregator};

#[tokio::main]
async fn main() -> io::Result<()> {
    let config = match config::parse(env::args().skip(1), |key| env::var(key).ok()) {
        Ok(Command::Run(config)) => config,
        Ok(Command::Help(usage)) => {
            println!("{usage}");
            return Ok(());
        }
        Err(err) => {
            eprintln!("{err}");
            process::exit(1);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let aggregator = match ScheduleAggregator::from_config(&config) {
        Ok(aggregator) => Arc::new(aggregator),
        Err(err) => {
            eprintln!("Failed to build HTTP client: {err}");
            process::exit(1);
        }
    };

    let listener = TcpListener::bind(config.address).await?;
    info!(address = %config.address, search_url = %config.search_url, "Listening");
    server::serve(listener, aggregator).await
}
