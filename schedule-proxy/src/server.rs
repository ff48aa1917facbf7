use std::{io, sync::Arc};

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tokio::{net::TcpListener, signal};
use tracing::{error, info};

use crate::aggregate::{ScheduleAggregator, ScheduleResult};

pub const SCHEDULE_PATH: &str = "/schedule_1";

#[derive(Deserialize)]
struct ScheduleQuery {
    query: Option<String>,
}

#[derive(Serialize)]
struct ScheduleResponse {
    events_by_calname: ScheduleResult,
}

pub fn router(aggregator: Arc<ScheduleAggregator>) -> Router {
    Router::new()
        .route(SCHEDULE_PATH, get(handle_schedule))
        .with_state(aggregator)
}

pub async fn serve(listener: TcpListener, aggregator: Arc<ScheduleAggregator>) -> io::Result<()> {
    axum::serve(listener, router(aggregator))
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn handle_schedule(
    State(aggregator): State<Arc<ScheduleAggregator>>,
    Query(params): Query<ScheduleQuery>,
) -> Response {
    // An empty `query` means the same as none: list everything.
    let query = params.query.as_deref().filter(|query| !query.is_empty());

    match aggregator.get_schedule(query).await {
        Ok(events_by_calname) => {
            info!(
                ?query,
                calendars = events_by_calname.len(),
                events = events_by_calname.values().map(Vec::len).sum::<usize>(),
                "served schedule"
            );
            Json(ScheduleResponse { events_by_calname }).into_response()
        }
        Err(err) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(json!({ "detail": err.to_string() })),
        )
            .into_response(),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = signal::ctrl_c().await {
            error!(error = %err, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(err) => {
                error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    info!("Shutting down");
}
