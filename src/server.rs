//! Local invocation endpoint.
//!
//! Mimics the Lambda container runtime interface so the image can be
//! exercised with the same request the platform sends:
//! `POST /2015-03-31/functions/function/invocations`.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use bytes::Bytes;
use tracing::{info, warn};
use warp::Filter;

use crate::config::Config;
use crate::event::{error_result, TaskEvent};
use crate::handler;

pub async fn serve(config: Config, addr: SocketAddr) -> Result<()> {
    let routes = routes(Arc::new(config));
    info!(%addr, "invocation endpoint listening");
    warp::serve(routes).run(addr).await;
    Ok(())
}

pub fn routes(
    config: Arc<Config>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let invoke = warp::path!("2015-03-31" / "functions" / "function" / "invocations")
        .and(warp::post())
        .and(warp::body::bytes())
        .and(with_config(config))
        .then(invoke);

    let health = warp::path("health")
        .and(warp::get())
        .map(|| warp::reply::with_status("OK", warp::http::StatusCode::OK));

    invoke.or(health)
}

fn with_config(
    config: Arc<Config>,
) -> impl Filter<Extract = (Arc<Config>,), Error = std::convert::Infallible> + Clone {
    warp::any().map(move || config.clone())
}

/// Body parse failures are reported through the same `status` mapping as
/// every other failure, not as a transport-level 400.
async fn invoke(body: Bytes, config: Arc<Config>) -> warp::reply::Json {
    let event: TaskEvent = match serde_json::from_slice(&body) {
        Ok(event) => event,
        Err(e) => {
            warn!(error = %e, "malformed invocation body");
            return warp::reply::json(&error_result(format!("invalid task descriptor: {e}")));
        }
    };
    let result = handler::handle(event, &config).await;
    warp::reply::json(&result)
}
