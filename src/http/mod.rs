//! warp surface: `GET /` health check and `GET /buscar?identidad=...`,
//! behind the per-IP rate limit, CORS and security headers.

pub mod rate_limit;
pub mod security;

use std::{convert::Infallible, sync::Arc};
use tracing::{error, info};
use warp::{
    http::{header::RETRY_AFTER, HeaderValue, StatusCode},
    reply::Response,
    Filter, Rejection, Reply,
};

use crate::config::Config;
use crate::handler::Lookup;
use rate_limit::{RateLimited, RateLimiter};

pub const HEALTH_MESSAGE: &str = "✅ API Censo Liberal Activa";
pub const RATE_LIMIT_MESSAGE: &str = "Too many requests, please try again later.";

/// Headers browsers may send on a cross-origin lookup.
const CORS_ALLOWED_HEADERS: &[&str] = &[
    "accept",
    "authorization",
    "content-type",
    "origin",
    "x-requested-with",
];

/// First `identidad` value in the query; repeats are ignored and a missing
/// parameter is the empty string.
fn identidad_param(query: Vec<(String, String)>) -> String {
    query
        .into_iter()
        .find(|(key, _)| key == "identidad")
        .map(|(_, value)| value)
        .unwrap_or_default()
}

/// The full application filter.
pub fn routes(
    lookup: Arc<Lookup>,
    limiter: Arc<RateLimiter>,
) -> impl Filter<Extract = (impl Reply,), Error = Infallible> + Clone {
    let health = warp::path::end().and(warp::get()).map(|| HEALTH_MESSAGE);

    let buscar = warp::path("buscar")
        .and(warp::path::end())
        .and(warp::get())
        .and(warp::query::<Vec<(String, String)>>())
        .and(warp::any().map(move || lookup.clone()))
        .then(buscar);

    let cors = warp::cors()
        .allow_any_origin()
        .allow_methods(vec!["GET", "OPTIONS"])
        .allow_headers(CORS_ALLOWED_HEADERS.iter().copied());

    // inner recover so 429s still get CORS headers; outer one for CORS rejections
    rate_limit::limit(limiter)
        .and(health.or(buscar))
        .recover(handle_rejection)
        .with(cors)
        .recover(handle_rejection)
        .with(warp::reply::with::headers(security::security_headers()))
}

async fn buscar(query: Vec<(String, String)>, lookup: Arc<Lookup>) -> Response {
    let raw = identidad_param(query);
    let (status, body) = lookup.handle_lookup(&raw).await;
    warp::reply::with_status(warp::reply::json(&body), status).into_response()
}

fn json_error(status: StatusCode, message: &str) -> Response {
    let body = warp::reply::json(&serde_json::json!({ "error": message }));
    warp::reply::with_status(body, status).into_response()
}

async fn handle_rejection(err: Rejection) -> Result<Response, Infallible> {
    if let Some(limited) = err.find::<RateLimited>() {
        let d = limited.retry_after;
        let secs = (d.as_secs() + u64::from(d.subsec_nanos() > 0)).max(1);
        let mut resp = json_error(StatusCode::TOO_MANY_REQUESTS, RATE_LIMIT_MESSAGE);
        resp.headers_mut().insert(RETRY_AFTER, HeaderValue::from(secs));
        return Ok(resp);
    }

    let resp = if err.is_not_found() {
        json_error(StatusCode::NOT_FOUND, "Not Found")
    } else if err.find::<warp::reject::MethodNotAllowed>().is_some() {
        json_error(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")
    } else if let Some(e) = err.find::<warp::reject::InvalidQuery>() {
        json_error(StatusCode::BAD_REQUEST, &e.to_string())
    } else if let Some(e) = err.find::<warp::cors::CorsForbidden>() {
        json_error(StatusCode::FORBIDDEN, &e.to_string())
    } else {
        error!(rejection = ?err, "unhandled rejection");
        json_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
    };
    Ok(resp)
}

/// Bind `0.0.0.0:<port>` and serve until Ctrl-C.
pub async fn serve(config: &Config, lookup: Arc<Lookup>) -> Result<(), warp::Error> {
    let limiter = Arc::new(RateLimiter::new(
        config.rate_limit_max,
        config.rate_limit_window,
    ));
    let app = routes(lookup, limiter);

    let (addr, server) = warp::serve(app).try_bind_with_graceful_shutdown(
        ([0, 0, 0, 0], config.port),
        async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutdown signal received");
        },
    )?;

    info!("API Liberal escuchando en http://localhost:{}", addr.port());
    server.await;
    Ok(())
}
