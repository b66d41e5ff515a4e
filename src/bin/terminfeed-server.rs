use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::get;
use chrono::Local;
use terminfeed::WebScraper;
use terminfeed::config::Config;
use terminfeed::feed::{build_feed, feed_filename};

const DEFAULT_BIND_ADDRESS: &str = "127.0.0.1:8055";

const LANDING_TEMPLATE: &str = include_str!("landing.html");

#[derive(Clone)]
struct AppState {
    scraper: WebScraper,
    feed_name: String,
    timezone: String,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = Config::from_env()?;
    let scraper = WebScraper::new(&config.portal_url, config.summary_order)?;

    let state = AppState {
        scraper,
        feed_name: config.feed_name,
        timezone: config.timezone,
    };

    let router = Router::new()
        .route("/", get(landing_page))
        .route("/events", get(events_feed))
        .with_state(state);

    let address = std::env::var("BIND_ADDRESS").unwrap_or_else(|_| DEFAULT_BIND_ADDRESS.into());
    let listener = tokio::net::TcpListener::bind(&address).await?;

    log::info!("Serving calendar feed on http://{}", address);

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;

    Ok(())
}

/// GET / - subscription instructions with the absolute feed URL, derived
/// from the Host header (and x-forwarded-proto when behind a proxy).
async fn landing_page(headers: HeaderMap) -> Html<String> {
    let host = headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("localhost");
    let https = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|proto| proto == "https");
    let protocol = if https { "https" } else { "http" };
    let feed_url = format!("{}://{}/events", protocol, host);

    Html(LANDING_TEMPLATE.replace("{feed_url}", &feed_url))
}

/// GET /events - runs the scrape pipeline and returns the feed. Any
/// pipeline failure becomes a plain 500; details go to the log only.
async fn events_feed(State(state): State<AppState>) -> Response {
    let today = Local::now().date_naive();

    let events = match state.scraper.scrape_events(today).await {
        Ok(events) => events,
        Err(e) => {
            log::error!("Feed generation failed: {}", e);
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to generate the calendar feed",
            )
                .into_response();
        }
    };

    let body = build_feed(&events, &state.feed_name, &state.timezone);

    (
        [
            (
                header::CONTENT_TYPE,
                "text/calendar; charset=utf-8".to_string(),
            ),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", feed_filename(&state.feed_name)),
            ),
        ],
        body,
    )
        .into_response()
}
