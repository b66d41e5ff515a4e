use crate::parser::{ExtractionSchema, build_event, extract_events};
use crate::types::{CalendarEvent, SummaryOrder};

use chrono::{Datelike, NaiveDate};
use reqwest::Client;
use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum ScraperError {
    #[error("Failed to build HTTP client: {0}")]
    Client(#[from] reqwest::Error),
    #[error("Request for {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("Non-text response from {url}: content type '{content_type}'")]
    NonTextResponse { url: String, content_type: String },
}

/// One (month, year) listing page to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthWindow {
    pub month: u32,
    pub year: i32,
}

impl MonthWindow {
    /// The current and the next calendar month, with December rolling
    /// over into January of the following year.
    pub fn current_and_next(today: NaiveDate) -> [MonthWindow; 2] {
        let current = MonthWindow {
            month: today.month(),
            year: today.year(),
        };
        let next = if current.month == 12 {
            MonthWindow {
                month: 1,
                year: current.year + 1,
            }
        } else {
            MonthWindow {
                month: current.month + 1,
                year: current.year,
            }
        };
        [current, next]
    }

    pub fn listing_url(&self, base_url: &str) -> String {
        format!(
            "{}/terminliste.php?dateselection=01.{:02}.{:04}",
            base_url, self.month, self.year
        )
    }
}

#[derive(Debug, Clone)]
pub struct WebScraper {
    client: Client,
    base_url: String,
    summary_order: SummaryOrder,
    schema: ExtractionSchema,
}

impl WebScraper {
    pub fn new(base_url: &str, summary_order: SummaryOrder) -> Result<Self, ScraperError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .user_agent(format!(
                "{}/{}",
                env!("CARGO_PKG_NAME"),
                env!("CARGO_PKG_VERSION")
            ))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            summary_order,
            schema: ExtractionSchema::default(),
        })
    }

    /// Fetches one page of raw HTML. The sole network boundary; no
    /// retries, no caching.
    pub async fn fetch_page(&self, url: &str) -> Result<String, ScraperError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|source| ScraperError::Request {
                url: url.to_string(),
                source,
            })?;

        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !is_text_content_type(&content_type) {
            return Err(ScraperError::NonTextResponse {
                url: url.to_string(),
                content_type,
            });
        }

        response.text().await.map_err(|source| ScraperError::Request {
            url: url.to_string(),
            source,
        })
    }

    /// Scrapes the current and next month's listing pages and returns the
    /// surviving events in window order, document order within a window.
    /// A failed fetch for either window fails the whole run; there is no
    /// partial feed. Duplicates listed in both windows are kept.
    pub async fn scrape_events(
        &self,
        today: NaiveDate,
    ) -> Result<Vec<CalendarEvent>, ScraperError> {
        let mut events = Vec::new();

        for window in MonthWindow::current_and_next(today) {
            let url = window.listing_url(&self.base_url);
            log::info!(
                "Fetching event listing for {:02}.{} from {}",
                window.month,
                window.year,
                url
            );

            let html = self.fetch_page(&url).await?;
            let records = extract_events(&html, &self.schema);
            log::debug!(
                "Extracted {} raw event rows for {:02}.{}",
                records.len(),
                window.month,
                window.year
            );

            events.extend(
                records
                    .into_iter()
                    .filter_map(|record| build_event(record, &self.base_url, self.summary_order)),
            );
        }

        log::info!("Scraped {} events across both windows", events.len());
        Ok(events)
    }
}

fn is_text_content_type(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();

    // A missing header is treated as text; the body decode decides.
    mime.is_empty() || mime.starts_with("text/") || mime == "application/xhtml+xml"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_windows_mid_year() {
        let today = NaiveDate::from_ymd_opt(2026, 3, 14).unwrap();
        let [current, next] = MonthWindow::current_and_next(today);

        assert_eq!(current, MonthWindow { month: 3, year: 2026 });
        assert_eq!(next, MonthWindow { month: 4, year: 2026 });
    }

    #[test]
    fn test_windows_december_rolls_year() {
        let today = NaiveDate::from_ymd_opt(2026, 12, 31).unwrap();
        let [current, next] = MonthWindow::current_and_next(today);

        assert_eq!(current, MonthWindow { month: 12, year: 2026 });
        assert_eq!(next, MonthWindow { month: 1, year: 2027 });
    }

    #[test]
    fn test_windows_january() {
        let today = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let [current, next] = MonthWindow::current_and_next(today);

        assert_eq!(current, MonthWindow { month: 1, year: 2026 });
        assert_eq!(next, MonthWindow { month: 2, year: 2026 });
    }

    #[test]
    fn test_listing_url_is_zero_padded() {
        let window = MonthWindow { month: 3, year: 2026 };
        assert_eq!(
            window.listing_url("https://portal.example"),
            "https://portal.example/terminliste.php?dateselection=01.03.2026"
        );
    }

    #[test]
    fn test_is_text_content_type() {
        assert!(is_text_content_type("text/html"));
        assert!(is_text_content_type("text/html; charset=utf-8"));
        assert!(is_text_content_type("TEXT/HTML"));
        assert!(is_text_content_type("application/xhtml+xml"));
        assert!(is_text_content_type(""));

        assert!(!is_text_content_type("application/pdf"));
        assert!(!is_text_content_type("image/png"));
        assert!(!is_text_content_type("application/octet-stream"));
    }
}
