use std::sync::LazyLock;

use crate::types::{
    CalendarEvent, NO_LOCATION_PLACEHOLDER, RawEventRecord, SummaryOrder,
};

use chrono::NaiveDateTime;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("Failed to parse datetime: {0}")]
    DateTimeError(String),
}

static RE_MERIDIEM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\S)(AM|PM)$").expect("invalid regex: meridiem suffix"));

/// Datetime encodings observed on portal listing pages, tried in order.
const DATETIME_FORMATS: &[&str] = &[
    "%m/%d/%Y %I:%M %p",
    "%d.%m.%Y %I:%M %p",
    "%Y-%m-%d %I:%M %p",
    "%m/%d/%Y %H:%M",
    "%d.%m.%Y %H:%M",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%d %H:%M:%S",
];

#[derive(Debug, Clone)]
pub enum FieldSource {
    Text,
    Attr(&'static str),
}

#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub selector: &'static str,
    pub source: FieldSource,
}

impl FieldSpec {
    fn extract(&self, row: ElementRef) -> Option<String> {
        let element = row.select(&parse_selector(self.selector)).next()?;
        match self.source {
            FieldSource::Text => Some(elem_text(element).trim().to_string()),
            FieldSource::Attr(name) => element.value().attr(name).map(str::to_string),
        }
    }
}

/// Maps each logical event field to where it lives in the listing markup,
/// so a portal layout change is a data change rather than a code change.
#[derive(Debug, Clone)]
pub struct ExtractionSchema {
    pub row: &'static str,
    pub title: FieldSpec,
    pub date_start: FieldSpec,
    pub date_end: FieldSpec,
    pub location: FieldSpec,
    pub summary: FieldSpec,
    pub url: FieldSpec,
}

impl ExtractionSchema {
    /// The portal's current listing layout: one `.row.mb-3` per event with
    /// a linked title and hidden form inputs carrying the field values.
    pub fn portal_default() -> Self {
        Self {
            row: "div.row.mb-3",
            title: FieldSpec {
                selector: ".col-lg-3 h3 a",
                source: FieldSource::Text,
            },
            date_start: FieldSpec {
                selector: r#"input[name="date_start"]"#,
                source: FieldSource::Attr("value"),
            },
            date_end: FieldSpec {
                selector: r#"input[name="date_end"]"#,
                source: FieldSource::Attr("value"),
            },
            location: FieldSpec {
                selector: r#"input[name="location"]"#,
                source: FieldSource::Attr("value"),
            },
            summary: FieldSpec {
                selector: r#"input[name="summary"]"#,
                source: FieldSource::Attr("value"),
            },
            url: FieldSpec {
                selector: r#"input[name="url"]"#,
                source: FieldSource::Attr("value"),
            },
        }
    }
}

impl Default for ExtractionSchema {
    fn default() -> Self {
        Self::portal_default()
    }
}

fn parse_selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|e| panic!("invalid selector '{}': {}", css, e))
}

fn elem_text(element: ElementRef) -> String {
    element.text().collect::<String>()
}

/// Extracts one [`RawEventRecord`] per row matched by the schema, in
/// document order. Rows with missing fields are still emitted; filtering
/// happens in [`build_event`].
pub fn extract_events(html: &str, schema: &ExtractionSchema) -> Vec<RawEventRecord> {
    let document = Html::parse_document(html);
    let row_selector = parse_selector(schema.row);

    document
        .select(&row_selector)
        .map(|row| RawEventRecord {
            title: schema.title.extract(row).unwrap_or_default(),
            raw_start: schema.date_start.extract(row).unwrap_or_default(),
            raw_end: schema.date_end.extract(row).unwrap_or_default(),
            location: schema.location.extract(row),
            summary_override: schema.summary.extract(row),
            link_suffix: schema.url.extract(row),
        })
        .collect()
}

/// Inserts the missing space before a trailing AM/PM marker ("3:00PM"
/// becomes "3:00 PM"). Idempotent; strings without the marker pass
/// through unchanged.
pub fn fix_time_spacing(raw: &str) -> String {
    RE_MERIDIEM.replace(raw, "$1 $2").into_owned()
}

/// Derives the event-type label from an event's link suffix: the final
/// path segment without query string or `.php` extension, capitalized.
pub fn derive_event_type(link_suffix: &str) -> String {
    let path = link_suffix.split('?').next().unwrap_or("");
    let base = path.rsplit('/').next().unwrap_or("");
    let base = base.strip_suffix(".php").unwrap_or(base);

    let mut chars = base.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Combines the event-type label with the summary override (or, absent
/// that, the row title) per the configured order. An empty side drops the
/// separator instead of producing a dangling "- ".
pub fn compose_summary(
    order: SummaryOrder,
    event_type: &str,
    title: &str,
    summary_override: Option<&str>,
) -> String {
    let base = summary_override
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(title);

    if event_type.is_empty() {
        return base.to_string();
    }
    if base.is_empty() {
        return event_type.to_string();
    }
    match order {
        SummaryOrder::TypeFirst => format!("{} - {}", event_type, base),
        SummaryOrder::TitleFirst => format!("{} - {}", base, event_type),
    }
}

pub fn parse_portal_datetime(raw: &str) -> Result<NaiveDateTime, ParseError> {
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .ok_or_else(|| ParseError::DateTimeError(raw.to_string()))
}

/// Turns a raw record into a [`CalendarEvent`], or drops it when the link
/// suffix is missing or either datetime is absent or unparseable. Drops
/// never abort the page; they are logged per record.
pub fn build_event(
    record: RawEventRecord,
    portal_base: &str,
    order: SummaryOrder,
) -> Option<CalendarEvent> {
    let RawEventRecord {
        title,
        raw_start,
        raw_end,
        location,
        summary_override,
        link_suffix,
    } = record;

    let Some(link_suffix) = link_suffix.filter(|s| !s.is_empty()) else {
        log::warn!("Skipping '{}': row carries no event link", title);
        return None;
    };

    let raw_start = fix_time_spacing(raw_start.trim());
    let raw_end = fix_time_spacing(raw_end.trim());
    if raw_start.is_empty() || raw_end.is_empty() {
        log::warn!("Skipping '{}': missing start or end datetime", title);
        return None;
    }

    let start = match parse_portal_datetime(&raw_start) {
        Ok(start) => start,
        Err(e) => {
            log::warn!("Skipping '{}': {}", title, e);
            return None;
        }
    };
    let end = match parse_portal_datetime(&raw_end) {
        Ok(end) => end,
        Err(e) => {
            log::warn!("Skipping '{}': {}", title, e);
            return None;
        }
    };

    if end < start {
        // Portal data defect; passed through as-is.
        log::warn!("Event '{}' ends before it starts ({} < {})", title, end, start);
    }

    let event_type = derive_event_type(&link_suffix);
    let summary = compose_summary(order, &event_type, &title, summary_override.as_deref());

    Some(CalendarEvent {
        start,
        end,
        summary,
        location: location
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .unwrap_or_else(|| NO_LOCATION_PLACEHOLDER.to_string()),
        url: format!("{}{}", portal_base, link_suffix),
    })
}
