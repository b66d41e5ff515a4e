use std::{fmt::Display, str::FromStr};

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Placeholder stored on events for which the portal lists no location.
pub const NO_LOCATION_PLACEHOLDER: &str = "No information";

/// One event row as extracted from a listing page, before normalization.
///
/// Field values are taken verbatim from the markup; missing fields become
/// empty strings or `None`. Whether the row survives into a
/// [`CalendarEvent`] is decided later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEventRecord {
    pub title: String,
    pub raw_start: String,
    pub raw_end: String,
    pub location: Option<String>,
    pub summary_override: Option<String>,
    pub link_suffix: Option<String>,
}

/// A normalized event, ready for feed serialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub summary: String,
    pub location: String,
    pub url: String,
}

impl Display for CalendarEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[{}] {} ({})",
            self.start.format("%Y-%m-%d %H:%M"),
            self.summary,
            self.location
        )
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Invalid summary order '{0}'. Accepted values: 'type-first', 'title-first'")]
pub struct SummaryOrderParseError(String);

/// How the event-type label and the title are combined into a summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SummaryOrder {
    TypeFirst,
    TitleFirst,
}

impl FromStr for SummaryOrder {
    type Err = SummaryOrderParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "type-first" => Ok(SummaryOrder::TypeFirst),
            "title-first" => Ok(SummaryOrder::TitleFirst),
            _ => Err(SummaryOrderParseError(s.to_string())),
        }
    }
}

impl Display for SummaryOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SummaryOrder::TypeFirst => write!(f, "type-first"),
            SummaryOrder::TitleFirst => write!(f, "title-first"),
        }
    }
}
