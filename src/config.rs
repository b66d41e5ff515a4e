use std::env;
use std::str::FromStr;

use crate::types::{SummaryOrder, SummaryOrderParseError};

pub const DEFAULT_TIMEZONE: &str = "UTC";
pub const DEFAULT_FEED_NAME: &str = "Events";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("PORTAL_URL must be set to the portal's base URL")]
    MissingPortalUrl,
    #[error(transparent)]
    InvalidSummaryOrder(#[from] SummaryOrderParseError),
}

/// Process configuration, read once from the environment at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub portal_url: String,
    pub timezone: String,
    pub feed_name: String,
    pub summary_order: SummaryOrder,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let portal_url = env::var("PORTAL_URL")
            .ok()
            .map(|v| v.trim().trim_end_matches('/').to_string())
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::MissingPortalUrl)?;

        let summary_order = match env::var("SUMMARY_ORDER") {
            Ok(v) if !v.trim().is_empty() => SummaryOrder::from_str(v.trim())?,
            _ => SummaryOrder::TypeFirst,
        };

        Ok(Self {
            portal_url,
            timezone: env_or("CALENDAR_TIMEZONE", DEFAULT_TIMEZONE),
            feed_name: env_or("FEED_NAME", DEFAULT_FEED_NAME),
            summary_order,
        })
    }
}

fn env_or(key: &str, default: &str) -> String {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_summary_order_from_str() {
        assert_eq!(
            SummaryOrder::from_str("type-first").unwrap(),
            SummaryOrder::TypeFirst
        );
        assert_eq!(
            SummaryOrder::from_str("title-first").unwrap(),
            SummaryOrder::TitleFirst
        );
        assert!(SummaryOrder::from_str("alphabetical").is_err());
    }
}
