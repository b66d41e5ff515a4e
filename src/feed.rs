use crate::types::CalendarEvent;

use chrono::NaiveDateTime;
use icalendar::{Calendar, Component, Event, EventLike, Property};

/// Serializes the event list into a VCALENDAR document. Every event
/// carries DTSTART/DTEND in the given timezone plus SUMMARY, LOCATION and
/// URL; an empty list still yields a valid zero-event calendar.
pub fn build_feed(events: &[CalendarEvent], feed_name: &str, timezone: &str) -> String {
    let mut calendar = Calendar::new();
    calendar.name(feed_name).timezone(timezone);

    for event in events {
        let mut entry = Event::new();
        entry.summary(&event.summary);
        entry.location(&event.location);
        add_zoned_datetime(&mut entry, "DTSTART", event.start, timezone);
        add_zoned_datetime(&mut entry, "DTEND", event.end, timezone);
        entry.add_property("URL", &event.url);
        calendar.push(entry.done());
    }

    calendar.done().to_string()
}

/// Datetime property with a TZID parameter, e.g.
/// `DTSTART;TZID=Europe/Berlin:20260305T180000`.
fn add_zoned_datetime(entry: &mut Event, name: &str, datetime: NaiveDateTime, tzid: &str) {
    let mut prop = Property::new(name, datetime.format("%Y%m%dT%H%M%S").to_string());
    prop.add_parameter("TZID", tzid);
    entry.append_property(prop);
}

/// Download filename for the feed: the slugified feed name plus `.ics`.
pub fn feed_filename(feed_name: &str) -> String {
    let slug = feed_name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '-' })
        .collect::<String>()
        .split('-')
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-");

    if slug.is_empty() {
        "events.ics".to_string()
    } else {
        format!("{}.ics", slug)
    }
}
