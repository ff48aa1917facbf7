use chrono::{DateTime, Datelike, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use ical::parser::ical::component::{IcalEvent, IcalTimeZone};
use ical::property::Property;
use ical::IcalParser;
use thiserror::Error;
use tracing::debug;

use crate::vtimezone::feed_offset;
use crate::{week_parity, Calendar, Event, ParseError};

/// Timezone all event times are shifted into.
pub const DISPLAY_TIMEZONE: Tz = chrono_tz::Europe::Moscow;

const CALENDAR_NAME: &str = "X-WR-CALNAME";
const BYTE_ORDER_MARK: &[u8] = b"\xEF\xBB\xBF";
pub(crate) const DATE_TIME_FORMAT: &str = "%Y%m%dT%H%M%S";

#[derive(Debug, Error)]
enum SkipReason {
    #[error("missing {0}")]
    Missing(&'static str),
    #[error("all-day entry")]
    AllDay,
    #[error("invalid date-time `{0}`")]
    InvalidDateTime(String),
    #[error("unknown timezone `{0}`")]
    UnknownTimezone(String),
    #[error("local time {0} does not exist in {1}")]
    NonexistentLocalTime(NaiveDateTime, String),
}

/// Parses an iCalendar payload into its calendar name and timed events.
///
/// Only `VEVENT`s whose `DTSTART` and `DTEND` resolve to a point in time are
/// kept; all-day entries and events with unresolvable times are skipped.
pub fn parse_calendar<B: AsRef<[u8]>>(bytes: B) -> Result<Calendar, ParseError> {
    let mut calendar = Calendar::default();
    let mut seen_calendar = false;

    let bytes = bytes.as_ref();
    let bytes = bytes.strip_prefix(BYTE_ORDER_MARK).unwrap_or(bytes);

    for parsed in IcalParser::new(bytes) {
        let ical = parsed.map_err(|err| ParseError::Malformed(err.to_string()))?;
        seen_calendar = true;

        if calendar.name.is_none() {
            calendar.name = find_property(&ical.properties, CALENDAR_NAME)
                .and_then(|property| property.value.as_deref())
                .map(unescape_text)
                .filter(|name| !name.is_empty());
        }

        for component in &ical.events {
            match parse_event(component, &ical.timezones) {
                Ok(event) => calendar.events.push(event),
                Err(reason) => {
                    let uid = find_property(&component.properties, "UID")
                        .and_then(|property| property.value.as_deref())
                        .unwrap_or("-");
                    debug!(uid, %reason, "skipping VEVENT");
                }
            }
        }
    }

    if !seen_calendar {
        return Err(ParseError::NoCalendar);
    }

    Ok(calendar)
}

fn parse_event(component: &IcalEvent, timezones: &[IcalTimeZone]) -> Result<Event, SkipReason> {
    let properties = &component.properties;

    let start = find_property(properties, "DTSTART").ok_or(SkipReason::Missing("DTSTART"))?;
    let end = find_property(properties, "DTEND").ok_or(SkipReason::Missing("DTEND"))?;

    let start = resolve_date_time(start, timezones)?;
    let end = resolve_date_time(end, timezones)?;

    Ok(Event {
        summary: text_value(properties, "SUMMARY"),
        start: start.time(),
        end: end.time(),
        day_of_week: start.weekday(),
        description: text_value(properties, "DESCRIPTION"),
        location: text_value(properties, "LOCATION"),
        week_parity: week_parity(start.date_naive()),
    })
}

fn resolve_date_time(
    property: &Property,
    timezones: &[IcalTimeZone],
) -> Result<DateTime<Tz>, SkipReason> {
    let raw = property.value.as_deref().map(str::trim).unwrap_or_default();

    let is_date = parameter(property, "VALUE").is_some_and(|value| value.eq_ignore_ascii_case("DATE"))
        || (raw.len() == 8 && raw.bytes().all(|byte| byte.is_ascii_digit()));
    if is_date {
        return Err(SkipReason::AllDay);
    }

    let (local, is_utc) = match raw.strip_suffix('Z') {
        Some(local) => (local, true),
        None => (raw, false),
    };

    let naive = NaiveDateTime::parse_from_str(local, DATE_TIME_FORMAT)
        .map_err(|_| SkipReason::InvalidDateTime(raw.to_string()))?;

    if is_utc {
        return Ok(Utc.from_utc_datetime(&naive).with_timezone(&DISPLAY_TIMEZONE));
    }

    // Floating times carry no zone and are read as display-local.
    let Some(tzid) = parameter(property, "TZID").map(|tzid| tzid.trim_matches('"')) else {
        return in_display_zone(DISPLAY_TIMEZONE.from_local_datetime(&naive).earliest())
            .ok_or_else(|| SkipReason::NonexistentLocalTime(naive, DISPLAY_TIMEZONE.name().to_string()));
    };

    // IANA names win; anything else must be a VTIMEZONE defined in the feed.
    let resolved = match tzid.trim_start_matches('/').parse::<Tz>() {
        Ok(zone) => in_display_zone(zone.from_local_datetime(&naive).earliest()),
        Err(_) => {
            let offset = feed_offset(timezones, tzid, naive)
                .ok_or_else(|| SkipReason::UnknownTimezone(tzid.to_string()))?;
            in_display_zone(offset.from_local_datetime(&naive).single())
        }
    };

    resolved.ok_or_else(|| SkipReason::NonexistentLocalTime(naive, tzid.to_string()))
}

fn in_display_zone<Z: TimeZone>(date_time: Option<DateTime<Z>>) -> Option<DateTime<Tz>> {
    date_time.map(|date_time| date_time.with_timezone(&DISPLAY_TIMEZONE))
}

pub(crate) fn find_property<'a>(properties: &'a [Property], name: &str) -> Option<&'a Property> {
    properties
        .iter()
        .find(|property| property.name.eq_ignore_ascii_case(name))
}

fn parameter<'a>(property: &'a Property, name: &str) -> Option<&'a str> {
    property
        .params
        .as_ref()?
        .iter()
        .find(|(key, _)| key.eq_ignore_ascii_case(name))
        .and_then(|(_, values)| values.first())
        .map(String::as_str)
}

fn text_value(properties: &[Property], name: &str) -> String {
    find_property(properties, name)
        .and_then(|property| property.value.as_deref())
        .map(unescape_text)
        .unwrap_or_default()
}

/// Reverses RFC 5545 TEXT escaping (`\n`, `\,`, `\;`, `\\`).
fn unescape_text(raw: &str) -> String {
    let mut text = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            text.push(c);
            continue;
        }

        match chars.next() {
            Some('n' | 'N') => text.push('\n'),
            Some(escaped) => text.push(escaped),
            None => text.push('\\'),
        }
    }

    text
}
