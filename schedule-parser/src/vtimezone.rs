//! Offsets for `TZID`s that name a `VTIMEZONE` defined inside the feed
//! rather than an IANA zone, as Outlook/Exchange exports do.

use chrono::{Datelike, Days, FixedOffset, NaiveDate, NaiveDateTime, Weekday};
use ical::parser::ical::component::IcalTimeZone;
use ical::property::Property;

use crate::parser::{find_property, DATE_TIME_FORMAT};

/// Offset in effect at local time `at` in the feed-defined zone `tzid`.
///
/// Picks the STANDARD/DAYLIGHT observance with the latest onset not after
/// `at`. Yearly `BYMONTH`/`BYDAY` recurrences are expanded; other rules fall
/// back to the observance's `DTSTART`.
pub(crate) fn feed_offset(
    timezones: &[IcalTimeZone],
    tzid: &str,
    at: NaiveDateTime,
) -> Option<FixedOffset> {
    let zone = timezones
        .iter()
        .find(|zone| value(&zone.properties, "TZID") == Some(tzid))?;

    let observances: Vec<Observance> = zone
        .transitions
        .iter()
        .filter_map(|transition| Observance::parse(&transition.properties))
        .collect();

    observances
        .iter()
        .filter_map(|observance| Some((observance.latest_onset(at)?, observance.offset)))
        .max_by_key(|(onset, _)| *onset)
        // Before every onset: the zone's earliest observance is the best guess.
        .or_else(|| {
            observances
                .iter()
                .min_by_key(|observance| observance.start)
                .map(|observance| (observance.start, observance.offset))
        })
        .map(|(_, offset)| offset)
}

struct Observance {
    start: NaiveDateTime,
    offset: FixedOffset,
    rule: Option<YearlyRule>,
}

impl Observance {
    fn parse(properties: &[Property]) -> Option<Self> {
        let start = parse_local(value(properties, "DTSTART")?)?;
        let offset = parse_utc_offset(value(properties, "TZOFFSETTO")?)?;
        let rule = value(properties, "RRULE").and_then(YearlyRule::parse);

        Some(Self {
            start,
            offset,
            rule,
        })
    }

    fn latest_onset(&self, at: NaiveDateTime) -> Option<NaiveDateTime> {
        if self.start > at {
            return None;
        }

        let Some(rule) = &self.rule else {
            return Some(self.start);
        };

        let mut years = vec![at.year(), at.year() - 1];
        if let Some(until) = rule.until {
            years.push(until.year());
        }

        years
            .into_iter()
            .filter_map(|year| rule.onset(year, self.start))
            .filter(|onset| *onset >= self.start && *onset <= at)
            .filter(|onset| rule.until.map_or(true, |until| *onset <= until))
            .max()
            .or(Some(self.start))
    }
}

/// `FREQ=YEARLY` rule as used by VTIMEZONE observances.
struct YearlyRule {
    month: Option<u32>,
    /// Ordinal and weekday from `BYDAY`, e.g. `-1SU`.
    day: Option<(i32, Weekday)>,
    until: Option<NaiveDateTime>,
}

impl YearlyRule {
    fn parse(raw: &str) -> Option<Self> {
        let mut rule = YearlyRule {
            month: None,
            day: None,
            until: None,
        };
        let mut yearly = false;

        for part in raw.split(';') {
            let (key, value) = part.split_once('=')?;
            match key.trim().to_ascii_uppercase().as_str() {
                "FREQ" => yearly = value.eq_ignore_ascii_case("YEARLY"),
                "BYMONTH" => rule.month = value.trim().parse().ok(),
                "BYDAY" => rule.day = parse_by_day(value.trim()),
                "UNTIL" => rule.until = parse_local(value.trim().trim_end_matches('Z')),
                _ => {}
            }
        }

        yearly.then_some(rule)
    }

    fn onset(&self, year: i32, start: NaiveDateTime) -> Option<NaiveDateTime> {
        let month = self.month.unwrap_or(start.month());
        let date = match self.day {
            Some((ordinal, weekday)) => nth_weekday(year, month, ordinal, weekday)?,
            None => NaiveDate::from_ymd_opt(year, month, start.day())?,
        };
        Some(date.and_time(start.time()))
    }
}

fn parse_by_day(raw: &str) -> Option<(i32, Weekday)> {
    if !raw.is_ascii() {
        return None;
    }
    let split = raw.len().checked_sub(2)?;
    let (ordinal, code) = raw.split_at(split);
    let weekday = match code.to_ascii_uppercase().as_str() {
        "MO" => Weekday::Mon,
        "TU" => Weekday::Tue,
        "WE" => Weekday::Wed,
        "TH" => Weekday::Thu,
        "FR" => Weekday::Fri,
        "SA" => Weekday::Sat,
        "SU" => Weekday::Sun,
        _ => return None,
    };
    let ordinal = match ordinal.trim_start_matches('+') {
        "" => 1,
        digits => digits.parse().ok()?,
    };
    (ordinal != 0).then_some((ordinal, weekday))
}

/// The `ordinal`-th `weekday` of the month; negative ordinals count from the end.
fn nth_weekday(year: i32, month: u32, ordinal: i32, weekday: Weekday) -> Option<NaiveDate> {
    if ordinal == 0 {
        return None;
    }
    if ordinal > 0 {
        return NaiveDate::from_weekday_of_month_opt(year, month, weekday, u8::try_from(ordinal).ok()?);
    }

    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let last = NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()?;
    let back = (7 + last.weekday().num_days_from_monday() - weekday.num_days_from_monday()) % 7;
    let weeks = u64::from(ordinal.unsigned_abs() - 1);

    let date = last
        .checked_sub_days(Days::new(u64::from(back)))?
        .checked_sub_days(Days::new(weeks * 7))?;
    (date.month() == month).then_some(date)
}

/// Parses `+HHMM` or `+HHMMSS`.
fn parse_utc_offset(raw: &str) -> Option<FixedOffset> {
    let (sign, digits) = if let Some(digits) = raw.strip_prefix('+') {
        (1, digits)
    } else {
        (-1, raw.strip_prefix('-')?)
    };
    if !matches!(digits.len(), 4 | 6) || !digits.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }

    let field = |range: std::ops::Range<usize>| digits.get(range).and_then(|part| part.parse::<i32>().ok());
    let hours = field(0..2)?;
    let minutes = field(2..4)?;
    let seconds = if digits.len() == 6 { field(4..6)? } else { 0 };

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60 + seconds))
}

fn parse_local(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw.trim(), DATE_TIME_FORMAT).ok()
}

fn value<'a>(properties: &'a [Property], name: &str) -> Option<&'a str> {
    find_property(properties, name)
        .and_then(|property| property.value.as_deref())
        .map(str::trim)
}

#[cfg(test)]
mod tests {
    use ical::IcalParser;

    use super::*;

    const EUROPEAN_ZONE: &str = "BEGIN:VCALENDAR\r\n\
VERSION:2.0\r\n\
PRODID:x\r\n\
BEGIN:VTIMEZONE\r\n\
TZID:W. Europe Standard Time\r\n\
BEGIN:STANDARD\r\n\
DTSTART:16010101T030000\r\n\
TZOFFSETFROM:+0200\r\n\
TZOFFSETTO:+0100\r\n\
RRULE:FREQ=YEARLY;BYDAY=-1SU;BYMONTH=10\r\n\
END:STANDARD\r\n\
BEGIN:DAYLIGHT\r\n\
DTSTART:16010101T020000\r\n\
TZOFFSETFROM:+0100\r\n\
TZOFFSETTO:+0200\r\n\
RRULE:FREQ=YEARLY;BYDAY=-1SU;BYMONTH=3\r\n\
END:DAYLIGHT\r\n\
END:VTIMEZONE\r\n\
END:VCALENDAR\r\n";

    fn timezones(payload: &str) -> Vec<IcalTimeZone> {
        IcalParser::new(payload.as_bytes())
            .next()
            .unwrap()
            .unwrap()
            .timezones
    }

    fn at(year: i32, month: u32, day: u32, hour: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(year, month, day)
            .unwrap()
            .and_hms_opt(hour, 0, 0)
            .unwrap()
    }

    fn hours(hours: i32) -> FixedOffset {
        FixedOffset::east_opt(hours * 3600).unwrap()
    }

    #[test]
    fn picks_observance_by_yearly_rule() {
        let zones = timezones(EUROPEAN_ZONE);
        let tzid = "W. Europe Standard Time";

        assert_eq!(feed_offset(&zones, tzid, at(2025, 9, 1, 9)), Some(hours(2)));
        assert_eq!(feed_offset(&zones, tzid, at(2025, 11, 3, 9)), Some(hours(1)));
        assert_eq!(feed_offset(&zones, tzid, at(2026, 2, 2, 9)), Some(hours(1)));
        // 2025-10-26 is the last Sunday of October.
        assert_eq!(feed_offset(&zones, tzid, at(2025, 10, 25, 12)), Some(hours(2)));
        assert_eq!(feed_offset(&zones, tzid, at(2025, 10, 26, 12)), Some(hours(1)));
    }

    #[test]
    fn unknown_zone_has_no_offset() {
        let zones = timezones(EUROPEAN_ZONE);
        assert_eq!(feed_offset(&zones, "Mars Standard Time", at(2025, 9, 1, 9)), None);
    }

    #[test]
    fn finds_nth_weekday_from_either_end() {
        let date = |y, m, d| NaiveDate::from_ymd_opt(y, m, d).unwrap();
        assert_eq!(nth_weekday(2025, 3, -1, Weekday::Sun), Some(date(2025, 3, 30)));
        assert_eq!(nth_weekday(2025, 12, -1, Weekday::Wed), Some(date(2025, 12, 31)));
        assert_eq!(nth_weekday(2025, 3, 2, Weekday::Sun), Some(date(2025, 3, 9)));
        assert_eq!(nth_weekday(2025, 2, -5, Weekday::Mon), None);
    }

    #[test]
    fn parses_utc_offsets() {
        assert_eq!(parse_utc_offset("+0300"), Some(hours(3)));
        assert_eq!(parse_utc_offset("-0500"), Some(hours(-5)));
        assert_eq!(
            parse_utc_offset("+053000"),
            FixedOffset::east_opt(5 * 3600 + 30 * 60)
        );
        assert_eq!(parse_utc_offset("0300"), None);
        assert_eq!(parse_utc_offset(""), None);
    }
}
