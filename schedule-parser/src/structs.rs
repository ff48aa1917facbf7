use std::fmt;

use chrono::{NaiveTime, Weekday};

#[cfg(feature = "serde")]
use chrono::Timelike;
#[cfg(feature = "serde")]
use serde::{Serialize, Serializer};

#[cfg(feature = "serde")]
fn serialize_naive_time<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
    let formatted_time = format!("{:02}:{:02}", time.hour(), time.minute());
    serializer.serialize_str(&formatted_time)
}

#[cfg(feature = "serde")]
fn serialize_weekday<S: Serializer>(weekday: &Weekday, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(weekday_name(*weekday))
}

/// Localized weekday names, Monday first.
pub const WEEKDAY_NAMES: [&str; 7] = [
    "Понедельник",
    "Вторник",
    "Среда",
    "Четверг",
    "Пятница",
    "Суббота",
    "Воскресенье",
];

#[must_use]
pub fn weekday_name(weekday: Weekday) -> &'static str {
    WEEKDAY_NAMES[weekday.num_days_from_monday() as usize]
}

/// Odd/even week label of the academic calendar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub enum WeekParity {
    #[cfg_attr(feature = "serde", serde(rename = "нечетная"))]
    Odd,
    #[cfg_attr(feature = "serde", serde(rename = "четная"))]
    Even,
}

impl WeekParity {
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            WeekParity::Odd => "нечетная",
            WeekParity::Even => "четная",
        }
    }
}

impl fmt::Display for WeekParity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One lesson occurrence, with times already shifted into the display timezone.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize))]
pub struct Event {
    pub summary: String,
    #[cfg_attr(feature = "serde", serde(serialize_with = "serialize_naive_time"))]
    pub start: NaiveTime,
    #[cfg_attr(feature = "serde", serde(serialize_with = "serialize_naive_time"))]
    pub end: NaiveTime,
    #[cfg_attr(feature = "serde", serde(serialize_with = "serialize_weekday"))]
    pub day_of_week: Weekday,
    pub description: String,
    pub location: String,
    pub week_parity: WeekParity,
}

/// Result of parsing one feed.
#[derive(Debug, Clone, Default)]
pub struct Calendar {
    /// Value of the feed-level `X-WR-CALNAME` property.
    pub name: Option<String>,
    pub events: Vec<Event>,
}
