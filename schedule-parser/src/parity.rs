use chrono::{Datelike, Days, NaiveDate};

use crate::WeekParity;

/// Academic years start on September 1st.
const ACADEMIC_YEAR_START_MONTH: u32 = 9;

/// Odd/even label of the week `date` falls into.
///
/// Weeks are counted from the first Monday on or after September 1st of the
/// current academic year. Week 0 is odd, week 1 is even, and so on. Dates
/// that fall before that Monday are counted against the previous academic
/// year instead.
#[must_use]
pub fn week_parity(date: NaiveDate) -> WeekParity {
    match academic_week(date) {
        Some(week) if week % 2 != 0 => WeekParity::Even,
        _ => WeekParity::Odd,
    }
}

/// Zero-based week number of `date` within its academic year.
///
/// Returns `None` only for dates at the edge of the representable range.
#[must_use]
pub fn academic_week(date: NaiveDate) -> Option<i64> {
    let year = if date.month() >= ACADEMIC_YEAR_START_MONTH {
        date.year()
    } else {
        date.year() - 1
    };

    let mut week_zero = first_monday(year)?;
    if date < week_zero {
        week_zero = first_monday(year - 1)?;
    }

    Some((date - week_zero).num_days() / 7)
}

fn first_monday(year: i32) -> Option<NaiveDate> {
    let start = NaiveDate::from_ymd_opt(year, ACADEMIC_YEAR_START_MONTH, 1)?;
    let offset = (7 - start.weekday().num_days_from_monday()) % 7;
    start.checked_add_days(Days::new(u64::from(offset)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    #[test]
    fn first_monday_is_september_first_when_it_is_a_monday() {
        assert_eq!(first_monday(2025), Some(date(2025, 9, 1)));
        assert_eq!(first_monday(2024), Some(date(2024, 9, 2)));
        assert_eq!(first_monday(2023), Some(date(2023, 9, 4)));
    }

    #[test]
    fn first_week_is_odd_and_next_is_even() {
        let monday = date(2025, 9, 1);
        for offset in 0..7 {
            let day = monday + Days::new(offset);
            assert_eq!(week_parity(day), WeekParity::Odd, "{day}");
        }
        for offset in 7..14 {
            let day = monday + Days::new(offset);
            assert_eq!(week_parity(day), WeekParity::Even, "{day}");
        }
    }

    #[test]
    fn parity_alternates_through_the_year() {
        let monday = date(2024, 9, 2);
        for week in 0..52_u64 {
            let expected = if week % 2 == 0 {
                WeekParity::Odd
            } else {
                WeekParity::Even
            };
            assert_eq!(week_parity(monday + Days::new(week * 7 + 3)), expected);
        }
    }

    #[test]
    fn spring_dates_belong_to_previous_academic_year() {
        // 2024-09-02 is week 0, so 2025-02-10 is 23 weeks later.
        assert_eq!(academic_week(date(2025, 2, 10)), Some(23));
        assert_eq!(week_parity(date(2025, 2, 10)), WeekParity::Even);
    }

    #[test]
    fn days_before_first_monday_fall_back_to_previous_year() {
        // 2024-09-01 is a Sunday; it closes the 2023/24 year that began 2023-09-04.
        assert_eq!(academic_week(date(2024, 9, 1)), Some(51));
        assert_eq!(week_parity(date(2024, 9, 1)), WeekParity::Even);
    }

    #[test]
    fn august_counts_from_previous_september() {
        assert_eq!(academic_week(date(2025, 8, 31)), Some(51));
        assert_eq!(week_parity(date(2025, 8, 31)), WeekParity::Even);
    }
}
