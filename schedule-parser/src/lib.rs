mod error;
mod parity;
mod parser;
mod structs;
mod vtimezone;

pub use error::ParseError;
pub use parity::{academic_week, week_parity};
pub use parser::{parse_calendar, DISPLAY_TIMEZONE};
pub use structs::{weekday_name, Calendar, Event, WeekParity, WEEKDAY_NAMES};
