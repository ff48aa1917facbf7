use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed iCalendar payload: {0}")]
    Malformed(String),

    #[error("payload contains no VCALENDAR object")]
    NoCalendar,
}
