#![allow(dead_code)]

use std::time::Duration;

use ics::parameters::TzIDParam;
use ics::properties::{Description, DtEnd, DtStart, Location, Summary};
use ics::components::Property;
use ics::ICalendar;
use schedule_proxy::{http_client, CalendarFetcher, ScheduleAggregator, SearchClient, Timeouts};
use serde_json::{json, Value};
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const SEARCH_PATH: &str = "/api/v1/calendars/search";

/// A lesson in Moscow local time.
pub struct Lesson<'a> {
    pub summary: &'a str,
    pub start: &'a str,
    pub end: &'a str,
    pub location: &'a str,
    pub description: &'a str,
}

impl<'a> Lesson<'a> {
    pub fn new(summary: &'a str, start: &'a str, end: &'a str) -> Self {
        Self {
            summary,
            start,
            end,
            location: "",
            description: "",
        }
    }
}

pub fn feed(name: Option<&str>, lessons: &[Lesson<'_>]) -> String {
    let mut calendar = ICalendar::new("2.0", "-//schedule-proxy//tests//RU");
    if let Some(name) = name {
        calendar.push(Property::new("X-WR-CALNAME", name));
    }

    for (index, lesson) in lessons.iter().enumerate() {
        let mut event = ics::Event::new(format!("lesson-{index}"), "20250820T000000Z");

        let mut start = DtStart::new(lesson.start);
        start.add(TzIDParam::new("Europe/Moscow"));
        event.push(start);

        let mut end = DtEnd::new(lesson.end);
        end.add(TzIDParam::new("Europe/Moscow"));
        event.push(end);

        event.push(Summary::new(lesson.summary));
        if !lesson.location.is_empty() {
            event.push(Location::new(lesson.location));
        }
        if !lesson.description.is_empty() {
            event.push(Description::new(lesson.description));
        }

        calendar.add_event(event);
    }

    calendar.to_string()
}

pub fn fast_timeouts() -> Timeouts {
    Timeouts {
        connect: Duration::from_millis(500),
        read: Duration::from_millis(500),
        request: Duration::from_secs(1),
    }
}

pub fn search_client(server: &MockServer) -> SearchClient {
    let url = Url::parse(&format!("{}{SEARCH_PATH}", server.uri())).unwrap();
    SearchClient::new(http_client(fast_timeouts()).unwrap(), url)
}

pub fn aggregator(server: &MockServer) -> ScheduleAggregator {
    let http = http_client(fast_timeouts()).unwrap();
    let url = Url::parse(&format!("{}{SEARCH_PATH}", server.uri())).unwrap();
    ScheduleAggregator::new(SearchClient::new(http.clone(), url), CalendarFetcher::new(http), 4)
}

pub fn feed_link(server: &MockServer, feed_path: &str) -> String {
    format!("{}{feed_path}", server.uri())
}

pub fn search_page(links: &[String], next_page_token: Option<&str>) -> Value {
    let data: Vec<Value> = links
        .iter()
        .map(|link| json!({ "iCalLink": link, "type": "group" }))
        .collect();

    match next_page_token {
        Some(token) => json!({ "data": data, "nextPageToken": token }),
        None => json!({ "data": data }),
    }
}

pub async fn mount_feed(server: &MockServer, feed_path: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(feed_path))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/calendar; charset=utf-8")
                .set_body_string(body),
        )
        .mount(server)
        .await;
}
