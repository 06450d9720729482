//! iCalendar export of scheduled events.
//!
//! Only the subset the planner produces is written and read back: one
//! `VEVENT` per event with floating local start and end times.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Timelike, Utc};
use flowplan_store::Event;
use thiserror::Error;

pub const PRODID: &str = "-//FlowPlan//Planner//EN";
pub const UID_DOMAIN: &str = "flowplan.local";

const CRLF: &str = "\r\n";
const LOCAL_FORMAT: &str = "%Y%m%dT%H%M%S";
const UTC_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Errors from reading an exported calendar back.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExportParseError {
    #[error("document does not start with BEGIN:VCALENDAR")]
    NotACalendar,

    #[error("event ending on line {line} is missing {field}")]
    MissingField { field: &'static str, line: usize },

    #[error("invalid date-time {value:?} on line {line}")]
    InvalidDateTime { value: String, line: usize },

    #[error("unterminated {0} block")]
    Unterminated(&'static str),
}

/// One event as read back from an exported document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedEvent {
    pub uid: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub summary: String,
}

impl ExportedEvent {
    /// The originating event id, with the UID domain stripped.
    pub fn event_id(&self) -> &str {
        self.uid
            .strip_suffix(UID_DOMAIN)
            .and_then(|s| s.strip_suffix('@'))
            .unwrap_or(&self.uid)
    }

    pub fn date(&self) -> NaiveDate {
        self.start.date()
    }

    pub fn start_hour(&self) -> u32 {
        self.start.hour()
    }

    pub fn duration_hours(&self) -> i64 {
        (self.end - self.start).num_hours()
    }
}

/// Render `events` as an iCalendar document.
///
/// Output is byte-identical for identical inputs. Every line, including the
/// last, ends in CRLF.
pub fn serialize(events: &[Event], stamp: DateTime<Utc>, calendar_name: &str) -> String {
    let stamp = stamp.format(UTC_FORMAT).to_string();
    let mut lines = vec![
        "BEGIN:VCALENDAR".to_string(),
        "VERSION:2.0".to_string(),
        format!("PRODID:{PRODID}"),
        format!("X-WR-CALNAME:{}", escape_text(calendar_name)),
    ];

    for event in events {
        let start = event_start(event);
        let end = start + TimeDelta::hours(i64::from(event.duration));
        lines.push("BEGIN:VEVENT".to_string());
        lines.push(format!("UID:{}@{UID_DOMAIN}", event.id));
        lines.push(format!("DTSTAMP:{stamp}"));
        lines.push(format!("DTSTART:{}", start.format(LOCAL_FORMAT)));
        lines.push(format!("DTEND:{}", end.format(LOCAL_FORMAT)));
        lines.push(format!("SUMMARY:{}", escape_text(&event.title)));
        lines.push("END:VEVENT".to_string());
    }
    lines.push("END:VCALENDAR".to_string());

    let mut out = lines.join(CRLF);
    out.push_str(CRLF);
    out
}

/// Read the events of a document produced by [`serialize`].
///
/// Folded lines are unfolded; properties other than UID, DTSTART, DTEND and
/// SUMMARY are ignored.
pub fn parse(document: &str) -> Result<Vec<ExportedEvent>, ExportParseError> {
    let lines = unfold(document);
    let mut iter = lines.iter().filter(|(_, l)| !l.is_empty());

    match iter.next() {
        Some((_, first)) if first == "BEGIN:VCALENDAR" => {}
        _ => return Err(ExportParseError::NotACalendar),
    }

    let mut events = Vec::new();
    let mut current: Option<PartialEvent> = None;
    let mut closed = false;

    for (line_no, line) in iter {
        let line_no = *line_no;
        let (name, value) = line.split_once(':').unwrap_or((line.as_str(), ""));
        // Property parameters (";TZID=...") are not produced, but tolerate them.
        let name = name.split(';').next().unwrap_or(name);

        match (name, value) {
            ("BEGIN", "VEVENT") if current.is_none() => current = Some(PartialEvent::default()),
            ("END", "VEVENT") => {
                if let Some(partial) = current.take() {
                    events.push(partial.finish(line_no)?);
                }
            }
            ("END", "VCALENDAR") if current.is_none() => {
                closed = true;
                break;
            }
            _ => {
                if let Some(ev) = current.as_mut() {
                    match name {
                        "UID" => ev.uid = Some(value.to_string()),
                        "SUMMARY" => ev.summary = Some(unescape_text(value)),
                        "DTSTART" => ev.start = Some(parse_local(value, line_no)?),
                        "DTEND" => ev.end = Some(parse_local(value, line_no)?),
                        _ => {}
                    }
                }
            }
        }
    }

    if current.is_some() {
        return Err(ExportParseError::Unterminated("VEVENT"));
    }
    if !closed {
        return Err(ExportParseError::Unterminated("VCALENDAR"));
    }
    Ok(events)
}

/// File name for the export of `start..=end`.
pub fn export_file_name(start: NaiveDate, end: NaiveDate) -> String {
    format!("FlowPlan-{start}_to_{end}.ics")
}

/// RFC 5545 TEXT escaping, with line breaks collapsed to spaces.
pub fn escape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\\' => out.push_str("\\\\"),
            ';' => out.push_str("\\;"),
            ',' => out.push_str("\\,"),
            '\r' => {
                if chars.peek() != Some(&'\n') {
                    out.push(' ');
                }
            }
            '\n' => out.push(' '),
            other => out.push(other),
        }
    }
    out
}

fn unescape_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n' | 'N') => out.push('\n'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

fn event_start(event: &Event) -> NaiveDateTime {
    event.date.and_time(NaiveTime::MIN) + TimeDelta::hours(i64::from(event.start_hour))
}

fn parse_local(value: &str, line: usize) -> Result<NaiveDateTime, ExportParseError> {
    NaiveDateTime::parse_from_str(value.trim_end_matches('Z'), LOCAL_FORMAT).map_err(|_| {
        ExportParseError::InvalidDateTime {
            value: value.to_string(),
            line,
        }
    })
}

/// Join folded continuation lines, keeping 1-based line numbers.
fn unfold(document: &str) -> Vec<(usize, String)> {
    let mut out: Vec<(usize, String)> = Vec::new();
    for (i, raw) in document.lines().enumerate() {
        let raw = raw.trim_end_matches('\r');
        match (raw.strip_prefix([' ', '\t']), out.last_mut()) {
            (Some(rest), Some((_, prev))) => prev.push_str(rest),
            _ => out.push((i + 1, raw.to_string())),
        }
    }
    out
}

#[derive(Default)]
struct PartialEvent {
    uid: Option<String>,
    start: Option<NaiveDateTime>,
    end: Option<NaiveDateTime>,
    summary: Option<String>,
}

impl PartialEvent {
    fn finish(self, line: usize) -> Result<ExportedEvent, ExportParseError> {
        let missing = |field| ExportParseError::MissingField { field, line };
        Ok(ExportedEvent {
            uid: self.uid.ok_or_else(|| missing("UID"))?,
            start: self.start.ok_or_else(|| missing("DTSTART"))?,
            end: self.end.ok_or_else(|| missing("DTEND"))?,
            summary: self.summary.unwrap_or_default(),
        })
    }
}
