//! Refresh history records and refresh requests

use std::fmt;

use chrono::{DateTime, NaiveDateTime, TimeDelta};
use serde::{Deserialize, Serialize, Serializer};
use tracing::warn;

use crate::error::PbiError;

/// Timestamp layouts seen in refresh history, tried in order
const TIMESTAMP_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%SZ", "%Y-%m-%dT%H:%M:%S%.fZ"];

/// Normalized summary of one dataset refresh
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRecord {
    /// `Completed`, `Failed`, `Disabled` or `Unknown` (still running)
    pub status: String,
    /// `Scheduled`, `OnDemand`, `ViaApi`, ...
    pub refresh_type: String,
    pub start_time: NaiveDateTime,
    /// `None` while the refresh is still running
    #[serde(serialize_with = "serialize_duration")]
    pub duration: Option<TimeDelta>,
    pub end_time: Option<NaiveDateTime>,
}

impl RefreshRecord {
    pub fn is_in_progress(&self) -> bool {
        self.end_time.is_none()
    }
}

impl fmt::Display for RefreshRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.duration, self.end_time) {
            (Some(duration), Some(end)) => write!(
                f,
                "{} ({}) took {}, ended {}",
                self.status,
                self.refresh_type,
                format_duration(duration),
                format_timestamp(&end)
            ),
            _ => write!(
                f,
                "{} ({}) started {}, still running",
                self.status,
                self.refresh_type,
                format_timestamp(&self.start_time)
            ),
        }
    }
}

fn serialize_duration<S: Serializer>(value: &Option<TimeDelta>, s: S) -> Result<S::Ok, S::Error> {
    match value {
        Some(duration) => s.serialize_str(&format_duration(*duration)),
        None => s.serialize_none(),
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRefresh {
    status: String,
    refresh_type: String,
    start_time: String,
    #[serde(default)]
    end_time: Option<String>,
}

#[derive(Deserialize)]
struct RefreshListing {
    value: Vec<RawRefresh>,
}

/// Parse a refresh timestamp.
///
/// Accepts `2023-03-02T04:42:02Z`, `2023-03-02T04:42:02.763Z` and RFC 3339
/// with an explicit offset (converted to UTC).
pub fn parse_timestamp(input: &str) -> Result<NaiveDateTime, PbiError> {
    TIMESTAMP_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(input, format).ok())
        .or_else(|| {
            DateTime::parse_from_rfc3339(input)
                .ok()
                .map(|dt| dt.naive_utc())
        })
        .ok_or_else(|| PbiError::Decode(format!("Unrecognized timestamp: {input}")))
}

/// Render a duration as `H:MM:SS` with microseconds when non-zero
/// (`0:02:06.726000`), prefixed by `N day(s), ` past 24 hours.
///
/// Days are floored, so negative durations keep a non-negative clock part:
/// minus five seconds is `-1 day, 23:59:55`.
pub fn format_duration(duration: TimeDelta) -> String {
    let mut total_secs = duration.num_seconds();
    let mut micros = i64::from(duration.subsec_nanos() / 1_000);
    if micros < 0 {
        total_secs -= 1;
        micros += 1_000_000;
    }

    let days = total_secs.div_euclid(86_400);
    let clock = total_secs.rem_euclid(86_400);
    let hours = clock / 3_600;
    let minutes = (clock % 3_600) / 60;
    let seconds = clock % 60;

    let mut out = String::new();
    if days != 0 {
        let plural = if days.abs() == 1 { "" } else { "s" };
        out.push_str(&format!("{days} day{plural}, "));
    }
    out.push_str(&format!("{hours}:{minutes:02}:{seconds:02}"));
    if micros > 0 {
        out.push_str(&format!(".{micros:06}"));
    }
    out
}

/// Render a timestamp as `2023-03-02 04:42:02.763000` (fraction only when non-zero)
pub fn format_timestamp(ts: &NaiveDateTime) -> String {
    if ts.and_utc().timestamp_subsec_micros() == 0 {
        ts.format("%Y-%m-%d %H:%M:%S").to_string()
    } else {
        ts.format("%Y-%m-%d %H:%M:%S%.6f").to_string()
    }
}

/// Parse a `GET .../refreshes` body into normalized records.
///
/// An empty `value` array means the dataset was never refreshed; a body
/// without one is a decode error.
pub fn parse_refresh_history(body: &str) -> Result<Vec<RefreshRecord>, PbiError> {
    let listing: RefreshListing = serde_json::from_str(body)
        .map_err(|e| PbiError::Decode(format!("Malformed refresh history: {e}")))?;

    listing.value.into_iter().map(normalize).collect()
}

fn normalize(raw: RawRefresh) -> Result<RefreshRecord, PbiError> {
    let start_time = parse_timestamp(&raw.start_time)?;
    let end_time = raw
        .end_time
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(parse_timestamp)
        .transpose()?;

    if end_time.is_none() {
        warn!(
            "Refresh started {} has no end time yet (status {})",
            raw.start_time, raw.status
        );
    }

    Ok(RefreshRecord {
        status: raw.status,
        refresh_type: raw.refresh_type,
        start_time,
        duration: end_time.map(|end| end - start_time),
        end_time,
    })
}

/// Body for a refresh scoped to a single table
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct TableRefreshRequest<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    objects: [RefreshObject<'a>; 1],
    apply_refresh_policy: &'static str,
}

#[derive(Debug, Serialize)]
struct RefreshObject<'a> {
    table: &'a str,
}

impl<'a> TableRefreshRequest<'a> {
    pub(crate) fn full(table: &'a str) -> Self {
        Self {
            kind: "full",
            objects: [RefreshObject { table }],
            apply_refresh_policy: "false",
        }
    }
}

/// A refresh request the service accepted (HTTP 202).
///
/// Acceptance is not completion; poll the refresh history for the outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshAccepted {
    pub request_id: Option<String>,
}

impl fmt::Display for RefreshAccepted {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "202 Accepted")
    }
}
