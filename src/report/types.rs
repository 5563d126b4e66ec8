//! Health report types as published by monitored targets.
//!
//! Targets publish JSON shaped like:
//! ```text
//! {
//!   "status": "Healthy" | 2,
//!   "totalDuration": "00:00:00.0123456",
//!   "entries": { "<check>": { "status", "description", "duration", "tags", "exception", "data" } }
//! }
//! ```
//! Status fields are accepted as names or as their numeric encoding.

use serde::de::{self, Deserializer, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::fmt;
use std::time::Duration;

/// Name of the entry synthesized when a report could not be fetched.
pub const FAILURE_ENTRY_NAME: &str = "__failure__";

/// Health of a target or of one of its checks, ordered worst to best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum HealthStatus {
    Unhealthy = 0,
    Degraded = 1,
    Healthy = 2,
}

impl HealthStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            HealthStatus::Unhealthy => "Unhealthy",
            HealthStatus::Degraded => "Degraded",
            HealthStatus::Healthy => "Healthy",
        }
    }

    pub fn is_healthy(&self) -> bool {
        *self == HealthStatus::Healthy
    }

    fn from_code(code: i64) -> Option<Self> {
        match code {
            0 => Some(HealthStatus::Unhealthy),
            1 => Some(HealthStatus::Degraded),
            2 => Some(HealthStatus::Healthy),
            _ => None,
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        if name.eq_ignore_ascii_case("healthy") {
            Some(HealthStatus::Healthy)
        } else if name.eq_ignore_ascii_case("degraded") {
            Some(HealthStatus::Degraded)
        } else if name.eq_ignore_ascii_case("unhealthy") {
            Some(HealthStatus::Unhealthy)
        } else {
            name.trim().parse::<i64>().ok().and_then(Self::from_code)
        }
    }
}

impl fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for HealthStatus {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for HealthStatus {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct StatusVisitor;

        impl<'de> Visitor<'de> for StatusVisitor {
            type Value = HealthStatus;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a health status name or its numeric value")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<HealthStatus, E> {
                HealthStatus::from_name(v)
                    .ok_or_else(|| E::invalid_value(de::Unexpected::Str(v), &self))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<HealthStatus, E> {
                HealthStatus::from_code(v)
                    .ok_or_else(|| E::invalid_value(de::Unexpected::Signed(v), &self))
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<HealthStatus, E> {
                i64::try_from(v)
                    .ok()
                    .and_then(HealthStatus::from_code)
                    .ok_or_else(|| E::invalid_value(de::Unexpected::Unsigned(v), &self))
            }
        }

        deserializer.deserialize_any(StatusVisitor)
    }
}

/// One named check inside a report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportEntry {
    #[serde(alias = "Status")]
    pub status: HealthStatus,
    #[serde(default, alias = "Description")]
    pub description: Option<String>,
    #[serde(default, alias = "Duration", with = "timespan")]
    pub duration: Duration,
    #[serde(default, alias = "Tags", deserialize_with = "null_as_default")]
    pub tags: Vec<String>,
    #[serde(default, alias = "Exception")]
    pub exception: Option<String>,
    #[serde(default, alias = "Data", deserialize_with = "null_as_default")]
    pub data: BTreeMap<String, serde_json::Value>,
}

impl ReportEntry {
    pub fn new(status: HealthStatus) -> Self {
        Self {
            status,
            description: None,
            duration: Duration::ZERO,
            tags: Vec::new(),
            exception: None,
            data: BTreeMap::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A normalized report: either what the target published, or a synthesized
/// failure describing why it could not be obtained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    #[serde(alias = "Status")]
    pub status: HealthStatus,
    #[serde(default, alias = "TotalDuration", with = "timespan")]
    pub total_duration: Duration,
    #[serde(default, alias = "Entries", deserialize_with = "null_as_default")]
    pub entries: BTreeMap<String, ReportEntry>,
}

impl HealthReport {
    pub fn new(status: HealthStatus) -> Self {
        Self {
            status,
            total_duration: Duration::ZERO,
            entries: BTreeMap::new(),
        }
    }

    pub fn with_entry(mut self, name: impl Into<String>, entry: ReportEntry) -> Self {
        self.entries.insert(name.into(), entry);
        self
    }

    /// Unhealthy report carrying a single synthesized failure entry.
    pub fn from_failure(description: impl Into<String>) -> Self {
        let description = description.into();
        let mut entry = ReportEntry::new(HealthStatus::Unhealthy);
        entry.exception = Some(description.clone());
        entry.description = Some(description);
        Self::new(HealthStatus::Unhealthy).with_entry(FAILURE_ENTRY_NAME, entry)
    }

    /// True if this report was synthesized by [`HealthReport::from_failure`].
    pub fn is_fetch_failure(&self) -> bool {
        self.entries.len() == 1 && self.entries.contains_key(FAILURE_ENTRY_NAME)
    }

    /// Names and descriptions of the entries that are not healthy.
    pub fn failing_entries(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.entries
            .iter()
            .filter(|(_, e)| !e.status.is_healthy())
            .map(|(name, e)| (name.as_str(), e.description.as_deref()))
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Serde adapter for .NET TimeSpan text (`[d.]hh:mm:ss[.fffffff]`).
/// Plain numbers are read as seconds, null as zero.
pub mod timespan {
    use super::*;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format(*value))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Seconds(f64),
        }

        match Option::<Raw>::deserialize(deserializer)? {
            None => Ok(Duration::ZERO),
            Some(Raw::Seconds(secs)) => Duration::try_from_secs_f64(secs).map_err(de::Error::custom),
            Some(Raw::Text(text)) => parse(&text)
                .ok_or_else(|| de::Error::custom(format!("invalid duration '{text}'"))),
        }
    }

    pub fn parse(text: &str) -> Option<Duration> {
        let text = text.trim();
        let mut parts = text.split(':');
        let (head, minutes, seconds) = (parts.next()?, parts.next()?, parts.next()?);
        if parts.next().is_some() {
            return None;
        }

        let (days, hours) = match head.split_once('.') {
            Some((d, h)) => (d.parse::<u64>().ok()?, h.parse::<u64>().ok()?),
            None => (0, head.parse::<u64>().ok()?),
        };
        let minutes = minutes.parse::<u64>().ok()?;
        let (whole, fraction) = match seconds.split_once('.') {
            Some((s, f)) => (s.parse::<u64>().ok()?, f),
            None => (seconds.parse::<u64>().ok()?, ""),
        };
        if hours > 23 || minutes > 59 || whole > 59 || !fraction.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }

        let nanos = fraction
            .chars()
            .chain(std::iter::repeat('0'))
            .take(9)
            .collect::<String>()
            .parse::<u32>()
            .ok()?;
        let secs = days
            .checked_mul(86_400)?
            .checked_add(hours * 3600 + minutes * 60 + whole)?;
        Some(Duration::new(secs, nanos))
    }

    pub fn format(value: Duration) -> String {
        let total = value.as_secs();
        let (days, rem) = (total / 86_400, total % 86_400);
        let (hours, minutes, seconds) = (rem / 3600, (rem % 3600) / 60, rem % 60);
        let ticks = value.subsec_nanos() / 100;

        let mut out = String::new();
        if days > 0 {
            out.push_str(&format!("{days}."));
        }
        out.push_str(&format!("{hours:02}:{minutes:02}:{seconds:02}"));
        if ticks > 0 {
            out.push_str(&format!(".{ticks:07}"));
        }
        out
    }
}
