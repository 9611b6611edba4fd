use std::fmt;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

macro_rules! id_newtype {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }
    };
}

id_newtype!(ResourceId);
id_newtype!(ReservationId);
id_newtype!(CourseId);
id_newtype!(CourseGroupId);
id_newtype!(RoomId);
id_newtype!(CampaignId);
id_newtype!(LabId);

/// Wire format for clock times: `08:00`.
pub const CLOCK_FORMAT: &str = "%H:%M";
/// Wire format for calendar dates: `2025-03-10`.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses a `HH:MM` (or `HH:MM:SS`) clock value coming from a form field.
pub fn parse_clock(field: &'static str, raw: &str) -> Result<NaiveTime, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    NaiveTime::parse_from_str(raw, CLOCK_FORMAT)
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map_err(|_| ValidationError::InvalidTime {
            field,
            value: raw.to_string(),
        })
}

pub fn parse_date(field: &'static str, raw: &str) -> Result<NaiveDate, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    NaiveDate::parse_from_str(raw, DATE_FORMAT).map_err(|_| ValidationError::InvalidDate {
        field,
        value: raw.to_string(),
    })
}

/// A half-open `[start, end)` slot within one day. `start < end` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeRange {
    start: NaiveTime,
    end: NaiveTime,
}

impl TimeRange {
    pub fn new(start: NaiveTime, end: NaiveTime) -> Result<Self, ValidationError> {
        if start >= end {
            return Err(ValidationError::InvertedTimeRange {
                start: start.format(CLOCK_FORMAT).to_string(),
                end: end.format(CLOCK_FORMAT).to_string(),
            });
        }
        Ok(Self { start, end })
    }

    pub fn parse(start: &str, end: &str) -> Result<Self, ValidationError> {
        let start = parse_clock("start_time", start)?;
        let end = parse_clock("end_time", end)?;
        Self::new(start, end)
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    pub fn start_label(&self) -> String {
        self.start.format(CLOCK_FORMAT).to_string()
    }

    pub fn end_label(&self) -> String {
        self.end.format(CLOCK_FORMAT).to_string()
    }
}

impl fmt::Display for TimeRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.start_label(), self.end_label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DayOfWeek {
    #[serde(rename = "LUNES")]
    Monday,
    #[serde(rename = "MARTES")]
    Tuesday,
    #[serde(rename = "MIERCOLES")]
    Wednesday,
    #[serde(rename = "JUEVES")]
    Thursday,
    #[serde(rename = "VIERNES")]
    Friday,
    #[serde(rename = "SABADO")]
    Saturday,
}

impl DayOfWeek {
    pub fn wire_name(self) -> &'static str {
        match self {
            DayOfWeek::Monday => "LUNES",
            DayOfWeek::Tuesday => "MARTES",
            DayOfWeek::Wednesday => "MIERCOLES",
            DayOfWeek::Thursday => "JUEVES",
            DayOfWeek::Friday => "VIERNES",
            DayOfWeek::Saturday => "SABADO",
        }
    }

    pub fn parse(field: &'static str, raw: &str) -> Result<Self, ValidationError> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ValidationError::MissingField(field));
        }
        let day = match raw.to_ascii_uppercase().as_str() {
            "LUNES" | "MONDAY" | "MON" => DayOfWeek::Monday,
            "MARTES" | "TUESDAY" | "TUE" => DayOfWeek::Tuesday,
            "MIERCOLES" | "WEDNESDAY" | "WED" => DayOfWeek::Wednesday,
            "JUEVES" | "THURSDAY" | "THU" => DayOfWeek::Thursday,
            "VIERNES" | "FRIDAY" | "FRI" => DayOfWeek::Friday,
            "SABADO" | "SATURDAY" | "SAT" => DayOfWeek::Saturday,
            _ => {
                return Err(ValidationError::InvalidDay(raw.to_string()));
            }
        };
        Ok(day)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleAction {
    Approve,
    Reject,
    Cancel,
}

impl LifecycleAction {
    pub fn name(self) -> &'static str {
        match self {
            LifecycleAction::Approve => "approve",
            LifecycleAction::Reject => "reject",
            LifecycleAction::Cancel => "cancel",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl ReservationStatus {
    /// Status the backend moves to when `action` succeeds, or `None` when the
    /// transition is not offered from this status.
    pub fn after(self, action: LifecycleAction) -> Option<ReservationStatus> {
        match (self, action) {
            (ReservationStatus::Pending, LifecycleAction::Approve) => {
                Some(ReservationStatus::Approved)
            }
            (ReservationStatus::Pending, LifecycleAction::Reject) => {
                Some(ReservationStatus::Rejected)
            }
            (ReservationStatus::Pending | ReservationStatus::Approved, LifecycleAction::Cancel) => {
                Some(ReservationStatus::Cancelled)
            }
            _ => None,
        }
    }

    pub fn allows(self, action: LifecycleAction) -> bool {
        self.after(action).is_some()
    }
}

/// A bookable room returned by an availability search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CandidateResource {
    pub id: ResourceId,
    pub code: String,
    pub name: String,
    #[serde(default, rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub location: String,
    pub capacity: u32,
}

/// A fully validated reservation request. Built once, never mutated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservationRequest {
    date: NaiveDate,
    window: TimeRange,
    resource_id: ResourceId,
    purpose: String,
}

impl ReservationRequest {
    pub fn new(
        date: NaiveDate,
        window: TimeRange,
        resource_id: ResourceId,
        purpose: &str,
    ) -> Result<Self, ValidationError> {
        if resource_id.as_str().trim().is_empty() {
            return Err(ValidationError::NoSelection);
        }
        let purpose = purpose.trim();
        if purpose.is_empty() {
            return Err(ValidationError::EmptyPurpose);
        }
        Ok(Self {
            date,
            window,
            resource_id,
            purpose: purpose.to_string(),
        })
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn window(&self) -> TimeRange {
        self.window
    }

    pub fn resource_id(&self) -> &ResourceId {
        &self.resource_id
    }

    pub fn purpose(&self) -> &str {
        &self.purpose
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationSummary {
    pub reservation_id: ReservationId,
    pub classroom_code: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub purpose: String,
    pub status: ReservationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScheduleEntry {
    pub day: DayOfWeek,
    pub room_id: RoomId,
    pub window: TimeRange,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CampaignPhase {
    NotStarted,
    Open,
    Closed,
    Processed,
    #[serde(other)]
    Unknown,
}
