//! Validation and classification of clock-in / clock-out attempts.
//!
//! Everything here is pure; the attendance service supplies the current
//! state of the employee's records and the local time.

use chrono::{NaiveDateTime, NaiveTime};
use serde::Deserialize;

use crate::error::AppError;
use crate::model::attendance::{ApprovalStatus, LATE_APPROVAL_MESSAGE};

/// Latitude or longitude as sent by a client: a JSON number or a string.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum Coordinate {
    Number(f64),
    Text(String),
}

impl Coordinate {
    fn is_blank(&self) -> bool {
        matches!(self, Coordinate::Text(s) if s.trim().is_empty())
    }

    fn value(&self) -> Option<f64> {
        match self {
            Coordinate::Number(n) => Some(*n),
            Coordinate::Text(s) => s.trim().parse::<f64>().ok(),
        }
        .filter(|v| v.is_finite())
    }
}

/// Time-of-day cutoffs for lateness and early departure.
#[derive(Debug, Clone, Copy)]
pub struct ClockRules {
    pub late_cutoff: NaiveTime,
    pub early_cutoff: NaiveTime,
}

impl Default for ClockRules {
    fn default() -> Self {
        Self {
            late_cutoff: NaiveTime::from_hms_opt(9, 40, 0).unwrap_or(NaiveTime::MIN),
            early_cutoff: NaiveTime::from_hms_opt(18, 30, 0).unwrap_or(NaiveTime::MIN),
        }
    }
}

impl ClockRules {
    /// Strictly after the late cutoff.
    pub fn is_late(&self, at: NaiveDateTime) -> bool {
        at.time() > self.late_cutoff
    }

    /// Strictly before the early cutoff.
    pub fn is_early(&self, at: NaiveDateTime) -> bool {
        at.time() < self.early_cutoff
    }
}

/// How a clock-in is recorded once it has passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ClockInOutcome {
    pub is_late: bool,
    pub approval_status: ApprovalStatus,
    pub approval_message: Option<String>,
    pub late_reason: Option<String>,
}

/// Checks, in order: both coordinates present, both numeric, both in range.
pub fn validate_coordinates(
    latitude: Option<&Coordinate>,
    longitude: Option<&Coordinate>,
) -> Result<(f64, f64), AppError> {
    let (lat, lng) = match (latitude, longitude) {
        (Some(lat), Some(lng)) if !lat.is_blank() && !lng.is_blank() => (lat, lng),
        _ => return Err(AppError::validation("Latitude and longitude are required")),
    };

    let (lat, lng) = match (lat.value(), lng.value()) {
        (Some(lat), Some(lng)) => (lat, lng),
        _ => {
            return Err(AppError::validation(
                "Latitude and longitude must be numeric",
            ));
        }
    };

    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
        return Err(AppError::validation(
            "Latitude must be between -90 and 90 and longitude between -180 and 180",
        ));
    }

    Ok((lat, lng))
}

pub fn require_evidence(evidence: Option<&str>) -> Result<&str, AppError> {
    evidence
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AppError::validation("Photo is required"))
}

fn non_blank(text: Option<&str>) -> Option<String> {
    text.map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// Late clock-ins need a reason and wait for an administrator; on-time
/// ones are approved immediately and any reason is ignored.
pub fn classify_clock_in(
    rules: &ClockRules,
    at: NaiveDateTime,
    late_reason: Option<&str>,
) -> Result<ClockInOutcome, AppError> {
    if !rules.is_late(at) {
        return Ok(ClockInOutcome {
            is_late: false,
            approval_status: ApprovalStatus::Approved,
            approval_message: None,
            late_reason: None,
        });
    }

    let reason = non_blank(late_reason).ok_or_else(|| {
        AppError::validation(format!(
            "You are late (after {}). Please provide a reason for late clock-in",
            rules.late_cutoff.format("%H:%M")
        ))
    })?;

    Ok(ClockInOutcome {
        is_late: true,
        approval_status: ApprovalStatus::Pending,
        approval_message: Some(LATE_APPROVAL_MESSAGE.to_string()),
        late_reason: Some(reason),
    })
}

/// Early flag and the reason to store with it. Whether a missing reason
/// is acceptable is the caller's decision.
pub fn classify_clock_out(
    rules: &ClockRules,
    at: NaiveDateTime,
    early_reason: Option<&str>,
) -> (bool, Option<String>) {
    let early = rules.is_early(at);
    (early, if early { non_blank(early_reason) } else { None })
}
