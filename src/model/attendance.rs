use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

/// Evidence reference stored on records closed by the nightly job.
pub const SYSTEM_CHECKOUT_EVIDENCE: &str = "system://auto-checkout";

pub const LATE_APPROVAL_MESSAGE: &str = "You are late, contact admin for approval";
pub const SYSTEM_CHECKOUT_MESSAGE: &str = "Automatically clocked out by system";

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ApprovalStatus {
    Pending,
    Approved,
}

/// Coordinates plus the place name resolved for them at capture time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GeoPoint {
    #[schema(example = 23.8103)]
    pub latitude: f64,
    #[schema(example = 90.4125)]
    pub longitude: f64,
    #[schema(example = "Gulshan Avenue, Dhaka")]
    pub place: String,
}

impl GeoPoint {
    /// Place name used when no resolver answer is available.
    pub fn coordinate_label(latitude: f64, longitude: f64) -> String {
        format!("{:.6}, {:.6}", latitude, longitude)
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AttendanceRecord {
    pub id: u64,
    pub employee_id: u64,
    #[schema(value_type = String, format = "date")]
    pub work_date: NaiveDate,

    #[schema(value_type = String, format = "date-time")]
    pub clock_in: NaiveDateTime,
    pub clock_in_location: GeoPoint,
    pub clock_in_evidence: String,

    #[schema(value_type = Option<String>, format = "date-time")]
    pub clock_out: Option<NaiveDateTime>,
    pub clock_out_location: Option<GeoPoint>,
    pub clock_out_evidence: Option<String>,

    pub is_late: bool,
    pub early_clock_out: bool,
    pub is_system_checkout: bool,

    pub is_approved: bool,
    pub approval_status: ApprovalStatus,
    pub approval_message: Option<String>,
    pub approved_by: Option<u64>,
    pub late_clock_in_reason: Option<String>,
    pub early_clock_out_reason: Option<String>,
}

impl AttendanceRecord {
    pub fn is_open(&self) -> bool {
        self.clock_out.is_none()
    }

    pub fn is_pending(&self) -> bool {
        self.approval_status == ApprovalStatus::Pending
    }
}

/// Insert payload produced by a validated clock-in.
#[derive(Debug, Clone)]
pub struct NewAttendance {
    pub employee_id: u64,
    pub clock_in: NaiveDateTime,
    pub location: GeoPoint,
    pub evidence: String,
    pub is_late: bool,
    pub approval_status: ApprovalStatus,
    pub approval_message: Option<String>,
    pub late_clock_in_reason: Option<String>,
}

/// Fields written when a session is closed, by the employee or the system.
#[derive(Debug, Clone)]
pub struct ClockOutUpdate {
    pub clock_out: NaiveDateTime,
    pub location: GeoPoint,
    pub evidence: String,
    pub early_clock_out: bool,
    pub early_clock_out_reason: Option<String>,
    pub is_system_checkout: bool,
    /// When set, approval is forced to Approved with this message.
    pub force_approval: Option<String>,
}
