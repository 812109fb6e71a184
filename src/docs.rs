use crate::api::attendance::{AttendanceFilter, ClockInRequest, ClockOutRequest, ReconcileQuery};
use crate::api::leave_request::{CreateLeave, LeaveFilter, LeaveListResponse};
use crate::api::payroll::PayrollQuery;
use crate::model::attendance::{ApprovalStatus, AttendanceRecord, GeoPoint};
use crate::model::leave_request::{Actor, LeaveDuration, LeaveRequest, LeaveStatus, LeaveType};
use crate::model::payroll::PayrollSnapshot;
use crate::service::reconciliation::{ReconciliationFailure, ReconciliationReport};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HRM Attendance API",
        version = "1.0.0",
        description = r#"
## Attendance, Leave and Payroll

### 🔹 Key Features
- **Attendance**
  - Clock in / clock out with location and photo evidence
  - Late clock-ins wait for HR/Admin approval
  - Nightly automatic clock-out of sessions left open
- **Leave Management**
  - Apply for leave, approve/reject/cancel requests, and view leave history
- **Payroll**
  - Monthly salary with deductions for approved and rejected leave

### 🔐 Security
Every endpoint is protected using **JWT Bearer authentication**.
Approvals are restricted to **Admin** or **HR**.
"#,
    ),
    paths(
        crate::api::attendance::clock_in,
        crate::api::attendance::clock_out,
        crate::api::attendance::list_attendance,
        crate::api::attendance::pending_attendance,
        crate::api::attendance::approve_attendance,
        crate::api::attendance::reconcile,

        crate::api::leave_request::leave_list,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::create_leave,
        crate::api::leave_request::approve_leave,
        crate::api::leave_request::reject_leave,
        crate::api::leave_request::cancel_leave,

        crate::api::payroll::compute_payroll
    ),
    components(
        schemas(
            ClockInRequest,
            ClockOutRequest,
            AttendanceFilter,
            ReconcileQuery,
            AttendanceRecord,
            ApprovalStatus,
            GeoPoint,
            ReconciliationReport,
            ReconciliationFailure,
            CreateLeave,
            LeaveFilter,
            LeaveListResponse,
            LeaveRequest,
            LeaveType,
            LeaveDuration,
            LeaveStatus,
            Actor,
            PayrollQuery,
            PayrollSnapshot
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Attendance", description = "Attendance management APIs"),
        (name = "Leave", description = "Leave management APIs"),
        (name = "Payroll", description = "Payroll computation APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
