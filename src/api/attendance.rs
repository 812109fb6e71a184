use crate::auth::auth::AuthUser;
use crate::config::Config;
use crate::error::AppError;
use crate::service::attendance::{self as svc, ClockContext, ClockIn, ClockOut};
use crate::service::clock::Coordinate;
use crate::service::reconciliation;
use crate::store::{AttendanceQuery, AttendanceStore, MySqlStore};
use crate::utils::evidence::EvidenceStore;
use crate::utils::location::LocationResolver;
use actix_web::{HttpResponse, Responder, web};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use tracing::instrument;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct ClockInRequest {
    #[schema(example = 23.7808, value_type = Option<f64>)]
    pub latitude: Option<Coordinate>,
    #[schema(example = 90.4152, value_type = Option<f64>)]
    pub longitude: Option<Coordinate>,
    /// Reference of the already uploaded photo
    #[schema(example = "2026/10/1000-in.jpg")]
    pub photo: Option<String>,
    /// Required when clocking in after the late cutoff
    #[schema(example = "Stuck in traffic")]
    pub late_reason: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct ClockOutRequest {
    #[schema(example = 23.7808, value_type = Option<f64>)]
    pub latitude: Option<Coordinate>,
    #[schema(example = 90.4152, value_type = Option<f64>)]
    pub longitude: Option<Coordinate>,
    #[schema(example = "2026/10/1000-out.jpg")]
    pub photo: Option<String>,
    /// Required when clocking out before the early cutoff
    #[schema(example = "Doctor appointment")]
    pub early_reason: Option<String>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct AttendanceFilter {
    /// Filter by employee ID (administrators only)
    #[schema(example = 1000)]
    pub employee_id: Option<u64>,
    #[schema(example = "2026-10-01", value_type = Option<String>, format = "date")]
    pub from: Option<NaiveDate>,
    #[schema(example = "2026-10-31", value_type = Option<String>, format = "date")]
    pub to: Option<NaiveDate>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct ReconcileQuery {
    /// Records opened before this date are closed (default: today)
    #[schema(example = "2026-10-18", value_type = Option<String>, format = "date")]
    pub as_of: Option<NaiveDate>,
}

/// Clock-in endpoint
#[utoipa::path(
    post,
    path = "/api/attendance",
    request_body = ClockInRequest,
    responses(
        (status = 200, description = "Clocked in; pending approval when late", body = crate::model::attendance::AttendanceRecord),
        (status = 400, description = "Validation failed", body = Object, example = json!({
            "message": "Already clocked in today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 502, description = "Evidence store unavailable")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
#[instrument(name = "clock_in", skip_all, fields(user_id = auth.user_id))]
pub async fn clock_in(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    config: web::Data<Config>,
    evidence: web::Data<dyn EvidenceStore>,
    resolver: web::Data<dyn LocationResolver>,
    payload: web::Json<ClockInRequest>,
) -> Result<impl Responder, AppError> {
    let employee_id = auth.require_employee()?;
    let payload = payload.into_inner();
    let rules = config.clock_rules();
    let ctx = ClockContext {
        rules: &rules,
        evidence: evidence.get_ref(),
        resolver: resolver.get_ref(),
    };

    let record = svc::submit_clock_in(
        store.get_ref(),
        &ctx,
        ClockIn {
            employee_id,
            latitude: payload.latitude,
            longitude: payload.longitude,
            evidence: payload.photo,
            late_reason: payload.late_reason,
        },
        Local::now().naive_local(),
    )
    .await?;

    Ok(HttpResponse::Ok().json(record))
}

/// Clock-out endpoint
#[utoipa::path(
    put,
    path = "/api/attendance",
    request_body = ClockOutRequest,
    responses(
        (status = 200, description = "Clocked out successfully", body = crate::model::attendance::AttendanceRecord),
        (status = 400, description = "Not clocked in, awaiting approval, or invalid input", body = Object, example = json!({
            "message": "You are not clocked in"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
#[instrument(name = "clock_out", skip_all, fields(user_id = auth.user_id))]
pub async fn clock_out(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    config: web::Data<Config>,
    evidence: web::Data<dyn EvidenceStore>,
    resolver: web::Data<dyn LocationResolver>,
    payload: web::Json<ClockOutRequest>,
) -> Result<impl Responder, AppError> {
    let employee_id = auth.require_employee()?;
    let payload = payload.into_inner();
    let rules = config.clock_rules();
    let ctx = ClockContext {
        rules: &rules,
        evidence: evidence.get_ref(),
        resolver: resolver.get_ref(),
    };

    let record = svc::submit_clock_out(
        store.get_ref(),
        &ctx,
        ClockOut {
            employee_id,
            latitude: payload.latitude,
            longitude: payload.longitude,
            evidence: payload.photo,
            early_reason: payload.early_reason,
        },
        Local::now().naive_local(),
    )
    .await?;

    Ok(HttpResponse::Ok().json(record))
}

/// List attendance records. Employees only ever see their own.
#[utoipa::path(
    get,
    path = "/api/attendance",
    params(AttendanceFilter),
    responses(
        (status = 200, description = "Attendance records", body = Vec<crate::model::attendance::AttendanceRecord>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn list_attendance(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    query: web::Query<AttendanceFilter>,
) -> Result<impl Responder, AppError> {
    let employee_id = if auth.role.is_administrator() {
        query.employee_id
    } else {
        Some(auth.require_employee()?)
    };

    let records = AttendanceStore::list(
        store.get_ref(),
        &AttendanceQuery {
            employee_id,
            from: query.from,
            to: query.to,
            pending_only: false,
        },
    )
    .await?;

    Ok(HttpResponse::Ok().json(records))
}

/// Records waiting for an administrator's approval
#[utoipa::path(
    get,
    path = "/api/attendance/pending",
    responses(
        (status = 200, description = "Pending attendance records", body = Vec<crate::model::attendance::AttendanceRecord>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn pending_attendance(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
) -> Result<impl Responder, AppError> {
    auth.require_admin()?;

    let records = AttendanceStore::list(
        store.get_ref(),
        &AttendanceQuery {
            pending_only: true,
            ..Default::default()
        },
    )
    .await?;

    Ok(HttpResponse::Ok().json(records))
}

/// Approve a late clock-in (HR/Admin)
#[utoipa::path(
    put,
    path = "/api/attendance/{record_id}/approve",
    params(
        ("record_id" = u64, Path, description = "ID of the attendance record to approve")
    ),
    responses(
        (status = 200, description = "Record approved (or already approved)", body = crate::model::attendance::AttendanceRecord),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Attendance record not found", body = Object, example = json!({
            "message": "Attendance record not found"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
#[instrument(name = "approve_attendance", skip(auth, store), fields(approver = auth.user_id))]
pub async fn approve_attendance(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    path: web::Path<u64>,
) -> Result<impl Responder, AppError> {
    auth.require_admin()?;

    let record = svc::approve_attendance(store.get_ref(), path.into_inner(), auth.user_id).await?;

    Ok(HttpResponse::Ok().json(record))
}

/// Run the auto clock-out job on demand (HR/Admin or system account)
#[utoipa::path(
    post,
    path = "/api/attendance/reconcile",
    params(ReconcileQuery),
    responses(
        (status = 200, description = "Job report", body = crate::service::reconciliation::ReconciliationReport),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
#[instrument(name = "reconcile", skip_all, fields(user_id = auth.user_id))]
pub async fn reconcile(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    config: web::Data<Config>,
    resolver: web::Data<dyn LocationResolver>,
    query: web::Query<ReconcileQuery>,
) -> Result<impl Responder, AppError> {
    auth.require_admin_or_system()?;

    let as_of = query.as_of.unwrap_or_else(|| Local::now().date_naive());
    let report = reconciliation::run_reconciliation(
        store.get_ref(),
        resolver.get_ref(),
        as_of,
        config.geocoder_timeout(),
    )
    .await?;

    Ok(HttpResponse::Ok().json(report))
}
