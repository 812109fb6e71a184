use crate::auth::auth::AuthUser;
use crate::error::AppError;
use crate::model::leave_request::{LeaveDuration, LeaveRequest, LeaveStatus, LeaveType};
use crate::service::leave::{self as svc, LeaveSubmission};
use crate::store::{LeaveQuery, LeaveStore, MySqlStore};
use actix_web::{HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use utoipa::{IntoParams, ToSchema};

#[derive(Deserialize, ToSchema)]
pub struct CreateLeave {
    #[schema(example = "sick")]
    pub leave_type: Option<LeaveType>, // enum ensures Swagger dropdown
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub start_date: chrono::NaiveDate,
    #[schema(example = "2026-01-01", format = "date", value_type = String)]
    pub end_date: chrono::NaiveDate,
    #[schema(example = "full_day")]
    pub duration: Option<LeaveDuration>,
    #[schema(example = "Fever")]
    pub reason: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct LeaveListResponse {
    pub data: Vec<LeaveRequest>,
    #[schema(example = 1)]
    pub page: u64,
    #[schema(example = 10)]
    pub per_page: u64,
    #[schema(example = 1)]
    pub total: i64,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct LeaveFilter {
    #[schema(example = 123)]
    /// Filter by employee ID (administrators only)
    pub employee_id: Option<u64>,
    #[schema(example = "pending")]
    /// Filter by leave status
    pub status: Option<LeaveStatus>,
    #[schema(example = 1)]
    /// Pagination page number (start with 1)
    pub page: Option<u64>, // 1-based
    #[schema(example = 3)]
    /// Pagination per page number
    pub per_page: Option<u64>, // items per page
}

/* =========================
Create leave request
========================= */
/// Swagger doc for create_leave endpoint
#[utoipa::path(
    post,
    path = "/api/leave",
    request_body(
        content = CreateLeave,
        description = "Leave request payload",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Leave request submitted successfully", body = LeaveRequest),
        (status = 400, description = "Bad request", body = Object, example = json!({
            "message": "start_date cannot be after end_date"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
#[instrument(name = "create_leave", skip_all, fields(user_id = auth.user_id))]
pub async fn create_leave(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    payload: web::Json<CreateLeave>,
) -> Result<impl Responder, AppError> {
    let employee_id = auth.require_employee()?;
    let payload = payload.into_inner();

    let leave = svc::submit_leave_request(
        store.get_ref(),
        LeaveSubmission {
            employee_id,
            leave_type: payload.leave_type,
            start_date: payload.start_date,
            end_date: payload.end_date,
            duration: payload.duration,
            reason: payload.reason,
        },
    )
    .await?;

    Ok(HttpResponse::Ok().json(leave))
}

async fn transition(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    leave_id: u64,
    new: LeaveStatus,
) -> Result<HttpResponse, AppError> {
    let actor = auth.leave_actor()?;
    let leave = svc::transition_leave(store.get_ref(), leave_id, actor, auth.employee_id, new).await?;

    Ok(HttpResponse::Ok().json(leave))
}

/* =========================
Approve leave (HR/Admin)
========================= */
/// Swagger doc for approve_leave endpoint
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/approve",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to approve")
    ),
    responses(
        (status = 200, description = "Leave approved successfully", body = LeaveRequest),
        (status = 403, description = "Transition not allowed", body = Object, example = json!({
            "message": "employee cannot change a pending leave request to approved"
        })),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Leave request changed concurrently")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn approve_leave(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    path: web::Path<u64>,
) -> Result<impl Responder, AppError> {
    transition(auth, store, path.into_inner(), LeaveStatus::Approved).await
}

/* =========================
Reject leave (HR/Admin)
========================= */
/// Swagger doc for reject_leave endpoint
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/reject",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to reject")
    ),
    responses(
        (status = 200, description = "Leave rejected successfully", body = LeaveRequest),
        (status = 403, description = "Transition not allowed"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Leave request changed concurrently")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn reject_leave(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    path: web::Path<u64>,
) -> Result<impl Responder, AppError> {
    transition(auth, store, path.into_inner(), LeaveStatus::Rejected).await
}

/* =========================
Cancel leave (owner while pending, HR/Admin any time)
========================= */
#[utoipa::path(
    put,
    path = "/api/leave/{leave_id}/cancel",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to cancel")
    ),
    responses(
        (status = 200, description = "Leave cancelled", body = LeaveRequest),
        (status = 403, description = "Transition not allowed", body = Object, example = json!({
            "message": "employee cannot change a approved leave request to cancelled"
        })),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Leave request changed concurrently")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn cancel_leave(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    path: web::Path<u64>,
) -> Result<impl Responder, AppError> {
    transition(auth, store, path.into_inner(), LeaveStatus::Cancelled).await
}

/// for getting a leave application details endpoint
#[utoipa::path(
    get,
    path = "/api/leave/{leave_id}",
    params(
        ("leave_id" = u64, Path, description = "ID of the leave request to fetch")
    ),
    responses(
        (status = 200, description = "Leave request found", body = LeaveRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Leave request not found", body = Object, example = json!({
            "message": "Leave request not found"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    path: web::Path<u64>,
) -> Result<impl Responder, AppError> {
    let leave_id = path.into_inner();

    let leave = LeaveStore::find_by_id(store.get_ref(), leave_id)
        .await?
        .filter(|l| auth.can_view_employee(l.employee_id))
        .ok_or_else(|| AppError::NotFound("Leave request not found".into()))?;

    Ok(HttpResponse::Ok().json(leave))
}

/// 1-based page, page size capped at 100, and the row offset.
fn page_window(page: Option<u64>, per_page: Option<u64>) -> (u64, u64, u64) {
    let per_page = per_page.unwrap_or(10).clamp(1, 100);
    let page = page.unwrap_or(1).max(1);
    (page, per_page, (page - 1).saturating_mul(per_page))
}

/// for getting leave applications endpoint
#[utoipa::path(
    get,
    path = "/api/leave",
    params(LeaveFilter),
    responses(
        (status = 200, description = "Paginated leave list", body = LeaveListResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn leave_list(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    query: web::Query<LeaveFilter>,
) -> Result<impl Responder, AppError> {
    let (page, per_page, offset) = page_window(query.page, query.per_page);

    let employee_id = if auth.role.is_administrator() {
        query.employee_id
    } else {
        Some(auth.require_employee()?)
    };

    let (leaves, total) = LeaveStore::list(
        store.get_ref(),
        &LeaveQuery {
            employee_id,
            status: query.status,
            limit: per_page,
            offset,
        },
    )
    .await?;

    Ok(HttpResponse::Ok().json(LeaveListResponse {
        data: leaves,
        page,
        per_page,
        total,
    }))
}
