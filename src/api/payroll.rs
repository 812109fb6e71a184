use std::str::FromStr;

use actix_web::{HttpResponse, Responder, web};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::instrument;
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::error::AppError;
use crate::model::payroll::BillingPeriod;
use crate::service::payroll as svc;
use crate::store::MySqlStore;

#[derive(Debug, Deserialize, IntoParams, ToSchema)]
pub struct PayrollQuery {
    /// Billing month as YYYY-MM (default: current month)
    #[schema(example = "2026-04")]
    pub month: Option<String>,

    /// Monthly base salary
    #[schema(example = "30000")]
    pub monthly_salary: String,
}

/// Compute an employee's payroll for one month. Nothing is stored.
#[utoipa::path(
    get,
    path = "/api/payroll/{employee_id}",
    params(
        ("employee_id" = u64, Path, description = "Employee ID"),
        PayrollQuery
    ),
    responses(
        (status = 200, body = crate::model::payroll::PayrollSnapshot),
        (status = 400, description = "Invalid month or salary"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "No attendance data for the period", body = Object, example = json!({
            "message": "No attendance data for employee 1001 in 2026-04",
            "code": "no_attendance_data",
            "employee_id": 1001,
            "period": "2026-04"
        }))
    ),
    security(("bearer_auth" = [])),
    tag = "Payroll"
)]
#[instrument(name = "compute_payroll", skip(auth, store), fields(user_id = auth.user_id))]
pub async fn compute_payroll(
    auth: AuthUser,
    store: web::Data<MySqlStore>,
    path: web::Path<u64>,
    query: web::Query<PayrollQuery>,
) -> Result<impl Responder, AppError> {
    let employee_id = path.into_inner();
    if !auth.can_view_employee(employee_id) {
        return Err(AppError::Forbidden("HR/Admin only".into()));
    }

    let period = match query.month.as_deref() {
        Some(month) => BillingPeriod::from_str(month).map_err(AppError::Validation)?,
        None => BillingPeriod::current(),
    };

    let monthly_salary = Decimal::from_str(query.monthly_salary.trim())
        .map_err(|_| AppError::validation("monthly_salary must be a decimal number"))?;

    let snapshot = svc::compute_payroll(
        store.get_ref(),
        store.get_ref(),
        employee_id,
        monthly_salary,
        period,
    )
    .await?;

    Ok(HttpResponse::Ok().json(snapshot))
}
