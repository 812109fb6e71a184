use chrono::NaiveDate;
use rust_decimal::Decimal;
use tracing::info;

use crate::error::AppError;
use crate::model::leave_request::{
    Actor, LeaveDuration, LeaveRequest, LeaveStatus, LeaveType, NewLeaveRequest,
};
use crate::store::LeaveStore;

#[derive(Debug, Clone)]
pub struct LeaveSubmission {
    pub employee_id: u64,
    pub leave_type: Option<LeaveType>,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub duration: Option<LeaveDuration>,
    pub reason: Option<String>,
}

pub async fn submit_leave_request<S>(store: &S, sub: LeaveSubmission) -> Result<LeaveRequest, AppError>
where
    S: LeaveStore + ?Sized,
{
    let leave_type = sub
        .leave_type
        .ok_or_else(|| AppError::validation("Leave type is required"))?;

    let reason = sub
        .reason
        .as_deref()
        .map(str::trim)
        .filter(|r| !r.is_empty())
        .ok_or_else(|| AppError::validation("Reason is required"))?
        .to_string();

    if sub.start_date > sub.end_date {
        return Err(AppError::validation("start_date cannot be after end_date"));
    }

    let duration = sub
        .duration
        .ok_or_else(|| AppError::validation("Leave duration is required"))?;

    let leave = store
        .insert(NewLeaveRequest {
            employee_id: sub.employee_id,
            leave_type,
            start_date: sub.start_date,
            end_date: sub.end_date,
            duration,
            reason,
        })
        .await?;

    info!(
        leave_id = leave.id,
        employee_id = leave.employee_id,
        days = %request_days(&leave),
        "Leave request submitted"
    );
    Ok(leave)
}

/// Decides whether `actor` may move a request from `current` to `new`.
///
/// Employees may only cancel their own pending requests. Administrators
/// decide pending requests and may later cancel a decided one. A
/// cancelled request never moves again.
pub fn check_transition(
    actor: Actor,
    current: LeaveStatus,
    new: LeaveStatus,
) -> Result<(), AppError> {
    use LeaveStatus::*;

    if current == Cancelled {
        return Err(AppError::authorization("Leave request is already cancelled"));
    }

    let allowed = match actor {
        Actor::Employee => matches!((current, new), (Pending, Cancelled)),
        Actor::Administrator => matches!(
            (current, new),
            (Pending, Approved | Rejected | Cancelled) | (Approved | Rejected, Cancelled)
        ),
    };

    if allowed {
        Ok(())
    } else {
        Err(AppError::authorization(format!(
            "{} cannot change a {} leave request to {}",
            actor, current, new
        )))
    }
}

/// Applies a status change. `actor_employee_id` is the caller's employee
/// profile; employees may only touch their own requests.
pub async fn transition_leave<S>(
    store: &S,
    request_id: u64,
    actor: Actor,
    actor_employee_id: Option<u64>,
    new: LeaveStatus,
) -> Result<LeaveRequest, AppError>
where
    S: LeaveStore + ?Sized,
{
    let leave = store
        .find_by_id(request_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Leave request not found".into()))?;

    if actor == Actor::Employee && actor_employee_id != Some(leave.employee_id) {
        return Err(AppError::authorization(
            "Employees can only change their own leave requests",
        ));
    }

    check_transition(actor, leave.status, new)?;

    if !store
        .update_status(request_id, leave.status, new, actor)
        .await?
    {
        return Err(AppError::Conflict(
            "Leave request was modified concurrently, reload and retry".into(),
        ));
    }

    info!(leave_id = request_id, from = %leave.status, to = %new, actor = %actor, "Leave status changed");

    store
        .find_by_id(request_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Leave request not found".into()))
}

/// Chargeable days for a duration mode over `days` calendar days. Half-day
/// modes charge half a day for each calendar day in the range.
pub fn leave_days(duration: LeaveDuration, days: i64) -> Decimal {
    let days = Decimal::from(days.max(0));
    match duration {
        LeaveDuration::FullDay => days,
        LeaveDuration::FirstHalf | LeaveDuration::SecondHalf => days * Decimal::new(5, 1),
    }
}

/// Chargeable days of the whole request.
pub fn request_days(leave: &LeaveRequest) -> Decimal {
    leave_days(leave.duration, inclusive_days(leave.start_date, leave.end_date))
}

/// Chargeable days of the part of the request inside `[from, to]`.
pub fn request_days_within(leave: &LeaveRequest, from: NaiveDate, to: NaiveDate) -> Decimal {
    let start = leave.start_date.max(from);
    let end = leave.end_date.min(to);
    leave_days(leave.duration, inclusive_days(start, end))
}

fn inclusive_days(start: NaiveDate, end: NaiveDate) -> i64 {
    (end - start).num_days() + 1
}
