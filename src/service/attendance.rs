use chrono::NaiveDateTime;
use tracing::{debug, info};

use super::clock::{self, ClockRules, Coordinate};
use crate::error::{AppError, StoreError};
use crate::model::attendance::{AttendanceRecord, ClockOutUpdate, NewAttendance};
use crate::store::AttendanceStore;
use crate::utils::evidence::EvidenceStore;
use crate::utils::location::{LocationResolver, resolve_or_label};

/// Collaborators a clock event needs besides the store.
pub struct ClockContext<'a> {
    pub rules: &'a ClockRules,
    pub evidence: &'a dyn EvidenceStore,
    pub resolver: &'a dyn LocationResolver,
}

#[derive(Debug, Clone)]
pub struct ClockIn {
    pub employee_id: u64,
    pub latitude: Option<Coordinate>,
    pub longitude: Option<Coordinate>,
    pub evidence: Option<String>,
    pub late_reason: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ClockOut {
    pub employee_id: u64,
    pub latitude: Option<Coordinate>,
    pub longitude: Option<Coordinate>,
    pub evidence: Option<String>,
    pub early_reason: Option<String>,
}

pub async fn submit_clock_in<S>(
    store: &S,
    ctx: &ClockContext<'_>,
    req: ClockIn,
    now: NaiveDateTime,
) -> Result<AttendanceRecord, AppError>
where
    S: AttendanceStore + ?Sized,
{
    let (latitude, longitude) =
        clock::validate_coordinates(req.latitude.as_ref(), req.longitude.as_ref())?;

    if let Some(open) = store.find_open(req.employee_id).await? {
        if open.is_pending() {
            return Err(AppError::validation(
                "Your previous clock-in is awaiting admin approval. Contact admin before clocking in again",
            ));
        }
        if open.work_date < now.date() {
            return Err(AppError::validation(
                "Your previous session is still open. Clock out before clocking in again",
            ));
        }
    }

    if store
        .find_on_date(req.employee_id, now.date())
        .await?
        .is_some()
    {
        return Err(AppError::validation("Already clocked in today"));
    }

    let evidence = clock::require_evidence(req.evidence.as_deref())?;
    let outcome = clock::classify_clock_in(ctx.rules, now, req.late_reason.as_deref())?;

    ctx.evidence.ensure_exists(evidence).await?;
    let location = resolve_or_label(ctx.resolver, latitude, longitude).await;

    let new = NewAttendance {
        employee_id: req.employee_id,
        clock_in: now,
        location,
        evidence: evidence.to_string(),
        is_late: outcome.is_late,
        approval_status: outcome.approval_status,
        approval_message: outcome.approval_message,
        late_clock_in_reason: outcome.late_reason,
    };

    // The unique keys settle concurrent attempts that passed the checks above.
    let record = match store.insert(new).await {
        Ok(record) => record,
        Err(StoreError::UniqueViolation(key)) => {
            debug!(employee_id = req.employee_id, key = %key, "Concurrent clock-in lost");
            return Err(AppError::validation("Already clocked in today"));
        }
        Err(e) => return Err(e.into()),
    };

    info!(
        employee_id = record.employee_id,
        record_id = record.id,
        late = record.is_late,
        "Clocked in"
    );
    Ok(record)
}

pub async fn submit_clock_out<S>(
    store: &S,
    ctx: &ClockContext<'_>,
    req: ClockOut,
    now: NaiveDateTime,
) -> Result<AttendanceRecord, AppError>
where
    S: AttendanceStore + ?Sized,
{
    let open = store
        .find_open(req.employee_id)
        .await?
        .ok_or_else(|| AppError::validation("You are not clocked in"))?;

    if open.is_pending() {
        return Err(AppError::validation(
            "Your clock-in is awaiting admin approval. Contact admin before clocking out",
        ));
    }

    let (latitude, longitude) =
        clock::validate_coordinates(req.latitude.as_ref(), req.longitude.as_ref())?;
    let evidence = clock::require_evidence(req.evidence.as_deref())?;

    let (early, early_reason) =
        clock::classify_clock_out(ctx.rules, now, req.early_reason.as_deref());
    if early && early_reason.is_none() {
        return Err(AppError::validation(format!(
            "Clocking out before {} requires a reason",
            ctx.rules.early_cutoff.format("%H:%M")
        )));
    }

    ctx.evidence.ensure_exists(evidence).await?;
    let location = resolve_or_label(ctx.resolver, latitude, longitude).await;

    let update = ClockOutUpdate {
        clock_out: now,
        location,
        evidence: evidence.to_string(),
        early_clock_out: early,
        early_clock_out_reason: early_reason,
        is_system_checkout: false,
        force_approval: None,
    };

    if !store.close(open.id, &update).await? {
        return Err(AppError::validation("You are not clocked in"));
    }

    info!(employee_id = req.employee_id, record_id = open.id, early, "Clocked out");

    store
        .find_by_id(open.id)
        .await?
        .ok_or_else(|| AppError::NotFound("Attendance record not found".into()))
}

/// Approving an already-approved record returns it unchanged.
pub async fn approve_attendance<S>(
    store: &S,
    record_id: u64,
    approver_id: u64,
) -> Result<AttendanceRecord, AppError>
where
    S: AttendanceStore + ?Sized,
{
    let record = store
        .find_by_id(record_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Attendance record not found".into()))?;

    if !record.is_pending() {
        return Ok(record);
    }

    let message = format!("Approved by admin (user {})", approver_id);
    if store.approve(record_id, approver_id, &message).await? {
        info!(record_id, approver_id, "Attendance approved");
    }

    store
        .find_by_id(record_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Attendance record not found".into()))
}
