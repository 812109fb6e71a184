//! Nightly auto clock-out of sessions left open on a previous day.

use std::time::Duration;

use actix_web::rt::time::timeout;
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use tracing::{error, info, warn};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::model::attendance::{
    AttendanceRecord, ClockOutUpdate, GeoPoint, SYSTEM_CHECKOUT_EVIDENCE, SYSTEM_CHECKOUT_MESSAGE,
};
use crate::store::AttendanceStore;
use crate::utils::location::LocationResolver;

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ReconciliationFailure {
    pub employee_id: u64,
    pub record_id: u64,
    pub message: String,
}

#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct ReconciliationReport {
    pub found: usize,
    pub processed: usize,
    pub errors: Vec<ReconciliationFailure>,
}

/// Last representable instant of `date` at millisecond precision.
pub fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::from_hms_milli_opt(23, 59, 59, 999).unwrap_or(NaiveTime::MIN))
}

/// Closes every record still open from a day before `as_of`.
///
/// Each record is handled on its own: a failure is recorded in the report
/// and the batch carries on. Records that are already closed never match
/// the selection, so running twice changes nothing the second time.
pub async fn run_reconciliation<S>(
    store: &S,
    resolver: &dyn LocationResolver,
    as_of: NaiveDate,
    refresh_timeout: Duration,
) -> Result<ReconciliationReport, AppError>
where
    S: AttendanceStore + ?Sized,
{
    let abandoned = store.list_open_before(as_of).await?;
    let mut report = ReconciliationReport {
        found: abandoned.len(),
        ..Default::default()
    };

    info!(%as_of, found = report.found, "Auto clock-out started");

    for record in abandoned {
        let location = refresh_location(resolver, &record, refresh_timeout).await;
        let update = ClockOutUpdate {
            clock_out: end_of_day(record.clock_in.date()),
            location,
            evidence: SYSTEM_CHECKOUT_EVIDENCE.to_string(),
            early_clock_out: false,
            early_clock_out_reason: None,
            is_system_checkout: true,
            force_approval: Some(SYSTEM_CHECKOUT_MESSAGE.to_string()),
        };

        match store.close(record.id, &update).await {
            Ok(true) => report.processed += 1,
            // closed by the employee after selection
            Ok(false) => {
                warn!(record_id = record.id, "Record already closed, skipped");
            }
            Err(e) => {
                error!(
                    error = %e,
                    record_id = record.id,
                    employee_id = record.employee_id,
                    "Auto clock-out failed"
                );
                report.errors.push(ReconciliationFailure {
                    employee_id: record.employee_id,
                    record_id: record.id,
                    message: e.to_string(),
                });
            }
        }
    }

    info!(
        found = report.found,
        processed = report.processed,
        failed = report.errors.len(),
        "Auto clock-out finished"
    );
    Ok(report)
}

/// Re-resolves the clock-in place within `limit`, otherwise keeps the
/// clock-in location as is.
async fn refresh_location(
    resolver: &dyn LocationResolver,
    record: &AttendanceRecord,
    limit: Duration,
) -> GeoPoint {
    let original = record.clock_in_location.clone();

    match timeout(limit, resolver.resolve(original.latitude, original.longitude)).await {
        Ok(Ok(place)) => GeoPoint { place, ..original },
        Ok(Err(e)) => {
            warn!(error = %e, record_id = record.id, "Location refresh failed");
            original
        }
        Err(_) => {
            warn!(record_id = record.id, "Location refresh timed out");
            original
        }
    }
}
