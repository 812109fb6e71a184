use rust_decimal::{Decimal, RoundingStrategy};
use tracing::warn;

use super::leave::request_days_within;
use crate::error::AppError;
use crate::model::leave_request::{LeaveRequest, LeaveStatus};
use crate::model::payroll::{BillingPeriod, PayrollSnapshot};
use crate::store::{AttendanceStore, LeaveStore};

/// Weight of a rejected leave day against an approved one.
const REJECTED_LEAVE_WEIGHT: i64 = 2;

/// Half-up to cents, always carrying two decimal places.
fn round_money(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

/// Pure payroll math over the leave requests of one employee.
///
/// Only the days of each request that fall inside the period are charged.
/// Working days are not clamped, so heavy deductions can produce a
/// negative net salary. Fails when the salary is too large to multiply
/// out.
pub fn calculate(
    employee_id: u64,
    monthly_salary: Decimal,
    period: BillingPeriod,
    leaves: &[LeaveRequest],
) -> Result<PayrollSnapshot, AppError> {
    let from = period.first_day();
    let to = period.last_day();
    let days_in_period = Decimal::from(period.days());
    let daily_wage = monthly_salary / days_in_period;

    let sum_for = |status: LeaveStatus| -> Decimal {
        leaves
            .iter()
            .filter(|l| l.employee_id == employee_id && l.status == status)
            .map(|l| request_days_within(l, from, to))
            .sum()
    };

    let approved_leave_days = sum_for(LeaveStatus::Approved);
    let rejected_leave_days = sum_for(LeaveStatus::Rejected);
    let deduction_days =
        approved_leave_days + Decimal::from(REJECTED_LEAVE_WEIGHT) * rejected_leave_days;
    let working_days = days_in_period - deduction_days;

    if working_days.is_sign_negative() {
        warn!(
            employee_id,
            %period,
            %deduction_days,
            "Leave deductions exceed days in period"
        );
    }

    let net_salary = working_days
        .checked_mul(daily_wage)
        .ok_or_else(|| AppError::validation("Monthly salary is out of range"))?;

    Ok(PayrollSnapshot {
        employee_id,
        period,
        monthly_salary,
        days_in_period: period.days(),
        daily_wage: round_money(daily_wage),
        approved_leave_days,
        rejected_leave_days,
        deduction_days,
        working_days,
        net_salary: round_money(net_salary),
    })
}

/// Reads attendance and leave for the period and derives the snapshot.
/// An employee with no attendance in the period gets `NoAttendanceData`.
pub async fn compute_payroll<A, L>(
    attendance: &A,
    leave: &L,
    employee_id: u64,
    monthly_salary: Decimal,
    period: BillingPeriod,
) -> Result<PayrollSnapshot, AppError>
where
    A: AttendanceStore + ?Sized,
    L: LeaveStore + ?Sized,
{
    if monthly_salary.is_sign_negative() {
        return Err(AppError::validation("Monthly salary cannot be negative"));
    }

    let from = period.first_day();
    let to = period.last_day();

    if attendance.count_between(employee_id, from, to).await? == 0 {
        return Err(AppError::NoAttendanceData {
            employee_id,
            period,
        });
    }

    let leaves = leave.list_overlapping(employee_id, from, to).await?;
    calculate(employee_id, monthly_salary, period, &leaves)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::attendance::{ApprovalStatus, AttendanceRecord, GeoPoint};
    use crate::model::leave_request::{LeaveDuration, LeaveType};
    use crate::store::memory::MemoryStore;
    use chrono::{NaiveDate, Utc};
    use rust_decimal_macros::dec;

    fn d(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, month, day).unwrap()
    }

    fn leave(
        id: u64,
        status: LeaveStatus,
        duration: LeaveDuration,
        start: NaiveDate,
        end: NaiveDate,
    ) -> LeaveRequest {
        LeaveRequest {
            id,
            employee_id: 9,
            leave_type: LeaveType::Casual,
            start_date: start,
            end_date: end,
            duration,
            reason: "Personal".into(),
            status,
            action_by: None,
            created_at: Utc::now(),
        }
    }

    fn attended(id: u64, day: NaiveDate) -> AttendanceRecord {
        AttendanceRecord {
            id,
            employee_id: 9,
            work_date: day,
            clock_in: day.and_hms_opt(9, 0, 0).unwrap(),
            clock_in_location: GeoPoint {
                latitude: 1.0,
                longitude: 2.0,
                place: "Office".into(),
            },
            clock_in_evidence: "in.jpg".into(),
            clock_out: Some(day.and_hms_opt(18, 45, 0).unwrap()),
            clock_out_location: None,
            clock_out_evidence: Some("out.jpg".into()),
            is_late: false,
            early_clock_out: false,
            is_system_checkout: false,
            is_approved: true,
            approval_status: ApprovalStatus::Approved,
            approval_message: None,
            approved_by: None,
            late_clock_in_reason: None,
            early_clock_out_reason: None,
        }
    }

    #[test]
    fn rejected_leave_counts_double() {
        let period = BillingPeriod::new(2026, 4).unwrap();
        let leaves = vec![
            leave(1, LeaveStatus::Approved, LeaveDuration::FullDay, d(4, 6), d(4, 7)),
            leave(2, LeaveStatus::Rejected, LeaveDuration::FullDay, d(4, 20), d(4, 20)),
            leave(3, LeaveStatus::Pending, LeaveDuration::FullDay, d(4, 21), d(4, 24)),
            leave(4, LeaveStatus::Cancelled, LeaveDuration::FullDay, d(4, 25), d(4, 25)),
        ];

        let snap = calculate(9, dec!(30000), period, &leaves).unwrap();
        assert_eq!(snap.days_in_period, 30);
        assert_eq!(snap.daily_wage, dec!(1000));
        assert_eq!(snap.approved_leave_days, dec!(2));
        assert_eq!(snap.rejected_leave_days, dec!(1));
        assert_eq!(snap.deduction_days, dec!(4));
        assert_eq!(snap.working_days, dec!(26));
        assert_eq!(snap.net_salary, dec!(26000.00));
        assert_eq!(snap.net_salary.to_string(), "26000.00");
    }

    #[test]
    fn half_days_and_rounding() {
        // 31-day month: 25000 / 31 = 806.4516...
        let period = BillingPeriod::new(2026, 5).unwrap();
        let leaves = vec![leave(
            1,
            LeaveStatus::Approved,
            LeaveDuration::SecondHalf,
            d(5, 4),
            d(5, 6),
        )];

        let snap = calculate(9, dec!(25000), period, &leaves).unwrap();
        assert_eq!(snap.approved_leave_days, dec!(1.5));
        assert_eq!(snap.working_days, dec!(29.5));
        assert_eq!(snap.daily_wage, dec!(806.45));
        // 29.5 * 806.4516129... = 23790.32258...
        assert_eq!(snap.net_salary, dec!(23790.32));
    }

    #[test]
    fn working_days_are_not_clamped() {
        let period = BillingPeriod::new(2026, 2).unwrap();
        let leaves = vec![leave(1, LeaveStatus::Rejected, LeaveDuration::FullDay, d(2, 1), d(2, 20))];

        let snap = calculate(9, dec!(2800), period, &leaves).unwrap();
        assert_eq!(snap.deduction_days, dec!(40));
        assert_eq!(snap.working_days, dec!(-12));
        assert_eq!(snap.net_salary, dec!(-1200.00));
    }

    #[test]
    fn oversized_salary_is_a_validation_error() {
        let period = BillingPeriod::new(2026, 2).unwrap();
        let leaves = vec![
            leave(1, LeaveStatus::Approved, LeaveDuration::FullDay, d(2, 1), d(2, 28)),
            leave(2, LeaveStatus::Rejected, LeaveDuration::FullDay, d(2, 1), d(2, 28)),
        ];

        let err = calculate(9, Decimal::MAX, period, &leaves).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn only_days_inside_the_period_are_charged() {
        let period = BillingPeriod::new(2026, 4).unwrap();
        let leaves = vec![leave(1, LeaveStatus::Approved, LeaveDuration::FullDay, d(3, 30), d(4, 2))];

        let snap = calculate(9, dec!(30000), period, &leaves).unwrap();
        assert_eq!(snap.approved_leave_days, dec!(2));
    }

    #[actix_web::test]
    async fn no_attendance_is_a_distinct_outcome() {
        let store = MemoryStore::new();
        store.put_attendance(attended(1, d(3, 31)));

        let period = BillingPeriod::new(2026, 4).unwrap();
        let err = compute_payroll(&store, &store, 9, dec!(30000), period)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NoAttendanceData { employee_id: 9, .. }));
    }

    #[actix_web::test]
    async fn computes_from_stores() {
        let store = MemoryStore::new();
        store.put_attendance(attended(1, d(4, 1)));
        store.put_leave(leave(1, LeaveStatus::Approved, LeaveDuration::FullDay, d(4, 6), d(4, 7)));
        store.put_leave(leave(2, LeaveStatus::Rejected, LeaveDuration::FullDay, d(4, 20), d(4, 20)));
        // previous month, not charged in April
        store.put_leave(leave(3, LeaveStatus::Rejected, LeaveDuration::FullDay, d(3, 2), d(3, 3)));

        let period = BillingPeriod::new(2026, 4).unwrap();
        let snap = compute_payroll(&store, &store, 9, dec!(30000), period)
            .await
            .unwrap();
        assert_eq!(snap.deduction_days, dec!(4));
        assert_eq!(snap.net_salary, dec!(26000.00));
    }

    #[actix_web::test]
    async fn negative_salary_is_rejected() {
        let store = MemoryStore::new();
        let period = BillingPeriod::new(2026, 4).unwrap();
        let err = compute_payroll(&store, &store, 9, dec!(-1), period)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
