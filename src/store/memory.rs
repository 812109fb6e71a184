//! In-process store used by unit tests. Enforces the same unique keys as
//! the MySQL schema.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{NaiveDate, Utc};

use super::{AttendanceQuery, AttendanceStore, LeaveQuery, LeaveStore};
use crate::error::StoreError;
use crate::model::attendance::{
    ApprovalStatus, AttendanceRecord, ClockOutUpdate, NewAttendance,
};
use crate::model::leave_request::{Actor, LeaveRequest, LeaveStatus, NewLeaveRequest};

#[derive(Default)]
pub struct MemoryStore {
    attendance: Mutex<Vec<AttendanceRecord>>,
    leaves: Mutex<Vec<LeaveRequest>>,
    /// Record ids whose `close` call fails, to exercise batch isolation.
    failing_closes: Mutex<HashSet<u64>>,
    /// Employees whose next attendance insert loses to a concurrent writer.
    racing_inserts: Mutex<HashSet<u64>>,
    /// Status another writer sets on a leave request just before the
    /// compare-and-set runs.
    racing_status: Mutex<HashMap<u64, LeaveStatus>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_close_for(&self, id: u64) {
        self.failing_closes.lock().unwrap().insert(id);
    }

    pub fn race_insert_for(&self, employee_id: u64) {
        self.racing_inserts.lock().unwrap().insert(employee_id);
    }

    pub fn race_status_change(&self, leave_id: u64, status: LeaveStatus) {
        self.racing_status.lock().unwrap().insert(leave_id, status);
    }

    /// Seeds a record as-is, bypassing the unique checks.
    pub fn put_attendance(&self, record: AttendanceRecord) {
        self.attendance.lock().unwrap().push(record);
    }

    pub fn put_leave(&self, leave: LeaveRequest) {
        self.leaves.lock().unwrap().push(leave);
    }

    pub fn attendance_snapshot(&self) -> Vec<AttendanceRecord> {
        self.attendance.lock().unwrap().clone()
    }
}

#[async_trait]
impl AttendanceStore for MemoryStore {
    async fn find_by_id(&self, id: u64) -> Result<Option<AttendanceRecord>, StoreError> {
        let rows = self.attendance.lock().unwrap();
        Ok(rows.iter().find(|r| r.id == id).cloned())
    }

    async fn find_open(&self, employee_id: u64) -> Result<Option<AttendanceRecord>, StoreError> {
        let rows = self.attendance.lock().unwrap();
        Ok(rows
            .iter()
            .find(|r| r.employee_id == employee_id && r.is_open())
            .cloned())
    }

    async fn find_on_date(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        let rows = self.attendance.lock().unwrap();
        Ok(rows
            .iter()
            .find(|r| r.employee_id == employee_id && r.work_date == date)
            .cloned())
    }

    async fn insert(&self, new: NewAttendance) -> Result<AttendanceRecord, StoreError> {
        if self.racing_inserts.lock().unwrap().remove(&new.employee_id) {
            return Err(StoreError::UniqueViolation(
                "uq_attendance_employee_day".into(),
            ));
        }

        let mut rows = self.attendance.lock().unwrap();
        let work_date = new.clock_in.date();

        if rows
            .iter()
            .any(|r| r.employee_id == new.employee_id && r.work_date == work_date)
        {
            return Err(StoreError::UniqueViolation(
                "uq_attendance_employee_day".into(),
            ));
        }
        if rows
            .iter()
            .any(|r| r.employee_id == new.employee_id && r.is_open())
        {
            return Err(StoreError::UniqueViolation(
                "uq_attendance_open_session".into(),
            ));
        }

        let record = AttendanceRecord {
            id: rows.iter().map(|r| r.id).max().unwrap_or(0) + 1,
            employee_id: new.employee_id,
            work_date,
            clock_in: new.clock_in,
            clock_in_location: new.location,
            clock_in_evidence: new.evidence,
            clock_out: None,
            clock_out_location: None,
            clock_out_evidence: None,
            is_late: new.is_late,
            early_clock_out: false,
            is_system_checkout: false,
            is_approved: new.approval_status == ApprovalStatus::Approved,
            approval_status: new.approval_status,
            approval_message: new.approval_message,
            approved_by: None,
            late_clock_in_reason: new.late_clock_in_reason,
            early_clock_out_reason: None,
        };
        rows.push(record.clone());
        Ok(record)
    }

    async fn close(&self, id: u64, update: &ClockOutUpdate) -> Result<bool, StoreError> {
        if self.failing_closes.lock().unwrap().contains(&id) {
            return Err(StoreError::Decode(format!("simulated failure on {}", id)));
        }

        let mut rows = self.attendance.lock().unwrap();
        let Some(record) = rows.iter_mut().find(|r| r.id == id && r.is_open()) else {
            return Ok(false);
        };

        record.clock_out = Some(update.clock_out);
        record.clock_out_location = Some(update.location.clone());
        record.clock_out_evidence = Some(update.evidence.clone());
        record.early_clock_out = update.early_clock_out;
        record.early_clock_out_reason = update.early_clock_out_reason.clone();
        record.is_system_checkout = update.is_system_checkout;
        if let Some(message) = &update.force_approval {
            record.is_approved = true;
            record.approval_status = ApprovalStatus::Approved;
            record.approval_message = Some(message.clone());
        }
        Ok(true)
    }

    async fn approve(&self, id: u64, approver_id: u64, message: &str) -> Result<bool, StoreError> {
        let mut rows = self.attendance.lock().unwrap();
        let Some(record) = rows
            .iter_mut()
            .find(|r| r.id == id && r.approval_status == ApprovalStatus::Pending)
        else {
            return Ok(false);
        };

        record.is_approved = true;
        record.approval_status = ApprovalStatus::Approved;
        record.approval_message = Some(message.to_string());
        record.approved_by = Some(approver_id);
        Ok(true)
    }

    async fn list_open_before(&self, date: NaiveDate) -> Result<Vec<AttendanceRecord>, StoreError> {
        let rows = self.attendance.lock().unwrap();
        Ok(rows
            .iter()
            .filter(|r| r.is_open() && r.work_date < date)
            .cloned()
            .collect())
    }

    async fn list(&self, query: &AttendanceQuery) -> Result<Vec<AttendanceRecord>, StoreError> {
        let rows = self.attendance.lock().unwrap();
        let mut out: Vec<_> = rows
            .iter()
            .filter(|r| query.employee_id.is_none_or(|id| r.employee_id == id))
            .filter(|r| query.from.is_none_or(|d| r.work_date >= d))
            .filter(|r| query.to.is_none_or(|d| r.work_date <= d))
            .filter(|r| !query.pending_only || r.is_pending())
            .cloned()
            .collect();
        out.sort_by(|a, b| b.clock_in.cmp(&a.clock_in));
        Ok(out)
    }

    async fn count_between(
        &self,
        employee_id: u64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<i64, StoreError> {
        let rows = self.attendance.lock().unwrap();
        Ok(rows
            .iter()
            .filter(|r| r.employee_id == employee_id && r.work_date >= from && r.work_date <= to)
            .count() as i64)
    }
}

#[async_trait]
impl LeaveStore for MemoryStore {
    async fn insert(&self, new: NewLeaveRequest) -> Result<LeaveRequest, StoreError> {
        let mut rows = self.leaves.lock().unwrap();
        let leave = LeaveRequest {
            id: rows.iter().map(|l| l.id).max().unwrap_or(0) + 1,
            employee_id: new.employee_id,
            leave_type: new.leave_type,
            start_date: new.start_date,
            end_date: new.end_date,
            duration: new.duration,
            reason: new.reason,
            status: LeaveStatus::Pending,
            action_by: None,
            created_at: Utc::now(),
        };
        rows.push(leave.clone());
        Ok(leave)
    }

    async fn find_by_id(&self, id: u64) -> Result<Option<LeaveRequest>, StoreError> {
        let rows = self.leaves.lock().unwrap();
        Ok(rows.iter().find(|l| l.id == id).cloned())
    }

    async fn update_status(
        &self,
        id: u64,
        expected: LeaveStatus,
        new: LeaveStatus,
        action_by: Actor,
    ) -> Result<bool, StoreError> {
        let mut rows = self.leaves.lock().unwrap();
        if let Some(status) = self.racing_status.lock().unwrap().remove(&id) {
            if let Some(leave) = rows.iter_mut().find(|l| l.id == id) {
                leave.status = status;
            }
        }

        let Some(leave) = rows
            .iter_mut()
            .find(|l| l.id == id && l.status == expected)
        else {
            return Ok(false);
        };

        leave.status = new;
        leave.action_by = Some(action_by);
        Ok(true)
    }

    async fn list_overlapping(
        &self,
        employee_id: u64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<LeaveRequest>, StoreError> {
        let rows = self.leaves.lock().unwrap();
        Ok(rows
            .iter()
            .filter(|l| l.employee_id == employee_id && l.start_date <= to && l.end_date >= from)
            .cloned()
            .collect())
    }

    async fn list(&self, query: &LeaveQuery) -> Result<(Vec<LeaveRequest>, i64), StoreError> {
        let rows = self.leaves.lock().unwrap();
        let matching: Vec<_> = rows
            .iter()
            .filter(|l| query.employee_id.is_none_or(|id| l.employee_id == id))
            .filter(|l| query.status.is_none_or(|s| l.status == s))
            .cloned()
            .collect();
        let total = matching.len() as i64;
        let page = matching
            .into_iter()
            .skip(query.offset as usize)
            .take(query.limit as usize)
            .collect();
        Ok((page, total))
    }
}
