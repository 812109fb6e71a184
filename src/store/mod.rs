//! Data-access seam. Handlers receive an explicitly constructed store
//! handle; the core rules only see these traits.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::StoreError;
use crate::model::attendance::{AttendanceRecord, ClockOutUpdate, NewAttendance};
use crate::model::leave_request::{Actor, LeaveRequest, LeaveStatus, NewLeaveRequest};

#[cfg(test)]
pub mod memory;
pub mod mysql;

pub use mysql::MySqlStore;

#[derive(Debug, Clone, Default)]
pub struct AttendanceQuery {
    pub employee_id: Option<u64>,
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
    /// Only records still waiting for an administrator.
    pub pending_only: bool,
}

#[derive(Debug, Clone)]
pub struct LeaveQuery {
    pub employee_id: Option<u64>,
    pub status: Option<LeaveStatus>,
    pub limit: u64,
    pub offset: u64,
}

#[async_trait]
pub trait AttendanceStore: Send + Sync {
    async fn find_by_id(&self, id: u64) -> Result<Option<AttendanceRecord>, StoreError>;

    /// The employee's record with no clock-out, if any.
    async fn find_open(&self, employee_id: u64) -> Result<Option<AttendanceRecord>, StoreError>;

    async fn find_on_date(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, StoreError>;

    /// Fails with `UniqueViolation` when the employee already has a record
    /// for that day or an open session.
    async fn insert(&self, new: NewAttendance) -> Result<AttendanceRecord, StoreError>;

    /// Closes an open record. Returns false if it was already closed.
    async fn close(&self, id: u64, update: &ClockOutUpdate) -> Result<bool, StoreError>;

    /// Returns false if the record was not pending.
    async fn approve(&self, id: u64, approver_id: u64, message: &str) -> Result<bool, StoreError>;

    /// Open records whose work date is strictly before `date`.
    async fn list_open_before(&self, date: NaiveDate) -> Result<Vec<AttendanceRecord>, StoreError>;

    async fn list(&self, query: &AttendanceQuery) -> Result<Vec<AttendanceRecord>, StoreError>;

    async fn count_between(
        &self,
        employee_id: u64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<i64, StoreError>;
}

#[async_trait]
pub trait LeaveStore: Send + Sync {
    async fn insert(&self, new: NewLeaveRequest) -> Result<LeaveRequest, StoreError>;

    async fn find_by_id(&self, id: u64) -> Result<Option<LeaveRequest>, StoreError>;

    /// Compare-and-set on status. Returns false when the stored status is no
    /// longer `expected`.
    async fn update_status(
        &self,
        id: u64,
        expected: LeaveStatus,
        new: LeaveStatus,
        action_by: Actor,
    ) -> Result<bool, StoreError>;

    /// Requests of the employee whose span intersects `[from, to]`.
    async fn list_overlapping(
        &self,
        employee_id: u64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<LeaveRequest>, StoreError>;

    /// Page of requests plus the total matching count.
    async fn list(&self, query: &LeaveQuery) -> Result<(Vec<LeaveRequest>, i64), StoreError>;
}
