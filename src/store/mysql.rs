use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use sqlx::{FromRow, MySqlPool};

use super::{AttendanceQuery, AttendanceStore, LeaveQuery, LeaveStore};
use crate::error::StoreError;
use crate::model::attendance::{
    ApprovalStatus, AttendanceRecord, ClockOutUpdate, GeoPoint, NewAttendance,
};
use crate::model::leave_request::{Actor, LeaveRequest, LeaveStatus, NewLeaveRequest};

const ATTENDANCE_COLUMNS: &str = r#"
    id, employee_id, work_date,
    clock_in, clock_in_lat, clock_in_lng, clock_in_place, clock_in_evidence,
    clock_out, clock_out_lat, clock_out_lng, clock_out_place, clock_out_evidence,
    is_late, early_clock_out, is_system_checkout,
    is_approved, approval_status, approval_message, approved_by,
    late_clock_in_reason, early_clock_out_reason
"#;

const LEAVE_COLUMNS: &str = r#"
    id, employee_id, leave_type, start_date, end_date, duration, reason,
    status, action_by, created_at
"#;

/// MySQL-backed store. Owns the pool handle it was built with.
#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

// Helper enum for typed SQLx binding
enum FilterValue {
    U64(u64),
    Str(&'static str),
    Date(NaiveDate),
}

#[derive(FromRow)]
struct AttendanceRow {
    id: u64,
    employee_id: u64,
    work_date: NaiveDate,
    clock_in: NaiveDateTime,
    clock_in_lat: f64,
    clock_in_lng: f64,
    clock_in_place: String,
    clock_in_evidence: String,
    clock_out: Option<NaiveDateTime>,
    clock_out_lat: Option<f64>,
    clock_out_lng: Option<f64>,
    clock_out_place: Option<String>,
    clock_out_evidence: Option<String>,
    is_late: bool,
    early_clock_out: bool,
    is_system_checkout: bool,
    is_approved: bool,
    approval_status: String,
    approval_message: Option<String>,
    approved_by: Option<u64>,
    late_clock_in_reason: Option<String>,
    early_clock_out_reason: Option<String>,
}

impl TryFrom<AttendanceRow> for AttendanceRecord {
    type Error = StoreError;

    fn try_from(row: AttendanceRow) -> Result<Self, Self::Error> {
        let approval_status: ApprovalStatus = row.approval_status.parse().map_err(|_| {
            StoreError::Decode(format!(
                "attendance {} has approval_status '{}'",
                row.id, row.approval_status
            ))
        })?;

        let clock_out_location = match (row.clock_out_lat, row.clock_out_lng) {
            (Some(latitude), Some(longitude)) => Some(GeoPoint {
                latitude,
                longitude,
                place: row
                    .clock_out_place
                    .unwrap_or_else(|| GeoPoint::coordinate_label(latitude, longitude)),
            }),
            _ => None,
        };

        Ok(AttendanceRecord {
            id: row.id,
            employee_id: row.employee_id,
            work_date: row.work_date,
            clock_in: row.clock_in,
            clock_in_location: GeoPoint {
                latitude: row.clock_in_lat,
                longitude: row.clock_in_lng,
                place: row.clock_in_place,
            },
            clock_in_evidence: row.clock_in_evidence,
            clock_out: row.clock_out,
            clock_out_location,
            clock_out_evidence: row.clock_out_evidence,
            is_late: row.is_late,
            early_clock_out: row.early_clock_out,
            is_system_checkout: row.is_system_checkout,
            // both columns are written together; the status column wins
            is_approved: row.is_approved && approval_status == ApprovalStatus::Approved,
            approval_status,
            approval_message: row.approval_message,
            approved_by: row.approved_by,
            late_clock_in_reason: row.late_clock_in_reason,
            early_clock_out_reason: row.early_clock_out_reason,
        })
    }
}

#[derive(FromRow)]
struct LeaveRow {
    id: u64,
    employee_id: u64,
    leave_type: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
    duration: String,
    reason: String,
    status: String,
    action_by: Option<String>,
    created_at: DateTime<Utc>,
}

impl TryFrom<LeaveRow> for LeaveRequest {
    type Error = StoreError;

    fn try_from(row: LeaveRow) -> Result<Self, Self::Error> {
        let bad = |column: &str, value: &str| {
            StoreError::Decode(format!("leave {} has {} '{}'", row.id, column, value))
        };

        Ok(LeaveRequest {
            id: row.id,
            employee_id: row.employee_id,
            leave_type: row
                .leave_type
                .parse()
                .map_err(|_| bad("leave_type", &row.leave_type))?,
            start_date: row.start_date,
            end_date: row.end_date,
            duration: row
                .duration
                .parse()
                .map_err(|_| bad("duration", &row.duration))?,
            status: row.status.parse().map_err(|_| bad("status", &row.status))?,
            action_by: row
                .action_by
                .as_deref()
                .map(|a| a.parse::<Actor>().map_err(|_| bad("action_by", a)))
                .transpose()?,
            reason: row.reason,
            created_at: row.created_at,
        })
    }
}

impl MySqlStore {
    async fn fetch_attendance(
        &self,
        sql: &str,
        args: Vec<FilterValue>,
    ) -> Result<Vec<AttendanceRecord>, StoreError> {
        let mut q = sqlx::query_as::<_, AttendanceRow>(sql);
        for arg in args {
            q = match arg {
                FilterValue::U64(v) => q.bind(v),
                FilterValue::Str(s) => q.bind(s),
                FilterValue::Date(d) => q.bind(d),
            };
        }

        q.fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(AttendanceRecord::try_from)
            .collect()
    }

    async fn fetch_one_attendance(
        &self,
        sql: &str,
        args: Vec<FilterValue>,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        Ok(self.fetch_attendance(sql, args).await?.into_iter().next())
    }
}

#[async_trait]
impl AttendanceStore for MySqlStore {
    async fn find_by_id(&self, id: u64) -> Result<Option<AttendanceRecord>, StoreError> {
        let sql = format!("SELECT {} FROM attendance WHERE id = ?", ATTENDANCE_COLUMNS);
        self.fetch_one_attendance(&sql, vec![FilterValue::U64(id)])
            .await
    }

    async fn find_open(&self, employee_id: u64) -> Result<Option<AttendanceRecord>, StoreError> {
        let sql = format!(
            "SELECT {} FROM attendance WHERE employee_id = ? AND clock_out IS NULL LIMIT 1",
            ATTENDANCE_COLUMNS
        );
        self.fetch_one_attendance(&sql, vec![FilterValue::U64(employee_id)])
            .await
    }

    async fn find_on_date(
        &self,
        employee_id: u64,
        date: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        let sql = format!(
            "SELECT {} FROM attendance WHERE employee_id = ? AND work_date = ?",
            ATTENDANCE_COLUMNS
        );
        self.fetch_one_attendance(
            &sql,
            vec![FilterValue::U64(employee_id), FilterValue::Date(date)],
        )
        .await
    }

    async fn insert(&self, new: NewAttendance) -> Result<AttendanceRecord, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO attendance
                (employee_id, work_date, clock_in, clock_in_lat, clock_in_lng,
                 clock_in_place, clock_in_evidence, is_late, is_approved,
                 approval_status, approval_message, late_clock_in_reason)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(new.employee_id)
        .bind(new.clock_in.date())
        .bind(new.clock_in)
        .bind(new.location.latitude)
        .bind(new.location.longitude)
        .bind(&new.location.place)
        .bind(&new.evidence)
        .bind(new.is_late)
        .bind(new.approval_status == ApprovalStatus::Approved)
        .bind(new.approval_status.as_ref())
        .bind(&new.approval_message)
        .bind(&new.late_clock_in_reason)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_id();
        AttendanceStore::find_by_id(self, id)
            .await?
            .ok_or_else(|| StoreError::Decode(format!("attendance {} vanished after insert", id)))
    }

    async fn close(&self, id: u64, update: &ClockOutUpdate) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE attendance
            SET clock_out = ?,
                clock_out_lat = ?,
                clock_out_lng = ?,
                clock_out_place = ?,
                clock_out_evidence = ?,
                early_clock_out = ?,
                early_clock_out_reason = ?,
                is_system_checkout = ?,
                is_approved = IF(? IS NULL, is_approved, TRUE),
                approval_status = IF(? IS NULL, approval_status, 'approved'),
                approval_message = COALESCE(?, approval_message)
            WHERE id = ?
            AND clock_out IS NULL
            "#,
        )
        .bind(update.clock_out)
        .bind(update.location.latitude)
        .bind(update.location.longitude)
        .bind(&update.location.place)
        .bind(&update.evidence)
        .bind(update.early_clock_out)
        .bind(&update.early_clock_out_reason)
        .bind(update.is_system_checkout)
        .bind(&update.force_approval)
        .bind(&update.force_approval)
        .bind(&update.force_approval)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn approve(&self, id: u64, approver_id: u64, message: &str) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE attendance
            SET is_approved = TRUE,
                approval_status = 'approved',
                approval_message = ?,
                approved_by = ?
            WHERE id = ?
            AND approval_status = 'pending'
            "#,
        )
        .bind(message)
        .bind(approver_id)
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_open_before(&self, date: NaiveDate) -> Result<Vec<AttendanceRecord>, StoreError> {
        let sql = format!(
            "SELECT {} FROM attendance WHERE clock_out IS NULL AND work_date < ? ORDER BY id",
            ATTENDANCE_COLUMNS
        );
        self.fetch_attendance(&sql, vec![FilterValue::Date(date)])
            .await
    }

    async fn list(&self, query: &AttendanceQuery) -> Result<Vec<AttendanceRecord>, StoreError> {
        let mut where_sql = String::from(" WHERE 1=1");
        let mut args: Vec<FilterValue> = Vec::new();

        if let Some(emp_id) = query.employee_id {
            where_sql.push_str(" AND employee_id = ?");
            args.push(FilterValue::U64(emp_id));
        }
        if let Some(from) = query.from {
            where_sql.push_str(" AND work_date >= ?");
            args.push(FilterValue::Date(from));
        }
        if let Some(to) = query.to {
            where_sql.push_str(" AND work_date <= ?");
            args.push(FilterValue::Date(to));
        }
        if query.pending_only {
            where_sql.push_str(" AND approval_status = ?");
            args.push(FilterValue::Str("pending"));
        }

        let sql = format!(
            "SELECT {} FROM attendance{} ORDER BY clock_in DESC",
            ATTENDANCE_COLUMNS, where_sql
        );
        self.fetch_attendance(&sql, args).await
    }

    async fn count_between(
        &self,
        employee_id: u64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<i64, StoreError> {
        let count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM attendance
            WHERE employee_id = ?
            AND work_date BETWEEN ? AND ?
            "#,
        )
        .bind(employee_id)
        .bind(from)
        .bind(to)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }
}

#[async_trait]
impl LeaveStore for MySqlStore {
    async fn insert(&self, new: NewLeaveRequest) -> Result<LeaveRequest, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO leave_requests
                (employee_id, leave_type, start_date, end_date, duration, reason, status)
            VALUES (?, ?, ?, ?, ?, ?, 'pending')
            "#,
        )
        .bind(new.employee_id)
        .bind(new.leave_type.as_ref())
        .bind(new.start_date)
        .bind(new.end_date)
        .bind(new.duration.as_ref())
        .bind(&new.reason)
        .execute(&self.pool)
        .await?;

        let id = result.last_insert_id();
        LeaveStore::find_by_id(self, id)
            .await?
            .ok_or_else(|| StoreError::Decode(format!("leave {} vanished after insert", id)))
    }

    async fn find_by_id(&self, id: u64) -> Result<Option<LeaveRequest>, StoreError> {
        let sql = format!("SELECT {} FROM leave_requests WHERE id = ?", LEAVE_COLUMNS);
        sqlx::query_as::<_, LeaveRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(LeaveRequest::try_from)
            .transpose()
    }

    async fn update_status(
        &self,
        id: u64,
        expected: LeaveStatus,
        new: LeaveStatus,
        action_by: Actor,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            r#"
            UPDATE leave_requests
            SET status = ?, action_by = ?
            WHERE id = ?
            AND status = ?
            "#,
        )
        .bind(new.as_ref())
        .bind(action_by.as_ref())
        .bind(id)
        .bind(expected.as_ref())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_overlapping(
        &self,
        employee_id: u64,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<LeaveRequest>, StoreError> {
        let sql = format!(
            r#"
            SELECT {}
            FROM leave_requests
            WHERE employee_id = ?
            AND start_date <= ?
            AND end_date >= ?
            "#,
            LEAVE_COLUMNS
        );

        sqlx::query_as::<_, LeaveRow>(&sql)
            .bind(employee_id)
            .bind(to)
            .bind(from)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(LeaveRequest::try_from)
            .collect()
    }

    async fn list(&self, query: &LeaveQuery) -> Result<(Vec<LeaveRequest>, i64), StoreError> {
        // -------------------------
        // WHERE clause
        // -------------------------
        let mut where_sql = String::from(" WHERE 1=1");
        let mut args: Vec<FilterValue> = Vec::new();

        if let Some(emp_id) = query.employee_id {
            where_sql.push_str(" AND employee_id = ?");
            args.push(FilterValue::U64(emp_id));
        }

        if let Some(status) = query.status {
            where_sql.push_str(" AND status = ?");
            args.push(FilterValue::Str(status.into()));
        }

        // -------------------------
        // COUNT query
        // -------------------------
        let count_sql = format!("SELECT COUNT(*) FROM leave_requests{}", where_sql);

        let mut count_q = sqlx::query_scalar::<_, i64>(&count_sql);
        for arg in &args {
            count_q = match arg {
                FilterValue::U64(v) => count_q.bind(*v),
                FilterValue::Str(s) => count_q.bind(*s),
                FilterValue::Date(d) => count_q.bind(*d),
            };
        }
        let total = count_q.fetch_one(&self.pool).await?;

        // -------------------------
        // DATA query
        // -------------------------
        let data_sql = format!(
            r#"
            SELECT {}
            FROM leave_requests
            {}
            ORDER BY created_at DESC
            LIMIT ? OFFSET ?
            "#,
            LEAVE_COLUMNS, where_sql
        );

        let mut data_q = sqlx::query_as::<_, LeaveRow>(&data_sql);
        for arg in args {
            data_q = match arg {
                FilterValue::U64(v) => data_q.bind(v),
                FilterValue::Str(s) => data_q.bind(s),
                FilterValue::Date(d) => data_q.bind(d),
            };
        }

        let leaves = data_q
            .bind(query.limit)
            .bind(query.offset)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(LeaveRequest::try_from)
            .collect::<Result<Vec<_>, _>>()?;

        Ok((leaves, total))
    }
}
